//! The narrow surface a host engine offers the session: key polling, sound
//! effects, quitting, and a palette-indexed pixel canvas.

use serde::{Deserialize, Serialize};

/// Glyph cell width of the host's fixed-width font, spacing included.
pub const FONT_WIDTH: i32 = 4;
/// Glyph cell height of the host's fixed-width font.
pub const FONT_HEIGHT: i32 = 6;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Quit,
    Restart,
}

impl Key {
    pub const ALL: [Key; 6] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Quit, Key::Restart];
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum Sfx {
    Apple,
    Death,
}

/// Input, audio and process control, polled by the session once per frame.
pub trait Host {
    /// Is `key` held down right now?
    fn btn(&self, key: Key) -> bool;
    /// Did `key` go down since the previous frame? No key repeat.
    fn btnp(&self, key: Key) -> bool;
    fn play(&mut self, sfx: Sfx);
    /// Ask the host to end the process after the current frame.
    fn quit(&mut self);
}

/// Palette-indexed drawing primitives. Anything outside the surface is clipped.
pub trait Canvas {
    fn cls(&mut self, col: u8);
    fn pix(&mut self, x: i32, y: i32, col: u8);
    fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, col: u8);
    fn text(&mut self, x: i32, y: i32, s: &str, col: u8);
}
