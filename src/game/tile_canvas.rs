//! The window is a `WIDTH` x `HEIGHT` tilemap with one tile per pixel. Every
//! tile shows the same white texture, tinted through its `TileColor`.

use bevy::prelude::*;
use bevy_ecs_tilemap::tiles::{TileColor, TilePos, TileStorage};

use crate::snake_game::host::{Canvas, FONT_HEIGHT, FONT_WIDTH};

use super::{font, palette};

/// Paints a tilemap through the session's `Canvas` calls. Board rows count
/// down from the top while tile rows count up, so `y` is flipped.
pub struct TileCanvas<'a, 'w, 's> {
    pub storage: &'a TileStorage,
    pub colors: &'a mut Query<'w, 's, &'static mut TileColor>,
}

impl TileCanvas<'_, '_, '_> {
    fn tile_pos(&self, x: i32, y: i32) -> Option<TilePos> {
        let size = self.storage.size;
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        (x < size.x && y < size.y).then(|| TilePos { x, y: size.y - 1 - y })
    }

    fn paint(&mut self, entity: Entity, color: Color) {
        if let Ok(mut tile) = self.colors.get_mut(entity) {
            // Only touch tiles that change, so unchanged tiles stay out of change detection.
            if tile.0 != color {
                tile.0 = color;
            }
        }
    }
}

impl Canvas for TileCanvas<'_, '_, '_> {
    fn cls(&mut self, col: u8) {
        let color = palette::color(col);
        let storage = self.storage;
        for &entity in storage.iter().flatten() {
            self.paint(entity, color);
        }
    }

    fn pix(&mut self, x: i32, y: i32, col: u8) {
        let Some(pos) = self.tile_pos(x, y) else {
            return;
        };
        if let Some(entity) = self.storage.get(&pos) {
            self.paint(entity, palette::color(col));
        }
    }

    fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, col: u8) {
        let size = self.storage.size;
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(size.x as i32);
        let y1 = y.saturating_add(h).min(size.y as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.pix(px, py, col);
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, s: &str, col: u8) {
        let (mut cx, mut cy) = (x, y);
        for c in s.chars() {
            if c == '\n' {
                cx = x;
                cy += FONT_HEIGHT;
                continue;
            }
            if let Some(glyph) = font::glyph(c) {
                for (dx, dy) in font::lit_pixels(glyph) {
                    self.pix(cx + dx, cy + dy, col);
                }
            }
            cx += FONT_WIDTH;
        }
    }
}
