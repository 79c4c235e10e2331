//! The Bevy host: tilemap window, input, sound, and the frame driver.

use bevy::prelude::*;

pub mod assets;
pub mod audio;
pub mod font;
pub mod palette;
pub mod snake_visualizer;
pub mod tile_canvas;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        audio::plugin,
        assets::plugin,

        snake_visualizer::plugin,
    ));
}
