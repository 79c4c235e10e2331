use bevy::prelude::*;

pub mod sfx;
pub mod synth;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(sfx::plugin);
}
