use bevy::{audio::PlaybackMode, prelude::*};

use crate::game::assets::{HandleMap, SfxKey};

pub(super) fn plugin(app: &mut App) {
    app.observe(play_sfx);
}

fn play_sfx(
    trigger: Trigger<PlaySfx>,
    mut commands: Commands,
    sfx_handles: Res<HandleMap<SfxKey>>,
) {
    let PlaySfx::Key(sfx_key) = trigger.event();
    let Some(source) = sfx_handles.get(sfx_key) else {
        debug!("no sound registered for {sfx_key:?}");
        return;
    };
    commands.spawn(AudioSourceBundle {
        source: source.clone_weak(),
        settings: PlaybackSettings {
            mode: PlaybackMode::Despawn,
            ..default()
        },
    });
}

/// Trigger this event to play a single sound effect.
#[derive(Event)]
pub enum PlaySfx {
    Key(SfxKey),
}
