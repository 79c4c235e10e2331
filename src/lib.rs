pub mod cmdline;
pub mod game;
pub mod snake_game;

use bevy::{
    asset::AssetMetaCheck,
    audio::{AudioPlugin, Volume},
    log::LogPlugin,
    prelude::*,
    render::camera::ScalingMode,
    window::WindowResolution,
};

use cmdline::Args;
use snake_game::{HEIGHT, WIDTH};

pub struct AppPlugin {
    pub args: Args,
}

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.args.clone());

        // Order new `AppSet` variants by adding them here:
        app.configure_sets(
            Update,
            (AppSet::TickTimers, AppSet::RecordInput, AppSet::Update).chain(),
        );

        // Spawn the main camera.
        app.add_systems(Startup, spawn_camera);
        app.insert_resource(ClearColor(game::palette::color(0)));

        let window_x = (WIDTH as u32 * self.args.scale) as f32;
        let window_y = (HEIGHT as u32 * self.args.scale) as f32;

        // Add Bevy plugins.
        app.add_plugins(
            DefaultPlugins
                .set(AssetPlugin {
                    // Wasm builds will check for meta files (that don't exist) if this isn't set.
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Window {
                        title: "Snake!".to_string(),
                        canvas: Some("#bevy".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: true,
                        resolution: WindowResolution::new(window_x, window_y).with_scale_factor_override(1.0),
                        ..default()
                    }
                    .into(),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "wgpu=error,naga=warn,pixel_snake=debug".to_string(),
                    ..default()
                })
                .set(AudioPlugin {
                    global_volume: GlobalVolume {
                        volume: Volume::new(0.5),
                    },
                    ..default()
                }),
        );

        // Add other plugins.
        app.add_plugins(game::plugin);
    }
}

/// High-level groupings of systems for the app in the `Update` schedule.
/// When adding a new variant, make sure to order it in the `configure_sets`
/// call above.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash)]
enum AppSet {
    /// Tick timers.
    TickTimers,
    /// Record player input.
    RecordInput,
    /// Run a game frame when one is due.
    Update,
}

fn spawn_camera(mut commands: Commands) {
    let mut camera = Camera2dBundle::default();

    // Keep the whole board in view whatever shape the window is resized to.
    camera.projection.scaling_mode = ScalingMode::FixedVertical(HEIGHT as f32);

    commands.spawn((
        Name::new("Camera"),
        camera,
        IsDefaultUiCamera,
    ));
}
