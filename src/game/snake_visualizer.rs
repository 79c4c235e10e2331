//! Runs the snake session inside Bevy. A repeating timer paces game frames;
//! between game frames keyboard input is latched so short taps still count.
//! Each game frame calls `update()`, and `draw()` then paints the tilemap
//! that fills the window. If a Bevy frame overruns, the missed game frames
//! are caught up before drawing.

use bevy::{
    prelude::*,
    render::{
        render_asset::RenderAssetUsages,
        render_resource::{Extent3d, TextureDimension, TextureFormat},
    },
    utils::HashSet,
};
use bevy_ecs_tilemap::map::{TilemapId, TilemapSize, TilemapTexture, TilemapTileSize, TilemapType};
use bevy_ecs_tilemap::prelude::get_tilemap_center_transform;
use bevy_ecs_tilemap::tiles::{TileBundle, TileColor, TilePos, TileStorage};
use bevy_ecs_tilemap::{TilemapBundle, TilemapPlugin};

use crate::cmdline::Args;
use crate::snake_game::host::{Host, Key, Sfx};
use crate::snake_game::{SnakeGame, HEIGHT, WIDTH};
use crate::AppSet;

use super::audio::sfx::PlaySfx;
use super::palette;
use super::tile_canvas::TileCanvas;

pub(super) fn plugin(app: &mut App) {
    let fps = app.world().resource::<Args>().fps;
    app.insert_resource(FrameClock::new(fps));
    app.init_resource::<KeyLatch>();

    app.add_plugins(TilemapPlugin);

    app.add_systems(Startup, spawn_playfield);
    app.add_systems(
        Update,
        (
            tick_frame_clock.in_set(AppSet::TickTimers),
            record_input.in_set(AppSet::RecordInput),
            (update_session, draw_session)
                .chain()
                .in_set(AppSet::Update)
                .run_if(frame_due),
        ),
    );
}

#[derive(Resource)]
pub struct Session(pub SnakeGame);

/// Game frames run at most this many times in one Bevy frame. Beyond that the
/// backlog is dropped rather than fast-forwarding the game.
const MAX_FRAMES_PER_TICK: u32 = 4;

#[derive(Resource)]
pub struct FrameClock(Timer);

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self(Timer::from_seconds(1.0 / fps as f32, TimerMode::Repeating))
    }

    pub fn period(&self) -> std::time::Duration {
        self.0.duration()
    }
}

/// Keys seen down, and keys newly pressed, since the last game frame.
#[derive(Resource, Default, Debug)]
pub struct KeyLatch {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
}

impl KeyLatch {
    fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }
}

fn key_codes(key: Key) -> &'static [KeyCode] {
    match key {
        Key::Up      => &[KeyCode::ArrowUp, KeyCode::KeyW],
        Key::Down    => &[KeyCode::ArrowDown, KeyCode::KeyS],
        Key::Left    => &[KeyCode::ArrowLeft, KeyCode::KeyA],
        Key::Right   => &[KeyCode::ArrowRight, KeyCode::KeyD],
        Key::Quit    => &[KeyCode::KeyQ],
        Key::Restart => &[KeyCode::KeyR],
    }
}

/// What the session sees of Bevy during one `update()`.
struct BevyHost<'a> {
    latch: &'a KeyLatch,
    sounds: Vec<Sfx>,
    quit: bool,
}

impl Host for BevyHost<'_> {
    fn btn(&self, key: Key) -> bool {
        self.latch.held.contains(&key)
    }

    fn btnp(&self, key: Key) -> bool {
        self.latch.pressed.contains(&key)
    }

    fn play(&mut self, sfx: Sfx) {
        self.sounds.push(sfx);
    }

    fn quit(&mut self) {
        self.quit = true;
    }
}

/// A single white texel. Tiles take their colour from `TileColor`.
fn blank_tile_image() -> Image {
    Image::new_fill(
        Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0xFF; 4],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

fn spawn_playfield(mut commands: Commands, mut images: ResMut<Assets<Image>>, args: Res<Args>) {
    let game = match args.seed {
        Some(seed) => SnakeGame::new_from_seed(args.variant, seed),
        None => SnakeGame::new_from_entropy(args.variant),
    };
    info!("starting {:?} snake at {} fps", args.variant, args.fps);

    let texture_handle = images.add(blank_tile_image());
    let map_size = TilemapSize { x: WIDTH as u32, y: HEIGHT as u32 };
    let mut tile_storage = TileStorage::empty(map_size);
    let map_type = TilemapType::Square;
    let tilemap_entity = commands.spawn_empty().id();
    for x in 0..map_size.x {
        for y in 0..map_size.y {
            let tile_pos = TilePos { x, y };
            let tile_entity = commands
                .spawn(TileBundle {
                    position: tile_pos,
                    tilemap_id: TilemapId(tilemap_entity),
                    color: TileColor(palette::color(0)),
                    ..Default::default()
                })
                .id();
            tile_storage.set(&tile_pos, tile_entity);
        }
    }
    // One world unit per board pixel; the camera shows `HEIGHT` units vertically.
    let tile_size = TilemapTileSize { x: 1.0, y: 1.0 };
    let grid_size = tile_size.into();
    commands.entity(tilemap_entity).insert((
        Name::new("Playfield"),
        TilemapBundle {
            grid_size,
            size: map_size,
            storage: tile_storage,
            map_type,
            texture: TilemapTexture::Single(texture_handle),
            tile_size,
            transform: get_tilemap_center_transform(&map_size, &grid_size, &map_type, 0.0),
            ..Default::default()
        },
    ));
    commands.insert_resource(Session(game));
}

fn tick_frame_clock(time: Res<Time>, mut clock: ResMut<FrameClock>) {
    clock.0.tick(time.delta());
}

fn frame_due(clock: Res<FrameClock>) -> bool {
    clock.0.just_finished()
}

fn record_input(input: Res<ButtonInput<KeyCode>>, mut latch: ResMut<KeyLatch>) {
    for key in Key::ALL {
        let codes = key_codes(key);
        if input.any_pressed(codes.iter().copied()) {
            latch.held.insert(key);
        }
        if input.any_just_pressed(codes.iter().copied()) {
            latch.pressed.insert(key);
        }
    }
}

fn update_session(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mut latch: ResMut<KeyLatch>,
    clock: Res<FrameClock>,
    args: Res<Args>,
    mut exit: EventWriter<AppExit>,
) {
    let due = clock.0.times_finished_this_tick();
    let frames = due.min(MAX_FRAMES_PER_TICK);
    if due > frames {
        warn!("dropping {} game frames after a long stall", due - frames);
    } else if frames > 1 {
        debug!("catching up {} game frames", frames - 1);
    }
    let mut quit = false;
    for _ in 0..frames {
        let mut host = BevyHost {
            latch: &latch,
            sounds: Vec::new(),
            quit: false,
        };
        session.0.update(&mut host);
        let BevyHost { sounds, quit: quit_requested, .. } = host;

        if !args.mute {
            for sfx in sounds {
                commands.trigger(PlaySfx::Key(sfx.into()));
            }
        }
        // A tap counts once; held keys keep steering the caught-up frames.
        latch.pressed.clear();
        if quit_requested {
            quit = true;
            break;
        }
    }
    if quit {
        exit.send(AppExit::Success);
    }
    latch.clear();
}

fn draw_session(session: Res<Session>, tilemaps: Query<&TileStorage>, mut colors: Query<&'static mut TileColor>) {
    let Ok(storage) = tilemaps.get_single() else {
        return;
    };
    session.0.draw(&mut TileCanvas { storage, colors: &mut colors });
}

#[cfg(test)]
mod tests {
    use bevy::utils::HashMap;
    use clap::Parser;

    use super::*;
    use crate::game::assets::{HandleMap, SfxKey};
    use crate::snake_game::{Direction, GridPoint, COL_HEAD, COL_SCORE_BACKGROUND, START};

    fn test_app(extra_args: &[&str]) -> App {
        let args = Args::parse_from(["pixel-snake", "--seed", "4"].iter().chain(extra_args));
        let mut app = App::new();
        app.insert_resource(FrameClock::new(args.fps));
        app.insert_resource(args);
        app.init_resource::<Time>();
        app.init_resource::<Assets<Image>>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<KeyLatch>();
        app.add_event::<AppExit>();
        app.add_systems(Startup, spawn_playfield);
        app.add_systems(
            Update,
            (
                tick_frame_clock,
                record_input,
                (update_session, draw_session).chain().run_if(frame_due),
            )
                .chain(),
        );
        app
    }

    /// Registers the sound observer with a silent clip for the apple only.
    fn with_apple_sound(app: &mut App) {
        app.init_resource::<Assets<AudioSource>>();
        app.add_plugins(crate::game::audio::plugin);
        let clip = AudioSource { bytes: Vec::new().into() };
        let handle = app.world_mut().resource_mut::<Assets<AudioSource>>().add(clip);
        let mut handles = HashMap::default();
        handles.insert(SfxKey::Apple, handle);
        app.insert_resource(HandleMap::<SfxKey>::from(handles));
    }

    /// Runs one Bevy frame lasting `game_frames` game periods.
    fn advance(app: &mut App, game_frames: u32) {
        let period = app.world().resource::<FrameClock>().period();
        app.world_mut().resource_mut::<Time>().advance_by(period * game_frames);
        app.update();
    }

    fn press(app: &mut App, code: KeyCode) {
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(code);
    }

    fn session(app: &App) -> &SnakeGame {
        &app.world().resource::<Session>().0
    }

    /// Puts the apple right in front of the snake and runs the frame that eats it.
    fn eat_apple(app: &mut App) {
        advance(app, 1);
        let mut session = app.world_mut().resource_mut::<Session>();
        let ahead = session.0.head() + session.0.direction.to_point();
        session.0.apple = Some(ahead);
        advance(app, 1);
    }

    fn playing_sounds(app: &mut App) -> usize {
        let mut sources = app.world_mut().query::<&Handle<AudioSource>>();
        sources.iter(app.world()).count()
    }

    fn tile_color(app: &mut App, point: GridPoint) -> Color {
        let world = app.world_mut();
        let mut maps = world.query::<&TileStorage>();
        let storage = maps.single(world);
        let pos = TilePos { x: point.x as u32, y: storage.size.y - 1 - point.y as u32 };
        let tile = storage.get(&pos).unwrap();
        world.get::<TileColor>(tile).unwrap().0
    }

    #[test]
    fn each_frame_moves_the_snake() {
        let mut app = test_app(&[]);
        advance(&mut app, 1);
        assert_eq!(session(&app).head(), GridPoint::new(START.x + 1, START.y));
        advance(&mut app, 1);
        assert_eq!(session(&app).head(), GridPoint::new(START.x + 2, START.y));
    }

    #[test]
    fn nothing_moves_between_game_frames() {
        let mut app = test_app(&["--fps", "10"]);
        app.update();
        assert_eq!(session(&app).head(), START);
        advance(&mut app, 1);
        assert_eq!(session(&app).head(), GridPoint::new(START.x + 1, START.y));
    }

    #[test]
    fn a_long_bevy_frame_catches_up() {
        let mut app = test_app(&[]);
        advance(&mut app, 1);
        advance(&mut app, 3);
        assert_eq!(session(&app).head(), GridPoint::new(START.x + 4, START.y));
    }

    #[test]
    fn a_stall_drops_the_backlog() {
        let mut app = test_app(&[]);
        advance(&mut app, 1);
        advance(&mut app, 50);
        let moved = START.x + 1 + MAX_FRAMES_PER_TICK as i16;
        assert_eq!(session(&app).head(), GridPoint::new(moved, START.y));
    }

    #[test]
    fn wasd_steers() {
        let mut app = test_app(&[]);
        press(&mut app, KeyCode::KeyS);
        advance(&mut app, 1);
        assert_eq!(session(&app).direction, Direction::Down);
        assert_eq!(session(&app).head(), GridPoint::new(START.x, START.y + 1));
    }

    #[test]
    fn quit_key_exits() {
        let mut app = test_app(&[]);
        advance(&mut app, 1);
        assert_eq!(app.should_exit(), None);
        press(&mut app, KeyCode::KeyQ);
        advance(&mut app, 1);
        assert_eq!(app.should_exit(), Some(AppExit::Success));
    }

    #[test]
    fn latch_is_emptied_by_each_game_frame() {
        let mut app = test_app(&[]);
        press(&mut app, KeyCode::ArrowUp);
        advance(&mut app, 1);
        let latch = app.world().resource::<KeyLatch>();
        assert!(latch.held.is_empty());
        assert!(latch.pressed.is_empty());
    }

    #[test]
    fn latch_keeps_taps_until_consumed() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<KeyLatch>();
        app.add_systems(Update, record_input);

        press(&mut app, KeyCode::ArrowLeft);
        app.update();
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().reset_all();
        app.update();

        let latch = app.world().resource::<KeyLatch>();
        assert!(latch.held.contains(&Key::Left));
        assert!(latch.pressed.contains(&Key::Left));
        assert!(!latch.held.contains(&Key::Right));
    }

    #[test]
    fn session_is_drawn_onto_the_tilemap() {
        let mut app = test_app(&[]);
        advance(&mut app, 1);
        let head = session(&app).head();
        assert_eq!(tile_color(&mut app, head), palette::color(COL_HEAD));
        let score_bar = GridPoint::new(WIDTH - 1, 0);
        assert_eq!(tile_color(&mut app, score_bar), palette::color(COL_SCORE_BACKGROUND));
    }

    #[test]
    fn eating_plays_the_apple_sound() {
        let mut app = test_app(&[]);
        with_apple_sound(&mut app);
        eat_apple(&mut app);
        assert_eq!(session(&app).score, 1);
        assert_eq!(playing_sounds(&mut app), 1);
    }

    #[test]
    fn mute_silences_sounds() {
        let mut app = test_app(&["--mute"]);
        with_apple_sound(&mut app);
        eat_apple(&mut app);
        assert_eq!(session(&app).score, 1);
        assert_eq!(playing_sounds(&mut app), 0);
    }

    #[test]
    fn missing_sound_is_skipped() {
        let mut app = test_app(&[]);
        app.add_plugins(crate::game::audio::plugin);
        app.insert_resource(HandleMap::<SfxKey>::from(HashMap::<SfxKey, Handle<AudioSource>>::default()));
        eat_apple(&mut app);
        assert_eq!(session(&app).score, 1);
        assert_eq!(playing_sounds(&mut app), 0);
    }

    #[test]
    fn frame_clock_fires_at_the_frame_rate() {
        let mut clock = FrameClock::new(20);
        clock.0.tick(std::time::Duration::from_millis(30));
        assert!(!clock.0.just_finished());
        clock.0.tick(std::time::Duration::from_millis(30));
        assert!(clock.0.just_finished());
    }
}
