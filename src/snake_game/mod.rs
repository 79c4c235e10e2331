//! The snake session itself: board, snake, apple, score and the per-frame
//! update/draw pair. Nothing in here knows about Bevy; the host is reached
//! only through the traits in [`host`].

pub mod host;
pub mod rules;

use std::{
    collections::{HashSet, VecDeque},
    ops,
};

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use host::{Canvas, Host, Key, Sfx, FONT_HEIGHT, FONT_WIDTH};
pub use rules::{CheckOrder, DeathScreen, Rules, Variant};

pub const WIDTH: i16 = 40;
pub const HEIGHT: i16 = 50;
/// Rows reserved for the score readout at the top of the board.
pub const SCORE_HEIGHT: i16 = FONT_HEIGHT as i16;
pub const START: GridPoint = GridPoint { x: 5, y: 5 + SCORE_HEIGHT };

/// Random apple positions tried before falling back to a full scan of free cells.
pub const APPLE_ATTEMPTS: usize = 1_000;

pub const COL_BACKGROUND: u8 = 3;
pub const COL_BODY: u8 = 11;
pub const COL_HEAD: u8 = 7;
pub const COL_DEATH: u8 = 8;
pub const COL_APPLE: u8 = 8;
pub const COL_TEXT_DEATH: u8 = 0;
pub const COL_SCORE: u8 = 6;
pub const COL_SCORE_BACKGROUND: u8 = 5;

const TEXT_DEATH: [&str; 3] = ["GAME OVER", "(Q)UIT", "(R)ESTART"];
const HEIGHT_DEATH: i32 = 5;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug, Default)]
pub struct GridPoint {
    pub x: i16,
    pub y: i16,
}

impl GridPoint {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

impl ops::Add<Self> for GridPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        GridPoint { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Polled in this order; the first held key wins the frame.
    const BY_PRIORITY: [(Key, Direction); 4] = [
        (Key::Up, Direction::Up),
        (Key::Down, Direction::Down),
        (Key::Left, Direction::Left),
        (Key::Right, Direction::Right),
    ];

    pub fn to_point(self) -> GridPoint {
        match self {
            Direction::Up    => GridPoint { x: 0, y: -1 },
            Direction::Down  => GridPoint { x: 0, y: 1 },
            Direction::Left  => GridPoint { x: -1, y: 0 },
            Direction::Right => GridPoint { x: 1, y: 0 },
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up    => Direction::Down,
            Direction::Down  => Direction::Up,
            Direction::Left  => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum GameState {
    Alive,
    Dead,
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum DeathCause {
    Wall,
    Itself,
}

/// Everything observable about a session, minus its random source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Snapshot {
    pub variant: Variant,
    pub state: GameState,
    pub direction: Direction,
    pub snake: Vec<GridPoint>,
    pub apple: Option<GridPoint>,
    pub score: u32,
}

pub struct SnakeGame {
    pub variant: Variant,
    pub rules: Rules,
    pub direction: Direction,
    /// Head first.
    pub snake: VecDeque<GridPoint>,
    /// `None` only once the snake covers every cell an apple may use.
    pub apple: Option<GridPoint>,
    pub score: u32,
    pub state: GameState,
    popped_point: Option<GridPoint>,
    rng: StdRng,
}

impl SnakeGame {
    pub fn new_from_seed(variant: Variant, seed: u64) -> Self {
        Self::new(variant, StdRng::seed_from_u64(seed))
    }

    pub fn new_from_entropy(variant: Variant) -> Self {
        Self::new(variant, StdRng::from_entropy())
    }

    fn new(variant: Variant, rng: StdRng) -> Self {
        let mut game = SnakeGame {
            variant,
            rules: variant.rules(),
            direction: Direction::Right,
            snake: VecDeque::with_capacity(WIDTH as usize * HEIGHT as usize),
            apple: None,
            score: 0,
            state: GameState::Alive,
            popped_point: None,
            rng,
        };
        game.reset();
        game
    }

    pub fn reset(&mut self) {
        self.direction = Direction::Right;
        self.snake.clear();
        self.snake.push_back(START);
        self.popped_point = None;
        self.state = GameState::Alive;
        self.score = 0;
        self.generate_apple();
        debug!("new {:?} game, apple at {:?}", self.variant, self.apple);
    }

    pub fn head(&self) -> GridPoint {
        self.snake[0]
    }

    pub fn is_alive(&self) -> bool {
        self.state == GameState::Alive
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            variant: self.variant,
            state: self.state,
            direction: self.direction,
            snake: self.snake.iter().copied().collect(),
            apple: self.apple,
            score: self.score,
        }
    }

    /// One frame of game logic, followed by the quit and restart keys.
    pub fn update(&mut self, host: &mut impl Host) {
        if self.is_alive() {
            self.update_direction(&*host);
            self.update_snake();
            match self.rules.check_order {
                CheckOrder::DeathThenApple => {
                    self.check_death(host);
                    if self.is_alive() {
                        self.check_apple(host);
                    }
                }
                CheckOrder::AppleThenDeath => {
                    self.check_apple(host);
                    self.check_death(host);
                }
            }
        }

        if host.btn(Key::Quit) {
            info!("quit requested, final score {}", self.score);
            host.quit();
        }

        if self.rules.restart && host.btnp(Key::Restart) {
            info!("restarting");
            self.reset();
        }
    }

    fn update_direction(&mut self, host: &impl Host) {
        let Some(&(_, wanted)) = Direction::BY_PRIORITY.iter().find(|(key, _)| host.btn(*key)) else {
            return;
        };
        if self.rules.reverse_guard && wanted == self.direction.opposite() {
            return;
        }
        self.direction = wanted;
    }

    fn update_snake(&mut self) {
        let new_head = self.head() + self.direction.to_point();
        self.snake.push_front(new_head);
        self.popped_point = self.snake.pop_back();
    }

    fn check_apple(&mut self, host: &mut impl Host) {
        if self.apple != Some(self.head()) {
            return;
        }
        self.score += 1;
        if self.rules.sound {
            host.play(Sfx::Apple);
        }
        if let Some(tail) = self.popped_point.take() {
            self.snake.push_back(tail);
        }
        self.generate_apple();
        debug!("apple eaten, score {}, next apple {:?}", self.score, self.apple);
    }

    fn check_death(&mut self, host: &mut impl Host) {
        let Some(cause) = self.death_cause() else { return };
        self.state = GameState::Dead;
        if self.rules.sound {
            host.play(Sfx::Death);
        }
        info!("snake died ({cause:?}) at {:?} with score {}", self.head(), self.score);
        if let Ok(json) = serde_json::to_string(&self.snapshot()) {
            debug!("final state: {json}");
        }
    }

    fn death_cause(&self) -> Option<DeathCause> {
        let head = self.head();
        let above_board = if self.rules.lethal_score_row {
            head.y <= SCORE_HEIGHT
        } else {
            head.y < SCORE_HEIGHT
        };
        if head.x < 0 || head.x >= WIDTH || above_board || head.y >= HEIGHT {
            return Some(DeathCause::Wall);
        }
        if self.rules.self_collision {
            let distinct: HashSet<GridPoint> = self.snake.iter().copied().collect();
            if distinct.len() != self.snake.len() {
                return Some(DeathCause::Itself);
            }
        }
        None
    }

    pub fn generate_apple(&mut self) {
        self.apple = if self.rules.apple_exclusion {
            self.free_apple_location()
        } else {
            Some(GridPoint {
                x: self.rng.gen_range(0..WIDTH),
                y: self.rng.gen_range(0..HEIGHT),
            })
        };
    }

    fn free_apple_location(&mut self) -> Option<GridPoint> {
        let occupied: HashSet<GridPoint> = self.snake.iter().copied().collect();
        for _ in 0..APPLE_ATTEMPTS {
            let loc = GridPoint {
                x: self.rng.gen_range(0..WIDTH),
                y: self.rng.gen_range((SCORE_HEIGHT + 1)..HEIGHT),
            };
            if !occupied.contains(&loc) {
                return Some(loc);
            }
        }
        // Long snake: pick among whatever cells are still free.
        let free: Vec<GridPoint> = ((SCORE_HEIGHT + 1)..HEIGHT)
            .flat_map(|y| (0..WIDTH).map(move |x| GridPoint { x, y }))
            .filter(|pt| !occupied.contains(pt))
            .collect();
        free.choose(&mut self.rng).copied()
    }

    pub fn draw(&self, canvas: &mut impl Canvas) {
        match (self.state, self.rules.death_screen) {
            (GameState::Dead, DeathScreen::Title | DeathScreen::Full) => self.draw_death(canvas),
            _ => {
                canvas.cls(COL_BACKGROUND);
                self.draw_snake(canvas);
                self.draw_score(canvas);
                if let Some(apple) = self.apple {
                    canvas.pix(apple.x.into(), apple.y.into(), COL_APPLE);
                }
            }
        }
    }

    fn draw_snake(&self, canvas: &mut impl Canvas) {
        for (i, pt) in self.snake.iter().enumerate() {
            let col = if i == 0 { COL_HEAD } else { COL_BODY };
            canvas.pix(pt.x.into(), pt.y.into(), col);
        }
    }

    fn draw_score(&self, canvas: &mut impl Canvas) {
        canvas.rect(0, 0, WIDTH.into(), SCORE_HEIGHT.into(), COL_SCORE_BACKGROUND);
        canvas.text(1, 1, &format!("{:04}", self.score), COL_SCORE);
    }

    fn draw_death(&self, canvas: &mut impl Canvas) {
        canvas.cls(COL_DEATH);
        let lines: Vec<String> = match self.rules.death_screen {
            DeathScreen::Full => {
                let mut lines: Vec<String> = TEXT_DEATH.iter().map(|s| s.to_string()).collect();
                lines.insert(1, format!("{:04}", self.score));
                lines
            }
            _ => vec![TEXT_DEATH[0].to_string()],
        };
        for (i, text) in lines.iter().enumerate() {
            let y = HEIGHT_DEATH + (FONT_HEIGHT + 2) * i as i32;
            let x = center_text(text, WIDTH.into(), FONT_WIDTH);
            canvas.text(x, y, text, COL_TEXT_DEATH);
        }
    }
}

/// Left edge that centres `text` on a page `page_width` pixels wide.
pub fn center_text(text: &str, page_width: i32, char_width: i32) -> i32 {
    let text_width = text.chars().count() as i32 * char_width;
    (page_width - text_width).div_euclid(2)
}
