use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The four released iterations of the game, oldest first.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug, Default, ValueEnum)]
pub enum Variant {
    /// Walls only, apple anywhere, no death screen.
    Basic,
    /// Apples kept off the snake and the score bar, plain death screen.
    Bounded,
    /// Reversal guard, self-collision, restart. Apples are checked before death.
    Guarded,
    /// Everything, plus sound and a scored death screen.
    #[default]
    Complete,
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum CheckOrder {
    DeathThenApple,
    AppleThenDeath,
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum DeathScreen {
    /// Dead sessions keep showing the frozen board.
    None,
    Title,
    /// Title, final score, and the quit/restart hints.
    Full,
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Rules {
    pub reverse_guard: bool,
    pub self_collision: bool,
    pub apple_exclusion: bool,
    /// The row just below the score bar kills as well.
    pub lethal_score_row: bool,
    pub check_order: CheckOrder,
    pub death_screen: DeathScreen,
    pub restart: bool,
    pub sound: bool,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Basic,
        Variant::Bounded,
        Variant::Guarded,
        Variant::Complete,
    ];

    pub fn rules(self) -> Rules {
        match self {
            Variant::Basic => Rules {
                reverse_guard: false,
                self_collision: false,
                apple_exclusion: false,
                lethal_score_row: false,
                check_order: CheckOrder::DeathThenApple,
                death_screen: DeathScreen::None,
                restart: false,
                sound: false,
            },
            Variant::Bounded => Rules {
                apple_exclusion: true,
                death_screen: DeathScreen::Title,
                ..Variant::Basic.rules()
            },
            Variant::Guarded => Rules {
                reverse_guard: true,
                self_collision: true,
                check_order: CheckOrder::AppleThenDeath,
                restart: true,
                ..Variant::Bounded.rules()
            },
            Variant::Complete => Rules {
                lethal_score_row: true,
                check_order: CheckOrder::DeathThenApple,
                death_screen: DeathScreen::Full,
                sound: true,
                ..Variant::Guarded.rules()
            },
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Variant::default().rules()
    }
}
