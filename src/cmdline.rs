use bevy::prelude::Resource;
use clap::Parser;

use crate::snake_game::Variant;

#[derive(Parser, Resource, Clone, Debug)]
#[command(name = "pixel-snake", version, about = "Snake on a 40x50 pixel board")]
pub struct Args {
    /// Which iteration of the rules to play
    #[arg(long, value_enum, default_value_t = Variant::Complete)]
    pub variant: Variant,

    /// Window pixels per board pixel
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=32))]
    pub scale: u32,

    /// Game frames per second
    #[arg(long, default_value_t = 22, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Seed for apple placement, for repeatable games
    #[arg(long)]
    pub seed: Option<u64>,

    /// Play without sound effects
    #[arg(long)]
    pub mute: bool,
}
