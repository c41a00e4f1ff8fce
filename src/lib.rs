//! Ninja Jetpack - a side-scrolling jetpack arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world tick, spawners, player, collisions)
//! - `renderer`: Render sink boundary the simulation draws through
//! - `session`: UI event callbacks
//! - `persistence`: Wallet storage (high score, coins, purchased powerups)
//! - `coin_data`: Coin formation layouts
//! - `tuning`: Data-driven game balance

pub mod coin_data;
pub mod error;
pub mod persistence;
pub mod renderer;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::GameError;
pub use sim::{TickInput, World, tick};

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz; speeds are per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Scene dimensions in points
    pub const SCENE_WIDTH: f32 = 896.0;
    pub const SCENE_HEIGHT: f32 = 414.0;
    /// Top of the ground strip
    pub const GROUND_Y: f32 = 20.0;

    /// Gravity is given in m/s²
    pub const PIXELS_PER_METER: f32 = 150.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 30.0;
    pub const PLAYER_START: Vec2 = Vec2::new(200.0, 50.0);
    /// Length of the reverse death animation
    pub const REVIVE_ANIMATION_TIME: f32 = 0.5;

    pub const BULLET_RADIUS: f32 = 10.0;
    pub const WARNING_SIZE: f32 = 30.0;

    /// Coin grid pitch
    pub const COIN_CELL: f32 = 17.0;
    pub const COIN_RADIUS: f32 = 8.5;

    pub const POWERUP_RADIUS: f32 = 20.0;
    pub const OBSTACLE_SIZE: Vec2 = Vec2::new(150.0, 30.0);
    pub const ROBOT_SIZE: Vec2 = Vec2::new(60.0, 75.0);
}

/// Zero-padded HUD counter ("0012")
pub fn format_counter(value: u32) -> String {
    format!("{value:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_counter() {
        assert_eq!(format_counter(0), "0000");
        assert_eq!(format_counter(12), "0012");
        assert_eq!(format_counter(12345), "12345");
    }
}
