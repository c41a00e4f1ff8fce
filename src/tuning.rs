//! Data-driven game balance
//!
//! Every timing and ramp constant the simulation uses. Defaults reproduce the
//! shipped game; a JSON file can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Base delay plus a uniform jitter of `± jitter` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    pub base: f32,
    pub jitter: f32,
}

impl Cadence {
    pub const fn new(base: f32, jitter: f32) -> Self {
        Self { base, jitter }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World speed and distance ===
    /// Scroll speed at session start (points per tick)
    pub initial_speed: f32,
    /// Speed added at every ramp step
    pub speed_step: f32,
    /// Distance gained per tick at session start
    pub distance_step: f64,
    /// Distance step never grows past this
    pub distance_step_cap: f64,
    pub distance_step_increment: f64,
    /// Distance and bullet fine-tuning only kicks in above this speed
    pub fine_ramp_min_speed: f32,
    /// Metres between ramp steps
    pub ramp_interval: u32,
    pub lightspeed_distance_step: f64,
    /// Scroll speed shown while lightspeed is active
    pub lightspeed_visual_speed: f32,

    // === Gravity (m/s², scaled by `consts::PIXELS_PER_METER`) ===
    pub gravity_powered_on: f32,
    pub gravity_powered_off: f32,
    /// Gravity while no session is running
    pub gravity_idle: f32,
    pub gravity_step: f32,

    // === Bullets ===
    pub bullet_duration: f32,
    pub bullet_duration_floor: f32,
    pub bullet_duration_step: f32,
    pub bullet_warning: f32,

    // === Robots (traversal time in seconds) ===
    pub robot_forward_duration: f32,
    pub robot_backward_duration: f32,
    pub robot_duration_step: f32,
    pub robot_duration_floor: f32,
    pub robot_lightspeed_duration: f32,
    /// Retreat after death takes `forward - offset` seconds
    pub robot_retreat_offset: f32,

    // === Powerups ===
    pub immortality_duration: f32,
    pub lightspeed_duration: f32,
    pub magnet_duration: f32,
    /// Grace window granted when lightspeed ends
    pub lightspeed_grace: f32,
    pub revive_grace: f32,
    pub revive_speed_delay: f32,
    pub death_pause: f32,

    // === Coins ===
    /// Homing speed of a seeking coin (points per tick)
    pub coin_seek_speed: f32,

    // === Player ===
    /// Above this height the player counts as airborne
    pub ground_threshold: f32,
    /// Landing below this height switches back to running
    pub landing_threshold: f32,

    // === Spawn cadences ===
    pub bullet_cadence: Cadence,
    pub coin_cadence: Cadence,
    pub powerup_cadence: Cadence,
    pub robot_cadence: Cadence,
    pub obstacle_cadence: Cadence,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_speed: 6.0,
            speed_step: 0.5,
            distance_step: 0.18,
            distance_step_cap: 0.2,
            distance_step_increment: 0.001,
            fine_ramp_min_speed: 7.0,
            ramp_interval: 100,
            lightspeed_distance_step: 0.4,
            lightspeed_visual_speed: 50.0,

            gravity_powered_on: 9.0,
            gravity_powered_off: -5.0,
            gravity_idle: -5.0,
            gravity_step: 0.01,

            bullet_duration: 0.4,
            bullet_duration_floor: 0.2,
            bullet_duration_step: 0.001,
            bullet_warning: 0.8,

            robot_forward_duration: 15.0,
            robot_backward_duration: 1.0,
            robot_duration_step: 0.005,
            robot_duration_floor: 0.2,
            robot_lightspeed_duration: 0.2,
            robot_retreat_offset: 10.0,

            immortality_duration: 15.0,
            lightspeed_duration: 5.0,
            magnet_duration: 15.0,
            lightspeed_grace: 3.0,
            revive_grace: 4.0,
            revive_speed_delay: 0.5,
            death_pause: 1.0,

            coin_seek_speed: 16.0,

            ground_threshold: 55.0,
            landing_threshold: 50.0,

            bullet_cadence: Cadence::new(3.0, 2.0),
            coin_cadence: Cadence::new(4.0, 2.0),
            powerup_cadence: Cadence::new(15.0, 8.0),
            robot_cadence: Cadence::new(1.5, 0.5),
            obstacle_cadence: Cadence::new(2.0, 1.0),
        }
    }
}

impl Tuning {
    /// Parse a tuning override; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|e| GameError::Config(e.to_string()))
    }

    /// Load a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| GameError::Config(format!("{}: {e}", path.display())))?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }
}
