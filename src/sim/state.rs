//! Simulation state and entity types
//!
//! Global world scalars live in [`SimulationState`]; each spawner owns an
//! [`EntityPool`] of its live entities.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Body;
use crate::error;
use crate::tuning::Tuning;

/// Stable identity of a world entity, unique for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const PLAYER: EntityId = EntityId(1);
    /// The two scrolling background bands
    pub const BACKGROUND: [EntityId; 2] = [EntityId(2), EntityId(3)];
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out entity ids; never reuses one within a world
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        // Ids below 16 are reserved for fixed scene entities
        Self { next: 16 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Background,
    Bullet,
    /// Indicator shown at the row a bullet is about to cross
    Warning,
    Coin,
    Powerup,
    CollectedPowerup,
    Robot,
    Obstacle,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Immortality,
    Lightspeed,
    Magnet,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 3] = [
        PowerupKind::Immortality,
        PowerupKind::Lightspeed,
        PowerupKind::Magnet,
    ];

    /// Effect duration in seconds
    pub fn duration(self, tuning: &Tuning) -> f32 {
        match self {
            PowerupKind::Immortality => tuning.immortality_duration,
            PowerupKind::Lightspeed => tuning.lightspeed_duration,
            PowerupKind::Magnet => tuning.magnet_duration,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleOrientation {
    Horizontal,
    Vertical,
    Rotating,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BulletPhase {
    /// Parked off-screen while the warning shows
    Warning,
    /// Crossing the screen at `speed` points per second
    Firing { speed: f32 },
}

/// Per-kind entity data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    Bullet {
        phase: BulletPhase,
        warning: EntityId,
        /// Travel time captured when the bullet was created
        duration: f32,
    },
    Coin {
        /// Homing toward the player; sticky once set
        seeking: bool,
    },
    Powerup(PowerupKind),
    Robot {
        direction: RobotDirection,
        /// Signed horizontal speed in points per second
        velocity: f32,
    },
    Obstacle {
        orientation: ObstacleOrientation,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: Body,
    /// Tick on which the entity was created
    pub created_tick: u64,
    pub tag: Tag,
}

impl Entity {
    pub fn position(&self) -> Vec2 {
        self.body.position
    }
}

/// Live entities of one spawner, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct EntityPool {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityPool {
    pub fn insert(&mut self, entity: Entity) {
        if self.entities.contains_key(&entity.id) {
            let _ = error::invariant(format!("duplicate entity id {}", entity.id));
            return;
        }
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity; removing an absent id is a no-op
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Empty the pool, returning everything that was in it
    pub fn drain(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entities).into_values().collect()
    }
}

/// Gravity applied with the jetpack on and off
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityProfile {
    pub powered_on: Vec2,
    pub powered_off: Vec2,
}

impl GravityProfile {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            powered_on: Vec2::new(0.0, tuning.gravity_powered_on),
            powered_off: Vec2::new(0.0, tuning.gravity_powered_off),
        }
    }
}

/// Session-wide scalars, mutated only by the world tick and the ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Metres travelled; never decreases within a session
    pub distance: f64,
    /// Scroll speed in points per tick
    pub speed: f32,
    pub gravity: GravityProfile,
    /// Ramp steps applied so far
    pub difficulty_step: u32,
    /// Distance gained per tick outside lightspeed
    pub distance_step: f64,
    /// Speed before death, restored on revive
    pub last_speed: Option<f32>,
    /// Highest 100 m milestone already accounted for
    last_milestone: u32,
}

impl SimulationState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            distance: 0.0,
            speed: tuning.initial_speed,
            gravity: GravityProfile::new(tuning),
            difficulty_step: 0,
            distance_step: tuning.distance_step,
            last_speed: None,
            last_milestone: 0,
        }
    }

    /// Distance gained this tick
    pub fn distance_delta(&self, lightspeed: bool, tuning: &Tuning) -> f64 {
        if self.speed == 0.0 {
            0.0
        } else if lightspeed {
            tuning.lightspeed_distance_step
        } else {
            self.distance_step
        }
    }

    /// Advance the distance and return how many ramp steps are due.
    ///
    /// Each milestone (rounded distance reaching a multiple of the ramp
    /// interval) is counted once. Milestones crossed during lightspeed are
    /// consumed without ramping.
    pub fn advance_distance(&mut self, delta: f64, lightspeed: bool, interval: u32) -> u32 {
        if delta <= 0.0 {
            if delta < 0.0 {
                let _ = error::invariant(format!("negative distance delta {delta}"));
            }
            return 0;
        }
        self.distance += delta;

        let rounded = self.distance.round() as u64;
        let milestone = (rounded / interval.max(1) as u64) as u32;
        if milestone <= self.last_milestone {
            return 0;
        }
        let crossed = milestone - self.last_milestone;
        self.last_milestone = milestone;
        if lightspeed { 0 } else { crossed }
    }

    /// Apply one ramp step. Returns true if the fine-grained part (distance
    /// step and bullet travel time) applied as well.
    pub fn apply_ramp(&mut self, tuning: &Tuning) -> bool {
        self.difficulty_step += 1;
        self.speed += tuning.speed_step;
        self.gravity.powered_on.y += tuning.gravity_step;
        self.gravity.powered_off.y -= tuning.gravity_step;

        let fine = self.speed > tuning.fine_ramp_min_speed
            && self.distance_step < tuning.distance_step_cap;
        if fine {
            self.distance_step += tuning.distance_step_increment;
        }
        fine
    }

    /// Stop scrolling, remembering the speed for a revive
    pub fn set_speed_to_zero(&mut self) {
        if self.speed != 0.0 {
            self.last_speed = Some(self.speed);
        }
        self.speed = 0.0;
    }

    pub fn restore_speed(&mut self, tuning: &Tuning) {
        self.speed = self.last_speed.unwrap_or(tuning.initial_speed);
    }

    /// Clamp speed back into range after any mutation
    pub fn check_speed(&mut self) {
        if self.speed < 0.0 || !self.speed.is_finite() {
            let _ = error::invariant(format!("speed out of range: {}", self.speed));
            self.speed = 0.0;
        }
    }
}

/// Events queued for the UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    DistanceChanged(f64),
    CoinCountChanged(u32),
    GameStarted,
    GameOver,
    PowerupAlert(PowerupKind),
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first thrust
    Idle,
    Running,
    /// Player died; the world keeps ticking until reset or revive
    GameOver,
}
