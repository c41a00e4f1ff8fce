//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, storage or UI dependencies beyond the collaborator traits

pub mod activation;
pub mod clock;
pub mod collision;
pub mod player;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod world;

pub use activation::{Activation, ActivationManager, Effects};
pub use clock::{Scheduler, TimerKey};
pub use collision::{Body, Category, Contact, ContactKind, Shape};
pub use player::{Mode, Overlay, Player};
pub use spawn::Spawner;
pub use state::{
    BulletPhase, Entity, EntityId, EntityKind, EntityPool, GameEvent, GamePhase, GravityProfile,
    ObstacleOrientation, PowerupKind, RobotDirection, SimulationState, Tag,
};
pub use tick::{TickInput, tick};
pub use world::World;
