//! Render sink boundary
//!
//! The simulation never touches pixels or textures. It describes logical
//! entities (id, kind, pose, collision shape) and named animation sets, and a
//! [`RenderSink`] turns those into whatever the platform draws.

mod recording;

pub use recording::{RecordingRenderer, RenderLog};

use glam::Vec2;

use crate::sim::{EntityId, EntityKind, PowerupKind, Shape};

/// Named animation frame sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Idle,
    Run,
    RunImmortal,
    RunMagnet,
    Fly,
    FlyImmortal,
    FlyMagnet,
    Dead,
    /// Death frames played backwards
    Revive,
    Robot,
    Powerup(PowerupKind),
}

/// Fire-and-forget particle effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleEffect {
    JetpackFlame,
    /// Impact burst where the player was hit
    Shot,
    Lightspeed,
}

pub trait RenderSink {
    fn add_entity(&mut self, id: EntityId, kind: EntityKind, position: Vec2, shape: Shape);

    fn remove_entity(&mut self, id: EntityId);

    fn update_pose(&mut self, id: EntityId, position: Vec2, rotation: f32);

    fn play_animation(&mut self, id: EntityId, frames: FrameSet, fps: f32, looping: bool);

    fn emit_particles(&mut self, effect: ParticleEffect, position: Vec2);
}

/// Sink that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn add_entity(&mut self, _id: EntityId, _kind: EntityKind, _position: Vec2, _shape: Shape) {}
    fn remove_entity(&mut self, _id: EntityId) {}
    fn update_pose(&mut self, _id: EntityId, _position: Vec2, _rotation: f32) {}
    fn play_animation(&mut self, _id: EntityId, _frames: FrameSet, _fps: f32, _looping: bool) {}
    fn emit_particles(&mut self, _effect: ParticleEffect, _position: Vec2) {}
}
