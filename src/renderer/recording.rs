//! Render sink that records every call
//!
//! Cloning a [`RecordingRenderer`] shares the same log, so a test can hand one
//! clone to the world and inspect the other.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec2;

use super::{FrameSet, ParticleEffect, RenderSink};
use crate::sim::{EntityId, EntityKind, Shape};

/// A live render handle
#[derive(Debug, Clone, Copy)]
pub struct LiveEntity {
    pub kind: EntityKind,
    pub position: Vec2,
    pub rotation: f32,
}

/// An animation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationCall {
    pub id: EntityId,
    pub frames: FrameSet,
    pub fps: f32,
    pub looping: bool,
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub live: BTreeMap<EntityId, LiveEntity>,
    pub animations: Vec<AnimationCall>,
    pub particles: Vec<(ParticleEffect, Vec2)>,
    /// Removals or pose updates for ids that were never added
    pub unknown_handles: usize,
}

impl RenderLog {
    pub fn live_of_kind(&self, kind: EntityKind) -> usize {
        self.live.values().filter(|e| e.kind == kind).count()
    }

    pub fn last_animation(&self, id: EntityId) -> Option<AnimationCall> {
        self.animations.iter().rev().find(|a| a.id == id).copied()
    }

    pub fn animation_count(&self, id: EntityId) -> usize {
        self.animations.iter().filter(|a| a.id == id).count()
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    log: Rc<RefCell<RenderLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::cell::Ref<'_, RenderLog> {
        self.log.borrow()
    }
}

impl RenderSink for RecordingRenderer {
    fn add_entity(&mut self, id: EntityId, kind: EntityKind, position: Vec2, _shape: Shape) {
        self.log.borrow_mut().live.insert(
            id,
            LiveEntity {
                kind,
                position,
                rotation: 0.0,
            },
        );
    }

    fn remove_entity(&mut self, id: EntityId) {
        let mut log = self.log.borrow_mut();
        if log.live.remove(&id).is_none() {
            log.unknown_handles += 1;
        }
    }

    fn update_pose(&mut self, id: EntityId, position: Vec2, rotation: f32) {
        let mut log = self.log.borrow_mut();
        match log.live.get_mut(&id) {
            Some(entity) => {
                entity.position = position;
                entity.rotation = rotation;
            }
            None => log.unknown_handles += 1,
        }
    }

    fn play_animation(&mut self, id: EntityId, frames: FrameSet, fps: f32, looping: bool) {
        self.log.borrow_mut().animations.push(AnimationCall {
            id,
            frames,
            fps,
            looping,
        });
    }

    fn emit_particles(&mut self, effect: ParticleEffect, position: Vec2) {
        self.log.borrow_mut().particles.push((effect, position));
    }
}
