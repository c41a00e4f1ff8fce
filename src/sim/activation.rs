//! Powerup activations
//!
//! Collected powerups are kept oldest first. Each one owns a HUD slot equal
//! to its index in the list, so removing one shifts every later activation
//! down a slot. The boolean effects are derived from which kinds are present:
//! two magnets keep the magnet effect on until the second one runs out.

use glam::Vec2;

use super::state::{EntityId, PowerupKind};
use crate::consts::*;
use crate::renderer::RenderSink;

/// Travel time from the pickup point to the HUD slot
const PICKUP_TWEEN: f32 = 1.0;
/// Travel time when sliding into a freed slot
const SHIFT_TWEEN: f32 = 0.5;

/// On-screen position of a HUD slot
pub fn slot_position(slot: usize) -> Vec2 {
    Vec2::new(
        SCENE_WIDTH - 120.0 - 30.0 * slot as f32,
        SCENE_HEIGHT - 42.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tween {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
}

impl Tween {
    fn new(from: Vec2, to: Vec2, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
        }
    }

    /// Advance; returns the new position and whether the tween is done
    fn step(&mut self, dt: f32) -> (Vec2, bool) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        };
        (self.from.lerp(self.to, t), self.elapsed >= self.duration)
    }
}

/// A collected powerup counting down
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    /// Render handle of the HUD icon
    pub id: EntityId,
    pub kind: PowerupKind,
    /// Seconds left; only ever decreases
    pub remaining: f32,
    pub slot: usize,
    pub position: Vec2,
    tween: Option<Tween>,
}

/// Cross-cutting effects of the current activations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    pub immortal: bool,
    pub lightspeed: bool,
    pub magnet: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActivationManager {
    active: Vec<Activation>,
}

impl ActivationManager {
    /// Register a collected powerup at the end of the list. The HUD icon
    /// travels from `from` to its slot.
    pub fn activate(
        &mut self,
        id: EntityId,
        kind: PowerupKind,
        duration: f32,
        from: Vec2,
    ) -> usize {
        let slot = self.active.len();
        self.active.push(Activation {
            id,
            kind,
            remaining: duration,
            slot,
            position: from,
            tween: Some(Tween::new(from, slot_position(slot), PICKUP_TWEEN)),
        });
        slot
    }

    /// Remove an activation early. Removing an id that is not active is a
    /// no-op.
    pub fn remove(&mut self, id: EntityId, render: &mut dyn RenderSink) -> Option<Activation> {
        let index = self.active.iter().position(|a| a.id == id)?;
        let removed = self.active.remove(index);
        render.remove_entity(removed.id);

        for (slot, activation) in self.active.iter_mut().enumerate().skip(index) {
            activation.slot = slot;
            activation.tween = Some(Tween::new(
                activation.position,
                slot_position(slot),
                SHIFT_TWEEN,
            ));
        }
        Some(removed)
    }

    /// Count down every activation, advance HUD tweens and drop the ones
    /// that ran out. Returns the expired activations, oldest first.
    pub fn tick(&mut self, dt: f32, render: &mut dyn RenderSink) -> Vec<Activation> {
        for activation in &mut self.active {
            activation.remaining -= dt;
            if let Some(tween) = &mut activation.tween {
                let (position, done) = tween.step(dt);
                activation.position = position;
                render.update_pose(activation.id, position, 0.0);
                if done {
                    activation.tween = None;
                }
            }
        }

        let expired: Vec<EntityId> = self
            .active
            .iter()
            .filter(|a| a.remaining <= 0.0)
            .map(|a| a.id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.remove(id, render))
            .collect()
    }

    pub fn effects(&self) -> Effects {
        Effects {
            immortal: self.is_active(PowerupKind::Immortality),
            lightspeed: self.is_active(PowerupKind::Lightspeed),
            magnet: self.is_active(PowerupKind::Magnet),
        }
    }

    pub fn is_active(&self, kind: PowerupKind) -> bool {
        self.active.iter().any(|a| a.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activation> {
        self.active.iter()
    }

    pub fn kinds(&self) -> Vec<PowerupKind> {
        self.active.iter().map(|a| a.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop everything without reporting expiries
    pub fn clear(&mut self, render: &mut dyn RenderSink) {
        for activation in self.active.drain(..) {
            render.remove_entity(activation.id);
        }
    }
}
