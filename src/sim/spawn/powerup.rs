use glam::Vec2;

use super::{SpawnContext, Spawner, random_between};
use crate::consts::*;
use crate::renderer::{FrameSet, RenderSink};
use crate::sim::clock::TimerKey;
use crate::sim::collision::Body;
use crate::sim::state::{EntityId, EntityKind, EntityPool, PowerupKind, Tag};
use crate::tuning::{Cadence, Tuning};

/// Extra offset tried when the first placement overlaps something
const PLACEMENT_SHIFT: f32 = 300.0;
const ANIMATION_FPS: f32 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct PowerupSpawner {
    pool: EntityPool,
}

impl PowerupSpawner {
    /// Pick up powerup `id`. The entity leaves the pool and its render
    /// handle is re-registered as a collected HUD icon that collides with
    /// nothing. Returns the kind and where it was picked up.
    pub fn collect(
        &mut self,
        id: EntityId,
        render: &mut dyn RenderSink,
    ) -> Option<(PowerupKind, Vec2)> {
        let entity = self.pool.remove(id)?;
        render.remove_entity(id);
        let Tag::Powerup(kind) = entity.tag else {
            return None;
        };
        render.add_entity(id, EntityKind::CollectedPowerup, entity.position(), entity.body.shape);
        render.play_animation(id, FrameSet::Powerup(kind), ANIMATION_FPS, true);
        Some((kind, entity.position()))
    }

    pub fn kind_of(&self, id: EntityId) -> Option<PowerupKind> {
        match self.pool.get(id)?.tag {
            Tag::Powerup(kind) => Some(kind),
            _ => None,
        }
    }
}

impl Spawner for PowerupSpawner {
    fn kind(&self) -> EntityKind {
        EntityKind::Powerup
    }

    fn timer_key(&self) -> TimerKey {
        TimerKey::SpawnPowerup
    }

    fn cadence(&self, tuning: &Tuning) -> Cadence {
        tuning.powerup_cadence
    }

    fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut EntityPool {
        &mut self.pool
    }

    fn create_one(&mut self, ctx: &mut SpawnContext) -> Vec<EntityId> {
        let kind = PowerupKind::random(ctx.rng);
        let y = random_between(ctx.rng, 150.0, SCENE_HEIGHT - 150.0);
        let body = Body::circle(Vec2::new(SCENE_WIDTH + 150.0, y), POWERUP_RADIUS);

        let Some(body) = ctx.place(body, PLACEMENT_SHIFT) else {
            log::debug!("Discarded {kind:?} powerup: no free spot");
            return Vec::new();
        };
        let powerup = ctx.make(EntityKind::Powerup, body, Tag::Powerup(kind));
        let id = powerup.id;
        ctx.render.play_animation(id, FrameSet::Powerup(kind), ANIMATION_FPS, true);
        self.pool.insert(powerup);
        vec![id]
    }
}
