use glam::Vec2;
use rand::Rng;

use super::{SpawnContext, Spawner};
use crate::consts::*;
use crate::renderer::RenderSink;
use crate::sim::clock::TimerKey;
use crate::sim::collision::{Body, Shape};
use crate::sim::state::{BulletPhase, Entity, EntityId, EntityKind, EntityPool, Tag};
use crate::tuning::{Cadence, Tuning};

/// Bullets are never spawned closer than this to the bottom edge
const MIN_HEIGHT: f32 = 70.0;

/// Laser shots. Each one waits off-screen behind a warning sign, then
/// crosses to the left edge in `duration` seconds. The duration shrinks as
/// the run gets harder.
#[derive(Debug, Clone)]
pub struct BulletSpawner {
    pool: EntityPool,
    duration: f32,
}

impl BulletSpawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pool: EntityPool::default(),
            duration: tuning.bullet_duration,
        }
    }

    /// Travel time given to newly created bullets
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Shave one ramp step off the travel time, down to the floor
    pub fn shorten(&mut self, tuning: &Tuning) {
        self.duration =
            (self.duration - tuning.bullet_duration_step).max(tuning.bullet_duration_floor);
    }

    pub fn reset_duration(&mut self, tuning: &Tuning) {
        self.duration = tuning.bullet_duration;
    }

    /// Warning window over: drop the sign and launch the bullet. Firing a
    /// bullet that no longer exists does nothing.
    pub fn fire(&mut self, id: EntityId, render: &mut dyn RenderSink) -> bool {
        let Some(entity) = self.pool.get_mut(id) else {
            return false;
        };
        let Tag::Bullet {
            phase: phase @ BulletPhase::Warning,
            warning,
            duration,
        } = &mut entity.tag
        else {
            return false;
        };
        render.remove_entity(*warning);
        let speed = entity.body.position.x / duration.max(f32::EPSILON);
        *phase = BulletPhase::Firing { speed };
        true
    }

    fn discard(entity: &Entity, render: &mut dyn RenderSink) {
        if let Tag::Bullet {
            phase: BulletPhase::Warning,
            warning,
            ..
        } = entity.tag
        {
            render.remove_entity(warning);
        }
        render.remove_entity(entity.id);
    }
}

impl Spawner for BulletSpawner {
    fn kind(&self) -> EntityKind {
        EntityKind::Bullet
    }

    fn timer_key(&self) -> TimerKey {
        TimerKey::SpawnBullet
    }

    fn cadence(&self, tuning: &Tuning) -> Cadence {
        tuning.bullet_cadence
    }

    fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut EntityPool {
        &mut self.pool
    }

    fn create_one(&mut self, ctx: &mut SpawnContext) -> Vec<EntityId> {
        let mut y = ctx.rng.random_range(0.0..SCENE_HEIGHT);
        if y < MIN_HEIGHT {
            y += MIN_HEIGHT;
        }

        let warning = ctx.ids.next_id();
        ctx.render.add_entity(
            warning,
            EntityKind::Warning,
            Vec2::new(SCENE_WIDTH - 50.0, y),
            Shape::Rect {
                half: Vec2::splat(WARNING_SIZE / 2.0),
            },
        );

        let body = Body::circle(Vec2::new(SCENE_WIDTH + 50.0, y), BULLET_RADIUS);
        let tag = Tag::Bullet {
            phase: BulletPhase::Warning,
            warning,
            duration: self.duration,
        };
        let bullet = ctx.make(EntityKind::Bullet, body, tag);
        let id = bullet.id;
        ctx.clock.schedule_once(TimerKey::BulletWarning(id), ctx.tuning.bullet_warning);
        self.pool.insert(bullet);
        vec![id]
    }

    fn tick(&mut self, _world_speed: f32, dt: f32, render: &mut dyn RenderSink) {
        let mut arrived = Vec::new();
        for entity in self.pool.iter_mut() {
            if let Tag::Bullet {
                phase: BulletPhase::Firing { speed },
                ..
            } = entity.tag
            {
                entity.body.position.x -= speed * dt;
                render.update_pose(entity.id, entity.body.position, 0.0);
                if entity.body.position.x <= 0.0 {
                    arrived.push(entity.id);
                }
            }
        }
        for id in arrived {
            self.pool.remove(id);
            render.remove_entity(id);
        }
    }

    fn reset(&mut self, render: &mut dyn RenderSink) {
        for entity in self.pool.drain() {
            Self::discard(&entity, render);
        }
    }

    fn on_collision(&mut self, id: EntityId, render: &mut dyn RenderSink) -> Option<Entity> {
        let entity = self.pool.remove(id)?;
        Self::discard(&entity, render);
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn::harness::Harness;

    #[test]
    fn test_warning_then_crossing() {
        let mut h = Harness::new(3);
        let mut bullets = BulletSpawner::new(&h.tuning);
        let ids = h.spawn(&mut bullets);
        assert_eq!(ids.len(), 1);
        let id = ids[0];
        assert_eq!(h.render.log().live_of_kind(EntityKind::Warning), 1);
        assert!(h.clock.is_scheduled(TimerKey::BulletWarning(id)));

        let y = bullets.pool().get(id).unwrap().position().y;
        assert!((MIN_HEIGHT..SCENE_HEIGHT + MIN_HEIGHT).contains(&y));

        // Parked while the warning shows
        bullets.tick(6.0, SIM_DT, &mut h.render);
        assert_eq!(bullets.pool().get(id).unwrap().position().x, SCENE_WIDTH + 50.0);

        assert!(bullets.fire(id, &mut h.render));
        assert!(!bullets.fire(id, &mut h.render));
        assert_eq!(h.render.log().live_of_kind(EntityKind::Warning), 0);

        // 0.4 s of travel, plus a tick of slack
        for _ in 0..25 {
            bullets.tick(6.0, SIM_DT, &mut h.render);
        }
        assert!(bullets.is_empty());
        assert_eq!(h.render.log().live_of_kind(EntityKind::Bullet), 0);
        assert_eq!(h.render.log().unknown_handles, 0);
    }

    #[test]
    fn test_duration_has_floor() {
        let tuning = Tuning::default();
        let mut bullets = BulletSpawner::new(&tuning);
        for _ in 0..1000 {
            bullets.shorten(&tuning);
        }
        assert_eq!(bullets.duration(), 0.2);
        bullets.reset_duration(&tuning);
        assert_eq!(bullets.duration(), 0.4);
    }

    #[test]
    fn test_reset_removes_pending_warnings() {
        let mut h = Harness::new(5);
        let mut bullets = BulletSpawner::new(&h.tuning);
        h.spawn(&mut bullets);
        h.spawn(&mut bullets);
        bullets.reset(&mut h.render);
        assert!(bullets.is_empty());
        assert!(h.render.log().live.is_empty());
    }
}
