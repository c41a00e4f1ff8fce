use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;

use super::{SpawnContext, Spawner, random_between, scroll_pool};
use crate::consts::*;
use crate::renderer::RenderSink;
use crate::sim::clock::TimerKey;
use crate::sim::collision::Body;
use crate::sim::state::{EntityId, EntityKind, EntityPool, ObstacleOrientation, Tag};
use crate::tuning::{Cadence, Tuning};

const PLACEMENT_SHIFT: f32 = 400.0;
/// Seconds per full turn of a rotating obstacle
const SPIN_PERIOD: f32 = 3.0;

const ORIENTATIONS: [ObstacleOrientation; 3] = [
    ObstacleOrientation::Horizontal,
    ObstacleOrientation::Vertical,
    ObstacleOrientation::Rotating,
];

/// Zapper bars: horizontal, vertical, or spinning
#[derive(Debug, Clone, Default)]
pub struct ObstacleSpawner {
    pool: EntityPool,
}

impl Spawner for ObstacleSpawner {
    fn kind(&self) -> EntityKind {
        EntityKind::Obstacle
    }

    fn timer_key(&self) -> TimerKey {
        TimerKey::SpawnObstacle
    }

    fn cadence(&self, tuning: &Tuning) -> Cadence {
        tuning.obstacle_cadence
    }

    fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut EntityPool {
        &mut self.pool
    }

    fn create_one(&mut self, ctx: &mut SpawnContext) -> Vec<EntityId> {
        let orientation = ORIENTATIONS[ctx.rng.random_range(0..ORIENTATIONS.len())];
        let y = random_between(ctx.rng, 70.0, SCENE_HEIGHT - 70.0);
        let rotation = match orientation {
            ObstacleOrientation::Vertical => FRAC_PI_2,
            ObstacleOrientation::Horizontal | ObstacleOrientation::Rotating => 0.0,
        };
        let body = Body::rect(
            Vec2::new(SCENE_WIDTH + OBSTACLE_SIZE.x, y),
            OBSTACLE_SIZE,
            rotation,
        );

        let Some(body) = ctx.place(body, PLACEMENT_SHIFT) else {
            log::debug!("Discarded {orientation:?} obstacle: no free spot");
            return Vec::new();
        };
        let obstacle = ctx.make(EntityKind::Obstacle, body, Tag::Obstacle { orientation });
        let id = obstacle.id;
        self.pool.insert(obstacle);
        vec![id]
    }

    fn tick(&mut self, world_speed: f32, dt: f32, render: &mut dyn RenderSink) {
        for entity in self.pool.iter_mut() {
            if let Tag::Obstacle {
                orientation: ObstacleOrientation::Rotating,
            } = entity.tag
            {
                entity.body.rotation = (entity.body.rotation + TAU / SPIN_PERIOD * dt) % TAU;
            }
        }
        scroll_pool(&mut self.pool, world_speed, render);
    }
}
