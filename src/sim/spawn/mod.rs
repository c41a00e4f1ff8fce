//! Spawn streams
//!
//! Five independent generators share one small interface. Each owns the
//! pool of its live entities and a keyed cadence timer; the world fires
//! [`Spawner::create_one`] when that timer elapses and calls
//! [`Spawner::tick`] once per frame to move and retire what is on screen.

mod bullet;
mod coin;
mod obstacle;
mod powerup;
mod robot;

pub use bullet::BulletSpawner;
pub use coin::CoinSpawner;
pub use obstacle::ObstacleSpawner;
pub use powerup::PowerupSpawner;
pub use robot::RobotSpawner;

use rand::Rng;
use rand_pcg::Pcg32;

use super::clock::{Scheduler, TimerKey};
use super::collision::Body;
use super::state::{Entity, EntityId, EntityKind, EntityPool, IdAllocator, Tag};
use crate::renderer::RenderSink;
use crate::tuning::{Cadence, Tuning};

/// Everything a spawner may touch while creating entities
pub struct SpawnContext<'a> {
    pub rng: &'a mut Pcg32,
    pub ids: &'a mut IdAllocator,
    pub render: &'a mut dyn RenderSink,
    pub clock: &'a mut Scheduler,
    pub tuning: &'a Tuning,
    /// Bodies of placed coins, powerups and obstacles
    pub occupied: &'a [Body],
    pub tick: u64,
    pub game_over: bool,
}

impl SpawnContext<'_> {
    /// Allocate an id, register the entity with the render sink and build it
    pub fn make(&mut self, kind: EntityKind, body: Body, tag: Tag) -> Entity {
        let id = self.ids.next_id();
        self.render.add_entity(id, kind, body.position, body.shape);
        if body.rotation != 0.0 {
            self.render.update_pose(id, body.position, body.rotation);
        }
        Entity {
            id,
            kind,
            body,
            created_tick: self.tick,
            tag,
        }
    }

    /// Whether `body` would overlap anything already placed
    pub fn is_occupied(&self, body: &Body) -> bool {
        self.occupied.iter().any(|other| other.frames_intersect(body))
    }

    /// Try `body`, then `body` moved right by `shift`. Returns the first
    /// free placement, or None if both overlap.
    pub fn place(&self, mut body: Body, shift: f32) -> Option<Body> {
        if !self.is_occupied(&body) {
            return Some(body);
        }
        body.position.x += shift;
        (!self.is_occupied(&body)).then_some(body)
    }
}

pub trait Spawner {
    fn kind(&self) -> EntityKind;

    fn timer_key(&self) -> TimerKey;

    fn cadence(&self, tuning: &Tuning) -> Cadence;

    fn pool(&self) -> &EntityPool;

    fn pool_mut(&mut self) -> &mut EntityPool;

    /// Create one batch of entities. Returns the ids created; an empty
    /// batch means the attempt was skipped.
    fn create_one(&mut self, ctx: &mut SpawnContext) -> Vec<EntityId>;

    /// Begin the repeating cadence
    fn start(&self, clock: &mut Scheduler, tuning: &Tuning) {
        let cadence = self.cadence(tuning);
        clock.schedule(self.timer_key(), cadence.base, true, cadence.jitter);
    }

    /// Stop the cadence; live entities keep moving
    fn stop(&self, clock: &mut Scheduler) {
        clock.cancel(self.timer_key());
    }

    /// Remove every live entity
    fn reset(&mut self, render: &mut dyn RenderSink) {
        for entity in self.pool_mut().drain() {
            render.remove_entity(entity.id);
        }
    }

    /// Move live entities for one frame and retire those that left the
    /// screen. The default scrolls left by `world_speed`.
    fn tick(&mut self, world_speed: f32, _dt: f32, render: &mut dyn RenderSink) {
        scroll_pool(self.pool_mut(), world_speed, render);
    }

    /// The player touched entity `id`: remove it
    fn on_collision(&mut self, id: EntityId, render: &mut dyn RenderSink) -> Option<Entity> {
        let entity = self.pool_mut().remove(id)?;
        render.remove_entity(id);
        Some(entity)
    }

    fn is_empty(&self) -> bool {
        self.pool().is_empty()
    }
}

/// Scroll every entity left by `world_speed` and drop those fully past the
/// left edge
pub(crate) fn scroll_pool(pool: &mut EntityPool, world_speed: f32, render: &mut dyn RenderSink) {
    let mut retired = Vec::new();
    for entity in pool.iter_mut() {
        if matches!(entity.tag, Tag::Coin { seeking: true }) {
            continue;
        }
        entity.body.position.x -= world_speed;
        render.update_pose(entity.id, entity.body.position, entity.body.rotation);
        if entity.body.position.x < -entity.body.half_width() * 2.0 {
            retired.push(entity.id);
        }
    }
    for id in retired {
        pool.remove(id);
        render.remove_entity(id);
    }
}

/// Uniform pick in `[lo, hi]`
pub(crate) fn random_between(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        lo
    } else {
        rng.random_range(lo..=hi)
    }
}

#[cfg(test)]
pub(crate) mod harness {
    use rand::SeedableRng;

    use super::*;
    use crate::renderer::RecordingRenderer;

    /// Owns everything a [`SpawnContext`] borrows
    pub struct Harness {
        pub rng: Pcg32,
        pub ids: IdAllocator,
        pub render: RecordingRenderer,
        pub clock: Scheduler,
        pub tuning: Tuning,
        pub occupied: Vec<Body>,
        pub game_over: bool,
    }

    impl Harness {
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed),
                ids: IdAllocator::default(),
                render: RecordingRenderer::new(),
                clock: Scheduler::new(seed),
                tuning: Tuning::default(),
                occupied: Vec::new(),
                game_over: false,
            }
        }

        pub fn spawn(&mut self, spawner: &mut dyn Spawner) -> Vec<EntityId> {
            let mut ctx = SpawnContext {
                rng: &mut self.rng,
                ids: &mut self.ids,
                render: &mut self.render,
                clock: &mut self.clock,
                tuning: &self.tuning,
                occupied: &self.occupied,
                tick: 0,
                game_over: self.game_over,
            };
            spawner.create_one(&mut ctx)
        }
    }
}
