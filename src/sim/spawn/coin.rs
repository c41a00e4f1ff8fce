use glam::Vec2;
use rand::Rng;

use super::{SpawnContext, Spawner, random_between};
use crate::coin_data::CoinLayouts;
use crate::consts::*;
use crate::renderer::RenderSink;
use crate::sim::clock::TimerKey;
use crate::sim::collision::Body;
use crate::sim::state::{EntityId, EntityKind, EntityPool, Tag};
use crate::tuning::{Cadence, Tuning};

/// Coin formations. One batch per spawn, one coin per set cell of a
/// randomly picked layout.
#[derive(Debug, Clone)]
pub struct CoinSpawner {
    pool: EntityPool,
    layouts: CoinLayouts,
}

impl CoinSpawner {
    pub fn new(layouts: CoinLayouts) -> Self {
        Self {
            pool: EntityPool::default(),
            layouts,
        }
    }

    pub fn any_seeking(&self) -> bool {
        self.pool
            .iter()
            .any(|e| matches!(e.tag, Tag::Coin { seeking: true }))
    }

    pub fn is_seeking(&self, id: EntityId) -> bool {
        self.pool
            .get(id)
            .is_some_and(|e| matches!(e.tag, Tag::Coin { seeking: true }))
    }

    /// Home coins toward `target`.
    ///
    /// While the magnet is on, every coin that has scrolled onto the screen
    /// starts seeking. A coin that is already seeking keeps going after the
    /// magnet ends.
    pub fn seek(&mut self, target: Vec2, magnet: bool, speed: f32, render: &mut dyn RenderSink) {
        for entity in self.pool.iter_mut() {
            let Tag::Coin { seeking } = &mut entity.tag else {
                continue;
            };
            if !*seeking {
                if !magnet || entity.body.position.x >= SCENE_WIDTH {
                    continue;
                }
                *seeking = true;
            }
            let offset = target - entity.body.position;
            let step = offset.clamp_length_max(speed);
            entity.body.position += step;
            render.update_pose(entity.id, entity.body.position, 0.0);
        }
    }
}

impl Spawner for CoinSpawner {
    fn kind(&self) -> EntityKind {
        EntityKind::Coin
    }

    fn timer_key(&self) -> TimerKey {
        TimerKey::SpawnCoin
    }

    fn cadence(&self, tuning: &Tuning) -> Cadence {
        tuning.coin_cadence
    }

    fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut EntityPool {
        &mut self.pool
    }

    fn create_one(&mut self, ctx: &mut SpawnContext) -> Vec<EntityId> {
        if self.layouts.is_empty() {
            return Vec::new();
        }
        let index = ctx.rng.random_range(0..self.layouts.len());
        let layout = match self.layouts.get(index) {
            Ok(layout) => layout,
            Err(err) => {
                log::warn!("Skipping coin spawn: {err}");
                return Vec::new();
            }
        };

        let base_y = random_between(ctx.rng, 150.0, SCENE_HEIGHT - 150.0);
        let rows = layout.rows();
        let mut ids = Vec::new();
        for (row, col) in layout.cells() {
            let position = Vec2::new(
                SCENE_WIDTH + 100.0 + col as f32 * COIN_CELL,
                base_y + (rows - 1 - row) as f32 * COIN_CELL,
            );
            let coin = ctx.make(
                EntityKind::Coin,
                Body::circle(position, COIN_RADIUS),
                Tag::Coin { seeking: false },
            );
            ids.push(coin.id);
            self.pool.insert(coin);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin_data::CoinLayout;
    use crate::sim::spawn::harness::Harness;

    #[test]
    fn test_one_coin_per_set_cell() {
        let mut h = Harness::new(11);
        let mut coins = CoinSpawner::new(CoinLayouts::builtin());
        let ids = h.spawn(&mut coins);
        assert!(!ids.is_empty());
        assert_eq!(coins.pool().len(), ids.len());
        assert_eq!(h.render.log().live_of_kind(EntityKind::Coin), ids.len());
        assert!(coins.pool().iter().all(|c| c.position().x >= SCENE_WIDTH + 100.0));
    }

    #[test]
    fn test_rows_stack_upwards() {
        let layout = CoinLayout::from_json(0, r#"{ "structure": [[1], [1]] }"#).unwrap();
        let rows: Vec<_> = layout.cells().collect();
        assert_eq!(rows, vec![(0, 0), (1, 0)]);

        let mut h = Harness::new(2);
        let mut coins = CoinSpawner::new(CoinLayouts::builtin());
        // Formations stay inside the scene
        for _ in 0..20 {
            h.spawn(&mut coins);
        }
        let ys: Vec<f32> = coins.pool().iter().map(|c| c.position().y).collect();
        assert!(ys.iter().all(|&y| (150.0..SCENE_HEIGHT).contains(&y)));
    }

    #[test]
    fn test_broken_layouts_skip_spawn() {
        let dir = std::env::temp_dir().join("ninja-jetpack-missing-layouts");
        let mut h = Harness::new(4);
        let mut coins = CoinSpawner::new(CoinLayouts::load_dir(&dir));
        assert!(h.spawn(&mut coins).is_empty());
        assert!(coins.is_empty());
    }

    #[test]
    fn test_seeking_is_sticky() {
        let mut h = Harness::new(9);
        let mut coins = CoinSpawner::new(CoinLayouts::builtin());
        let ids = h.spawn(&mut coins);
        assert!(ids.len() >= 2);

        // Bring the formation on screen
        coins.tick(400.0, SIM_DT, &mut h.render);
        let (grabbed, other) = (ids[0], ids[1]);
        // Push the second coin back off-screen so the magnet skips it
        coins.pool_mut().get_mut(other).unwrap().body.position.x = SCENE_WIDTH + 10.0;

        let player = Vec2::new(200.0, 50.0);
        coins.seek(player, true, 16.0, &mut h.render);
        assert!(coins.is_seeking(grabbed));
        assert!(!coins.is_seeking(other));

        // Magnet off: the grabbed coin keeps homing and ignores scrolling
        let before = coins.pool().get(grabbed).unwrap().position();
        let other_before = coins.pool().get(other).unwrap().position();
        coins.tick(6.0, SIM_DT, &mut h.render);
        coins.seek(player, false, 16.0, &mut h.render);
        let after = coins.pool().get(grabbed).unwrap().position();
        assert!(after.distance(player) < before.distance(player));
        assert!(coins.is_seeking(grabbed));

        let other_after = coins.pool().get(other).unwrap().position();
        assert_eq!(other_after, other_before - Vec2::new(6.0, 0.0));
        assert!(!coins.is_seeking(other));
    }
}
