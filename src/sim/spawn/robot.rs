use glam::Vec2;
use rand::Rng;

use super::{SpawnContext, Spawner, random_between};
use crate::consts::*;
use crate::renderer::{FrameSet, RenderSink};
use crate::sim::clock::TimerKey;
use crate::sim::collision::Body;
use crate::sim::state::{EntityId, EntityKind, EntityPool, RobotDirection, Tag};
use crate::tuning::{Cadence, Tuning};

const ENTRY_RIGHT: f32 = SCENE_WIDTH + 50.0;
const ENTRY_LEFT: f32 = -50.0;
const ANIMATION_FPS: f32 = 10.0;

/// Ground robots walking across the screen on their own clock. They are
/// scenery: nothing collides with them.
#[derive(Debug, Clone)]
pub struct RobotSpawner {
    pool: EntityPool,
    /// Seconds to cross the screen
    forward_duration: f32,
    backward_duration: f32,
    /// Durations in force before lightspeed
    saved: Option<(f32, f32)>,
}

impl RobotSpawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pool: EntityPool::default(),
            forward_duration: tuning.robot_forward_duration,
            backward_duration: tuning.robot_backward_duration,
            saved: None,
        }
    }

    pub fn forward_duration(&self) -> f32 {
        self.forward_duration
    }

    pub fn backward_duration(&self) -> f32 {
        self.backward_duration
    }

    fn duration(&self, direction: RobotDirection) -> f32 {
        match direction {
            RobotDirection::Forward => self.forward_duration,
            RobotDirection::Backward => self.backward_duration,
        }
    }

    /// One ramp step: forward robots cross a little faster
    pub fn speed_up(&mut self, tuning: &Tuning) {
        self.forward_duration =
            (self.forward_duration - tuning.robot_duration_step).max(tuning.robot_duration_floor);
    }

    pub fn reset_speeds(&mut self, tuning: &Tuning) {
        self.forward_duration = tuning.robot_forward_duration;
        self.backward_duration = tuning.robot_backward_duration;
        self.saved = None;
    }

    /// Lightspeed makes every robot dash off to the right; leaving it
    /// restores the previous durations and sends them off at that pace
    pub fn set_lightspeed(&mut self, on: bool, tuning: &Tuning) {
        if on {
            if self.saved.is_none() {
                self.saved = Some((self.forward_duration, self.backward_duration));
            }
            self.forward_duration = tuning.robot_lightspeed_duration;
            self.backward_duration = tuning.robot_lightspeed_duration;
        } else if let Some((forward, backward)) = self.saved.take() {
            self.forward_duration = forward;
            self.backward_duration = backward;
        }

        let (forward, backward) = (self.forward_duration, self.backward_duration);
        for entity in self.pool.iter_mut() {
            if let Tag::Robot {
                direction,
                velocity,
            } = &mut entity.tag
            {
                let duration = match direction {
                    RobotDirection::Forward => forward,
                    RobotDirection::Backward => backward,
                };
                *velocity = (ENTRY_RIGHT - entity.body.position.x) / duration;
            }
        }
    }

    /// The player died: forward robots turn around and walk back out
    pub fn retreat(&mut self, tuning: &Tuning) {
        let duration =
            (self.forward_duration - tuning.robot_retreat_offset).max(tuning.robot_duration_floor);
        for entity in self.pool.iter_mut() {
            if let Tag::Robot {
                direction: RobotDirection::Forward,
                velocity,
            } = &mut entity.tag
            {
                *velocity = (ENTRY_RIGHT - entity.body.position.x) / duration;
            }
        }
    }
}

impl Spawner for RobotSpawner {
    fn kind(&self) -> EntityKind {
        EntityKind::Robot
    }

    fn timer_key(&self) -> TimerKey {
        TimerKey::SpawnRobot
    }

    fn cadence(&self, tuning: &Tuning) -> Cadence {
        tuning.robot_cadence
    }

    fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut EntityPool {
        &mut self.pool
    }

    fn create_one(&mut self, ctx: &mut SpawnContext) -> Vec<EntityId> {
        let direction = if ctx.rng.random_bool(0.5) {
            RobotDirection::Forward
        } else {
            RobotDirection::Backward
        };
        let y = random_between(ctx.rng, 50.0, 70.0);

        // After a death, new forward robots come in from the left
        let (start, target) = if ctx.game_over && direction == RobotDirection::Forward {
            (ENTRY_LEFT, ENTRY_RIGHT)
        } else {
            (ENTRY_RIGHT, 0.0)
        };
        let velocity = (target - start) / self.duration(direction);

        let robot = ctx.make(
            EntityKind::Robot,
            Body::rect(Vec2::new(start, y), ROBOT_SIZE, 0.0),
            Tag::Robot {
                direction,
                velocity,
            },
        );
        let id = robot.id;
        ctx.render.play_animation(id, FrameSet::Robot, ANIMATION_FPS, true);
        self.pool.insert(robot);
        vec![id]
    }

    fn tick(&mut self, _world_speed: f32, dt: f32, render: &mut dyn RenderSink) {
        let mut arrived = Vec::new();
        for entity in self.pool.iter_mut() {
            let Tag::Robot { velocity, .. } = entity.tag else {
                continue;
            };
            entity.body.position.x += velocity * dt;
            render.update_pose(entity.id, entity.body.position, 0.0);
            let x = entity.body.position.x;
            if (velocity < 0.0 && x <= 0.0) || (velocity > 0.0 && x >= ENTRY_RIGHT) {
                arrived.push(entity.id);
            }
        }
        for id in arrived {
            self.pool.remove(id);
            render.remove_entity(id);
        }
    }
}
