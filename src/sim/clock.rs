//! Keyed timers on the simulation clock
//!
//! Every wait in the game (spawn cadence, bullet warning, death pause, revive
//! delay, grace windows) is a timer here, advanced by the same fixed tick as
//! the rest of the world. Timers are keyed: scheduling an existing key
//! replaces it and cancelling a key touches nothing else.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::EntityId;

/// Shortest period a jittered timer can roll
const MIN_PERIOD: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    SpawnBullet,
    SpawnCoin,
    SpawnPowerup,
    SpawnRobot,
    SpawnObstacle,
    /// End of a bullet's warning window
    BulletWarning(EntityId),
    TemporaryImmortality,
    /// Pause between the fatal hit and the game-over notification
    DeathSequence,
    /// Revive animation finished
    ReviveAnimation,
    /// Restore the pre-death speed
    ReviveSpeed,
}

#[derive(Debug, Clone)]
struct Timer {
    key: TimerKey,
    remaining: f32,
    base: f32,
    jitter: f32,
    repeat: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    timers: Vec<Timer>,
    rng: Pcg32,
}

impl Scheduler {
    pub fn new(seed: u64) -> Self {
        Self {
            timers: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn roll(&mut self, base: f32, jitter: f32) -> f32 {
        let offset = if jitter > 0.0 {
            self.rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        (base + offset).max(MIN_PERIOD)
    }

    /// Schedule `key` to fire after `delay ± jitter` seconds, re-rolling the
    /// jitter for every period when `repeat` is set. Replaces any timer with
    /// the same key. Returns the delay until the first firing.
    pub fn schedule(&mut self, key: TimerKey, delay: f32, repeat: bool, jitter: f32) -> f32 {
        self.cancel(key);
        let first = self.roll(delay, jitter);
        self.timers.push(Timer {
            key,
            remaining: first,
            base: delay,
            jitter,
            repeat,
        });
        first
    }

    /// One-shot timer without jitter
    pub fn schedule_once(&mut self, key: TimerKey, delay: f32) -> f32 {
        self.schedule(key, delay, false, 0.0)
    }

    /// Cancel a timer. Returns false if it was not scheduled.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.key != key);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_scheduled(&self, key: TimerKey) -> bool {
        self.timers.iter().any(|t| t.key == key)
    }

    /// Seconds until `key` next fires
    pub fn remaining(&self, key: TimerKey) -> Option<f32> {
        self.timers.iter().find(|t| t.key == key).map(|t| t.remaining)
    }

    /// Advance all timers by `dt` and return the keys that fired, earliest
    /// first. A repeating timer fires once per elapsed period.
    pub fn tick(&mut self, dt: f32) -> Vec<TimerKey> {
        let mut fired: Vec<(f32, TimerKey)> = Vec::new();
        let mut timers = std::mem::take(&mut self.timers);

        timers.retain_mut(|timer| {
            timer.remaining -= dt;
            while timer.remaining <= 0.0 {
                // How far into this tick the timer expired
                fired.push((dt + timer.remaining, timer.key));
                if !timer.repeat {
                    return false;
                }
                timer.remaining += self.roll(timer.base, timer.jitter);
            }
            true
        });

        self.timers = timers;
        fired.sort_by(|a, b| a.0.total_cmp(&b.0));
        fired.into_iter().map(|(_, key)| key).collect()
    }
}
