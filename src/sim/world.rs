//! Session controller
//!
//! [`World`] owns every piece of simulation state and the three outside
//! collaborators (render sink, wallet storage, UI callbacks). Input,
//! revive, reset and the shop all go through here; the per-frame update
//! lives in `tick.rs`.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::activation::{ActivationManager, Effects, slot_position};
use super::clock::{Scheduler, TimerKey};
use super::collision::{Body, Shape};
use super::player::{Overlay, Player};
use super::spawn::{
    BulletSpawner, CoinSpawner, ObstacleSpawner, PowerupSpawner, RobotSpawner, SpawnContext,
    Spawner,
};
use super::state::{
    EntityId, EntityKind, EntityPool, GameEvent, GamePhase, GravityProfile, IdAllocator,
    PowerupKind, SimulationState,
};
use crate::coin_data::CoinLayouts;
use crate::consts::*;
use crate::error::GameError;
use crate::persistence::{Persistence, Wallet};
use crate::renderer::{FrameSet, ParticleEffect, RenderSink};
use crate::session::{self, SessionEvents};
use crate::tuning::Tuning;

const HUD_ICON_FPS: f32 = 10.0;

pub struct World {
    pub(super) tuning: Tuning,
    pub(super) sim: SimulationState,
    pub(super) phase: GamePhase,
    pub(super) paused: bool,
    pub(super) clock: Scheduler,
    pub(super) rng: Pcg32,
    pub(super) ids: IdAllocator,
    pub(super) player: Player,
    pub(super) bullets: BulletSpawner,
    pub(super) coins: CoinSpawner,
    pub(super) powerups: PowerupSpawner,
    pub(super) robots: RobotSpawner,
    pub(super) obstacles: ObstacleSpawner,
    pub(super) activations: ActivationManager,
    /// Effects as last applied to the player and robots
    pub(super) effects: Effects,
    /// Grace window after a revive or the end of lightspeed
    pub(super) temporary_immortality: bool,
    /// Coins picked up this session
    pub(super) coins_collected: u32,
    pub(super) wallet: Wallet,
    /// Entities the player was overlapping at the end of the last tick
    pub(super) touching: BTreeSet<EntityId>,
    /// Events waiting for the end of the tick
    pub(super) events: Vec<GameEvent>,
    pub(super) tick_count: u64,
    /// Horizontal centres of the two background bands
    pub(super) background: [f32; 2],
    pub(super) render: Box<dyn RenderSink>,
    persistence: Box<dyn Persistence>,
    session: Box<dyn SessionEvents>,
}

impl World {
    pub fn new(
        seed: u64,
        tuning: Tuning,
        render: Box<dyn RenderSink>,
        mut persistence: Box<dyn Persistence>,
        session: Box<dyn SessionEvents>,
    ) -> Self {
        let wallet = persistence.load().unwrap_or_else(|err| {
            log::warn!("Wallet unavailable, starting from zero: {err}");
            Wallet::default()
        });

        let mut world = Self {
            sim: SimulationState::new(&tuning),
            phase: GamePhase::Idle,
            paused: false,
            // Timer jitter gets its own stream so spawn rolls stay stable
            clock: Scheduler::new(seed.wrapping_add(1)),
            rng: Pcg32::seed_from_u64(seed),
            ids: IdAllocator::default(),
            player: Player::default(),
            bullets: BulletSpawner::new(&tuning),
            coins: CoinSpawner::new(CoinLayouts::builtin()),
            powerups: PowerupSpawner::default(),
            robots: RobotSpawner::new(&tuning),
            obstacles: ObstacleSpawner::default(),
            activations: ActivationManager::default(),
            effects: Effects::default(),
            temporary_immortality: false,
            coins_collected: 0,
            wallet,
            touching: BTreeSet::new(),
            events: Vec::new(),
            tick_count: 0,
            background: [SCENE_WIDTH / 2.0, SCENE_WIDTH * 1.5],
            tuning,
            render,
            persistence,
            session,
        };

        world.player.spawn(world.render.as_mut());
        for (id, x) in EntityId::BACKGROUND.into_iter().zip(world.background) {
            world.render.add_entity(
                id,
                EntityKind::Background,
                Vec2::new(x, SCENE_HEIGHT / 2.0),
                Shape::Rect {
                    half: Vec2::new(SCENE_WIDTH / 2.0, SCENE_HEIGHT / 2.0),
                },
            );
        }
        log::info!(
            "World ready (seed {seed}, high score {}, {} coins)",
            world.wallet.high_score,
            world.wallet.coins
        );
        world
    }

    /// Replace the coin formation pool
    pub fn with_layouts(mut self, layouts: CoinLayouts) -> Self {
        self.coins = CoinSpawner::new(layouts);
        self
    }

    // === Accessors ===

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn distance(&self) -> f64 {
        self.sim.distance
    }

    pub fn speed(&self) -> f32 {
        self.sim.speed
    }

    pub fn gravity_profile(&self) -> GravityProfile {
        self.sim.gravity
    }

    pub fn difficulty_step(&self) -> u32 {
        self.sim.difficulty_step
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.sim
    }

    pub fn bullet_duration(&self) -> f32 {
        self.bullets.duration()
    }

    pub fn robot_forward_duration(&self) -> f32 {
        self.robots.forward_duration()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn effects(&self) -> Effects {
        self.effects
    }

    pub fn activations(&self) -> &ActivationManager {
        &self.activations
    }

    pub fn is_temporarily_immortal(&self) -> bool {
        self.temporary_immortality
    }

    /// Immortality powerup, lightspeed, or a grace window
    pub fn is_invulnerable(&self) -> bool {
        self.effects.immortal || self.effects.lightspeed || self.temporary_immortality
    }

    pub fn coins_collected(&self) -> u32 {
        self.coins_collected
    }

    pub fn wallet(&self) -> Wallet {
        self.wallet
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn pool(&self, kind: EntityKind) -> Option<&EntityPool> {
        match kind {
            EntityKind::Bullet => Some(self.bullets.pool()),
            EntityKind::Coin => Some(self.coins.pool()),
            EntityKind::Powerup => Some(self.powerups.pool()),
            EntityKind::Robot => Some(self.robots.pool()),
            EntityKind::Obstacle => Some(self.obstacles.pool()),
            _ => None,
        }
    }

    /// Live entities across all spawners
    pub fn entity_count(&self) -> usize {
        self.spawners().iter().map(|s| s.pool().len()).sum()
    }

    fn spawners(&self) -> [&dyn Spawner; 5] {
        [
            &self.bullets,
            &self.coins,
            &self.powerups,
            &self.robots,
            &self.obstacles,
        ]
    }

    /// Gravity currently pulling on the player
    pub fn current_gravity(&self) -> Vec2 {
        match self.phase {
            GamePhase::Running if self.player.jetpack_on => self.sim.gravity.powered_on,
            GamePhase::Running => self.sim.gravity.powered_off,
            GamePhase::Idle | GamePhase::GameOver => Vec2::new(0.0, self.tuning.gravity_idle),
        }
    }

    // === Input ===

    /// Jetpack on. The first thrust of a session starts it.
    pub fn thrust_start(&mut self) -> bool {
        if self.is_game_over() || self.effects.lightspeed || self.paused {
            return false;
        }
        if self.phase == GamePhase::Idle {
            self.start_session();
        }
        self.player.thrust(true, self.render.as_mut());
        self.player.fly(self.sim.speed, self.render.as_mut());
        true
    }

    /// Jetpack off. The run animation comes back on landing.
    pub fn thrust_end(&mut self) -> bool {
        if self.is_game_over() || self.effects.lightspeed || self.paused {
            return false;
        }
        self.player.thrust(false, self.render.as_mut());
        true
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Paused at {:.0} m", self.sim.distance);
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            log::info!("Resumed");
            self.paused = false;
        }
    }

    fn start_session(&mut self) {
        self.phase = GamePhase::Running;
        self.start_spawners();
        self.events.push(GameEvent::GameStarted);
        log::info!("Session started");
    }

    fn start_spawners(&mut self) {
        let tuning = &self.tuning;
        let clock = &mut self.clock;
        for spawner in [
            &self.bullets as &dyn Spawner,
            &self.coins,
            &self.powerups,
            &self.robots,
            &self.obstacles,
        ] {
            spawner.start(clock, tuning);
        }
    }

    fn stop_spawners(&mut self) {
        let clock = &mut self.clock;
        for spawner in [
            &self.bullets as &dyn Spawner,
            &self.coins,
            &self.powerups,
            &self.robots,
            &self.obstacles,
        ] {
            spawner.stop(clock);
        }
    }

    // === Spawning ===

    /// Run one spawn attempt for the stream behind `key`
    pub(super) fn spawn(&mut self, key: TimerKey) -> Vec<EntityId> {
        let occupied: Vec<Body> = self
            .coins
            .pool()
            .iter()
            .chain(self.powerups.pool().iter())
            .chain(self.obstacles.pool().iter())
            .map(|e| e.body)
            .collect();
        let mut ctx = SpawnContext {
            rng: &mut self.rng,
            ids: &mut self.ids,
            render: self.render.as_mut(),
            clock: &mut self.clock,
            tuning: &self.tuning,
            occupied: &occupied,
            tick: self.tick_count,
            game_over: self.phase == GamePhase::GameOver,
        };
        let spawner: &mut dyn Spawner = match key {
            TimerKey::SpawnBullet => &mut self.bullets,
            TimerKey::SpawnCoin => &mut self.coins,
            TimerKey::SpawnPowerup => &mut self.powerups,
            TimerKey::SpawnRobot => &mut self.robots,
            TimerKey::SpawnObstacle => &mut self.obstacles,
            _ => return Vec::new(),
        };
        let ids = spawner.create_one(&mut ctx);
        if key == TimerKey::SpawnCoin {
            self.clear_under_coins(&ids);
        }
        ids
    }

    /// Coins win placement: powerups and obstacles under new coins go
    fn clear_under_coins(&mut self, coin_ids: &[EntityId]) {
        let coins: Vec<Body> = coin_ids
            .iter()
            .filter_map(|&id| self.coins.pool().get(id))
            .map(|e| e.body)
            .collect();
        let render = self.render.as_mut();
        for spawner in [
            &mut self.powerups as &mut dyn Spawner,
            &mut self.obstacles,
        ] {
            let covered: Vec<EntityId> = spawner
                .pool()
                .iter()
                .filter(|e| coins.iter().any(|c| c.frames_intersect(&e.body)))
                .map(|e| e.id)
                .collect();
            for id in covered {
                log::debug!("Removed {:?} {id} under new coins", spawner.kind());
                spawner.on_collision(id, render);
            }
        }
    }

    // === Effects ===

    /// Start (or restart) the temporary immortality window
    pub(super) fn grant_temporary_immortality(&mut self, seconds: f32) {
        self.temporary_immortality = true;
        self.clock.schedule_once(TimerKey::TemporaryImmortality, seconds);
    }

    /// Register a collected or purchased powerup
    fn activate(&mut self, id: EntityId, kind: PowerupKind, from: Vec2) {
        let duration = kind.duration(&self.tuning);
        let slot = self.activations.activate(id, kind, duration, from);
        self.events.push(GameEvent::PowerupAlert(kind));
        log::info!("{kind:?} active for {duration} s (slot {slot})");
        self.sync_effects();
    }

    /// Re-derive the boolean effects from the activation list and apply
    /// whatever changed
    pub(super) fn sync_effects(&mut self) {
        let next = self.activations.effects();
        let previous = self.effects;
        if next == previous {
            return;
        }
        self.effects = next;

        let overlay = Overlay::select(next.immortal, next.magnet);
        self.player.refresh(
            overlay,
            self.tuning.ground_threshold,
            self.sim.speed,
            self.render.as_mut(),
        );

        if next.lightspeed != previous.lightspeed {
            self.player.set_lightspeed(next.lightspeed, self.render.as_mut());
            self.robots.set_lightspeed(next.lightspeed, &self.tuning);
            if next.lightspeed {
                log::info!("Lightspeed on");
            } else {
                log::info!("Lightspeed off");
                self.grant_temporary_immortality(self.tuning.lightspeed_grace);
            }
        }
    }

    // === Death and revive ===

    /// Fatal hit: freeze the session and start the death sequence
    pub(super) fn kill_player(&mut self, at: Vec2) {
        if self.is_game_over() {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.player.kill(self.render.as_mut());
        self.render.emit_particles(ParticleEffect::Shot, at);

        self.robots.retreat(&self.tuning);
        let clock = &mut self.clock;
        for spawner in [
            &self.powerups as &dyn Spawner,
            &self.coins,
            &self.obstacles,
        ] {
            spawner.stop(clock);
        }
        self.clock.schedule_once(TimerKey::DeathSequence, self.tuning.death_pause);
        log::info!("Player hit at {:.0} m", self.sim.distance);
    }

    /// Death pause over: stop the world and report game over
    pub(super) fn finish_death(&mut self) {
        self.sim.set_speed_to_zero();
        self.events.push(GameEvent::GameOver);
        self.save_progress();
        log::info!(
            "Game over at {:.0} m with {} coins",
            self.sim.distance,
            self.coins_collected
        );
    }

    /// Bring the player back after a death. Returns false if the player is
    /// not dead.
    pub fn revive(&mut self) -> bool {
        if !self.is_game_over() {
            return false;
        }
        if self.clock.cancel(TimerKey::DeathSequence) {
            // Revived inside the death pause: remember the speed now
            self.sim.set_speed_to_zero();
        }
        self.phase = GamePhase::Running;
        self.player.begin_revive(self.render.as_mut());
        self.grant_temporary_immortality(self.tuning.revive_grace);
        self.clock.schedule_once(TimerKey::ReviveAnimation, REVIVE_ANIMATION_TIME);
        self.clock.schedule_once(TimerKey::ReviveSpeed, self.tuning.revive_speed_delay);
        self.start_spawners();
        log::info!("Revived at {:.0} m", self.sim.distance);
        true
    }

    pub(super) fn finish_revive(&mut self) {
        self.player.finish_revive(self.sim.speed, self.render.as_mut());
        let overlay = Overlay::select(self.effects.immortal, self.effects.magnet);
        self.player.refresh(
            overlay,
            self.tuning.ground_threshold,
            self.sim.speed,
            self.render.as_mut(),
        );
    }

    /// Pay for a revive out of the wallet
    pub fn purchase_revive(&mut self) -> Result<bool, GameError> {
        if !self.is_game_over() || !self.wallet.can_revive() {
            return Ok(false);
        }
        self.persistence.spend_revive()?;
        self.wallet.spend_revive();
        Ok(self.revive())
    }

    // === Reset ===

    /// Play again straight away
    pub fn retry(&mut self) {
        self.reset(true);
    }

    /// Back to the menu; the world idles until the next thrust
    pub fn quit(&mut self) {
        self.reset(false);
    }

    fn reset(&mut self, retry: bool) {
        self.save_progress();
        self.stop_spawners();
        self.clock.cancel_all();
        self.clear_entities();

        self.sim = SimulationState::new(&self.tuning);
        self.bullets.reset_duration(&self.tuning);
        self.robots.reset_speeds(&self.tuning);
        self.effects = Effects::default();
        self.temporary_immortality = false;
        self.coins_collected = 0;
        self.touching.clear();
        self.paused = false;

        self.render.remove_entity(EntityId::PLAYER);
        self.player = Player::default();
        self.player.spawn(self.render.as_mut());

        self.background = [SCENE_WIDTH / 2.0, SCENE_WIDTH * 1.5];
        for (id, x) in EntityId::BACKGROUND.into_iter().zip(self.background) {
            self.render.update_pose(id, Vec2::new(x, SCENE_HEIGHT / 2.0), 0.0);
        }

        self.events.push(GameEvent::CoinCountChanged(0));
        self.events.push(GameEvent::DistanceChanged(0.0));
        self.phase = GamePhase::Idle;
        if retry {
            self.start_session();
            self.player.run(self.sim.speed, self.render.as_mut());
        }
        log::info!("Session reset ({})", if retry { "retry" } else { "quit" });
    }

    /// Remove every spawned entity and HUD icon
    fn clear_entities(&mut self) {
        let render = self.render.as_mut();
        for spawner in [
            &mut self.bullets as &mut dyn Spawner,
            &mut self.coins,
            &mut self.powerups,
            &mut self.robots,
            &mut self.obstacles,
        ] {
            spawner.reset(render);
        }
        self.activations.clear(render);
    }

    // === Wallet ===

    /// Write high score and coins back to storage. Failures are logged.
    fn save_progress(&mut self) {
        if let Err(err) = self
            .persistence
            .save(self.wallet.high_score, self.wallet.coins)
        {
            log::warn!("Could not save progress: {err}");
        }
    }

    /// Save now (the app is going to the background)
    pub fn checkpoint(&mut self) {
        self.save_progress();
    }

    /// Buy a powerup in the shop
    pub fn purchase(&mut self, kind: PowerupKind) -> Result<bool, GameError> {
        let bought = self.persistence.purchase(kind)?;
        if bought {
            self.wallet.purchase(kind);
            log::info!("Bought {kind:?}, {} coins left", self.wallet.coins);
        }
        Ok(bought)
    }

    /// Activate a purchased powerup. Only allowed mid-run; returns false
    /// when none are owned or no live session is running.
    pub fn use_purchased(&mut self, kind: PowerupKind) -> bool {
        if self.phase != GamePhase::Running || self.wallet.count(kind) == 0 {
            return false;
        }
        if let Err(err) = self.persistence.spend(kind) {
            log::warn!("Could not spend {kind:?}: {err}");
            return false;
        }
        self.wallet.spend(kind);

        let id = self.ids.next_id();
        let from = slot_position(self.activations.len());
        self.render.add_entity(
            id,
            EntityKind::CollectedPowerup,
            from,
            Shape::Circle {
                radius: POWERUP_RADIUS,
            },
        );
        self.render.play_animation(id, FrameSet::Powerup(kind), HUD_ICON_FPS, true);
        self.activate(id, kind, from);
        true
    }

    /// Pick up powerup `id` from the field
    pub(super) fn collect_powerup(&mut self, id: EntityId) {
        if let Some((kind, from)) = self.powerups.collect(id, self.render.as_mut()) {
            self.activate(id, kind, from);
        }
    }

    /// Pick up coin `id`
    pub(super) fn collect_coin(&mut self, id: EntityId) {
        if self.coins.on_collision(id, self.render.as_mut()).is_some() {
            self.coins_collected += 1;
            self.wallet.coins = self.wallet.coins.saturating_add(1);
            self.events.push(GameEvent::CoinCountChanged(self.coins_collected));
        }
    }

    /// Deliver queued events to the UI
    pub(super) fn flush_events(&mut self) {
        for event in self.events.drain(..) {
            session::dispatch(self.session.as_mut(), event);
        }
    }
}
