//! Fixed timestep simulation tick
//!
//! One call advances the world by one frame: timers, activations, distance,
//! entity motion, coin seeking, the difficulty ramp, player physics and the
//! collision pass, in that order. Events queued along the way reach the UI
//! once the frame is complete.

use glam::Vec2;

use super::clock::TimerKey;
use super::collision::{Category, Collider, Contact, ContactKind};
use super::spawn::Spawner;
use super::state::{EntityId, GameEvent, GamePhase};
use super::world::World;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Finger down / key pressed
    pub thrust_start: bool,
    /// Finger up / key released
    pub thrust_end: bool,
    /// Pause toggle
    pub pause_toggle: bool,
}

impl World {
    /// Apply one frame's worth of input
    pub fn apply_input(&mut self, input: &TickInput) {
        if input.pause_toggle {
            if self.paused {
                self.resume();
            } else {
                self.pause();
            }
        }
        if input.thrust_start {
            self.thrust_start();
        }
        if input.thrust_end {
            self.thrust_end();
        }
    }

    fn on_timer(&mut self, key: TimerKey) {
        match key {
            TimerKey::SpawnBullet
            | TimerKey::SpawnCoin
            | TimerKey::SpawnPowerup
            | TimerKey::SpawnRobot
            | TimerKey::SpawnObstacle => {
                self.spawn(key);
            }
            TimerKey::BulletWarning(id) => {
                self.bullets.fire(id, self.render.as_mut());
            }
            TimerKey::TemporaryImmortality => {
                self.temporary_immortality = false;
                log::debug!("Temporary immortality over");
            }
            TimerKey::DeathSequence => self.finish_death(),
            TimerKey::ReviveAnimation => self.finish_revive(),
            TimerKey::ReviveSpeed => self.sim.restore_speed(&self.tuning),
        }
    }

    /// One difficulty step
    fn ramp(&mut self) {
        let fine = self.sim.apply_ramp(&self.tuning);
        self.robots.speed_up(&self.tuning);
        if fine {
            self.bullets.shorten(&self.tuning);
        }
        log::debug!(
            "Ramp {} at {:.0} m: speed {}, bullet {:.3} s",
            self.sim.difficulty_step,
            self.sim.distance,
            self.sim.speed,
            self.bullets.duration()
        );
    }

    /// Scroll speed entities actually move at this frame
    fn effective_speed(&self) -> f32 {
        if self.effects.lightspeed {
            self.tuning.lightspeed_visual_speed
        } else {
            self.sim.speed
        }
    }

    fn wrap_background(&mut self, speed: f32) {
        for (id, x) in EntityId::BACKGROUND.into_iter().zip(self.background.iter_mut()) {
            *x -= speed;
            if *x <= -SCENE_WIDTH / 2.0 {
                *x += SCENE_WIDTH * 2.0;
            }
            self.render.update_pose(id, Vec2::new(*x, SCENE_HEIGHT / 2.0), 0.0);
        }
    }

    fn step_player(&mut self, dt: f32) {
        let gravity = self.current_gravity();
        let landed = self.player.step(gravity, dt);
        self.render.update_pose(EntityId::PLAYER, self.player.position, 0.0);

        if self.phase == GamePhase::Running && self.player.jetpack_on {
            self.player.fly(self.sim.speed, self.render.as_mut());
        }
        if let Some(point) = landed {
            let contact = Contact {
                a: Collider::new(Category::Ground, None),
                b: Collider::new(Category::Player, Some(EntityId::PLAYER)),
                point,
            };
            self.resolve(contact);
        }
    }

    /// Find contacts that began this frame
    fn detect_contacts(&mut self) -> Vec<Contact> {
        let player = self.player.body();
        let spawners: [&dyn Spawner; 4] =
            [&self.coins, &self.powerups, &self.bullets, &self.obstacles];

        let mut current = std::collections::BTreeSet::new();
        let mut began = Vec::new();
        for spawner in spawners {
            let Some(category) = Category::of(spawner.kind()) else {
                continue;
            };
            for entity in spawner.pool().iter() {
                if !player.overlaps(&entity.body) {
                    continue;
                }
                current.insert(entity.id);
                if !self.touching.contains(&entity.id) {
                    began.push(Contact {
                        a: Collider::new(category, Some(entity.id)),
                        b: Collider::new(Category::Player, Some(EntityId::PLAYER)),
                        point: (player.position + entity.body.position) / 2.0,
                    });
                }
            }
        }
        self.touching = current;
        began
    }

    /// Apply the gameplay outcome of one contact
    fn resolve(&mut self, contact: Contact) {
        let Some(kind) = contact.classify() else {
            return;
        };
        let game_over = self.is_game_over();
        match kind {
            ContactKind::Landed { height } => {
                if height < self.tuning.landing_threshold && !self.player.jetpack_on {
                    self.player.run(self.sim.speed, self.render.as_mut());
                }
            }
            ContactKind::Coin(id) => self.collect_coin(id),
            ContactKind::Powerup(id) if !game_over => self.collect_powerup(id),
            ContactKind::Bullet(id) if !game_over => {
                self.bullets.on_collision(id, self.render.as_mut());
                if !self.is_invulnerable() {
                    self.kill_player(contact.point);
                }
            }
            ContactKind::Obstacle(_) if !game_over => {
                if !self.is_invulnerable() {
                    self.kill_player(contact.point);
                }
            }
            ContactKind::Powerup(_) | ContactKind::Bullet(_) | ContactKind::Obstacle(_) => {}
        }
    }

    /// Advance everything by one frame
    fn step(&mut self, dt: f32) {
        self.tick_count += 1;

        for key in self.clock.tick(dt) {
            self.on_timer(key);
        }

        let expired = self.activations.tick(dt, self.render.as_mut());
        for activation in &expired {
            log::info!("{:?} ran out", activation.kind);
        }
        self.sync_effects();

        // Distance
        let lightspeed = self.effects.lightspeed;
        let delta = self.sim.distance_delta(lightspeed, &self.tuning);
        let ramps = self.sim.advance_distance(delta, lightspeed, self.tuning.ramp_interval);

        // Entity motion
        let speed = self.effective_speed();
        let render = self.render.as_mut();
        for spawner in [
            &mut self.bullets as &mut dyn Spawner,
            &mut self.coins,
            &mut self.powerups,
            &mut self.robots,
            &mut self.obstacles,
        ] {
            spawner.tick(speed, dt, render);
        }
        self.wrap_background(speed);

        if self.effects.magnet || self.coins.any_seeking() {
            self.coins.seek(
                self.player.position,
                self.effects.magnet,
                self.tuning.coin_seek_speed,
                self.render.as_mut(),
            );
        }

        for _ in 0..ramps {
            self.ramp();
        }
        self.sim.check_speed();

        self.step_player(dt);

        for contact in self.detect_contacts() {
            self.resolve(contact);
        }

        if delta > 0.0 {
            self.events.push(GameEvent::DistanceChanged(self.sim.distance));
            let meters = self.sim.distance.round() as u32;
            if meters > self.wallet.high_score {
                self.wallet.high_score = meters;
            }
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    world.apply_input(input);
    if world.phase != GamePhase::Idle && !world.paused {
        world.step(dt);
    }
    world.flush_events();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, Wallet};
    use crate::renderer::RecordingRenderer;
    use crate::session::EventLog;
    use crate::sim::player::Mode;
    use crate::sim::spawn::Spawner;
    use crate::sim::state::{EntityKind, PowerupKind, Tag};
    use crate::tuning::Tuning;

    struct Rig {
        world: World,
        render: RecordingRenderer,
        store: MemoryStore,
        events: EventLog,
    }

    fn rig_with(wallet: Wallet) -> Rig {
        let render = RecordingRenderer::new();
        let store = MemoryStore::new(wallet);
        let events = EventLog::new();
        let world = World::new(
            42,
            Tuning::default(),
            Box::new(render.clone()),
            Box::new(store.clone()),
            Box::new(events.clone()),
        );
        Rig {
            world,
            render,
            store,
            events,
        }
    }

    fn rig() -> Rig {
        rig_with(Wallet::default())
    }

    fn run(world: &mut World, seconds: f32) {
        let ticks = (seconds / SIM_DT).round() as usize;
        for _ in 0..ticks {
            tick(world, &TickInput::default(), SIM_DT);
        }
    }

    fn start(world: &mut World) {
        let input = TickInput {
            thrust_start: true,
            ..Default::default()
        };
        tick(world, &input, SIM_DT);
        let input = TickInput {
            thrust_end: true,
            ..Default::default()
        };
        tick(world, &input, SIM_DT);
    }

    /// Drop a fresh entity of `key`'s stream right onto the player
    fn spawn_on_player(world: &mut World, key: TimerKey) -> EntityId {
        let ids = world.spawn(key);
        let id = ids[0];
        let target = world.player.position;
        let entity = match key {
            TimerKey::SpawnObstacle => world.obstacles.pool_mut().get_mut(id),
            TimerKey::SpawnPowerup => world.powerups.pool_mut().get_mut(id),
            TimerKey::SpawnCoin => world.coins.pool_mut().get_mut(id),
            _ => unreachable!(),
        };
        entity.unwrap().body.position = target;
        id
    }

    #[test]
    fn test_idle_world_does_not_advance() {
        let mut rig = rig();
        run(&mut rig.world, 1.0);
        assert_eq!(rig.world.distance(), 0.0);
        assert_eq!(rig.world.phase(), GamePhase::Idle);
        assert_eq!(rig.world.entity_count(), 0);
    }

    #[test]
    fn test_first_thrust_starts_session_once() {
        let mut rig = rig();
        start(&mut rig.world);
        start(&mut rig.world);
        assert_eq!(rig.world.phase(), GamePhase::Running);
        assert_eq!(rig.events.count(|e| *e == GameEvent::GameStarted), 1);
        assert!(rig.world.clock.is_scheduled(TimerKey::SpawnRobot));
        assert!(rig.world.distance() > 0.0);
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut rig = rig();
        start(&mut rig.world);
        let pause = TickInput {
            pause_toggle: true,
            ..Default::default()
        };
        tick(&mut rig.world, &pause, SIM_DT);
        let frozen = rig.world.distance();
        run(&mut rig.world, 1.0);
        assert_eq!(rig.world.distance(), frozen);

        // Thrust is ignored while paused
        let thrust = TickInput {
            thrust_start: true,
            ..Default::default()
        };
        tick(&mut rig.world, &thrust, SIM_DT);
        assert!(!rig.world.player().jetpack_on);

        tick(&mut rig.world, &pause, SIM_DT);
        assert!(rig.world.distance() > frozen);
    }

    #[test]
    fn test_distance_and_speed_invariants() {
        let mut rig = rig();
        start(&mut rig.world);
        let mut last = rig.world.distance();
        for i in 0..3000 {
            let input = TickInput {
                thrust_start: i % 40 == 0,
                thrust_end: i % 40 == 20,
                ..Default::default()
            };
            tick(&mut rig.world, &input, SIM_DT);
            assert!(rig.world.distance() >= last);
            assert!(rig.world.speed() >= 0.0);
            last = rig.world.distance();
        }
    }

    #[test]
    fn test_coin_pickup_counts_and_reports() {
        let mut rig = rig();
        start(&mut rig.world);
        let id = spawn_on_player(&mut rig.world, TimerKey::SpawnCoin);
        tick(&mut rig.world, &TickInput::default(), SIM_DT);

        assert!(!rig.world.coins.pool().contains(id));
        assert!(rig.world.coins_collected() >= 1);
        assert_eq!(rig.world.wallet().coins, rig.world.coins_collected());
        assert_eq!(rig.events.count(|e| *e == GameEvent::CoinCountChanged(1)), 1);
        assert!(!rig.render.log().live.contains_key(&id));
    }

    #[test]
    fn test_new_coins_clear_what_they_cover() {
        let mut rig = rig();
        let world = &mut rig.world;
        let powerup = world.spawn(TimerKey::SpawnPowerup)[0];
        // Park it out of the way so the obstacle places cleanly
        world.powerups.pool_mut().get_mut(powerup).unwrap().body.position =
            Vec2::new(5000.0, 5000.0);
        let obstacle = world.spawn(TimerKey::SpawnObstacle)[0];

        // Both now cover the whole strip a formation can land on
        let strip = Vec2::new(SCENE_WIDTH + 250.0, SCENE_HEIGHT / 2.0);
        world.powerups.pool_mut().get_mut(powerup).unwrap().body =
            crate::sim::Body::circle(strip, 300.0);
        world.obstacles.pool_mut().get_mut(obstacle).unwrap().body =
            crate::sim::Body::rect(strip, Vec2::new(600.0, SCENE_HEIGHT), 0.0);

        let coins = world.spawn(TimerKey::SpawnCoin);
        assert!(!coins.is_empty());
        assert!(!world.powerups.pool().contains(powerup));
        assert!(!world.obstacles.pool().contains(obstacle));

        let log = rig.render.log();
        assert!(!log.live.contains_key(&powerup));
        assert!(!log.live.contains_key(&obstacle));
        assert!(coins.iter().all(|id| log.live.contains_key(id)));
        assert_eq!(log.unknown_handles, 0);
    }

    #[test]
    fn test_purchased_powerups_need_a_running_session() {
        let mut rig = rig_with(Wallet {
            lightspeed: 1,
            ..Default::default()
        });
        assert!(!rig.world.use_purchased(PowerupKind::Lightspeed));
        assert!(rig.world.activations().is_empty());
        assert!(!rig.world.effects().lightspeed);
        assert_eq!(rig.world.wallet().lightspeed, 1);
        assert_eq!(rig.store.wallet().lightspeed, 1);

        // The menu still starts a run, and the powerup is usable there
        start(&mut rig.world);
        assert_eq!(rig.world.phase(), GamePhase::Running);
        assert!(rig.world.use_purchased(PowerupKind::Lightspeed));
        assert!(rig.world.effects().lightspeed);

        // Not once the player is down either
        rig.world.wallet.lightspeed = 1;
        let at = rig.world.player.position;
        rig.world.kill_player(at);
        assert!(!rig.world.use_purchased(PowerupKind::Lightspeed));
    }

    #[test]
    fn test_obstacle_kills_unless_invulnerable() {
        let mut rig = rig();
        start(&mut rig.world);
        rig.world.grant_temporary_immortality(2.0);
        spawn_on_player(&mut rig.world, TimerKey::SpawnObstacle);
        tick(&mut rig.world, &TickInput::default(), SIM_DT);
        assert_eq!(rig.world.phase(), GamePhase::Running);

        rig.world.temporary_immortality = false;
        spawn_on_player(&mut rig.world, TimerKey::SpawnObstacle);
        tick(&mut rig.world, &TickInput::default(), SIM_DT);
        assert_eq!(rig.world.phase(), GamePhase::GameOver);
        assert_eq!(rig.world.player().mode(), Mode::Dead);
        assert_eq!(rig.events.count(|e| *e == GameEvent::GameOver), 0);

        // Death pause, then the world stops and reports
        run(&mut rig.world, 1.05);
        assert_eq!(rig.world.speed(), 0.0);
        assert_eq!(rig.events.count(|e| *e == GameEvent::GameOver), 1);
        assert!(rig.store.saves() >= 1);
    }

    #[test]
    fn test_bullet_is_removed_even_when_immortal() {
        let mut rig = rig();
        start(&mut rig.world);
        rig.world.grant_temporary_immortality(2.0);
        let id = rig.world.spawn(TimerKey::SpawnBullet)[0];
        rig.world.bullets.pool_mut().get_mut(id).unwrap().body.position = rig.world.player.position;
        tick(&mut rig.world, &TickInput::default(), SIM_DT);
        assert!(!rig.world.bullets.pool().contains(id));
        assert_eq!(rig.world.phase(), GamePhase::Running);
        assert_eq!(rig.render.log().live_of_kind(EntityKind::Warning), 0);
    }

    #[test]
    fn test_powerup_pickup_activates() {
        let mut rig = rig();
        start(&mut rig.world);
        let id = spawn_on_player(&mut rig.world, TimerKey::SpawnPowerup);
        let Tag::Powerup(kind) = rig.world.powerups.pool().get(id).unwrap().tag else {
            unreachable!()
        };
        tick(&mut rig.world, &TickInput::default(), SIM_DT);

        assert_eq!(rig.world.activations().kinds(), vec![kind]);
        assert_eq!(rig.events.count(|e| *e == GameEvent::PowerupAlert(kind)), 1);
        let log = rig.render.log();
        assert_eq!(log.live.get(&id).unwrap().kind, EntityKind::CollectedPowerup);
    }

    #[test]
    fn test_lightspeed_cycle() {
        let mut rig = rig_with(Wallet {
            lightspeed: 1,
            ..Default::default()
        });
        start(&mut rig.world);
        assert!(rig.world.use_purchased(PowerupKind::Lightspeed));
        assert!(!rig.world.use_purchased(PowerupKind::Lightspeed));
        assert_eq!(rig.store.wallet().lightspeed, 0);

        assert!(rig.world.effects().lightspeed);
        assert!(rig.world.is_invulnerable());
        assert_eq!(rig.world.robots.forward_duration(), 0.2);
        assert!(!rig.world.thrust_start());
        assert_eq!(rig.world.player().position.y, SCENE_HEIGHT / 2.0);

        let before = rig.world.distance();
        run(&mut rig.world, 1.0);
        assert!((rig.world.distance() - before - 24.0).abs() < 0.5);

        run(&mut rig.world, 4.1);
        assert!(!rig.world.effects().lightspeed);
        assert!(rig.world.is_temporarily_immortal());
        assert_eq!(rig.world.robots.forward_duration(), 15.0);

        run(&mut rig.world, 3.1);
        assert!(!rig.world.is_temporarily_immortal());
    }

    #[test]
    fn test_magnet_overlay_and_seek() {
        let mut rig = rig_with(Wallet {
            magnet: 1,
            ..Default::default()
        });
        start(&mut rig.world);
        let ids = rig.world.spawn(TimerKey::SpawnCoin);
        assert!(rig.world.use_purchased(PowerupKind::Magnet));
        assert_eq!(rig.world.player().overlay(), crate::sim::player::Overlay::Magnet);

        // Scroll the formation on screen; the magnet pulls it in
        run(&mut rig.world, 3.0);
        assert!(ids.iter().all(|id| !rig.world.coins.pool().contains(*id)));
        assert!(rig.world.coins_collected() as usize >= ids.len());
    }

    #[test]
    fn test_reset_restores_initial_constants() {
        let mut rig = rig();
        start(&mut rig.world);
        rig.world.grant_temporary_immortality(100.0);
        for i in 0..1200 {
            let input = TickInput {
                thrust_start: i % 30 == 0,
                thrust_end: i % 30 == 15,
                ..Default::default()
            };
            tick(&mut rig.world, &input, SIM_DT);
        }
        // Force a couple of ramp steps
        rig.world.ramp();
        rig.world.ramp();
        rig.world.ramp();
        assert!(rig.world.entity_count() > 0);

        rig.world.retry();
        rig.world.flush_events();

        let tuning = Tuning::default();
        assert_eq!(rig.world.distance(), 0.0);
        assert_eq!(rig.world.speed(), 6.0);
        assert_eq!(rig.world.difficulty_step(), 0);
        assert_eq!(rig.world.gravity_profile().powered_on, Vec2::new(0.0, 9.0));
        assert_eq!(rig.world.gravity_profile().powered_off, Vec2::new(0.0, -5.0));
        assert_eq!(rig.world.bullet_duration(), 0.4);
        assert_eq!(rig.world.robot_forward_duration(), tuning.robot_forward_duration);
        assert_eq!(rig.world.simulation().distance_step, tuning.distance_step);
        assert_eq!(rig.world.entity_count(), 0);
        assert!(rig.world.activations().is_empty());
        assert!(!rig.world.is_temporarily_immortal());
        assert_eq!(rig.world.phase(), GamePhase::Running);
        assert_eq!(rig.events.count(|e| *e == GameEvent::GameStarted), 2);
    }

    #[test]
    fn test_quit_leaves_world_idle() {
        let mut rig = rig();
        start(&mut rig.world);
        run(&mut rig.world, 2.0);
        rig.world.quit();
        assert_eq!(rig.world.phase(), GamePhase::Idle);
        assert!(!rig.world.clock.is_scheduled(TimerKey::SpawnBullet));
        run(&mut rig.world, 1.0);
        assert_eq!(rig.world.distance(), 0.0);
        assert_eq!(rig.world.entity_count(), 0);
    }

    #[test]
    fn test_revive_restores_speed_after_delay() {
        let mut rig = rig();
        start(&mut rig.world);
        // Put the run at 150 m with its 100 m ramp already consumed
        rig.world.sim.advance_distance(150.0, false, 100);
        rig.world.sim.speed = 8.0;

        let at = rig.world.player.position;
        rig.world.kill_player(at);
        run(&mut rig.world, 1.05);
        assert_eq!(rig.world.speed(), 0.0);
        assert!(rig.world.distance() >= 150.0);

        assert!(rig.world.revive());
        assert!(!rig.world.revive());
        assert!(rig.world.is_temporarily_immortal());
        assert_eq!(rig.world.phase(), GamePhase::Running);

        run(&mut rig.world, 0.25);
        assert_eq!(rig.world.speed(), 0.0);
        assert_eq!(rig.world.player().mode(), Mode::Dead);

        run(&mut rig.world, 0.3);
        assert_eq!(rig.world.speed(), 8.0);
        assert_eq!(rig.world.player().mode(), Mode::Run);
        assert!(rig.world.player().is_alive());

        run(&mut rig.world, 3.3);
        assert!(rig.world.is_temporarily_immortal());
        run(&mut rig.world, 0.2);
        assert!(!rig.world.is_temporarily_immortal());
    }

    #[test]
    fn test_paid_revive_needs_coins() {
        let mut rig = rig_with(Wallet {
            coins: 499,
            ..Default::default()
        });
        start(&mut rig.world);
        let at = rig.world.player.position;
        rig.world.kill_player(at);
        assert!(!rig.world.purchase_revive().unwrap());

        rig.world.wallet.coins = 700;
        assert!(rig.world.purchase_revive().unwrap());
        assert_eq!(rig.world.wallet().coins, 200);
        assert_eq!(rig.world.phase(), GamePhase::Running);
    }

    #[test]
    fn test_shop_purchase_updates_wallet() {
        let mut rig = rig_with(Wallet {
            coins: 1000,
            ..Default::default()
        });
        assert!(rig.world.purchase(PowerupKind::Immortality).unwrap());
        assert!(rig.world.purchase(PowerupKind::Immortality).unwrap());
        assert!(!rig.world.purchase(PowerupKind::Immortality).unwrap());
        assert_eq!(rig.world.wallet().immortality, 2);
        assert_eq!(rig.store.wallet().coins, 0);
    }

    #[test]
    fn test_broken_storage_never_stops_play() {
        let render = RecordingRenderer::new();
        let mut world = World::new(
            1,
            Tuning::default(),
            Box::new(render),
            Box::new(MemoryStore::failing()),
            Box::new(EventLog::new()),
        );
        assert_eq!(world.wallet(), Wallet::default());
        start(&mut world);
        run(&mut world, 1.0);
        world.checkpoint();
        world.retry();
        assert!(world.purchase(PowerupKind::Magnet).is_err());
    }

    #[test]
    fn test_high_score_follows_distance() {
        let mut rig = rig_with(Wallet {
            high_score: 3,
            ..Default::default()
        });
        start(&mut rig.world);
        rig.world.grant_temporary_immortality(100.0);
        run(&mut rig.world, 2.0);
        let meters = rig.world.distance().round() as u32;
        assert!(meters > 3);
        assert_eq!(rig.world.wallet().high_score, meters);
        assert_eq!(rig.events.last_distance(), Some(rig.world.distance()));

        rig.world.checkpoint();
        assert_eq!(rig.store.wallet().high_score, meters);
    }

    #[test]
    fn test_no_dangling_render_handles() {
        let mut rig = rig_with(Wallet {
            magnet: 1,
            immortality: 1,
            ..Default::default()
        });
        start(&mut rig.world);
        rig.world.use_purchased(PowerupKind::Magnet);
        rig.world.use_purchased(PowerupKind::Immortality);

        for i in 0..(40.0 / SIM_DT) as usize {
            let input = TickInput {
                thrust_start: i % 50 == 0,
                thrust_end: i % 50 == 25,
                ..Default::default()
            };
            tick(&mut rig.world, &input, SIM_DT);
            if rig.world.is_game_over() && i % 300 == 0 {
                rig.world.revive();
            }
        }

        let world = &rig.world;
        let warnings = world
            .bullets
            .pool()
            .iter()
            .filter(|e| {
                matches!(
                    e.tag,
                    Tag::Bullet {
                        phase: crate::sim::state::BulletPhase::Warning,
                        ..
                    }
                )
            })
            .count();
        // Player and the two background bands
        let fixed = 3;
        let log = rig.render.log();
        assert_eq!(
            log.live.len(),
            world.entity_count() + world.activations().len() + warnings + fixed
        );
        for kind in [
            EntityKind::Bullet,
            EntityKind::Coin,
            EntityKind::Powerup,
            EntityKind::Robot,
            EntityKind::Obstacle,
        ] {
            for entity in world.pool(kind).unwrap().iter() {
                assert!(log.live.contains_key(&entity.id), "{kind:?} {} has no handle", entity.id);
            }
        }
        assert_eq!(log.unknown_handles, 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn distance_never_decreases(
                seed in 0u64..1000,
                presses in proptest::collection::vec(any::<bool>(), 60..240)
            ) {
                let mut world = World::new(
                    seed,
                    Tuning::default(),
                    Box::new(RecordingRenderer::new()),
                    Box::new(MemoryStore::default()),
                    Box::new(EventLog::new()),
                );
                let mut last = world.distance();
                for (i, &press) in presses.iter().enumerate() {
                    let input = TickInput {
                        thrust_start: press,
                        thrust_end: !press,
                        pause_toggle: i % 97 == 96,
                    };
                    // Hold each input for a few frames
                    for _ in 0..5 {
                        tick(&mut world, &input, SIM_DT);
                        prop_assert!(world.distance() >= last);
                        prop_assert!(world.speed() >= 0.0);
                        let y = world.player().position.y;
                        let (floor, ceiling) =
                            (GROUND_Y + PLAYER_RADIUS, SCENE_HEIGHT - PLAYER_RADIUS);
                        prop_assert!((floor..=ceiling).contains(&y));
                        last = world.distance();
                    }
                }
            }

            #[test]
            fn ramp_steps_match_milestones(steps in 1usize..4000) {
                let tuning = Tuning::default();
                let mut sim = crate::sim::SimulationState::new(&tuning);
                let mut ramps = 0;
                for _ in 0..steps {
                    ramps += sim.advance_distance(sim.distance_step, false, tuning.ramp_interval);
                }
                let expected = sim.distance.round() as u32 / tuning.ramp_interval;
                prop_assert_eq!(ramps, expected);
            }
        }
    }
}
