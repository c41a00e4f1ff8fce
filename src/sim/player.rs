//! Player character state machine
//!
//! The player is a base mode (Idle/Run/Fly/Dead) crossed with an overlay
//! (None/Immortal/Magnet). Entering the pair it is already in does nothing,
//! so a running animation is never restarted. Dead is terminal until a revive.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Body;
use super::state::{EntityId, EntityKind};
use crate::consts::*;
use crate::renderer::{FrameSet, ParticleEffect, RenderSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Idle,
    Run,
    Fly,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Overlay {
    None,
    Immortal,
    Magnet,
}

impl Overlay {
    /// Immortal wins over Magnet
    pub fn select(immortal: bool, magnet: bool) -> Self {
        if immortal {
            Overlay::Immortal
        } else if magnet {
            Overlay::Magnet
        } else {
            Overlay::None
        }
    }
}

/// Animation set for a mode/overlay pair
pub fn frame_set(mode: Mode, overlay: Overlay) -> FrameSet {
    match (mode, overlay) {
        (Mode::Idle, _) => FrameSet::Idle,
        (Mode::Dead, _) => FrameSet::Dead,
        (Mode::Run, Overlay::None) => FrameSet::Run,
        (Mode::Run, Overlay::Immortal) => FrameSet::RunImmortal,
        (Mode::Run, Overlay::Magnet) => FrameSet::RunMagnet,
        (Mode::Fly, Overlay::None) => FrameSet::Fly,
        (Mode::Fly, Overlay::Immortal) => FrameSet::FlyImmortal,
        (Mode::Fly, Overlay::Magnet) => FrameSet::FlyMagnet,
    }
}

/// Seconds per frame of the run cycle; faster world, faster legs
pub fn run_frame_interval(world_speed: f32) -> f32 {
    (0.1 - world_speed / 200.0).max(0.045)
}

const DEFAULT_FRAME_INTERVAL: f32 = 0.1;
const DEAD_FRAME_INTERVAL: f32 = 0.2;
const REVIVE_FRAME_INTERVAL: f32 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec2,
    /// Vertical velocity in points per second
    pub velocity_y: f32,
    pub jetpack_on: bool,
    mode: Mode,
    overlay: Overlay,
    alive: bool,
    /// Overlay of the last locomotion mode, reapplied after fly/run switches
    last_overlay: Overlay,
    physics_enabled: bool,
    grounded: bool,
    reviving: bool,
    /// Number of times an animation was (re)started
    animation_starts: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: PLAYER_START,
            velocity_y: 0.0,
            jetpack_on: false,
            mode: Mode::Idle,
            overlay: Overlay::None,
            alive: true,
            last_overlay: Overlay::None,
            physics_enabled: true,
            grounded: true,
            reviving: false,
            animation_starts: 0,
        }
    }
}

impl Player {
    /// Register the player with the render sink and start idling
    pub fn spawn(&mut self, render: &mut dyn RenderSink) {
        render.add_entity(EntityId::PLAYER, EntityKind::Player, self.position, self.body().shape);
        self.play(Mode::Idle, Overlay::None, 0.0, render);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_reviving(&self) -> bool {
        self.reviving
    }

    pub fn animation_starts(&self) -> u32 {
        self.animation_starts
    }

    pub fn body(&self) -> Body {
        Body::circle(self.position, PLAYER_RADIUS)
    }

    /// Jetpack on or above the ground threshold
    pub fn is_airborne(&self, ground_threshold: f32) -> bool {
        self.jetpack_on || self.position.y > ground_threshold
    }

    /// Fly when airborne, otherwise run
    pub fn locomotion(&self, ground_threshold: f32) -> Mode {
        if self.is_airborne(ground_threshold) {
            Mode::Fly
        } else {
            Mode::Run
        }
    }

    fn play(
        &mut self,
        mode: Mode,
        overlay: Overlay,
        world_speed: f32,
        render: &mut dyn RenderSink,
    ) {
        let (interval, looping) = match mode {
            Mode::Run => (run_frame_interval(world_speed), true),
            Mode::Dead => (DEAD_FRAME_INTERVAL, false),
            Mode::Idle | Mode::Fly => (DEFAULT_FRAME_INTERVAL, true),
        };
        render.play_animation(
            EntityId::PLAYER,
            frame_set(mode, overlay),
            1.0 / interval,
            looping,
        );
        self.mode = mode;
        self.overlay = overlay;
        self.animation_starts += 1;
    }

    /// Request a mode/overlay pair. Returns false when nothing changed:
    /// the pair is already current, the player is dead, or a revive is
    /// still playing.
    pub fn set_mode(
        &mut self,
        mode: Mode,
        overlay: Overlay,
        world_speed: f32,
        render: &mut dyn RenderSink,
    ) -> bool {
        if self.mode == mode && self.overlay == overlay {
            return false;
        }
        if self.mode == Mode::Dead || self.reviving {
            return false;
        }
        if mode == Mode::Dead {
            self.kill(render);
            return true;
        }
        self.play(mode, overlay, world_speed, render);
        if matches!(mode, Mode::Run | Mode::Fly) {
            self.last_overlay = overlay;
        }
        true
    }

    /// Re-select locomotion with a new overlay
    pub fn refresh(
        &mut self,
        overlay: Overlay,
        ground_threshold: f32,
        world_speed: f32,
        render: &mut dyn RenderSink,
    ) -> bool {
        self.last_overlay = overlay;
        let mode = self.locomotion(ground_threshold);
        self.set_mode(mode, overlay, world_speed, render)
    }

    /// Switch to flying, keeping the current overlay
    pub fn fly(&mut self, world_speed: f32, render: &mut dyn RenderSink) -> bool {
        self.set_mode(Mode::Fly, self.last_overlay, world_speed, render)
    }

    /// Switch to running, keeping the current overlay
    pub fn run(&mut self, world_speed: f32, render: &mut dyn RenderSink) -> bool {
        self.set_mode(Mode::Run, self.last_overlay, world_speed, render)
    }

    pub fn thrust(&mut self, on: bool, render: &mut dyn RenderSink) {
        self.jetpack_on = on;
        if on {
            render.emit_particles(ParticleEffect::JetpackFlame, self.position);
        }
    }

    /// Enter the terminal dead state
    pub fn kill(&mut self, render: &mut dyn RenderSink) {
        if self.mode == Mode::Dead {
            return;
        }
        self.jetpack_on = false;
        self.alive = false;
        self.physics_enabled = true;
        self.reviving = false;
        self.play(Mode::Dead, Overlay::None, 0.0, render);
    }

    /// Start the reverse death animation. The player stays dead until
    /// [`Player::finish_revive`].
    pub fn begin_revive(&mut self, render: &mut dyn RenderSink) {
        if self.mode != Mode::Dead {
            return;
        }
        self.reviving = true;
        self.position.x = PLAYER_START.x;
        render.play_animation(
            EntityId::PLAYER,
            FrameSet::Revive,
            1.0 / REVIVE_FRAME_INTERVAL,
            false,
        );
        self.animation_starts += 1;
    }

    /// Revive animation done: back to running with no overlay
    pub fn finish_revive(&mut self, world_speed: f32, render: &mut dyn RenderSink) {
        if !self.reviving {
            return;
        }
        self.reviving = false;
        self.alive = true;
        self.last_overlay = Overlay::None;
        self.play(Mode::Run, Overlay::None, world_speed, render);
    }

    /// Pin the player mid-screen for lightspeed, or release it
    pub fn set_lightspeed(&mut self, on: bool, render: &mut dyn RenderSink) {
        if on {
            self.jetpack_on = true;
            self.physics_enabled = false;
            self.velocity_y = 0.0;
            self.grounded = false;
            self.position = Vec2::new(PLAYER_START.x, SCENE_HEIGHT / 2.0);
            render.emit_particles(ParticleEffect::Lightspeed, self.position);
        } else {
            self.jetpack_on = false;
            self.physics_enabled = true;
        }
    }

    /// Integrate gravity for one tick. Returns the contact point when the
    /// player touches down on the ground this tick.
    pub fn step(&mut self, gravity: Vec2, dt: f32) -> Option<Vec2> {
        if !self.physics_enabled {
            return None;
        }
        self.velocity_y += gravity.y * PIXELS_PER_METER * dt;
        self.position.y += self.velocity_y * dt;

        let floor = GROUND_Y + PLAYER_RADIUS;
        let ceiling = SCENE_HEIGHT - PLAYER_RADIUS;
        if self.position.y >= ceiling {
            self.position.y = ceiling;
            self.velocity_y = self.velocity_y.min(0.0);
        }

        if self.position.y <= floor {
            self.position.y = floor;
            self.velocity_y = self.velocity_y.max(0.0);
            if !self.grounded {
                self.grounded = true;
                return Some(Vec2::new(self.position.x, GROUND_Y));
            }
        } else {
            self.grounded = false;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingRenderer;

    fn spawned() -> (Player, RecordingRenderer) {
        let mut render = RecordingRenderer::new();
        let mut player = Player::default();
        player.spawn(&mut render);
        (player, render)
    }

    #[test]
    fn test_same_pair_is_noop() {
        let (mut player, mut render) = spawned();
        assert!(player.set_mode(Mode::Run, Overlay::None, 6.0, &mut render));
        let starts = player.animation_starts();
        let calls = render.log().animation_count(EntityId::PLAYER);

        assert!(!player.set_mode(Mode::Run, Overlay::None, 6.0, &mut render));
        assert_eq!(player.animation_starts(), starts);
        assert_eq!(render.log().animation_count(EntityId::PLAYER), calls);
    }

    #[test]
    fn test_overlay_priority() {
        assert_eq!(Overlay::select(true, true), Overlay::Immortal);
        assert_eq!(Overlay::select(false, true), Overlay::Magnet);
        assert_eq!(Overlay::select(false, false), Overlay::None);
    }

    #[test]
    fn test_fly_and_run_share_overlay() {
        let (mut player, mut render) = spawned();
        player.refresh(Overlay::Magnet, 55.0, 6.0, &mut render);
        assert_eq!(player.mode(), Mode::Run);
        assert!(player.fly(6.0, &mut render));
        assert_eq!(
            render.log().last_animation(EntityId::PLAYER).unwrap().frames,
            FrameSet::FlyMagnet
        );
        assert!(player.run(6.0, &mut render));
        assert_eq!(player.overlay(), Overlay::Magnet);
    }

    #[test]
    fn test_run_animation_speeds_up() {
        assert!((run_frame_interval(6.0) - 0.07).abs() < 1e-6);
        assert_eq!(run_frame_interval(20.0), 0.045);
        assert!(run_frame_interval(9.0) < run_frame_interval(6.0));
    }

    #[test]
    fn test_dead_is_terminal_until_revive() {
        let (mut player, mut render) = spawned();
        player.set_mode(Mode::Run, Overlay::None, 6.0, &mut render);
        player.kill(&mut render);
        assert!(!player.is_alive());
        assert!(!player.set_mode(Mode::Run, Overlay::None, 6.0, &mut render));
        assert_eq!(player.mode(), Mode::Dead);

        player.begin_revive(&mut render);
        assert!(!player.set_mode(Mode::Fly, Overlay::None, 6.0, &mut render));
        player.finish_revive(6.0, &mut render);
        assert!(player.is_alive());
        assert_eq!(player.mode(), Mode::Run);
    }

    #[test]
    fn test_thrust_lifts_and_gravity_lands() {
        let (mut player, mut render) = spawned();
        player.thrust(true, &mut render);
        for _ in 0..30 {
            assert!(player.step(Vec2::new(0.0, 9.0), SIM_DT).is_none());
        }
        assert!(player.position.y > 100.0);

        player.thrust(false, &mut render);
        let landed = (0..600).find_map(|_| player.step(Vec2::new(0.0, -5.0), SIM_DT));
        let contact = landed.expect("player should land");
        assert_eq!(contact.y, GROUND_Y);
        assert_eq!(player.position.y, GROUND_Y + PLAYER_RADIUS);
    }

    #[test]
    fn test_lightspeed_pins_player() {
        let (mut player, mut render) = spawned();
        player.set_lightspeed(true, &mut render);
        assert!(player.jetpack_on);
        let pinned = player.position;
        assert!(player.step(Vec2::new(0.0, -5.0), SIM_DT).is_none());
        assert_eq!(player.position, pinned);

        player.set_lightspeed(false, &mut render);
        player.step(Vec2::new(0.0, -5.0), SIM_DT);
        assert!(player.position.y < pinned.y);
    }
}
