//! Ninja Jetpack headless runner
//!
//! Plays one session on autopilot with the null renderer and logs the
//! outcome. Useful for soak-testing balance changes.
//!
//! Usage: `ninja-jetpack [tuning.json] [wallet.json]`

use ninja_jetpack::consts::*;
use ninja_jetpack::persistence::JsonFileStore;
use ninja_jetpack::renderer::NullRenderer;
use ninja_jetpack::session::SessionEvents;
use ninja_jetpack::sim::{GamePhase, PowerupKind, TickInput, World, tick};
use ninja_jetpack::tuning::Tuning;
use ninja_jetpack::{GameError, format_counter};

/// Longest session the autopilot will play, in seconds
const MAX_SESSION: f32 = 600.0;
/// Hover band for the autopilot
const HOVER_LOW: f32 = 120.0;
const HOVER_HIGH: f32 = 260.0;

/// Logs the UI callbacks instead of drawing a HUD
struct LogEvents;

impl SessionEvents for LogEvents {
    fn on_game_started(&mut self) {
        log::info!("Game started");
    }

    fn on_game_over(&mut self) {
        log::info!("Game over");
    }

    fn on_powerup_alert(&mut self, kind: PowerupKind) {
        log::info!("Powerup: {kind:?}");
    }

    fn on_coin_count_changed(&mut self, count: u32) {
        log::debug!("Coins {}", format_counter(count));
    }
}

fn run() -> Result<(), GameError> {
    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let wallet_path = args.next().unwrap_or_else(|| "wallet.json".to_string());
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let store = JsonFileStore::new(wallet_path);
    log::info!("Wallet file: {}", store.path().display());
    let mut world = World::new(
        seed,
        tuning,
        Box::new(NullRenderer),
        Box::new(store),
        Box::new(LogEvents),
    );

    let max_ticks = (MAX_SESSION / SIM_DT) as u64;
    let mut thrusting = false;
    let mut revived = false;
    for _ in 0..max_ticks {
        let y = world.player().position.y;
        let mut input = TickInput::default();
        if world.phase() != GamePhase::GameOver {
            if world.phase() == GamePhase::Idle || (!thrusting && y < HOVER_LOW) {
                input.thrust_start = true;
                thrusting = true;
            } else if thrusting && y > HOVER_HIGH {
                input.thrust_end = true;
                thrusting = false;
            }
        }
        tick(&mut world, &input, SIM_DT);

        if world.is_game_over() && world.speed() == 0.0 {
            if !revived && world.purchase_revive()? {
                revived = true;
                thrusting = false;
                continue;
            }
            break;
        }
    }

    world.checkpoint();
    log::info!(
        "Session over: {:.0} m, {} coins, {} ramp steps, high score {}",
        world.distance(),
        format_counter(world.coins_collected()),
        world.difficulty_step(),
        world.wallet().high_score
    );
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Ninja Jetpack (headless) starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
