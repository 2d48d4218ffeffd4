//! Asteroid Field headless runner
//!
//! Runs an autopilot session at the fixed tick rate without a window and
//! logs what happens. Usage:
//!
//! ```text
//! asteroid-field [seed] [ticks] [ruleset.json]
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to see session transitions.

use asteroid_field::audio::{AudioManager, LogAudio};
use asteroid_field::consts::FRAME_INTERVAL_MS;
use asteroid_field::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use asteroid_field::{Ruleset, SimResult};

const DEFAULT_SEED: u64 = 12345;
const DEFAULT_TICKS: u64 = 30 * 60 * 2;

fn main() {
    env_logger::init();
    log::info!("Asteroid Field (headless) starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> SimResult<()> {
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let ticks = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);
    let rules = match args.next() {
        Some(path) => {
            log::info!("Loading ruleset from {path}");
            Ruleset::load(path)?
        }
        None => Ruleset::default(),
    };
    log::info!("Seed {seed}, {ticks} ticks, {} rules", rules.version.as_str());

    let mut state = GameState::new(seed, rules)?;
    let mut audio = AudioManager::new(Some(Box::new(LogAudio::default())));

    let mut input = TickInput {
        start: true,
        idle_mode: true,
        ..Default::default()
    };

    let mut asteroids_destroyed = 0u32;
    let mut aliens_destroyed = 0u32;
    for n in 0..ticks {
        let events = tick(&mut state, &input, FRAME_INTERVAL_MS);
        input.start = false;

        for event in &events {
            match event {
                GameEvent::AsteroidDestroyed { .. } => asteroids_destroyed += 1,
                GameEvent::AlienDestroyed => aliens_destroyed += 1,
                GameEvent::ScoreDelta(_) => {}
                other => log::info!("tick {n}: {other:?}"),
            }
        }
        audio.play_all(state.world.drain_sounds());

        if state.phase == GamePhase::GameOver {
            log::info!("Game over after {n} ticks");
            break;
        }
    }

    println!(
        "level {} | score {} | lives {} | asteroids destroyed {} | aliens destroyed {} | {:.1}s simulated",
        state.level,
        state.score(),
        state.lives,
        asteroids_destroyed,
        aliens_destroyed,
        state.world.now_ms() as f64 / 1000.0
    );
    Ok(())
}
