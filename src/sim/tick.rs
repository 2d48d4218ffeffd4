//! Fixed timestep simulation tick
//!
//! Applies one tick of latched input to the session, steps the world, and
//! feeds the resulting notifications back into the session layer.

use super::participant::{Body, Category};
use super::state::{GameEvent, GamePhase, GameState};
use crate::audio::SoundEffect;
use crate::normalize_angle;

/// Input commands for a single tick (latched intent flags)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub accelerate: bool,
    pub decelerate: bool,
    pub fire: bool,
    /// Absolute aim angle (from the mouse), overrides turning
    pub target_rotation: Option<f32>,
    /// Start a new game from the splash or game-over screen
    pub start: bool,
    /// Idle/demo mode - autopilot flies the ship
    pub idle_mode: bool,
    /// Debug: timed invulnerability
    pub debug_invulnerability: bool,
    /// Debug: one more large asteroid
    pub debug_add_asteroid: bool,
}

/// Advance the game state by one fixed timestep; returns this tick's events
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: u64) -> Vec<GameEvent> {
    if input.start && state.phase != GamePhase::Playing {
        state.start_game();
    }

    if state.phase == GamePhase::Playing {
        // It may be time for a transition
        state.update();

        let mut input = input.clone();
        if input.idle_mode {
            autopilot(state, &mut input);
        }
        apply_intents(state, &input);
    }

    state.world.step(dt_ms);

    let events = state.world.drain_events();
    state.handle_events(&events);
    events
}

fn apply_intents(state: &mut GameState, input: &TickInput) {
    if input.debug_invulnerability {
        state.debug_invulnerability();
    }
    if input.debug_add_asteroid {
        state.debug_add_asteroid();
    }

    let Some(ship_id) = state.ship() else { return };
    let mut thrust_started = false;
    if let Some(ship) = state.ship_mut() {
        if input.turn_right {
            ship.turn_right();
        } else if input.turn_left {
            ship.turn_left();
        }
        if let Some(rotation) = input.target_rotation {
            ship.rotation = normalize_angle(rotation);
        }

        let was_thrusting = matches!(&ship.body, Body::Ship(s) if s.thrusting);
        if input.accelerate {
            ship.accelerate();
            thrust_started = !was_thrusting;
        } else if input.decelerate {
            ship.decelerate();
        } else {
            ship.stop();
        }
    }

    if thrust_started {
        state.world.play(SoundEffect::Thrust);
    }
    if input.fire {
        state.world.fire_bullet(ship_id);
    }
}

/// Aim at the nearest asteroid (or saucer) and keep firing
fn autopilot(state: &GameState, input: &mut TickInput) {
    let Some(ship) = state.ship().and_then(|id| state.world.get(id)) else {
        return;
    };
    let target = state
        .world
        .iter_live()
        .filter(|p| matches!(p.category(), Category::Asteroid | Category::AlienShip))
        .min_by(|a, b| {
            let dist_a = a.position.distance_squared(ship.position);
            let dist_b = b.position.distance_squared(ship.position);
            dist_a
                .partial_cmp(&dist_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    if let Some(target) = target {
        let to_target = target.position - ship.position;
        input.target_rotation = Some(to_target.y.atan2(to_target.x));
        input.fire = true;
    }
    input.accelerate = false;
    input.decelerate = true;
}
