//! Asteroid Field - a wrap-around asteroids arcade simulation
//!
//! Core modules:
//! - `sim`: Participant simulation (geometry, registry, timers, collisions, game session)
//! - `tuning`: Data-driven game balance
//! - `audio`: Sound cue sink used by the host
//! - `error`: Construction and configuration errors

pub mod audio;
pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{SimError, SimResult};
pub use tuning::Ruleset;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Side of the square, toroidal play-field
    pub const FIELD_SIZE: f32 = 750.0;
    /// Fixed simulation tick interval (milliseconds)
    pub const FRAME_INTERVAL_MS: u64 = 33;

    /// Ship thrust impulse per tick
    pub const SHIP_ACCELERATION: f32 = 0.4;
    /// Ship speed is multiplied by this every tick before integrating
    pub const SHIP_FRICTION: f32 = 0.995;
    /// Ship speed cap
    pub const SPEED_LIMIT: f32 = 15.0;
    /// Ship rotation per turn intent (radians)
    pub const SHIP_TURN: f32 = std::f32::consts::PI / 16.0;

    /// Projectile and drift speeds (units per tick)
    pub const BULLET_SPEED: f32 = 14.0;
    pub const ALIEN_BULLET_SPEED: f32 = 14.0;
    pub const DEBRIS_SPEED: f32 = 1.0;
    pub const STAR_SPEED: f32 = 3.0;
    pub const POWER_UP_SPEED: f32 = 5.0;

    /// Outline scale by asteroid size (small, medium, large)
    pub const ASTEROID_SCALE: [f32; 3] = [0.5, 1.0, 2.0];
    /// Speed of the large asteroids placed at level start
    pub const ASTEROID_START_SPEED: f32 = 3.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Wrap a coordinate into [0, size)
#[inline]
pub fn wrap_coordinate(value: f32, size: f32) -> f32 {
    let wrapped = value.rem_euclid(size);
    // rem_euclid rounds tiny negatives up to `size`
    if wrapped >= size || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}
