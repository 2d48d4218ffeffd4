//! Simulation error types
//!
//! Only construction and configuration can fail. A running tick never
//! returns an error.

use thiserror::Error;

/// Errors raised when building participants or loading a ruleset.
#[derive(Error, Debug)]
pub enum SimError {
    /// Asteroid size index outside 0 (small) ..= 2 (large).
    #[error("invalid asteroid size: {0}")]
    InvalidAsteroidSize(u8),

    /// Asteroid outline variety outside 0..=3.
    #[error("invalid asteroid variety: {0}")]
    InvalidAsteroidVariety(u8),

    /// Power-up variety outside 1..=2.
    #[error("invalid power-up variety: {0}")]
    InvalidPowerUpVariety(u8),

    /// Alien saucers only appear from level 2.
    #[error("no alien ship exists for level {0}")]
    InvalidAlienLevel(u32),

    /// Ruleset values that cannot drive a game.
    #[error("invalid ruleset: {0}")]
    InvalidRuleset(String),

    /// Ruleset JSON failed to parse.
    #[error("ruleset parse error: {0}")]
    RulesetParse(#[from] serde_json::Error),

    /// Ruleset file could not be read.
    #[error("ruleset read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fallible construction.
pub type SimResult<T> = Result<T, SimError>;
