//! Gameplay balance
//!
//! Physics constants live in `consts`; everything a designer would tweak
//! (scores, lifetimes, cadences, drop rates) lives in a `Ruleset` that can be
//! loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Ruleset presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RulesetVersion {
    /// Asteroids, ship and alien saucers only
    Classic,
    /// Classic plus power-up drops
    #[default]
    Enhanced,
}

impl RulesetVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulesetVersion::Classic => "Classic",
            RulesetVersion::Enhanced => "Enhanced",
        }
    }
}

/// Gameplay rules and balance numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub version: RulesetVersion,

    // === Scoring ===
    /// Points per destroyed asteroid, indexed small, medium, large
    pub asteroid_scores: [u32; 3],
    /// Points for the large (level 2) saucer
    pub large_alien_score: u32,
    /// Points for the small (level 3+) saucer
    pub small_alien_score: u32,

    // === Splitting ===
    /// Inclusive speed range for medium asteroids split from a large one
    pub medium_split_speed: (u32, u32),
    /// Inclusive speed range for small asteroids split from a medium one
    pub small_split_speed: (u32, u32),
    /// Chance a destroyed asteroid drops a power-up (only when `loot_drops`)
    pub loot_chance: f64,

    // === Lifetimes (ms) ===
    pub bullet_lifetime_ms: u64,
    pub alien_bullet_lifetime_ms: u64,
    pub debris_lifetime_ms: u64,
    pub power_up_lifetime_ms: u64,

    // === Ship ===
    pub starting_lives: i32,
    /// Live bullet cap (ignored while invulnerable)
    pub max_bullets: usize,
    pub invulnerability_ms: u64,
    pub heartbeat_ms: u64,

    // === Alien ship ===
    pub alien_fire_interval_ms: u64,
    pub alien_turn_interval_ms: u64,
    /// Inclusive delay range before a saucer (re)appears
    pub alien_delay_ms: (u64, u64),
    pub alien_speed: f32,

    // === Session ===
    pub initial_asteroids: u32,
    /// Pause between a ship loss / cleared field and the next stage
    pub transition_delay_ms: u64,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::enhanced()
    }
}

impl Ruleset {
    /// Asteroids, ship and saucers, no power-ups
    pub fn classic() -> Self {
        Self {
            version: RulesetVersion::Classic,

            asteroid_scores: [100, 50, 20],
            large_alien_score: 200,
            small_alien_score: 1000,

            medium_split_speed: (3, 6),
            small_split_speed: (3, 8),
            loot_chance: 0.2,

            bullet_lifetime_ms: 1000,
            alien_bullet_lifetime_ms: 2000,
            debris_lifetime_ms: 1000,
            power_up_lifetime_ms: 8000,

            starting_lives: 3,
            max_bullets: 8,
            invulnerability_ms: 3500,
            heartbeat_ms: 1000,

            alien_fire_interval_ms: 2000,
            alien_turn_interval_ms: 3000,
            alien_delay_ms: (5000, 10000),
            alien_speed: 5.0,

            initial_asteroids: 4,
            transition_delay_ms: 2500,
        }
    }

    /// Classic rules with power-up drops
    pub fn enhanced() -> Self {
        Self {
            version: RulesetVersion::Enhanced,
            ..Self::classic()
        }
    }

    /// Whether destroyed asteroids may drop power-ups
    pub fn loot_drops(&self) -> bool {
        self.version == RulesetVersion::Enhanced
    }

    /// Parse a ruleset from JSON; missing fields take enhanced defaults
    pub fn from_json(json: &str) -> SimResult<Self> {
        let rules: Ruleset = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a ruleset from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values that cannot drive a game
    pub fn validate(&self) -> SimResult<()> {
        let ranges = [
            ("medium_split_speed", self.medium_split_speed),
            ("small_split_speed", self.small_split_speed),
        ];
        for (name, (lo, hi)) in ranges {
            if lo > hi {
                return Err(SimError::InvalidRuleset(format!(
                    "{name} range is empty ({lo} > {hi})"
                )));
            }
        }
        if self.alien_delay_ms.0 > self.alien_delay_ms.1 {
            return Err(SimError::InvalidRuleset(
                "alien_delay_ms range is empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.loot_chance) {
            return Err(SimError::InvalidRuleset(format!(
                "loot_chance {} outside [0, 1]",
                self.loot_chance
            )));
        }
        if self.starting_lives <= 0 {
            return Err(SimError::InvalidRuleset(
                "starting_lives must be positive".to_string(),
            ));
        }
        let cadences = [
            ("heartbeat_ms", self.heartbeat_ms),
            ("alien_fire_interval_ms", self.alien_fire_interval_ms),
            ("alien_turn_interval_ms", self.alien_turn_interval_ms),
        ];
        for (name, ms) in cadences {
            if ms == 0 {
                return Err(SimError::InvalidRuleset(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_only_in_loot() {
        let classic = Ruleset::classic();
        let enhanced = Ruleset::enhanced();
        assert!(!classic.loot_drops());
        assert!(enhanced.loot_drops());
        assert_eq!(classic.asteroid_scores, enhanced.asteroid_scores);
        assert!(classic.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let rules = Ruleset::from_json(r#"{ "version": "Classic", "max_bullets": 4 }"#).unwrap();
        assert_eq!(rules.max_bullets, 4);
        assert!(!rules.loot_drops());
        assert_eq!(rules.invulnerability_ms, 3500);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            Ruleset::from_json(r#"{ "loot_chance": 1.5 }"#),
            Err(SimError::InvalidRuleset(_))
        ));
        assert!(matches!(
            Ruleset::from_json(r#"{ "small_split_speed": [9, 3] }"#),
            Err(SimError::InvalidRuleset(_))
        ));
        assert!(matches!(
            Ruleset::from_json("not json"),
            Err(SimError::RulesetParse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Ruleset::load("/nonexistent/ruleset.json"),
            Err(SimError::Io(_))
        ));
    }
}
