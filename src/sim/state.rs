//! Game session state
//!
//! Everything above a single world tick: phase, level, lives, the player's
//! ship handle, and the delayed transitions that follow a lost ship or a
//! cleared field.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::participant::{AsteroidSize, Category, Participant, ParticipantId, PowerUpKind};
use super::world::World;
use crate::consts::*;
use crate::error::SimResult;
use crate::tuning::Ruleset;

/// Notifications emitted by the core for the session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ShipDestroyed,
    AsteroidDestroyed { size: AsteroidSize },
    /// No asteroids and no saucer remain
    FieldCleared,
    AlienDestroyed,
    ScoreDelta(u32),
    LivesDelta(i32),
    PowerUpCollected { kind: PowerUpKind },
}

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Attract screen, asteroids drifting, no ship
    Splash,
    Playing,
    GameOver,
}

/// Quadrant points large asteroids start from
const ASTEROID_CORNERS: [Vec2; 4] = [
    Vec2::new(150.0, 150.0),
    Vec2::new(600.0, 150.0),
    Vec2::new(150.0, 600.0),
    Vec2::new(600.0, 600.0),
];

/// Complete session state
#[derive(Debug)]
pub struct GameState {
    pub world: World,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    pub lives: i32,
    ship: Option<ParticipantId>,
    /// Clock time of the pending transition, if any
    transition_at: Option<u64>,
    /// Clock time the next saucer enters, if scheduled
    alien_at: Option<u64>,
}

impl GameState {
    /// A session on the splash screen
    pub fn new(seed: u64, rules: Ruleset) -> SimResult<Self> {
        let mut state = Self {
            world: World::new(seed, rules)?,
            phase: GamePhase::Splash,
            level: 1,
            lives: 0,
            ship: None,
            transition_at: None,
            alien_at: None,
        };
        state.splash();
        Ok(state)
    }

    pub fn splash(&mut self) {
        self.clear();
        self.phase = GamePhase::Splash;
        self.place_asteroids(self.world.rules().initial_asteroids);
        self.place_stars();
    }

    /// Start a new game at level 1
    pub fn start_game(&mut self) {
        self.clear();
        self.world.reset_score();
        self.place_asteroids(self.world.rules().initial_asteroids);
        self.place_stars();
        self.place_ship();
        self.lives = self.world.rules().starting_lives;
        self.level = 1;
        self.phase = GamePhase::Playing;
        log::info!("game started");
    }

    pub fn ship(&self) -> Option<ParticipantId> {
        self.ship
    }

    pub fn ship_mut(&mut self) -> Option<&mut Participant> {
        let id = self.ship?;
        self.world.get_mut(id).filter(|p| !p.is_expired())
    }

    pub fn score(&self) -> u64 {
        self.world.score()
    }

    pub fn transition_pending(&self) -> bool {
        self.transition_at.is_some()
    }

    pub fn alien_scheduled(&self) -> Option<u64> {
        self.alien_at
    }

    fn clear(&mut self) {
        self.world.clear();
        self.ship = None;
        self.transition_at = None;
        self.alien_at = None;
    }

    /// Replace the ship with a fresh one at the centre, facing up
    fn place_ship(&mut self) {
        if let Some(old) = self.ship.take() {
            self.world.expire(old);
        }
        let centre = Vec2::splat(FIELD_SIZE / 2.0);
        let id = self
            .world
            .add_participant(Participant::ship(centre, -std::f32::consts::FRAC_PI_2));
        self.ship = Some(id);
    }

    /// Large asteroids cycling through the four quadrant points
    fn place_asteroids(&mut self, count: u32) {
        for n in (1..=count).rev() {
            let at = ASTEROID_CORNERS[(n % 4) as usize];
            self.add_large_asteroid(at);
        }
    }

    fn add_large_asteroid(&mut self, at: Vec2) {
        let rng = self.world.rng_mut();
        let variety = rng.random_range(0..3);
        match Participant::asteroid(variety, 2, at, ASTEROID_START_SPEED, rng) {
            Ok(asteroid) => {
                self.world.add_participant(asteroid);
            }
            Err(err) => log::error!("asteroid placement skipped: {err}"),
        }
    }

    fn place_stars(&mut self) {
        let rng = self.world.rng_mut();
        let count = rng.random_range(5..15);
        let stars: Vec<Participant> = (0..count)
            .map(|_| {
                let at = Vec2::new(
                    rng.random_range(0.0..FIELD_SIZE),
                    rng.random_range(0.0..FIELD_SIZE),
                );
                Participant::star(at)
            })
            .collect();
        for star in stars {
            self.world.add_participant(star);
        }
    }

    fn schedule_transition(&mut self) {
        let at = self.world.now_ms() + self.world.rules().transition_delay_ms;
        self.transition_at = Some(at);
    }

    /// Arm the next saucer appearance (level 2 onwards)
    fn schedule_alien(&mut self) {
        if self.level < 2 || self.alien_at.is_some() {
            return;
        }
        let (lo, hi) = self.world.rules().alien_delay_ms;
        let delay = self.world.rng_mut().random_range(lo..=hi);
        self.alien_at = Some(self.world.now_ms() + delay);
        log::debug!("alien due in {delay} ms");
    }

    /// Saucer enters from a random side edge, heading across the field
    fn spawn_alien(&mut self) {
        let speed = self.world.rules().alien_speed;
        let rng = self.world.rng_mut();
        let y = rng.random_range(0.0..FIELD_SIZE);
        let (x, heading) = if rng.random_bool(0.5) {
            (0.0, 0.0)
        } else {
            (FIELD_SIZE - 1.0, std::f32::consts::PI)
        };
        match Participant::alien_ship(Vec2::new(x, y), heading, self.level, speed) {
            Ok(alien) => {
                self.world.add_participant(alien);
                log::info!("alien saucer entered at level {}", self.level);
            }
            Err(err) => log::error!("alien spawn skipped: {err}"),
        }
    }

    /// React to the notifications of one tick
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        if self.phase != GamePhase::Playing {
            return;
        }
        for event in events {
            match *event {
                GameEvent::ShipDestroyed => {
                    self.ship = None;
                    self.lives -= 1;
                    log::info!("ship destroyed, {} lives left", self.lives);
                    self.schedule_transition();
                }
                GameEvent::FieldCleared => {
                    log::info!("level {} cleared", self.level);
                    self.schedule_transition();
                }
                GameEvent::AlienDestroyed => self.schedule_alien(),
                GameEvent::LivesDelta(delta) => self.lives += delta,
                GameEvent::AsteroidDestroyed { .. }
                | GameEvent::ScoreDelta(_)
                | GameEvent::PowerUpCollected { .. } => {}
            }
        }
    }

    /// Run due transitions and saucer appearances
    pub fn update(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let now = self.world.now_ms();

        if self.transition_at.is_some_and(|at| at <= now) {
            self.transition_at = None;
            self.perform_transition();
        }

        if self.phase == GamePhase::Playing
            && self.alien_at.is_some_and(|at| at <= now)
            && self.world.count_by_category(Category::AlienShip) == 0
        {
            self.alien_at = None;
            self.spawn_alien();
        }
    }

    fn perform_transition(&mut self) {
        if self.lives <= 0 {
            self.phase = GamePhase::GameOver;
            self.alien_at = None;
            log::info!("game over, final score {}", self.score());
            return;
        }
        if self.ship.is_none() {
            self.place_ship();
        }
        if self.world.count_by_category(Category::Asteroid) == 0
            && self.world.count_by_category(Category::AlienShip) == 0
        {
            self.place_asteroids(self.level + 4);
            self.level += 1;
            log::info!("level {}", self.level);
            self.schedule_alien();
        }
    }

    /// Debug command: timed invulnerability for the current ship
    pub fn debug_invulnerability(&mut self) -> bool {
        let Some(ship) = self.ship else { return false };
        self.world.grant(ship, PowerUpKind::Invulnerability);
        true
    }

    /// Debug command: one more large asteroid
    pub fn debug_add_asteroid(&mut self) -> bool {
        if self.ship.is_none() {
            return false;
        }
        self.add_large_asteroid(ASTEROID_CORNERS[0]);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> GameState {
        let mut state = GameState::new(7, Ruleset::classic()).unwrap();
        state.start_game();
        state
    }

    #[test]
    fn test_splash_layout() {
        let state = GameState::new(1, Ruleset::classic()).unwrap();
        assert_eq!(state.phase, GamePhase::Splash);
        assert_eq!(state.world.count_by_category(Category::Asteroid), 4);
        let stars = state.world.count_by_category(Category::Star);
        assert!((5..15).contains(&stars));
        assert!(state.ship().is_none());
    }

    #[test]
    fn test_session_rejects_invalid_ruleset() {
        let mut rules = Ruleset::classic();
        rules.starting_lives = 0;
        assert!(GameState::new(1, rules).is_err());
    }

    #[test]
    fn test_start_game() {
        let state = playing();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.lives, 3);
        assert_eq!(state.level, 1);
        let ship = state.world.get(state.ship().unwrap()).unwrap();
        assert_eq!(ship.position, Vec2::new(375.0, 375.0));
        assert_eq!(state.world.count_by_category(Category::Asteroid), 4);
    }

    #[test]
    fn test_ship_loss_then_respawn() {
        let mut state = playing();
        let old = state.ship().unwrap();
        state.world.expire(old);
        state.handle_events(&[GameEvent::ShipDestroyed]);
        assert_eq!(state.lives, 2);
        assert!(state.ship().is_none());
        assert!(state.transition_pending());

        state.world.run_timers(2499);
        state.update();
        assert!(state.ship().is_none());
        state.world.run_timers(1);
        state.update();
        assert!(state.ship().is_some());
        assert_ne!(state.ship(), Some(old));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut state = playing();
        state.lives = 1;
        state.handle_events(&[GameEvent::ShipDestroyed]);
        state.world.run_timers(2500);
        state.update();
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_cleared_field_advances_level() {
        let mut state = playing();
        let rocks: Vec<_> = state
            .world
            .iter_live()
            .filter(|p| p.category() == Category::Asteroid)
            .map(|p| p.id())
            .collect();
        for id in rocks {
            state.world.expire(id);
        }
        state.handle_events(&[GameEvent::FieldCleared]);
        state.world.run_timers(2500);
        state.update();

        assert_eq!(state.level, 2);
        assert_eq!(state.world.count_by_category(Category::Asteroid), 5);
        assert!(state.alien_scheduled().is_some());
    }

    #[test]
    fn test_alien_enters_after_delay() {
        let mut state = playing();
        state.level = 2;
        state.handle_events(&[GameEvent::AlienDestroyed]);
        let due = state.alien_scheduled().unwrap();
        assert!((5000..=10000).contains(&due));

        state.world.run_timers(due);
        state.update();
        assert_eq!(state.world.count_by_category(Category::AlienShip), 1);
        assert!(state.alien_scheduled().is_none());
    }

    #[test]
    fn test_no_alien_on_level_one() {
        let mut state = playing();
        state.handle_events(&[GameEvent::AlienDestroyed]);
        assert!(state.alien_scheduled().is_none());
    }

    #[test]
    fn test_extra_life_event() {
        let mut state = playing();
        state.handle_events(&[GameEvent::LivesDelta(1)]);
        assert_eq!(state.lives, 4);
    }

    #[test]
    fn test_debug_commands_need_a_ship() {
        let mut state = GameState::new(3, Ruleset::classic()).unwrap();
        assert!(!state.debug_invulnerability());
        assert!(!state.debug_add_asteroid());

        state.start_game();
        assert!(state.debug_invulnerability());
        assert!(state.ship_mut().unwrap().is_invulnerable());
        assert!(state.debug_add_asteroid());
        assert_eq!(state.world.count_by_category(Category::Asteroid), 5);
    }
}
