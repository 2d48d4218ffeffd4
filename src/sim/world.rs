//! The simulation world
//!
//! Owns the registry, the timer scheduler, the seeded RNG and the running
//! score. One `step` is: move every participant, detect colliding pairs on the
//! moved set, dispatch reactions both ways, apply their effects, sweep, then
//! advance the timer clock and run whatever fell due.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::behavior::{self, Context, Effects};
use super::collision::detect_collisions;
use super::participant::{Category, Contact, Participant, ParticipantId, PowerUpKind};
use super::registry::ParticipantRegistry;
use super::state::GameEvent;
use super::timer::Scheduler;
use crate::audio::SoundEffect;
use crate::error::SimResult;
use crate::tuning::Ruleset;

#[derive(Debug)]
pub struct World {
    rules: Ruleset,
    registry: ParticipantRegistry,
    timers: Scheduler,
    rng: Pcg32,
    score: u64,
    events: Vec<GameEvent>,
    sounds: Vec<SoundEffect>,
    /// An asteroid or saucer died since the last sweep
    target_destroyed: bool,
}

impl World {
    /// Fails if `rules` cannot drive a game
    pub fn new(seed: u64, rules: Ruleset) -> SimResult<Self> {
        rules.validate()?;
        Ok(Self {
            rules,
            registry: ParticipantRegistry::new(),
            timers: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            score: 0,
            events: Vec::new(),
            sounds: Vec::new(),
            target_destroyed: false,
        })
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Admit a participant and start its timers
    pub fn add_participant(&mut self, participant: Participant) -> ParticipantId {
        let timers = behavior::initial_timers(&participant, &self.rules);
        let category = participant.category();
        let id = self.registry.add(participant);
        for (payload, delay) in timers {
            self.timers.schedule(id, payload, delay);
        }
        log::trace!("added {:?} {:?}", category, id);
        id
    }

    /// Mark a participant expired. Outside a pass it is swept at once, so its
    /// timers are gone before the next advance.
    pub fn expire(&mut self, id: ParticipantId) -> bool {
        let newly = self.registry.expire(id);
        if newly && !self.registry.in_pass() {
            self.sweep();
        }
        newly
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.registry.get(id)
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.registry.get_mut(id)
    }

    /// Live participants in id order, for drawing
    pub fn iter_live(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.registry.iter_live()
    }

    pub fn count_by_category(&self, category: Category) -> usize {
        self.registry.count_by_category(category)
    }

    pub fn ship_position(&self) -> Option<Vec2> {
        self.registry.find(Category::Ship).map(|ship| ship.position)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Simulation clock (ms)
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_sounds(&mut self) -> Vec<SoundEffect> {
        std::mem::take(&mut self.sounds)
    }

    pub fn play(&mut self, effect: SoundEffect) {
        self.sounds.push(effect);
    }

    /// One fixed tick: move and collide, then run due timers
    pub fn step(&mut self, dt_ms: u64) {
        self.move_and_collide();
        self.run_timers(dt_ms);
    }

    /// Move everything, detect every overlapping pair on the moved set, then
    /// let both sides of each pair react. Reactions see snapshots taken before
    /// any of them ran; spawns are staged and join at the sweep.
    pub fn move_and_collide(&mut self) {
        self.registry.begin_pass();

        for p in self.registry.live_mut() {
            if p.is_expired() {
                continue;
            }
            behavior::prepare_move(p, &mut self.rng);
            p.move_step();
        }

        let pairs = detect_collisions(self.registry.live());
        if !pairs.is_empty() {
            let contacts: Vec<Contact> = self.registry.live().iter().map(|p| p.contact()).collect();
            let target = self.ship_position();
            let mut ctx = Context::new(&self.rules, &mut self.rng, target, self.timers.now_ms());
            let live = self.registry.live_mut();
            for pair in &pairs {
                // A side already expired by an earlier pair stays inert
                behavior::collided_with(&mut live[pair.first], &contacts[pair.second], &mut ctx);
                behavior::collided_with(&mut live[pair.second], &contacts[pair.first], &mut ctx);
            }
            let effects = ctx.effects;
            self.apply(effects);
        }

        self.registry.end_pass();
        self.sweep();
    }

    /// Advance the timer clock and run every timer that fell due
    pub fn run_timers(&mut self, elapsed_ms: u64) {
        let due = self.timers.advance(elapsed_ms);
        if due.is_empty() {
            return;
        }

        let target = self.ship_position();
        let mut ctx = Context::new(&self.rules, &mut self.rng, target, self.timers.now_ms());
        for timer in due {
            let Some(owner) = self.registry.get_mut(timer.owner) else {
                continue;
            };
            if owner.is_expired() {
                continue;
            }
            behavior::on_timer(owner, timer.payload, &mut ctx);
        }
        let effects = ctx.effects;
        self.apply(effects);
        self.sweep();
    }

    /// Fire a bullet from the ship's nose along its rotation. Refused at the
    /// bullet cap unless the ship is invulnerable.
    pub fn fire_bullet(&mut self, ship: ParticipantId) -> bool {
        let Some(p) = self.registry.get(ship) else {
            return false;
        };
        if p.is_expired() || p.category() != Category::Ship {
            return false;
        }
        if !p.is_invulnerable()
            && self.registry.count_by_category(Category::Bullet) >= self.rules.max_bullets
        {
            return false;
        }
        let bullet = Participant::bullet(p.nose(), p.rotation);
        self.add_participant(bullet);
        self.sounds.push(SoundEffect::Fire);
        true
    }

    /// Apply a power-up effect to a ship
    pub fn grant(&mut self, ship: ParticipantId, kind: PowerUpKind) {
        let now = self.timers.now_ms();
        let mut effects = Effects::default();
        let Some(p) = self.registry.get_mut(ship) else {
            log::debug!("power-up {:?} for missing ship {:?}", kind, ship);
            return;
        };
        if p.is_expired() {
            return;
        }
        behavior::grant_power_up(p, kind, &self.rules, now, &mut effects);
        self.apply(effects);
    }

    /// Remove every participant and pending timer. Score and clock are kept.
    pub fn clear(&mut self) {
        let removed = self.registry.clear();
        self.timers.clear();
        self.target_destroyed = false;
        log::debug!("cleared {} participants", removed.len());
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
    }

    fn apply(&mut self, effects: Effects) {
        let Effects {
            spawns,
            timers,
            grants,
            events,
            sounds,
        } = effects;

        for (owner, payload, delay) in timers {
            self.timers.schedule(owner, payload, delay);
        }
        for p in spawns {
            self.add_participant(p);
        }
        for event in events {
            match event {
                GameEvent::ScoreDelta(points) => self.score += u64::from(points),
                GameEvent::AsteroidDestroyed { .. } | GameEvent::AlienDestroyed => {
                    self.target_destroyed = true
                }
                _ => {}
            }
            self.events.push(event);
        }
        self.sounds.extend(sounds);
        for (ship, kind) in grants {
            self.grant(ship, kind);
        }
    }

    fn sweep(&mut self) {
        let removed = self.registry.sweep();
        self.timers.cancel_owners(&removed);

        if std::mem::take(&mut self.target_destroyed)
            && self.registry.count_by_category(Category::Asteroid) == 0
            && self.registry.count_by_category(Category::AlienShip) == 0
        {
            log::info!("field cleared");
            self.events.push(GameEvent::FieldCleared);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::participant::{AsteroidSize, Body};
    use crate::sim::timer::TimerPayload;

    fn world() -> World {
        World::new(42, Ruleset::classic()).unwrap()
    }

    fn large_asteroid(world: &mut World, at: Vec2) -> ParticipantId {
        let rock = Participant::asteroid(0, 2, at, 3.0, world.rng_mut()).unwrap();
        world.add_participant(rock)
    }

    fn count_size(world: &World, size: AsteroidSize) -> usize {
        world
            .iter_live()
            .filter(|p| matches!(p.body, Body::Asteroid { size: s, .. } if s == size))
            .count()
    }

    #[test]
    fn test_bullet_splits_large_asteroid() {
        let mut world = world();
        let at = Vec2::new(150.0, 150.0);
        let rock = large_asteroid(&mut world, at);
        let mut bullet = Participant::bullet(at, 0.0);
        bullet.velocity = Vec2::ZERO;
        let bullet = world.add_participant(bullet);

        world.move_and_collide();

        assert!(world.get(rock).is_none());
        assert!(world.get(bullet).is_none());
        assert_eq!(count_size(&world, AsteroidSize::Medium), 2);
        assert_eq!(world.count_by_category(Category::Asteroid), 2);
        assert!(world.count_by_category(Category::Debris) >= 2);
        assert_eq!(world.score(), 20);
        let events = world.drain_events();
        assert!(events.contains(&GameEvent::AsteroidDestroyed {
            size: AsteroidSize::Large
        }));
        assert!(!events.contains(&GameEvent::FieldCleared));
    }

    #[test]
    fn test_spawns_join_only_after_sweep() {
        let mut world = world();
        let at = Vec2::new(150.0, 150.0);
        large_asteroid(&mut world, at);
        let mut bullet = Participant::bullet(at, 0.0);
        bullet.velocity = Vec2::ZERO;
        world.add_participant(bullet);

        world.registry.begin_pass();
        let staged = world.add_participant(Participant::debris(at, 0.0));
        assert!(world.iter_live().all(|p| p.id() != staged));
        world.registry.end_pass();
        world.sweep();
        assert!(world.get(staged).is_some());
    }

    #[test]
    fn test_field_cleared_after_last_asteroid() {
        let mut world = world();
        let corners = [(150.0, 150.0), (600.0, 150.0), (150.0, 600.0), (600.0, 600.0)];
        let ids: Vec<_> = corners
            .iter()
            .map(|&(x, y)| {
                let rock = Participant::asteroid(1, 0, Vec2::new(x, y), 0.0, world.rng_mut()).unwrap();
                world.add_participant(rock)
            })
            .collect();
        assert_eq!(world.count_by_category(Category::Asteroid), 4);

        for id in ids {
            let at = world.get(id).unwrap().position;
            let mut bullet = Participant::bullet(at, 0.0);
            bullet.velocity = Vec2::ZERO;
            world.add_participant(bullet);
            world.move_and_collide();
        }

        assert_eq!(world.count_by_category(Category::Asteroid), 0);
        assert_eq!(world.score(), 400);
        let events = world.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == GameEvent::FieldCleared).count(),
            1
        );
        assert_eq!(events.last(), Some(&GameEvent::FieldCleared));
    }

    #[test]
    fn test_four_large_asteroids_cleared_in_sequence() {
        let mut world = world();
        for (x, y) in [(150.0, 150.0), (600.0, 150.0), (150.0, 600.0), (600.0, 600.0)] {
            large_asteroid(&mut world, Vec2::new(x, y));
        }
        assert_eq!(world.count_by_category(Category::AlienShip), 0);
        assert_eq!(world.count_by_category(Category::Asteroid), 4);

        // Shoot whatever asteroid is left, splits included, until none remain
        let mut shots = 0;
        while world.count_by_category(Category::Asteroid) > 0 {
            assert!(shots < 64, "field never cleared");
            let rocks: Vec<ParticipantId> = world
                .iter_live()
                .filter(|p| p.category() == Category::Asteroid)
                .map(|p| p.id())
                .collect();
            for id in &rocks {
                world.get_mut(*id).unwrap().velocity = Vec2::ZERO;
            }
            let at = world.get(rocks[0]).unwrap().position;
            let mut bullet = Participant::bullet(at, 0.0);
            bullet.velocity = Vec2::ZERO;
            world.add_participant(bullet);
            world.move_and_collide();
            shots += 1;
        }

        assert_eq!(world.count_by_category(Category::Asteroid), 0);
        // 4 large, 8 medium, 16 small
        assert_eq!(world.score(), 4 * 20 + 8 * 50 + 16 * 100);
        let events = world.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == GameEvent::FieldCleared).count(),
            1
        );
        assert_eq!(events.last(), Some(&GameEvent::FieldCleared));
    }

    #[test]
    fn test_invalid_ruleset_is_rejected() {
        let mut rules = Ruleset::classic();
        rules.alien_delay_ms = (10000, 5000);
        assert!(matches!(
            World::new(1, rules),
            Err(crate::error::SimError::InvalidRuleset(_))
        ));

        let mut rules = Ruleset::enhanced();
        rules.loot_chance = 1.5;
        assert!(World::new(1, rules).is_err());
    }

    #[test]
    fn test_score_per_size() {
        for (size, points) in [(1u8, 50u64), (0, 100)] {
            let mut world = world();
            let at = Vec2::new(300.0, 300.0);
            let rock = Participant::asteroid(2, size, at, 0.0, world.rng_mut()).unwrap();
            world.add_participant(rock);
            let mut bullet = Participant::bullet(at, 0.0);
            bullet.velocity = Vec2::ZERO;
            world.add_participant(bullet);

            world.move_and_collide();
            assert_eq!(world.score(), points);
            let successors = world.count_by_category(Category::Asteroid);
            assert_eq!(successors, if size == 0 { 0 } else { 2 });
        }
    }

    #[test]
    fn test_two_bullets_one_asteroid_scores_once() {
        let mut world = world();
        let at = Vec2::new(300.0, 300.0);
        let rock = Participant::asteroid(2, 0, at, 0.0, world.rng_mut()).unwrap();
        world.add_participant(rock);
        let mut ids = Vec::new();
        for _ in 0..2 {
            let mut bullet = Participant::bullet(at, 0.0);
            bullet.velocity = Vec2::ZERO;
            ids.push(world.add_participant(bullet));
        }

        world.move_and_collide();
        assert_eq!(world.score(), 100);
        assert!(ids.iter().all(|id| world.get(*id).is_none()));
    }

    #[test]
    fn test_invulnerable_ship_survives_asteroid() {
        let mut world = world();
        let at = Vec2::new(375.0, 375.0);
        let ship = world.add_participant(Participant::ship(at, 0.0));
        world.grant(ship, PowerUpKind::Invulnerability);
        let rock = Participant::asteroid(0, 2, at, 0.0, world.rng_mut()).unwrap();
        let rock = world.add_participant(rock);

        world.move_and_collide();

        assert!(world.get(ship).is_some());
        assert!(world.get(rock).is_none());
        let events = world.drain_events();
        assert!(!events.contains(&GameEvent::ShipDestroyed));

        // Window closes after the configured time
        world.clear();
        let ship = world.add_participant(Participant::ship(at, 0.0));
        world.grant(ship, PowerUpKind::Invulnerability);
        world.run_timers(3500);
        assert!(!world.get(ship).unwrap().is_invulnerable());
    }

    #[test]
    fn test_vulnerable_ship_is_destroyed() {
        let mut world = world();
        let at = Vec2::new(375.0, 375.0);
        let ship = world.add_participant(Participant::ship(at, 0.0));
        let rock = Participant::asteroid(0, 2, at, 0.0, world.rng_mut()).unwrap();
        world.add_participant(rock);

        world.move_and_collide();
        assert!(world.get(ship).is_none());
        assert!(world.drain_events().contains(&GameEvent::ShipDestroyed));
        assert_eq!(world.pending_timers_for(ship), 0);
    }

    #[test]
    fn test_expired_alien_never_fires() {
        let mut world = world();
        let alien = Participant::alien_ship(Vec2::new(10.0, 10.0), 0.0, 2, 5.0).unwrap();
        let alien = world.add_participant(alien);
        assert_eq!(world.pending_timers(), 2);

        world.run_timers(1000);
        assert!(world.expire(alien));
        assert_eq!(world.pending_timers(), 0);
        world.run_timers(5000);
        assert_eq!(world.count_by_category(Category::AlienBullet), 0);
    }

    #[test]
    fn test_alien_fires_on_cadence() {
        let mut world = world();
        let alien = Participant::alien_ship(Vec2::new(10.0, 10.0), 0.0, 2, 5.0).unwrap();
        world.add_participant(alien);

        world.run_timers(1999);
        assert_eq!(world.count_by_category(Category::AlienBullet), 0);
        world.run_timers(1);
        assert_eq!(world.count_by_category(Category::AlienBullet), 1);
        world.run_timers(2000);
        assert_eq!(world.count_by_category(Category::AlienBullet), 1, "first shot expired");
    }

    #[test]
    fn test_lifetimes_expire_projectiles() {
        let mut world = world();
        world.add_participant(Participant::bullet(Vec2::new(10.0, 10.0), 0.0));
        world.add_participant(Participant::debris(Vec2::new(500.0, 500.0), 0.0));
        world.add_participant(Participant::star(Vec2::new(300.0, 10.0)));
        world.run_timers(999);
        assert_eq!(world.iter_live().count(), 3);
        world.run_timers(1);
        assert_eq!(world.count_by_category(Category::Bullet), 0);
        assert_eq!(world.count_by_category(Category::Debris), 0);
        assert_eq!(world.count_by_category(Category::Star), 1);
    }

    #[test]
    fn test_bullet_cap() {
        let mut world = world();
        let ship = world.add_participant(Participant::ship(Vec2::new(375.0, 375.0), 0.0));
        for _ in 0..8 {
            assert!(world.fire_bullet(ship));
        }
        assert!(!world.fire_bullet(ship));
        assert_eq!(world.count_by_category(Category::Bullet), 8);

        world.grant(ship, PowerUpKind::Invulnerability);
        assert!(world.fire_bullet(ship));
    }

    #[test]
    fn test_heartbeat_reschedules() {
        let mut world = world();
        world.add_participant(Participant::ship(Vec2::new(375.0, 375.0), 0.0));
        world.run_timers(1000);
        world.run_timers(1000);
        let beats = world
            .drain_sounds()
            .into_iter()
            .filter(|s| *s == SoundEffect::Beat)
            .count();
        assert_eq!(beats, 2);
    }

    #[test]
    fn test_ship_collects_power_up() {
        let mut world = world();
        let at = Vec2::new(200.0, 200.0);
        let ship = world.add_participant(Participant::ship(at, 0.0));
        let mut power_up = Participant::power_up(2, at, world.rng_mut()).unwrap();
        power_up.velocity = Vec2::ZERO;
        let power_up = world.add_participant(power_up);

        world.move_and_collide();
        assert!(world.get(power_up).is_none());
        assert!(world.get(ship).is_some());
        let events = world.drain_events();
        assert!(events.contains(&GameEvent::LivesDelta(1)));
        assert!(events.contains(&GameEvent::PowerUpCollected {
            kind: PowerUpKind::ExtraLife
        }));
    }

    impl World {
        fn pending_timers_for(&self, id: ParticipantId) -> usize {
            self.timers.pending_for(id)
        }
    }

    #[test]
    fn test_timer_payloads_start_with_participant() {
        let mut world = world();
        let ship = world.add_participant(Participant::ship(Vec2::ZERO, 0.0));
        assert_eq!(world.pending_timers_for(ship), 1);
        let due = world.timers.advance(1000);
        assert_eq!(due[0].payload, TimerPayload::Heartbeat);
    }
}
