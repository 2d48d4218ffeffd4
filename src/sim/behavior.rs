//! Entity behavior rules
//!
//! Reactions to collisions and timers for every participant kind. Rules never
//! touch the registry directly: they mutate the participant they belong to and
//! record everything else (spawns, new timers, power-up grants, events, sound
//! cues) in `Effects`, which the world applies once the pass is over.

use std::f32::consts::{FRAC_PI_4, PI, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::participant::{
    ASTEROID_VARIETIES, AlienSize, AsteroidSize, Body, Capabilities, Contact, Participant,
    ParticipantId, PowerUpKind,
};
use super::state::GameEvent;
use super::timer::TimerPayload;
use crate::audio::SoundEffect;
use crate::normalize_angle;
use crate::tuning::Ruleset;

/// Aim error for the small saucer (radians, either side)
const ALIEN_AIM_JITTER: f32 = 0.05;

/// Side effects collected while reactions run
#[derive(Debug, Default)]
pub struct Effects {
    pub spawns: Vec<Participant>,
    pub timers: Vec<(ParticipantId, TimerPayload, u64)>,
    pub grants: Vec<(ParticipantId, PowerUpKind)>,
    pub events: Vec<GameEvent>,
    pub sounds: Vec<SoundEffect>,
}

impl Effects {
    pub fn award(&mut self, points: u32) {
        if points > 0 {
            self.events.push(GameEvent::ScoreDelta(points));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
            && self.timers.is_empty()
            && self.grants.is_empty()
            && self.events.is_empty()
            && self.sounds.is_empty()
    }
}

/// Everything a rule may read, plus the effects it writes
pub struct Context<'a> {
    pub rules: &'a Ruleset,
    pub rng: &'a mut Pcg32,
    /// Ship position, for aimed fire
    pub target: Option<Vec2>,
    pub now_ms: u64,
    pub effects: Effects,
}

impl<'a> Context<'a> {
    pub fn new(rules: &'a Ruleset, rng: &'a mut Pcg32, target: Option<Vec2>, now_ms: u64) -> Self {
        Self {
            rules,
            rng,
            target,
            now_ms,
            effects: Effects::default(),
        }
    }

    fn random_heading(&mut self) -> f32 {
        self.rng.random_range(0.0..TAU)
    }

    fn spawn_debris(&mut self, at: Vec2, count: usize) {
        for _ in 0..count {
            let heading = self.random_heading();
            self.effects.spawns.push(Participant::debris(at, heading));
        }
    }
}

/// Timers a participant starts with
pub fn initial_timers(p: &Participant, rules: &Ruleset) -> Vec<(TimerPayload, u64)> {
    match p.body {
        Body::Ship(_) => vec![(TimerPayload::Heartbeat, rules.heartbeat_ms)],
        Body::AlienShip(_) => vec![
            (TimerPayload::Fire, rules.alien_fire_interval_ms),
            (TimerPayload::ChangeDirection, rules.alien_turn_interval_ms),
        ],
        Body::Bullet => vec![(TimerPayload::Expire, rules.bullet_lifetime_ms)],
        Body::AlienBullet => vec![(TimerPayload::Expire, rules.alien_bullet_lifetime_ms)],
        Body::Debris => vec![(TimerPayload::Expire, rules.debris_lifetime_ms)],
        Body::PowerUp(_) => vec![(TimerPayload::Expire, rules.power_up_lifetime_ms)],
        Body::Asteroid { .. } | Body::Star => Vec::new(),
    }
}

/// Collision reaction hook
///
/// `other` is a snapshot taken before any reaction of this tick ran.
pub fn collided_with(this: &mut Participant, other: &Contact, ctx: &mut Context) {
    if this.is_expired() {
        return;
    }

    if other.capabilities.intersects(this.vulnerabilities()) {
        destroyed(this, ctx);
    }

    // Projectiles stop at the first thing they can destroy
    if this.is_projectile() && this.capabilities().intersects(other.vulnerabilities) {
        this.expire();
    }

    if let Body::PowerUp(kind) = this.body {
        if other.capabilities.contains(Capabilities::COLLECTOR) && this.expire() {
            ctx.effects.grants.push((other.id, kind));
        }
    }
}

enum Wreck {
    Ship,
    Asteroid(AsteroidSize),
    Alien(AlienSize),
}

fn destroyed(this: &mut Participant, ctx: &mut Context) {
    let wreck = match &this.body {
        Body::Ship(state) if state.invulnerable => return,
        Body::Ship(_) => Wreck::Ship,
        Body::Asteroid { size, .. } => Wreck::Asteroid(*size),
        Body::AlienShip(state) => Wreck::Alien(state.size),
        _ => return,
    };
    if !this.expire() {
        return;
    }

    let at = this.position;
    match wreck {
        Wreck::Ship => {
            log::debug!("ship {:?} destroyed", this.id());
            ctx.effects.sounds.push(SoundEffect::BangShip);
            ctx.effects.events.push(GameEvent::ShipDestroyed);
        }
        Wreck::Asteroid(size) => split_asteroid(size, at, ctx),
        Wreck::Alien(size) => {
            log::debug!("alien {:?} destroyed", this.id());
            ctx.spawn_debris(at, 2);
            let points = match size {
                AlienSize::Large => ctx.rules.large_alien_score,
                AlienSize::Small => ctx.rules.small_alien_score,
            };
            ctx.effects.award(points);
            ctx.effects.sounds.push(SoundEffect::BangAlien);
            ctx.effects.events.push(GameEvent::AlienDestroyed);
        }
    }
}

/// Successors, debris, score and loot for a destroyed asteroid
fn split_asteroid(size: AsteroidSize, at: Vec2, ctx: &mut Context) {
    if let Some(next) = size.successor() {
        let (lo, hi) = match next {
            AsteroidSize::Medium => ctx.rules.medium_split_speed,
            _ => ctx.rules.small_split_speed,
        };
        for _ in 0..2 {
            let speed = ctx.rng.random_range(lo..=hi) as f32;
            let variety = ctx.rng.random_range(0..ASTEROID_VARIETIES);
            match Participant::asteroid(variety, next.index() as u8, at, speed, &mut *ctx.rng) {
                Ok(asteroid) => ctx.effects.spawns.push(asteroid),
                Err(err) => log::error!("asteroid split skipped: {err}"),
            }
        }
        ctx.spawn_debris(at, 2);
    }
    ctx.spawn_debris(at, 2);

    ctx.effects.award(ctx.rules.asteroid_scores[size.index()]);
    ctx.effects.sounds.push(match size {
        AsteroidSize::Large => SoundEffect::BangLarge,
        AsteroidSize::Medium => SoundEffect::BangMedium,
        AsteroidSize::Small => SoundEffect::BangSmall,
    });
    ctx.effects.events.push(GameEvent::AsteroidDestroyed { size });

    if ctx.rules.loot_drops() && ctx.rng.random_bool(ctx.rules.loot_chance) {
        let kind = PowerUpKind::ALL[ctx.rng.random_range(0..PowerUpKind::ALL.len())];
        log::debug!("asteroid dropped {:?}", kind);
        let power_up = Participant::power_up_of(kind, at, &mut *ctx.rng);
        ctx.effects.spawns.push(power_up);
    }
}

/// Timer callback; only called for live owners
pub fn on_timer(this: &mut Participant, payload: TimerPayload, ctx: &mut Context) {
    let id = this.id();
    match payload {
        TimerPayload::Expire => {
            this.expire();
        }
        TimerPayload::Fire => {
            let Body::AlienShip(state) = &this.body else { return };
            let heading = match (state.size, ctx.target) {
                (AlienSize::Small, Some(target)) => {
                    let to_ship = target - this.position;
                    to_ship.y.atan2(to_ship.x)
                        + ctx.rng.random_range(-ALIEN_AIM_JITTER..=ALIEN_AIM_JITTER)
                }
                _ => ctx.random_heading(),
            };
            ctx.effects
                .spawns
                .push(Participant::alien_bullet(this.position, heading));
            ctx.effects.sounds.push(SoundEffect::Fire);
            ctx.effects
                .timers
                .push((id, TimerPayload::Fire, ctx.rules.alien_fire_interval_ms));
        }
        TimerPayload::ChangeDirection => {
            let Body::AlienShip(state) = &mut this.body else { return };
            state.turn_pending = true;
            ctx.effects.timers.push((
                id,
                TimerPayload::ChangeDirection,
                ctx.rules.alien_turn_interval_ms,
            ));
        }
        TimerPayload::Heartbeat => {
            if !matches!(this.body, Body::Ship(_)) {
                return;
            }
            ctx.effects.sounds.push(SoundEffect::Beat);
            ctx.effects
                .timers
                .push((id, TimerPayload::Heartbeat, ctx.rules.heartbeat_ms));
        }
        TimerPayload::EndInvulnerability => {
            let now = ctx.now_ms;
            if let Some(state) = this.ship_state_mut() {
                // A later grant extends the window
                if now >= state.invulnerable_until_ms {
                    state.invulnerable = false;
                    log::debug!("ship {:?} invulnerability ended", id);
                }
            }
        }
    }
}

/// Apply a pending saucer direction change before it moves.
///
/// A diagonal heading levels out; a level heading tilts 45° up or down,
/// keeping its horizontal sense.
pub fn prepare_move<R: Rng>(this: &mut Participant, rng: &mut R) {
    let pending = match &mut this.body {
        Body::AlienShip(state) => std::mem::take(&mut state.turn_pending),
        _ => false,
    };
    if !pending {
        return;
    }

    let heading = this.direction();
    let rightward = heading.cos() >= 0.0;
    let level = if rightward { 0.0 } else { PI };
    let diagonal = normalize_angle(heading - level).abs() > 0.01;
    let next = if diagonal {
        level
    } else {
        let tilt = if rng.random_bool(0.5) { FRAC_PI_4 } else { -FRAC_PI_4 };
        if rightward { tilt } else { PI - tilt }
    };
    this.set_direction(next);
}

/// Give a collected power-up's effect to the ship
pub fn grant_power_up(
    ship: &mut Participant,
    kind: PowerUpKind,
    rules: &Ruleset,
    now_ms: u64,
    effects: &mut Effects,
) {
    let id = ship.id();
    let Some(state) = ship.ship_state_mut() else { return };
    match kind {
        PowerUpKind::Invulnerability => {
            state.invulnerable = true;
            state.invulnerable_until_ms = now_ms + rules.invulnerability_ms;
            effects
                .timers
                .push((id, TimerPayload::EndInvulnerability, rules.invulnerability_ms));
            effects.sounds.push(SoundEffect::Shield);
        }
        PowerUpKind::ExtraLife => {
            effects.events.push(GameEvent::LivesDelta(1));
            effects.sounds.push(SoundEffect::ExtraLife);
        }
    }
    effects.events.push(GameEvent::PowerUpCollected { kind });
}
