//! Participants: everything that moves on the field
//!
//! A participant is a position, velocity and rotation plus a local outline and
//! a `Body` describing what kind of thing it is. Collision reactions never ask
//! "is this a ship?"; they compare the other participant's `Capabilities`
//! against their own `vulnerabilities()`.

use std::ops::{BitAnd, BitOr};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Outline, WorldOutline};
use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian, wrap_coordinate};

/// Registry-assigned identifier, unique for the lifetime of a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    /// Placeholder carried until the registry admits the participant
    pub const UNASSIGNED: ParticipantId = ParticipantId(0);
}

/// Capability tags used by collision reactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const SHIP_DESTROYER: Capabilities = Capabilities(1 << 0);
    pub const ASTEROID_DESTROYER: Capabilities = Capabilities(1 << 1);
    pub const ALIEN_DESTROYER: Capabilities = Capabilities(1 << 2);
    /// Picks up power-ups
    pub const COLLECTOR: Capabilities = Capabilities(1 << 3);

    #[inline]
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Capabilities) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;
    fn bitor(self, rhs: Self) -> Self {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitAnd for Capabilities {
    type Output = Capabilities;
    fn bitand(self, rhs: Self) -> Self {
        Capabilities(self.0 & rhs.0)
    }
}

/// Participant categories for aggregate queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Ship,
    Asteroid,
    AlienShip,
    Bullet,
    AlienBullet,
    Debris,
    Star,
    PowerUp,
}

/// Asteroid sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AsteroidSize {
    Small,
    Medium,
    Large,
}

impl AsteroidSize {
    pub fn index(self) -> usize {
        match self {
            AsteroidSize::Small => 0,
            AsteroidSize::Medium => 1,
            AsteroidSize::Large => 2,
        }
    }

    /// The size an asteroid splits into, if any
    pub fn successor(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    pub fn scale(self) -> f32 {
        ASTEROID_SCALE[self.index()]
    }
}

impl TryFrom<u8> for AsteroidSize {
    type Error = SimError;

    fn try_from(value: u8) -> SimResult<Self> {
        match value {
            0 => Ok(AsteroidSize::Small),
            1 => Ok(AsteroidSize::Medium),
            2 => Ok(AsteroidSize::Large),
            other => Err(SimError::InvalidAsteroidSize(other)),
        }
    }
}

/// Power-up effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Timed invulnerability for the ship
    Invulnerability,
    /// One extra life
    ExtraLife,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 2] = [PowerUpKind::Invulnerability, PowerUpKind::ExtraLife];
}

impl TryFrom<u8> for PowerUpKind {
    type Error = SimError;

    fn try_from(value: u8) -> SimResult<Self> {
        match value {
            1 => Ok(PowerUpKind::Invulnerability),
            2 => Ok(PowerUpKind::ExtraLife),
            other => Err(SimError::InvalidPowerUpVariety(other)),
        }
    }
}

/// Saucer sizes; the small one aims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlienSize {
    Large,
    Small,
}

impl AlienSize {
    /// Level 2 brings the large saucer, later levels the small one
    pub fn for_level(level: u32) -> SimResult<Self> {
        match level {
            0 | 1 => Err(SimError::InvalidAlienLevel(level)),
            2 => Ok(AlienSize::Large),
            _ => Ok(AlienSize::Small),
        }
    }
}

/// Ship state
#[derive(Debug, Clone)]
pub struct ShipState {
    /// Thrusting this tick (selects the flame outline)
    pub thrusting: bool,
    pub invulnerable: bool,
    /// Simulation time at which the current invulnerability window closes
    pub invulnerable_until_ms: u64,
    thrust_outline: Outline,
}

/// Alien saucer state
#[derive(Debug, Clone)]
pub struct AlienState {
    pub size: AlienSize,
    /// A direction change is applied at the next move
    pub turn_pending: bool,
}

/// What a participant is, with per-kind state
#[derive(Debug, Clone)]
pub enum Body {
    Ship(ShipState),
    Asteroid { size: AsteroidSize, variety: u8 },
    AlienShip(AlienState),
    Bullet,
    AlienBullet,
    Debris,
    Star,
    PowerUp(PowerUpKind),
}

/// Snapshot of a participant handed to the other side of a collision
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub id: ParticipantId,
    pub category: Category,
    pub capabilities: Capabilities,
    pub vulnerabilities: Capabilities,
    pub position: Vec2,
    pub invulnerable: bool,
}

/// A movable entity
#[derive(Debug, Clone)]
pub struct Participant {
    pub(crate) id: ParticipantId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing angle, independent of the direction of travel
    pub rotation: f32,
    /// Velocity multiplier applied before each move (1.0 = none)
    friction: f32,
    outline: Outline,
    expired: bool,
    pub body: Body,
}

const SHIP_OUTLINE: [(f32, f32); 5] = [
    (21.0, 0.0),
    (-21.0, 12.0),
    (-14.0, 10.0),
    (-14.0, -10.0),
    (-21.0, -12.0),
];

const SHIP_THRUST_OUTLINE: [(f32, f32); 8] = [
    (21.0, 0.0),
    (-21.0, 12.0),
    (-14.0, 10.0),
    (-14.0, 5.0),
    (-25.0, 0.0),
    (-14.0, -5.0),
    (-14.0, -10.0),
    (-21.0, -12.0),
];

/// Ship nose in local coordinates (bullets leave from here)
pub const SHIP_NOSE: Vec2 = Vec2::new(20.0, 0.0);

const ALIEN_OUTLINE: [(f32, f32); 8] = [
    (20.0, 0.0),
    (9.0, 9.0),
    (-9.0, 9.0),
    (-20.0, 0.0),
    (-9.0, -9.0),
    (-5.0, -17.0),
    (5.0, -17.0),
    (9.0, -9.0),
];

const INVULNERABILITY_OUTLINE: [(f32, f32); 8] = [
    (10.0, 5.0),
    (10.0, -5.0),
    (5.0, -10.0),
    (-5.0, -10.0),
    (-10.0, -5.0),
    (-10.0, 5.0),
    (-5.0, 10.0),
    (5.0, 10.0),
];

const EXTRA_LIFE_OUTLINE: [(f32, f32); 8] = [
    (0.0, -10.0),
    (10.0, 0.0),
    (10.0, 10.0),
    (5.0, 10.0),
    (0.0, 5.0),
    (-5.0, 10.0),
    (-10.0, 10.0),
    (-10.0, 0.0),
];

fn asteroid_outline(variety: u8) -> &'static [(f32, f32)] {
    const V0: [(f32, f32); 9] = [
        (0.0, -30.0),
        (28.0, -15.0),
        (20.0, 20.0),
        (4.0, 8.0),
        (-1.0, 30.0),
        (-12.0, 15.0),
        (-5.0, 2.0),
        (-25.0, 7.0),
        (-10.0, -25.0),
    ];
    const V1: [(f32, f32); 12] = [
        (10.0, -28.0),
        (7.0, -16.0),
        (30.0, -9.0),
        (30.0, 9.0),
        (10.0, 13.0),
        (5.0, 30.0),
        (-8.0, 28.0),
        (-6.0, 6.0),
        (-27.0, 12.0),
        (-30.0, -11.0),
        (-6.0, -15.0),
        (-6.0, -28.0),
    ];
    const V2: [(f32, f32); 7] = [
        (10.0, -30.0),
        (30.0, 0.0),
        (15.0, 30.0),
        (0.0, 15.0),
        (-15.0, 30.0),
        (-30.0, 0.0),
        (-10.0, -30.0),
    ];
    const V3: [(f32, f32); 10] = [
        (30.0, -18.0),
        (5.0, 5.0),
        (30.0, 15.0),
        (15.0, 30.0),
        (0.0, 25.0),
        (-15.0, 30.0),
        (-25.0, 8.0),
        (-10.0, -25.0),
        (0.0, -30.0),
        (10.0, -30.0),
    ];
    match variety {
        0 => &V0,
        1 => &V1,
        2 => &V2,
        _ => &V3,
    }
}

/// Number of asteroid outline varieties
pub const ASTEROID_VARIETIES: u8 = 4;

/// Unit ellipse used by bullets, debris and stars
fn speck_outline() -> Outline {
    Outline::ellipse(Vec2::ZERO, Vec2::ONE, 8)
}

impl Participant {
    fn with_body(body: Body, outline: Outline, position: Vec2) -> Self {
        Self {
            id: ParticipantId::UNASSIGNED,
            position: Vec2::new(
                wrap_coordinate(position.x, FIELD_SIZE),
                wrap_coordinate(position.y, FIELD_SIZE),
            ),
            velocity: Vec2::ZERO,
            rotation: 0.0,
            friction: 1.0,
            outline,
            expired: false,
            body,
        }
    }

    /// The player's ship, at rest, facing `rotation`
    pub fn ship(position: Vec2, rotation: f32) -> Self {
        let state = ShipState {
            thrusting: false,
            invulnerable: false,
            invulnerable_until_ms: 0,
            thrust_outline: Outline::from_coords(&SHIP_THRUST_OUTLINE),
        };
        let mut ship = Self::with_body(
            Body::Ship(state),
            Outline::from_coords(&SHIP_OUTLINE),
            position,
        );
        ship.rotation = normalize_angle(rotation);
        ship.friction = SHIP_FRICTION;
        ship
    }

    /// An asteroid of `size` (0 small ..= 2 large) and outline `variety`
    /// (0..=3) heading in a random direction with a random rotation.
    pub fn asteroid<R: Rng>(
        variety: u8,
        size: u8,
        position: Vec2,
        speed: f32,
        rng: &mut R,
    ) -> SimResult<Self> {
        let size = AsteroidSize::try_from(size)?;
        if variety >= ASTEROID_VARIETIES {
            return Err(SimError::InvalidAsteroidVariety(variety));
        }
        let outline = Outline::from_coords(asteroid_outline(variety)).scaled(size.scale());
        let mut asteroid = Self::with_body(Body::Asteroid { size, variety }, outline, position);
        asteroid.set_velocity(speed, rng.random_range(0.0..std::f32::consts::TAU));
        asteroid.rotation = normalize_angle(rng.random_range(0.0..std::f32::consts::TAU));
        Ok(asteroid)
    }

    /// An alien saucer sized for `level`, travelling at `speed` along `direction`
    pub fn alien_ship(position: Vec2, direction: f32, level: u32, speed: f32) -> SimResult<Self> {
        let size = AlienSize::for_level(level)?;
        let scale = match size {
            AlienSize::Large => 1.0,
            AlienSize::Small => 0.5,
        };
        let outline = Outline::from_coords(&ALIEN_OUTLINE).scaled(scale);
        let mut alien = Self::with_body(
            Body::AlienShip(AlienState {
                size,
                turn_pending: false,
            }),
            outline,
            position,
        );
        alien.set_velocity(speed, direction);
        Ok(alien)
    }

    pub fn bullet(position: Vec2, direction: f32) -> Self {
        let mut bullet = Self::with_body(Body::Bullet, speck_outline(), position);
        bullet.set_velocity(BULLET_SPEED, direction);
        bullet
    }

    pub fn alien_bullet(position: Vec2, direction: f32) -> Self {
        let mut bullet = Self::with_body(Body::AlienBullet, speck_outline(), position);
        bullet.set_velocity(ALIEN_BULLET_SPEED, direction);
        bullet
    }

    pub fn debris(position: Vec2, direction: f32) -> Self {
        let mut debris = Self::with_body(Body::Debris, speck_outline(), position);
        debris.set_velocity(DEBRIS_SPEED, direction);
        debris
    }

    /// A background star drifting down the field
    pub fn star(position: Vec2) -> Self {
        let mut star = Self::with_body(Body::Star, speck_outline(), position);
        star.set_velocity(STAR_SPEED, std::f32::consts::FRAC_PI_2);
        star
    }

    /// A power-up of `variety` (1 invulnerability, 2 extra life)
    pub fn power_up<R: Rng>(variety: u8, position: Vec2, rng: &mut R) -> SimResult<Self> {
        let kind = PowerUpKind::try_from(variety)?;
        Ok(Self::power_up_of(kind, position, rng))
    }

    pub fn power_up_of<R: Rng>(kind: PowerUpKind, position: Vec2, rng: &mut R) -> Self {
        let coords: &[(f32, f32)] = match kind {
            PowerUpKind::Invulnerability => &INVULNERABILITY_OUTLINE,
            PowerUpKind::ExtraLife => &EXTRA_LIFE_OUTLINE,
        };
        let mut power_up =
            Self::with_body(Body::PowerUp(kind), Outline::from_coords(coords), position);
        power_up.set_velocity(POWER_UP_SPEED, rng.random_range(0.0..std::f32::consts::TAU));
        power_up.rotation = normalize_angle(rng.random_range(0.0..std::f32::consts::TAU));
        power_up
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Mark expired; returns false if it already was
    pub fn expire(&mut self) -> bool {
        !std::mem::replace(&mut self.expired, true)
    }

    pub fn category(&self) -> Category {
        match self.body {
            Body::Ship(_) => Category::Ship,
            Body::Asteroid { .. } => Category::Asteroid,
            Body::AlienShip(_) => Category::AlienShip,
            Body::Bullet => Category::Bullet,
            Body::AlienBullet => Category::AlienBullet,
            Body::Debris => Category::Debris,
            Body::Star => Category::Star,
            Body::PowerUp(_) => Category::PowerUp,
        }
    }

    /// What this participant can do to others
    pub fn capabilities(&self) -> Capabilities {
        match self.body {
            Body::Ship(_) => {
                Capabilities::ASTEROID_DESTROYER
                    | Capabilities::ALIEN_DESTROYER
                    | Capabilities::COLLECTOR
            }
            Body::Asteroid { .. } => Capabilities::SHIP_DESTROYER | Capabilities::ALIEN_DESTROYER,
            Body::AlienShip(_) => Capabilities::SHIP_DESTROYER | Capabilities::ASTEROID_DESTROYER,
            Body::Bullet => Capabilities::ASTEROID_DESTROYER | Capabilities::ALIEN_DESTROYER,
            Body::AlienBullet => Capabilities::SHIP_DESTROYER | Capabilities::ASTEROID_DESTROYER,
            Body::Debris | Body::Star | Body::PowerUp(_) => Capabilities::NONE,
        }
    }

    /// Capabilities that destroy this participant
    pub fn vulnerabilities(&self) -> Capabilities {
        match self.body {
            Body::Ship(_) => Capabilities::SHIP_DESTROYER,
            Body::Asteroid { .. } => Capabilities::ASTEROID_DESTROYER,
            Body::AlienShip(_) => Capabilities::ALIEN_DESTROYER,
            _ => Capabilities::NONE,
        }
    }

    /// Bullets of either side
    pub fn is_projectile(&self) -> bool {
        matches!(self.body, Body::Bullet | Body::AlienBullet)
    }

    pub fn is_invulnerable(&self) -> bool {
        matches!(&self.body, Body::Ship(s) if s.invulnerable)
    }

    pub fn ship_state_mut(&mut self) -> Option<&mut ShipState> {
        match &mut self.body {
            Body::Ship(state) => Some(state),
            _ => None,
        }
    }

    pub fn contact(&self) -> Contact {
        Contact {
            id: self.id,
            category: self.category(),
            capabilities: self.capabilities(),
            vulnerabilities: self.vulnerabilities(),
            position: self.position,
            invulnerable: self.is_invulnerable(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Direction of travel (radians)
    pub fn direction(&self) -> f32 {
        cartesian_to_polar(self.velocity).1
    }

    pub fn set_velocity(&mut self, speed: f32, direction: f32) {
        self.velocity = polar_to_cartesian(speed, direction);
    }

    pub fn set_direction(&mut self, direction: f32) {
        let speed = self.speed();
        self.set_velocity(speed, direction);
    }

    /// Local outline currently in effect
    pub fn outline(&self) -> &Outline {
        match &self.body {
            Body::Ship(state) if state.thrusting => &state.thrust_outline,
            _ => &self.outline,
        }
    }

    /// World-space outline, used for drawing and collision
    pub fn transformed_outline(&self) -> WorldOutline {
        self.outline().transformed(self.position, self.rotation)
    }

    /// Map a local point into world space
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation).rotate(local)
    }

    /// Apply friction, integrate velocity, wrap onto the field
    pub fn move_step(&mut self) {
        if self.expired {
            return;
        }
        self.velocity *= self.friction;
        let next = self.position + self.velocity;
        self.position = Vec2::new(
            wrap_coordinate(next.x, FIELD_SIZE),
            wrap_coordinate(next.y, FIELD_SIZE),
        );
    }

    pub fn rotate(&mut self, delta: f32) {
        self.rotation = normalize_angle(self.rotation + delta);
    }

    // === Ship intents ===

    pub fn turn_left(&mut self) {
        self.rotate(-SHIP_TURN);
    }

    pub fn turn_right(&mut self) {
        self.rotate(SHIP_TURN);
    }

    /// Thrust along the facing direction, capped at `SPEED_LIMIT`
    pub fn accelerate(&mut self) {
        self.velocity += polar_to_cartesian(SHIP_ACCELERATION, self.rotation);
        self.velocity = self.velocity.clamp_length_max(SPEED_LIMIT);
        if let Some(state) = self.ship_state_mut() {
            state.thrusting = true;
        }
    }

    /// Brake toward a standstill
    pub fn decelerate(&mut self) {
        let speed = (self.speed() - SHIP_ACCELERATION).max(0.0);
        self.velocity = self.velocity.normalize_or_zero() * speed;
        if let Some(state) = self.ship_state_mut() {
            state.thrusting = false;
        }
    }

    /// Cut thrust
    pub fn stop(&mut self) {
        if let Some(state) = self.ship_state_mut() {
            state.thrusting = false;
        }
    }

    /// Where a bullet fired now would start
    pub fn nose(&self) -> Vec2 {
        self.transform_point(SHIP_NOSE)
    }
}
