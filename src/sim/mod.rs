//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (the timer clock advances with the tick)
//! - Seeded RNG only
//! - Stable iteration order (by participant id)
//! - No rendering, audio playback or platform dependencies

pub mod behavior;
pub mod collision;
pub mod geometry;
pub mod participant;
pub mod registry;
pub mod state;
pub mod tick;
pub mod timer;
pub mod world;

pub use collision::{CollisionPair, detect_collisions, participants_overlap};
pub use geometry::{Aabb, Outline, WorldOutline};
pub use participant::{
    AlienSize, AsteroidSize, Body, Capabilities, Category, Contact, Participant, ParticipantId,
    PowerUpKind,
};
pub use registry::ParticipantRegistry;
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use timer::{Scheduler, Timer, TimerPayload};
pub use world::World;
