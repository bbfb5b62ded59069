//! # Arena Core
//!
//! Concurrent arena simulation core.
//!
//! Three kinds of creatures wander a bounded 2D world. Whenever one of them
//! gets within reach of a kind it has advantage over, a combat pair is
//! queued; a separate resolver thread settles queued pairs with dice.
//!
//! This crate contains no terminal or file output. Everything observable is
//! sent through [`events::EventSink`] implementations supplied by the caller.
//!
//! ## Crate Structure
//!
//! - [`registry`] - Lock-guarded entity store
//! - [`combat`] - Detection and dice resolution
//! - [`queue`] - Mover to resolver hand-off
//! - [`scheduler`] - Timed multi-threaded sessions
//! - [`creation`] - Entity construction and placement helpers
//! - [`config`] - RON configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cancel;
pub mod combat;
pub mod config;
pub mod creation;
pub mod entity;
pub mod error;
pub mod events;
pub mod kind;
pub mod math;
pub mod queue;
pub mod registry;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cancel::CancellationToken;
    pub use crate::combat::{
        detect_combats, simulate, CombatOutcome, CombatPair, CombatResolver, DiceRolls,
        DrainSummary, Resolution,
    };
    pub use crate::config::{ArenaConfig, TimingConfig};
    pub use crate::creation::CreationService;
    pub use crate::entity::{Entity, EntityIndex, EntityView};
    pub use crate::error::{ArenaError, Result};
    pub use crate::events::{EventSink, SinkSet, TracingSink, WorldSnapshot};
    pub use crate::kind::{Direction, Kind, KindTable, KindTraits};
    pub use crate::math::{Bounds, Position};
    pub use crate::queue::CombatQueue;
    pub use crate::registry::{Arena, ArenaStats, EntityRegistry};
    pub use crate::scheduler::{Session, SessionReport};
}
