//! Entity kinds, the advantage relation, and movement directions.
//!
//! Every entity is one of three [`Kind`]s. Per-kind numbers (movement step
//! and attack reach) live in a [`KindTable`] looked up by kind, so there is
//! one entity record type and no per-kind dispatch.
//!
//! # Advantage
//!
//! The advantage relation is irreflexive, asymmetric, and total over
//! distinct kinds:
//!
//! | attacker \ defender | Melee | Ranged | Apex |
//! |---------------------|-------|--------|------|
//! | Melee               | -     | no     | no   |
//! | Ranged              | yes   | -      | no   |
//! | Apex                | yes   | yes    | -    |
//!
//! # Example
//!
//! ```
//! use arena_core::kind::Kind;
//!
//! assert!(Kind::Apex.has_advantage_over(Kind::Melee));
//! assert!(!Kind::Melee.has_advantage_over(Kind::Apex));
//! assert!(!Kind::Ranged.has_advantage_over(Kind::Ranged));
//! ```

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ArenaError;

/// Combatant category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    /// Close-combat fighter (knight).
    Melee,
    /// Long-range fighter (elf).
    Ranged,
    /// Dominant creature (dragon).
    Apex,
}

impl Kind {
    /// All kinds in canonical order.
    pub const ALL: [Kind; 3] = [Kind::Melee, Kind::Ranged, Kind::Apex];

    /// Whether an entity of this kind can defeat one of `other`'s kind.
    #[must_use]
    pub const fn has_advantage_over(self, other: Kind) -> bool {
        matches!(
            (self, other),
            (Kind::Ranged, Kind::Melee) | (Kind::Apex, Kind::Melee) | (Kind::Apex, Kind::Ranged)
        )
    }

    /// Canonical lowercase token, as written in scenario files.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Kind::Melee => "melee",
            Kind::Ranged => "ranged",
            Kind::Apex => "apex",
        }
    }

    /// Flavor name used in logs and console output.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Kind::Melee => "Knight",
            Kind::Ranged => "Elf",
            Kind::Apex => "Dragon",
        }
    }

    /// Single-character map symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Kind::Melee => 'K',
            Kind::Ranged => 'E',
            Kind::Apex => 'D',
        }
    }

    /// Kind for a population slot; cycles Melee, Ranged, Apex.
    #[must_use]
    pub const fn cycle(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Pick a kind uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Kind {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "melee" | "knight" => Ok(Kind::Melee),
            "ranged" | "elf" => Ok(Kind::Ranged),
            "apex" | "dragon" => Ok(Kind::Apex),
            _ => Err(ArenaError::UnknownKind(s.to_string())),
        }
    }
}

/// Movement direction. `Up` is +y, `Right` is +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards larger Y.
    Up,
    /// Towards larger X.
    Right,
    /// Towards smaller Y.
    Down,
    /// Towards smaller X.
    Left,
}

impl Direction {
    /// All directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Pick a direction uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Lowercase token.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Direction {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "top" => Ok(Direction::Up),
            "right" => Ok(Direction::Right),
            "down" | "bottom" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            _ => Err(ArenaError::UnknownKind(s.to_string())),
        }
    }
}

/// Movement and combat numbers for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindTraits {
    /// Distance covered by one move.
    pub move_step: f64,
    /// Maximum distance at which this kind can exercise its advantage.
    pub attack_reach: f64,
}

impl KindTraits {
    /// Create a new trait record.
    #[must_use]
    pub const fn new(move_step: f64, attack_reach: f64) -> Self {
        Self {
            move_step,
            attack_reach,
        }
    }
}

/// Per-kind trait table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTable {
    /// Melee traits.
    pub melee: KindTraits,
    /// Ranged traits.
    pub ranged: KindTraits,
    /// Apex traits.
    pub apex: KindTraits,
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            melee: KindTraits::new(30.0, 10.0),
            ranged: KindTraits::new(10.0, 50.0),
            apex: KindTraits::new(50.0, 30.0),
        }
    }
}

impl KindTable {
    /// Look up the traits for a kind.
    #[must_use]
    pub const fn get(&self, kind: Kind) -> KindTraits {
        match kind {
            Kind::Melee => self.melee,
            Kind::Ranged => self.ranged,
            Kind::Apex => self.apex,
        }
    }

    /// Replace the traits for a kind.
    pub fn set(&mut self, kind: Kind, traits: KindTraits) {
        match kind {
            Kind::Melee => self.melee = traits,
            Kind::Ranged => self.ranged = traits,
            Kind::Apex => self.apex = traits,
        }
    }
}
