//! Entity creation service.
//!
//! Builds fully initialised entities from a kind, a position and a name,
//! validating the position against the world bounds before anything is
//! constructed. Also provides the bulk and placement helpers used to seed a
//! session: random creatures, edge and center placement, and swarms.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::ArenaConfig;
use crate::entity::Entity;
use crate::error::{ArenaError, Result};
use crate::kind::{Kind, KindTable};
use crate::math::{Bounds, Position};

/// Creates entities for a particular world and kind table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationService {
    bounds: Bounds,
    kinds: KindTable,
}

impl Default for CreationService {
    fn default() -> Self {
        Self::new(Bounds::default(), KindTable::default())
    }
}

impl CreationService {
    /// Create a service for the given world and kind table.
    #[must_use]
    pub const fn new(bounds: Bounds, kinds: KindTable) -> Self {
        Self { bounds, kinds }
    }

    /// Create a service from an arena configuration.
    #[must_use]
    pub const fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.world, config.kinds)
    }

    /// World bounds this service validates against.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Kind table this service draws traits from.
    #[must_use]
    pub const fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    /// Whether `(x, y)` lies inside the world.
    #[must_use]
    pub fn validate_position(&self, x: f64, y: f64) -> bool {
        self.bounds.contains(x, y)
    }

    /// Create an entity at an explicit position.
    ///
    /// Whitespace in `name` is replaced with `_` so the name stays a single
    /// token in scenario files. A blank name is replaced by a generated one
    /// (see [`generate_name`]) drawn from an RNG seeded by the kind and
    /// position, so the same request always yields the same name.
    pub fn create(&self, kind: Kind, x: f64, y: f64, name: &str) -> Result<Entity> {
        if !self.validate_position(x, y) {
            return Err(ArenaError::OutOfBounds { x, y });
        }
        let mut name = sanitize_name(name);
        if name.is_empty() {
            name = generate_name(kind, &mut placement_rng(kind, x, y));
        }
        Ok(Entity::new(
            kind,
            name,
            Position::new(x, y),
            self.kinds.get(kind),
        ))
    }

    /// Create an entity, drawing a generated name from `rng` when `name` is
    /// blank.
    pub fn create_named_or_generated<R: Rng + ?Sized>(
        &self,
        kind: Kind,
        x: f64,
        y: f64,
        name: &str,
        rng: &mut R,
    ) -> Result<Entity> {
        if name.trim().is_empty() {
            let generated = generate_name(kind, rng);
            self.create(kind, x, y, &generated)
        } else {
            self.create(kind, x, y, name)
        }
    }

    /// Create an entity of random kind at a random position.
    pub fn create_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Entity> {
        let kind = Kind::random(rng);
        let position = self.random_position(rng);
        let name = generate_name(kind, rng);
        self.create(kind, position.x, position.y, &name)
    }

    /// Create an entity at a random point on one of the four world edges.
    pub fn create_at_edge<R: Rng + ?Sized>(
        &self,
        kind: Kind,
        name: &str,
        rng: &mut R,
    ) -> Result<Entity> {
        let b = self.bounds;
        let (x, y) = match rng.gen_range(0..4) {
            0 => (rng.gen_range(b.min_x..=b.max_x), b.max_y),
            1 => (b.max_x, rng.gen_range(b.min_y..=b.max_y)),
            2 => (rng.gen_range(b.min_x..=b.max_x), b.min_y),
            _ => (b.min_x, rng.gen_range(b.min_y..=b.max_y)),
        };
        self.create_named_or_generated(kind, x, y, name, rng)
    }

    /// Create an entity at the world center.
    pub fn create_at_center<R: Rng + ?Sized>(
        &self,
        kind: Kind,
        name: &str,
        rng: &mut R,
    ) -> Result<Entity> {
        let center = self.bounds.center();
        self.create_named_or_generated(kind, center.x, center.y, name, rng)
    }

    /// Create `count` entities of one kind at random positions.
    pub fn create_swarm<R: Rng + ?Sized>(
        &self,
        kind: Kind,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Entity>> {
        (0..count)
            .map(|i| {
                let position = self.random_position(rng);
                let name = format!("{}_{}", generate_name(kind, rng), i + 1);
                self.create(kind, position.x, position.y, &name)
            })
            .collect()
    }

    /// Create `count` entities of random kinds at random positions.
    pub fn create_random_swarm<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Entity>> {
        (0..count).map(|_| self.create_random(rng)).collect()
    }

    /// Uniformly random position inside the world.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let b = self.bounds;
        Position::new(
            rng.gen_range(b.min_x..=b.max_x),
            rng.gen_range(b.min_y..=b.max_y),
        )
    }
}

/// Generate a display name such as `Dragon_4821`.
pub fn generate_name<R: Rng + ?Sized>(kind: Kind, rng: &mut R) -> String {
    format!("{}_{}", kind.title(), rng.gen_range(1000..=9999))
}

fn placement_rng(kind: Kind, x: f64, y: f64) -> ChaCha8Rng {
    let seed = x.to_bits() ^ y.to_bits().rotate_left(32) ^ kind as u64;
    ChaCha8Rng::seed_from_u64(seed)
}

fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
