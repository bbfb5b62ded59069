//! Test fixtures and helpers.
//!
//! Pre-built registries, arenas and a sink that records everything it is
//! told, for consistent testing.

use std::sync::{Arc, Mutex, PoisonError};

use arena_core::config::TimingConfig;
use arena_core::creation::CreationService;
use arena_core::entity::EntityView;
use arena_core::events::{EventSink, SinkSet, WorldSnapshot};
use arena_core::kind::{Direction, Kind};
use arena_core::registry::{Arena, EntityRegistry};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG for tests.
#[must_use]
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Timing fast enough for sessions that last a fraction of a second.
#[must_use]
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        move_interval_ms: 5,
        combat_interval_ms: 1,
        resolver_wait_ms: 5,
        display_interval_ms: 20,
    }
}

/// Empty registry over the default world with no sinks.
#[must_use]
pub fn empty_registry() -> Arc<EntityRegistry> {
    registry_with_sinks(SinkSet::new())
}

/// Empty registry over the default world reporting to `sinks`.
#[must_use]
pub fn registry_with_sinks(sinks: SinkSet) -> Arc<EntityRegistry> {
    Arc::new(EntityRegistry::new(
        CreationService::default(),
        Arc::new(sinks),
    ))
}

/// Registry populated with `count` creatures from `seed`.
///
/// # Panics
///
/// Panics if population fails, which cannot happen over the default world.
#[must_use]
pub fn populated_registry(count: usize, seed: u64) -> Arc<EntityRegistry> {
    let registry = empty_registry();
    registry
        .populate(count, &mut seeded_rng(seed))
        .expect("populate default world");
    registry
}

/// Unlocked arena holding the given `(kind, x, y)` entities, named `e0`, `e1`, ...
///
/// # Panics
///
/// Panics if any position is outside the default world.
#[must_use]
pub fn arena_with(entities: &[(Kind, f64, f64)]) -> Arena {
    let mut arena = Arena::new(CreationService::default());
    for (i, &(kind, x, y)) in entities.iter().enumerate() {
        arena
            .spawn(kind, x, y, &format!("e{i}"))
            .expect("fixture position inside the world");
    }
    arena
}

/// Something a [`RecordingSink`] was told.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    /// Battle with the victor's and the defeated's names.
    Battle {
        /// Victor name.
        victor: String,
        /// Defeated name.
        defeated: String,
    },
    /// A movement.
    Movement {
        /// Entity name.
        name: String,
        /// Direction moved.
        direction: Direction,
    },
    /// Free-form event text.
    Event(String),
    /// A snapshot with the given tick.
    Snapshot(u64),
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<Recorded>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, record: Recorded) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<Recorded> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded battles only.
    #[must_use]
    pub fn battles(&self) -> Vec<(String, String)> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Battle { victor, defeated } => Some((victor, defeated)),
                _ => None,
            })
            .collect()
    }

    /// Recorded free-form events only.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Event(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded movements.
    #[must_use]
    pub fn movement_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| matches!(r, Recorded::Movement { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn on_battle(&self, victor: &EntityView, defeated: &EntityView) {
        self.push(Recorded::Battle {
            victor: victor.name.clone(),
            defeated: defeated.name.clone(),
        });
    }

    fn on_movement(&self, entity: &EntityView, direction: Direction) {
        self.push(Recorded::Movement {
            name: entity.name.clone(),
            direction,
        });
    }

    fn on_event(&self, text: &str) {
        self.push(Recorded::Event(text.to_string()));
    }

    fn on_world_snapshot(&self, snapshot: &WorldSnapshot) {
        self.push(Recorded::Snapshot(snapshot.tick));
    }
}
