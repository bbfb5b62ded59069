//! Determinism testing utilities.
//!
//! A threaded [`arena_core::scheduler::Session`] is only reproducible up to
//! thread interleaving. Its building blocks are not: given the same seed,
//! population, movement, detection and resolution must produce the same
//! arena every time. [`LockstepArena`] runs those blocks on one thread, in
//! the order the session runs them, so that property can be checked.
//!
//! # Example
//!
//! ```
//! use arena_test_utils::determinism::verify_arena_determinism;
//!
//! assert!(verify_arena_determinism(7, 40, 50));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread;

use arena_core::combat::{detect_combats, CombatResolver, DrainSummary};
use arena_core::creation::CreationService;
use arena_core::events::SinkSet;
use arena_core::queue::CombatQueue;
use arena_core::registry::{Arena, EntityRegistry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Arena is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Hash of every entity's kind, name, exact position bits and liveness.
#[must_use]
pub fn state_hash(arena: &Arena) -> u64 {
    let mut hasher = DefaultHasher::new();
    for entity in arena.entities() {
        entity.kind().hash(&mut hasher);
        entity.name().hash(&mut hasher);
        entity.position().x.to_bits().hash(&mut hasher);
        entity.position().y.to_bits().hash(&mut hasher);
        entity.is_alive().hash(&mut hasher);
    }
    hasher.finish()
}

/// Single-threaded mover + resolver over one registry.
#[derive(Debug)]
pub struct LockstepArena {
    registry: Arc<EntityRegistry>,
    queue: CombatQueue,
    mover_rng: ChaCha8Rng,
    resolver: CombatResolver<ChaCha8Rng>,
    totals: DrainSummary,
}

impl LockstepArena {
    /// Populate `population` creatures from `seed` and derive the mover and
    /// resolver RNGs from it.
    ///
    /// # Panics
    ///
    /// Panics if population fails, which cannot happen over the default world.
    #[must_use]
    pub fn new(seed: u64, population: usize) -> Self {
        let sinks = Arc::new(SinkSet::new());
        let registry = Arc::new(EntityRegistry::new(
            CreationService::default(),
            Arc::clone(&sinks),
        ));
        let mut master = ChaCha8Rng::seed_from_u64(seed);
        registry
            .populate(population, &mut master)
            .expect("populate default world");
        let mover_rng = ChaCha8Rng::seed_from_u64(master.gen());
        let resolver = CombatResolver::new(ChaCha8Rng::seed_from_u64(master.gen()), sinks);
        Self {
            registry,
            queue: CombatQueue::new(),
            mover_rng,
            resolver,
            totals: DrainSummary::default(),
        }
    }

    /// One move/detect cycle followed by one full drain.
    pub fn tick(&mut self) {
        let mut arena = self.registry.write();
        arena.step_all(&mut self.mover_rng);
        self.queue.push_batch(detect_combats(arena.entities()));
        self.totals += self.resolver.drain(&mut arena, &self.queue);
    }

    /// Underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    /// Resolution totals across all ticks.
    #[must_use]
    pub fn totals(&self) -> DrainSummary {
        self.totals
    }

    /// Current state hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        state_hash(&self.registry.read())
    }
}

/// Run the lockstep arena twice from `seed` and compare final hashes.
#[must_use]
pub fn verify_arena_determinism(seed: u64, population: usize, ticks: u64) -> bool {
    verify_determinism(
        2,
        ticks,
        || LockstepArena::new(seed, population),
        LockstepArena::tick,
        LockstepArena::state_hash,
    )
    .is_deterministic
}

/// Run `runs` lockstep arenas from the same seed on scoped threads and
/// collect their final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_arenas(
    seed: u64,
    population: usize,
    runs: usize,
    ticks: u64,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut arena = LockstepArena::new(seed, population);
                    for _ in 0..ticks {
                        arena.tick();
                    }
                    arena.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("lockstep worker panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}
