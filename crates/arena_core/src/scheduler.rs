//! Session scheduler.
//!
//! A [`Session`] runs three named worker threads against one registry for a
//! fixed wall-clock duration:
//!
//! - **mover**: every `move_interval`, under one write lock, steps every
//!   living entity in a random direction, detects combats and pushes the
//!   batch to the combat queue.
//! - **resolver**: waits (bounded by `resolver_wait`) for pending batches,
//!   then drains the whole queue under the write lock.
//! - **reporter**: every `display_interval`, takes a snapshot under the read
//!   lock and broadcasts it.
//!
//! Locks are always taken registry first, queue second, and nobody waits on
//! the queue condition variable while holding the registry lock. Shutdown
//! cancels the shared token, wakes every waiter and joins all workers before
//! the [`SessionReport`] is built.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::cancel::CancellationToken;
use crate::combat::{detect_combats, CombatResolver, DrainSummary};
use crate::config::TimingConfig;
use crate::error::{ArenaError, Result};
use crate::queue::CombatQueue;
use crate::registry::{ArenaStats, EntityRegistry};

/// Live counters updated by the workers.
#[derive(Debug, Default)]
pub struct SessionCounters {
    move_ticks: AtomicU64,
    pairs_detected: AtomicU64,
    resolver_passes: AtomicU64,
    resolved: AtomicU64,
    battles: AtomicU64,
    no_contests: AtomicU64,
    stale: AtomicU64,
    reporter_ticks: AtomicU64,
}

impl SessionCounters {
    fn bump(counter: &AtomicU64, by: usize) {
        counter.fetch_add(by as u64, Ordering::Relaxed);
    }

    fn record_drain(&self, summary: DrainSummary) {
        Self::bump(&self.resolver_passes, 1);
        Self::bump(&self.resolved, summary.resolved);
        Self::bump(&self.battles, summary.battles);
        Self::bump(&self.no_contests, summary.no_contest);
        Self::bump(&self.stale, summary.stale);
    }

    /// Completed mover ticks so far.
    #[must_use]
    pub fn move_ticks(&self) -> u64 {
        self.move_ticks.load(Ordering::Relaxed)
    }

    /// Battles with a death so far.
    #[must_use]
    pub fn battles(&self) -> u64 {
        self.battles.load(Ordering::Relaxed)
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Seed all worker RNGs were derived from.
    pub seed: u64,
    /// Wall-clock run time in milliseconds.
    pub elapsed_ms: u64,
    /// Completed mover ticks.
    pub move_ticks: u64,
    /// Pairs pushed to the queue.
    pub pairs_detected: u64,
    /// Resolver drains.
    pub resolver_passes: u64,
    /// Pairs that were fought.
    pub resolved: u64,
    /// Fights that ended with a death.
    pub battles: u64,
    /// Fights that ended with nobody dying.
    pub no_contests: u64,
    /// Pairs discarded as stale.
    pub stale: u64,
    /// Snapshots broadcast by the reporter.
    pub reporter_ticks: u64,
    /// Statistics before the workers started.
    pub initial: ArenaStats,
    /// Statistics after every worker was joined.
    pub final_stats: ArenaStats,
    /// Pairs still queued at shutdown.
    pub unresolved: usize,
}

/// One timed run over a registry.
#[derive(Debug)]
pub struct Session {
    registry: Arc<EntityRegistry>,
    queue: Arc<CombatQueue>,
    timing: TimingConfig,
    seed: u64,
    token: CancellationToken,
    counters: Arc<SessionCounters>,
}

impl Session {
    /// Prepare a session. A missing seed is drawn from the OS.
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>, timing: TimingConfig, seed: Option<u64>) -> Self {
        Self {
            registry,
            queue: Arc::new(CombatQueue::new()),
            timing,
            seed: seed.unwrap_or_else(rand::random),
            token: CancellationToken::new(),
            counters: Arc::new(SessionCounters::default()),
        }
    }

    /// Seed in use.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Token that ends the session early when cancelled.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Live counters.
    #[must_use]
    pub fn counters(&self) -> Arc<SessionCounters> {
        Arc::clone(&self.counters)
    }

    /// The combat queue shared by mover and resolver.
    #[must_use]
    pub fn queue(&self) -> &Arc<CombatQueue> {
        &self.queue
    }

    /// Run the workers for `duration` (or until cancelled), then shut down.
    ///
    /// Every worker is joined before this returns. If any of them panicked
    /// the result is [`ArenaError::WorkerPanicked`] naming the first one.
    pub fn run_for(self, duration: Duration) -> Result<SessionReport> {
        let started = Instant::now();
        let initial = self.registry.stats();
        info!(
            seed = self.seed,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            entities = initial.total,
            "session starting"
        );
        self.registry.sinks().event(&format!(
            "Session started with {} creatures for {}s",
            initial.alive,
            duration.as_secs()
        ));

        let handles = self.spawn_workers()?;
        self.token.sleep(duration);
        self.shutdown(handles)?;

        let final_stats = self.registry.stats();
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let c = &self.counters;
        let report = SessionReport {
            seed: self.seed,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            move_ticks: load(&c.move_ticks),
            pairs_detected: load(&c.pairs_detected),
            resolver_passes: load(&c.resolver_passes),
            resolved: load(&c.resolved),
            battles: load(&c.battles),
            no_contests: load(&c.no_contests),
            stale: load(&c.stale),
            reporter_ticks: load(&c.reporter_ticks),
            initial,
            final_stats,
            unresolved: self.queue.len(),
        };
        info!(
            battles = report.battles,
            survivors = final_stats.alive,
            unresolved = report.unresolved,
            "session finished"
        );
        self.registry.sinks().event(&format!(
            "Session ended: {} battles, {} survivors",
            report.battles, final_stats.alive
        ));
        Ok(report)
    }

    fn spawn_workers(&self) -> Result<Vec<(&'static str, JoinHandle<()>)>> {
        let mut master = ChaCha8Rng::seed_from_u64(self.seed);
        let mover_rng = ChaCha8Rng::seed_from_u64(master.gen());
        let resolver_rng = ChaCha8Rng::seed_from_u64(master.gen());

        let mut handles = Vec::with_capacity(3);
        let mover = Mover {
            registry: Arc::clone(&self.registry),
            queue: Arc::clone(&self.queue),
            token: self.token.clone(),
            counters: Arc::clone(&self.counters),
            interval: self.timing.move_interval(),
            rng: mover_rng,
        };
        let resolver = Resolver {
            registry: Arc::clone(&self.registry),
            queue: Arc::clone(&self.queue),
            token: self.token.clone(),
            counters: Arc::clone(&self.counters),
            interval: self.timing.combat_interval(),
            wait: self.timing.resolver_wait(),
            resolver: CombatResolver::new(resolver_rng, Arc::clone(self.registry.sinks())),
        };
        let reporter = Reporter {
            registry: Arc::clone(&self.registry),
            token: self.token.clone(),
            counters: Arc::clone(&self.counters),
            interval: self.timing.display_interval(),
        };

        let workers: [(&'static str, Box<dyn FnOnce() + Send>); 3] = [
            ("mover", Box::new(move || mover.run())),
            ("resolver", Box::new(move || resolver.run())),
            ("reporter", Box::new(move || reporter.run())),
        ];
        for (name, work) in workers {
            match thread::Builder::new().name(name.to_string()).spawn(work) {
                Ok(handle) => handles.push((name, handle)),
                Err(err) => {
                    error!(worker = name, %err, "failed to spawn session worker");
                    self.shutdown(handles)?;
                    return Err(err.into());
                }
            }
        }
        Ok(handles)
    }

    fn shutdown(&self, handles: Vec<(&'static str, JoinHandle<()>)>) -> Result<()> {
        self.token.cancel();
        self.queue.wake_all();
        let mut panicked = None;
        for (name, handle) in handles {
            if handle.join().is_err() {
                error!(worker = name, "worker thread panicked");
                panicked.get_or_insert(name);
            } else {
                debug!(worker = name, "worker joined");
            }
        }
        match panicked {
            Some(name) => Err(ArenaError::WorkerPanicked(name.to_string())),
            None => Ok(()),
        }
    }
}

struct Mover {
    registry: Arc<EntityRegistry>,
    queue: Arc<CombatQueue>,
    token: CancellationToken,
    counters: Arc<SessionCounters>,
    interval: Duration,
    rng: ChaCha8Rng,
}

impl Mover {
    fn run(mut self) {
        while !self.token.is_cancelled() {
            let (moved, pairs) = {
                let mut arena = self.registry.write();
                let moves = arena.step_all(&mut self.rng);
                let pairs = detect_combats(arena.entities());
                let count = pairs.len();
                self.queue.push_batch(pairs);
                let moved: Vec<_> = moves
                    .into_iter()
                    .filter_map(|(index, direction)| arena.view(index).map(|v| (v, direction)))
                    .collect();
                (moved, count)
            };
            for (view, direction) in &moved {
                self.registry.sinks().movement(view, *direction);
            }
            let tick = self.counters.move_ticks.fetch_add(1, Ordering::Relaxed) + 1;
            SessionCounters::bump(&self.counters.pairs_detected, pairs);
            debug!(tick, moved = moved.len(), pairs, "mover tick");

            if !self.token.sleep(self.interval) {
                break;
            }
        }
    }
}

struct Resolver {
    registry: Arc<EntityRegistry>,
    queue: Arc<CombatQueue>,
    token: CancellationToken,
    counters: Arc<SessionCounters>,
    interval: Duration,
    wait: Duration,
    resolver: CombatResolver<ChaCha8Rng>,
}

impl Resolver {
    fn run(mut self) {
        while !self.token.is_cancelled() {
            if self.queue.wait_for_work(self.wait, &self.token) {
                let summary = {
                    let mut arena = self.registry.write();
                    self.resolver.drain(&mut arena, &self.queue)
                };
                if summary.processed() > 0 {
                    debug!(
                        resolved = summary.resolved,
                        battles = summary.battles,
                        stale = summary.stale,
                        "resolver pass"
                    );
                }
                self.counters.record_drain(summary);
            }
            if !self.token.sleep(self.interval) {
                break;
            }
        }
    }
}

struct Reporter {
    registry: Arc<EntityRegistry>,
    token: CancellationToken,
    counters: Arc<SessionCounters>,
    interval: Duration,
}

impl Reporter {
    fn run(self) {
        let mut tick = 0;
        while self.token.sleep(self.interval) {
            tick += 1;
            let snapshot = self.registry.read().snapshot(tick);
            self.registry.sinks().world_snapshot(&snapshot);
            self.counters.reporter_ticks.fetch_add(1, Ordering::Relaxed);
        }
    }
}
