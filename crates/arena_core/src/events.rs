//! Event sinks.
//!
//! The core never prints or writes files itself. Anything observable
//! (battles, moves, free-form events, periodic world snapshots) is broadcast
//! to every [`EventSink`] registered in a [`SinkSet`]. Broadcasts are
//! synchronous and serialized by one lock per set, so two threads
//! reporting at once never interleave inside a single sink's output.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::entity::EntityView;
use crate::kind::Direction;
use crate::registry::ArenaStats;

/// Point-in-time copy of the whole arena, taken under one read lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Reporter tick that produced this snapshot (0 for ad-hoc snapshots).
    pub tick: u64,
    /// Every entity, dead or alive, in index order.
    pub entities: Vec<EntityView>,
    /// Aggregate statistics.
    pub stats: ArenaStats,
}

impl WorldSnapshot {
    /// Living entities only.
    pub fn living(&self) -> impl Iterator<Item = &EntityView> {
        self.entities.iter().filter(|e| e.alive)
    }
}

/// Receiver of simulation events.
///
/// Implementations must be cheap enough to call while the registry lock is
/// held: battles and moves are reported from inside the write scope.
pub trait EventSink: Send + Sync {
    /// `victor` defeated `defeated`.
    fn on_battle(&self, victor: &EntityView, defeated: &EntityView);

    /// `entity` moved one step in `direction` (view is post-move).
    fn on_movement(&self, entity: &EntityView, direction: Direction);

    /// Free-form event text.
    fn on_event(&self, text: &str);

    /// Periodic world snapshot from the reporter.
    fn on_world_snapshot(&self, snapshot: &WorldSnapshot);
}

/// A set of sinks that receive every broadcast.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn EventSink>>,
    broadcast: Mutex<()>,
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl SinkSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink.
    pub fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.add(sink);
        self
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(&self, f: impl Fn(&dyn EventSink)) {
        if self.sinks.is_empty() {
            return;
        }
        let _guard = self
            .broadcast
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for sink in &self.sinks {
            f(sink.as_ref());
        }
    }

    /// Broadcast a battle result.
    pub fn battle(&self, victor: &EntityView, defeated: &EntityView) {
        self.each(|sink| sink.on_battle(victor, defeated));
    }

    /// Broadcast a movement.
    pub fn movement(&self, entity: &EntityView, direction: Direction) {
        self.each(|sink| sink.on_movement(entity, direction));
    }

    /// Broadcast a free-form event.
    pub fn event(&self, text: &str) {
        self.each(|sink| sink.on_event(text));
    }

    /// Broadcast a world snapshot.
    pub fn world_snapshot(&self, snapshot: &WorldSnapshot) {
        self.each(|sink| sink.on_world_snapshot(snapshot));
    }
}

/// Forwards events to `tracing` under the `arena::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_battle(&self, victor: &EntityView, defeated: &EntityView) {
        tracing::info!(
            target: "arena::events",
            victor = %victor.name,
            victor_kind = %victor.kind,
            defeated = %defeated.name,
            defeated_kind = %defeated.kind,
            "battle"
        );
    }

    fn on_movement(&self, entity: &EntityView, direction: Direction) {
        tracing::trace!(
            target: "arena::events",
            entity = %entity.name,
            %direction,
            x = entity.position.x,
            y = entity.position.y,
            "movement"
        );
    }

    fn on_event(&self, text: &str) {
        tracing::info!(target: "arena::events", "{text}");
    }

    fn on_world_snapshot(&self, snapshot: &WorldSnapshot) {
        tracing::debug!(
            target: "arena::events",
            tick = snapshot.tick,
            total = snapshot.stats.total,
            alive = snapshot.stats.alive,
            "world snapshot"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::kind::Kind;
    use crate::math::Position;

    #[derive(Default)]
    struct Counter {
        events: AtomicUsize,
        battles: AtomicUsize,
    }

    impl EventSink for Counter {
        fn on_battle(&self, _: &EntityView, _: &EntityView) {
            self.battles.fetch_add(1, Ordering::Relaxed);
        }
        fn on_movement(&self, _: &EntityView, _: Direction) {}
        fn on_event(&self, _: &str) {
            self.events.fetch_add(1, Ordering::Relaxed);
        }
        fn on_world_snapshot(&self, _: &WorldSnapshot) {}
    }

    fn view(name: &str) -> EntityView {
        EntityView {
            index: 0,
            kind: Kind::Melee,
            name: name.to_string(),
            position: Position::default(),
            alive: true,
        }
    }

    #[test]
    fn test_broadcast_reaches_every_sink() {
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        let sinks = SinkSet::new()
            .with(a.clone())
            .with(b.clone())
            .with(Arc::new(TracingSink));
        assert_eq!(sinks.len(), 3);

        sinks.event("hello");
        sinks.battle(&view("a"), &view("b"));

        for counter in [&a, &b] {
            assert_eq!(counter.events.load(Ordering::Relaxed), 1);
            assert_eq!(counter.battles.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn test_empty_set_is_noop() {
        let sinks = SinkSet::new();
        assert!(sinks.is_empty());
        sinks.event("nobody listens");
    }
}
