//! Entity registry.
//!
//! [`Arena`] is the plain, unlocked entity store: a `Vec` used as an arena,
//! where an entity's index is its identity for the lifetime of the registry.
//! Entities are never removed, only marked dead, so indices held elsewhere
//! (combat queue entries) stay meaningful and only need a liveness recheck.
//!
//! [`EntityRegistry`] wraps the arena in a readers-writer lock. Single
//! operations (`spawn`, `move_entity`, `kill`, queries) take the lock
//! themselves. Sequences that must see one consistent state, such as
//! "move everyone, then detect combats", take [`EntityRegistry::write`] once
//! and work on the [`Arena`] directly.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use arena_core::creation::CreationService;
//! use arena_core::events::SinkSet;
//! use arena_core::kind::{Direction, Kind};
//! use arena_core::registry::EntityRegistry;
//!
//! let registry = EntityRegistry::new(CreationService::default(), Arc::new(SinkSet::new()));
//! let knight = registry.spawn(Kind::Melee, 10.0, 10.0, "arthur").unwrap();
//! registry.move_entity(knight, Direction::Up);
//! assert_eq!(registry.position(knight).unwrap().y, 40.0);
//! assert_eq!(registry.stats().melee, 1);
//! ```

use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::creation::CreationService;
use crate::entity::{Entity, EntityIndex, EntityView};
use crate::error::Result;
use crate::events::{SinkSet, WorldSnapshot};
use crate::kind::{Direction, Kind};
use crate::math::{Bounds, Position};

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaStats {
    /// Entities ever created.
    pub total: usize,
    /// Entities still alive.
    pub alive: usize,
    /// Living melee entities.
    pub melee: usize,
    /// Living ranged entities.
    pub ranged: usize,
    /// Living apex entities.
    pub apex: usize,
}

impl ArenaStats {
    /// Living entities of one kind.
    #[must_use]
    pub const fn alive_of(&self, kind: Kind) -> usize {
        match kind {
            Kind::Melee => self.melee,
            Kind::Ranged => self.ranged,
            Kind::Apex => self.apex,
        }
    }

    /// Entities that have died.
    #[must_use]
    pub const fn dead(&self) -> usize {
        self.total - self.alive
    }
}

/// Unlocked entity store. Reach it through [`EntityRegistry::read`] or
/// [`EntityRegistry::write`].
#[derive(Debug, Clone)]
pub struct Arena {
    entities: Vec<Entity>,
    creation: CreationService,
}

impl Arena {
    /// Create an empty arena.
    #[must_use]
    pub fn new(creation: CreationService) -> Self {
        Self {
            entities: Vec::new(),
            creation,
        }
    }

    /// World bounds.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.creation.bounds()
    }

    /// Creation service used by [`Arena::spawn`].
    #[must_use]
    pub fn creation(&self) -> &CreationService {
        &self.creation
    }

    /// Number of entities ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in index order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity at `index`, if the index is valid.
    #[must_use]
    pub fn entity(&self, index: EntityIndex) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Whether `index` is valid and the entity is alive.
    #[must_use]
    pub fn is_alive(&self, index: EntityIndex) -> bool {
        self.entities.get(index).is_some_and(Entity::is_alive)
    }

    /// Position of the entity at `index`.
    #[must_use]
    pub fn position(&self, index: EntityIndex) -> Option<Position> {
        self.entities.get(index).map(Entity::position)
    }

    /// View of the entity at `index`.
    #[must_use]
    pub fn view(&self, index: EntityIndex) -> Option<EntityView> {
        self.entities.get(index).map(|e| e.view(index))
    }

    /// Index of the first entity with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<EntityIndex> {
        self.entities.iter().position(|e| e.name() == name)
    }

    /// Validate and append a new entity. Nothing is appended on error.
    pub fn spawn(&mut self, kind: Kind, x: f64, y: f64, name: &str) -> Result<EntityIndex> {
        let entity = self.creation.create(kind, x, y, name)?;
        Ok(self.insert(entity))
    }

    /// Append an already-built entity.
    pub fn insert(&mut self, entity: Entity) -> EntityIndex {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Move one entity a step, clamped to the world.
    ///
    /// Returns the new position, or `None` if the index is invalid or the
    /// entity is dead (in which case nothing changes).
    pub fn move_entity(&mut self, index: EntityIndex, direction: Direction) -> Option<Position> {
        let bounds = self.bounds();
        let entity = self.entities.get_mut(index)?;
        entity.step(direction, &bounds).then(|| entity.position())
    }

    /// Move every living entity one step in a random direction.
    ///
    /// Returns the moves that happened.
    pub fn step_all<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<(EntityIndex, Direction)> {
        let bounds = self.bounds();
        let mut moves = Vec::with_capacity(self.entities.len());
        for (index, entity) in self.entities.iter_mut().enumerate() {
            if !entity.is_alive() {
                continue;
            }
            let direction = Direction::random(rng);
            if entity.step(direction, &bounds) {
                moves.push((index, direction));
            }
        }
        moves
    }

    /// Mark an entity dead. Idempotent; returns `true` only for the call that
    /// performed the transition.
    pub fn kill(&mut self, index: EntityIndex) -> bool {
        self.entities.get_mut(index).is_some_and(Entity::mark_dead)
    }

    /// Views of every entity in index order.
    #[must_use]
    pub fn views(&self) -> Vec<EntityView> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| e.view(i))
            .collect()
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let mut stats = ArenaStats {
            total: self.entities.len(),
            ..ArenaStats::default()
        };
        for entity in self.entities.iter().filter(|e| e.is_alive()) {
            stats.alive += 1;
            match entity.kind() {
                Kind::Melee => stats.melee += 1,
                Kind::Ranged => stats.ranged += 1,
                Kind::Apex => stats.apex += 1,
            }
        }
        stats
    }

    /// Full snapshot for the reporter.
    #[must_use]
    pub fn snapshot(&self, tick: u64) -> WorldSnapshot {
        WorldSnapshot {
            tick,
            entities: self.views(),
            stats: self.stats(),
        }
    }
}

/// Thread-safe owner of every entity.
#[derive(Debug)]
pub struct EntityRegistry {
    arena: RwLock<Arena>,
    sinks: Arc<SinkSet>,
}

impl EntityRegistry {
    /// Create an empty registry that reports to `sinks`.
    #[must_use]
    pub fn new(creation: CreationService, sinks: Arc<SinkSet>) -> Self {
        Self {
            arena: RwLock::new(Arena::new(creation)),
            sinks,
        }
    }

    /// Create an empty registry for the configured world.
    #[must_use]
    pub fn from_config(config: &ArenaConfig, sinks: Arc<SinkSet>) -> Self {
        Self::new(CreationService::from_config(config), sinks)
    }

    /// Sinks this registry reports to.
    #[must_use]
    pub fn sinks(&self) -> &Arc<SinkSet> {
        &self.sinks
    }

    /// Take the shared lock.
    pub fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(|poisoned| {
            tracing::warn!("registry lock poisoned by a panicked writer; recovering");
            poisoned.into_inner()
        })
    }

    /// Take the exclusive lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(|poisoned| {
            tracing::warn!("registry lock poisoned by a panicked writer; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Create an entity at `(x, y)`.
    ///
    /// Fails with [`crate::error::ArenaError::OutOfBounds`] without touching
    /// the registry if the position is outside the world.
    pub fn spawn(&self, kind: Kind, x: f64, y: f64, name: &str) -> Result<EntityIndex> {
        let view = {
            let mut arena = self.write();
            let index = arena.spawn(kind, x, y, name)?;
            arena.entities[index].view(index)
        };
        self.announce(&view);
        Ok(view.index)
    }

    /// Create an entity from a textual kind token such as `"dragon"`.
    pub fn spawn_token(&self, kind: &str, x: f64, y: f64, name: &str) -> Result<EntityIndex> {
        let kind: Kind = kind.parse()?;
        self.spawn(kind, x, y, name)
    }

    /// Append entities built by [`Arena::creation`] under one exclusive
    /// acquisition, then emit a created event for each.
    ///
    /// Returns the new index range.
    pub fn insert_all<I>(&self, entities: I) -> Range<EntityIndex>
    where
        I: IntoIterator<Item = Entity>,
    {
        let (range, views) = {
            let mut arena = self.write();
            let start = arena.len();
            for entity in entities {
                arena.insert(entity);
            }
            let range = start..arena.len();
            let views: Vec<EntityView> = range
                .clone()
                .map(|i| arena.entities[i].view(i))
                .collect();
            (range, views)
        };
        for view in &views {
            self.announce(view);
        }
        range
    }

    /// Bulk-create `count` entities at random positions.
    ///
    /// Kinds cycle Melee, Ranged, Apex and names are `npc_<n>`, numbered
    /// from the current registry size. Every entity gets its own created
    /// event, followed by one summary event. Returns the new index range.
    pub fn populate<R>(&self, count: usize, rng: &mut R) -> Result<Range<EntityIndex>>
    where
        R: Rng + ?Sized,
    {
        let (creation, start) = {
            let arena = self.read();
            (*arena.creation(), arena.len())
        };
        let entities = (start..start + count)
            .map(|i| {
                let position = creation.random_position(rng);
                let name = format!("npc_{}", i + 1);
                creation.create(Kind::cycle(i), position.x, position.y, &name)
            })
            .collect::<Result<Vec<_>>>()?;
        let range = self.insert_all(entities);
        tracing::info!(count, "populated arena");
        self.sinks.event(&format!("Initialized {count} creatures"));
        Ok(range)
    }

    fn announce(&self, view: &EntityView) {
        self.sinks.event(&format!(
            "Created {} '{}' at ({:.1}, {:.1})",
            view.kind.title(),
            view.name,
            view.position.x,
            view.position.y
        ));
    }

    /// Move one entity a step. No-op for invalid indices and dead entities.
    pub fn move_entity(&self, index: EntityIndex, direction: Direction) -> Option<Position> {
        let view = {
            let mut arena = self.write();
            arena.move_entity(index, direction)?;
            arena.entities[index].view(index)
        };
        self.sinks.movement(&view, direction);
        Some(view.position)
    }

    /// Mark an entity dead. Idempotent.
    pub fn kill(&self, index: EntityIndex) -> bool {
        self.write().kill(index)
    }

    /// Whether `index` is valid and alive.
    #[must_use]
    pub fn is_alive(&self, index: EntityIndex) -> bool {
        self.read().is_alive(index)
    }

    /// Position of the entity at `index`.
    #[must_use]
    pub fn position(&self, index: EntityIndex) -> Option<Position> {
        self.read().position(index)
    }

    /// View of the entity at `index`.
    #[must_use]
    pub fn entity(&self, index: EntityIndex) -> Option<EntityView> {
        self.read().view(index)
    }

    /// View of the first entity named `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<EntityView> {
        let arena = self.read();
        arena.find_by_name(name).and_then(|i| arena.view(i))
    }

    /// Views of every entity in index order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntityView> {
        self.read().views()
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.read().stats()
    }

    /// Number of entities ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no entity was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::error::ArenaError;

    fn registry() -> EntityRegistry {
        EntityRegistry::new(CreationService::default(), Arc::new(SinkSet::new()))
    }

    #[test]
    fn test_spawn_assigns_sequential_indices() {
        let registry = registry();
        assert_eq!(registry.spawn(Kind::Melee, 0.0, 0.0, "a").unwrap(), 0);
        assert_eq!(registry.spawn(Kind::Apex, 1.0, 1.0, "b").unwrap(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_spawn_out_of_bounds_leaves_registry_untouched() {
        let registry = registry();
        let err = registry.spawn(Kind::Melee, 5.0, 1001.0, "x").unwrap_err();
        assert!(matches!(err, ArenaError::OutOfBounds { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_spawn_token() {
        let registry = registry();
        let index = registry.spawn_token("Dragon", 3.0, 3.0, "smaug").unwrap();
        assert_eq!(registry.entity(index).unwrap().kind, Kind::Apex);
        assert!(matches!(
            registry.spawn_token("orc", 3.0, 3.0, "x"),
            Err(ArenaError::UnknownKind(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_move_invalid_or_dead_is_noop() {
        let registry = registry();
        let index = registry.spawn(Kind::Ranged, 100.0, 100.0, "e").unwrap();
        assert_eq!(registry.move_entity(99, Direction::Up), None);
        registry.kill(index);
        assert_eq!(registry.move_entity(index, Direction::Up), None);
        assert_eq!(registry.position(index), Some(Position::new(100.0, 100.0)));
    }

    #[test]
    fn test_move_clamps_to_bounds() {
        let registry = registry();
        let index = registry.spawn(Kind::Apex, 980.0, 10.0, "d").unwrap();
        assert_eq!(
            registry.move_entity(index, Direction::Right),
            Some(Position::new(1000.0, 10.0))
        );
        assert_eq!(
            registry.move_entity(index, Direction::Down),
            Some(Position::new(1000.0, 0.0))
        );
    }

    #[test]
    fn test_kill_is_idempotent() {
        let registry = registry();
        let index = registry.spawn(Kind::Melee, 0.0, 0.0, "k").unwrap();
        assert!(registry.kill(index));
        assert!(!registry.kill(index));
        assert!(!registry.kill(42));
        assert!(!registry.is_alive(index));
    }

    #[test]
    fn test_stats_count_living_per_kind() {
        let registry = registry();
        registry.spawn(Kind::Melee, 0.0, 0.0, "k1").unwrap();
        registry.spawn(Kind::Melee, 0.0, 0.0, "k2").unwrap();
        let elf = registry.spawn(Kind::Ranged, 0.0, 0.0, "e").unwrap();
        registry.spawn(Kind::Apex, 0.0, 0.0, "d").unwrap();
        registry.kill(elf);

        let stats = registry.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.alive, 3);
        assert_eq!(stats.dead(), 1);
        assert_eq!(stats.melee, 2);
        assert_eq!(stats.ranged, 0);
        assert_eq!(stats.alive_of(Kind::Apex), 1);
    }

    #[test]
    fn test_populate_cycles_kinds() {
        let registry = registry();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let range = registry.populate(6, &mut rng).unwrap();
        assert_eq!(range, 0..6);
        let stats = registry.stats();
        assert_eq!((stats.melee, stats.ranged, stats.apex), (2, 2, 2));
        assert_eq!(registry.find_by_name("npc_6").unwrap().kind, Kind::Apex);
    }

    #[test]
    fn test_step_all_skips_dead() {
        let registry = registry();
        let a = registry.spawn(Kind::Melee, 500.0, 500.0, "a").unwrap();
        let b = registry.spawn(Kind::Melee, 500.0, 500.0, "b").unwrap();
        registry.kill(b);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let moves = registry.write().step_all(&mut rng);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].0, a);
        assert_ne!(registry.position(a), Some(Position::new(500.0, 500.0)));
        assert_eq!(registry.position(b), Some(Position::new(500.0, 500.0)));
    }
}
