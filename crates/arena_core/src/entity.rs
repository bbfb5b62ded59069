//! The entity record.
//!
//! Fields are private: `kind`, `name`, `move_step` and `attack_reach` are
//! fixed at creation, position changes only through clamped moves, and the
//! only liveness mutator is [`Entity::mark_dead`], so a dead entity can
//! never come back.

use serde::{Deserialize, Serialize};

use crate::kind::{Direction, Kind, KindTraits};
use crate::math::{Bounds, Position};

/// Stable index of an entity inside the registry.
pub type EntityIndex = usize;

/// A single combatant.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    kind: Kind,
    name: String,
    position: Position,
    alive: bool,
    move_step: f64,
    attack_reach: f64,
}

impl Entity {
    /// Build a living entity. Callers are expected to have validated the
    /// position; see [`crate::creation::CreationService`].
    #[must_use]
    pub(crate) fn new(kind: Kind, name: String, position: Position, traits: KindTraits) -> Self {
        Self {
            kind,
            name,
            position,
            alive: true,
            move_step: traits.move_step,
            attack_reach: traits.attack_reach,
        }
    }

    /// Entity kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Whether the entity is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Distance covered by one move.
    #[must_use]
    pub fn move_step(&self) -> f64 {
        self.move_step
    }

    /// Attack reach.
    #[must_use]
    pub fn attack_reach(&self) -> f64 {
        self.attack_reach
    }

    /// Move one step, clamped to `bounds`. Dead entities do not move.
    ///
    /// Returns `true` if the entity was alive and took the step.
    pub fn step(&mut self, direction: Direction, bounds: &Bounds) -> bool {
        if !self.alive {
            return false;
        }
        self.position = bounds.clamp(self.position.offset(direction, self.move_step));
        true
    }

    /// Mark the entity dead. Returns `true` if this call performed the
    /// transition, `false` if it was already dead.
    pub fn mark_dead(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    /// Whether this entity has advantage over `other` and `other` is in reach.
    #[must_use]
    pub fn can_defeat(&self, other: &Entity) -> bool {
        self.alive
            && other.alive
            && self.kind.has_advantage_over(other.kind)
            && self.position.within(other.position, self.attack_reach)
    }

    /// Read-only copy of this entity.
    #[must_use]
    pub fn view(&self, index: EntityIndex) -> EntityView {
        EntityView {
            index,
            kind: self.kind,
            name: self.name.clone(),
            position: self.position,
            alive: self.alive,
        }
    }
}

/// Detached read-only view of an entity, safe to hand out past the lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    /// Registry index.
    pub index: EntityIndex,
    /// Entity kind.
    pub kind: Kind,
    /// Display name.
    pub name: String,
    /// Position at the time of the view.
    pub position: Position,
    /// Liveness at the time of the view.
    pub alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knight(x: f64, y: f64) -> Entity {
        Entity::new(
            Kind::Melee,
            "k".to_string(),
            Position::new(x, y),
            KindTraits::new(30.0, 10.0),
        )
    }

    #[test]
    fn test_step_clamps() {
        let bounds = Bounds::default();
        let mut entity = knight(990.0, 5.0);
        assert!(entity.step(Direction::Right, &bounds));
        assert_eq!(entity.position(), Position::new(1000.0, 5.0));
        assert!(entity.step(Direction::Down, &bounds));
        assert_eq!(entity.position(), Position::new(1000.0, 0.0));
    }

    #[test]
    fn test_dead_entity_does_not_move() {
        let bounds = Bounds::default();
        let mut entity = knight(100.0, 100.0);
        assert!(entity.mark_dead());
        assert!(!entity.step(Direction::Up, &bounds));
        assert_eq!(entity.position(), Position::new(100.0, 100.0));
    }

    #[test]
    fn test_mark_dead_is_idempotent() {
        let mut entity = knight(0.0, 0.0);
        assert!(entity.mark_dead());
        assert!(!entity.mark_dead());
        assert!(!entity.is_alive());
    }

    #[test]
    fn test_can_defeat_requires_reach_and_advantage() {
        let elf = Entity::new(
            Kind::Ranged,
            "e".to_string(),
            Position::new(0.0, 0.0),
            KindTraits::new(10.0, 50.0),
        );
        assert!(elf.can_defeat(&knight(50.0, 0.0)));
        assert!(!elf.can_defeat(&knight(50.1, 0.0)));
        assert!(!knight(1.0, 0.0).can_defeat(&elf));
    }
}
