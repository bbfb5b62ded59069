//! Combat detection and resolution.
//!
//! Detection is a pure scan over the arena that turns "who can hit whom"
//! into directed [`CombatPair`]s. Resolution pops those pairs, rechecks
//! them against the current arena (they may be stale by then) and settles
//! each one with a pair of d6 rolls:
//!
//! - attacker has advantage and rolls higher: defender dies
//! - otherwise defender has advantage and rolls higher: attacker dies
//! - otherwise nothing happens
//!
//! Each pair gets exactly one attempt. Neither step can fail; staleness is
//! an ordinary outcome.

use std::ops::AddAssign;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityIndex, EntityView};
use crate::events::SinkSet;
use crate::kind::Kind;
use crate::queue::CombatQueue;
use crate::registry::Arena;

/// Directed engagement: `attacker` has advantage over `defender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatPair {
    /// Index of the entity that detected the engagement.
    pub attacker: EntityIndex,
    /// Index of its target.
    pub defender: EntityIndex,
}

impl CombatPair {
    /// Create a pair.
    #[must_use]
    pub const fn new(attacker: EntityIndex, defender: EntityIndex) -> Self {
        Self { attacker, defender }
    }
}

/// Find every engagement in the current arena.
///
/// For each unordered pair of living entities at most one directed pair is
/// produced, preferring the lower index as attacker when both directions
/// would qualify.
#[must_use]
pub fn detect_combats(entities: &[Entity]) -> Vec<CombatPair> {
    let mut pairs = Vec::new();
    for (i, first) in entities.iter().enumerate() {
        if !first.is_alive() {
            continue;
        }
        for (j, second) in entities.iter().enumerate().skip(i + 1) {
            if !second.is_alive() {
                continue;
            }
            if first.can_defeat(second) {
                pairs.push(CombatPair::new(i, j));
            } else if second.can_defeat(first) {
                pairs.push(CombatPair::new(j, i));
            }
        }
    }
    pairs
}

/// Roll one six-sided die.
pub fn roll_d6<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=6)
}

/// The two dice rolled for one engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRolls {
    /// Attacker's roll.
    pub attacker: u8,
    /// Defender's roll.
    pub defender: u8,
}

impl DiceRolls {
    /// Fixed rolls.
    #[must_use]
    pub const fn new(attacker: u8, defender: u8) -> Self {
        Self { attacker, defender }
    }

    /// Roll both dice, attacker first.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let attacker = roll_d6(rng);
        let defender = roll_d6(rng);
        Self { attacker, defender }
    }
}

/// How an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// The defender was killed.
    AttackerVictory,
    /// The attacker was killed.
    DefenderVictory,
    /// Nobody died.
    NoContest,
}

impl CombatOutcome {
    /// Decide an engagement from the kinds involved and the rolls.
    #[must_use]
    pub const fn decide(attacker: Kind, defender: Kind, rolls: DiceRolls) -> Self {
        if attacker.has_advantage_over(defender) && rolls.attacker > rolls.defender {
            Self::AttackerVictory
        } else if defender.has_advantage_over(attacker) && rolls.defender > rolls.attacker {
            Self::DefenderVictory
        } else {
            Self::NoContest
        }
    }
}

/// Result of one resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// An index was invalid or an entity was already dead. Nothing changed.
    Stale,
    /// The engagement was fought.
    Resolved {
        /// Outcome.
        outcome: CombatOutcome,
        /// Rolls used.
        rolls: DiceRolls,
    },
}

/// Description of what resolving a pair would do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementReport {
    /// Attacker as it is now.
    pub attacker: EntityView,
    /// Defender as it is now.
    pub defender: EntityView,
    /// Rolls considered.
    pub rolls: DiceRolls,
    /// Resulting outcome.
    pub outcome: CombatOutcome,
    /// Entities still standing afterwards.
    pub survivors: Vec<EntityView>,
}

/// Work out the result of `pair` with the given rolls without changing the
/// arena. Returns `None` for a stale pair.
#[must_use]
pub fn simulate(arena: &Arena, pair: CombatPair, rolls: DiceRolls) -> Option<EngagementReport> {
    if !(arena.is_alive(pair.attacker) && arena.is_alive(pair.defender)) {
        return None;
    }
    let attacker = arena.view(pair.attacker)?;
    let defender = arena.view(pair.defender)?;
    let outcome = CombatOutcome::decide(attacker.kind, defender.kind, rolls);
    let survivors = match outcome {
        CombatOutcome::AttackerVictory => vec![attacker.clone()],
        CombatOutcome::DefenderVictory => vec![defender.clone()],
        CombatOutcome::NoContest => vec![attacker.clone(), defender.clone()],
    };
    Some(EngagementReport {
        attacker,
        defender,
        rolls,
        outcome,
        survivors,
    })
}

/// Tallies from one or more resolver passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainSummary {
    /// Pairs that were fought.
    pub resolved: usize,
    /// Pairs discarded as stale.
    pub stale: usize,
    /// Fought pairs that ended with a death.
    pub battles: usize,
    /// Fought pairs that ended with no death.
    pub no_contest: usize,
}

impl DrainSummary {
    /// Count one resolution.
    pub fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Stale => self.stale += 1,
            Resolution::Resolved { outcome, .. } => {
                self.resolved += 1;
                if outcome == CombatOutcome::NoContest {
                    self.no_contest += 1;
                } else {
                    self.battles += 1;
                }
            }
        }
    }

    /// Pairs processed in total.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.resolved + self.stale
    }
}

impl AddAssign for DrainSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.resolved += rhs.resolved;
        self.stale += rhs.stale;
        self.battles += rhs.battles;
        self.no_contest += rhs.no_contest;
    }
}

/// Settles queued engagements with its own dice.
#[derive(Debug)]
pub struct CombatResolver<R> {
    rng: R,
    sinks: Arc<SinkSet>,
}

impl<R: Rng> CombatResolver<R> {
    /// Create a resolver that rolls with `rng` and reports battles to `sinks`.
    pub fn new(rng: R, sinks: Arc<SinkSet>) -> Self {
        Self { rng, sinks }
    }

    /// Roll for and resolve one pair.
    ///
    /// Stale pairs are discarded before any dice are rolled.
    pub fn resolve(&mut self, arena: &mut Arena, pair: CombatPair) -> Resolution {
        if !(arena.is_alive(pair.attacker) && arena.is_alive(pair.defender)) {
            tracing::trace!(?pair, "stale pair discarded");
            return Resolution::Stale;
        }
        let rolls = DiceRolls::roll(&mut self.rng);
        self.resolve_with_rolls(arena, pair, rolls)
    }

    /// Resolve one pair with caller-supplied rolls.
    pub fn resolve_with_rolls(
        &self,
        arena: &mut Arena,
        pair: CombatPair,
        rolls: DiceRolls,
    ) -> Resolution {
        let Some(report) = simulate(arena, pair, rolls) else {
            tracing::trace!(?pair, "stale pair discarded");
            return Resolution::Stale;
        };
        let (victor, defeated) = match report.outcome {
            CombatOutcome::AttackerVictory => (report.attacker, report.defender),
            CombatOutcome::DefenderVictory => (report.defender, report.attacker),
            CombatOutcome::NoContest => {
                tracing::trace!(?pair, ?rolls, "no contest");
                return Resolution::Resolved {
                    outcome: report.outcome,
                    rolls,
                };
            }
        };
        arena.kill(defeated.index);
        let defeated = EntityView {
            alive: false,
            ..defeated
        };
        tracing::trace!(victor = %victor.name, defeated = %defeated.name, ?rolls, "battle");
        self.sinks.battle(&victor, &defeated);
        Resolution::Resolved {
            outcome: report.outcome,
            rolls,
        }
    }

    /// Resolve pairs in order.
    pub fn resolve_all<I>(&mut self, arena: &mut Arena, pairs: I) -> DrainSummary
    where
        I: IntoIterator<Item = CombatPair>,
    {
        let mut summary = DrainSummary::default();
        for pair in pairs {
            summary.record(self.resolve(arena, pair));
        }
        summary
    }

    /// Empty `queue` completely and resolve everything in it.
    ///
    /// The caller holds the registry write lock for `arena`; the queue lock
    /// is only taken briefly to take the pairs out.
    pub fn drain(&mut self, arena: &mut Arena, queue: &CombatQueue) -> DrainSummary {
        let pairs = queue.drain();
        self.resolve_all(arena, pairs)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::creation::CreationService;

    fn arena_with(entities: &[(Kind, f64, f64)]) -> Arena {
        let mut arena = Arena::new(CreationService::default());
        for (i, &(kind, x, y)) in entities.iter().enumerate() {
            arena.spawn(kind, x, y, &format!("e{i}")).unwrap();
        }
        arena
    }

    fn resolver() -> CombatResolver<ChaCha8Rng> {
        CombatResolver::new(ChaCha8Rng::seed_from_u64(0), Arc::new(SinkSet::new()))
    }

    #[test]
    fn test_detect_apex_over_melee_in_either_order() {
        let arena = arena_with(&[(Kind::Melee, 0.0, 0.0), (Kind::Apex, 5.0, 0.0)]);
        assert_eq!(detect_combats(arena.entities()), vec![CombatPair::new(1, 0)]);

        let arena = arena_with(&[(Kind::Apex, 5.0, 0.0), (Kind::Melee, 0.0, 0.0)]);
        assert_eq!(detect_combats(arena.entities()), vec![CombatPair::new(0, 1)]);
    }

    #[test]
    fn test_detect_same_kind_is_empty() {
        let arena = arena_with(&[(Kind::Ranged, 0.0, 0.0), (Kind::Ranged, 1.0, 0.0)]);
        assert!(detect_combats(arena.entities()).is_empty());
    }

    #[test]
    fn test_detect_respects_attacker_reach() {
        // Ranged reach 50 covers the knight; the knight could not reach back anyway.
        let arena = arena_with(&[(Kind::Melee, 0.0, 0.0), (Kind::Ranged, 40.0, 0.0)]);
        assert_eq!(detect_combats(arena.entities()), vec![CombatPair::new(1, 0)]);

        let arena = arena_with(&[(Kind::Melee, 0.0, 0.0), (Kind::Ranged, 60.0, 0.0)]);
        assert!(detect_combats(arena.entities()).is_empty());
    }

    #[test]
    fn test_detect_skips_dead() {
        let mut arena = arena_with(&[(Kind::Melee, 0.0, 0.0), (Kind::Apex, 5.0, 0.0)]);
        arena.kill(0);
        assert!(detect_combats(arena.entities()).is_empty());
    }

    #[test]
    fn test_decide() {
        let roll = DiceRolls::new;
        assert_eq!(
            CombatOutcome::decide(Kind::Apex, Kind::Melee, roll(6, 1)),
            CombatOutcome::AttackerVictory
        );
        assert_eq!(
            CombatOutcome::decide(Kind::Apex, Kind::Melee, roll(3, 5)),
            CombatOutcome::NoContest
        );
        assert_eq!(
            CombatOutcome::decide(Kind::Apex, Kind::Melee, roll(4, 4)),
            CombatOutcome::NoContest
        );
        assert_eq!(
            CombatOutcome::decide(Kind::Melee, Kind::Ranged, roll(1, 2)),
            CombatOutcome::DefenderVictory
        );
    }

    #[test]
    fn test_lower_roll_is_no_contest() {
        let mut arena = arena_with(&[(Kind::Apex, 0.0, 0.0), (Kind::Melee, 5.0, 0.0)]);
        let resolution =
            resolver().resolve_with_rolls(&mut arena, CombatPair::new(0, 1), DiceRolls::new(3, 5));
        assert_eq!(
            resolution,
            Resolution::Resolved {
                outcome: CombatOutcome::NoContest,
                rolls: DiceRolls::new(3, 5)
            }
        );
        assert!(arena.is_alive(0));
        assert!(arena.is_alive(1));
    }

    #[test]
    fn test_attacker_victory_kills_defender() {
        let mut arena = arena_with(&[(Kind::Apex, 0.0, 0.0), (Kind::Melee, 5.0, 0.0)]);
        let resolution =
            resolver().resolve_with_rolls(&mut arena, CombatPair::new(0, 1), DiceRolls::new(5, 2));
        assert!(matches!(
            resolution,
            Resolution::Resolved {
                outcome: CombatOutcome::AttackerVictory,
                ..
            }
        ));
        assert!(arena.is_alive(0));
        assert!(!arena.is_alive(1));
    }

    #[test]
    fn test_stale_pairs_in_same_drain() {
        let mut arena = arena_with(&[
            (Kind::Apex, 0.0, 0.0),
            (Kind::Melee, 5.0, 0.0),
            (Kind::Ranged, 8.0, 0.0),
        ]);
        let resolver = resolver();
        let first =
            resolver.resolve_with_rolls(&mut arena, CombatPair::new(0, 1), DiceRolls::new(6, 1));
        assert!(matches!(first, Resolution::Resolved { .. }));
        // Defender already died above.
        let second =
            resolver.resolve_with_rolls(&mut arena, CombatPair::new(2, 1), DiceRolls::new(6, 1));
        assert_eq!(second, Resolution::Stale);
        assert_eq!(
            resolver.resolve_with_rolls(&mut arena, CombatPair::new(0, 99), DiceRolls::new(6, 1)),
            Resolution::Stale
        );
    }

    #[test]
    fn test_simulate_does_not_mutate() {
        let arena = arena_with(&[(Kind::Ranged, 0.0, 0.0), (Kind::Melee, 5.0, 0.0)]);
        let report = simulate(&arena, CombatPair::new(0, 1), DiceRolls::new(6, 1)).unwrap();
        assert_eq!(report.outcome, CombatOutcome::AttackerVictory);
        assert_eq!(report.survivors.len(), 1);
        assert_eq!(report.survivors[0].name, "e0");
        assert!(arena.is_alive(1));
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut arena = arena_with(&[(Kind::Apex, 0.0, 0.0), (Kind::Melee, 5.0, 0.0)]);
        let queue = CombatQueue::new();
        queue.push_batch([CombatPair::new(0, 1), CombatPair::new(0, 1), CombatPair::new(7, 1)]);
        let summary = resolver().drain(&mut arena, &queue);
        assert_eq!(summary.processed(), 3);
        assert!(summary.stale >= 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_summary_accumulates() {
        let mut total = DrainSummary::default();
        total.record(Resolution::Stale);
        let mut other = DrainSummary::default();
        other.record(Resolution::Resolved {
            outcome: CombatOutcome::DefenderVictory,
            rolls: DiceRolls::new(1, 2),
        });
        total += other;
        assert_eq!(total.stale, 1);
        assert_eq!(total.battles, 1);
        assert_eq!(total.processed(), 2);
    }
}
