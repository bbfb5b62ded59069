//! Proptest strategies for arena types.

use arena_core::kind::{Direction, Kind};
use arena_core::math::{Bounds, Position};
use proptest::prelude::*;

/// Any kind.
pub fn arb_kind() -> impl Strategy<Value = Kind> {
    prop::sample::select(Kind::ALL.to_vec())
}

/// Any direction.
pub fn arb_direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

/// A position inside `bounds`.
pub fn arb_position(bounds: Bounds) -> impl Strategy<Value = Position> {
    (bounds.min_x..=bounds.max_x, bounds.min_y..=bounds.max_y)
        .prop_map(|(x, y)| Position::new(x, y))
}

/// Up to `max_len` moves.
pub fn arb_moves(max_len: usize) -> impl Strategy<Value = Vec<Direction>> {
    prop::collection::vec(arb_direction(), 0..=max_len)
}

/// Up to `max_len` `(kind, position)` spawns inside `bounds`.
pub fn arb_spawns(bounds: Bounds, max_len: usize) -> impl Strategy<Value = Vec<(Kind, Position)>> {
    prop::collection::vec((arb_kind(), arb_position(bounds)), 0..=max_len)
}

/// A d6 roll.
pub fn arb_roll() -> impl Strategy<Value = u8> {
    1u8..=6
}
