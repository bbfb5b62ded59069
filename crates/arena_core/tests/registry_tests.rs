//! Registry tests: invariants under arbitrary moves and concurrent access.

use std::sync::Arc;
use std::thread;

use arena_core::error::ArenaError;
use arena_core::kind::{Direction, Kind};
use arena_core::math::Bounds;
use arena_core::events::SinkSet;
use arena_test_utils::fixtures::{
    empty_registry, populated_registry, registry_with_sinks, seeded_rng, RecordingSink,
};
use arena_test_utils::proptest::prelude::*;
use arena_test_utils::strategies::{arb_kind, arb_moves, arb_position};

proptest! {
    #[test]
    fn positions_stay_in_bounds(
        kind in arb_kind(),
        start in arb_position(Bounds::default()),
        moves in arb_moves(200),
    ) {
        let registry = empty_registry();
        let bounds = Bounds::default();
        let index = registry.spawn(kind, start.x, start.y, "walker").unwrap();
        for direction in moves {
            let position = registry.move_entity(index, direction).unwrap();
            prop_assert!(bounds.contains(position.x, position.y), "{position:?}");
        }
    }

    #[test]
    fn dead_never_comes_back(moves in arb_moves(50)) {
        let registry = empty_registry();
        let index = registry.spawn(Kind::Ranged, 500.0, 500.0, "ghost").unwrap();
        prop_assert!(registry.kill(index));
        for direction in moves {
            prop_assert!(registry.move_entity(index, direction).is_none());
            prop_assert!(!registry.kill(index));
            prop_assert!(!registry.is_alive(index));
        }
    }

    #[test]
    fn out_of_bounds_spawn_changes_nothing(x in 1000.001f64..5000.0, y in -5000.0f64..-0.001) {
        let registry = empty_registry();
        let err = registry.spawn(Kind::Apex, x, y, "nope").unwrap_err();
        prop_assert!(matches!(err, ArenaError::OutOfBounds { .. }), "unexpected error");
        prop_assert_eq!(registry.len(), 0);
    }
}

#[test]
fn nan_position_is_out_of_bounds() {
    let registry = empty_registry();
    assert!(matches!(
        registry.spawn(Kind::Melee, f64::NAN, 0.0, "nan"),
        Err(ArenaError::OutOfBounds { .. })
    ));
}

#[test]
fn concurrent_spawn_move_and_stats() {
    let registry = populated_registry(20, 8);
    let threads: Vec<_> = (0..4)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut rng = seeded_rng(t);
                for i in 0..200 {
                    match i % 4 {
                        0 => {
                            registry
                                .spawn(Kind::cycle(i), 10.0, 10.0, &format!("t{t}_{i}"))
                                .unwrap();
                        }
                        1 => {
                            let len = registry.len();
                            registry.move_entity(i % len, Direction::random(&mut rng));
                        }
                        2 => {
                            let stats = registry.stats();
                            assert!(stats.alive <= stats.total);
                            assert_eq!(stats.alive, stats.melee + stats.ranged + stats.apex);
                        }
                        _ => {
                            let snapshot = registry.snapshot();
                            assert!(snapshot.len() >= 20);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in threads {
        handle.join().unwrap();
    }
    assert_eq!(registry.len(), 20 + 4 * 50);
}

#[test]
fn populate_numbers_names_from_one() {
    let registry = empty_registry();
    registry.populate(3, &mut seeded_rng(1)).unwrap();
    let names: Vec<_> = registry.snapshot().into_iter().map(|v| v.name).collect();
    assert_eq!(names, ["npc_1", "npc_2", "npc_3"]);
}

#[test]
fn find_by_name_and_entity_views_agree() {
    let registry = empty_registry();
    let index = registry.spawn(Kind::Ranged, 1.0, 2.0, "legolas").unwrap();
    let by_name = registry.find_by_name("legolas").unwrap();
    assert_eq!(Some(by_name), registry.entity(index));
    assert!(registry.find_by_name("gimli").is_none());
}

#[test]
fn spawn_with_blank_name_generates_one() {
    let registry = empty_registry();
    let index = registry.spawn(Kind::Melee, 1.0, 1.0, "").unwrap();
    let name = registry.entity(index).unwrap().name;
    let suffix: u32 = name.strip_prefix("Knight_").unwrap().parse().unwrap();
    assert!((1000..=9999).contains(&suffix), "{name}");

    let dragon = registry.spawn(Kind::Apex, 2.0, 3.0, "  ").unwrap();
    assert!(registry.entity(dragon).unwrap().name.starts_with("Dragon_"));
}

#[test]
fn populate_announces_every_creature() {
    let recorder = RecordingSink::new();
    let registry = registry_with_sinks(SinkSet::new().with(recorder.clone()));
    registry.populate(4, &mut seeded_rng(8)).unwrap();

    let events = recorder.events();
    assert_eq!(events.len(), 5);
    assert!(events[0].starts_with("Created Knight 'npc_1'"));
    assert!(events[3].starts_with("Created Knight 'npc_4'"));
    assert_eq!(events[4], "Initialized 4 creatures");
}

#[test]
fn insert_all_appends_in_order() {
    let recorder = RecordingSink::new();
    let registry = registry_with_sinks(SinkSet::new().with(recorder.clone()));
    registry.spawn(Kind::Apex, 0.0, 0.0, "first").unwrap();
    let creation = *registry.read().creation();
    let batch = vec![
        creation.create(Kind::Ranged, 1.0, 1.0, "a").unwrap(),
        creation.create(Kind::Melee, 2.0, 2.0, "b").unwrap(),
    ];
    assert_eq!(registry.insert_all(batch), 1..3);
    assert_eq!(registry.find_by_name("b").unwrap().index, 2);
    assert_eq!(recorder.events().len(), 3);
}
