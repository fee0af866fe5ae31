use std::time::Duration;

use adventure_core::{
    Blackboard, CaveId, Command, Decision, Event, Intelligence, Perception, Tuning,
};
use adventure_world::{self as world, query, World, WorldBuilder};
use glam::Vec2;
use proptest::prelude::*;
use rand::RngCore;

#[derive(Debug)]
struct Dormant;

impl Intelligence for Dormant {
    fn update(
        &mut self,
        _perception: &Perception<'_>,
        _blackboard: &mut Blackboard,
        _dt: Duration,
        _rng: &mut dyn RngCore,
    ) -> Decision {
        Decision::Idle
    }
}

fn caves(count: u32, capacity: usize) -> World {
    let mut tuning = Tuning::default();
    tuning.spawning.goblin_capacity = capacity;
    (0..count)
        .fold(
            WorldBuilder::new(tuning, u64::from(count)).default_spawn_point(Vec2::ZERO),
            |builder, index| {
                builder.cave(
                    Vec2::new(index as f32 * 500.0, 0.0),
                    0.0,
                    Box::new(Dormant),
                    || Box::new(Dormant),
                )
            },
        )
        .build()
        .expect("world builds")
}

fn generate(world: &mut World, cave: u32) -> bool {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::GenerateGoblin {
            cave: CaveId::new(cave),
        },
        &mut events,
    );
    events
        .iter()
        .any(|event| matches!(event, Event::GoblinGenerated { .. }))
}

#[test]
fn exhausted_pool_generates_nothing() {
    let mut world = caves(1, 32);
    for _ in 0..5 {
        assert!(generate(&mut world, 0));
    }
    assert!(!generate(&mut world, 0));
    assert_eq!(query::caves(&world)[0].inactive, 0);
    assert_eq!(query::goblin_allocation(&world).active, 5);
}

#[test]
fn released_goblins_appear_in_front_of_the_cave() {
    let mut world = caves(1, 32);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::GenerateGoblin {
            cave: CaveId::new(0),
        },
        &mut events,
    );
    let position = events
        .iter()
        .find_map(|event| match event {
            Event::GoblinGenerated { position, .. } => Some(*position),
            _ => None,
        })
        .expect("goblin released");
    assert!((position - Vec2::new(0.0, 67.5)).length() < 1e-3);
}

proptest! {
    #[test]
    fn active_goblins_never_exceed_shared_capacity(
        cave_count in 1u32..5,
        capacity in 1usize..16,
        requests in proptest::collection::vec(0u32..5, 0..64),
    ) {
        let mut world = caves(cave_count, capacity);
        for request in requests {
            let _ = generate(&mut world, request % cave_count);
            let allocation = query::goblin_allocation(&world);
            prop_assert!(allocation.active <= allocation.capacity);

            let released: usize = query::caves(&world)
                .iter()
                .map(|cave| cave.active.len())
                .sum();
            prop_assert_eq!(released, allocation.active);
        }
    }
}
