use std::time::Duration;

use adventure_core::{
    ColliderCategory, Command, Event, HeroClass, LineOfSight, PhysicsBody, PhysicsCollaborator,
    PhysicsReport, PlayerSlot, Tuning,
};
use adventure_system_director::{Director, InputMode};
use adventure_system_intelligence::{ChaseIntelligence, SpawnIntelligence};
use adventure_world::{self as world, query, WorldBuilder};
use glam::Vec2;

struct OpenField;

impl LineOfSight for OpenField {
    fn raycast(&self, _from: Vec2, _to: Vec2) -> ColliderCategory {
        ColliderCategory::NONE
    }
}

impl PhysicsCollaborator for OpenField {
    fn simulate(&mut self, _bodies: &[PhysicsBody], _step: Duration, _report: &mut PhysicsReport) {}
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    score: u32,
    goblins: usize,
    clock: Duration,
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut tuning = Tuning::default();
    tuning.spawning.interval_min = 0.5;
    tuning.spawning.interval_variance = 1.0;
    let spawning = tuning.spawning.clone();
    let goblin = tuning.goblin.clone();
    let boss = tuning.boss.clone();

    let mut world = WorldBuilder::new(tuning, seed)
        .default_spawn_point(Vec2::new(0.0, 0.0))
        .boss(
            Vec2::new(-900.0, 0.0),
            Box::new(ChaseIntelligence::for_profile(&boss)),
        )
        .cave(
            Vec2::new(400.0, 0.0),
            0.0,
            Box::new(SpawnIntelligence::new(
                spawning.interval_min,
                spawning.interval_variance,
            )),
            || Box::new(ChaseIntelligence::for_profile(&goblin)),
        )
        .build()
        .expect("world builds");

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::StartLevel {
            class: HeroClass::Archer,
        },
        &mut events,
    );
    let intent = query::intent(&world, PlayerSlot::DEFAULT).expect("default player");

    let mut director = Director::new(InputMode::Desktop);
    let mut now = Duration::ZERO;
    for frame in 0..600_u32 {
        intent.update(|intent| {
            intent.fire_action = frame % 45 == 0;
            intent.move_left = frame % 120 < 10;
        });
        let _ = director.update(&mut world, now, &mut OpenField, &mut events);
        now += Duration::from_millis(16);
    }

    ReplayOutcome {
        events,
        score: query::player(&world, PlayerSlot::DEFAULT).map_or(0, |player| player.score),
        goblins: query::goblins(&world).len(),
        clock: query::clock(&world),
    }
}

#[test]
fn director_replay_is_deterministic() {
    let first = replay(0x5eed);
    let second = replay(0x5eed);

    assert!(!first.events.is_empty(), "replay should produce events");
    assert_eq!(first, second, "replay diverged between runs");
}
