use std::{f32::consts::PI, time::Duration};

use adventure_core::{
    Blackboard, Body, CaveId, CharacterRef, ColliderCategory, Command, Contact, DecalKind,
    Decision, Effect, Event, GoblinId, HeroClass, HeroId, Intelligence, LineOfSight, NodeRef, Perception, PlayerSlot,
    ProjectileId, Tuning,
};
use adventure_world::{self as world, query, World, WorldBuilder};
use glam::Vec2;
use rand::RngCore;

const FRAME: Duration = Duration::from_millis(16);

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

struct OpenField;

impl LineOfSight for OpenField {
    fn raycast(&self, _from: Vec2, _to: Vec2) -> ColliderCategory {
        ColliderCategory::NONE
    }
}

fn arena(tuning: Tuning) -> (World, HeroId) {
    let mut world = WorldBuilder::new(tuning, 0x5eed)
        .default_spawn_point(Vec2::ZERO)
        .cave(Vec2::new(600.0, 0.0), 0.0, Box::new(Dormant), || Box::new(Dormant))
        .boss(Vec2::new(-600.0, 0.0), Box::new(Dormant))
        .build()
        .expect("arena builds");
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::StartLevel {
            class: HeroClass::Archer,
        },
        &mut events,
    );
    let hero = events
        .iter()
        .find_map(|event| match event {
            Event::HeroSpawned { hero, .. } => Some(*hero),
            _ => None,
        })
        .expect("hero spawned");
    (world, hero)
}

fn step(world: &mut World, frames: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..frames {
        world::tick(world, FRAME, &OpenField, &mut events);
    }
    events
}

fn fire(world: &mut World, hero: HeroId) -> ProjectileId {
    let mut events = Vec::new();
    world::apply(world, Command::HeroAttack { hero }, &mut events);
    for _ in 0..120 {
        events.clear();
        world::tick(world, FRAME, &OpenField, &mut events);
        let fired = events.iter().find_map(|event| match event {
            Event::ProjectileFired { projectile, .. } => Some(*projectile),
            _ => None,
        });
        if let Some(projectile) = fired {
            return projectile;
        }
    }
    panic!("hero never fired");
}

fn hit(world: &mut World, target: CharacterRef, projectile: ProjectileId) -> Vec<Event> {
    let category = match target {
        CharacterRef::Cave(_) => ColliderCategory::CAVE,
        CharacterRef::Hero(_) => ColliderCategory::HERO,
        CharacterRef::Goblin(_) | CharacterRef::Boss => ColliderCategory::GOBLIN_OR_BOSS,
    };
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Contact {
            contact: Contact {
                a: Body {
                    category: ColliderCategory::PROJECTILE,
                    node: Some(NodeRef::Projectile(projectile)),
                },
                b: Body {
                    category,
                    node: Some(NodeRef::Character(target)),
                },
            },
        },
        &mut events,
    );
    events
}

fn release_goblin(world: &mut World) -> GoblinId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::GenerateGoblin {
            cave: CaveId::new(0),
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::GoblinGenerated { goblin, .. } => Some(*goblin),
            _ => None,
        })
        .expect("goblin released")
}

#[test]
fn goblin_dies_after_two_light_hits_and_returns_to_pool() {
    let mut tuning = Tuning::default();
    tuning.combat.goblin_heavy_damage = 50.0;
    let (mut world, hero) = arena(tuning);
    let goblin = release_goblin(&mut world);
    let who = CharacterRef::Goblin(goblin);

    let projectile = fire(&mut world, hero);
    let events = hit(&mut world, who, projectile);
    assert!(events.contains(&Event::CharacterWounded {
        character: who,
        health: 50.0,
    }));

    let projectile = fire(&mut world, hero);
    let events = hit(&mut world, who, projectile);
    assert!(events.contains(&Event::CharacterDied { character: who }));
    assert!(events.contains(&Event::ScoreChanged {
        player: PlayerSlot::DEFAULT,
        score: 10,
    }));

    let snapshot = query::character(&world, who).expect("corpse lingers");
    assert!(snapshot.is_dying);
    assert!(!snapshot.collidable);

    let events = step(&mut world, 250);
    assert!(events.contains(&Event::GoblinRecycled { goblin }));
    assert_eq!(query::goblin_allocation(&world).active, 0);
    assert_eq!(query::caves(&world)[0].inactive, 5);
    assert!(query::character(&world, who).is_none());
}

#[test]
fn goblin_splats_land_at_random_angles() {
    let mut tuning = Tuning::default();
    tuning.combat.goblin_heavy_damage = 50.0;
    let (mut world, hero) = arena(tuning);
    let goblins = [release_goblin(&mut world), release_goblin(&mut world)];

    let mut splats = Vec::new();
    for goblin in goblins {
        let who = CharacterRef::Goblin(goblin);
        let facing = query::character(&world, who).expect("goblin active").rotation;
        for _ in 0..2 {
            let projectile = fire(&mut world, hero);
            for event in hit(&mut world, who, projectile) {
                if let Event::EffectRequested {
                    effect:
                        Effect::Decal {
                            kind: DecalKind::GoblinSplat,
                            rotation,
                            ..
                        },
                } = event
                {
                    splats.push((facing, rotation));
                }
            }
        }
    }

    assert_eq!(splats.len(), 2);
    for (facing, rotation) in &splats {
        assert!((0.0..PI).contains(rotation));
        assert_ne!(facing, rotation);
    }
    assert_ne!(splats[0].1, splats[1].1);
}

#[test]
fn consumed_projectile_cannot_hit_twice() {
    let (mut world, hero) = arena(Tuning::default());
    let projectile = fire(&mut world, hero);

    let _ = hit(&mut world, CharacterRef::Boss, projectile);
    let events = hit(&mut world, CharacterRef::Boss, projectile);

    assert!(events.is_empty());
    let boss = query::character(&world, CharacterRef::Boss).expect("boss present");
    assert_eq!(boss.health, 98.0);
}

#[test]
fn boss_survives_forty_nine_hits_and_falls_on_the_fiftieth() {
    let (mut world, hero) = arena(Tuning::default());

    for _ in 0..49 {
        let projectile = fire(&mut world, hero);
        let _ = hit(&mut world, CharacterRef::Boss, projectile);
    }
    let boss = query::character(&world, CharacterRef::Boss).expect("boss present");
    assert!(!boss.is_dying);
    assert!((boss.health - 2.0).abs() < 1e-3);

    let projectile = fire(&mut world, hero);
    let events = hit(&mut world, CharacterRef::Boss, projectile);
    assert!(events.contains(&Event::CharacterDied {
        character: CharacterRef::Boss,
    }));
    assert_eq!(
        query::player(&world, PlayerSlot::DEFAULT).map(|player| player.score),
        Some(1_000)
    );

    let events = step(&mut world, 450);
    assert!(events.contains(&Event::CharacterRemoved {
        character: CharacterRef::Boss,
    }));
    assert!(query::character(&world, CharacterRef::Boss).is_none());
}

#[test]
fn destroyed_cave_keeps_recycling_its_goblins() {
    let mut tuning = Tuning::default();
    tuning.combat.goblin_heavy_damage = 100.0;
    tuning.combat.goblin_light_damage = 100.0;
    let (mut world, hero) = arena(tuning);
    let goblin = release_goblin(&mut world);
    let cave = CharacterRef::Cave(CaveId::new(0));

    for _ in 0..10 {
        let projectile = fire(&mut world, hero);
        let _ = hit(&mut world, cave, projectile);
    }
    let projectile = fire(&mut world, hero);
    let _ = hit(&mut world, CharacterRef::Goblin(goblin), projectile);

    let events = step(&mut world, 250);
    let caves = query::caves(&world);
    assert!(caves[0].withdrawn);
    assert!(caves[0].character.is_dying);
    assert!(events.contains(&Event::GoblinRecycled { goblin }));
    assert_eq!(query::goblin_allocation(&world).active, 0);
}
