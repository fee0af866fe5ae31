use adventure_core::{CharacterRef, PlayerSlot, TouchId};
use adventure_system_input::{GamepadBinding, PointerBinding};
use adventure_world::{query, World};
use glam::Vec2;

/// Distance the pilots try to keep from their target.
const STANDOFF: f32 = 220.0;
/// Frames between trigger pulls.
const FIRE_PERIOD: u64 = 20;

/// Scripted input for one player, written through the same bindings a
/// device would use.
#[derive(Debug)]
enum Pilot {
    Gamepad {
        slot: PlayerSlot,
        pad: GamepadBinding,
    },
    Touch {
        pointer: PointerBinding,
        next_touch: u64,
        active: Option<TouchId>,
    },
}

/// Drives every joined player toward the nearest enemy.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    pilots: Vec<Pilot>,
}

impl Autopilot {
    /// Binds a pilot to every player that currently has a controller.
    ///
    /// With `touch` set the default player is steered by taps instead.
    pub(crate) fn new(world: &World, touch: bool) -> Self {
        let mut pilots = Vec::new();
        for slot in PlayerSlot::all() {
            let Some(intent) = query::intent(world, slot) else {
                continue;
            };
            if touch && slot == PlayerSlot::DEFAULT {
                pilots.push(Pilot::Touch {
                    pointer: PointerBinding::new(intent),
                    next_touch: 0,
                    active: None,
                });
            } else if query::player(world, slot)
                .is_some_and(|player| player.controller.is_some())
            {
                pilots.push(Pilot::Gamepad {
                    slot,
                    pad: GamepadBinding::new(intent),
                });
            }
        }
        Self { pilots }
    }

    /// Number of players being driven.
    pub(crate) fn len(&self) -> usize {
        self.pilots.len()
    }

    /// Writes this frame's input for every pilot.
    pub(crate) fn drive(&mut self, world: &World, frame: u64) {
        for pilot in &mut self.pilots {
            match pilot {
                Pilot::Gamepad { slot, pad } => {
                    let Some(hero) = hero_position(world, *slot) else {
                        pad.move_stick(0.0, 0.0);
                        pad.fire(false);
                        continue;
                    };
                    match nearest_enemy(world, hero) {
                        Some(enemy) => {
                            let offset = enemy - hero;
                            let travel = if offset.length() > STANDOFF {
                                offset
                            } else {
                                Vec2::ZERO
                            };
                            pad.move_stick(travel.x, travel.y);
                            pad.aim_stick(offset.x, offset.y);
                            pad.fire(frame % FIRE_PERIOD == 0);
                        }
                        None => {
                            pad.move_stick(0.0, 0.0);
                            pad.aim_stick(0.0, 0.0);
                            pad.fire(false);
                        }
                    }
                }
                Pilot::Touch {
                    pointer,
                    next_touch,
                    active,
                } => {
                    if let Some(touch) = active.take() {
                        pointer.touch_ended(touch);
                    }
                    if frame % FIRE_PERIOD != 0 {
                        continue;
                    }
                    let Some(hero) = hero_position(world, PlayerSlot::DEFAULT) else {
                        continue;
                    };
                    let Some(enemy) = nearest_enemy(world, hero) else {
                        continue;
                    };
                    let touch = TouchId::new(*next_touch);
                    *next_touch += 1;
                    if hero.distance(enemy) > STANDOFF {
                        let waypoint = hero + (enemy - hero).normalize_or_zero() * STANDOFF;
                        pointer.touch_began(touch, waypoint, false);
                    } else {
                        pointer.touch_began(touch, enemy, true);
                    }
                    *active = Some(touch);
                }
            }
        }
    }
}

fn hero_position(world: &World, slot: PlayerSlot) -> Option<Vec2> {
    let hero = query::player(world, slot)?.hero?;
    query::character(world, CharacterRef::Hero(hero))
        .filter(|snapshot| !snapshot.is_dying)
        .map(|snapshot| snapshot.position)
}

fn nearest_enemy(world: &World, from: Vec2) -> Option<Vec2> {
    let boss = query::character(world, CharacterRef::Boss);
    let caves = query::caves(world)
        .into_iter()
        .filter(|cave| !cave.withdrawn)
        .map(|cave| cave.character);
    query::goblins(world)
        .into_iter()
        .chain(boss)
        .chain(caves)
        .filter(|snapshot| !snapshot.is_dying && snapshot.health > 0.0)
        .map(|snapshot| snapshot.position)
        .min_by(|left, right| from.distance(*left).total_cmp(&from.distance(*right)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use adventure_core::{Blackboard, Command, Decision, HeroClass, Intelligence, Perception, Tuning};
    use adventure_world::{self as world, WorldBuilder};
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

    fn world_with_boss(boss: Vec2) -> World {
        let mut world = WorldBuilder::new(Tuning::default(), 4)
            .default_spawn_point(Vec2::ZERO)
            .boss(boss, Box::new(Dormant))
            .build()
            .expect("world builds");
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::StartLevel {
                class: HeroClass::Warrior,
            },
            &mut events,
        );
        world
    }

    #[test]
    fn touch_pilot_walks_toward_a_distant_enemy() {
        let world = world_with_boss(Vec2::new(1_000.0, 0.0));
        let mut autopilot = Autopilot::new(&world, true);
        assert_eq!(autopilot.len(), 1);

        autopilot.drive(&world, 0);

        let intent = query::intent(&world, PlayerSlot::DEFAULT)
            .expect("default player")
            .snapshot();
        assert!(intent.move_requested);
        assert_eq!(intent.target_location, Some(Vec2::new(STANDOFF, 0.0)));
        assert!(!intent.fire_action);
    }

    #[test]
    fn touch_pilot_taps_a_nearby_enemy() {
        let world = world_with_boss(Vec2::new(100.0, 0.0));
        let mut autopilot = Autopilot::new(&world, true);

        autopilot.drive(&world, 0);
        let intent = query::intent(&world, PlayerSlot::DEFAULT).expect("default player");
        assert!(intent.snapshot().fire_action);

        autopilot.drive(&world, 1);
        assert!(!intent.snapshot().fire_action, "lifting the touch stops firing");
    }

    #[test]
    fn players_without_controllers_are_left_alone() {
        let world = world_with_boss(Vec2::new(100.0, 0.0));
        assert_eq!(Autopilot::new(&world, false).len(), 0);
    }
}
