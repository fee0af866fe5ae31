#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame update loop driving the Adventure world.
//!
//! A frame clamps the elapsed time, ticks the world, turns each player's
//! intent into hero commands, hands the bodies to the physics collaborator,
//! applies what it reports, then keeps the camera on the heroes and refreshes
//! scenery visibility.

use std::time::Duration;

use adventure_core::{
    CharacterRef, Command, Event, MoveDirection, PhysicsBody, PhysicsCollaborator, PhysicsReport,
    PlayerSlot,
};
use adventure_world::{self as world, query, World};
use log::{debug, info};

/// How the default player delivers input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Keyboard flags and controller sticks.
    #[default]
    Desktop,
    /// Touch targeting for the default player in addition to controllers.
    Handheld,
}

/// Timing of a completed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Time the world advanced by.
    pub dt: Duration,
    /// Whether a time spike was replaced by a minimum tick.
    pub clamped: bool,
}

/// Runs the simulation one frame at a time.
#[derive(Debug, Default)]
pub struct Director {
    mode: InputMode,
    last_update: Option<Duration>,
    paused: bool,
    commands: Vec<Command>,
    bodies: Vec<PhysicsBody>,
    report: PhysicsReport,
}

impl Director {
    /// Creates a director for the provided input mode.
    #[must_use]
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Input mode the director resolves intents for.
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// Whether frames currently only record their timestamp.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stops advancing the world until [`Self::resume`] is called.
    pub fn pause(&mut self) {
        if !self.paused {
            info!("simulation paused");
        }
        self.paused = true;
    }

    /// Resumes advancing the world.
    pub fn resume(&mut self) {
        if self.paused {
            info!("simulation resumed");
        }
        self.paused = false;
    }

    /// Runs one frame at timestamp `now`.
    ///
    /// Returns `None` while paused. An elapsed time above the tuning's
    /// maximum is replaced by a single minimum tick and forces a visibility
    /// refresh.
    pub fn update<P>(
        &mut self,
        world: &mut World,
        now: Duration,
        physics: &mut P,
        out_events: &mut Vec<Event>,
    ) -> Option<FrameReport>
    where
        P: PhysicsCollaborator,
    {
        let elapsed = self
            .last_update
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_update = Some(now);
        if self.paused {
            return None;
        }

        let timing = &query::tuning(world).timing;
        let (dt, clamped) = if elapsed.as_secs_f32() > timing.max_elapsed {
            (Duration::from_secs_f32(timing.min_tick), true)
        } else {
            (elapsed, false)
        };
        if clamped {
            debug!("clamped a {elapsed:?} frame to {dt:?}");
        }

        world::tick(world, dt, &*physics, out_events);
        self.resolve_intents(world, dt, out_events);
        self.simulate_physics(world, dt, physics, out_events);

        world::apply(world, Command::TrackHeroes, out_events);
        world::apply(world, Command::RefreshVisibility { forced: clamped }, out_events);

        Some(FrameReport { dt, clamped })
    }

    fn resolve_intents(&mut self, world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
        self.commands.clear();

        for slot in PlayerSlot::all() {
            let Some(hero) = query::player(world, slot).and_then(|player| player.hero) else {
                continue;
            };
            let Some(snapshot) = query::character(world, CharacterRef::Hero(hero)) else {
                continue;
            };
            if snapshot.is_dying {
                continue;
            }
            let Some(cell) = query::intent(world, slot) else {
                continue;
            };
            let intent = cell.snapshot();

            if self.mode == InputMode::Handheld && slot == PlayerSlot::DEFAULT {
                if let Some(target) = intent.target_location {
                    if intent.fire_action {
                        self.commands.push(Command::FaceHero {
                            hero,
                            location: target,
                        });
                    }
                    if intent.move_requested {
                        if target == snapshot.position {
                            cell.update(|intent| intent.move_requested = false);
                        } else {
                            self.commands
                                .push(Command::MoveHeroToward { hero, target, dt });
                        }
                    }
                }
            }

            match intent.hero_move_direction {
                Some(direction) => {
                    if direction.length() > 0.0 || intent.hero_face_location.is_some() {
                        self.commands.push(Command::MoveHeroInDirection {
                            hero,
                            direction,
                            facing: intent.hero_face_location,
                            dt,
                        });
                    }
                }
                None => {
                    if let Some(location) = intent.hero_face_location {
                        self.commands.push(Command::FaceHero { hero, location });
                    }
                    let advance = if intent.move_forward {
                        Some(MoveDirection::Forward)
                    } else if intent.move_backward {
                        Some(MoveDirection::Back)
                    } else {
                        None
                    };
                    let turn = if intent.move_left {
                        Some(MoveDirection::Left)
                    } else if intent.move_right {
                        Some(MoveDirection::Right)
                    } else {
                        None
                    };
                    for direction in [advance, turn].into_iter().flatten() {
                        self.commands.push(Command::StepHero {
                            hero,
                            direction,
                            dt,
                        });
                    }
                }
            }

            if intent.fire_action {
                self.commands.push(Command::HeroAttack { hero });
            }
        }

        for command in self.commands.drain(..) {
            world::apply(world, command, out_events);
        }
    }

    fn simulate_physics<P>(
        &mut self,
        world: &mut World,
        dt: Duration,
        physics: &mut P,
        out_events: &mut Vec<Event>,
    ) where
        P: PhysicsCollaborator,
    {
        query::bodies(world, &mut self.bodies);
        self.report.clear();
        physics.simulate(&self.bodies, dt, &mut self.report);

        for placement in &self.report.placements {
            world::apply(
                world,
                Command::PlaceBody {
                    placement: *placement,
                },
                out_events,
            );
        }
        for contact in &self.report.contacts {
            world::apply(world, Command::Contact { contact: *contact }, out_events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adventure_core::{ColliderCategory, HeroClass, LineOfSight, Tuning};
    use adventure_world::WorldBuilder;
    use glam::Vec2;

    #[derive(Default)]
    struct Still;

    impl LineOfSight for Still {
        fn raycast(&self, _from: Vec2, _to: Vec2) -> ColliderCategory {
            ColliderCategory::NONE
        }
    }

    impl PhysicsCollaborator for Still {
        fn simulate(&mut self, _bodies: &[PhysicsBody], _step: Duration, _report: &mut PhysicsReport) {}
    }

    fn started() -> (World, adventure_core::HeroId) {
        let mut world = WorldBuilder::new(Tuning::default(), 1)
            .default_spawn_point(Vec2::new(400.0, 400.0))
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
        let hero = query::player(&world, PlayerSlot::DEFAULT)
            .and_then(|player| player.hero)
            .expect("hero spawned");
        (world, hero)
    }

    #[test]
    fn time_spike_becomes_minimum_tick() {
        let (mut world, _) = started();
        let mut director = Director::new(InputMode::Desktop);
        let mut events = Vec::new();

        let _ = director.update(&mut world, Duration::ZERO, &mut Still, &mut events);
        let report = director
            .update(&mut world, Duration::from_secs(5), &mut Still, &mut events)
            .expect("running");

        assert!(report.clamped);
        assert_eq!(report.dt, Duration::from_secs_f32(1.0 / 60.0));
        assert_eq!(query::clock(&world), report.dt);
    }

    #[test]
    fn paused_frames_only_record_time() {
        let (mut world, _) = started();
        let mut director = Director::new(InputMode::Desktop);
        let mut events = Vec::new();

        director.pause();
        assert!(director
            .update(&mut world, Duration::from_secs(3), &mut Still, &mut events)
            .is_none());
        director.resume();
        let report = director
            .update(
                &mut world,
                Duration::from_secs(3) + Duration::from_millis(20),
                &mut Still,
                &mut events,
            )
            .expect("running");

        assert!(!report.clamped);
        assert_eq!(report.dt, Duration::from_millis(20));
    }

    #[test]
    fn keyboard_flags_step_the_hero() {
        let (mut world, hero) = started();
        let intent = query::intent(&world, PlayerSlot::DEFAULT).expect("default player");
        intent.update(|intent| {
            intent.move_forward = true;
            intent.move_left = true;
        });
        let mut director = Director::new(InputMode::Desktop);
        let mut events = Vec::new();

        let _ = director.update(&mut world, Duration::ZERO, &mut Still, &mut events);
        let _ = director.update(&mut world, Duration::from_millis(500), &mut Still, &mut events);

        let snapshot = query::character(&world, CharacterRef::Hero(hero)).expect("hero");
        let travelled = snapshot.position - Vec2::new(400.0, 400.0);
        assert!((travelled.length() - 100.0).abs() < 1e-2);
        assert!(travelled.y < -99.0, "forward from a spawn facing down the screen");
        assert!((snapshot.rotation - (std::f32::consts::PI + 0.12)).abs() < 1e-5);
    }

    #[test]
    fn touch_target_walks_until_arrival() {
        let (mut world, hero) = started();
        let intent = query::intent(&world, PlayerSlot::DEFAULT).expect("default player");
        intent.update(|intent| {
            intent.target_location = Some(Vec2::new(450.0, 400.0));
            intent.move_requested = true;
        });
        let mut director = Director::new(InputMode::Handheld);
        let mut events = Vec::new();

        let mut now = Duration::ZERO;
        for _ in 0..40 {
            let _ = director.update(&mut world, now, &mut Still, &mut events);
            now += Duration::from_millis(16);
        }

        let snapshot = query::character(&world, CharacterRef::Hero(hero)).expect("hero");
        assert_eq!(snapshot.position, Vec2::new(450.0, 400.0));
        assert!(!intent.snapshot().move_requested);
    }

    #[test]
    fn desktop_mode_ignores_touch_targets() {
        let (mut world, hero) = started();
        let intent = query::intent(&world, PlayerSlot::DEFAULT).expect("default player");
        intent.update(|intent| {
            intent.target_location = Some(Vec2::new(450.0, 400.0));
            intent.move_requested = true;
        });
        let mut director = Director::new(InputMode::Desktop);
        let mut events = Vec::new();

        let _ = director.update(&mut world, Duration::ZERO, &mut Still, &mut events);
        let _ = director.update(&mut world, Duration::from_millis(16), &mut Still, &mut events);

        let snapshot = query::character(&world, CharacterRef::Hero(hero)).expect("hero");
        assert_eq!(snapshot.position, Vec2::new(400.0, 400.0));
    }
}
