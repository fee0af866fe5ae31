#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Adventure.
//!
//! The world owns every hero, cave, goblin, the boss, projectiles, players,
//! the camera and the scenery. It changes only through [`apply`], which
//! executes a [`Command`], and [`tick`], which advances the simulation clock.
//! Both report what happened as [`Event`] values.

use std::{f32::consts::PI, time::Duration};

use adventure_core::{
    geometry::unit_random, AnimationState, CaveId, CharacterKind, CharacterRef, CombatTuning,
    Command, Decision, Effect, Event, FadePart, GoblinId, HeroId, HeroSighting, Intelligence,
    KindProfile, LineOfSight, NodeRef, Perception, PlayerSlot, ProjectileId, SmokeChange,
    SoundCue, Tuning, TuningError, MAX_PLAYERS,
};
use glam::Vec2;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

mod camera;
mod cave;
mod character;
mod combat;
mod deadline;
mod player;
mod projectile;
mod scenery;

use camera::Camera;
use cave::{Cave, Enemy, Goblin, GoblinAllocation};
use character::Character;
use deadline::{Deadlines, Deferred};
use player::{Hero, Player};
use projectile::Projectile;
use scenery::Scenery;

pub use scenery::{LeafVariant, TreeSize};

/// Errors raised while assembling a world.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    /// The tuning record cannot drive a simulation.
    #[error("invalid tuning: {0}")]
    InvalidTuning(#[from] TuningError),
    /// No default spawn point was provided.
    #[error("world has no default spawn point")]
    MissingSpawnPoint,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct WallBox {
    center: Vec2,
    half_extents: Vec2,
}

/// Represents the authoritative Adventure world state.
#[derive(Debug)]
pub struct World {
    tuning: Tuning,
    rng: ChaCha8Rng,
    clock: Duration,
    tick_index: u64,
    default_spawn_point: Vec2,
    heroes: Vec<Hero>,
    next_hero_id: u32,
    boss: Option<Enemy>,
    caves: Vec<Cave>,
    allocation: GoblinAllocation,
    projectiles: Vec<Projectile>,
    next_projectile_id: u32,
    players: [Option<Player>; MAX_PLAYERS],
    camera: Camera,
    scenery: Scenery,
    walls: Vec<WallBox>,
    deadlines: Deadlines,
    sightings: Vec<HeroSighting>,
    due: Vec<Deferred>,
}

impl World {
    /// Drops every pending deferred action, for example when a level resets.
    ///
    /// Dying goblins are recycled at once so their pool slots are not lost
    /// along with their pending removal.
    pub fn cancel_deferred(&mut self, out_events: &mut Vec<Event>) {
        self.deadlines.clear();
        let dying: Vec<GoblinId> = self
            .caves
            .iter()
            .flat_map(|cave| cave.active())
            .filter(|goblin| goblin.enemy.character.is_dying())
            .map(|goblin| goblin.id)
            .collect();
        for goblin in dying {
            self.recycle_goblin(goblin, out_events);
        }
    }

    fn next_hero_id(&mut self) -> HeroId {
        let id = HeroId::new(self.next_hero_id);
        self.next_hero_id = self.next_hero_id.wrapping_add(1);
        id
    }

    fn next_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    fn hero(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.iter().find(|hero| hero.id == id)
    }

    fn living_hero_mut(&mut self, id: HeroId) -> Option<&mut Hero> {
        self.heroes
            .iter_mut()
            .find(|hero| hero.id == id && !hero.character.is_dying())
    }

    fn goblin_mut(&mut self, id: GoblinId) -> Option<&mut Goblin> {
        self.caves
            .iter_mut()
            .find(|cave| cave.id == id.cave())
            .and_then(|cave| cave.goblin_mut(id))
    }

    fn character(&self, who: CharacterRef) -> Option<&Character> {
        match who {
            CharacterRef::Hero(id) => self.hero(id).map(|hero| &hero.character),
            CharacterRef::Goblin(id) => self
                .caves
                .iter()
                .find(|cave| cave.id == id.cave())
                .and_then(|cave| cave.active().iter().find(|goblin| goblin.id == id))
                .map(|goblin| &goblin.enemy.character),
            CharacterRef::Boss => self.boss.as_ref().map(|boss| &boss.character),
            CharacterRef::Cave(id) => self
                .caves
                .iter()
                .find(|cave| cave.id == id)
                .map(|cave| &cave.enemy.character),
        }
    }

    fn character_mut(&mut self, who: CharacterRef) -> Option<&mut Character> {
        match who {
            CharacterRef::Hero(id) => self
                .heroes
                .iter_mut()
                .find(|hero| hero.id == id)
                .map(|hero| &mut hero.character),
            CharacterRef::Goblin(id) => self.goblin_mut(id).map(|goblin| &mut goblin.enemy.character),
            CharacterRef::Boss => self.boss.as_mut().map(|boss| &mut boss.character),
            CharacterRef::Cave(id) => self
                .caves
                .iter_mut()
                .find(|cave| cave.id == id)
                .map(|cave| &mut cave.enemy.character),
        }
    }

    /// Hero the visibility refresh is centered on: the default player's
    /// hero, falling back to the first hero in the roster.
    fn tracked_hero(&self) -> Option<&Hero> {
        self.players[PlayerSlot::DEFAULT.index()]
            .as_ref()
            .and_then(|player| player.hero)
            .and_then(|id| self.hero(id))
            .or_else(|| self.heroes.first())
    }

    fn refresh_sightings(&mut self) {
        self.sightings.clear();
        self.sightings.extend(self.heroes.iter().map(|hero| HeroSighting {
            id: hero.id,
            position: hero.character.position(),
            is_dying: hero.character.is_dying(),
        }));
        self.sightings.sort_by_key(|sighting| sighting.id);
    }

    fn update_heroes(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut launches = Vec::new();
        for hero in &mut self.heroes {
            let who = CharacterRef::Hero(hero.id);
            let completed = animate(&mut hero.character, who, dt, &self.tuning.combat, out_events);
            for state in completed {
                match state {
                    AnimationState::Attack if !hero.character.is_dying() => {
                        launches.push((
                            hero.player,
                            hero.character.position(),
                            hero.character.rotation(),
                        ));
                    }
                    AnimationState::Death => {
                        let linger = secs(hero.character.profile().linger);
                        self.deadlines
                            .schedule(self.clock + linger, Deferred::HeroKilled(hero.id));
                    }
                    _ => {}
                }
            }
        }

        for (owner, position, rotation) in launches {
            self.fire_projectile(owner, position, rotation, out_events);
        }
    }

    fn update_boss(&mut self, dt: Duration, sight: &dyn LineOfSight, out_events: &mut Vec<Event>) {
        let World {
            boss,
            sightings,
            rng,
            deadlines,
            tuning,
            clock,
            ..
        } = self;
        let Some(boss) = boss.as_mut() else {
            return;
        };

        let completed = animate(&mut boss.character, CharacterRef::Boss, dt, &tuning.combat, out_events);
        if completed.contains(&AnimationState::Death) {
            schedule_corpse_removal(
                deadlines,
                *clock,
                CharacterRef::Boss,
                boss.character.profile(),
                Deferred::WithdrawBoss,
            );
        }

        let decision = think(boss, sightings, sight, dt, rng);
        act(&mut boss.character, decision, dt);
    }

    fn update_caves(&mut self, dt: Duration, sight: &dyn LineOfSight, out_events: &mut Vec<Event>) {
        let World {
            caves,
            sightings,
            rng,
            allocation,
            deadlines,
            tuning,
            clock,
            ..
        } = self;

        for cave in caves.iter_mut() {
            let who = CharacterRef::Cave(cave.id);
            let _ = animate(&mut cave.enemy.character, who, dt, &tuning.combat, out_events);
            if think(&mut cave.enemy, sightings, sight, dt, rng) == Decision::Generate {
                release_goblin(cave, allocation, tuning, out_events);
            }

            for goblin in cave.active_mut() {
                let who = CharacterRef::Goblin(goblin.id);
                let completed =
                    animate(&mut goblin.enemy.character, who, dt, &tuning.combat, out_events);
                if completed.contains(&AnimationState::Death) {
                    schedule_corpse_removal(
                        deadlines,
                        *clock,
                        who,
                        goblin.enemy.character.profile(),
                        Deferred::RecycleGoblin(goblin.id),
                    );
                }

                let decision = think(&mut goblin.enemy, sightings, sight, dt, rng);
                act(&mut goblin.enemy.character, decision, dt);
            }
        }
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let tuning = &self.tuning.projectile;
        self.projectiles.retain_mut(|projectile| {
            if projectile.advance(dt, tuning) {
                return true;
            }
            out_events.push(Event::ProjectileRemoved {
                projectile: projectile.id,
                position: projectile.position,
            });
            false
        });
    }

    fn fire_projectile(
        &mut self,
        owner: PlayerSlot,
        position: Vec2,
        rotation: f32,
        out_events: &mut Vec<Event>,
    ) {
        let id = self.next_projectile_id();
        self.projectiles
            .push(Projectile::launch(id, owner, position, rotation));
        out_events.push(Event::ProjectileFired {
            projectile: id,
            player: owner,
            position,
            rotation,
        });
        out_events.push(Event::EffectRequested {
            effect: Effect::PlaySound {
                cue: SoundCue::MagicMissile,
                position,
            },
        });
    }

    fn run_due_deadlines(&mut self, out_events: &mut Vec<Event>) {
        let mut due = std::mem::take(&mut self.due);
        self.deadlines.drain_due(self.clock, &mut due);
        for action in due.drain(..) {
            self.run_deferred(action, out_events);
        }
        self.due = due;
    }

    fn run_deferred(&mut self, action: Deferred, out_events: &mut Vec<Event>) {
        match action {
            Deferred::HeroKilled(hero) => self.hero_killed(hero, out_events),
            Deferred::FadeOut {
                character,
                duration,
            } => out_events.push(Event::EffectRequested {
                effect: Effect::Fade {
                    character,
                    part: FadePart::Body,
                    to_alpha: 0.0,
                    duration,
                },
            }),
            Deferred::RecycleGoblin(goblin) => self.recycle_goblin(goblin, out_events),
            Deferred::WithdrawBoss => {
                if self.boss.take().is_some() {
                    info!("boss withdrawn");
                    out_events.push(Event::CharacterRemoved {
                        character: CharacterRef::Boss,
                    });
                }
            }
            Deferred::WithdrawCave(id) => {
                if let Some(cave) = self.caves.iter_mut().find(|cave| cave.id == id) {
                    cave.withdraw();
                    self.scenery.release_cave(id);
                    out_events.push(Event::CharacterRemoved {
                        character: CharacterRef::Cave(id),
                    });
                }
            }
            Deferred::Smoke { cave, birth_rate } => out_events.push(Event::EffectRequested {
                effect: Effect::CaveSmoke {
                    cave,
                    change: SmokeChange::BirthRate(birth_rate),
                },
            }),
            Deferred::ClearSmoke(cave) => out_events.push(Event::EffectRequested {
                effect: Effect::CaveSmoke {
                    cave,
                    change: SmokeChange::Faded,
                },
            }),
        }
    }

    fn generate_goblin(&mut self, cave: CaveId, out_events: &mut Vec<Event>) {
        let World {
            caves,
            allocation,
            tuning,
            ..
        } = self;
        match caves.iter_mut().find(|candidate| candidate.id == cave) {
            Some(cave) => release_goblin(cave, allocation, tuning, out_events),
            None => debug!("ignoring generate request for unknown cave {}", cave.get()),
        }
    }

    fn recycle_goblin(&mut self, goblin: GoblinId, out_events: &mut Vec<Event>) {
        let World {
            caves, allocation, ..
        } = self;
        let Some(cave) = caves.iter_mut().find(|cave| cave.id == goblin.cave()) else {
            debug!("ignoring recycle request for goblin of unknown cave");
            return;
        };
        if cave.recycle(goblin, allocation) {
            out_events.push(Event::CharacterRemoved {
                character: CharacterRef::Goblin(goblin),
            });
            out_events.push(Event::GoblinRecycled { goblin });
        }
    }

    fn track_heroes(&mut self, out_events: &mut Vec<Event>) {
        let margin = self.tuning.camera.edge_margin;
        let mut shifted = false;
        for slot in PlayerSlot::all() {
            let Some(hero) = self.players[slot.index()]
                .as_ref()
                .and_then(|player| player.hero)
                .and_then(|id| self.hero(id))
            else {
                continue;
            };
            let position = hero.character.position();
            shifted |= self.camera.follow(position, margin);
        }
        if shifted {
            out_events.push(Event::CameraMoved {
                offset: self.camera.offset(),
            });
        }
    }

    fn refresh_visibility(&mut self, forced: bool, out_events: &mut Vec<Event>) {
        let moved = self.camera.moved() || forced;
        if let Some(tracked) = self.tracked_hero().map(|hero| hero.character.position()) {
            let heroes: Vec<Vec2> = self
                .heroes
                .iter()
                .map(|hero| hero.character.position())
                .collect();
            self.scenery.refresh(
                tracked,
                &heroes,
                moved,
                &self.tuning.camera,
                out_events,
            );
        }
        self.camera.clear_moved();
    }

    fn center_camera_on(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        self.camera.center_on(position);
        out_events.push(Event::CameraMoved {
            offset: self.camera.offset(),
        });
    }
}

/// Assembles a [`World`] from authored placements and injected strategies.
#[derive(Debug)]
pub struct WorldBuilder {
    tuning: Tuning,
    rng: ChaCha8Rng,
    default_spawn_point: Option<Vec2>,
    boss: Option<Enemy>,
    caves: Vec<Cave>,
    scenery: Scenery,
    walls: Vec<WallBox>,
}

impl WorldBuilder {
    /// Creates a builder whose world draws randomness from `seed`.
    #[must_use]
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
            default_spawn_point: None,
            boss: None,
            caves: Vec::new(),
            scenery: Scenery::default(),
            walls: Vec::new(),
        }
    }

    /// Sets the point heroes appear at when no living hero exists.
    #[must_use]
    pub fn default_spawn_point(mut self, position: Vec2) -> Self {
        self.default_spawn_point = Some(position);
        self
    }

    /// Places the boss, driven by the provided strategy.
    #[must_use]
    pub fn boss(mut self, position: Vec2, intelligence: Box<dyn Intelligence>) -> Self {
        let character = Character::new(CharacterKind::Boss, &self.tuning.boss, position, 0.0);
        self.boss = Some(Enemy::new(character, intelligence));
        self
    }

    /// Places a cave and fills its pool with goblins.
    ///
    /// `goblin_intelligence` is called once per pooled goblin.
    #[must_use]
    pub fn cave<F>(
        mut self,
        position: Vec2,
        rotation: f32,
        intelligence: Box<dyn Intelligence>,
        mut goblin_intelligence: F,
    ) -> Self
    where
        F: FnMut() -> Box<dyn Intelligence>,
    {
        let id = CaveId::new(self.caves.len() as u32);
        let spawning = &self.tuning.spawning;
        let goblins = (0..spawning.goblins_per_cave)
            .map(|index| {
                let mut character =
                    Character::new(CharacterKind::Goblin, &self.tuning.goblin, position, 0.0);
                let speed = unit_random(&mut self.rng);
                let scale = spawning.min_scale + unit_random(&mut self.rng) * spawning.scale_variance;
                character.vary(speed, scale);
                Goblin {
                    id: GoblinId::new(id, index as u32),
                    enemy: Enemy::new(character, goblin_intelligence()),
                }
            })
            .collect();

        let body = Character::new(CharacterKind::Cave, &self.tuning.cave, position, rotation);
        let mut enemy = Enemy::new(body, intelligence);
        enemy.blackboard.time_until_next_generate =
            spawning.interval_min + spawning.interval_variance * unit_random(&mut self.rng);
        self.caves.push(Cave::new(id, enemy, goblins));
        self.scenery.anchor_cave(id, position);
        self
    }

    /// Plants a tree with a random orientation.
    #[must_use]
    pub fn tree(mut self, position: Vec2, size: TreeSize) -> Self {
        let rotation = unit_random(&mut self.rng) * PI * 2.0;
        let leaves = if self.rng.gen_bool(0.5) {
            LeafVariant::A
        } else {
            LeafVariant::B
        };
        self.scenery.plant(position, rotation, size, leaves);
        self
    }

    /// Adds an axis-aligned wall that blocks movement and line of sight.
    #[must_use]
    pub fn wall(mut self, center: Vec2, half_extents: Vec2) -> Self {
        self.walls.push(WallBox {
            center,
            half_extents,
        });
        self
    }

    /// Validates the tuning and produces the world.
    pub fn build(self) -> Result<World, WorldError> {
        self.tuning.validate()?;
        let default_spawn_point = self
            .default_spawn_point
            .ok_or(WorldError::MissingSpawnPoint)?;

        let viewport = Vec2::new(
            self.tuning.camera.viewport_width,
            self.tuning.camera.viewport_height,
        );
        let mut players: [Option<Player>; MAX_PLAYERS] = Default::default();
        players[PlayerSlot::DEFAULT.index()] = Some(Player::new(self.tuning.players.lives));
        let allocation = GoblinAllocation::new(self.tuning.spawning.goblin_capacity);

        info!(
            "world built with {} caves, {} trees and {} walls",
            self.caves.len(),
            self.scenery.trees.len(),
            self.walls.len()
        );

        Ok(World {
            tuning: self.tuning,
            rng: self.rng,
            clock: Duration::ZERO,
            tick_index: 0,
            default_spawn_point,
            heroes: Vec::new(),
            next_hero_id: 0,
            boss: self.boss,
            caves: self.caves,
            allocation,
            projectiles: Vec::new(),
            next_projectile_id: 0,
            players,
            camera: Camera::new(viewport),
            scenery: self.scenery,
            walls: self.walls,
            deadlines: Deadlines::default(),
            sightings: Vec::new(),
            due: Vec::new(),
        })
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartLevel { class } => {
            world.ensure_player(PlayerSlot::DEFAULT).class = class;
            if let Some(hero) = world.spawn_hero(PlayerSlot::DEFAULT, out_events) {
                info!("level started with a {class:?}");
                if let Some(position) = world.hero(hero).map(|hero| hero.character.position()) {
                    world.center_camera_on(position, out_events);
                }
            }
        }
        Command::AssignController { controller, player } => {
            world.assign_controller(controller, player, out_events);
        }
        Command::ReleaseController { controller } => {
            world.release_controller(controller, out_events);
        }
        Command::SpawnHero { player } => {
            let _ = world.ensure_player(player);
            let _ = world.spawn_hero(player, out_events);
        }
        Command::StepHero { hero, direction, dt } => {
            if let Some(hero) = world.living_hero_mut(hero) {
                hero.character.move_in(direction, dt);
            }
        }
        Command::MoveHeroToward { hero, target, dt } => {
            if let Some(hero) = world.living_hero_mut(hero) {
                hero.character.move_towards(target, dt);
            }
        }
        Command::MoveHeroInDirection {
            hero,
            direction,
            facing,
            dt,
        } => {
            if let Some(hero) = world.living_hero_mut(hero) {
                hero.character.move_in_direction(direction, dt, facing);
            }
        }
        Command::FaceHero { hero, location } => {
            if let Some(hero) = world.living_hero_mut(hero) {
                let _ = hero.character.face(location);
            }
        }
        Command::HeroAttack { hero } => {
            if let Some(hero) = world.living_hero_mut(hero) {
                hero.character.perform_attack_action();
            }
        }
        Command::Contact { contact } => world.resolve_contact(contact, out_events),
        Command::PlaceBody { placement } => match placement.node {
            NodeRef::Character(who) => {
                if let Some(character) = world.character_mut(who) {
                    character.set_position(placement.position);
                }
            }
            NodeRef::Projectile(id) => {
                if let Some(projectile) = world
                    .projectiles
                    .iter_mut()
                    .find(|projectile| projectile.id == id)
                {
                    projectile.position = placement.position;
                }
            }
            NodeRef::Wall => {}
        },
        Command::TrackHeroes => world.track_heroes(out_events),
        Command::RefreshVisibility { forced } => world.refresh_visibility(forced, out_events),
        Command::ResizeViewport { size } => world.camera.resize(size),
        Command::GenerateGoblin { cave } => world.generate_goblin(cave, out_events),
        Command::RecycleGoblin { goblin } => world.recycle_goblin(goblin, out_events),
    }
}

/// Advances every character, projectile and pending deadline by `dt`.
///
/// Heroes update first, then the boss, then each cave followed by its active
/// goblins, then projectiles; deadlines that fall due fire last.
pub fn tick(world: &mut World, dt: Duration, sight: &dyn LineOfSight, out_events: &mut Vec<Event>) {
    world.tick_index = world.tick_index.saturating_add(1);
    world.clock = world.clock.saturating_add(dt);
    out_events.push(Event::TimeAdvanced { dt });

    world.refresh_sightings();
    world.update_heroes(dt, out_events);
    world.update_boss(dt, sight, out_events);
    world.update_caves(dt, sight, out_events);
    world.advance_projectiles(dt, out_events);
    world.run_due_deadlines(out_events);
}

fn secs(seconds: f32) -> Duration {
    Duration::from_secs_f32(seconds)
}

/// Steps a character's clips and reports the transitions as events.
fn animate(
    character: &mut Character,
    who: CharacterRef,
    dt: Duration,
    combat: &CombatTuning,
    out_events: &mut Vec<Event>,
) -> Vec<AnimationState> {
    let step = character.animate(dt);
    if step.completed.contains(&AnimationState::Death) {
        out_events.push(Event::EffectRequested {
            effect: Effect::Fade {
                character: who,
                part: FadePart::Shadow,
                to_alpha: 0.0,
                duration: secs(combat.shadow_fade),
            },
        });
    }
    if let Some(state) = step.started {
        out_events.push(Event::AnimationStarted {
            character: who,
            state,
        });
    }
    step.completed
}

fn schedule_corpse_removal(
    deadlines: &mut Deadlines,
    now: Duration,
    who: CharacterRef,
    profile: &KindProfile,
    removal: Deferred,
) {
    let linger = secs(profile.linger);
    let fade = secs(profile.fade_out);
    deadlines.schedule(
        now + linger,
        Deferred::FadeOut {
            character: who,
            duration: fade,
        },
    );
    deadlines.schedule(now + linger + fade, removal);
}

fn think(
    enemy: &mut Enemy,
    sightings: &[HeroSighting],
    sight: &dyn LineOfSight,
    dt: Duration,
    rng: &mut ChaCha8Rng,
) -> Decision {
    let perception = Perception::new(
        enemy.character.position(),
        enemy.character.is_dying(),
        sightings,
        sight,
    );
    enemy
        .intelligence
        .update(&perception, &mut enemy.blackboard, dt, rng)
}

fn act(character: &mut Character, decision: Decision, dt: Duration) {
    match decision {
        Decision::Chase { toward } => character.move_towards(toward, dt),
        Decision::Attack { facing } => {
            let _ = character.face(facing);
            character.perform_attack_action();
        }
        Decision::Idle | Decision::Generate => {}
    }
}

fn release_goblin(
    cave: &mut Cave,
    allocation: &mut GoblinAllocation,
    tuning: &Tuning,
    out_events: &mut Vec<Event>,
) {
    let Some((goblin, position)) = cave.generate(allocation, tuning.spawning.spawn_offset) else {
        debug!(
            "cave {} skipped generation ({} pooled, {}/{} active)",
            cave.id.get(),
            cave.inactive_len(),
            allocation.active(),
            allocation.capacity()
        );
        return;
    };
    out_events.push(Event::GoblinGenerated { goblin, position });
    out_events.push(Event::EffectRequested {
        effect: Effect::Fade {
            character: CharacterRef::Goblin(goblin),
            part: FadePart::Body,
            to_alpha: 1.0,
            duration: secs(tuning.spawning.fade_in),
        },
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use adventure_core::{
        AnimationState, CaveId, CharacterKind, CharacterRef, ColliderCategory, ControllerId,
        EmitterId, GoblinId, HeroClass, HeroId, NodeRef, PhysicsBody, PlayerSeat, PlayerSlot,
        ProjectileId, RosterView, SharedIntent, Shape, TreeId, Tuning,
    };
    use glam::Vec2;

    use super::{Character, LeafVariant, TreeSize, World};

    /// Tuning the world was built with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Simulated time elapsed since the world was built.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Point heroes appear at when no living hero exists.
    #[must_use]
    pub fn default_spawn_point(world: &World) -> Vec2 {
        world.default_spawn_point
    }

    /// Number of deferred actions waiting for their deadline.
    #[must_use]
    pub fn pending_deadlines(world: &World) -> usize {
        world.deadlines.len()
    }

    /// Captures the state of a single character.
    #[must_use]
    pub fn character(world: &World, who: CharacterRef) -> Option<CharacterSnapshot> {
        world
            .character(who)
            .map(|character| CharacterSnapshot::capture(who, character))
    }

    /// Captures every hero in roster order.
    #[must_use]
    pub fn heroes(world: &World) -> Vec<CharacterSnapshot> {
        world
            .heroes
            .iter()
            .map(|hero| CharacterSnapshot::capture(CharacterRef::Hero(hero.id), &hero.character))
            .collect()
    }

    /// Hero the camera and visibility refresh are centered on.
    #[must_use]
    pub fn tracked_hero(world: &World) -> Option<HeroId> {
        world.tracked_hero().map(|hero| hero.id)
    }

    /// Captures every goblin currently released from a cave.
    #[must_use]
    pub fn goblins(world: &World) -> Vec<CharacterSnapshot> {
        world
            .caves
            .iter()
            .flat_map(|cave| cave.active())
            .map(|goblin| {
                CharacterSnapshot::capture(CharacterRef::Goblin(goblin.id), &goblin.enemy.character)
            })
            .collect()
    }

    /// Captures every cave and the state of its pool.
    #[must_use]
    pub fn caves(world: &World) -> Vec<CaveSnapshot> {
        world
            .caves
            .iter()
            .map(|cave| CaveSnapshot {
                id: cave.id,
                character: CharacterSnapshot::capture(
                    CharacterRef::Cave(cave.id),
                    &cave.enemy.character,
                ),
                active: cave.active().iter().map(|goblin| goblin.id).collect(),
                inactive: cave.inactive_len(),
                smoking: cave.smoking(),
                withdrawn: cave.withdrawn(),
                time_until_next_generate: cave.enemy.blackboard.time_until_next_generate,
            })
            .collect()
    }

    /// Reports the shared goblin allocation.
    #[must_use]
    pub fn goblin_allocation(world: &World) -> AllocationSnapshot {
        AllocationSnapshot {
            active: world.allocation.active(),
            capacity: world.allocation.capacity(),
        }
    }

    /// Captures every live projectile.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                owner: projectile.owner,
                position: projectile.position,
                rotation: projectile.rotation,
                alpha: projectile.alpha(&world.tuning.projectile),
            })
            .collect()
    }

    /// Captures the player occupying `slot`.
    #[must_use]
    pub fn player(world: &World, slot: PlayerSlot) -> Option<PlayerSnapshot> {
        world.players[slot.index()]
            .as_ref()
            .map(|player| PlayerSnapshot {
                slot,
                hero: player.hero,
                class: player.class,
                score: player.score,
                lives_left: player.lives_left,
                controller: player.controller,
            })
    }

    /// Shared intent cell of the player occupying `slot`.
    #[must_use]
    pub fn intent(world: &World, slot: PlayerSlot) -> Option<SharedIntent> {
        world.players[slot.index()]
            .as_ref()
            .map(|player| player.intent.clone())
    }

    /// Summarizes controllers and heroes per slot for input arbitration.
    #[must_use]
    pub fn roster(world: &World) -> RosterView {
        let mut roster = RosterView::default();
        for slot in PlayerSlot::all() {
            if let Some(player) = world.players[slot.index()].as_ref() {
                roster.set_seat(
                    slot,
                    PlayerSeat {
                        controller: player.controller,
                        hero: player.hero,
                    },
                );
            }
        }
        roster
    }

    /// Reports the camera's offset, viewport and dirty flag.
    #[must_use]
    pub fn camera(world: &World) -> CameraSnapshot {
        CameraSnapshot {
            offset: world.camera.offset(),
            viewport: world.camera.viewport(),
            moved: world.camera.moved(),
        }
    }

    /// Converts a world-space point into viewport coordinates.
    #[must_use]
    pub fn screen_position(world: &World, point: Vec2) -> Vec2 {
        world.camera.screen_position(point)
    }

    /// Captures every tree.
    #[must_use]
    pub fn trees(world: &World) -> Vec<TreeSnapshot> {
        world
            .scenery
            .trees
            .iter()
            .map(|tree| TreeSnapshot {
                id: tree.id,
                position: tree.position,
                rotation: tree.rotation,
                size: tree.size,
                alpha: tree.alpha,
                emitter: tree.emitter,
            })
            .collect()
    }

    /// Captures every ambient emitter.
    #[must_use]
    pub fn emitters(world: &World) -> Vec<EmitterSnapshot> {
        world
            .scenery
            .emitters
            .iter()
            .map(|emitter| EmitterSnapshot {
                id: emitter.id,
                position: emitter.position,
                variant: emitter.variant,
                paused: emitter.paused,
            })
            .collect()
    }

    /// Fills `out` with every physics body the collaborator should simulate.
    pub fn bodies(world: &World, out: &mut Vec<PhysicsBody>) {
        out.clear();

        for hero in &world.heroes {
            out.push(PhysicsBody {
                node: NodeRef::Character(CharacterRef::Hero(hero.id)),
                category: ColliderCategory::HERO,
                collision: ColliderCategory::ALL_BUT_PROJECTILE,
                contact: ColliderCategory::GOBLIN_OR_BOSS,
                position: hero.character.position(),
                shape: circle(&hero.character),
                dynamic: true,
            });
        }

        let enemy_body = |who: CharacterRef, character: &Character| PhysicsBody {
            node: NodeRef::Character(who),
            category: ColliderCategory::GOBLIN_OR_BOSS,
            collision: ColliderCategory::ALL,
            contact: ColliderCategory::PROJECTILE,
            position: character.position(),
            shape: circle(character),
            dynamic: true,
        };

        if let Some(boss) = world.boss.as_ref().filter(|boss| boss.character.collidable()) {
            out.push(enemy_body(CharacterRef::Boss, &boss.character));
        }

        for cave in &world.caves {
            let character = &cave.enemy.character;
            if character.collidable() && !cave.withdrawn() {
                out.push(PhysicsBody {
                    node: NodeRef::Character(CharacterRef::Cave(cave.id)),
                    category: ColliderCategory::CAVE,
                    collision: ColliderCategory::ALL,
                    contact: ColliderCategory::PROJECTILE,
                    position: character.position(),
                    shape: circle(character),
                    dynamic: false,
                });
            }
            for goblin in cave.active() {
                if goblin.enemy.character.collidable() {
                    out.push(enemy_body(
                        CharacterRef::Goblin(goblin.id),
                        &goblin.enemy.character,
                    ));
                }
            }
        }

        let radius = world.tuning.projectile.radius;
        for projectile in &world.projectiles {
            out.push(PhysicsBody {
                node: NodeRef::Projectile(projectile.id),
                category: ColliderCategory::PROJECTILE,
                collision: ColliderCategory::WALL,
                contact: ColliderCategory::GOBLIN_OR_BOSS
                    | ColliderCategory::CAVE
                    | ColliderCategory::WALL,
                position: projectile.position,
                shape: Shape::Circle { radius },
                dynamic: true,
            });
        }

        for wall in &world.walls {
            out.push(PhysicsBody {
                node: NodeRef::Wall,
                category: ColliderCategory::WALL,
                collision: ColliderCategory::ALL,
                contact: ColliderCategory::NONE,
                position: wall.center,
                shape: Shape::Rect {
                    half_extents: wall.half_extents,
                },
                dynamic: false,
            });
        }
    }

    fn circle(character: &Character) -> Shape {
        Shape::Circle {
            radius: character.collision_radius(),
        }
    }

    /// Immutable representation of a single character's state.
    #[derive(Clone, Debug, PartialEq)]
    pub struct CharacterSnapshot {
        /// Reference addressing the character.
        pub character: CharacterRef,
        /// Kind of the character.
        pub kind: CharacterKind,
        /// Remaining health.
        pub health: f32,
        /// Whether the death sequence started.
        pub is_dying: bool,
        /// Whether an attack is in progress.
        pub is_attacking: bool,
        /// Whether the character still runs animation clips.
        pub animated: bool,
        /// Animation requested for the next resolution.
        pub requested_animation: AnimationState,
        /// World-space position.
        pub position: Vec2,
        /// Orientation in radians.
        pub rotation: f32,
        /// Travel speed in world units per second.
        pub movement_speed: f32,
        /// Radius of the physics body.
        pub collision_radius: f32,
        /// Whether the character still has a physics body.
        pub collidable: bool,
    }

    impl CharacterSnapshot {
        fn capture(who: CharacterRef, character: &Character) -> Self {
            Self {
                character: who,
                kind: character.kind(),
                health: character.health(),
                is_dying: character.is_dying(),
                is_attacking: character.is_attacking(),
                animated: character.animated(),
                requested_animation: character.requested_animation(),
                position: character.position(),
                rotation: character.rotation(),
                movement_speed: character.movement_speed(),
                collision_radius: character.collision_radius(),
                collidable: character.collidable(),
            }
        }
    }

    /// Immutable representation of a cave and its pool.
    #[derive(Clone, Debug, PartialEq)]
    pub struct CaveSnapshot {
        /// Identifier of the cave.
        pub id: CaveId,
        /// State of the cave's own character record.
        pub character: CharacterSnapshot,
        /// Goblins currently released, in release order.
        pub active: Vec<GoblinId>,
        /// Goblins waiting in the pool.
        pub inactive: usize,
        /// Whether the cave is smoking.
        pub smoking: bool,
        /// Whether the cave's node left the scene.
        pub withdrawn: bool,
        /// Seconds until the cave next tries to release a goblin.
        pub time_until_next_generate: f32,
    }

    /// Shared goblin allocation across every cave.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AllocationSnapshot {
        /// Goblins currently active.
        pub active: usize,
        /// Maximum goblins that may be active.
        pub capacity: usize,
    }

    /// Immutable representation of a projectile.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier of the projectile.
        pub id: ProjectileId,
        /// Player credited with the projectile's hits.
        pub owner: PlayerSlot,
        /// World-space position.
        pub position: Vec2,
        /// Orientation in radians.
        pub rotation: f32,
        /// Current opacity and damage attenuation.
        pub alpha: f32,
    }

    /// Immutable representation of a player.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PlayerSnapshot {
        /// Slot the player occupies.
        pub slot: PlayerSlot,
        /// Hero the player controls.
        pub hero: Option<HeroId>,
        /// Class of the player's heroes.
        pub class: HeroClass,
        /// Accumulated score.
        pub score: u32,
        /// Lives remaining.
        pub lives_left: i32,
        /// Controller bound to the player.
        pub controller: Option<ControllerId>,
    }

    /// Immutable representation of the camera.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct CameraSnapshot {
        /// Offset of the world layer relative to the viewport.
        pub offset: Vec2,
        /// Visible extent in world units.
        pub viewport: Vec2,
        /// Whether the camera moved since the last visibility refresh.
        pub moved: bool,
    }

    /// Immutable representation of a tree.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TreeSnapshot {
        /// Identifier of the tree.
        pub id: TreeId,
        /// World-space position.
        pub position: Vec2,
        /// Orientation in radians.
        pub rotation: f32,
        /// Size class.
        pub size: TreeSize,
        /// Current opacity.
        pub alpha: f32,
        /// Leaf emitter attached to the tree.
        pub emitter: Option<EmitterId>,
    }

    /// Immutable representation of an ambient emitter.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EmitterSnapshot {
        /// Identifier of the emitter.
        pub id: EmitterId,
        /// World-space position.
        pub position: Vec2,
        /// Template the emitter plays.
        pub variant: LeafVariant,
        /// Whether the emitter is paused.
        pub paused: bool,
    }
}
