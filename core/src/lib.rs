#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Adventure simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what changed. Collaborators that live outside the simulation
//! (physics, line of sight, intelligence strategies) are expressed as traits
//! so the world never depends on a concrete engine.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod geometry;
mod intelligence;
mod intent;
mod physics;
mod tuning;

pub use intelligence::{Blackboard, Decision, HeroSighting, Intelligence, Perception};
pub use intent::{PlayerIntent, SharedIntent};
pub use physics::{
    Body, ColliderCategory, Contact, LineOfSight, PhysicsBody, PhysicsCollaborator,
    PhysicsReport, Placement, Shape,
};
pub use tuning::{
    CameraTuning, ClipDurations, CombatTuning, KindProfile, PlayerTuning, ProjectileTuning,
    SpawnTuning, TimingTuning, Tuning, TuningError,
};

/// Maximum number of local players that may share the world.
pub const MAX_PLAYERS: usize = 4;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Prepares the default player's hero and centers the camera on it.
    StartLevel {
        /// Hero class the default player plays as.
        class: HeroClass,
    },
    /// Binds an input controller to the provided player slot.
    AssignController {
        /// Identity of the controller being bound.
        controller: ControllerId,
        /// Slot that receives the controller.
        player: PlayerSlot,
    },
    /// Releases the controller from whichever player currently holds it.
    ReleaseController {
        /// Identity of the controller that disconnected.
        controller: ControllerId,
    },
    /// Spawns a fresh hero for the player, replacing any living hero.
    SpawnHero {
        /// Slot of the player receiving the hero.
        player: PlayerSlot,
    },
    /// Applies a discrete keyboard-style step relative to the hero's facing.
    StepHero {
        /// Hero performing the step.
        hero: HeroId,
        /// Direction of the step.
        direction: MoveDirection,
        /// Simulated time the step covers.
        dt: Duration,
    },
    /// Moves the hero toward a point without overshooting it.
    MoveHeroToward {
        /// Hero being moved.
        hero: HeroId,
        /// World-space destination.
        target: Vec2,
        /// Simulated time the movement covers.
        dt: Duration,
    },
    /// Moves the hero along an analog direction vector.
    MoveHeroInDirection {
        /// Hero being moved.
        hero: HeroId,
        /// Normalized travel direction.
        direction: Vec2,
        /// Optional aim offset that overrides facing toward travel.
        facing: Option<Vec2>,
        /// Simulated time the movement covers.
        dt: Duration,
    },
    /// Turns the hero to face a world-space point.
    FaceHero {
        /// Hero being rotated.
        hero: HeroId,
        /// Point the hero should face.
        location: Vec2,
    },
    /// Requests that the hero begin an attack.
    HeroAttack {
        /// Hero performing the attack.
        hero: HeroId,
    },
    /// Resolves a begin-contact pair reported by the physics collaborator.
    Contact {
        /// Pair of bodies that touched.
        contact: Contact,
    },
    /// Moves a node to the position settled by the physics collaborator.
    PlaceBody {
        /// Settled node and its new position.
        placement: Placement,
    },
    /// Shifts the camera so every hero stays clear of the viewport edges.
    TrackHeroes,
    /// Recomputes tree fading, emitter pausing and parallax when required.
    RefreshVisibility {
        /// Forces the refresh even when the camera did not move.
        forced: bool,
    },
    /// Updates the size of the visible viewport.
    ResizeViewport {
        /// Width and height of the viewport in world units.
        size: Vec2,
    },
    /// Asks a cave to release one goblin from its pool.
    GenerateGoblin {
        /// Cave that should release the goblin.
        cave: CaveId,
    },
    /// Returns an active goblin to its cave's pool.
    RecycleGoblin {
        /// Goblin being returned.
        goblin: GoblinId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a hero entered the world.
    HeroSpawned {
        /// Identifier assigned to the hero.
        hero: HeroId,
        /// Player controlling the hero.
        player: PlayerSlot,
        /// Position the hero appeared at.
        position: Vec2,
    },
    /// Reports that a hero finished dying and left the world.
    HeroKilled {
        /// Hero that was removed.
        hero: HeroId,
        /// Player that controlled the hero.
        player: PlayerSlot,
    },
    /// Reports that a character's health reached zero.
    CharacterDied {
        /// Character that died.
        character: CharacterRef,
    },
    /// Reports that a character took damage and survived.
    CharacterWounded {
        /// Character that was hit.
        character: CharacterRef,
        /// Health remaining after the hit.
        health: f32,
    },
    /// Reports that a character's node was withdrawn from the scene.
    CharacterRemoved {
        /// Character that was withdrawn.
        character: CharacterRef,
    },
    /// Reports that a player lost a life and will receive a new hero.
    LifeLost {
        /// Player that lost the life.
        player: PlayerSlot,
        /// Lives remaining after the loss.
        lives_left: i32,
    },
    /// Reports that a player has no lives left.
    LivesExhausted {
        /// Player whose lives ran out.
        player: PlayerSlot,
    },
    /// Announces a player's updated score.
    ScoreChanged {
        /// Player whose score changed.
        player: PlayerSlot,
        /// Score after the change.
        score: u32,
    },
    /// Confirms that a cave released a goblin.
    GoblinGenerated {
        /// Goblin that entered the world.
        goblin: GoblinId,
        /// Position the goblin appeared at.
        position: Vec2,
    },
    /// Confirms that a goblin returned to its cave's pool.
    GoblinRecycled {
        /// Goblin that was recycled.
        goblin: GoblinId,
    },
    /// Confirms that a hero launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Player credited with the projectile's hits.
        player: PlayerSlot,
        /// Launch position.
        position: Vec2,
        /// Launch orientation.
        rotation: f32,
    },
    /// Reports that a projectile left the world.
    ProjectileRemoved {
        /// Projectile that was removed.
        projectile: ProjectileId,
        /// Last known position of the projectile.
        position: Vec2,
    },
    /// Reports that a character started a one-shot animation clip.
    AnimationStarted {
        /// Character running the clip.
        character: CharacterRef,
        /// Animation state the clip belongs to.
        state: AnimationState,
    },
    /// Reports the camera's new offset after it moved.
    CameraMoved {
        /// Offset of the world layer relative to the viewport.
        offset: Vec2,
    },
    /// Announces that a non-default player joined and received a hero.
    PlayerJoined {
        /// Slot of the player that joined.
        player: PlayerSlot,
    },
    /// Confirms that a controller was bound to a player.
    ControllerAssigned {
        /// Controller that was bound.
        controller: ControllerId,
        /// Slot that received the controller.
        player: PlayerSlot,
    },
    /// Confirms that a controller was released from a player.
    ControllerReleased {
        /// Controller that was released.
        controller: ControllerId,
        /// Slot that held the controller.
        player: PlayerSlot,
    },
    /// Reports a tree's updated opacity.
    TreeAlphaChanged {
        /// Tree whose opacity changed.
        tree: TreeId,
        /// Opacity after the change.
        alpha: f32,
    },
    /// Reports that an ambient emitter was paused or resumed.
    EmitterPauseChanged {
        /// Emitter whose state changed.
        emitter: EmitterId,
        /// Whether the emitter is now paused.
        paused: bool,
    },
    /// Reports that a background sprite stopped or resumed parallax offset updates.
    ParallaxPaused {
        /// Sprite whose state changed.
        sprite: ParallaxSprite,
        /// Whether offset updates are now paused.
        paused: bool,
    },
    /// Asks the presentation layer to perform a visual or audio side effect.
    EffectRequested {
        /// Effect to perform.
        effect: Effect,
    },
}

/// Visual and audio side effects executed outside the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Plays a particle burst at a point for a fixed duration.
    OneShotEmitter {
        /// Emitter template to play.
        kind: EmitterKind,
        /// World-space position of the burst.
        position: Vec2,
        /// How long the burst stays alive.
        duration: Duration,
    },
    /// Plays a named sound.
    PlaySound {
        /// Sound to play.
        cue: SoundCue,
        /// World-space source of the sound.
        position: Vec2,
    },
    /// Fades part of a character to the provided opacity.
    Fade {
        /// Character being faded.
        character: CharacterRef,
        /// Part of the character that fades.
        part: FadePart,
        /// Opacity at the end of the fade.
        to_alpha: f32,
        /// Duration of the fade.
        duration: Duration,
    },
    /// Flashes a character and its attached children to signal a hit.
    DamageFlash {
        /// Character that was hit.
        character: CharacterRef,
    },
    /// Leaves a decal on the ground.
    Decal {
        /// Decal template to place.
        kind: DecalKind,
        /// World-space position of the decal.
        position: Vec2,
        /// Orientation of the decal.
        rotation: f32,
    },
    /// Updates a cave's smoke emitter.
    CaveSmoke {
        /// Cave owning the smoke emitter.
        cave: CaveId,
        /// Change applied to the emitter.
        change: SmokeChange,
    },
}

/// Lifecycle steps of a damaged cave's smoke emitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SmokeChange {
    /// Smoke starts at the template's birth rate.
    Started,
    /// Particle birth rate changes.
    BirthRate(f32),
    /// Smoke fades out and the emitter is removed.
    Faded,
}

/// Emitter templates requested by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmitterKind {
    /// Short burst shown when a character takes damage.
    Damage,
    /// Burst shown when a hero enters the world.
    Spawn,
    /// Spark left behind when a projectile hits something.
    Spark,
}

/// Sounds requested by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Launch sound of a hero projectile.
    MagicMissile,
}

/// Ground decals left behind by dying characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecalKind {
    /// Splat left by a goblin.
    GoblinSplat,
    /// Rubble left by a destroyed cave.
    CaveRuin,
}

/// Part of a character targeted by a fade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FadePart {
    /// The character sprite itself.
    Body,
    /// The shadow blob drawn beneath the character.
    Shadow,
}

/// Animation states shared by every character kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimationState {
    /// Resting loop.
    Idle,
    /// Locomotion loop.
    Walk,
    /// One-shot attack.
    Attack,
    /// One-shot hit reaction.
    GetHit,
    /// Terminal death clip.
    Death,
}

impl AnimationState {
    /// Every animation state in declaration order.
    pub const ALL: [AnimationState; 5] = [
        AnimationState::Idle,
        AnimationState::Walk,
        AnimationState::Attack,
        AnimationState::GetHit,
        AnimationState::Death,
    ];

    /// Dense index of the state, suitable for per-state tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Walk => 1,
            Self::Attack => 2,
            Self::GetHit => 3,
            Self::Death => 4,
        }
    }
}

/// Discrete movement steps relative to a character's facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    /// Step along the current heading.
    Forward,
    /// Step against the current heading.
    Back,
    /// Rotate counter-clockwise.
    Left,
    /// Rotate clockwise.
    Right,
}

/// Playable hero classes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroClass {
    /// Melee-flavoured hero.
    #[default]
    Warrior,
    /// Ranged-flavoured hero.
    Archer,
}

/// Fixed roster of character kinds, each with its own behavior profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterKind {
    /// Hero of the provided class.
    Hero(HeroClass),
    /// Pooled cave spawn.
    Goblin,
    /// Singleton boss.
    Boss,
    /// Stationary goblin spawner.
    Cave,
}

/// Non-owning reference to a character stored in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharacterRef {
    /// A hero in the roster.
    Hero(HeroId),
    /// A goblin belonging to a cave.
    Goblin(GoblinId),
    /// The singleton boss.
    Boss,
    /// A cave.
    Cave(CaveId),
}

/// Background sprite whose layer offset follows the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParallaxSprite {
    /// An authored tree.
    Tree(TreeId),
    /// A cave mouth.
    Cave(CaveId),
}

/// Owning node behind a physics body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// A simulated character.
    Character(CharacterRef),
    /// A hero projectile.
    Projectile(ProjectileId),
    /// A static wall segment.
    Wall,
}

/// Unique identifier assigned to a hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeroId(u32);

impl HeroId {
    /// Creates a new hero identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a cave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaveId(u32);

impl CaveId {
    /// Creates a new cave identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a goblin, scoped to the cave that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoblinId {
    cave: CaveId,
    index: u32,
}

impl GoblinId {
    /// Creates a goblin identifier within the provided cave.
    #[must_use]
    pub const fn new(cave: CaveId, index: u32) -> Self {
        Self { cave, index }
    }

    /// Cave that owns the goblin.
    #[must_use]
    pub const fn cave(&self) -> CaveId {
        self.cave
    }

    /// Position of the goblin within its cave's roster.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of one of the local player slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    /// The always-present keyboard and touch player.
    pub const DEFAULT: PlayerSlot = PlayerSlot(0);

    /// Creates a slot, returning `None` when the index exceeds [`MAX_PLAYERS`].
    #[must_use]
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < MAX_PLAYERS).then_some(Self(index))
    }

    /// Retrieves the numeric index of the slot.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Index of the slot suitable for addressing per-player tables.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Iterates every slot in ascending order.
    pub fn all() -> impl Iterator<Item = PlayerSlot> {
        (0..MAX_PLAYERS as u8).map(PlayerSlot)
    }
}

/// Identity of an input controller as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u32);

impl ControllerId {
    /// Creates a new controller identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identity of a touch used to track drag continuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TouchId(u64);

impl TouchId {
    /// Creates a new touch identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u32);

impl TreeId {
    /// Creates a new tree identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an ambient particle emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(u32);

impl EmitterId {
    /// Creates a new emitter identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Read-only summary of the player slots used by input arbitration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterView {
    seats: [Option<PlayerSeat>; MAX_PLAYERS],
}

impl RosterView {
    /// Creates a roster view from per-slot seats.
    #[must_use]
    pub const fn new(seats: [Option<PlayerSeat>; MAX_PLAYERS]) -> Self {
        Self { seats }
    }

    /// Seat occupying the provided slot, if a player exists there.
    #[must_use]
    pub fn seat(&self, slot: PlayerSlot) -> Option<&PlayerSeat> {
        self.seats[slot.index()].as_ref()
    }

    /// Records the seat for the provided slot.
    pub fn set_seat(&mut self, slot: PlayerSlot, seat: PlayerSeat) {
        self.seats[slot.index()] = Some(seat);
    }

    /// Slot whose player currently holds the controller.
    #[must_use]
    pub fn slot_of(&self, controller: ControllerId) -> Option<PlayerSlot> {
        PlayerSlot::all().find(|slot| {
            self.seat(*slot)
                .is_some_and(|seat| seat.controller == Some(controller))
        })
    }
}

/// Controller and hero state of a single player slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerSeat {
    /// Controller bound to the player, if any.
    pub controller: Option<ControllerId>,
    /// Hero the player currently controls, if any.
    pub hero: Option<HeroId>,
}
