use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AnimationState, CharacterKind, HeroClass};

const HERO_FRAME_TIME: f32 = 1.0 / 28.0;
const BOSS_FRAME_TIME: f32 = 1.0 / 35.0;

/// Errors raised when a tuning record cannot drive a simulation.
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    /// A pool or roster capacity was configured as zero.
    #[error("`{field}` must be greater than zero")]
    ZeroCapacity {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A duration, speed or distance was negative or not finite.
    #[error("`{field}` must be a finite, non-negative number (got {value})")]
    InvalidQuantity {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The viewport cannot keep a hero clear of both opposing edges.
    #[error("viewport {width}x{height} is smaller than twice the edge margin {margin}")]
    ViewportTooSmall {
        /// Configured viewport width.
        width: f32,
        /// Configured viewport height.
        height: f32,
        /// Configured camera edge margin.
        margin: f32,
    },
    /// An animated kind has no death clip, so its death would never complete.
    #[error("{kind} is animated but has no death clip")]
    MissingDeathClip {
        /// Name of the offending kind.
        kind: &'static str,
    },
}

/// Complete set of gameplay constants injected into the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Profile of warrior heroes.
    pub warrior: KindProfile,
    /// Profile of archer heroes.
    pub archer: KindProfile,
    /// Profile shared by every goblin.
    pub goblin: KindProfile,
    /// Profile of the boss.
    pub boss: KindProfile,
    /// Profile shared by every cave.
    pub cave: KindProfile,
    /// Damage and scoring rules.
    pub combat: CombatTuning,
    /// Goblin pool sizes and generation cadence.
    pub spawning: SpawnTuning,
    /// Hero projectile flight parameters.
    pub projectile: ProjectileTuning,
    /// Camera follow and visibility parameters.
    pub camera: CameraTuning,
    /// Lives and hero arrival parameters.
    pub players: PlayerTuning,
    /// Frame pacing limits.
    pub timing: TimingTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            warrior: KindProfile::hero(),
            archer: KindProfile::hero(),
            goblin: KindProfile::goblin(),
            boss: KindProfile::boss(),
            cave: KindProfile::cave(),
            combat: CombatTuning::default(),
            spawning: SpawnTuning::default(),
            projectile: ProjectileTuning::default(),
            camera: CameraTuning::default(),
            players: PlayerTuning::default(),
            timing: TimingTuning::default(),
        }
    }
}

impl Tuning {
    /// Profile describing the provided character kind.
    #[must_use]
    pub fn profile(&self, kind: CharacterKind) -> &KindProfile {
        match kind {
            CharacterKind::Hero(HeroClass::Warrior) => &self.warrior,
            CharacterKind::Hero(HeroClass::Archer) => &self.archer,
            CharacterKind::Goblin => &self.goblin,
            CharacterKind::Boss => &self.boss,
            CharacterKind::Cave => &self.cave,
        }
    }

    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), TuningError> {
        for (name, profile) in [
            ("warrior", &self.warrior),
            ("archer", &self.archer),
            ("goblin", &self.goblin),
            ("boss", &self.boss),
            ("cave", &self.cave),
        ] {
            profile.validate(name)?;
        }

        if self.spawning.goblins_per_cave == 0 {
            return Err(TuningError::ZeroCapacity {
                field: "spawning.goblins_per_cave",
            });
        }
        if self.spawning.goblin_capacity == 0 {
            return Err(TuningError::ZeroCapacity {
                field: "spawning.goblin_capacity",
            });
        }

        let quantities = [
            ("combat.hero_contact_damage", self.combat.hero_contact_damage),
            ("combat.goblin_heavy_damage", self.combat.goblin_heavy_damage),
            ("combat.goblin_light_damage", self.combat.goblin_light_damage),
            ("combat.boss_damage", self.combat.boss_damage),
            ("combat.cave_damage", self.combat.cave_damage),
            ("combat.damage_feedback", self.combat.damage_feedback),
            ("combat.spark", self.combat.spark),
            ("combat.shadow_fade", self.combat.shadow_fade),
            ("spawning.interval_min", self.spawning.interval_min),
            ("spawning.interval_variance", self.spawning.interval_variance),
            ("spawning.fade_in", self.spawning.fade_in),
            ("projectile.speed", self.projectile.speed),
            ("projectile.lifetime", self.projectile.lifetime),
            ("projectile.fade_start", self.projectile.fade_start),
            ("projectile.radius", self.projectile.radius),
            ("camera.edge_margin", self.camera.edge_margin),
            ("camera.lod_radius", self.camera.lod_radius),
            ("camera.tree_opaque_distance", self.camera.tree_opaque_distance),
            ("players.hero_fade_in", self.players.hero_fade_in),
            ("players.spawn_effect", self.players.spawn_effect),
            ("timing.max_elapsed", self.timing.max_elapsed),
            ("timing.min_tick", self.timing.min_tick),
        ];
        for (field, value) in quantities {
            check_quantity(field, value)?;
        }
        let chance = self.combat.goblin_heavy_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(TuningError::InvalidQuantity {
                field: "combat.goblin_heavy_chance",
                value: chance as f32,
            });
        }

        let camera = &self.camera;
        if camera.viewport_width < camera.edge_margin * 2.0
            || camera.viewport_height < camera.edge_margin * 2.0
        {
            return Err(TuningError::ViewportTooSmall {
                width: camera.viewport_width,
                height: camera.viewport_height,
                margin: camera.edge_margin,
            });
        }

        Ok(())
    }
}

/// Per-kind constants passed into each character at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindProfile {
    /// Whether the kind runs animation clips at all.
    pub animated: bool,
    /// Travel speed in world units per second.
    pub movement_speed: f32,
    /// Rotation applied per discrete turn step, in radians.
    pub rotation_speed: f32,
    /// Radius of the physics body.
    pub collision_radius: f32,
    /// Distance within which chasing enemies switch to attacking.
    pub attack_radius: f32,
    /// Distance within which chasing enemies notice heroes.
    pub alert_radius: f32,
    /// Seconds the corpse lingers after the death clip before fading.
    pub linger: f32,
    /// Seconds the corpse takes to fade out once it stops lingering.
    pub fade_out: f32,
    /// Duration of each one-shot animation clip.
    pub clips: ClipDurations,
}

impl KindProfile {
    fn hero() -> Self {
        Self {
            animated: true,
            movement_speed: 200.0,
            rotation_speed: 0.06,
            collision_radius: 40.0,
            attack_radius: 0.0,
            alert_radius: 0.0,
            linger: 4.0,
            fade_out: 0.0,
            clips: ClipDurations::from_frames([28, 26, 14, 10, 28], HERO_FRAME_TIME),
        }
    }

    fn goblin() -> Self {
        Self {
            animated: true,
            movement_speed: 200.0,
            rotation_speed: 0.06,
            collision_radius: 40.0,
            attack_radius: 80.0,
            alert_radius: 20_000.0,
            linger: 0.75,
            fade_out: 1.0,
            clips: ClipDurations::from_frames([28, 28, 33, 25, 35], HERO_FRAME_TIME),
        }
    }

    fn boss() -> Self {
        Self {
            animated: true,
            movement_speed: 70.0,
            rotation_speed: 0.06,
            collision_radius: 40.0,
            attack_radius: 160.0,
            alert_radius: 20_000.0,
            linger: 3.0,
            fade_out: 2.0,
            clips: ClipDurations::from_frames([30, 35, 40, 18, 45], BOSS_FRAME_TIME),
        }
    }

    fn cave() -> Self {
        Self {
            animated: false,
            movement_speed: 0.0,
            rotation_speed: 0.0,
            collision_radius: 90.0,
            attack_radius: 0.0,
            alert_radius: 0.0,
            linger: 0.0,
            fade_out: 0.5,
            clips: ClipDurations::default(),
        }
    }

    fn validate(&self, kind: &'static str) -> Result<(), TuningError> {
        for (field, value) in [
            ("movement_speed", self.movement_speed),
            ("rotation_speed", self.rotation_speed),
            ("collision_radius", self.collision_radius),
            ("attack_radius", self.attack_radius),
            ("alert_radius", self.alert_radius),
            ("linger", self.linger),
            ("fade_out", self.fade_out),
        ] {
            check_quantity(field, value)?;
        }
        for state in AnimationState::ALL {
            check_quantity("clips", self.clips.seconds(state))?;
        }
        if self.animated && self.clips.death <= 0.0 {
            return Err(TuningError::MissingDeathClip { kind });
        }
        Ok(())
    }
}

/// Seconds each one-shot animation clip runs for; zero disables a clip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipDurations {
    /// Idle loop length.
    pub idle: f32,
    /// Walk loop length.
    pub walk: f32,
    /// Attack clip length.
    pub attack: f32,
    /// Hit reaction length.
    pub get_hit: f32,
    /// Death clip length.
    pub death: f32,
}

impl ClipDurations {
    fn from_frames(frames: [u16; 5], frame_time: f32) -> Self {
        let seconds = |count: u16| f32::from(count) * frame_time;
        Self {
            idle: seconds(frames[0]),
            walk: seconds(frames[1]),
            attack: seconds(frames[2]),
            get_hit: seconds(frames[3]),
            death: seconds(frames[4]),
        }
    }

    /// Length of the clip in seconds.
    #[must_use]
    pub fn seconds(&self, state: AnimationState) -> f32 {
        match state {
            AnimationState::Idle => self.idle,
            AnimationState::Walk => self.walk,
            AnimationState::Attack => self.attack,
            AnimationState::GetHit => self.get_hit,
            AnimationState::Death => self.death,
        }
    }

    /// Length of the clip, or `None` when the clip is disabled.
    #[must_use]
    pub fn duration(&self, state: AnimationState) -> Option<Duration> {
        let seconds = self.seconds(state);
        (seconds > 0.0).then(|| Duration::from_secs_f32(seconds))
    }
}

/// Damage, scoring and hit-feedback constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Damage a hero takes when touching a living enemy.
    pub hero_contact_damage: f32,
    /// Damage of a strong projectile hit on a goblin.
    pub goblin_heavy_damage: f32,
    /// Damage of a weak projectile hit on a goblin.
    pub goblin_light_damage: f32,
    /// Probability that a goblin hit uses the heavy damage.
    pub goblin_heavy_chance: f64,
    /// Damage of a projectile hit on the boss.
    pub boss_damage: f32,
    /// Damage of a projectile hit on a cave, applied without attenuation.
    pub cave_damage: f32,
    /// Score awarded for killing a goblin.
    pub goblin_score: u32,
    /// Score awarded for killing the boss.
    pub boss_score: u32,
    /// Cave health at or below which smoke starts.
    pub cave_smoke_threshold: f32,
    /// Seconds the damage-feedback emitter stays alive.
    pub damage_feedback: f32,
    /// Seconds the projectile impact spark stays alive.
    pub spark: f32,
    /// Seconds a dead character's shadow takes to fade.
    pub shadow_fade: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            hero_contact_damage: 5.0,
            goblin_heavy_damage: 100.0,
            goblin_light_damage: 50.0,
            goblin_heavy_chance: 0.5,
            boss_damage: 2.0,
            cave_damage: 10.0,
            goblin_score: 10,
            boss_score: 1_000,
            cave_smoke_threshold: 75.0,
            damage_feedback: 0.15,
            spark: 0.15,
            shadow_fade: 1.5,
        }
    }
}

/// Goblin pool sizes and cave generation cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Goblins owned by each cave.
    pub goblins_per_cave: usize,
    /// Maximum goblins active across all caves.
    pub goblin_capacity: usize,
    /// Shortest interval between generations, in seconds.
    pub interval_min: f32,
    /// Random extra interval added on top of the minimum, in seconds.
    pub interval_variance: f32,
    /// Distance of the spawn point from the cave, as a fraction of its radius.
    pub spawn_offset: f32,
    /// Seconds a freshly released goblin takes to fade in.
    pub fade_in: f32,
    /// Smallest goblin scale.
    pub min_scale: f32,
    /// Random extra scale added on top of the minimum.
    pub scale_variance: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            goblins_per_cave: 5,
            goblin_capacity: 32,
            interval_min: 5.0,
            interval_variance: 5.0,
            spawn_offset: 0.75,
            fade_in: 0.5,
            min_scale: 0.5,
            scale_variance: 0.35,
        }
    }
}

/// Flight parameters of hero projectiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Seconds before the projectile is removed.
    pub lifetime: f32,
    /// Age in seconds at which the projectile starts fading.
    pub fade_start: f32,
    /// Radius of the projectile's physics body.
    pub radius: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 480.0,
            lifetime: 1.0,
            fade_start: 0.6,
            radius: 15.0,
        }
    }
}

impl ProjectileTuning {
    /// Opacity of a projectile of the provided age, used as damage attenuation.
    #[must_use]
    pub fn alpha_at(&self, age: f32) -> f32 {
        if age <= self.fade_start {
            return 1.0;
        }
        let fade = self.lifetime - self.fade_start;
        if fade <= 0.0 {
            return 0.0;
        }
        (1.0 - (age - self.fade_start) / fade).clamp(0.0, 1.0)
    }
}

/// Camera follow and visibility parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Closest a hero may get to any viewport edge.
    pub edge_margin: f32,
    /// Visible width in world units.
    pub viewport_width: f32,
    /// Visible height in world units.
    pub viewport_height: f32,
    /// Radius around the tracked hero inside which scenery stays live.
    pub lod_radius: f32,
    /// Distance beyond which trees are fully opaque.
    pub tree_opaque_distance: f32,
    /// Opacity of a tree a hero stands directly under.
    pub tree_min_alpha: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            edge_margin: 256.0,
            viewport_width: 1_024.0,
            viewport_height: 768.0,
            lod_radius: 1_024.0,
            tree_opaque_distance: 400.0,
            tree_min_alpha: 0.1,
        }
    }
}

impl CameraTuning {
    /// Opacity of a tree whose nearest hero stands `distance` units away.
    #[must_use]
    pub fn tree_alpha(&self, distance: f32) -> f32 {
        if distance > self.tree_opaque_distance || self.tree_opaque_distance <= 0.0 {
            return 1.0;
        }
        let ratio = distance / self.tree_opaque_distance;
        self.tree_min_alpha + ratio * ratio * (1.0 - self.tree_min_alpha)
    }
}

/// Lives and hero arrival parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Lives each player starts with.
    pub lives: i32,
    /// Seconds a newly spawned hero takes to fade in.
    pub hero_fade_in: f32,
    /// Seconds the spawn emitter stays alive.
    pub spawn_effect: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            lives: 3,
            hero_fade_in: 2.0,
            spawn_effect: 0.15,
        }
    }
}

/// Frame pacing limits applied by the update loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingTuning {
    /// Longest elapsed time accepted as a single frame, in seconds.
    pub max_elapsed: f32,
    /// Frame length substituted for an over-long frame, in seconds.
    pub min_tick: f32,
}

impl Default for TimingTuning {
    fn default() -> Self {
        Self {
            max_elapsed: 1.0,
            min_tick: 1.0 / 60.0,
        }
    }
}

fn check_quantity(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::InvalidQuantity { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn boss_attack_radius_is_four_collision_radii() {
        let tuning = Tuning::default();
        assert_eq!(tuning.boss.attack_radius, tuning.boss.collision_radius * 4.0);
        assert_eq!(
            tuning.goblin.attack_radius,
            tuning.goblin.collision_radius * 2.0
        );
    }

    #[test]
    fn rejects_viewport_smaller_than_margins() {
        let mut tuning = Tuning::default();
        tuning.camera.viewport_height = 400.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::ViewportTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_animated_kind_without_death_clip() {
        let mut tuning = Tuning::default();
        tuning.goblin.clips.death = 0.0;
        assert_eq!(
            tuning.validate(),
            Err(TuningError::MissingDeathClip { kind: "goblin" })
        );
    }

    #[test]
    fn rejects_empty_pools() {
        let mut tuning = Tuning::default();
        tuning.spawning.goblin_capacity = 0;
        assert_eq!(
            tuning.validate(),
            Err(TuningError::ZeroCapacity {
                field: "spawning.goblin_capacity"
            })
        );
    }

    #[test]
    fn projectile_alpha_fades_after_fade_start() {
        let projectile = ProjectileTuning::default();
        assert_eq!(projectile.alpha_at(0.0), 1.0);
        assert_eq!(projectile.alpha_at(0.6), 1.0);
        assert!((projectile.alpha_at(0.8) - 0.5).abs() < 1e-5);
        assert_eq!(projectile.alpha_at(1.5), 0.0);
    }

    #[test]
    fn tree_alpha_falls_off_quadratically() {
        let camera = CameraTuning::default();
        assert_eq!(camera.tree_alpha(500.0), 1.0);
        assert!((camera.tree_alpha(0.0) - 0.1).abs() < 1e-6);
        assert!((camera.tree_alpha(200.0) - (0.1 + 0.25 * 0.9)).abs() < 1e-6);
        assert!((camera.tree_alpha(400.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let tuning: Tuning = toml::from_str(
            r#"
            [combat]
            boss_damage = 4.0
            "#,
        )
        .expect("partial tuning parses");

        assert_eq!(tuning.combat.boss_damage, 4.0);
        assert_eq!(tuning.combat.goblin_score, 10);
        assert_eq!(tuning.goblin, Tuning::default().goblin);
    }
}
