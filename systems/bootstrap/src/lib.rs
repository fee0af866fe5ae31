#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Loads authored levels and tuning overrides into a ready-to-run world.
//!
//! Layouts are TOML documents naming the spawn point, the boss, caves, trees
//! and walls. Tuning files are partial TOML documents merged over the default
//! [`Tuning`], so a file may override a single field of one kind profile.

use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use adventure_core::Tuning;
use adventure_system_intelligence::{ChaseIntelligence, SpawnIntelligence};
use adventure_world::{TreeSize, World, WorldBuilder, WorldError};
use glam::Vec2;
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

/// Layout format version understood by the loader.
pub const SUPPORTED_LAYOUT_VERSION: u32 = 1;

/// Layout bundled with the crate for demos and tests.
pub const DEMO_LAYOUT: &str = include_str!("../assets/demo_layout.toml");

/// Failures raised while turning authored documents into a world.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A document was not valid TOML or did not match the expected shape.
    #[error("failed to parse {document}: {source}")]
    Parse {
        /// Which document failed.
        document: &'static str,
        /// Underlying parser error.
        #[source]
        source: toml::de::Error,
    },
    /// The default tuning could not be serialized for merging.
    #[error("failed to encode default tuning: {0}")]
    EncodeDefaults(#[from] toml::ser::Error),
    /// The layout declares a version this loader does not understand.
    #[error("unsupported layout version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Version the loader supports.
        expected: u32,
    },
    /// A marker every level needs is absent from the layout.
    #[error("layout is missing the `{marker}` marker")]
    MissingMarker {
        /// Name of the missing marker.
        marker: &'static str,
    },
    /// The world rejected the assembled level.
    #[error(transparent)]
    InvalidWorld(#[from] WorldError),
    /// The background loader stopped before handing a world back.
    #[error("background loader exited without producing a world")]
    WorkerLost,
}

/// Authored placement of everything in a level.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldLayout {
    /// Format version of the document.
    pub version: u32,
    /// Where heroes appear when no living hero exists.
    pub default_spawn_point: Option<[f32; 2]>,
    /// Where the boss stands.
    pub boss: Option<[f32; 2]>,
    /// Goblin caves.
    #[serde(default)]
    pub caves: Vec<CaveMarker>,
    /// Decorative trees.
    #[serde(default)]
    pub trees: Vec<TreeMarker>,
    /// Axis-aligned walls.
    #[serde(default)]
    pub walls: Vec<WallMarker>,
}

/// Cave placement.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaveMarker {
    /// Cave position.
    pub position: [f32; 2],
    /// Cave rotation in radians.
    #[serde(default)]
    pub rotation: f32,
}

/// Tree placement.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeMarker {
    /// Tree position.
    pub position: [f32; 2],
    /// Tree size.
    pub size: TreeKind,
}

/// Authored tree sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    /// Small tree.
    Small,
    /// Large tree that fades near heroes and sheds leaves.
    Large,
}

impl From<TreeKind> for TreeSize {
    fn from(kind: TreeKind) -> Self {
        match kind {
            TreeKind::Small => TreeSize::Small,
            TreeKind::Large => TreeSize::Large,
        }
    }
}

/// Wall placement given by two opposite corners.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WallMarker {
    /// One corner of the wall.
    pub min: [f32; 2],
    /// The opposite corner of the wall.
    pub max: [f32; 2],
}

impl WallMarker {
    fn center(&self) -> Vec2 {
        (Vec2::from(self.min) + Vec2::from(self.max)) * 0.5
    }

    fn half_extents(&self) -> Vec2 {
        (Vec2::from(self.max) - Vec2::from(self.min)).abs() * 0.5
    }
}

impl WorldLayout {
    /// Parses a layout document and checks its version.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let layout: Self = toml::from_str(source).map_err(|source| LoadError::Parse {
            document: "layout",
            source,
        })?;
        if layout.version != SUPPORTED_LAYOUT_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: layout.version,
                expected: SUPPORTED_LAYOUT_VERSION,
            });
        }
        Ok(layout)
    }
}

/// Merges a partial tuning document over the default tuning.
///
/// Tables merge key by key at every depth; any other value replaces the
/// default outright.
pub fn load_tuning(source: &str) -> Result<Tuning, LoadError> {
    let overrides: toml::Table = toml::from_str(source).map_err(|source| LoadError::Parse {
        document: "tuning",
        source,
    })?;
    let mut merged = toml::Value::try_from(Tuning::default())?;
    merge(&mut merged, toml::Value::Table(overrides));
    merged.try_into().map_err(|source| LoadError::Parse {
        document: "tuning",
        source,
    })
}

fn merge(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        let _ = base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Assembles a world from a parsed layout.
///
/// The boss and goblins chase heroes using their kind profile radii; caves
/// release goblins on the tuning's spawn interval.
pub fn build_world(layout: &WorldLayout, tuning: Tuning, seed: u64) -> Result<World, LoadError> {
    let spawn_point = layout
        .default_spawn_point
        .ok_or(LoadError::MissingMarker {
            marker: "default_spawn_point",
        })?;
    let boss_position = layout
        .boss
        .ok_or(LoadError::MissingMarker { marker: "boss" })?;

    let goblin = tuning.goblin.clone();
    let boss = ChaseIntelligence::for_profile(&tuning.boss);
    let interval_min = tuning.spawning.interval_min;
    let interval_variance = tuning.spawning.interval_variance;

    let mut builder = WorldBuilder::new(tuning, seed)
        .default_spawn_point(Vec2::from(spawn_point))
        .boss(Vec2::from(boss_position), Box::new(boss));
    for cave in &layout.caves {
        builder = builder.cave(
            Vec2::from(cave.position),
            cave.rotation,
            Box::new(SpawnIntelligence::new(interval_min, interval_variance)),
            || Box::new(ChaseIntelligence::for_profile(&goblin)),
        );
    }
    for tree in &layout.trees {
        builder = builder.tree(Vec2::from(tree.position), tree.size.into());
    }
    for wall in &layout.walls {
        builder = builder.wall(wall.center(), wall.half_extents());
    }

    let world = builder.build()?;
    info!(
        "level loaded with {} caves and seed {seed:#x}",
        layout.caves.len()
    );
    Ok(world)
}

/// Parses `layout` and builds the world in one step.
pub fn load_world(layout: &str, tuning: Tuning, seed: u64) -> Result<World, LoadError> {
    build_world(&WorldLayout::parse(layout)?, tuning, seed)
}

/// Pending world being assembled on a background thread.
#[derive(Debug)]
pub struct LoadHandle {
    receiver: Receiver<Result<World, LoadError>>,
}

impl LoadHandle {
    /// Blocks until the loader finishes.
    pub fn wait(self) -> Result<World, LoadError> {
        self.receiver.recv().map_err(|_| LoadError::WorkerLost)?
    }

    /// Returns the result once the loader has finished, without blocking.
    ///
    /// The result is handed out once; later calls report [`LoadError::WorkerLost`].
    pub fn try_take(&mut self) -> Option<Result<World, LoadError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::WorkerLost)),
        }
    }
}

/// Parses and builds the world on a worker thread.
pub fn load_in_background(layout: String, tuning: Tuning, seed: u64) -> LoadHandle {
    let (sender, receiver) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("adventure-loader".into())
        .spawn(move || {
            let _ = sender.send(load_world(&layout, tuning, seed));
        });
    if let Err(error) = spawned {
        warn!("failed to start the background loader: {error}");
    }
    LoadHandle { receiver }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_layout_parses() {
        let layout = WorldLayout::parse(DEMO_LAYOUT).expect("demo layout is valid");
        assert_eq!(layout.caves.len(), 2);
        assert_eq!(layout.trees.len(), 3);
        assert_eq!(layout.walls.len(), 2);
        assert_eq!(layout.trees[1].size, TreeKind::Large);
    }

    #[test]
    fn walls_accept_corners_in_any_order() {
        let wall = WallMarker {
            min: [10.0, 40.0],
            max: [-10.0, 0.0],
        };
        assert_eq!(wall.center(), Vec2::new(0.0, 20.0));
        assert_eq!(wall.half_extents(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn tuning_override_touches_a_single_field() {
        let tuning = load_tuning(
            r#"
                [goblin]
                movement_speed = 90.0

                [players]
                lives = 7
            "#,
        )
        .expect("overrides merge");

        let defaults = Tuning::default();
        assert_eq!(tuning.goblin.movement_speed, 90.0);
        assert_eq!(tuning.goblin.alert_radius, defaults.goblin.alert_radius);
        assert_eq!(tuning.players.lives, 7);
        assert_eq!(tuning.boss, defaults.boss);
    }

    #[test]
    fn empty_tuning_document_yields_defaults() {
        assert_eq!(load_tuning("").expect("empty is valid"), Tuning::default());
    }

    #[test]
    fn malformed_tuning_names_the_document() {
        let error = load_tuning("[goblin\n").expect_err("broken table header");
        assert!(matches!(
            error,
            LoadError::Parse {
                document: "tuning",
                ..
            }
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let error = WorldLayout::parse("version = 9\n").expect_err("future layout");
        assert!(matches!(
            error,
            LoadError::UnsupportedVersion {
                found: 9,
                expected: SUPPORTED_LAYOUT_VERSION
            }
        ));
    }
}
