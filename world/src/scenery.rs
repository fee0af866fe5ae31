//! Trees, ambient emitters and parallax bookkeeping around the tracked hero.

use adventure_core::{
    geometry::distance, CameraTuning, CaveId, EmitterId, Event, ParallaxSprite, TreeId,
};
use glam::Vec2;

/// Size class of an authored tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeSize {
    /// Small tree that never fades.
    Small,
    /// Large canopy that fades near heroes and sheds leaves.
    Large,
}

/// Leaf emitter template attached to a large tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeafVariant {
    /// First leaf template.
    A,
    /// Second leaf template.
    B,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Tree {
    pub(crate) id: TreeId,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) size: TreeSize,
    pub(crate) alpha: f32,
    pub(crate) emitter: Option<EmitterId>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AmbientEmitter {
    pub(crate) id: EmitterId,
    pub(crate) position: Vec2,
    pub(crate) variant: LeafVariant,
    pub(crate) paused: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParallaxAnchor {
    pub(crate) sprite: ParallaxSprite,
    pub(crate) position: Vec2,
    pub(crate) paused: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Scenery {
    pub(crate) trees: Vec<Tree>,
    pub(crate) emitters: Vec<AmbientEmitter>,
    pub(crate) parallax: Vec<ParallaxAnchor>,
}

impl Scenery {
    pub(crate) fn plant(&mut self, position: Vec2, rotation: f32, size: TreeSize, leaves: LeafVariant) {
        let id = TreeId::new(self.trees.len() as u32);
        let emitter = (size == TreeSize::Large).then(|| {
            let id = EmitterId::new(self.emitters.len() as u32);
            self.emitters.push(AmbientEmitter {
                id,
                position,
                variant: leaves,
                paused: true,
            });
            id
        });
        self.parallax.push(ParallaxAnchor {
            sprite: ParallaxSprite::Tree(id),
            position,
            paused: true,
        });
        self.trees.push(Tree {
            id,
            position,
            rotation,
            size,
            alpha: 1.0,
            emitter,
        });
    }

    /// Registers a cave mouth as a parallax sprite.
    pub(crate) fn anchor_cave(&mut self, cave: CaveId, position: Vec2) {
        self.parallax.push(ParallaxAnchor {
            sprite: ParallaxSprite::Cave(cave),
            position,
            paused: true,
        });
    }

    /// Drops the parallax sprite of a withdrawn cave.
    pub(crate) fn release_cave(&mut self, cave: CaveId) {
        self.parallax
            .retain(|anchor| anchor.sprite != ParallaxSprite::Cave(cave));
    }

    /// Refreshes visibility around `tracked` when `moved` is set.
    ///
    /// Large trees inside the LOD radius fade toward the nearest hero.
    /// Emitters and parallax sprites pause beyond the radius and resume
    /// inside it; only flips are reported.
    pub(crate) fn refresh(
        &mut self,
        tracked: Vec2,
        heroes: &[Vec2],
        moved: bool,
        camera: &CameraTuning,
        out_events: &mut Vec<Event>,
    ) {
        if !moved {
            return;
        }
        let radius = camera.lod_radius;

        for tree in &mut self.trees {
            if tree.size != TreeSize::Large || distance(tree.position, tracked) >= radius {
                continue;
            }
            let nearest = heroes
                .iter()
                .map(|hero| distance(tree.position, *hero))
                .fold(f32::INFINITY, f32::min);
            let alpha = camera.tree_alpha(nearest);
            if (alpha - tree.alpha).abs() > f32::EPSILON {
                tree.alpha = alpha;
                out_events.push(Event::TreeAlphaChanged {
                    tree: tree.id,
                    alpha,
                });
            }
        }

        for emitter in &mut self.emitters {
            let paused = distance(emitter.position, tracked) >= radius;
            if paused != emitter.paused {
                emitter.paused = paused;
                out_events.push(Event::EmitterPauseChanged {
                    emitter: emitter.id,
                    paused,
                });
            }
        }

        for anchor in &mut self.parallax {
            let paused = distance(anchor.position, tracked) >= radius;
            if paused != anchor.paused {
                anchor.paused = paused;
                out_events.push(Event::ParallaxPaused {
                    sprite: anchor.sprite,
                    paused,
                });
            }
        }
    }
}
