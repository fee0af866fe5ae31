use std::{ops::BitOr, time::Duration};

use glam::Vec2;

use crate::NodeRef;

/// Bit tags attached to physics bodies to drive contact and damage rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColliderCategory(u32);

impl ColliderCategory {
    /// No category.
    pub const NONE: Self = Self(0);
    /// Player heroes.
    pub const HERO: Self = Self(1 << 0);
    /// Goblins and the boss.
    pub const GOBLIN_OR_BOSS: Self = Self(1 << 1);
    /// Hero projectiles.
    pub const PROJECTILE: Self = Self(1 << 2);
    /// Static walls.
    pub const WALL: Self = Self(1 << 3);
    /// Goblin caves.
    pub const CAVE: Self = Self(1 << 4);
    /// Every category.
    pub const ALL: Self = Self(u32::MAX);
    /// Every category except projectiles.
    pub const ALL_BUT_PROJECTILE: Self = Self(u32::MAX & !(1 << 2));

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Reports whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Reports whether any bit of `other` is set.
    #[must_use]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ColliderCategory {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Outline of a physics body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Circle centered on the body position.
    Circle {
        /// Circle radius.
        radius: f32,
    },
    /// Axis-aligned box centered on the body position.
    Rect {
        /// Half of the box's width and height.
        half_extents: Vec2,
    },
}

/// Body handed to the physics collaborator each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsBody {
    /// Node that owns the body.
    pub node: NodeRef,
    /// Categories the body belongs to.
    pub category: ColliderCategory,
    /// Categories the body is pushed apart from.
    pub collision: ColliderCategory,
    /// Categories whose contacts are reported back.
    pub contact: ColliderCategory,
    /// Current position of the body.
    pub position: Vec2,
    /// Outline of the body.
    pub shape: Shape,
    /// Whether the collaborator may move the body.
    pub dynamic: bool,
}

/// One side of a contact pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Body {
    /// Categories of the body.
    pub category: ColliderCategory,
    /// Node that owns the body, when the collaborator knows it.
    pub node: Option<NodeRef>,
}

/// Unordered pair of bodies that began touching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Contact {
    /// First body of the pair.
    pub a: Body,
    /// Second body of the pair.
    pub b: Body,
}

/// Position settled by the collaborator for a dynamic node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Node that moved.
    pub node: NodeRef,
    /// Settled position.
    pub position: Vec2,
}

/// Output of a physics step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicsReport {
    /// Settled positions of dynamic bodies.
    pub placements: Vec<Placement>,
    /// Contacts that began during the step.
    pub contacts: Vec<Contact>,
}

impl PhysicsReport {
    /// Empties the report so the buffers can be reused.
    pub fn clear(&mut self) {
        self.placements.clear();
        self.contacts.clear();
    }
}

/// Answers line-of-sight questions against the static level geometry.
pub trait LineOfSight {
    /// Categories of every body hit along the segment from `from` to `to`.
    fn raycast(&self, from: Vec2, to: Vec2) -> ColliderCategory;

    /// Reports whether no wall lies between the two points.
    fn can_see(&self, from: Vec2, to: Vec2) -> bool {
        !self.raycast(from, to).intersects(ColliderCategory::WALL)
    }
}

/// External physics engine that settles positions and reports contacts.
pub trait PhysicsCollaborator: LineOfSight {
    /// Advances the physics simulation over `bodies` by `step`.
    fn simulate(&mut self, bodies: &[PhysicsBody], step: Duration, report: &mut PhysicsReport);
}
