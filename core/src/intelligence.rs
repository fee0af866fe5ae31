use std::{fmt, time::Duration};

use glam::Vec2;
use rand::RngCore;

use crate::{HeroId, LineOfSight};

/// Decision policy attached to an enemy character.
///
/// Strategies are owned by their character, invoked once per tick, and may be
/// swapped at runtime. They never mutate the world directly; the world acts on
/// the returned [`Decision`].
pub trait Intelligence: fmt::Debug + Send {
    /// Chooses what the character does during this tick.
    fn update(
        &mut self,
        perception: &Perception<'_>,
        blackboard: &mut Blackboard,
        dt: Duration,
        rng: &mut dyn RngCore,
    ) -> Decision;
}

/// Action selected by an [`Intelligence`] for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    /// Stay put.
    Idle,
    /// Walk toward a point.
    Chase {
        /// Point to walk toward.
        toward: Vec2,
    },
    /// Face a point and attack.
    Attack {
        /// Point to face while attacking.
        facing: Vec2,
    },
    /// Release a goblin from the character's pool.
    Generate,
}

/// Per-character memory the world keeps alongside each strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Blackboard {
    /// Hero the character is currently pursuing.
    pub target: Option<HeroId>,
    /// Seconds left until the next goblin generation.
    pub time_until_next_generate: f32,
}

/// Hero as observed by an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroSighting {
    /// Identifier of the hero.
    pub id: HeroId,
    /// Current position of the hero.
    pub position: Vec2,
    /// Whether the hero is playing its death sequence.
    pub is_dying: bool,
}

/// Everything a strategy may inspect while deciding.
pub struct Perception<'a> {
    position: Vec2,
    is_dying: bool,
    heroes: &'a [HeroSighting],
    sight: &'a dyn LineOfSight,
}

impl<'a> Perception<'a> {
    /// Creates a perception snapshot for a character.
    #[must_use]
    pub fn new(
        position: Vec2,
        is_dying: bool,
        heroes: &'a [HeroSighting],
        sight: &'a dyn LineOfSight,
    ) -> Self {
        Self {
            position,
            is_dying,
            heroes,
            sight,
        }
    }

    /// Position of the deciding character.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Whether the deciding character is playing its death sequence.
    #[must_use]
    pub const fn is_dying(&self) -> bool {
        self.is_dying
    }

    /// Heroes present in the world, ordered by identifier.
    #[must_use]
    pub const fn heroes(&self) -> &'a [HeroSighting] {
        self.heroes
    }

    /// Looks up a hero by identifier.
    #[must_use]
    pub fn hero(&self, id: HeroId) -> Option<&'a HeroSighting> {
        self.heroes.iter().find(|hero| hero.id == id)
    }

    /// Reports whether no wall separates the character from `point`.
    #[must_use]
    pub fn can_see(&self, point: Vec2) -> bool {
        self.sight.can_see(self.position, point)
    }
}

impl fmt::Debug for Perception<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Perception")
            .field("position", &self.position)
            .field("is_dying", &self.is_dying)
            .field("heroes", &self.heroes)
            .finish_non_exhaustive()
    }
}
