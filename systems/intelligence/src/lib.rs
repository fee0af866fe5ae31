#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy decision strategies.
//!
//! Goblins and the boss pursue the nearest visible hero with
//! [`ChaseIntelligence`]; caves release goblins on a randomized timer with
//! [`SpawnIntelligence`]. Both only read a [`Perception`] and answer with a
//! [`Decision`]; the world carries the decision out.

use std::{cmp::Ordering, time::Duration};

use adventure_core::{
    geometry::{distance, unit_random},
    Blackboard, Decision, HeroId, HeroSighting, Intelligence, KindProfile, Perception,
};
use log::debug;
use rand::RngCore;

/// Pursues the nearest hero in line of sight and attacks once in reach.
#[derive(Debug)]
pub struct ChaseIntelligence {
    attack_radius: f32,
    alert_radius: f32,
    candidates: Vec<(f32, HeroId)>,
}

impl ChaseIntelligence {
    /// Creates a chase strategy with explicit attack and alert radii.
    #[must_use]
    pub fn new(attack_radius: f32, alert_radius: f32) -> Self {
        Self {
            attack_radius,
            alert_radius,
            candidates: Vec::new(),
        }
    }

    /// Creates a chase strategy using the radii of a kind profile.
    #[must_use]
    pub fn for_profile(profile: &KindProfile) -> Self {
        Self::new(profile.attack_radius, profile.alert_radius)
    }

    /// Whether the remembered target is still worth pursuing.
    fn keeps(&self, perception: &Perception<'_>, hero: &HeroSighting) -> bool {
        !hero.is_dying
            && distance(perception.position(), hero.position) <= self.alert_radius
            && perception.can_see(hero.position)
    }

    /// Nearest visible hero inside the alert radius, ties broken by id.
    fn acquire<'a>(&mut self, perception: &Perception<'a>) -> Option<&'a HeroSighting> {
        let origin = perception.position();
        self.candidates.clear();
        self.candidates.extend(
            perception
                .heroes()
                .iter()
                .filter(|hero| !hero.is_dying)
                .map(|hero| (distance(origin, hero.position), hero.id))
                .filter(|(range, _)| *range <= self.alert_radius),
        );
        self.candidates.sort_by(|left, right| {
            left.0
                .partial_cmp(&right.0)
                .unwrap_or(Ordering::Equal)
                .then(left.1.cmp(&right.1))
        });

        self.candidates
            .iter()
            .filter_map(|(_, id)| perception.hero(*id))
            .find(|hero| perception.can_see(hero.position))
    }
}

impl Intelligence for ChaseIntelligence {
    fn update(
        &mut self,
        perception: &Perception<'_>,
        blackboard: &mut Blackboard,
        _dt: Duration,
        _rng: &mut dyn RngCore,
    ) -> Decision {
        if perception.is_dying() {
            blackboard.target = None;
            return Decision::Idle;
        }

        let remembered = blackboard
            .target
            .and_then(|id| perception.hero(id))
            .filter(|hero| self.keeps(perception, hero));
        let target = match remembered {
            Some(hero) => Some(hero),
            None => self.acquire(perception),
        };

        if target.map(|hero| hero.id) != blackboard.target {
            debug!(
                "chase target changed from {:?} to {:?}",
                blackboard.target.map(|id| id.get()),
                target.map(|hero| hero.id.get())
            );
        }
        blackboard.target = target.map(|hero| hero.id);

        let Some(hero) = target else {
            return Decision::Idle;
        };
        if distance(perception.position(), hero.position) <= self.attack_radius {
            Decision::Attack {
                facing: hero.position,
            }
        } else {
            Decision::Chase {
                toward: hero.position,
            }
        }
    }
}

/// Counts down to the next goblin release and re-arms with a random interval.
#[derive(Clone, Copy, Debug)]
pub struct SpawnIntelligence {
    interval_min: f32,
    interval_variance: f32,
}

impl SpawnIntelligence {
    /// Creates a spawn strategy re-arming within `min .. min + variance` seconds.
    #[must_use]
    pub const fn new(interval_min: f32, interval_variance: f32) -> Self {
        Self {
            interval_min,
            interval_variance,
        }
    }
}

impl Intelligence for SpawnIntelligence {
    fn update(
        &mut self,
        perception: &Perception<'_>,
        blackboard: &mut Blackboard,
        dt: Duration,
        rng: &mut dyn RngCore,
    ) -> Decision {
        if perception.is_dying() {
            return Decision::Idle;
        }

        blackboard.time_until_next_generate -= dt.as_secs_f32();
        if blackboard.time_until_next_generate > 0.0 {
            return Decision::Idle;
        }

        blackboard.time_until_next_generate =
            self.interval_min + self.interval_variance * unit_random(rng);
        Decision::Generate
    }
}
