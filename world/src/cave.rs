//! Goblin caves and the bounded goblin pools they own.

use adventure_core::{
    geometry::adjust_asset_orientation, Blackboard, CaveId, GoblinId, HeroId, Intelligence,
};
use glam::Vec2;

use crate::character::Character;

/// Enemy character driven by an intelligence strategy.
#[derive(Debug)]
pub(crate) struct Enemy {
    pub(crate) character: Character,
    pub(crate) intelligence: Box<dyn Intelligence>,
    pub(crate) blackboard: Blackboard,
}

impl Enemy {
    pub(crate) fn new(character: Character, intelligence: Box<dyn Intelligence>) -> Self {
        Self {
            character,
            intelligence,
            blackboard: Blackboard::default(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Goblin {
    pub(crate) id: GoblinId,
    pub(crate) enemy: Enemy,
}

/// Number of goblins active across every cave, bounded by a shared capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GoblinAllocation {
    active: usize,
    capacity: usize,
}

impl GoblinAllocation {
    pub(crate) const fn new(capacity: usize) -> Self {
        Self {
            active: 0,
            capacity,
        }
    }

    pub(crate) const fn active(&self) -> usize {
        self.active
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    const fn is_full(&self) -> bool {
        self.active >= self.capacity
    }
}

#[derive(Debug)]
pub(crate) struct Cave {
    pub(crate) id: CaveId,
    pub(crate) enemy: Enemy,
    active: Vec<Goblin>,
    inactive: Vec<Goblin>,
    smoking: bool,
    withdrawn: bool,
}

impl Cave {
    pub(crate) fn new(id: CaveId, enemy: Enemy, goblins: Vec<Goblin>) -> Self {
        Self {
            id,
            enemy,
            active: Vec::new(),
            inactive: goblins,
            smoking: false,
            withdrawn: false,
        }
    }

    pub(crate) fn active(&self) -> &[Goblin] {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut [Goblin] {
        &mut self.active
    }

    pub(crate) fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    pub(crate) fn goblin_mut(&mut self, id: GoblinId) -> Option<&mut Goblin> {
        self.active.iter_mut().find(|goblin| goblin.id == id)
    }

    pub(crate) const fn withdrawn(&self) -> bool {
        self.withdrawn
    }

    pub(crate) fn withdraw(&mut self) {
        self.withdrawn = true;
    }

    /// Marks the cave as smoking once its health crosses `threshold`.
    /// Returns `true` only on the hit that starts the smoke.
    pub(crate) fn ignite_smoke(&mut self, threshold: f32) -> bool {
        if self.smoking || self.enemy.character.health() > threshold {
            return false;
        }
        self.smoking = true;
        true
    }

    pub(crate) const fn smoking(&self) -> bool {
        self.smoking
    }

    /// Releases one pooled goblin in front of the cave.
    ///
    /// Does nothing when the shared allocation is full or the pool is empty.
    pub(crate) fn generate(
        &mut self,
        allocation: &mut GoblinAllocation,
        offset_fraction: f32,
    ) -> Option<(GoblinId, Vec2)> {
        if allocation.is_full() {
            return None;
        }
        let mut goblin = self.inactive.pop()?;

        let cave = &self.enemy.character;
        let angle = adjust_asset_orientation(cave.rotation());
        let offset = cave.collision_radius() * offset_fraction;
        let position = cave.position() + Vec2::from_angle(angle) * offset;

        goblin.enemy.character.set_position(position);
        let id = goblin.id;
        self.active.push(goblin);
        allocation.active += 1;
        Some((id, position))
    }

    /// Returns an active goblin to the pool with a fresh life.
    ///
    /// Unknown goblins are ignored so the allocation stays in step with the pools.
    pub(crate) fn recycle(&mut self, id: GoblinId, allocation: &mut GoblinAllocation) -> bool {
        let Some(index) = self.active.iter().position(|goblin| goblin.id == id) else {
            return false;
        };

        let mut goblin = self.active.remove(index);
        goblin.enemy.character.reset();
        goblin.enemy.blackboard.target = None;
        self.inactive.push(goblin);
        allocation.active = allocation.active.saturating_sub(1);
        true
    }

    pub(crate) fn stop_goblins_from_targeting_hero(&mut self, hero: HeroId) {
        for goblin in &mut self.active {
            if goblin.enemy.blackboard.target == Some(hero) {
                goblin.enemy.blackboard.target = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use adventure_core::{CharacterKind, Decision, Perception, Tuning};
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

    fn cave(id: u32, position: Vec2, rotation: f32, goblins: u32) -> Cave {
        let tuning = Tuning::default();
        let cave_id = CaveId::new(id);
        let pool = (0..goblins)
            .map(|index| Goblin {
                id: GoblinId::new(cave_id, index),
                enemy: Enemy::new(
                    Character::new(CharacterKind::Goblin, &tuning.goblin, position, 0.0),
                    Box::new(Dormant),
                ),
            })
            .collect();
        let body = Character::new(CharacterKind::Cave, &tuning.cave, position, rotation);
        Cave::new(cave_id, Enemy::new(body, Box::new(Dormant)), pool)
    }

    #[test]
    fn generate_places_goblin_in_front_of_cave() {
        let mut cave = cave(0, Vec2::new(100.0, 100.0), 0.0, 5);
        let mut allocation = GoblinAllocation::new(32);

        let (_, position) = cave.generate(&mut allocation, 0.75).expect("pool has goblins");

        assert!((position - Vec2::new(100.0, 167.5)).length() < 1e-3);
        assert_eq!(cave.active().len(), 1);
        assert_eq!(cave.inactive_len(), 4);
        assert_eq!(allocation.active(), 1);
    }

    #[test]
    fn generate_respects_shared_capacity() {
        let mut first = cave(0, Vec2::ZERO, 0.0, 5);
        let mut second = cave(1, Vec2::ZERO, 0.0, 5);
        let mut allocation = GoblinAllocation::new(6);

        while first.generate(&mut allocation, 0.75).is_some() {}
        while second.generate(&mut allocation, 0.75).is_some() {}

        assert_eq!(first.active().len(), 5);
        assert_eq!(second.active().len(), 1);
        assert_eq!(allocation.active(), allocation.capacity());
    }

    #[test]
    fn empty_pool_generates_nothing() {
        let mut cave = cave(0, Vec2::ZERO, 0.0, 0);
        let mut allocation = GoblinAllocation::new(32);

        assert!(cave.generate(&mut allocation, 0.75).is_none());
        assert_eq!(allocation.active(), 0);
    }

    #[test]
    fn recycle_restores_pooled_goblin() {
        let mut cave = cave(0, Vec2::ZERO, 0.0, 5);
        let mut allocation = GoblinAllocation::new(32);
        let (id, _) = cave.generate(&mut allocation, 0.75).expect("pool has goblins");

        let goblin = cave.goblin_mut(id).expect("goblin is active");
        let _ = goblin.enemy.character.apply_damage(100.0, 1.0);
        goblin.enemy.blackboard.target = Some(HeroId::new(3));

        assert!(cave.recycle(id, &mut allocation));
        assert!(!cave.recycle(id, &mut allocation));
        assert_eq!(allocation.active(), 0);
        assert_eq!(cave.inactive_len(), 5);

        let (again, _) = cave.generate(&mut allocation, 0.75).expect("recycled goblin");
        assert_eq!(again, id);
        let goblin = cave.goblin_mut(again).expect("goblin is active");
        assert_eq!(goblin.enemy.character.health(), 100.0);
        assert!(!goblin.enemy.character.is_dying());
        assert_eq!(goblin.enemy.blackboard.target, None);
    }

    #[test]
    fn clears_only_matching_targets() {
        let mut cave = cave(0, Vec2::ZERO, 0.0, 2);
        let mut allocation = GoblinAllocation::new(32);
        let (first, _) = cave.generate(&mut allocation, 0.75).expect("first goblin");
        let (second, _) = cave.generate(&mut allocation, 0.75).expect("second goblin");
        cave.goblin_mut(first).expect("active").enemy.blackboard.target = Some(HeroId::new(1));
        cave.goblin_mut(second).expect("active").enemy.blackboard.target = Some(HeroId::new(2));

        cave.stop_goblins_from_targeting_hero(HeroId::new(1));

        let targets: Vec<_> = cave
            .active()
            .iter()
            .map(|goblin| goblin.enemy.blackboard.target)
            .collect();
        assert_eq!(targets, vec![None, Some(HeroId::new(2))]);
    }

    #[test]
    fn smoke_ignites_once_below_threshold() {
        let mut cave = cave(0, Vec2::ZERO, 0.0, 0);
        let _ = cave.enemy.character.apply_damage(20.0, 1.0);
        assert!(!cave.ignite_smoke(75.0));
        let _ = cave.enemy.character.apply_damage(10.0, 1.0);
        assert!(cave.ignite_smoke(75.0));
        let _ = cave.enemy.character.apply_damage(10.0, 1.0);
        assert!(!cave.ignite_smoke(75.0));
        assert!(cave.smoking());
    }
}
