use std::time::Duration;

use adventure_core::{geometry::heading, PlayerSlot, ProjectileId, ProjectileTuning};
use glam::Vec2;

/// Hero projectile travelling along its launch heading.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) owner: PlayerSlot,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    age: f32,
}

impl Projectile {
    pub(crate) fn launch(id: ProjectileId, owner: PlayerSlot, position: Vec2, rotation: f32) -> Self {
        Self {
            id,
            owner,
            position,
            rotation,
            age: 0.0,
        }
    }

    /// Moves the projectile and reports whether it is still alive.
    pub(crate) fn advance(&mut self, dt: Duration, tuning: &ProjectileTuning) -> bool {
        let seconds = dt.as_secs_f32();
        self.age += seconds;
        self.position += heading(self.rotation) * tuning.speed * seconds;
        self.age < tuning.lifetime
    }

    /// Current opacity, which also scales the damage the projectile deals.
    pub(crate) fn alpha(&self, tuning: &ProjectileTuning) -> f32 {
        tuning.alpha_at(self.age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travels_along_heading_and_expires() {
        let tuning = ProjectileTuning::default();
        let mut projectile =
            Projectile::launch(ProjectileId::new(0), PlayerSlot::DEFAULT, Vec2::ZERO, 0.0);

        assert!(projectile.advance(Duration::from_millis(500), &tuning));
        assert!((projectile.position - Vec2::new(0.0, 240.0)).length() < 1e-3);
        assert_eq!(projectile.alpha(&tuning), 1.0);

        assert!(projectile.advance(Duration::from_millis(300), &tuning));
        assert!(projectile.alpha(&tuning) < 1.0);

        assert!(!projectile.advance(Duration::from_millis(300), &tuning));
    }
}
