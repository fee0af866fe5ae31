//! Planar math helpers shared by the world and its systems.
//!
//! Character art faces down the Y axis, so a rotation of zero points along
//! `+Y` and [`heading`] returns `(-sin r, cos r)`.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::Rng;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Angle of the vector pointing from `from` to `to`, measured from `+X`.
#[must_use]
pub fn radians_to_point(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Converts a mathematical angle into the rotation used by character art.
#[must_use]
pub fn adjust_asset_orientation(radians: f32) -> f32 {
    radians + FRAC_PI_2
}

/// Unit vector a character with the provided rotation travels along.
#[must_use]
pub fn heading(rotation: f32) -> Vec2 {
    Vec2::new(-rotation.sin(), rotation.cos())
}

/// Rotation that makes a character standing at `from` face `to`.
#[must_use]
pub fn rotation_facing(from: Vec2, to: Vec2) -> f32 {
    adjust_asset_orientation(radians_to_point(to, from))
}

/// Uniform random value in `[0, 1)`.
pub fn unit_random<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn rotation_facing_points_heading_at_target() {
        let from = Vec2::new(10.0, -4.0);
        for target in [
            Vec2::new(50.0, -4.0),
            Vec2::new(10.0, 90.0),
            Vec2::new(-30.0, -60.0),
        ] {
            let rotation = rotation_facing(from, target);
            let expected = (target - from).normalize();
            assert!(approx(heading(rotation), expected), "target {target:?}");
        }
    }

    #[test]
    fn zero_rotation_faces_up() {
        assert!(approx(heading(0.0), Vec2::Y));
        assert!(approx(
            Vec2::from_angle(adjust_asset_orientation(0.0)),
            heading(0.0)
        ));
    }

    #[test]
    fn unit_random_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..1_000 {
            let value = unit_random(&mut rng);
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vec2::new(3.0, 0.0);
        let b = Vec2::new(0.0, 4.0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance(b, a), 5.0);
    }
}
