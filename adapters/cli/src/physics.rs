use std::{collections::HashSet, time::Duration};

use adventure_core::{
    Body, ColliderCategory, Contact, LineOfSight, NodeRef, PhysicsBody, PhysicsCollaborator,
    PhysicsReport, Placement, Shape,
};
use glam::Vec2;

/// Minimal physics for headless sessions: circles and boxes are pushed
/// apart, touching pairs are reported once when they begin, and walls block
/// line of sight.
#[derive(Debug, Default)]
pub(crate) struct CirclePhysics {
    walls: Vec<(Vec2, Vec2)>,
    positions: Vec<Vec2>,
    touching: HashSet<(NodeRef, NodeRef)>,
    still_touching: HashSet<(NodeRef, NodeRef)>,
}

impl CirclePhysics {
    /// Records the static wall boxes among `bodies`.
    pub(crate) fn observe_walls(&mut self, bodies: &[PhysicsBody]) {
        self.walls.clear();
        self.walls.extend(bodies.iter().filter_map(|body| match body.shape {
            Shape::Rect { half_extents } if body.category == ColliderCategory::WALL => {
                Some((body.position, half_extents))
            }
            _ => None,
        }));
    }

    fn separate(&mut self, bodies: &[PhysicsBody]) {
        for index in 0..bodies.len() {
            let body = &bodies[index];
            if !body.dynamic {
                continue;
            }
            for (other_index, other) in bodies.iter().enumerate() {
                if other_index == index || !body.collision.intersects(other.category) {
                    continue;
                }
                let position = self.positions[index];
                let other_position = self.positions[other_index];
                let Some(push) = penetration(position, body.shape, other_position, other.shape)
                else {
                    continue;
                };
                if other.dynamic && other.collision.intersects(body.category) {
                    self.positions[index] += push * 0.5;
                    self.positions[other_index] -= push * 0.5;
                } else {
                    self.positions[index] += push;
                }
            }
        }
    }

    fn report_contacts(&mut self, bodies: &[PhysicsBody], report: &mut PhysicsReport) {
        self.still_touching.clear();
        for (index, body) in bodies.iter().enumerate() {
            for (offset, other) in bodies[index + 1..].iter().enumerate() {
                let interested = body.contact.intersects(other.category)
                    || other.contact.intersects(body.category);
                if !interested {
                    continue;
                }
                let other_position = self.positions[index + 1 + offset];
                let touching = penetration(
                    self.positions[index],
                    inflate(body.shape),
                    other_position,
                    inflate(other.shape),
                );
                if touching.is_none() {
                    continue;
                }
                let pair = (body.node, other.node);
                if !self.touching.contains(&pair) {
                    report.contacts.push(Contact {
                        a: Body {
                            category: body.category,
                            node: Some(body.node),
                        },
                        b: Body {
                            category: other.category,
                            node: Some(other.node),
                        },
                    });
                }
                let _ = self.still_touching.insert(pair);
            }
        }
        std::mem::swap(&mut self.touching, &mut self.still_touching);
    }
}

impl LineOfSight for CirclePhysics {
    fn raycast(&self, from: Vec2, to: Vec2) -> ColliderCategory {
        if self
            .walls
            .iter()
            .any(|(center, half_extents)| segment_hits_box(from, to, *center, *half_extents))
        {
            ColliderCategory::WALL
        } else {
            ColliderCategory::NONE
        }
    }
}

impl PhysicsCollaborator for CirclePhysics {
    fn simulate(&mut self, bodies: &[PhysicsBody], _step: Duration, report: &mut PhysicsReport) {
        self.observe_walls(bodies);
        self.positions.clear();
        self.positions.extend(bodies.iter().map(|body| body.position));

        self.separate(bodies);
        for (body, position) in bodies.iter().zip(&self.positions) {
            if body.dynamic && *position != body.position {
                report.placements.push(Placement {
                    node: body.node,
                    position: *position,
                });
            }
        }
        self.report_contacts(bodies, report);
    }
}

/// Shapes resting against each other still count as touching.
const CONTACT_SLOP: f32 = 0.5;

fn inflate(shape: Shape) -> Shape {
    match shape {
        Shape::Circle { radius } => Shape::Circle {
            radius: radius + CONTACT_SLOP,
        },
        Shape::Rect { half_extents } => Shape::Rect {
            half_extents: half_extents + Vec2::splat(CONTACT_SLOP),
        },
    }
}

/// Displacement that moves the first shape out of the second, if they overlap.
fn penetration(
    position: Vec2,
    shape: Shape,
    other_position: Vec2,
    other_shape: Shape,
) -> Option<Vec2> {
    match (shape, other_shape) {
        (Shape::Circle { radius }, Shape::Circle { radius: other_radius }) => {
            let delta = position - other_position;
            let reach = radius + other_radius;
            let distance = delta.length();
            (distance < reach).then(|| {
                let normal = if distance > f32::EPSILON {
                    delta / distance
                } else {
                    Vec2::Y
                };
                normal * (reach - distance)
            })
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            circle_out_of_box(position, radius, other_position, half_extents)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_out_of_box(other_position, radius, position, half_extents).map(|push| -push)
        }
        (Shape::Rect { half_extents }, Shape::Rect { half_extents: other_half }) => {
            let delta = position - other_position;
            let overlap = half_extents + other_half - delta.abs();
            if overlap.x <= 0.0 || overlap.y <= 0.0 {
                None
            } else if overlap.x < overlap.y {
                Some(Vec2::new(overlap.x.copysign(delta.x), 0.0))
            } else {
                Some(Vec2::new(0.0, overlap.y.copysign(delta.y)))
            }
        }
    }
}

fn circle_out_of_box(
    center: Vec2,
    radius: f32,
    box_center: Vec2,
    half_extents: Vec2,
) -> Option<Vec2> {
    let local = center - box_center;
    let closest = local.clamp(-half_extents, half_extents);
    let delta = local - closest;
    let distance = delta.length();
    if distance >= radius {
        return None;
    }
    if distance > f32::EPSILON {
        return Some(delta / distance * (radius - distance));
    }
    // Center inside the box: leave through the nearest face.
    let to_face = half_extents - local.abs();
    Some(if to_face.x < to_face.y {
        Vec2::new((to_face.x + radius).copysign(local.x), 0.0)
    } else {
        Vec2::new(0.0, (to_face.y + radius).copysign(local.y))
    })
}

fn segment_hits_box(from: Vec2, to: Vec2, center: Vec2, half_extents: Vec2) -> bool {
    let min = center - half_extents;
    let max = center + half_extents;
    let direction = to - from;
    let mut enter = 0.0_f32;
    let mut exit = 1.0_f32;

    for axis in 0..2 {
        let (origin, step, low, high) = (from[axis], direction[axis], min[axis], max[axis]);
        if step.abs() < f32::EPSILON {
            if origin < low || origin > high {
                return false;
            }
            continue;
        }
        let (mut near, mut far) = ((low - origin) / step, (high - origin) / step);
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        enter = enter.max(near);
        exit = exit.min(far);
        if enter > exit {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use adventure_core::{CharacterRef, HeroId};

    fn circle(node: NodeRef, category: ColliderCategory, position: Vec2) -> PhysicsBody {
        PhysicsBody {
            node,
            category,
            collision: ColliderCategory::ALL,
            contact: ColliderCategory::ALL,
            position,
            shape: Shape::Circle { radius: 10.0 },
            dynamic: true,
        }
    }

    fn wall(center: Vec2, half_extents: Vec2) -> PhysicsBody {
        PhysicsBody {
            node: NodeRef::Wall,
            category: ColliderCategory::WALL,
            collision: ColliderCategory::ALL,
            contact: ColliderCategory::NONE,
            position: center,
            shape: Shape::Rect { half_extents },
            dynamic: false,
        }
    }

    #[test]
    fn walls_block_sight_only_when_crossed() {
        let mut physics = CirclePhysics::default();
        physics.observe_walls(&[wall(Vec2::new(0.0, 0.0), Vec2::new(5.0, 50.0))]);

        assert!(!physics.can_see(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0)));
        assert!(physics.can_see(Vec2::new(-100.0, 80.0), Vec2::new(100.0, 80.0)));
        assert!(physics.can_see(Vec2::new(-100.0, 0.0), Vec2::new(-20.0, 0.0)));
    }

    #[test]
    fn overlapping_circles_separate_and_touch_once() {
        let mut physics = CirclePhysics::default();
        let hero = NodeRef::Character(CharacterRef::Hero(HeroId::new(0)));
        let bodies = [
            circle(hero, ColliderCategory::HERO, Vec2::new(0.0, 0.0)),
            circle(
                NodeRef::Character(CharacterRef::Boss),
                ColliderCategory::GOBLIN_OR_BOSS,
                Vec2::new(12.0, 0.0),
            ),
        ];
        let mut report = PhysicsReport::default();

        physics.simulate(&bodies, Duration::from_millis(16), &mut report);
        assert_eq!(report.contacts.len(), 1);
        assert_eq!(report.placements.len(), 2);
        let gap = report.placements[1].position - report.placements[0].position;
        assert!((gap.length() - 20.0).abs() < 1e-4);

        report.clear();
        physics.simulate(&bodies, Duration::from_millis(16), &mut report);
        assert!(report.contacts.is_empty(), "ongoing touch is not a new contact");
    }

    #[test]
    fn circle_is_pushed_out_of_a_wall() {
        let mut physics = CirclePhysics::default();
        let hero = NodeRef::Character(CharacterRef::Hero(HeroId::new(0)));
        let bodies = [
            circle(hero, ColliderCategory::HERO, Vec2::new(0.0, 12.0)),
            wall(Vec2::ZERO, Vec2::new(50.0, 5.0)),
        ];
        let mut report = PhysicsReport::default();

        physics.simulate(&bodies, Duration::from_millis(16), &mut report);

        assert_eq!(report.placements.len(), 1);
        assert!((report.placements[0].position - Vec2::new(0.0, 15.0)).length() < 1e-4);
    }
}
