use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;

use crate::TouchId;

/// Movement and fire intent written by input bindings and read once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerIntent {
    /// Step along the hero's heading.
    pub move_forward: bool,
    /// Step against the hero's heading.
    pub move_backward: bool,
    /// Rotate the hero counter-clockwise.
    pub move_left: bool,
    /// Rotate the hero clockwise.
    pub move_right: bool,
    /// Start an attack.
    pub fire_action: bool,
    /// Analog travel direction, present while a controller drives the hero.
    pub hero_move_direction: Option<Vec2>,
    /// Facing override; an aim offset for controllers, a point for keyboards.
    pub hero_face_location: Option<Vec2>,
    /// World-space point selected by touch targeting.
    pub target_location: Option<Vec2>,
    /// Whether the hero should walk to [`Self::target_location`].
    pub move_requested: bool,
    /// Touch currently steering the hero.
    pub movement_touch: Option<TouchId>,
}

/// Intent cell shared between input callbacks and the simulation thread.
///
/// Writers replace fields with last-write-wins semantics; the update loop
/// takes a snapshot at the start of each pass.
#[derive(Clone, Debug, Default)]
pub struct SharedIntent(Arc<Mutex<PlayerIntent>>);

impl SharedIntent {
    /// Creates an empty intent cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current intent.
    #[must_use]
    pub fn snapshot(&self) -> PlayerIntent {
        *self.lock()
    }

    /// Mutates the intent in place and returns the closure's result.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut PlayerIntent) -> R) -> R {
        mutate(&mut self.lock())
    }

    /// Reports whether two handles refer to the same cell.
    #[must_use]
    pub fn same_cell(&self, other: &SharedIntent) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn lock(&self) -> MutexGuard<'_, PlayerIntent> {
        // Plain data: a poisoned lock still holds a complete intent.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn writes_from_another_thread_are_visible() {
        let intent = SharedIntent::new();
        let writer = intent.clone();

        thread::spawn(move || {
            writer.update(|intent| {
                intent.fire_action = true;
                intent.hero_move_direction = Some(Vec2::X);
            });
        })
        .join()
        .expect("writer thread finishes");

        let snapshot = intent.snapshot();
        assert!(snapshot.fire_action);
        assert_eq!(snapshot.hero_move_direction, Some(Vec2::X));
    }

    #[test]
    fn clones_share_one_cell() {
        let intent = SharedIntent::new();
        assert!(intent.same_cell(&intent.clone()));
        assert!(!intent.same_cell(&SharedIntent::new()));
    }
}
