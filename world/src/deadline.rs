use std::time::Duration;

use adventure_core::{CaveId, CharacterRef, GoblinId, HeroId};

/// Deferred world action scheduled against the simulation clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Deferred {
    /// Runs the hero-killed flow once the corpse has lingered.
    HeroKilled(HeroId),
    /// Starts fading a corpse out.
    FadeOut {
        character: CharacterRef,
        duration: Duration,
    },
    /// Returns a dead goblin to its cave.
    RecycleGoblin(GoblinId),
    /// Removes the boss from the world.
    WithdrawBoss,
    /// Removes a destroyed cave's node from the scene.
    WithdrawCave(CaveId),
    /// Changes a destroyed cave's smoke birth rate.
    Smoke { cave: CaveId, birth_rate: f32 },
    /// Removes a destroyed cave's smoke emitter.
    ClearSmoke(CaveId),
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    due: Duration,
    sequence: u64,
    action: Deferred,
}

/// Deadline queue drained in `(due, sequence)` order.
#[derive(Debug, Default)]
pub(crate) struct Deadlines {
    entries: Vec<Deadline>,
    next_sequence: u64,
}

impl Deadlines {
    pub(crate) fn schedule(&mut self, due: Duration, action: Deferred) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.entries.push(Deadline {
            due,
            sequence,
            action,
        });
    }

    /// Moves every action due at or before `now` into `out` in firing order.
    pub(crate) fn drain_due(&mut self, now: Duration, out: &mut Vec<Deferred>) {
        if self.entries.iter().all(|entry| entry.due > now) {
            return;
        }
        self.entries
            .sort_by_key(|entry| (entry.due, entry.sequence));
        let split = self.entries.partition_point(|entry| entry.due <= now);
        out.extend(self.entries.drain(..split).map(|entry| entry.action));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_due_then_schedule_order() {
        let mut deadlines = Deadlines::default();
        deadlines.schedule(Duration::from_secs(3), Deferred::WithdrawBoss);
        deadlines.schedule(Duration::from_secs(1), Deferred::HeroKilled(HeroId::new(2)));
        deadlines.schedule(Duration::from_secs(1), Deferred::HeroKilled(HeroId::new(1)));

        let mut due = Vec::new();
        deadlines.drain_due(Duration::from_secs(2), &mut due);

        assert_eq!(
            due,
            vec![
                Deferred::HeroKilled(HeroId::new(2)),
                Deferred::HeroKilled(HeroId::new(1)),
            ]
        );
        assert_eq!(deadlines.len(), 1);
    }

    #[test]
    fn nothing_due_leaves_queue_untouched() {
        let mut deadlines = Deadlines::default();
        deadlines.schedule(Duration::from_secs(5), Deferred::WithdrawBoss);
        let mut due = Vec::new();
        deadlines.drain_due(Duration::from_secs(4), &mut due);
        assert!(due.is_empty());
        assert_eq!(deadlines.len(), 1);
    }
}
