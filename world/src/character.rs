//! Health, animation and movement state shared by every character kind.

use std::time::Duration;

use adventure_core::{
    geometry::{adjust_asset_orientation, heading, radians_to_point, rotation_facing},
    AnimationState, CharacterKind, KindProfile, MoveDirection,
};
use glam::Vec2;

/// Full health of a fresh life.
pub(crate) const FULL_HEALTH: f32 = 100.0;

const CLIP_COUNT: usize = AnimationState::ALL.len();

/// Result of applying damage to a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DamageOutcome {
    /// The character was already dying; nothing changed.
    Ignored,
    /// The character survived the hit.
    Wounded,
    /// The hit brought the character's health to zero.
    Killed,
}

/// Clip transitions produced by one animation step.
#[derive(Debug, Default)]
pub(crate) struct AnimationStep {
    pub(crate) started: Option<AnimationState>,
    pub(crate) completed: Vec<AnimationState>,
}

#[derive(Clone, Debug)]
pub(crate) struct Character {
    kind: CharacterKind,
    profile: KindProfile,
    health: f32,
    is_dying: bool,
    is_attacking: bool,
    animated: bool,
    requested: AnimationState,
    position: Vec2,
    rotation: f32,
    movement_speed: f32,
    scale: f32,
    collidable: bool,
    clips: [Option<Duration>; CLIP_COUNT],
}

impl Character {
    pub(crate) fn new(kind: CharacterKind, profile: &KindProfile, position: Vec2, rotation: f32) -> Self {
        Self {
            kind,
            profile: profile.clone(),
            health: FULL_HEALTH,
            is_dying: false,
            is_attacking: false,
            animated: profile.animated,
            requested: AnimationState::Idle,
            position,
            rotation,
            movement_speed: profile.movement_speed,
            scale: 1.0,
            collidable: true,
            clips: [None; CLIP_COUNT],
        }
    }

    pub(crate) const fn kind(&self) -> CharacterKind {
        self.kind
    }

    pub(crate) const fn health(&self) -> f32 {
        self.health
    }

    pub(crate) const fn is_dying(&self) -> bool {
        self.is_dying
    }

    pub(crate) const fn is_attacking(&self) -> bool {
        self.is_attacking
    }

    pub(crate) const fn animated(&self) -> bool {
        self.animated
    }

    pub(crate) const fn requested_animation(&self) -> AnimationState {
        self.requested
    }

    pub(crate) const fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) const fn rotation(&self) -> f32 {
        self.rotation
    }

    pub(crate) const fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub(crate) const fn collidable(&self) -> bool {
        self.collidable
    }

    pub(crate) const fn profile(&self) -> &KindProfile {
        &self.profile
    }

    pub(crate) fn collision_radius(&self) -> f32 {
        self.profile.collision_radius * self.scale
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Scales speed and body size; used to vary pooled goblins.
    pub(crate) fn vary(&mut self, speed_factor: f32, scale: f32) {
        self.movement_speed = self.profile.movement_speed * speed_factor;
        self.scale = scale;
    }

    pub(crate) fn request_animation(&mut self, state: AnimationState) {
        if !self.is_dying {
            self.requested = state;
        }
    }

    pub(crate) fn remove_body(&mut self) {
        self.collidable = false;
    }

    /// Applies `amount` scaled by `attenuation` and runs death sequencing when
    /// health reaches zero. Dying characters ignore further damage.
    pub(crate) fn apply_damage(&mut self, amount: f32, attenuation: f32) -> DamageOutcome {
        if self.is_dying {
            return DamageOutcome::Ignored;
        }

        self.health = (self.health - amount * attenuation).max(0.0);
        if self.health > 0.0 {
            return DamageOutcome::Wounded;
        }

        let _ = self.perform_death();
        DamageOutcome::Killed
    }

    pub(crate) fn perform_attack_action(&mut self) {
        if self.is_attacking || self.is_dying {
            return;
        }
        self.is_attacking = true;
        self.requested = AnimationState::Attack;
    }

    /// Enters the terminal death state. Returns `false` if already dying.
    pub(crate) fn perform_death(&mut self) -> bool {
        if self.is_dying {
            return false;
        }
        self.health = 0.0;
        self.is_dying = true;
        self.is_attacking = false;
        self.requested = AnimationState::Death;
        self.clips = [None; CLIP_COUNT];
        true
    }

    /// Starts a fresh life for a pooled character.
    pub(crate) fn reset(&mut self) {
        self.health = FULL_HEALTH;
        self.is_dying = false;
        self.is_attacking = false;
        self.animated = self.profile.animated;
        self.requested = AnimationState::Idle;
        self.collidable = true;
        self.clips = [None; CLIP_COUNT];
    }

    pub(crate) fn move_in(&mut self, direction: MoveDirection, dt: Duration) {
        let distance = self.movement_speed * dt.as_secs_f32();
        match direction {
            MoveDirection::Forward => self.position += heading(self.rotation) * distance,
            MoveDirection::Back => self.position -= heading(self.rotation) * distance,
            MoveDirection::Left => self.rotation += self.profile.rotation_speed,
            MoveDirection::Right => self.rotation -= self.profile.rotation_speed,
        }
        self.request_walk();
    }

    pub(crate) fn face(&mut self, point: Vec2) -> f32 {
        self.rotation = rotation_facing(self.position, point);
        self.rotation
    }

    pub(crate) fn move_towards(&mut self, target: Vec2, dt: Duration) {
        let delta = target - self.position;
        let max_distance = self.movement_speed * dt.as_secs_f32();
        self.move_by(delta, max_distance, None);
        if delta.length() < max_distance {
            self.position = target;
        }
    }

    pub(crate) fn move_in_direction(&mut self, direction: Vec2, dt: Duration, facing: Option<Vec2>) {
        let delta = direction * self.movement_speed;
        let max_distance = self.movement_speed * dt.as_secs_f32();
        self.move_by(delta, max_distance, facing);
    }

    fn move_by(&mut self, delta: Vec2, max_distance: f32, facing: Option<Vec2>) {
        let current = self.position;
        let target = current + delta;
        let angle = adjust_asset_orientation(radians_to_point(target, current));

        let _ = match facing {
            Some(offset) => self.face(current + offset),
            None => self.face(target),
        };

        self.position = if delta.length() < max_distance {
            target
        } else {
            current + heading(angle) * max_distance
        };
        self.request_walk();
    }

    fn request_walk(&mut self) {
        if !self.is_attacking {
            self.request_animation(AnimationState::Walk);
        }
    }

    /// Advances running clips by `dt`, then fires the requested clip.
    pub(crate) fn animate(&mut self, dt: Duration) -> AnimationStep {
        let mut step = AnimationStep::default();

        for state in AnimationState::ALL {
            let slot = &mut self.clips[state.index()];
            if let Some(remaining) = *slot {
                if remaining <= dt {
                    *slot = None;
                    step.completed.push(state);
                } else {
                    *slot = Some(remaining - dt);
                }
            }
        }

        for state in &step.completed {
            self.animation_completed(*state);
        }

        if self.animated {
            step.started = self.resolve_requested_animation();
        }
        step
    }

    fn animation_completed(&mut self, state: AnimationState) {
        if self.is_dying && state == AnimationState::Death {
            self.animated = false;
        }
        if state == AnimationState::Attack {
            self.is_attacking = false;
        }
    }

    fn resolve_requested_animation(&mut self) -> Option<AnimationState> {
        let state = self.requested;
        let slot = &mut self.clips[state.index()];
        let started = match (*slot, self.profile.clips.duration(state)) {
            (None, Some(duration)) => {
                *slot = Some(duration);
                Some(state)
            }
            _ => None,
        };

        self.requested = if self.is_dying {
            AnimationState::Death
        } else {
            AnimationState::Idle
        };
        started
    }
}
