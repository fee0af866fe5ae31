#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Input arbitration for up to four local players.
//!
//! The [`Arbiter`] turns controller connect and disconnect notices into
//! world commands that bind controllers to player slots. Bindings write
//! device input into a player's [`SharedIntent`]; they may run on whatever
//! thread delivers device callbacks and never touch the world.

use adventure_core::{
    Command, ControllerId, PlayerSeat, PlayerSlot, RosterView, SharedIntent, TouchId,
};
use glam::Vec2;
use log::{debug, warn};

/// Stick deflection the aiming stick must exceed before it sets a facing.
pub const AIM_DEAD_ZONE: f32 = 0.5;

/// Controller lifecycle notification delivered by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerNotice {
    /// A controller became available.
    Connected {
        /// Identifier of the controller.
        controller: ControllerId,
        /// Slot the platform already associated with the controller.
        preset: Option<PlayerSlot>,
    },
    /// A controller went away.
    Disconnected {
        /// Identifier of the controller.
        controller: ControllerId,
    },
}

/// Assigns controllers to player slots.
#[derive(Debug, Default)]
pub struct Arbiter {
    unassigned: Vec<ControllerId>,
}

impl Arbiter {
    /// Creates an arbiter with no waiting controllers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Controllers that found no free slot.
    #[must_use]
    pub fn unassigned(&self) -> &[ControllerId] {
        &self.unassigned
    }

    /// Consumes controller notices and emits assignment commands.
    ///
    /// Disconnects are handled first, then controllers carrying a preset
    /// slot, then controllers without one, so a batch of already-connected
    /// devices keeps the slots the platform remembered for them.
    pub fn handle(
        &mut self,
        notices: &[ControllerNotice],
        roster: &RosterView,
        out: &mut Vec<Command>,
    ) {
        let mut view = roster.clone();

        for notice in notices {
            if let ControllerNotice::Disconnected { controller } = *notice {
                self.disconnect(controller, &mut view, out);
            }
        }
        for notice in notices {
            if let ControllerNotice::Connected {
                controller,
                preset: Some(slot),
            } = *notice
            {
                self.connect_preset(controller, slot, &mut view, out);
            }
        }
        for notice in notices {
            if let ControllerNotice::Connected {
                controller,
                preset: None,
            } = *notice
            {
                self.connect_unknown(controller, &mut view, out);
            }
        }
    }

    fn disconnect(&mut self, controller: ControllerId, view: &mut RosterView, out: &mut Vec<Command>) {
        self.unassigned.retain(|waiting| *waiting != controller);
        let Some(slot) = view.slot_of(controller) else {
            debug!("controller {} disconnected without a slot", controller.get());
            return;
        };
        let seat = view.seat(slot).copied().unwrap_or_default();
        view.set_seat(
            slot,
            PlayerSeat {
                controller: None,
                ..seat
            },
        );
        out.push(Command::ReleaseController { controller });
    }

    fn connect_preset(
        &mut self,
        controller: ControllerId,
        slot: PlayerSlot,
        view: &mut RosterView,
        out: &mut Vec<Command>,
    ) {
        if view.slot_of(controller).is_some() {
            return;
        }
        let holder = view.seat(slot).and_then(|seat| seat.controller);
        match holder {
            Some(other) if other != controller => {
                debug!(
                    "slot {} is held by controller {}, reassigning controller {}",
                    slot.get(),
                    other.get(),
                    controller.get()
                );
                self.connect_unknown(controller, view, out);
            }
            _ => assign(controller, slot, view, out),
        }
    }

    fn connect_unknown(&mut self, controller: ControllerId, view: &mut RosterView, out: &mut Vec<Command>) {
        if view.slot_of(controller).is_some() {
            return;
        }
        let free = PlayerSlot::all().find(|slot| {
            view.seat(*slot)
                .map_or(true, |seat| seat.controller.is_none())
        });
        match free {
            Some(slot) => {
                self.unassigned.retain(|waiting| *waiting != controller);
                assign(controller, slot, view, out);
            }
            None => {
                warn!("no free player slot for controller {}", controller.get());
                if !self.unassigned.contains(&controller) {
                    self.unassigned.push(controller);
                }
            }
        }
    }
}

fn assign(controller: ControllerId, slot: PlayerSlot, view: &mut RosterView, out: &mut Vec<Command>) {
    let seat = view.seat(slot).copied().unwrap_or_default();
    view.set_seat(
        slot,
        PlayerSeat {
            controller: Some(controller),
            ..seat
        },
    );
    out.push(Command::AssignController {
        controller,
        player: slot,
    });
}

/// Writes gamepad input into a player's intent.
#[derive(Clone, Debug)]
pub struct GamepadBinding {
    intent: SharedIntent,
}

impl GamepadBinding {
    /// Binds a gamepad to the provided intent cell.
    #[must_use]
    pub fn new(intent: SharedIntent) -> Self {
        Self { intent }
    }

    /// Left stick or d-pad: travel along the normalized direction.
    pub fn move_stick(&self, x: f32, y: f32) {
        let direction = Vec2::new(x, y).normalize_or_zero();
        self.intent
            .update(|intent| intent.hero_move_direction = Some(direction));
    }

    /// Right stick: aim while deflected past [`AIM_DEAD_ZONE`].
    pub fn aim_stick(&self, x: f32, y: f32) {
        let aim = Vec2::new(x, y);
        let facing = (aim.length() > AIM_DEAD_ZONE).then_some(aim);
        self.intent
            .update(|intent| intent.hero_face_location = facing);
    }

    /// Any fire button or trigger.
    pub fn fire(&self, pressed: bool) {
        self.intent.update(|intent| intent.fire_action = pressed);
    }
}

/// Keyboard actions available to the default player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Step forward.
    MoveForward,
    /// Step backward.
    MoveBackward,
    /// Turn left.
    MoveLeft,
    /// Turn right.
    MoveRight,
    /// Attack.
    Fire,
}

impl KeyAction {
    /// Maps a typed character to its action, using WASD and space.
    #[must_use]
    pub fn from_char(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Self::MoveForward),
            's' => Some(Self::MoveBackward),
            'a' => Some(Self::MoveLeft),
            'd' => Some(Self::MoveRight),
            ' ' => Some(Self::Fire),
            _ => None,
        }
    }
}

/// Writes keyboard and touch input into the default player's intent.
#[derive(Clone, Debug)]
pub struct PointerBinding {
    intent: SharedIntent,
}

impl PointerBinding {
    /// Binds keyboard and touch input to the provided intent cell.
    #[must_use]
    pub fn new(intent: SharedIntent) -> Self {
        Self { intent }
    }

    /// Records a key press or release.
    pub fn key(&self, action: KeyAction, down: bool) {
        self.intent.update(|intent| match action {
            KeyAction::MoveForward => intent.move_forward = down,
            KeyAction::MoveBackward => intent.move_backward = down,
            KeyAction::MoveLeft => intent.move_left = down,
            KeyAction::MoveRight => intent.move_right = down,
            KeyAction::Fire => intent.fire_action = down,
        });
    }

    /// A touch landed at `location`. Tapping an enemy fires at it, tapping
    /// anywhere else walks there. Ignored while another touch steers.
    pub fn touch_began(&self, touch: TouchId, location: Vec2, on_enemy: bool) {
        self.intent.update(|intent| {
            if intent.movement_touch.is_some() {
                return;
            }
            intent.movement_touch = Some(touch);
            intent.target_location = Some(location);
            if on_enemy {
                intent.fire_action = true;
            } else {
                intent.move_requested = true;
            }
        });
    }

    /// The steering touch moved; keep walking toward it unless firing.
    pub fn touch_moved(&self, touch: TouchId, location: Vec2) {
        self.intent.update(|intent| {
            if intent.movement_touch != Some(touch) {
                return;
            }
            intent.target_location = Some(location);
            if !intent.fire_action {
                intent.move_requested = true;
            }
        });
    }

    /// The steering touch lifted.
    pub fn touch_ended(&self, touch: TouchId) {
        self.intent.update(|intent| {
            if intent.movement_touch != Some(touch) {
                return;
            }
            intent.movement_touch = None;
            intent.fire_action = false;
        });
    }
}
