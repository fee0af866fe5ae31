//! Players, their heroes, lives and controller bindings.

use std::time::Duration;

use adventure_core::{
    CharacterKind, CharacterRef, ControllerId, Effect, EmitterKind, Event, FadePart, HeroClass,
    HeroId, PlayerSlot, SharedIntent,
};
use log::{info, warn};

use crate::{character::Character, World};

#[derive(Debug)]
pub(crate) struct Hero {
    pub(crate) id: HeroId,
    pub(crate) player: PlayerSlot,
    pub(crate) character: Character,
}

#[derive(Debug)]
pub(crate) struct Player {
    pub(crate) hero: Option<HeroId>,
    pub(crate) class: HeroClass,
    pub(crate) score: u32,
    pub(crate) lives_left: i32,
    pub(crate) controller: Option<ControllerId>,
    pub(crate) intent: SharedIntent,
}

impl Player {
    pub(crate) fn new(lives: i32) -> Self {
        Self {
            hero: None,
            class: HeroClass::default(),
            score: 0,
            lives_left: lives,
            controller: None,
            intent: SharedIntent::default(),
        }
    }
}

impl World {
    pub(crate) fn ensure_player(&mut self, slot: PlayerSlot) -> &mut Player {
        let lives = self.tuning.players.lives;
        self.players[slot.index()].get_or_insert_with(|| Player::new(lives))
    }

    /// Spawns a hero for the player in `slot`, replacing any living hero the
    /// player already controls.
    ///
    /// The hero appears at the last living hero's position, counting the one
    /// being replaced, or at the default spawn point when no hero is alive.
    pub(crate) fn spawn_hero(
        &mut self,
        slot: PlayerSlot,
        out_events: &mut Vec<Event>,
    ) -> Option<HeroId> {
        let player = self.players[slot.index()].as_ref()?;
        let class = player.class;

        let position = self
            .heroes
            .iter()
            .rev()
            .find(|hero| !hero.character.is_dying())
            .map_or(self.default_spawn_point, |hero| hero.character.position());

        if let Some(previous) = player.hero {
            let replaced = self
                .heroes
                .iter()
                .position(|hero| hero.id == previous && !hero.character.is_dying());
            if let Some(index) = replaced {
                let _ = self.heroes.remove(index);
                out_events.push(Event::CharacterRemoved {
                    character: CharacterRef::Hero(previous),
                });
            }
        }

        let id = self.next_hero_id();
        let kind = CharacterKind::Hero(class);
        let character = Character::new(kind, self.tuning.profile(kind), position, std::f32::consts::PI);
        self.heroes.push(Hero {
            id,
            player: slot,
            character,
        });
        if let Some(player) = self.players[slot.index()].as_mut() {
            player.hero = Some(id);
        }

        info!("player {} spawned hero {} at {position}", slot.get(), id.get());
        out_events.push(Event::HeroSpawned {
            hero: id,
            player: slot,
            position,
        });
        out_events.push(Event::EffectRequested {
            effect: Effect::OneShotEmitter {
                kind: EmitterKind::Spawn,
                position,
                duration: Duration::from_secs_f32(self.tuning.players.spawn_effect),
            },
        });
        out_events.push(Event::EffectRequested {
            effect: Effect::Fade {
                character: CharacterRef::Hero(id),
                part: FadePart::Body,
                to_alpha: 1.0,
                duration: Duration::from_secs_f32(self.tuning.players.hero_fade_in),
            },
        });
        Some(id)
    }

    /// Removes a dead hero, charges its player a life and respawns.
    pub(crate) fn hero_killed(&mut self, id: HeroId, out_events: &mut Vec<Event>) {
        let Some(index) = self.heroes.iter().position(|hero| hero.id == id) else {
            return;
        };
        let hero = self.heroes.remove(index);
        let slot = hero.player;

        for cave in &mut self.caves {
            cave.stop_goblins_from_targeting_hero(id);
        }
        if let Some(boss) = self.boss.as_mut() {
            if boss.blackboard.target == Some(id) {
                boss.blackboard.target = None;
            }
        }

        out_events.push(Event::CharacterRemoved {
            character: CharacterRef::Hero(id),
        });
        out_events.push(Event::HeroKilled {
            hero: id,
            player: slot,
        });

        let Some(player) = self.players[slot.index()].as_mut() else {
            return;
        };
        if player.hero == Some(id) {
            player.hero = None;
        }
        player.intent.update(|intent| intent.move_requested = false);
        player.lives_left -= 1;

        if player.lives_left < 0 {
            warn!("player {} has no lives left", slot.get());
            out_events.push(Event::LivesExhausted { player: slot });
            return;
        }

        let lives_left = player.lives_left;
        info!("player {} lost a life, {lives_left} left", slot.get());
        out_events.push(Event::LifeLost {
            player: slot,
            lives_left,
        });

        if let Some(hero) = self.spawn_hero(slot, out_events) {
            if let Some(position) = self.hero(hero).map(|hero| hero.character.position()) {
                self.center_camera_on(position, out_events);
            }
        }
    }

    /// Binds `controller` to the player in `slot`, creating the player if
    /// needed. Secondary players get a hero as soon as they join.
    pub(crate) fn assign_controller(
        &mut self,
        controller: ControllerId,
        slot: PlayerSlot,
        out_events: &mut Vec<Event>,
    ) {
        if let Some(current) = self.players[slot.index()]
            .as_ref()
            .and_then(|player| player.controller)
        {
            if current == controller {
                return;
            }
        }
        self.release_controller(controller, out_events);

        let joined = self.players[slot.index()].is_none();
        let player = self.ensure_player(slot);
        player.controller = Some(controller);
        let needs_hero = player.hero.is_none();

        info!("controller {} assigned to player {}", controller.get(), slot.get());
        out_events.push(Event::ControllerAssigned {
            controller,
            player: slot,
        });

        if joined {
            out_events.push(Event::PlayerJoined { player: slot });
        }
        if slot != PlayerSlot::DEFAULT && needs_hero {
            let _ = self.spawn_hero(slot, out_events);
        }
    }

    /// Unbinds `controller` from whichever player holds it.
    pub(crate) fn release_controller(
        &mut self,
        controller: ControllerId,
        out_events: &mut Vec<Event>,
    ) {
        for slot in PlayerSlot::all() {
            let Some(player) = self.players[slot.index()].as_mut() else {
                continue;
            };
            if player.controller == Some(controller) {
                player.controller = None;
                info!("controller {} released from player {}", controller.get(), slot.get());
                out_events.push(Event::ControllerReleased {
                    controller,
                    player: slot,
                });
            }
        }
    }
}
