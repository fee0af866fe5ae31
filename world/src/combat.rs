//! Contact resolution: damage, scoring and death consequences.

use std::{f32::consts::PI, time::Duration};

use adventure_core::{
    geometry::unit_random, AnimationState, Body, CaveId, CharacterRef, ColliderCategory, Contact, DecalKind, Effect,
    EmitterKind, Event, FadePart, GoblinId, HeroId, NodeRef, PlayerSlot, ProjectileId,
    SmokeChange,
};
use log::{debug, info};
use rand::Rng;

use crate::{character::DamageOutcome, deadline::Deferred, World};

/// Projectile involved in a contact that can still deal damage.
#[derive(Clone, Copy, Debug)]
struct Strike {
    owner: PlayerSlot,
    attenuation: f32,
}

impl World {
    /// Resolves a physics contact between two bodies.
    ///
    /// Each character side reacts to the other, then every projectile
    /// involved is consumed and leaves a spark behind.
    pub(crate) fn resolve_contact(&mut self, contact: Contact, out_events: &mut Vec<Event>) {
        self.collided(contact.a, contact.b, out_events);
        self.collided(contact.b, contact.a, out_events);

        for body in [contact.a, contact.b] {
            if !body.category.contains(ColliderCategory::PROJECTILE) {
                continue;
            }
            if let Some(NodeRef::Projectile(id)) = body.node {
                self.consume_projectile(id, out_events);
            }
        }
    }

    fn collided(&mut self, this: Body, other: Body, out_events: &mut Vec<Event>) {
        let Some(NodeRef::Character(who)) = this.node else {
            return;
        };
        match who {
            CharacterRef::Hero(id) => self.hero_collided(id, other, out_events),
            CharacterRef::Goblin(id) => self.goblin_collided(id, other, out_events),
            CharacterRef::Boss => self.boss_collided(other, out_events),
            CharacterRef::Cave(id) => self.cave_collided(id, other, out_events),
        }
    }

    fn hero_collided(&mut self, id: HeroId, other: Body, out_events: &mut Vec<Event>) {
        if !other.category.intersects(ColliderCategory::GOBLIN_OR_BOSS) {
            return;
        }
        let Some(NodeRef::Character(enemy)) = other.node else {
            return;
        };
        if self.character(enemy).map_or(true, |enemy| enemy.is_dying()) {
            return;
        }

        let damage = self.tuning.combat.hero_contact_damage;
        let Some(hero) = self.living_hero_mut(id) else {
            return;
        };
        hero.character.request_animation(AnimationState::GetHit);
        let outcome = hero.character.apply_damage(damage, 1.0);
        self.after_damage(CharacterRef::Hero(id), outcome, out_events);
    }

    fn goblin_collided(&mut self, id: GoblinId, other: Body, out_events: &mut Vec<Event>) {
        let who = CharacterRef::Goblin(id);
        let Some(strike) = self.strike(other) else {
            return;
        };
        if self.character(who).map_or(true, |goblin| goblin.is_dying()) {
            return;
        }

        let combat = &self.tuning.combat;
        let damage = if self.rng.gen_bool(combat.goblin_heavy_chance) {
            combat.goblin_heavy_damage
        } else {
            combat.goblin_light_damage
        };
        let score = combat.goblin_score;

        let outcome = self.strike_character(who, damage, strike);
        self.after_damage(who, outcome, out_events);
        if outcome == DamageOutcome::Killed {
            self.award(strike.owner, score, out_events);
        }
    }

    fn boss_collided(&mut self, other: Body, out_events: &mut Vec<Event>) {
        let who = CharacterRef::Boss;
        let Some(strike) = self.strike(other) else {
            return;
        };
        if self.character(who).map_or(true, |boss| boss.is_dying()) {
            return;
        }

        let damage = self.tuning.combat.boss_damage;
        let score = self.tuning.combat.boss_score;
        let outcome = self.strike_character(who, damage, strike);
        self.after_damage(who, outcome, out_events);
        if outcome == DamageOutcome::Killed {
            info!("boss defeated by player {}", strike.owner.get());
            self.award(strike.owner, score, out_events);
        }
    }

    fn cave_collided(&mut self, id: CaveId, other: Body, out_events: &mut Vec<Event>) {
        if self.strike(other).is_none() {
            return;
        }
        let threshold = self.tuning.combat.cave_smoke_threshold;
        let damage = self.tuning.combat.cave_damage;
        let Some(cave) = self.caves.iter_mut().find(|cave| cave.id == id) else {
            return;
        };
        if cave.enemy.character.health() <= 0.0 {
            return;
        }

        let outcome = cave.enemy.character.apply_damage(damage, 1.0);
        if cave.ignite_smoke(threshold) {
            out_events.push(Event::EffectRequested {
                effect: Effect::CaveSmoke {
                    cave: id,
                    change: SmokeChange::Started,
                },
            });
        }
        self.after_damage(CharacterRef::Cave(id), outcome, out_events);
        if outcome == DamageOutcome::Killed {
            out_events.push(Event::EffectRequested {
                effect: Effect::DamageFlash {
                    character: CharacterRef::Cave(id),
                },
            });
        }
    }

    /// Live projectile on the other side of a contact.
    ///
    /// Projectiles already consumed this tick no longer deal damage.
    fn strike(&self, other: Body) -> Option<Strike> {
        if !other.category.contains(ColliderCategory::PROJECTILE) {
            return None;
        }
        let Some(NodeRef::Projectile(id)) = other.node else {
            return None;
        };
        self.projectiles
            .iter()
            .find(|projectile| projectile.id == id)
            .map(|projectile| Strike {
                owner: projectile.owner,
                attenuation: projectile.alpha(&self.tuning.projectile),
            })
    }

    fn strike_character(&mut self, who: CharacterRef, damage: f32, strike: Strike) -> DamageOutcome {
        let Some(character) = self.character_mut(who) else {
            return DamageOutcome::Ignored;
        };
        character.request_animation(AnimationState::GetHit);
        character.apply_damage(damage, strike.attenuation)
    }

    fn after_damage(&mut self, who: CharacterRef, outcome: DamageOutcome, out_events: &mut Vec<Event>) {
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Wounded => {
                let Some(character) = self.character(who) else {
                    return;
                };
                let (health, position) = (character.health(), character.position());
                out_events.push(Event::CharacterWounded {
                    character: who,
                    health,
                });
                out_events.push(Event::EffectRequested {
                    effect: Effect::OneShotEmitter {
                        kind: EmitterKind::Damage,
                        position,
                        duration: Duration::from_secs_f32(self.tuning.combat.damage_feedback),
                    },
                });
                out_events.push(Event::EffectRequested {
                    effect: Effect::DamageFlash { character: who },
                });
            }
            DamageOutcome::Killed => self.character_died(who, out_events),
        }
    }

    fn character_died(&mut self, who: CharacterRef, out_events: &mut Vec<Event>) {
        debug!("{who:?} died");
        out_events.push(Event::CharacterDied { character: who });

        match who {
            CharacterRef::Hero(_) | CharacterRef::Boss => {}
            CharacterRef::Goblin(_) => {
                let Some(goblin) = self.character_mut(who) else {
                    return;
                };
                goblin.remove_body();
                let position = goblin.position();
                let rotation = unit_random(&mut self.rng) * PI;
                out_events.push(Event::EffectRequested {
                    effect: Effect::Decal {
                        kind: DecalKind::GoblinSplat,
                        position,
                        rotation,
                    },
                });
            }
            CharacterRef::Cave(id) => self.cave_destroyed(id, out_events),
        }
    }

    fn cave_destroyed(&mut self, id: CaveId, out_events: &mut Vec<Event>) {
        let Some(cave) = self.caves.iter_mut().find(|cave| cave.id == id) else {
            return;
        };
        info!("cave {} destroyed", id.get());
        cave.enemy.character.remove_body();
        let character = &cave.enemy.character;
        let fade = Duration::from_secs_f32(character.profile().fade_out);
        out_events.push(Event::EffectRequested {
            effect: Effect::Decal {
                kind: DecalKind::CaveRuin,
                position: character.position(),
                rotation: character.rotation(),
            },
        });
        out_events.push(Event::EffectRequested {
            effect: Effect::Fade {
                character: CharacterRef::Cave(id),
                part: FadePart::Body,
                to_alpha: 0.0,
                duration: fade,
            },
        });

        let now = self.clock;
        self.deadlines.schedule(now + fade, Deferred::WithdrawCave(id));
        if cave.smoking() {
            self.deadlines.schedule(
                now + Duration::from_secs(2),
                Deferred::Smoke {
                    cave: id,
                    birth_rate: 2.0,
                },
            );
            self.deadlines.schedule(
                now + Duration::from_secs(4),
                Deferred::Smoke {
                    cave: id,
                    birth_rate: 0.0,
                },
            );
            self.deadlines
                .schedule(now + Duration::from_secs(14), Deferred::ClearSmoke(id));
        }
    }

    fn award(&mut self, slot: PlayerSlot, points: u32, out_events: &mut Vec<Event>) {
        let Some(player) = self.players[slot.index()].as_mut() else {
            return;
        };
        player.score = player.score.saturating_add(points);
        out_events.push(Event::ScoreChanged {
            player: slot,
            score: player.score,
        });
    }

    fn consume_projectile(&mut self, id: ProjectileId, out_events: &mut Vec<Event>) {
        let Some(index) = self
            .projectiles
            .iter()
            .position(|projectile| projectile.id == id)
        else {
            return;
        };
        let projectile = self.projectiles.remove(index);
        out_events.push(Event::ProjectileRemoved {
            projectile: id,
            position: projectile.position,
        });
        out_events.push(Event::EffectRequested {
            effect: Effect::OneShotEmitter {
                kind: EmitterKind::Spark,
                position: projectile.position,
                duration: Duration::from_secs_f32(self.tuning.combat.spark),
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adventure_core::{
        Blackboard, Command, Decision, HeroClass, Intelligence, Perception, Tuning,
    };
    use glam::Vec2;
    use rand::RngCore;

    use crate::{apply, query, WorldBuilder};

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

    fn world() -> World {
        let mut tuning = Tuning::default();
        tuning.combat.goblin_heavy_damage = 50.0;
        WorldBuilder::new(tuning, 3)
            .default_spawn_point(Vec2::ZERO)
            .cave(Vec2::new(400.0, 0.0), 0.0, Box::new(Dormant), || Box::new(Dormant))
            .boss(Vec2::new(-400.0, 0.0), Box::new(Dormant))
            .build()
            .expect("world builds")
    }

    fn projectile_body(id: ProjectileId) -> Body {
        Body {
            category: ColliderCategory::PROJECTILE,
            node: Some(NodeRef::Projectile(id)),
        }
    }

    fn character_body(who: CharacterRef, category: ColliderCategory) -> Body {
        Body {
            category,
            node: Some(NodeRef::Character(who)),
        }
    }

    fn fire(world: &mut World, events: &mut Vec<Event>) -> ProjectileId {
        let id = world.next_projectile_id();
        world
            .projectiles
            .push(crate::projectile::Projectile::launch(id, PlayerSlot::DEFAULT, Vec2::ZERO, 0.0));
        events.clear();
        id
    }

    #[test]
    fn unknown_projectile_deals_no_damage() {
        let mut world = world();
        let mut events = Vec::new();
        world.resolve_contact(
            Contact {
                a: character_body(CharacterRef::Boss, ColliderCategory::GOBLIN_OR_BOSS),
                b: projectile_body(ProjectileId::new(99)),
            },
            &mut events,
        );
        assert!(events.is_empty());
        let boss = query::character(&world, CharacterRef::Boss).expect("boss exists");
        assert_eq!(boss.health, 100.0);
    }

    #[test]
    fn projectile_is_consumed_with_a_spark() {
        let mut world = world();
        let mut events = Vec::new();
        let id = fire(&mut world, &mut events);
        world.resolve_contact(
            Contact {
                a: projectile_body(id),
                b: Body {
                    category: ColliderCategory::WALL,
                    node: Some(NodeRef::Wall),
                },
            },
            &mut events,
        );
        assert!(query::projectiles(&world).is_empty());
        assert!(events.iter().any(|event| matches!(
            event,
            Event::EffectRequested {
                effect: Effect::OneShotEmitter {
                    kind: EmitterKind::Spark,
                    ..
                }
            }
        )));
    }

    #[test]
    fn boss_hit_scales_by_projectile_alpha() {
        let mut world = world();
        let mut events = Vec::new();
        let id = fire(&mut world, &mut events);
        world.resolve_contact(
            Contact {
                a: character_body(CharacterRef::Boss, ColliderCategory::GOBLIN_OR_BOSS),
                b: projectile_body(id),
            },
            &mut events,
        );
        let boss = query::character(&world, CharacterRef::Boss).expect("boss exists");
        assert_eq!(boss.health, 98.0);
        assert_eq!(boss.requested_animation, AnimationState::GetHit);
    }

    #[test]
    fn cave_smokes_then_crumbles() {
        let mut world = world();
        let mut events = Vec::new();
        let cave = CharacterRef::Cave(CaveId::new(0));
        let mut smoke_started = 0;
        for _ in 0..10 {
            let id = fire(&mut world, &mut events);
            world.resolve_contact(
                Contact {
                    a: character_body(cave, ColliderCategory::CAVE),
                    b: projectile_body(id),
                },
                &mut events,
            );
            smoke_started += events
                .iter()
                .filter(|event| matches!(
                    event,
                    Event::EffectRequested {
                        effect: Effect::CaveSmoke {
                            change: SmokeChange::Started,
                            ..
                        }
                    }
                ))
                .count();
        }

        assert_eq!(smoke_started, 1);
        assert!(events.contains(&Event::CharacterDied { character: cave }));
        let caves = query::caves(&world);
        assert!(caves[0].smoking);
        assert!(!caves[0].character.collidable);
        assert_eq!(query::pending_deadlines(&world), 4);
    }

    #[test]
    fn hero_takes_contact_damage_from_living_enemies() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StartLevel {
                class: HeroClass::Warrior,
            },
            &mut events,
        );
        let hero = query::heroes(&world)[0].character;

        world.resolve_contact(
            Contact {
                a: character_body(hero, ColliderCategory::HERO),
                b: character_body(CharacterRef::Boss, ColliderCategory::GOBLIN_OR_BOSS),
            },
            &mut events,
        );

        let snapshot = query::character(&world, hero).expect("hero exists");
        assert_eq!(snapshot.health, 95.0);
        assert!(events.contains(&Event::CharacterWounded {
            character: hero,
            health: 95.0,
        }));
    }
}
