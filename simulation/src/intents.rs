use std::f32::consts::TAU;

use glam::Vec2;
use gridcrawl_core::EntityId;
use gridcrawl_world::query;

use crate::{lock_free, Mode, Simulation, Turn};

/// Player request consumed during the input phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    /// Walk relative to the facing, in pixels.
    Move {
        /// Distance along the facing.
        forward: f32,
        /// Distance to the right of the facing.
        strafe: f32,
    },
    /// Rotate the facing by the given radians.
    Turn {
        /// Signed rotation.
        radians: f32,
    },
    /// Make another member the active one.
    SelectMember(usize),
    /// Swing or shoot the active member's weapon.
    MeleeAttack,
    /// Cast the active member's equipped spell.
    CastEquippedSpell,
    /// Cast the spell chosen from the active member's spellbook.
    CastSelectedSpell,
    /// Heal the given member with the active member's equipped heal.
    CastHealOn(usize),
    /// Use a backpack consumable on a member.
    UseItem {
        /// Member receiving the effect.
        member: usize,
        /// Backpack slot of the consumable.
        inventory_index: usize,
    },
    /// Switch between real-time and turn-based play.
    ToggleTurnBased,
    /// Pass the rest of the party's turn to the monsters.
    EndTurn,
}

impl Simulation {
    /// Applies one intent immediately and reports whether it took effect.
    ///
    /// In turn-based mode actions are refused outside the party's turn and
    /// for members who already acted; movement, turning and selection stay
    /// free.
    pub fn apply_intent(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Move { forward, strafe } => self.move_party(forward, strafe),
            Intent::Turn { radians } => {
                let party = &mut self.state.party;
                party.angle = (party.angle + radians).rem_euclid(TAU);
                true
            }
            Intent::SelectMember(index) => self.state.party.select(index),
            Intent::ToggleTurnBased => {
                self.toggle_mode();
                true
            }
            Intent::EndTurn => {
                if self.mode != Mode::TurnBased || self.turns.current_turn() != Turn::Party {
                    return false;
                }
                self.turns.end_party_turn();
                true
            }
            action => self.perform_action(action),
        }
    }

    fn perform_action(&mut self, action: Intent) -> bool {
        let actor = self.state.party.selected;
        if self.mode == Mode::TurnBased
            && (self.turns.current_turn() != Turn::Party || self.turns.has_acted(actor))
        {
            log::debug!("member {actor} cannot act now");
            return false;
        }

        let projectiles = lock_free(&mut self.projectiles);
        let mut ctx = self.state.context(projectiles);
        let resolver = &mut self.resolver;
        let acted = match action {
            Intent::MeleeAttack => resolver.equipped_melee(&mut ctx),
            Intent::CastEquippedSpell => resolver.cast_equipped_spell(&mut ctx),
            Intent::CastSelectedSpell => resolver.cast_selected_spell(&mut ctx),
            Intent::CastHealOn(target) => resolver.cast_equipped_heal_on_target(&mut ctx, target),
            Intent::UseItem {
                member,
                inventory_index,
            } => resolver.use_consumable(&mut ctx, member, inventory_index),
            _ => false,
        };

        if acted
            && self.mode == Mode::TurnBased
            && self.turns.record_party_action(actor, &self.state.party)
        {
            log::debug!("every member acted; monsters move");
        }
        acted
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            Mode::RealTime => {
                self.turns.reset();
                Mode::TurnBased
            }
            Mode::TurnBased => Mode::RealTime,
        };
        log::info!("switched to {:?} mode", self.mode);
    }

    /// Moves the party body, sliding along a blocked axis.
    fn move_party(&mut self, forward: f32, strafe: f32) -> bool {
        let party = &self.state.party;
        let facing = Vec2::from_angle(party.angle);
        let delta = facing * forward + facing.perp() * strafe;
        if delta == Vec2::ZERO {
            return false;
        }

        let from = party.position;
        let modes = party.movement_modes();
        let map = query::map(&self.state.world);
        let collisions = &self.state.collisions;
        let player = EntityId::player();
        let free = |position: Vec2| {
            map.can_move_to(position, modes) && collisions.can_move_to(&player, position)
        };

        let candidates = [
            from + delta,
            from + Vec2::new(delta.x, 0.0),
            from + Vec2::new(0.0, delta.y),
        ];
        let Some(target) = candidates
            .into_iter()
            .find(|&candidate| candidate != from && free(candidate))
        else {
            return false;
        };
        self.place_party(target);
        true
    }
}
