use std::f32::consts::PI;

use gridcrawl_core::{ConsumableEffect, ItemKind, Monster, Party};
use gridcrawl_simulation::{Intent, Mode, Simulation, Turn};
use gridcrawl_world::query;

/// Facing error tolerated before the autopilot turns.
const AIM_TOLERANCE: f32 = 0.05;

/// Scripted player that hunts the nearest monster.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Autopilot {
    walk_speed: f32,
    engage_distance: f32,
}

impl Autopilot {
    pub(crate) fn new(tile_size: f32) -> Self {
        Self {
            walk_speed: tile_size / 16.0,
            engage_distance: tile_size * 1.25,
        }
    }

    /// Intents for the upcoming tick.
    pub(crate) fn plan(&self, tick: u64, session: &Simulation) -> Vec<Intent> {
        let party = session.party();
        let mut intents = Vec::new();

        if let Some(intent) = drink_if_wounded(party) {
            intents.push(intent);
        }

        let Some(target) = nearest_monster(party, query::monsters(session.world())) else {
            if tick % 90 == 0 {
                intents.push(Intent::Turn { radians: 0.9 });
            }
            intents.push(Intent::Move {
                forward: self.walk_speed,
                strafe: 0.0,
            });
            return intents;
        };

        let offset = target.position - party.position;
        let error = wrap_angle(offset.y.atan2(offset.x) - party.angle);
        if error.abs() > AIM_TOLERANCE {
            intents.push(Intent::Turn { radians: error });
        }
        if offset.length() > self.engage_distance {
            intents.push(Intent::Move {
                forward: self.walk_speed,
                strafe: 0.0,
            });
        }

        match session.mode() {
            Mode::RealTime => {
                if tick % 30 == 0 {
                    intents.push(Intent::SelectMember(0));
                    intents.push(Intent::MeleeAttack);
                }
                if tick % 45 == 15 {
                    for (index, member) in party.members.iter().enumerate().skip(1) {
                        if member.equipped_spell.is_some() {
                            intents.push(Intent::SelectMember(index));
                            intents.push(Intent::CastEquippedSpell);
                        }
                    }
                }
            }
            Mode::TurnBased => {
                if session.turns().current_turn() == Turn::Party {
                    for (index, member) in party.members.iter().enumerate() {
                        if !member.is_conscious() || session.turns().has_acted(index) {
                            continue;
                        }
                        intents.push(Intent::SelectMember(index));
                        intents.push(if member.equipped_spell.is_some() {
                            Intent::CastEquippedSpell
                        } else {
                            Intent::MeleeAttack
                        });
                    }
                    intents.push(Intent::EndTurn);
                }
            }
        }
        intents
    }
}

fn drink_if_wounded(party: &Party) -> Option<Intent> {
    let member = party
        .members
        .iter()
        .position(|member| member.is_conscious() && member.hp * 3 < member.max_hp)?;
    let inventory_index = party.inventory.iter().position(|item| {
        matches!(
            item.kind,
            ItemKind::Consumable(Some(ConsumableEffect::RestoreHp { .. }))
        )
    })?;
    Some(Intent::UseItem {
        member,
        inventory_index,
    })
}

fn nearest_monster<'a>(party: &Party, monsters: &'a [Monster]) -> Option<&'a Monster> {
    monsters
        .iter()
        .filter(|monster| monster.is_alive())
        .min_by(|a, b| {
            a.position
                .distance_squared(party.position)
                .total_cmp(&b.position.distance_squared(party.position))
        })
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
