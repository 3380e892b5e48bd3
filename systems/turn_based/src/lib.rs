#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Alternating party and monster turns.
//!
//! During the party's turn every conscious member may act once. The monster
//! turn then resolves sequentially: monsters close enough to the party
//! either strike a random conscious member or take a single tile step
//! toward it.

use std::collections::BTreeSet;

use glam::Vec2;
use gridcrawl_core::{EntityId, MovementModes, Party};
use gridcrawl_system_collision::CollisionIndex;
use gridcrawl_system_combat::{defense, GameContext, Strike};
use gridcrawl_world::TileMap;
use rand::Rng;

/// Side whose turn it is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Turn {
    /// The party may act.
    #[default]
    Party,
    /// Monsters act next.
    Monsters,
}

/// Tally of one monster turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonsterTurnReport {
    /// Monsters that attacked.
    pub attacks: usize,
    /// Monsters that stepped.
    pub moves: usize,
    /// Monsters in range that found no free tile.
    pub forfeits: usize,
}

/// Turn bookkeeping of turn-based mode.
#[derive(Clone, Debug, Default)]
pub struct TurnBased {
    current: Turn,
    acted: BTreeSet<usize>,
    monsters_acted: usize,
    round: u64,
}

impl TurnBased {
    /// Starts on the party's turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Side whose turn it is.
    #[must_use]
    pub const fn current_turn(&self) -> Turn {
        self.current
    }

    /// Completed monster turns.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Monsters that attacked or moved during the last monster turn.
    #[must_use]
    pub const fn monsters_acted(&self) -> usize {
        self.monsters_acted
    }

    /// Reports whether the member already acted this turn.
    #[must_use]
    pub fn has_acted(&self, member: usize) -> bool {
        self.acted.contains(&member)
    }

    /// Returns to the party's turn with no actions spent.
    pub fn reset(&mut self) {
        self.current = Turn::Party;
        self.acted.clear();
    }

    /// Spends the member's action for this turn.
    ///
    /// Once every conscious member has acted the turn passes to the
    /// monsters; the return value reports whether that happened.
    pub fn record_party_action(&mut self, member: usize, party: &Party) -> bool {
        if self.current != Turn::Party {
            return false;
        }
        let _ = self.acted.insert(member);
        let everyone_acted = party
            .members
            .iter()
            .enumerate()
            .filter(|(_, character)| character.is_conscious())
            .all(|(index, _)| self.acted.contains(&index));
        if everyone_acted {
            self.end_party_turn();
        }
        everyone_acted
    }

    /// Hands the turn to the monsters.
    pub fn end_party_turn(&mut self) {
        self.current = Turn::Monsters;
    }

    /// Resolves the monsters' turn and hands control back to the party.
    ///
    /// Monsters within the configured range whose free space to the party
    /// fits their attack radius strike a uniformly random conscious member,
    /// subject to armor and Perfect Dodge. Others step one tile toward the
    /// party, falling back to the free neighbouring tile nearest to the
    /// party, and forfeit when none is free.
    pub fn run_monster_turn(&mut self, ctx: &mut GameContext<'_>) -> MonsterTurnReport {
        let config = ctx.config;
        let collisions = ctx.collisions;
        let tile_size = config.world.tile_size;
        let range = config.monster_ai.turn_based_range_tiles * tile_size;
        let player = ctx.party.position;
        let mut report = MonsterTurnReport::default();

        let (map, monsters) = ctx.world.map_and_monsters_mut();
        for monster in monsters.iter_mut() {
            if !monster.is_alive() {
                continue;
            }
            let distance = monster.position.distance(player);
            if distance > range {
                continue;
            }

            let free_space = distance - (config.world.player_radius + monster.radius);
            let reach = if monster.attack_radius > 0.0 {
                monster.attack_radius
            } else {
                0.25 * tile_size
            };

            if free_space <= reach {
                let conscious: Vec<usize> = ctx
                    .party
                    .members
                    .iter()
                    .enumerate()
                    .filter(|(_, member)| member.is_conscious())
                    .map(|(index, _)| index)
                    .collect();
                if conscious.is_empty() {
                    break;
                }
                let target = conscious[ctx.rng.gen_range(0..conscious.len())];
                let raw_damage = monster.attack_damage(ctx.rng);
                let _ = defense::strike_member(
                    ctx.party,
                    target,
                    Strike {
                        attacker: &monster.name,
                        raw_damage,
                        dodgeable: true,
                    },
                    config.combat.damage_blink_frames,
                    ctx.messages,
                    ctx.rng,
                );
                report.attacks += 1;
                continue;
            }

            let walker = Walker {
                map,
                collisions,
                player,
                tile_size,
            };
            match walker.next_step(&monster.id, monster.position) {
                Some(step) => {
                    monster.position = step;
                    if let Err(error) = collisions.update(&monster.id, step) {
                        log::error!("monster {} is missing from the index: {error}", monster.id);
                    }
                    report.moves += 1;
                }
                None => {
                    log::debug!("{} forfeits its turn", monster.id);
                    report.forfeits += 1;
                }
            }
        }

        self.monsters_acted = report.attacks + report.moves;
        self.round += 1;
        self.reset();
        log::debug!(
            "monster turn {}: {} attacks, {} moves, {} forfeits",
            self.round,
            report.attacks,
            report.moves,
            report.forfeits
        );
        report
    }
}

struct Walker<'a> {
    map: &'a TileMap,
    collisions: &'a CollisionIndex,
    player: Vec2,
    tile_size: f32,
}

impl Walker<'_> {
    fn next_step(&self, id: &EntityId, from: Vec2) -> Option<Vec2> {
        let free = |position: Vec2| {
            self.map.can_move_to(position, MovementModes::NONE)
                && self.collisions.can_move_to(id, position)
        };

        let direct = from + (self.player - from).normalize_or_zero() * self.tile_size;
        if direct != from && free(direct) {
            return Some(direct);
        }

        let mut best: Option<(f32, Vec2)> = None;
        for dy in [-1.0, 0.0, 1.0] {
            for dx in [-1.0, 0.0, 1.0] {
                if dx == 0.0 && dy == 0.0 {
                    continue;
                }
                let candidate = from + Vec2::new(dx, dy) * self.tile_size;
                if !free(candidate) {
                    continue;
                }
                let score = candidate.distance_squared(self.player);
                if best.map_or(true, |(current, _)| score < current) {
                    best = Some((score, candidate));
                }
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}
