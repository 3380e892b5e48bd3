//! Hostile creatures owned by the world.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DamageKind, EncounterId, EntityId};

/// Authoritative state of a single monster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    /// Collision handle of the monster.
    pub id: EntityId,
    /// Catalog key, also used to select loot tables.
    pub key: String,
    /// Display name used in combat messages.
    pub name: String,
    /// Creature family consulted by weapon `bonus_vs` tables.
    pub kind: String,
    /// Center of the monster in world pixels.
    pub position: Vec2,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Radius of the collision body in pixels.
    pub radius: f32,
    /// Reach in pixels used by turn-based melee; zero selects the conservative fallback.
    pub attack_radius: f32,
    /// Lowest attack damage roll.
    pub damage_min: i32,
    /// Highest attack damage roll.
    pub damage_max: i32,
    /// Experience granted on death.
    pub experience: u64,
    /// Gold granted on death.
    pub gold: u64,
    /// Real-time movement speed in pixels per frame.
    pub speed: f32,
    /// Percentage reduction applied to incoming damage per kind.
    pub resistances: BTreeMap<DamageKind, i32>,
    /// Encounter group sharing a rewards record, if any.
    pub encounter: Option<EncounterId>,
    /// Frames left before the next real-time strike.
    pub attack_cooldown: u32,
    /// Set once hit points reach zero.
    pub dead: bool,
}

impl Monster {
    /// Reports whether the monster still has hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Rolls the damage of a single strike.
    pub fn attack_damage<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.damage_max <= self.damage_min {
            return self.damage_min.max(0);
        }
        rng.gen_range(self.damage_min..=self.damage_max).max(0)
    }

    /// Applies damage after resistances and returns the hit points actually removed.
    pub fn take_damage(&mut self, amount: i32, kind: DamageKind) -> i32 {
        if amount <= 0 || !self.is_alive() {
            return 0;
        }
        let resistance = self
            .resistances
            .get(&kind)
            .copied()
            .unwrap_or(0)
            .clamp(0, 100);
        let reduced = amount - amount * resistance / 100;
        let applied = reduced.clamp(0, self.hp);
        self.hp -= applied;
        if self.hp == 0 {
            self.dead = true;
        }
        applied
    }

    /// Destroys the monster outright and returns the hit points it had left.
    pub fn disintegrate(&mut self) -> i32 {
        let remaining = self.hp.max(0);
        self.hp = 0;
        self.dead = true;
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn goblin() -> Monster {
        Monster {
            id: EntityId::new("monster-0"),
            key: "goblin".to_owned(),
            name: "Goblin".to_owned(),
            kind: "humanoid".to_owned(),
            position: Vec2::ZERO,
            hp: 20,
            max_hp: 20,
            radius: 16.0,
            attack_radius: 16.0,
            damage_min: 2,
            damage_max: 6,
            experience: 30,
            gold: 12,
            speed: 1.0,
            resistances: BTreeMap::from([(DamageKind::Fire, 50), (DamageKind::Mind, 100)]),
            encounter: None,
            attack_cooldown: 0,
            dead: false,
        }
    }

    #[test]
    fn damage_is_clamped_to_remaining_hit_points() {
        let mut monster = goblin();
        assert_eq!(monster.take_damage(15, DamageKind::Physical), 15);
        assert_eq!(monster.take_damage(15, DamageKind::Physical), 5);
        assert_eq!(monster.hp, 0);
        assert!(!monster.is_alive());
        assert!(monster.dead);
        assert_eq!(monster.take_damage(15, DamageKind::Physical), 0);
    }

    #[test]
    fn resistances_reduce_matching_damage() {
        let mut monster = goblin();
        assert_eq!(monster.take_damage(10, DamageKind::Fire), 5);
        assert_eq!(monster.take_damage(10, DamageKind::Mind), 0);
        assert_eq!(monster.hp, 15);
    }

    #[test]
    fn disintegration_ignores_resistances() {
        let mut monster = goblin();
        let _ = monster.take_damage(4, DamageKind::Physical);
        assert_eq!(monster.disintegrate(), 16);
        assert!(!monster.is_alive());
    }

    #[test]
    fn attack_rolls_stay_within_range() {
        let monster = goblin();
        let mut rng = crate::GameRng::seed_from_u64(7);
        for _ in 0..64 {
            let damage = monster.attack_damage(&mut rng);
            assert!((2..=6).contains(&damage));
        }
    }
}
