//! Items carried in the party inventory or equipped by characters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Condition, DamageKind, EquipSlot, SkillKind};

/// Weapon families; each maps onto a trainable skill and a hitbox tuning entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    /// Swords.
    Sword,
    /// Daggers.
    Dagger,
    /// Axes.
    Axe,
    /// Maces.
    Mace,
    /// Spears.
    Spear,
    /// Staves.
    Staff,
    /// Bows.
    Bow,
}

impl WeaponCategory {
    /// Skill trained by wielding weapons of this category.
    #[must_use]
    pub const fn skill(self) -> SkillKind {
        match self {
            Self::Sword => SkillKind::Sword,
            Self::Dagger => SkillKind::Dagger,
            Self::Axe => SkillKind::Axe,
            Self::Mace => SkillKind::Mace,
            Self::Spear => SkillKind::Spear,
            Self::Staff => SkillKind::Staff,
            Self::Bow => SkillKind::Bow,
        }
    }
}

/// Armor families; accessories have no governing skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorCategory {
    /// Leather armor.
    Leather,
    /// Chain armor.
    Chain,
    /// Plate armor.
    Plate,
    /// Shields.
    Shield,
    /// Helmets, boots, belts and other pieces without a skill.
    Accessory,
}

impl ArmorCategory {
    /// Skill that grants a mastery bonus for this category, if any.
    #[must_use]
    pub const fn skill(self) -> Option<SkillKind> {
        match self {
            Self::Leather => Some(SkillKind::Leather),
            Self::Chain => Some(SkillKind::Chain),
            Self::Plate => Some(SkillKind::Plate),
            Self::Shield => Some(SkillKind::Shield),
            Self::Accessory => None,
        }
    }
}

/// Scarcity tier of an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Found everywhere.
    #[default]
    Common,
    /// Occasionally dropped.
    Uncommon,
    /// Seldom dropped.
    Rare,
    /// One of a kind.
    Legendary,
}

/// Combat properties of a weapon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Weapon family.
    pub category: WeaponCategory,
    /// Scarcity tier.
    pub rarity: Rarity,
    /// Lowest base damage roll.
    pub damage_min: i32,
    /// Highest base damage roll.
    pub damage_max: i32,
    /// Reach measured in tiles; values above the melee threshold fire arrows.
    pub range_tiles: f32,
    /// Probability in `[0, 1]` that a hit deals double damage.
    pub crit_chance: f32,
    /// Damage multipliers keyed by monster kind.
    pub bonus_vs: BTreeMap<String, f32>,
    /// Damage kind recorded for the weapon.
    pub damage_kind: DamageKind,
    /// Probability in `[0, 1]` that a hit destroys the target outright.
    pub disintegrate_chance: f32,
}

impl WeaponStats {
    /// Damage multiplier applied against monsters of the provided kind.
    #[must_use]
    pub fn multiplier_against(&self, monster_kind: &str) -> f32 {
        self.bonus_vs.get(monster_kind).copied().unwrap_or(1.0)
    }
}

/// Defensive properties of an armor piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmorStats {
    /// Slot the piece occupies.
    pub slot: EquipSlot,
    /// Armor family.
    pub category: ArmorCategory,
    /// Flat armor class contributed by the piece.
    pub armor_class: i32,
    /// Effective endurance is divided by this value and added; zero disables the term.
    pub endurance_divisor: i32,
}

/// Effect applied when a consumable is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ConsumableEffect {
    /// Restores hit points.
    RestoreHp {
        /// Hit points restored.
        amount: i32,
    },
    /// Restores spell points.
    RestoreSp {
        /// Spell points restored.
        amount: i32,
    },
    /// Removes a condition.
    CureCondition {
        /// Condition removed.
        condition: Condition,
    },
}

/// Behavioral category of an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Wieldable weapon.
    Weapon(WeaponStats),
    /// Wearable armor.
    Armor(ArmorStats),
    /// Single-use item; `None` marks a definition without a usable effect.
    Consumable(Option<ConsumableEffect>),
    /// Trade goods and quest items.
    Misc,
}

/// Concrete item instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Catalog key the item was created from.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Behavioral category.
    pub kind: ItemKind,
}

impl Item {
    /// Weapon properties, if the item is a weapon.
    #[must_use]
    pub fn weapon(&self) -> Option<&WeaponStats> {
        match &self.kind {
            ItemKind::Weapon(stats) => Some(stats),
            _ => None,
        }
    }

    /// Armor properties, if the item is armor.
    #[must_use]
    pub fn armor(&self) -> Option<&ArmorStats> {
        match &self.kind {
            ItemKind::Armor(stats) => Some(stats),
            _ => None,
        }
    }
}
