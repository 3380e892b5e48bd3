//! Weapon, armor and consumable definitions.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use gridcrawl_core::{
    ArmorCategory, ArmorStats, Condition, ConsumableEffect, DamageKind, EquipSlot, Item, ItemKind,
    Rarity, WeaponCategory, WeaponStats,
};
use serde::Deserialize;

use crate::CatalogError;

#[derive(Debug, Deserialize)]
struct WeaponEntry {
    name: String,
    category: WeaponCategory,
    #[serde(default)]
    rarity: Rarity,
    damage_min: i32,
    damage_max: i32,
    #[serde(default = "default_range")]
    range_tiles: f32,
    #[serde(default)]
    crit_chance: f32,
    #[serde(default)]
    bonus_vs: BTreeMap<String, f32>,
    #[serde(default = "default_damage_type")]
    damage_type: DamageKind,
    #[serde(default)]
    disintegrate_chance: f32,
}

fn default_range() -> f32 {
    1.0
}

fn default_damage_type() -> DamageKind {
    DamageKind::Physical
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ConsumableEffectKind {
    RestoreHp,
    RestoreSp,
    CureCondition,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ItemEntry {
    Armor {
        name: String,
        slot: EquipSlot,
        category: ArmorCategory,
        armor_class: i32,
        #[serde(default)]
        endurance_divisor: i32,
    },
    Consumable {
        name: String,
        #[serde(default)]
        effect: Option<ConsumableEffectKind>,
        #[serde(default)]
        amount: Option<i32>,
        #[serde(default)]
        condition: Option<Condition>,
    },
    Misc {
        name: String,
    },
}

impl ItemEntry {
    fn into_item(self, key: &str) -> Result<Item> {
        let (name, kind) = match self {
            Self::Armor {
                name,
                slot,
                category,
                armor_class,
                endurance_divisor,
            } => {
                if !slot.is_armor_slot() {
                    bail!("armor `{key}` occupies non-armor slot {slot:?}");
                }
                if endurance_divisor < 0 {
                    bail!("armor `{key}` has a negative endurance divisor");
                }
                (
                    name,
                    ItemKind::Armor(ArmorStats {
                        slot,
                        category,
                        armor_class,
                        endurance_divisor,
                    }),
                )
            }
            Self::Consumable {
                name,
                effect,
                amount,
                condition,
            } => {
                let effect = match (effect, amount, condition) {
                    (Some(ConsumableEffectKind::RestoreHp), Some(amount), _) if amount > 0 => {
                        Some(ConsumableEffect::RestoreHp { amount })
                    }
                    (Some(ConsumableEffectKind::RestoreSp), Some(amount), _) if amount > 0 => {
                        Some(ConsumableEffect::RestoreSp { amount })
                    }
                    (Some(ConsumableEffectKind::CureCondition), _, Some(condition)) => {
                        Some(ConsumableEffect::CureCondition { condition })
                    }
                    _ => {
                        log::warn!("consumable `{key}` has no usable effect");
                        None
                    }
                };
                (name, ItemKind::Consumable(effect))
            }
            Self::Misc { name } => (name, ItemKind::Misc),
        };
        Ok(Item {
            key: key.to_owned(),
            name,
            kind,
        })
    }
}

/// Read-only table of item templates keyed by catalog key.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: BTreeMap<String, Item>,
}

impl ItemCatalog {
    /// Parses the weapon table and the armor, consumable and misc table.
    pub fn from_toml(weapons: &str, items: &str) -> Result<Self> {
        let weapon_entries: BTreeMap<String, WeaponEntry> =
            toml::from_str(weapons).context("failed to parse weapon catalog toml contents")?;
        let item_entries: BTreeMap<String, ItemEntry> =
            toml::from_str(items).context("failed to parse item catalog toml contents")?;

        let mut catalog = BTreeMap::new();
        for (key, entry) in weapon_entries {
            let item = weapon_item(&key, entry)?;
            let _ = catalog.insert(key, item);
        }
        for (key, entry) in item_entries {
            let item = entry
                .into_item(&key)
                .with_context(|| format!("invalid item definition `{key}`"))?;
            if catalog.insert(key.clone(), item).is_some() {
                bail!("item key `{key}` is defined as both a weapon and an item");
            }
        }

        Ok(Self { items: catalog })
    }

    /// Creates a fresh instance of the item with the given key.
    pub fn item(&self, key: &str) -> Result<Item, CatalogError> {
        self.items
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownItem(key.to_owned()))
    }

    /// Creates a fresh instance of the weapon with the given key.
    pub fn weapon(&self, key: &str) -> Result<Item, CatalogError> {
        let item = self.item(key)?;
        if item.weapon().is_none() {
            return Err(CatalogError::NotAWeapon(key.to_owned()));
        }
        Ok(item)
    }

    /// Weapon properties of the weapon with the given key.
    #[must_use]
    pub fn weapon_stats(&self, key: &str) -> Option<&WeaponStats> {
        self.items.get(key).and_then(Item::weapon)
    }

    /// Reports whether an item with the given key exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Number of item templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn weapon_item(key: &str, entry: WeaponEntry) -> Result<Item> {
    if entry.damage_min < 0 || entry.damage_max < entry.damage_min {
        bail!(
            "weapon `{key}` has an invalid damage range {}..={}",
            entry.damage_min,
            entry.damage_max
        );
    }
    for (label, chance) in [
        ("crit_chance", entry.crit_chance),
        ("disintegrate_chance", entry.disintegrate_chance),
    ] {
        if !(0.0..=1.0).contains(&chance) {
            bail!("weapon `{key}` {label} {chance} lies outside [0, 1]");
        }
    }
    if entry.range_tiles <= 0.0 {
        bail!("weapon `{key}` needs a positive range");
    }
    Ok(Item {
        key: key.to_owned(),
        name: entry.name,
        kind: ItemKind::Weapon(WeaponStats {
            category: entry.category,
            rarity: entry.rarity,
            damage_min: entry.damage_min,
            damage_max: entry.damage_max,
            range_tiles: entry.range_tiles,
            crit_chance: entry.crit_chance,
            bonus_vs: entry.bonus_vs,
            damage_kind: entry.damage_type,
            disintegrate_chance: entry.disintegrate_chance,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEAPONS: &str = r#"
        [longsword]
        name = "Longsword"
        category = "sword"
        damage_min = 3
        damage_max = 9
        crit_chance = 0.05

        [longsword.bonus_vs]
        undead = 1.5

        [short_bow]
        name = "Short Bow"
        category = "bow"
        rarity = "uncommon"
        damage_min = 2
        damage_max = 6
        range_tiles = 12.0
    "#;

    const ITEMS: &str = r#"
        [leather_armor]
        type = "armor"
        name = "Leather Armor"
        slot = "body"
        category = "leather"
        armor_class = 6
        endurance_divisor = 5

        [healing_potion]
        type = "consumable"
        name = "Healing Potion"
        effect = "restore_hp"
        amount = 25

        [murky_flask]
        type = "consumable"
        name = "Murky Flask"

        [silver_locket]
        type = "misc"
        name = "Silver Locket"
    "#;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_toml(WEAPONS, ITEMS).expect("valid items")
    }

    #[test]
    fn weapons_carry_modifiers() {
        let catalog = catalog();
        let sword = catalog.weapon_stats("longsword").expect("sword");
        assert_eq!(sword.category, WeaponCategory::Sword);
        assert!((sword.multiplier_against("undead") - 1.5).abs() < f32::EPSILON);
        assert!((sword.multiplier_against("beast") - 1.0).abs() < f32::EPSILON);
        assert_eq!(sword.damage_kind, DamageKind::Physical);

        let bow = catalog.weapon_stats("short_bow").expect("bow");
        assert_eq!(bow.rarity, Rarity::Uncommon);
    }

    #[test]
    fn consumables_without_effect_stay_loadable() {
        let catalog = catalog();
        let potion = catalog.item("healing_potion").expect("potion");
        assert_eq!(
            potion.kind,
            ItemKind::Consumable(Some(ConsumableEffect::RestoreHp { amount: 25 }))
        );
        let flask = catalog.item("murky_flask").expect("flask");
        assert_eq!(flask.kind, ItemKind::Consumable(None));
    }

    #[test]
    fn lookups_report_unknown_and_mismatched_keys() {
        let catalog = catalog();
        assert_eq!(
            catalog.item("excalibur"),
            Err(CatalogError::UnknownItem("excalibur".to_owned()))
        );
        assert_eq!(
            catalog.weapon("leather_armor"),
            Err(CatalogError::NotAWeapon("leather_armor".to_owned()))
        );
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn invalid_weapons_are_rejected() {
        let broken = r#"
            [twig]
            name = "Twig"
            category = "staff"
            damage_min = 5
            damage_max = 1
        "#;
        assert!(ItemCatalog::from_toml(broken, "").is_err());
    }
}
