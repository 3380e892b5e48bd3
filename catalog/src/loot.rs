//! Loot tables keyed by monster key.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use gridcrawl_core::Item;
use rand::Rng;
use serde::Deserialize;

use crate::items::ItemCatalog;

/// Catalog section a loot entry draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootKind {
    /// Armor, consumables and misc items.
    Item,
    /// Weapons.
    Weapon,
}

/// Single independent drop.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LootEntry {
    /// Catalog section of the drop.
    #[serde(rename = "type")]
    pub kind: LootKind,
    /// Item catalog key.
    pub key: String,
    /// Drop probability in `[0, 1]`.
    pub chance: f64,
}

/// Loot tables keyed by monster key.
#[derive(Clone, Debug, Default)]
pub struct LootTables {
    tables: BTreeMap<String, Vec<LootEntry>>,
}

impl LootTables {
    /// Parses loot tables and checks every drop against the item catalog.
    pub fn from_toml(contents: &str, items: &ItemCatalog) -> Result<Self> {
        let tables: BTreeMap<String, Vec<LootEntry>> =
            toml::from_str(contents).context("failed to parse loot table toml contents")?;
        for (monster, entries) in &tables {
            for entry in entries {
                if !(0.0..=1.0).contains(&entry.chance) {
                    bail!(
                        "loot for `{monster}` gives `{}` chance {} outside [0, 1]",
                        entry.key,
                        entry.chance
                    );
                }
                let known = match entry.kind {
                    LootKind::Weapon => items.weapon_stats(&entry.key).is_some(),
                    LootKind::Item => items.contains(&entry.key),
                };
                if !known {
                    bail!(
                        "loot for `{monster}` references unknown {:?} `{}`",
                        entry.kind,
                        entry.key
                    );
                }
            }
        }
        Ok(Self { tables })
    }

    /// Monster keys that have a loot table.
    pub fn monster_keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Entries of the monster's table; empty when none is declared.
    #[must_use]
    pub fn entries(&self, monster_key: &str) -> &[LootEntry] {
        self.tables
            .get(monster_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rolls every entry of the monster's table as an independent trial.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        monster_key: &str,
        items: &ItemCatalog,
        rng: &mut R,
    ) -> Vec<Item> {
        let mut drops = Vec::new();
        for entry in self.entries(monster_key) {
            if !rng.gen_bool(entry.chance.clamp(0.0, 1.0)) {
                continue;
            }
            match items.item(&entry.key) {
                Ok(item) => drops.push(item),
                Err(error) => log::warn!("loot roll for `{monster_key}` failed: {error}"),
            }
        }
        drops
    }
}
