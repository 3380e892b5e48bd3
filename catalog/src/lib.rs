#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Data-driven definitions read once at startup and shared read-only.
//!
//! Spells, items, monsters, loot tables and maps are parsed from TOML,
//! cross-validated, and bundled into [`Catalogs`]. Lookups after loading
//! report failures through [`CatalogError`]; loading itself reports through
//! `anyhow` so every failure carries the file and key that caused it.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use gridcrawl_core::SpellId;
use gridcrawl_world::{MapDefinition, TileMap};
use thiserror::Error;

pub mod items;
pub mod loot;
pub mod monsters;
pub mod spells;

pub use items::ItemCatalog;
pub use loot::{LootEntry, LootKind, LootTables};
pub use monsters::{MonsterCatalog, MonsterDefinition};
pub use spells::{HealTarget, SpellAmounts, SpellCatalog, SpellDefinition, SpellEffect, SpellType};

/// Lookup failures against loaded catalogs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No spell is registered under the identifier.
    #[error("unknown spell `{0}`")]
    UnknownSpell(SpellId),
    /// The spell exists but does not launch a projectile.
    #[error("spell `{0}` does not create a projectile")]
    NotAProjectile(SpellId),
    /// No item is registered under the key.
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    /// The item exists but is not a weapon.
    #[error("item `{0}` is not a weapon")]
    NotAWeapon(String),
    /// No monster is registered under the key.
    #[error("unknown monster `{0}`")]
    UnknownMonster(String),
    /// No map is registered under the key.
    #[error("unknown map `{0}`")]
    UnknownMap(String),
}

/// Raw TOML sources of every catalog file.
#[derive(Clone, Debug, Default)]
pub struct CatalogSources {
    /// Contents of `spells.toml`.
    pub spells: String,
    /// Contents of `weapons.toml`.
    pub weapons: String,
    /// Contents of `items.toml`.
    pub items: String,
    /// Contents of `monsters.toml`.
    pub monsters: String,
    /// Contents of `loot.toml`.
    pub loot: String,
    /// Map file names paired with their contents.
    pub maps: Vec<(String, String)>,
}

/// Every read-only definition table used by the simulation.
#[derive(Clone, Debug)]
pub struct Catalogs {
    /// Spell definitions.
    pub spells: SpellCatalog,
    /// Weapon, armor, consumable and misc templates.
    pub items: ItemCatalog,
    /// Monster templates.
    pub monsters: MonsterCatalog,
    /// Drops per monster key.
    pub loot: LootTables,
    maps: BTreeMap<String, MapDefinition>,
}

impl Catalogs {
    /// Parses and cross-validates catalogs from in-memory sources.
    pub fn from_sources(sources: &CatalogSources) -> Result<Self> {
        let spells = SpellCatalog::from_toml(&sources.spells).context("loading spells")?;
        let items =
            ItemCatalog::from_toml(&sources.weapons, &sources.items).context("loading items")?;
        let monsters = MonsterCatalog::from_toml(&sources.monsters).context("loading monsters")?;
        let loot = LootTables::from_toml(&sources.loot, &items).context("loading loot tables")?;

        for monster_key in loot.monster_keys() {
            if !monsters.contains(monster_key) {
                bail!("loot table declared for unknown monster `{monster_key}`");
            }
        }

        let mut maps = BTreeMap::new();
        for (name, contents) in &sources.maps {
            let mut definition: MapDefinition = toml::from_str(contents)
                .with_context(|| format!("failed to parse map `{name}` toml contents"))?;
            if definition.key.is_empty() {
                definition.key = name.clone();
            }
            validate_map(&definition, &monsters)
                .with_context(|| format!("invalid map `{}`", definition.key))?;
            let key = definition.key.clone();
            if maps.insert(key.clone(), definition).is_some() {
                bail!("map key `{key}` is declared twice");
            }
        }
        if maps.is_empty() {
            bail!("no maps were provided");
        }

        log::info!(
            "catalogs loaded: {} spells, {} items, {} maps",
            spells.len(),
            items.len(),
            maps.len()
        );

        Ok(Self {
            spells,
            items,
            monsters,
            loot,
            maps,
        })
    }

    /// Reads every catalog file from a data directory.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| -> Result<String> {
            let path = dir.join(name);
            fs::read_to_string(&path)
                .with_context(|| format!("failed to read catalog file at {}", path.display()))
        };

        let maps_dir = dir.join("maps");
        let mut map_paths: Vec<PathBuf> = fs::read_dir(&maps_dir)
            .with_context(|| format!("failed to list maps in {}", maps_dir.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("failed to list maps in {}", maps_dir.display()))?;
        map_paths.retain(|path| path.extension().is_some_and(|ext| ext == "toml"));
        map_paths.sort();

        let mut maps = Vec::with_capacity(map_paths.len());
        for path in map_paths {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read map at {}", path.display()))?;
            maps.push((name, contents));
        }

        Self::from_sources(&CatalogSources {
            spells: read("spells.toml")?,
            weapons: read("weapons.toml")?,
            items: read("items.toml")?,
            monsters: read("monsters.toml")?,
            loot: read("loot.toml")?,
            maps,
        })
    }

    /// Catalogs compiled into the binary from the repository's `data/` directory.
    pub fn builtin() -> Result<Self> {
        Self::from_sources(&builtin_sources())
    }

    /// Map definition registered under the key.
    pub fn map(&self, key: &str) -> Result<&MapDefinition, CatalogError> {
        self.maps
            .get(key)
            .ok_or_else(|| CatalogError::UnknownMap(key.to_owned()))
    }

    /// Keys of every registered map.
    pub fn map_keys(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}

/// Sources compiled into the binary.
#[must_use]
pub fn builtin_sources() -> CatalogSources {
    CatalogSources {
        spells: include_str!("../../data/spells.toml").to_owned(),
        weapons: include_str!("../../data/weapons.toml").to_owned(),
        items: include_str!("../../data/items.toml").to_owned(),
        monsters: include_str!("../../data/monsters.toml").to_owned(),
        loot: include_str!("../../data/loot.toml").to_owned(),
        maps: vec![
            (
                "overworld".to_owned(),
                include_str!("../../data/maps/overworld.toml").to_owned(),
            ),
            (
                "underwater".to_owned(),
                include_str!("../../data/maps/underwater.toml").to_owned(),
            ),
        ],
    }
}

fn validate_map(definition: &MapDefinition, monsters: &MonsterCatalog) -> Result<()> {
    let map = TileMap::from_definition(definition, 1.0)?;
    let mut encounters = BTreeMap::new();
    for encounter in &definition.encounters {
        if encounters.insert(encounter.id, encounter).is_some() {
            bail!("encounter {} is declared twice", encounter.id);
        }
    }
    for placement in &definition.monsters {
        if !monsters.contains(&placement.key) {
            bail!("placement references unknown monster `{}`", placement.key);
        }
        let cell = gridcrawl_world::TileCell::new(placement.column, placement.row);
        if map.tile_at(cell).is_none() {
            bail!(
                "monster `{}` is placed outside the map at ({}, {})",
                placement.key,
                placement.column,
                placement.row
            );
        }
        if let Some(encounter) = placement.encounter {
            if !encounters.contains_key(&encounter) {
                bail!(
                    "monster `{}` joins undeclared encounter {encounter}",
                    placement.key
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogs_load() {
        let catalogs = Catalogs::builtin().expect("builtin catalogs");
        assert!(!catalogs.spells.is_empty());
        assert!(!catalogs.items.is_empty());
        assert!(catalogs.map("overworld").is_ok());
        assert!(catalogs.map("underwater").is_ok());
        assert_eq!(
            catalogs.map("moon").err(),
            Some(CatalogError::UnknownMap("moon".to_owned()))
        );
    }

    #[test]
    fn placements_must_reference_known_monsters() {
        let mut sources = builtin_sources();
        sources.maps = vec![(
            "broken".to_owned(),
            r#"
                rows = ["...", "..."]
                start = [0, 0]

                [[monsters]]
                key = "dragon"
                column = 1
                row = 1
            "#
            .to_owned(),
        )];
        let error = Catalogs::from_sources(&sources).expect_err("unknown monster");
        assert!(format!("{error:#}").contains("dragon"));
    }

    #[test]
    fn missing_maps_are_fatal() {
        let mut sources = builtin_sources();
        sources.maps.clear();
        assert!(Catalogs::from_sources(&sources).is_err());
    }
}
