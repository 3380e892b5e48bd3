//! Monster templates.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use glam::Vec2;
use gridcrawl_core::{DamageKind, EncounterId, EntityId, Monster};
use serde::Deserialize;

use crate::CatalogError;

/// Template a monster is spawned from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MonsterDefinition {
    /// Display name.
    pub name: String,
    /// Creature family consulted by weapon bonuses.
    pub kind: String,
    /// Starting and maximum hit points.
    pub hp: i32,
    /// Collision radius in pixels.
    pub radius: f32,
    /// Turn-based melee reach in pixels.
    #[serde(default)]
    pub attack_radius: f32,
    /// Lowest strike damage.
    pub damage_min: i32,
    /// Highest strike damage.
    pub damage_max: i32,
    /// Experience granted on death.
    #[serde(default)]
    pub experience: u64,
    /// Gold granted on death.
    #[serde(default)]
    pub gold: u64,
    /// Real-time speed in pixels per frame.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Damage reduction percentages per kind.
    #[serde(default)]
    pub resistances: BTreeMap<DamageKind, i32>,
}

fn default_speed() -> f32 {
    1.0
}

/// Read-only table of monster templates keyed by catalog key.
#[derive(Clone, Debug, Default)]
pub struct MonsterCatalog {
    monsters: BTreeMap<String, MonsterDefinition>,
}

impl MonsterCatalog {
    /// Parses and validates a monster table.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let monsters: BTreeMap<String, MonsterDefinition> =
            toml::from_str(contents).context("failed to parse monster catalog toml contents")?;
        for (key, definition) in &monsters {
            if definition.hp <= 0 {
                bail!("monster `{key}` needs positive hit points");
            }
            if definition.radius <= 0.0 {
                bail!("monster `{key}` needs a positive radius");
            }
            if definition.damage_min < 0 || definition.damage_max < definition.damage_min {
                bail!("monster `{key}` has an invalid damage range");
            }
        }
        Ok(Self { monsters })
    }

    /// Template registered under the key.
    pub fn definition(&self, key: &str) -> Result<&MonsterDefinition, CatalogError> {
        self.monsters
            .get(key)
            .ok_or_else(|| CatalogError::UnknownMonster(key.to_owned()))
    }

    /// Reports whether a template exists for the key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.monsters.contains_key(key)
    }

    /// Instantiates a monster at full health.
    pub fn spawn(
        &self,
        key: &str,
        id: EntityId,
        position: Vec2,
        encounter: Option<EncounterId>,
    ) -> Result<Monster, CatalogError> {
        let definition = self.definition(key)?;
        Ok(Monster {
            id,
            key: key.to_owned(),
            name: definition.name.clone(),
            kind: definition.kind.clone(),
            position,
            hp: definition.hp,
            max_hp: definition.hp,
            radius: definition.radius,
            attack_radius: definition.attack_radius,
            damage_min: definition.damage_min,
            damage_max: definition.damage_max,
            experience: definition.experience,
            gold: definition.gold,
            speed: definition.speed,
            resistances: definition.resistances.clone(),
            encounter,
            attack_cooldown: 0,
            dead: false,
        })
    }
}
