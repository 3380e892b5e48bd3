//! Spell definitions, their classification and the pure spell formulas.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use glam::Vec2;
use gridcrawl_core::{
    DamageKind, EffectKind, EntityId, Mastery, Projectile, ProjectileKind, SkillKind, SpellId,
};
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// What a spell does once cast; the single source of a spell's code path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellEffect {
    /// Launches an elemental bolt.
    Damage,
    /// Heals the caster.
    Heal,
    /// Heals a chosen party member.
    HealOther,
    /// Starts Torch Light.
    TorchLight,
    /// Starts Wizard Eye.
    WizardEye,
    /// Starts Walk on Water.
    WalkOnWater,
    /// Starts Water Breathing.
    WaterBreathing,
    /// Starts Bless.
    Bless,
}

/// Who a healing spell may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HealTarget {
    /// Only the caster.
    Caster,
    /// Any party member.
    AnyMember,
}

/// Resolved code path of a spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpellType {
    /// Creates a projectile carrying elemental damage.
    Projectile(DamageKind),
    /// Restores hit points.
    Heal(HealTarget),
    /// Starts a timed party effect.
    Utility(EffectKind),
}

/// Immutable definition of a spell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellDefinition {
    /// Catalog key; filled from the table key when loading.
    #[serde(skip)]
    pub id: SpellId,
    /// Display name.
    pub name: String,
    /// School the spell belongs to.
    pub school: SkillKind,
    /// Circle of the spell within its school.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Spell point cost.
    pub cost: i32,
    /// Whether the spell launches a projectile.
    #[serde(default)]
    pub is_projectile: bool,
    /// Whether the spell starts a timed effect.
    #[serde(default)]
    pub is_utility: bool,
    /// Flight distance in tiles.
    #[serde(default)]
    pub range_tiles: f32,
    /// Side length of the bolt's bounding box in tiles.
    #[serde(default)]
    pub collision_size_tiles: f32,
    /// Bolt speed in pixels per frame.
    #[serde(default)]
    pub speed: f32,
    /// Base damage points before intellect scaling.
    #[serde(default)]
    pub damage_base: i32,
    /// Flat healing added to the personality-scaled amount.
    #[serde(default)]
    pub heal_amount: i32,
    /// Effect duration in seconds before skill scaling.
    #[serde(default)]
    pub duration_seconds: f32,
    /// Stat bonus granted while the effect runs.
    #[serde(default)]
    pub stat_bonus: i32,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// What the spell does.
    pub effect: SpellEffect,
}

fn default_level() -> u32 {
    1
}

impl SpellDefinition {
    /// Classifies the spell into the code path that resolves it.
    #[must_use]
    pub fn spell_type(&self) -> SpellType {
        match self.effect {
            SpellEffect::Damage => SpellType::Projectile(
                self.school
                    .magic_damage_kind()
                    .unwrap_or(DamageKind::Physical),
            ),
            SpellEffect::Heal => SpellType::Heal(HealTarget::Caster),
            SpellEffect::HealOther => SpellType::Heal(HealTarget::AnyMember),
            SpellEffect::TorchLight => SpellType::Utility(EffectKind::TorchLight),
            SpellEffect::WizardEye => SpellType::Utility(EffectKind::WizardEye),
            SpellEffect::WalkOnWater => SpellType::Utility(EffectKind::WalkOnWater),
            SpellEffect::WaterBreathing => SpellType::Utility(EffectKind::WaterBreathing),
            SpellEffect::Bless => SpellType::Utility(EffectKind::Bless),
        }
    }

    /// Damage and healing amounts as shown to the player.
    ///
    /// `mastery` is the caster's mastery in the spell's school, `None` when
    /// the school is untrained.
    #[must_use]
    pub fn displayed_amounts(
        &self,
        intellect: i32,
        personality: i32,
        mastery: Option<Mastery>,
    ) -> SpellAmounts {
        let amounts = match self.spell_type() {
            SpellType::Projectile(_) => SpellAmounts {
                base: self.damage_base,
                total: spell_damage(self.damage_base, intellect),
            },
            SpellType::Heal(_) => SpellAmounts {
                base: self.cost,
                total: spell_heal(self.cost, personality) + self.heal_amount.max(0),
            },
            SpellType::Utility(_) => SpellAmounts {
                base: self.stat_bonus,
                total: self.stat_bonus,
            },
        };
        match mastery {
            Some(mastery) => amounts.with_mastery(mastery),
            None => amounts,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.cost < 0 {
            bail!("spell `{}` has a negative cost", self.id);
        }
        if !self.school.is_magic() {
            bail!("spell `{}` belongs to non-magic school {:?}", self.id, self.school);
        }
        if self.is_projectile && self.is_utility {
            bail!("spell `{}` cannot be both a projectile and a utility", self.id);
        }
        let is_damage = self.effect == SpellEffect::Damage;
        if is_damage != self.is_projectile {
            bail!(
                "spell `{}` projectile flag disagrees with its {:?} effect",
                self.id,
                self.effect
            );
        }
        if self.is_projectile && (self.speed <= 0.0 || self.range_tiles <= 0.0) {
            bail!("projectile spell `{}` needs a positive speed and range", self.id);
        }
        let is_timed = matches!(self.spell_type(), SpellType::Utility(_));
        if is_timed != self.is_utility {
            bail!(
                "spell `{}` utility flag disagrees with its {:?} effect",
                self.id,
                self.effect
            );
        }
        Ok(())
    }
}

/// Base and total amounts displayed for a spell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpellAmounts {
    /// Unscaled points.
    pub base: i32,
    /// Points after stat scaling.
    pub total: i32,
}

impl SpellAmounts {
    /// Adds the mastery bonus of five points per mastery level to both amounts.
    #[must_use]
    pub const fn with_mastery(self, mastery: Mastery) -> Self {
        let bonus = mastery.level() as i32 * 5;
        Self {
            base: self.base + bonus,
            total: self.total + bonus,
        }
    }
}

/// Elemental bolt damage: `base·3 + intellect/2`.
#[must_use]
pub fn spell_damage(damage_base: i32, intellect: i32) -> i32 {
    (damage_base.max(0) * 3 + intellect.max(0) / 2).max(0)
}

/// Healing of a cast heal: `cost·5 + personality/2`.
#[must_use]
pub fn spell_heal(cost: i32, personality: i32) -> i32 {
    (cost.max(0) * 5 + personality.max(0) / 2).max(0)
}

/// Healing of the targeted equipped heal: `cost·3 + personality/2`.
#[must_use]
pub fn equipped_heal(cost: i32, personality: i32) -> i32 {
    (cost.max(0) * 3 + personality.max(0) / 2).max(0)
}

/// Effect duration in whole seconds scaled by the school skill level.
#[must_use]
pub fn scaled_duration_seconds(duration_seconds: f32, skill_level: u32) -> f32 {
    let scaled = duration_seconds.max(0.0) * (1.0 + 0.1 * skill_level as f32);
    scaled.trunc()
}

/// Frames a bolt needs to travel its range, rounded up.
#[must_use]
pub fn projectile_lifetime(range_tiles: f32, tile_size: f32, speed: f32) -> u32 {
    if speed <= 0.0 || range_tiles <= 0.0 {
        return 0;
    }
    let frames = (range_tiles * tile_size / speed).ceil();
    frames.min(u32::MAX as f32) as u32
}

/// Read-only table of spell definitions keyed by spell identifier.
#[derive(Clone, Debug, Default)]
pub struct SpellCatalog {
    spells: BTreeMap<SpellId, SpellDefinition>,
}

impl SpellCatalog {
    /// Parses and validates a spell table.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw: BTreeMap<String, SpellDefinition> =
            toml::from_str(contents).context("failed to parse spell catalog toml contents")?;
        let mut spells = BTreeMap::new();
        for (key, mut definition) in raw {
            definition.id = SpellId::new(key.as_str());
            definition
                .validate()
                .with_context(|| format!("invalid spell definition `{key}`"))?;
            let _ = spells.insert(definition.id.clone(), definition);
        }
        if spells.is_empty() {
            bail!("spell catalog contains no spells");
        }
        Ok(Self { spells })
    }

    /// Looks a definition up by identifier.
    pub fn spell_definition_by_id(&self, id: &SpellId) -> Result<&SpellDefinition, CatalogError> {
        self.spells
            .get(id)
            .ok_or_else(|| CatalogError::UnknownSpell(id.clone()))
    }

    /// Resolves the code path of the spell with the given identifier.
    pub fn spell_id_to_type(&self, id: &SpellId) -> Result<SpellType, CatalogError> {
        self.spell_definition_by_id(id)
            .map(SpellDefinition::spell_type)
    }

    /// Builds the bolt of a projectile spell launched from `origin` along `angle`.
    pub fn create_projectile(
        &self,
        spell: &SpellId,
        id: EntityId,
        origin: Vec2,
        angle: f32,
        effective_intellect: i32,
        tile_size: f32,
    ) -> Result<Projectile, CatalogError> {
        let definition = self.spell_definition_by_id(spell)?;
        let SpellType::Projectile(damage_kind) = definition.spell_type() else {
            return Err(CatalogError::NotAProjectile(spell.clone()));
        };
        let direction = Vec2::from_angle(angle);
        Ok(Projectile::new(
            id,
            ProjectileKind::Magic {
                spell: spell.clone(),
                damage_kind,
            },
            origin,
            direction * definition.speed,
            spell_damage(definition.damage_base, effective_intellect),
            projectile_lifetime(definition.range_tiles, tile_size, definition.speed),
            definition.collision_size_tiles * tile_size,
        ))
    }

    /// Every definition in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &SpellDefinition> {
        self.spells.values()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spells.len()
    }

    /// Reports whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}
