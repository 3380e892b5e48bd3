//! Read-only numeric configuration consumed by the simulation.
//!
//! Every section implements [`Default`] and is marked `#[serde(default)]`, so a
//! partial TOML document only needs to name the values it overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{item::WeaponCategory, Color};

/// Aggregated configuration tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Presentation parameters carried for adapters.
    pub display: DisplayConfig,
    /// Grid geometry.
    pub world: WorldConfig,
    /// Tick rate, seeding, and worker pool sizing.
    pub simulation: SimulationConfig,
    /// Monster behavior tuning.
    pub monster_ai: MonsterAiConfig,
    /// Per weapon category hitbox tuning.
    pub weapons: WeaponsConfig,
    /// Arrow physics.
    pub projectiles: ProjectileConfig,
    /// Combat feedback and buff tuning.
    pub combat: CombatConfig,
    /// Utility effect tuning.
    pub effects: EffectsConfig,
    /// Passive party regeneration.
    pub regen: RegenConfig,
    /// Derived stat scaling.
    pub character: CharacterConfig,
    /// Combat message retention.
    pub messages: MessagesConfig,
    /// Map keys with special handling.
    pub maps: MapsConfig,
}

impl Config {
    /// Converts a duration in seconds into whole simulation frames.
    #[must_use]
    pub fn seconds_to_frames(&self, seconds: f32) -> u32 {
        if seconds <= 0.0 {
            return 0;
        }
        let frames = seconds * self.simulation.ticks_per_second as f32;
        frames.min(u32::MAX as f32) as u32
    }
}

/// Presentation parameters; the core never reads them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Window width in pixels.
    pub screen_width: u32,
    /// Window height in pixels.
    pub screen_height: u32,
    /// Horizontal camera field of view in degrees.
    pub fov_degrees: f32,
    /// Render distance measured in tiles.
    pub view_distance: f32,
    /// Fallback sky color.
    pub sky_color: Color,
    /// Fallback ground color.
    pub ground_color: Color,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            fov_degrees: 60.0,
            view_distance: 16.0,
            sky_color: Color::from_rgb(0x87, 0xce, 0xeb),
            ground_color: Color::from_rgb(0x3a, 0x5f, 0x0b),
        }
    }
}

/// Grid geometry parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World pixels per grid cell.
    pub tile_size: f32,
    /// Radius of the player's collision body in pixels.
    pub player_radius: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: 64.0,
            player_radius: 8.0,
        }
    }
}

/// Tick rate and scheduling parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Target ticks per simulated second.
    pub ticks_per_second: u32,
    /// Seed of the deterministic random stream.
    pub rng_seed: u64,
    /// Worker pool size; zero selects the host's available parallelism.
    pub worker_threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            rng_seed: 0x6772_6964_6372_6177,
            worker_threads: 0,
        }
    }
}

/// Monster behavior tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterAiConfig {
    /// Distance in pixels at which a real-time monster strikes the party.
    pub attack_distance: f32,
    /// Distance in pixels a monster is knocked back after striking.
    pub pushback: f32,
    /// Tiles within which a real-time monster notices the party.
    pub aggro_range_tiles: f32,
    /// Tiles within which a monster takes part in a turn-based round.
    pub turn_based_range_tiles: f32,
    /// Frames a monster waits between real-time strikes.
    pub attack_cooldown_frames: u32,
}

impl Default for MonsterAiConfig {
    fn default() -> Self {
        Self {
            attack_distance: 48.0,
            pushback: 24.0,
            aggro_range_tiles: 8.0,
            turn_based_range_tiles: 6.0,
            attack_cooldown_frames: 45,
        }
    }
}

/// Hitbox tuning of a melee weapon category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponCategoryConfig {
    /// Side length of the hitbox measured in tiles.
    pub collision_size: f32,
    /// Frames the hitbox stays alive.
    pub lifetime: u32,
}

impl Default for WeaponCategoryConfig {
    fn default() -> Self {
        Self {
            collision_size: 0.5,
            lifetime: 6,
        }
    }
}

/// Per weapon category hitbox tuning with a fallback entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponsConfig {
    /// Values applied to categories without an explicit entry.
    pub fallback: WeaponCategoryConfig,
    /// Explicit per-category overrides.
    pub categories: BTreeMap<WeaponCategory, WeaponCategoryConfig>,
}

impl WeaponsConfig {
    /// Resolves the hitbox tuning for the provided category.
    #[must_use]
    pub fn category(&self, category: WeaponCategory) -> WeaponCategoryConfig {
        self.categories
            .get(&category)
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// Arrow physics parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Arrow speed in pixels per frame.
    pub arrow_speed: f32,
    /// Frames an arrow flies before expiring.
    pub arrow_lifetime: u32,
    /// Side length of the arrow hitbox measured in tiles.
    pub arrow_collision_size: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            arrow_speed: 8.0,
            arrow_lifetime: 90,
            arrow_collision_size: 0.25,
        }
    }
}

/// Combat feedback and buff tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Frames a party member portrait blinks after being hit.
    pub damage_blink_frames: u32,
    /// Stat bonus granted by Bless when its definition leaves it unset.
    pub bless_bonus: i32,
    /// Weapon range in tiles above which a weapon fires arrows.
    pub melee_reach_tiles: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            damage_blink_frames: 12,
            bless_bonus: 20,
            melee_reach_tiles: 3.0,
        }
    }
}

/// Utility effect tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Light radius in tiles granted by Torch Light.
    pub torch_light_radius: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            torch_light_radius: 4.0,
        }
    }
}

/// Passive party regeneration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    /// Frames between regeneration pulses; zero disables regeneration.
    pub interval_frames: u32,
    /// Hit points restored per pulse.
    pub hp_per_interval: i32,
    /// Spell points restored per pulse.
    pub sp_per_interval: i32,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            interval_frames: 120,
            hp_per_interval: 1,
            sp_per_interval: 1,
        }
    }
}

/// Derived stat scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Maximum hit points granted per point of endurance.
    pub hp_per_endurance: i32,
    /// Maximum spell points granted per point of the class casting stat.
    pub sp_per_casting_point: i32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            hp_per_endurance: 2,
            sp_per_casting_point: 1,
        }
    }
}

/// Combat message retention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Number of most recent combat messages retained.
    pub retained: usize,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self { retained: 3 }
    }
}

/// Map keys with special handling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    /// Key of the map that requires Water Breathing.
    pub underwater_key: String,
    /// Key of the map the party returns to when Water Breathing expires underwater.
    pub return_map_key: String,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            underwater_key: "underwater".to_owned(),
            return_map_key: "overworld".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_convert_with_tick_rate() {
        let config = Config::default();
        assert_eq!(config.seconds_to_frames(2.0), 120);
        assert_eq!(config.seconds_to_frames(0.0), 0);
        assert_eq!(config.seconds_to_frames(-3.0), 0);
    }

    #[test]
    fn weapon_categories_fall_back_to_default_entry() {
        let mut weapons = WeaponsConfig::default();
        let _ = weapons.categories.insert(
            WeaponCategory::Sword,
            WeaponCategoryConfig {
                collision_size: 0.75,
                lifetime: 4,
            },
        );

        assert_eq!(weapons.category(WeaponCategory::Sword).lifetime, 4);
        assert_eq!(
            weapons.category(WeaponCategory::Axe),
            WeaponCategoryConfig::default()
        );
    }

    #[test]
    fn defaults_match_documented_constants() {
        let config = Config::default();
        assert_eq!(config.combat.bless_bonus, 20);
        assert_eq!(config.messages.retained, 3);
        assert!((config.monster_ai.turn_based_range_tiles - 6.0).abs() < f32::EPSILON);
    }
}
