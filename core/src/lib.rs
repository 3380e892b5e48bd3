#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gridcrawl simulation.
//!
//! This crate defines the canonical entity model that connects the world,
//! the catalogs, and the pure systems. The world owns monsters, the party owns
//! its characters, and the simulation driver owns projectiles. Every system
//! reads and mutates these types through the driver's narrow game context so
//! no subsystem ever holds a back-pointer into another.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod character;
pub mod config;
pub mod effects;
pub mod item;
pub mod messages;
pub mod monster;
pub mod projectile;

pub use character::{Character, CharacterClass, Party, Skill, Stats, MAX_PARTY_SIZE};
pub use config::Config;
pub use effects::{ActiveEffects, EffectKind, TimedEffect};
pub use item::{
    ArmorCategory, ArmorStats, ConsumableEffect, Item, ItemKind, Rarity, WeaponCategory,
    WeaponStats,
};
pub use messages::CombatLog;
pub use monster::Monster;
pub use projectile::{Projectile, ProjectileKind, ProjectileStep};

/// Deterministic random source threaded through every stochastic rule.
///
/// Loot, Perfect Dodge, target selection, weapon rolls and particle spreads all
/// draw from a single seeded stream owned by the driver.
pub type GameRng = rand_chacha::ChaCha8Rng;

/// Identifier reserved for the single player entity.
pub const PLAYER_ENTITY_ID: &str = "player";

/// Opaque string handle assigned by the caller to collision-tracked entities.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps the provided string as an entity identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Identifier of the player entity.
    #[must_use]
    pub fn player() -> Self {
        Self::new(PLAYER_ENTITY_ID)
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic allocator producing identifiers that are never reused.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates an allocator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh identifier of the form `<prefix>-<n>`.
    pub fn next_id(&mut self, prefix: &str) -> EntityId {
        let id = EntityId::new(format!("{prefix}-{}", self.next));
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Key of a spell definition inside the spell catalog.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpellId(String);

impl SpellId {
    /// Wraps the provided key as a spell identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpellId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an encounter group sharing a single rewards record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EncounterId(u32);

impl EncounterId {
    /// Creates a new encounter identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Categories of entities tracked by the collision index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// The party, represented as a single body.
    Player,
    /// A hostile creature owned by the world.
    Monster,
    /// A magic bolt, arrow, or melee hitbox.
    Projectile,
}

/// Movement modes granted by active effects that change walkability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MovementModes {
    /// Shallow water tiles may be crossed.
    pub walk_on_water: bool,
    /// Deep water tiles may be entered.
    pub water_breathing: bool,
}

impl MovementModes {
    /// Plain walking with no active movement effects.
    pub const NONE: Self = Self {
        walk_on_water: false,
        water_breathing: false,
    };
}

/// Kind of terrain stored in a single tile of the world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Open floor or grass.
    Empty,
    /// Solid masonry.
    Wall,
    /// Dense vegetation that blocks movement like a wall.
    Tree,
    /// Shallow water, crossable with Walk on Water.
    Water,
    /// Deep water, enterable with Water Breathing.
    DeepWater,
}

impl TileKind {
    /// Parses the single-character map glyph used by map data files.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' | ' ' => Some(Self::Empty),
            '#' => Some(Self::Wall),
            'T' => Some(Self::Tree),
            '~' => Some(Self::Water),
            '=' => Some(Self::DeepWater),
            _ => None,
        }
    }

    /// Reports whether the tile blocks movement regardless of active effects.
    #[must_use]
    pub const fn is_wall_kind(self) -> bool {
        matches!(self, Self::Wall | Self::Tree)
    }

    /// Reports whether the tile can be entered under the provided movement modes.
    #[must_use]
    pub const fn is_walkable(self, modes: MovementModes) -> bool {
        match self {
            Self::Empty => true,
            Self::Wall | Self::Tree => false,
            Self::Water => modes.walk_on_water,
            Self::DeepWater => modes.water_breathing,
        }
    }
}

/// Elemental or physical nature of a damage instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    /// Weapons, arrows, and monster claws.
    Physical,
    /// Fire magic.
    Fire,
    /// Air magic.
    Air,
    /// Water magic.
    Water,
    /// Earth magic.
    Earth,
    /// Body magic.
    Body,
    /// Mind magic.
    Mind,
    /// Spirit magic.
    Spirit,
    /// Light magic.
    Light,
    /// Dark magic.
    Dark,
}

/// Trainable skills covering magic schools, weapons, and armor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Fire magic school.
    Fire,
    /// Air magic school.
    Air,
    /// Water magic school.
    Water,
    /// Earth magic school.
    Earth,
    /// Body magic school.
    Body,
    /// Mind magic school.
    Mind,
    /// Spirit magic school.
    Spirit,
    /// Light magic school.
    Light,
    /// Dark magic school.
    Dark,
    /// Sword weapons.
    Sword,
    /// Dagger weapons.
    Dagger,
    /// Axe weapons.
    Axe,
    /// Mace weapons.
    Mace,
    /// Spear weapons.
    Spear,
    /// Staff weapons.
    Staff,
    /// Bows.
    Bow,
    /// Leather armor.
    Leather,
    /// Chain armor.
    Chain,
    /// Plate armor.
    Plate,
    /// Shields.
    Shield,
}

impl SkillKind {
    /// Reports whether the skill is a school of magic.
    #[must_use]
    pub const fn is_magic(self) -> bool {
        self.magic_damage_kind().is_some()
    }

    /// Damage kind dealt by elemental spells of this school, if it is magical.
    #[must_use]
    pub const fn magic_damage_kind(self) -> Option<DamageKind> {
        match self {
            Self::Fire => Some(DamageKind::Fire),
            Self::Air => Some(DamageKind::Air),
            Self::Water => Some(DamageKind::Water),
            Self::Earth => Some(DamageKind::Earth),
            Self::Body => Some(DamageKind::Body),
            Self::Mind => Some(DamageKind::Mind),
            Self::Spirit => Some(DamageKind::Spirit),
            Self::Light => Some(DamageKind::Light),
            Self::Dark => Some(DamageKind::Dark),
            _ => None,
        }
    }
}

/// Degree of expertise attained in a skill.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Mastery {
    /// First tier.
    #[default]
    Novice,
    /// Second tier.
    Expert,
    /// Third tier.
    Master,
    /// Fourth tier.
    Grandmaster,
}

impl Mastery {
    /// Integer mastery level in `1..=4`.
    #[must_use]
    pub const fn level(self) -> u32 {
        match self {
            Self::Novice => 1,
            Self::Expert => 2,
            Self::Master => 3,
            Self::Grandmaster => 4,
        }
    }
}

/// Persistent afflictions carried by a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Knocked out at zero hit points.
    Unconscious,
    /// Permanently incapacitated.
    Dead,
    /// Suffering from poison.
    Poisoned,
    /// Weakened.
    Weak,
    /// Magically asleep.
    Asleep,
}

/// Equipment slots available on a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    /// Primary weapon hand.
    MainHand,
    /// Shield or secondary hand.
    OffHand,
    /// Body armor.
    Body,
    /// Helmet.
    Helmet,
    /// Boots.
    Boots,
    /// Gloves.
    Gloves,
    /// Belt.
    Belt,
    /// Cloak.
    Cloak,
    /// Amulet.
    Amulet,
    /// Ring.
    Ring,
}

impl EquipSlot {
    /// Slots whose items contribute to armor class.
    pub const ARMOR_SLOTS: [Self; 7] = [
        Self::OffHand,
        Self::Body,
        Self::Helmet,
        Self::Boots,
        Self::Gloves,
        Self::Belt,
        Self::Cloak,
    ];

    /// Reports whether the slot contributes to armor class.
    #[must_use]
    pub fn is_armor_slot(self) -> bool {
        Self::ARMOR_SLOTS.contains(&self)
    }
}

/// Packed RGB color used by map and display configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Cumulative counters accumulated over a play session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Experience handed out to party members, including encounter rewards.
    pub experience_awarded: u64,
    /// Gold picked up from monsters and encounters.
    pub gold_collected: u64,
    /// Monsters slain by the party.
    pub monsters_slain: u64,
    /// Simulation ticks elapsed.
    pub ticks: u64,
}

impl SessionTotals {
    /// Whole seconds of play time at the provided tick rate.
    #[must_use]
    pub fn play_seconds(&self, ticks_per_second: u32) -> u64 {
        if ticks_per_second == 0 {
            return 0;
        }
        self.ticks / u64::from(ticks_per_second)
    }
}
