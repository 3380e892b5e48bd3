//! Party members and the party they travel in.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::CharacterConfig, ActiveEffects, Condition, EquipSlot, Item, Mastery, MovementModes,
    SkillKind, SpellId, WeaponStats,
};

/// Largest number of characters a party may hold.
pub const MAX_PARTY_SIZE: usize = 4;

/// Free stat points granted for every level gained.
pub const STAT_POINTS_PER_LEVEL: u32 = 5;

/// The seven primary statistics of a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stats {
    /// Physical power; scales melee damage.
    pub might: i32,
    /// Arcane aptitude; scales elemental spell damage.
    pub intellect: i32,
    /// Force of will; scales healing.
    pub personality: i32,
    /// Toughness; scales hit points and armor.
    pub endurance: i32,
    /// Aim; scales arrow damage.
    pub accuracy: i32,
    /// Quickness.
    pub speed: i32,
    /// Fortune; drives Perfect Dodge.
    pub luck: i32,
}

impl Stats {
    /// Returns a copy with `bonus` added to every stat.
    #[must_use]
    pub const fn with_bonus(self, bonus: i32) -> Self {
        Self {
            might: self.might + bonus,
            intellect: self.intellect + bonus,
            personality: self.personality + bonus,
            endurance: self.endurance + bonus,
            accuracy: self.accuracy + bonus,
            speed: self.speed + bonus,
            luck: self.luck + bonus,
        }
    }
}

/// Character professions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    /// Heavy melee fighter without spells.
    Knight,
    /// Fighter with a little Spirit and Body magic.
    Paladin,
    /// Ranged fighter with elemental magic.
    Archer,
    /// Healer.
    Cleric,
    /// Elemental caster.
    Sorcerer,
    /// Hybrid caster drawing on intellect and personality.
    Druid,
}

/// Stat that fuels a class's spell points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CastingStat {
    None,
    Intellect,
    Personality,
    Both,
}

struct ClassProfile {
    base_hp: i32,
    hp_per_level: i32,
    base_sp: i32,
    sp_per_level: i32,
    casting: CastingStat,
}

impl CharacterClass {
    const fn profile(self) -> ClassProfile {
        let (base_hp, hp_per_level, base_sp, sp_per_level, casting) = match self {
            Self::Knight => (40, 8, 0, 0, CastingStat::None),
            Self::Paladin => (35, 7, 10, 2, CastingStat::Personality),
            Self::Archer => (30, 6, 10, 2, CastingStat::Intellect),
            Self::Cleric => (25, 5, 20, 4, CastingStat::Personality),
            Self::Sorcerer => (20, 4, 25, 5, CastingStat::Intellect),
            Self::Druid => (22, 5, 22, 4, CastingStat::Both),
        };
        ClassProfile {
            base_hp,
            hp_per_level,
            base_sp,
            sp_per_level,
            casting,
        }
    }
}

/// Training in a single skill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Skill {
    /// Skill rank, zero when untrained.
    pub level: u32,
    /// Degree of expertise.
    pub mastery: Mastery,
}

impl Skill {
    /// Creates a skill entry.
    #[must_use]
    pub const fn new(level: u32, mastery: Mastery) -> Self {
        Self { level, mastery }
    }
}

/// A single party member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Profession.
    pub class: CharacterClass,
    /// Current level, at least one.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub experience: u64,
    /// Unspent stat points.
    pub free_stat_points: u32,
    /// Base statistics without buffs.
    pub base: Stats,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Maximum spell points.
    pub max_sp: i32,
    /// Current hit points in `[0, max_hp]`.
    pub hp: i32,
    /// Current spell points in `[0, max_sp]`.
    pub sp: i32,
    /// Trained skills.
    pub skills: BTreeMap<SkillKind, Skill>,
    /// Equipped items by slot.
    pub equipment: BTreeMap<EquipSlot, Item>,
    /// Active afflictions.
    pub conditions: BTreeSet<Condition>,
    /// Spell bound to the quick-cast action.
    pub equipped_spell: Option<SpellId>,
    /// Spells available through the spellbook.
    pub known_spells: Vec<SpellId>,
    /// Index into `known_spells` of the spellbook selection.
    pub selected_spell: usize,
}

impl Character {
    /// Creates a level one character with full hit and spell points.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        class: CharacterClass,
        base: Stats,
        config: &CharacterConfig,
    ) -> Self {
        let mut character = Self {
            name: name.into(),
            class,
            level: 1,
            experience: 0,
            free_stat_points: 0,
            base,
            max_hp: 0,
            max_sp: 0,
            hp: 0,
            sp: 0,
            skills: BTreeMap::new(),
            equipment: BTreeMap::new(),
            conditions: BTreeSet::new(),
            equipped_spell: None,
            known_spells: Vec::new(),
            selected_spell: 0,
        };
        character.calculate_derived_stats(config);
        character.hp = character.max_hp;
        character.sp = character.max_sp;
        character
    }

    /// Base stats with the party's cumulative buff bonus applied uniformly.
    #[must_use]
    pub const fn effective_stats(&self, stat_bonus: i32) -> Stats {
        self.base.with_bonus(stat_bonus)
    }

    /// Adds a condition; returns `false` when it was already present.
    pub fn add_condition(&mut self, condition: Condition) -> bool {
        self.conditions.insert(condition)
    }

    /// Removes a condition; returns `false` when it was absent.
    pub fn remove_condition(&mut self, condition: Condition) -> bool {
        self.conditions.remove(&condition)
    }

    /// Reports whether the character carries the condition.
    #[must_use]
    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    /// Reports whether the character can act.
    #[must_use]
    pub fn is_conscious(&self) -> bool {
        self.hp > 0
            && !self.has_condition(Condition::Unconscious)
            && !self.has_condition(Condition::Dead)
    }

    /// Recomputes maximum hit and spell points from base stats and level.
    ///
    /// Current values are clamped into the new range.
    pub fn calculate_derived_stats(&mut self, config: &CharacterConfig) {
        let profile = self.class.profile();
        let level = i32::try_from(self.level).unwrap_or(i32::MAX);
        let casting_points = match profile.casting {
            CastingStat::None => 0,
            CastingStat::Intellect => self.base.intellect,
            CastingStat::Personality => self.base.personality,
            CastingStat::Both => (self.base.intellect + self.base.personality) / 2,
        };

        self.max_hp = (profile.base_hp
            + profile.hp_per_level.saturating_mul(level)
            + self.base.endurance * config.hp_per_endurance)
            .max(1);
        self.max_sp = if profile.casting == CastingStat::None {
            0
        } else {
            (profile.base_sp
                + profile.sp_per_level.saturating_mul(level)
                + casting_points * config.sp_per_casting_point)
                .max(0)
        };
        self.hp = self.hp.clamp(0, self.max_hp);
        self.sp = self.sp.clamp(0, self.max_sp);
    }

    /// Subtracts hit points, knocking the character out at zero.
    ///
    /// Returns the hit points actually removed.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let applied = amount.clamp(0, self.hp);
        self.hp -= applied;
        if self.hp == 0 {
            let _ = self.add_condition(Condition::Unconscious);
        }
        applied
    }

    /// Restores hit points up to the maximum and returns the amount healed.
    ///
    /// Dead characters cannot be healed; healing a knocked out character
    /// above zero wakes them.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.has_condition(Condition::Dead) {
            return 0;
        }
        let before = self.hp;
        self.hp = (self.hp.saturating_add(amount)).min(self.max_hp);
        if self.hp > 0 {
            let _ = self.remove_condition(Condition::Unconscious);
        }
        self.hp - before
    }

    /// Restores spell points up to the maximum and returns the amount restored.
    pub fn restore_sp(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.sp;
        self.sp = (self.sp.saturating_add(amount)).min(self.max_sp);
        self.sp - before
    }

    /// Deducts spell points if enough are available.
    pub fn spend_sp(&mut self, cost: i32) -> bool {
        if cost < 0 || self.sp < cost {
            return false;
        }
        self.sp -= cost;
        true
    }

    /// Fully restores hit and spell points.
    pub fn restore_fully(&mut self) {
        self.hp = self.max_hp;
        self.sp = self.max_sp;
        let _ = self.remove_condition(Condition::Unconscious);
    }

    /// Training in the provided skill, untrained when absent.
    #[must_use]
    pub fn skill(&self, kind: SkillKind) -> Skill {
        self.skills.get(&kind).copied().unwrap_or_default()
    }

    /// Weapon held in the main hand, if any.
    #[must_use]
    pub fn main_hand(&self) -> Option<(&Item, &WeaponStats)> {
        let item = self.equipment.get(&EquipSlot::MainHand)?;
        item.weapon().map(|stats| (item, stats))
    }

    /// Spell highlighted in the spellbook, if any.
    #[must_use]
    pub fn selected_spell(&self) -> Option<&SpellId> {
        self.known_spells.get(self.selected_spell)
    }
}

/// The adventuring party controlled by the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// Members in marching order.
    pub members: Vec<Character>,
    /// Shared purse.
    pub gold: u64,
    /// Shared backpack.
    pub inventory: Vec<Item>,
    /// Index of the active member.
    pub selected: usize,
    /// Party-wide buffs.
    pub effects: ActiveEffects,
    /// Position of the party body in world pixels.
    pub position: Vec2,
    /// Facing in radians.
    pub angle: f32,
    /// Remaining damage blink frames per member.
    pub damage_blink: Vec<u32>,
}

impl Party {
    /// Forms a party from at most [`MAX_PARTY_SIZE`] characters.
    #[must_use]
    pub fn new(mut members: Vec<Character>, position: Vec2) -> Self {
        members.truncate(MAX_PARTY_SIZE);
        let damage_blink = vec![0; members.len()];
        Self {
            members,
            gold: 0,
            inventory: Vec::new(),
            selected: 0,
            effects: ActiveEffects::default(),
            position,
            angle: 0.0,
            damage_blink,
        }
    }

    /// Member currently selected for actions.
    #[must_use]
    pub fn selected_member(&self) -> Option<&Character> {
        self.members.get(self.selected)
    }

    /// Changes the selected member; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.members.len() {
            return false;
        }
        self.selected = index;
        true
    }

    /// Indices of members still counted as living for reward sharing.
    #[must_use]
    pub fn living_indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, member)| !member.has_condition(Condition::Dead) && member.hp > 0)
            .map(|(index, _)| index)
            .collect()
    }

    /// Index of the first member able to act.
    #[must_use]
    pub fn first_conscious(&self) -> Option<usize> {
        self.members.iter().position(Character::is_conscious)
    }

    /// Cumulative stat bonus granted by active effects.
    #[must_use]
    pub fn stat_bonus(&self) -> i32 {
        self.effects.stat_bonus
    }

    /// Movement modes granted by active effects.
    #[must_use]
    pub fn movement_modes(&self) -> MovementModes {
        self.effects.movement_modes()
    }

    /// Reports whether no member remains conscious.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.first_conscious().is_none()
    }

    /// Starts the damage blink of a member.
    pub fn trigger_blink(&mut self, index: usize, frames: u32) {
        if let Some(timer) = self.damage_blink.get_mut(index) {
            *timer = frames;
        }
    }

    /// Counts every damage blink down by one frame.
    pub fn tick_blinks(&mut self) {
        for timer in &mut self.damage_blink {
            *timer = timer.saturating_sub(1);
        }
    }
}
