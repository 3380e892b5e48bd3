//! Armor mitigation, Perfect Dodge and monster strikes against the party.

use gridcrawl_core::{Character, CombatLog, EquipSlot, Item, Party};
use rand::Rng;

/// Total armor class of the character's worn armor.
///
/// Each piece contributes its base class, a mastery bonus of
/// `skill level · mastery level` for its category skill, and
/// `effective endurance / endurance divisor` when the divisor is non-zero.
#[must_use]
pub fn total_armor_class(character: &Character, stat_bonus: i32) -> i32 {
    let endurance = character.effective_stats(stat_bonus).endurance;
    EquipSlot::ARMOR_SLOTS
        .iter()
        .filter_map(|slot| character.equipment.get(slot))
        .filter_map(Item::armor)
        .map(|armor| {
            let mastery_bonus = armor.category.skill().map_or(0, |kind| {
                let skill = character.skill(kind);
                i32::try_from(skill.level * skill.mastery.level()).unwrap_or(i32::MAX)
            });
            let endurance_bonus = if armor.endurance_divisor > 0 {
                endurance / armor.endurance_divisor
            } else {
                0
            };
            armor.armor_class + mastery_bonus + endurance_bonus
        })
        .sum()
}

/// Damage left after armor: `max(1, damage − armor class / 2)`.
///
/// Non-positive damage stays at zero.
#[must_use]
pub fn apply_armor_damage_reduction(damage: i32, character: &Character, stat_bonus: i32) -> i32 {
    if damage <= 0 {
        return 0;
    }
    let reduction = total_armor_class(character, stat_bonus).max(0) / 2;
    (damage - reduction).max(1)
}

/// Rolls Perfect Dodge with a chance of `luck / 5` percent.
pub fn roll_perfect_dodge<R: Rng + ?Sized>(
    character: &Character,
    stat_bonus: i32,
    rng: &mut R,
) -> bool {
    let luck = character.effective_stats(stat_bonus).luck.max(0);
    let chance = (f64::from(luck) / 5.0 / 100.0).min(1.0);
    chance > 0.0 && rng.gen_bool(chance)
}

/// A monster blow aimed at one party member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strike<'a> {
    /// Display name of the attacker.
    pub attacker: &'a str,
    /// Damage before armor.
    pub raw_damage: i32,
    /// Whether Perfect Dodge may negate the blow.
    pub dodgeable: bool,
}

/// What happened to the struck member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// The member was missing or already down.
    NoTarget,
    /// Perfect Dodge negated the blow.
    Dodged,
    /// Hit points were removed.
    Hit {
        /// Hit points removed after armor.
        damage: i32,
        /// Whether the blow knocked the member out.
        knocked_out: bool,
    },
}

/// Resolves a strike against `target`, reporting it through the combat log.
pub fn strike_member<R: Rng + ?Sized>(
    party: &mut Party,
    target: usize,
    strike: Strike<'_>,
    blink_frames: u32,
    messages: &mut CombatLog,
    rng: &mut R,
) -> StrikeOutcome {
    let stat_bonus = party.stat_bonus();
    let Some(member) = party.members.get_mut(target) else {
        return StrikeOutcome::NoTarget;
    };
    if !member.is_conscious() {
        return StrikeOutcome::NoTarget;
    }

    if strike.dodgeable && roll_perfect_dodge(member, stat_bonus, rng) {
        messages.add_combat_message(format!(
            "{} dodges the attack of {}!",
            member.name, strike.attacker
        ));
        return StrikeOutcome::Dodged;
    }

    let damage = apply_armor_damage_reduction(strike.raw_damage, member, stat_bonus);
    let applied = member.take_damage(damage);
    messages.add_combat_message(format!(
        "{} hits {} for {applied} damage",
        strike.attacker, member.name
    ));
    let knocked_out = !member.is_conscious();
    if knocked_out {
        messages.add_combat_message(format!("{} is unconscious", member.name));
    }
    party.trigger_blink(target, blink_frames);

    StrikeOutcome::Hit {
        damage: applied,
        knocked_out,
    }
}
