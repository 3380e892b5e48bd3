//! Experience sharing and level progression.

use gridcrawl_core::{
    character::STAT_POINTS_PER_LEVEL, config::CharacterConfig, Character, CombatLog, Party,
};

/// Experience needed to advance from `level` to the next one.
#[must_use]
pub const fn experience_threshold(level: u32) -> u64 {
    level as u64 * 100
}

/// Advances the character through every level its experience pays for.
///
/// Each level consumes its threshold, grants free stat points, recomputes
/// derived stats and fully restores hit and spell points. Returns the number
/// of levels gained.
pub fn check_level_up(
    character: &mut Character,
    config: &CharacterConfig,
    messages: &mut CombatLog,
) -> u32 {
    let mut gained = 0;
    loop {
        let threshold = experience_threshold(character.level);
        if threshold == 0 || character.experience < threshold {
            break;
        }
        character.experience -= threshold;
        character.level += 1;
        character.free_stat_points += STAT_POINTS_PER_LEVEL;
        character.calculate_derived_stats(config);
        character.restore_fully();
        gained += 1;

        log::info!("{} reached level {}", character.name, character.level);
        messages.add_combat_message(format!(
            "{} reached level {}!",
            character.name, character.level
        ));
    }
    gained
}

/// Splits experience evenly between living members, leveling them up.
///
/// Returns the experience actually handed out; the remainder of the integer
/// division is lost.
pub fn share_experience(
    party: &mut Party,
    experience: u64,
    config: &CharacterConfig,
    messages: &mut CombatLog,
) -> u64 {
    let living = party.living_indices();
    if living.is_empty() || experience == 0 {
        return 0;
    }
    let share = experience / living.len() as u64;
    if share == 0 {
        return 0;
    }
    for index in &living {
        if let Some(member) = party.members.get_mut(*index) {
            member.experience += share;
            let _ = check_level_up(member, config, messages);
        }
    }
    share * living.len() as u64
}
