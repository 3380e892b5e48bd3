#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Final score of a play session.

use gridcrawl_core::{Party, SessionTotals};

/// Seconds after which no time bonus is awarded.
pub const TIME_BONUS_SECONDS: u64 = 3600;

/// Score components before they are summed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Experience, gold and level contribution.
    pub base: u64,
    /// Reward for finishing quickly.
    pub time_bonus: u64,
}

impl ScoreBreakdown {
    /// Final score.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.base.saturating_add(self.time_bonus)
    }
}

/// Splits the score of a session into its parts.
///
/// `base = 10·experience + 5·gold + ⌊1000·Σlevels / members⌋` and
/// `time_bonus = max(0, 3600 − seconds)·10`. An empty party contributes no
/// level term.
#[must_use]
pub fn score_breakdown(
    total_experience: u64,
    gold: u64,
    levels: &[u32],
    play_seconds: u64,
) -> ScoreBreakdown {
    let level_term = if levels.is_empty() {
        0
    } else {
        let sum: u64 = levels.iter().map(|&level| u64::from(level)).sum();
        sum.saturating_mul(1000) / levels.len() as u64
    };
    let base = total_experience
        .saturating_mul(10)
        .saturating_add(gold.saturating_mul(5))
        .saturating_add(level_term);
    let time_bonus = TIME_BONUS_SECONDS.saturating_sub(play_seconds) * 10;
    ScoreBreakdown { base, time_bonus }
}

/// Final score for the given session figures.
#[must_use]
pub fn calculate_score(
    total_experience: u64,
    gold: u64,
    levels: &[u32],
    play_seconds: u64,
) -> u64 {
    score_breakdown(total_experience, gold, levels, play_seconds).total()
}

/// Scores a live session from its totals and the party's current state.
#[must_use]
pub fn score_session(totals: &SessionTotals, party: &Party, ticks_per_second: u32) -> u64 {
    let levels: Vec<u32> = party.members.iter().map(|member| member.level).collect();
    calculate_score(
        totals.experience_awarded,
        party.gold,
        &levels,
        totals.play_seconds(ticks_per_second),
    )
}
