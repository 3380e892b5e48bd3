//! Encounter groups sharing a single rewards record.

use std::collections::BTreeMap;

use gridcrawl_core::EncounterId;
use serde::{Deserialize, Serialize};

/// Reward paid once when every monster of an encounter has been slain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterReward {
    /// Gold added to the party purse.
    pub gold: u64,
    /// Experience shared among living members.
    pub experience: u64,
}

#[derive(Clone, Debug)]
struct EncounterState {
    reward: EncounterReward,
    paid: bool,
}

/// Registry tracking which encounter rewards have already been paid.
#[derive(Clone, Debug, Default)]
pub(crate) struct EncounterRegistry {
    entries: BTreeMap<EncounterId, EncounterState>,
}

impl EncounterRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers an encounter; an existing unpaid record is replaced.
    pub(crate) fn register(&mut self, id: EncounterId, reward: EncounterReward) {
        let _ = self
            .entries
            .insert(id, EncounterState { reward, paid: false });
    }

    /// Marks the encounter paid and yields its reward the first time only.
    pub(crate) fn claim(&mut self, id: EncounterId) -> Option<EncounterReward> {
        let state = self.entries.get_mut(&id)?;
        if state.paid {
            return None;
        }
        state.paid = true;
        Some(state.reward)
    }

    pub(crate) fn reward(&self, id: EncounterId) -> Option<EncounterReward> {
        self.entries.get(&id).map(|state| state.reward)
    }

    pub(crate) fn is_paid(&self, id: EncounterId) -> bool {
        self.entries.get(&id).is_some_and(|state| state.paid)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
