use gridcrawl_core::{ConsumableEffect, ItemKind};

use crate::{CombatResolver, GameContext};

impl CombatResolver {
    /// Uses the consumable at `inventory_index` on party member `member`.
    ///
    /// The item is removed only when its effect applied. Consumables without
    /// a usable effect report that they are misconfigured and stay in the
    /// backpack.
    pub fn use_consumable(
        &mut self,
        ctx: &mut GameContext<'_>,
        member: usize,
        inventory_index: usize,
    ) -> bool {
        let Some(item) = ctx.party.inventory.get(inventory_index) else {
            return false;
        };
        let ItemKind::Consumable(effect) = &item.kind else {
            return false;
        };
        let Some(effect) = *effect else {
            log::warn!("consumable `{}` has no usable effect", item.key);
            ctx.messages
                .add_combat_message(format!("{} is misconfigured", item.name));
            return false;
        };
        let item_name = item.name.clone();
        let Some(character) = ctx.party.members.get_mut(member) else {
            return false;
        };

        let outcome = match effect {
            ConsumableEffect::RestoreHp { amount } => {
                let healed = character.heal(amount);
                (healed > 0).then(|| format!("{} recovers {healed} HP", character.name))
            }
            ConsumableEffect::RestoreSp { amount } => {
                let restored = character.restore_sp(amount);
                (restored > 0).then(|| format!("{} recovers {restored} SP", character.name))
            }
            ConsumableEffect::CureCondition { condition } => character
                .remove_condition(condition)
                .then(|| format!("{} is no longer {condition:?}", character.name)),
        };
        let Some(message) = outcome else {
            ctx.messages
                .add_combat_message(format!("{item_name} has no effect"));
            return false;
        };

        let _ = ctx.party.inventory.remove(inventory_index);
        ctx.messages.add_combat_message(message);
        true
    }
}
