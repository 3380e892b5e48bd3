use gridcrawl_catalog::{
    spells::{equipped_heal, scaled_duration_seconds, spell_heal},
    HealTarget, SpellDefinition, SpellType,
};
use gridcrawl_core::{Condition, EffectKind, SpellId};

use crate::{launch, CombatResolver, GameContext};

/// Source of the spell being cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Casting {
    Equipped,
    Selected,
}

impl CombatResolver {
    /// Casts the selected member's equipped spell.
    ///
    /// Utility durations are used as defined. A heal cast this way always
    /// lands on the caster.
    pub fn cast_equipped_spell(&mut self, ctx: &mut GameContext<'_>) -> bool {
        let caster = ctx.party.selected;
        let Some(spell) = ctx
            .party
            .members
            .get(caster)
            .filter(|member| member.is_conscious())
            .and_then(|member| member.equipped_spell.clone())
        else {
            return false;
        };
        self.cast(ctx, caster, &spell, Casting::Equipped)
    }

    /// Casts the spell highlighted in the selected member's spellbook.
    ///
    /// Utility durations scale with the member's skill in the spell's school.
    pub fn cast_selected_spell(&mut self, ctx: &mut GameContext<'_>) -> bool {
        let caster = ctx.party.selected;
        let Some(spell) = ctx
            .party
            .members
            .get(caster)
            .filter(|member| member.is_conscious())
            .and_then(|member| member.selected_spell().cloned())
        else {
            return false;
        };
        self.cast(ctx, caster, &spell, Casting::Selected)
    }

    /// Casts the equipped heal of the selected member on `target`.
    ///
    /// Only heal spells qualify; self-heals reject every target but the
    /// caster. Heals `cost·3 + personality/2` plus the spell's flat amount.
    pub fn cast_equipped_heal_on_target(
        &mut self,
        ctx: &mut GameContext<'_>,
        target: usize,
    ) -> bool {
        let catalogs = ctx.catalogs;
        let caster = ctx.party.selected;
        let stat_bonus = ctx.party.stat_bonus();
        let Some(member) = ctx.party.members.get(caster) else {
            return false;
        };
        if !member.is_conscious() {
            return false;
        }
        let Some(spell) = member.equipped_spell.as_ref() else {
            return false;
        };
        let definition = match catalogs.spells.spell_definition_by_id(spell) {
            Ok(definition) => definition,
            Err(error) => {
                log::warn!("{}: {error}", member.name);
                ctx.messages
                    .add_combat_message(format!("Unknown spell: {spell}"));
                return false;
            }
        };
        let SpellType::Heal(reach) = definition.spell_type() else {
            return false;
        };
        if reach == HealTarget::Caster && target != caster {
            return false;
        }
        match ctx.party.members.get(target) {
            Some(patient) if !patient.has_condition(Condition::Dead) => {}
            _ => return false,
        }

        let personality = member.effective_stats(stat_bonus).personality;
        let amount = equipped_heal(definition.cost, personality) + definition.heal_amount.max(0);
        let caster_name = member.name.clone();
        if !spend(ctx, caster, definition) {
            return false;
        }

        let Some(patient) = ctx.party.members.get_mut(target) else {
            return false;
        };
        let healed = patient.heal(amount);
        let patient_name = patient.name.clone();
        ctx.messages.add_combat_message(format!(
            "{caster_name} casts {} on {patient_name}, healing {healed}",
            definition.name
        ));
        true
    }

    /// Starts the timed effect of a utility spell for `duration_seconds`.
    ///
    /// Bless grants the definition's stat bonus, or the configured bless
    /// bonus when the definition leaves it at zero. Refreshing an active
    /// effect restarts its timer without stacking its bonus.
    pub fn apply_utility(
        &mut self,
        ctx: &mut GameContext<'_>,
        definition: &SpellDefinition,
        duration_seconds: f32,
    ) -> bool {
        let SpellType::Utility(kind) = definition.spell_type() else {
            return false;
        };
        let frames = ctx.config.seconds_to_frames(duration_seconds);
        if frames == 0 {
            log::warn!("utility spell `{}` has no duration", definition.id);
            return false;
        }

        match kind {
            EffectKind::TorchLight => ctx
                .party
                .effects
                .activate_torch_light(frames, ctx.config.effects.torch_light_radius),
            EffectKind::Bless => {
                let bonus = if definition.stat_bonus != 0 {
                    definition.stat_bonus
                } else {
                    ctx.config.combat.bless_bonus
                };
                ctx.party.effects.activate(kind, frames, bonus);
            }
            _ => ctx
                .party
                .effects
                .activate(kind, frames, definition.stat_bonus),
        }

        log::debug!("{:?} active for {frames} frames", kind);
        ctx.messages
            .add_combat_message(format!("{} is active", definition.name));
        true
    }

    fn cast(
        &mut self,
        ctx: &mut GameContext<'_>,
        caster: usize,
        spell: &SpellId,
        casting: Casting,
    ) -> bool {
        let catalogs = ctx.catalogs;
        let definition = match catalogs.spells.spell_definition_by_id(spell) {
            Ok(definition) => definition,
            Err(error) => {
                log::warn!("cast rejected: {error}");
                ctx.messages
                    .add_combat_message(format!("Unknown spell: {spell}"));
                return false;
            }
        };

        let stat_bonus = ctx.party.stat_bonus();
        let (origin, angle) = (ctx.party.position, ctx.party.angle);
        let Some(member) = ctx.party.members.get(caster) else {
            return false;
        };
        let stats = member.effective_stats(stat_bonus);
        let school = member.skill(definition.school);
        let school_level = school.level;
        let shown = definition.displayed_amounts(
            stats.intellect,
            stats.personality,
            (school.level > 0).then_some(school.mastery),
        );
        let name = member.name.clone();

        match definition.spell_type() {
            SpellType::Projectile(_) => {
                let projectile = match catalogs.spells.create_projectile(
                    spell,
                    ctx.ids.next_id("spell"),
                    origin,
                    angle,
                    stats.intellect,
                    ctx.config.world.tile_size,
                ) {
                    Ok(projectile) => projectile.with_owner(caster),
                    Err(error) => {
                        log::warn!("cast rejected: {error}");
                        return false;
                    }
                };
                if !spend(ctx, caster, definition) {
                    return false;
                }
                ctx.messages.add_combat_message(format!(
                    "{name} casts {} for {} damage",
                    definition.name, shown.total
                ));
                launch(ctx, projectile)
            }
            SpellType::Heal(_) => {
                if !spend(ctx, caster, definition) {
                    return false;
                }
                let amount =
                    spell_heal(definition.cost, stats.personality) + definition.heal_amount.max(0);
                let healed = ctx
                    .party
                    .members
                    .get_mut(caster)
                    .map_or(0, |member| member.heal(amount));
                ctx.messages.add_combat_message(format!(
                    "{name} casts {} ({} power), healing {healed}",
                    definition.name, shown.total
                ));
                true
            }
            SpellType::Utility(_) => {
                let seconds = match casting {
                    Casting::Equipped => definition.duration_seconds,
                    Casting::Selected => {
                        scaled_duration_seconds(definition.duration_seconds, school_level)
                    }
                };
                if !spend(ctx, caster, definition) {
                    return false;
                }
                self.apply_utility(ctx, definition, seconds)
            }
        }
    }
}

/// Deducts the spell's cost, telling the player when points are short.
fn spend(ctx: &mut GameContext<'_>, caster: usize, definition: &SpellDefinition) -> bool {
    let Some(member) = ctx.party.members.get_mut(caster) else {
        return false;
    };
    if member.spend_sp(definition.cost) {
        return true;
    }
    ctx.messages.add_combat_message(format!(
        "{} lacks the spell points for {}",
        member.name, definition.name
    ));
    false
}

#[cfg(test)]
mod tests {
    use gridcrawl_core::ProjectileKind;

    use crate::tests::Fixture;

    #[test]
    fn projectile_spells_spend_points_and_register() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(0, "fire_bolt");
        let before = fixture.party.members[0].sp;
        let cost = fixture.spell_cost("fire_bolt");

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));

        assert_eq!(fixture.party.members[0].sp, before - cost);
        assert_eq!(fixture.projectiles.len(), 1);
        assert!(matches!(
            fixture.projectiles[0].kind,
            ProjectileKind::Magic { .. }
        ));
        assert!(fixture.collisions.contains(&fixture.projectiles[0].id));
    }

    #[test]
    fn cast_messages_show_the_mastery_bonus() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(0, "fire_bolt");
        let intellect = fixture.party.members[0].base.intellect;
        let _ = fixture.party.members[0].skills.insert(
            gridcrawl_core::SkillKind::Fire,
            gridcrawl_core::Skill::new(2, gridcrawl_core::Mastery::Expert),
        );
        let expected = gridcrawl_catalog::spells::spell_damage(4, intellect) + 10;

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));

        assert!(fixture
            .messages
            .contains(&format!("casts Fire Bolt for {expected} damage")));
    }

    #[test]
    fn untrained_casters_see_unscaled_amounts() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(0, "fire_bolt");
        let _ = fixture.party.members[0]
            .skills
            .remove(&gridcrawl_core::SkillKind::Fire);
        let intellect = fixture.party.members[0].base.intellect;
        let expected = gridcrawl_catalog::spells::spell_damage(4, intellect);

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));

        assert!(fixture
            .messages
            .contains(&format!("casts Fire Bolt for {expected} damage")));
    }

    #[test]
    fn insufficient_points_are_a_no_op() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(0, "fireball");
        fixture.party.members[0].sp = 0;

        assert!(!fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));

        assert!(fixture.projectiles.is_empty());
        assert_eq!(
            fixture
                .collisions
                .count_kind(gridcrawl_core::EntityKind::Projectile),
            0
        );
        assert!(fixture.messages.contains("lacks the spell points"));
    }

    #[test]
    fn unknown_spells_report_and_do_nothing() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(0, "meteor_swarm");
        let before = fixture.party.members[0].sp;

        assert!(!fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));

        assert_eq!(fixture.party.members[0].sp, before);
        assert!(fixture.messages.contains("Unknown spell: meteor_swarm"));
    }

    #[test]
    fn bless_adds_its_bonus_once() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(0, "bless");

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));
        assert_eq!(fixture.party.stat_bonus(), 20);
        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));
        assert_eq!(fixture.party.stat_bonus(), 20);
    }

    #[test]
    fn selected_casts_scale_utility_duration() {
        let mut fixture = Fixture::new();
        fixture.learn_spell(0, "torch_light");
        fixture.set_skill(0, gridcrawl_core::SkillKind::Fire, 5);
        let seconds = fixture.spell_duration("torch_light");

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_selected_spell(ctx)));

        let expected = fixture
            .config
            .seconds_to_frames((seconds * 1.5).trunc());
        assert_eq!(
            fixture
                .party
                .effects
                .frames_remaining(gridcrawl_core::EffectKind::TorchLight),
            expected
        );
    }

    #[test]
    fn generic_heal_lands_on_the_caster() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(1, "heal_other");
        let _ = fixture.party.select(1);
        fixture.party.members[0].hp = 1;
        fixture.party.members[1].hp = 1;

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_spell(ctx)));

        assert_eq!(fixture.party.members[0].hp, 1);
        assert!(fixture.party.members[1].hp > 1);
    }

    #[test]
    fn targeted_heal_respects_spell_reach() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(1, "heal");
        let _ = fixture.party.select(1);
        fixture.party.members[0].hp = 1;

        assert!(!fixture.resolve(|resolver, ctx| resolver.cast_equipped_heal_on_target(ctx, 0)));
        assert_eq!(fixture.party.members[0].hp, 1);

        fixture.equip_spell(1, "heal_other");
        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_heal_on_target(ctx, 0)));
        assert!(fixture.party.members[0].hp > 1);

        assert!(!fixture.resolve(|resolver, ctx| resolver.cast_equipped_heal_on_target(ctx, 9)));
    }

    #[test]
    fn targeted_heal_uses_reduced_formula() {
        let mut fixture = Fixture::new();
        fixture.equip_spell(1, "heal_other");
        let _ = fixture.party.select(1);
        fixture.party.members[0].hp = 1;
        let definition = fixture
            .catalogs
            .spells
            .spell_definition_by_id(&gridcrawl_core::SpellId::new("heal_other"))
            .expect("heal_other")
            .clone();
        let personality = fixture.party.members[1].base.personality;
        let expected = definition.cost * 3 + personality / 2 + definition.heal_amount;

        assert!(fixture.resolve(|resolver, ctx| resolver.cast_equipped_heal_on_target(ctx, 0)));

        let max_hp = fixture.party.members[0].max_hp;
        assert_eq!(fixture.party.members[0].hp, (1 + expected).min(max_hp));
    }
}
