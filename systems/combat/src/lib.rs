#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolver that turns party actions and collisions into damage,
//! healing, buffs and rewards.
//!
//! The resolver never owns game state. Every operation receives a
//! [`GameContext`] borrowing the collaborators it needs for the duration of
//! the call, and precondition failures are silent no-ops reported through
//! the returned `bool`.

use std::collections::BTreeMap;

use glam::Vec2;
use gridcrawl_catalog::Catalogs;
use gridcrawl_core::{
    CombatLog, Config, DamageKind, EntityId, EntityKind, GameRng, IdAllocator, Monster,
    MovementModes, Party, Projectile, ProjectileKind, SessionTotals,
};
use gridcrawl_system_collision::{CollisionEntity, CollisionIndex};
use gridcrawl_world::{EncounterReward, World};
use rand::Rng;

mod casting;
mod consumables;
pub mod defense;
pub mod rewards;

pub use defense::{apply_armor_damage_reduction, roll_perfect_dodge, Strike, StrikeOutcome};
pub use rewards::check_level_up;

/// Collaborators borrowed by the resolver for a single operation.
#[derive(Debug)]
pub struct GameContext<'a> {
    /// Tunables.
    pub config: &'a Config,
    /// Read-only definition tables.
    pub catalogs: &'a Catalogs,
    /// Map and monsters.
    pub world: &'a mut World,
    /// The player's party.
    pub party: &'a mut Party,
    /// Shared spatial index.
    pub collisions: &'a CollisionIndex,
    /// Live projectiles, melee hitboxes included.
    pub projectiles: &'a mut Vec<Projectile>,
    /// Player-facing message sink.
    pub messages: &'a mut CombatLog,
    /// Identifier source for spawned entities.
    pub ids: &'a mut IdAllocator,
    /// Injected random source.
    pub rng: &'a mut GameRng,
    /// Session counters feeding the score.
    pub totals: &'a mut SessionTotals,
}

/// Visual category of an impact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitKind {
    /// Arrow impact.
    Arrow,
    /// Melee swing connecting.
    Melee,
    /// Spell bolt impact.
    Spell {
        /// Base damage of the spell.
        damage_base: i32,
        /// Collision radius of the bolt in pixels.
        radius: f32,
    },
}

/// Impact reported to the cosmetic layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitReport {
    /// Where the impact happened.
    pub position: Vec2,
    /// What kind of projectile hit.
    pub kind: HitKind,
}

impl HitReport {
    /// Describes an impact of `projectile` at `position`.
    #[must_use]
    pub fn new(projectile: &Projectile, position: Vec2, catalogs: &Catalogs) -> Self {
        let kind = match &projectile.kind {
            ProjectileKind::Arrow { .. } => HitKind::Arrow,
            ProjectileKind::Melee { .. } => HitKind::Melee,
            ProjectileKind::Magic { spell, .. } => HitKind::Spell {
                damage_base: catalogs
                    .spells
                    .spell_definition_by_id(spell)
                    .map_or(0, |definition| definition.damage_base),
                radius: projectile.size * 0.5,
            },
        };
        Self { position, kind }
    }
}

/// Resolves every combat action of the party and of monsters in real time.
#[derive(Debug, Default)]
pub struct CombatResolver {
    slots: BTreeMap<EntityId, usize>,
}

impl CombatResolver {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Swings or fires the selected member's main-hand weapon.
    ///
    /// Weapons reaching further than the melee threshold loose an arrow from
    /// the party position; shorter weapons place a stationary hitbox one
    /// weapon range ahead of the party.
    pub fn equipped_melee(&mut self, ctx: &mut GameContext<'_>) -> bool {
        let config = ctx.config;
        let attacker = ctx.party.selected;
        let stat_bonus = ctx.party.stat_bonus();
        let Some(member) = ctx.party.members.get(attacker) else {
            return false;
        };
        if !member.is_conscious() {
            return false;
        }
        let Some((item, weapon)) = member.main_hand() else {
            return false;
        };

        let stats = member.effective_stats(stat_bonus);
        let roll = ctx.rng.gen_range(weapon.damage_min..=weapon.damage_max);
        let tile_size = config.world.tile_size;
        let direction = Vec2::from_angle(ctx.party.angle);

        let projectile = if weapon.range_tiles > config.combat.melee_reach_tiles {
            Projectile::new(
                ctx.ids.next_id("arrow"),
                ProjectileKind::Arrow {
                    weapon: item.key.clone(),
                },
                ctx.party.position,
                direction * config.projectiles.arrow_speed,
                roll + stats.accuracy / 4,
                config.projectiles.arrow_lifetime,
                config.projectiles.arrow_collision_size * tile_size,
            )
        } else {
            let category = config.weapons.category(weapon.category);
            Projectile::new(
                ctx.ids.next_id("melee"),
                ProjectileKind::Melee {
                    weapon: item.key.clone(),
                },
                ctx.party.position + direction * (weapon.range_tiles * tile_size),
                Vec2::ZERO,
                roll + stats.might / 4,
                category.lifetime,
                category.collision_size * tile_size,
            )
        };

        launch(ctx, projectile.with_owner(attacker))
    }

    /// Lets every monster in reach strike the party, then pushes it back.
    ///
    /// The selected member takes the blow; when it cannot act the first
    /// conscious member does. Monsters still cooling down are skipped.
    pub fn handle_monster_interactions(&mut self, ctx: &mut GameContext<'_>) {
        let config = ctx.config;
        let collisions = ctx.collisions;
        let player = ctx.party.position;
        let (map, monsters) = ctx.world.map_and_monsters_mut();

        for monster in monsters.iter_mut() {
            if !monster.is_alive() || monster.attack_cooldown > 0 {
                continue;
            }
            if monster.position.distance(player) > config.monster_ai.attack_distance {
                continue;
            }
            let target = match ctx.party.selected_member() {
                Some(member) if member.is_conscious() => Some(ctx.party.selected),
                _ => ctx.party.first_conscious(),
            };
            let Some(target) = target else {
                break;
            };

            let raw_damage = monster.attack_damage(ctx.rng);
            let _ = defense::strike_member(
                ctx.party,
                target,
                Strike {
                    attacker: &monster.name,
                    raw_damage,
                    dodgeable: false,
                },
                config.combat.damage_blink_frames,
                ctx.messages,
                ctx.rng,
            );
            monster.attack_cooldown = config.monster_ai.attack_cooldown_frames;

            let away = (monster.position - player).normalize_or_zero();
            if away == Vec2::ZERO {
                continue;
            }
            let pushed = monster.position + away * config.monster_ai.pushback;
            if map.can_move_to(pushed, MovementModes::NONE)
                && collisions.can_move_to(&monster.id, pushed)
            {
                monster.position = pushed;
                if let Err(error) = collisions.update(&monster.id, pushed) {
                    log::error!("failed to move monster {} in the index: {error}", monster.id);
                }
            }
        }
    }

    /// Applies every projectile that overlaps a living monster.
    ///
    /// Each projectile strikes at most one monster, then deactivates and
    /// leaves the index. Fallen monsters pay out immediately; survivors
    /// report their remaining hit points.
    pub fn check_projectile_monster_collisions(
        &mut self,
        ctx: &mut GameContext<'_>,
    ) -> Vec<HitReport> {
        let catalogs = ctx.catalogs;
        let collisions = ctx.collisions;
        let pairs = collisions.collisions(EntityKind::Projectile, EntityKind::Monster);
        if pairs.is_empty() {
            return Vec::new();
        }

        self.slots.clear();
        for (slot, projectile) in ctx.projectiles.iter().enumerate() {
            let _ = self.slots.insert(projectile.id.clone(), slot);
        }

        let mut hits = Vec::new();
        for pair in pairs {
            let Some(&slot) = self.slots.get(&pair.first) else {
                continue;
            };
            let Some(projectile) = ctx.projectiles.get_mut(slot) else {
                continue;
            };
            if !projectile.is_live() {
                continue;
            }
            let Some(monster) = ctx.world.monster_mut(&pair.second) else {
                continue;
            };
            if !monster.is_alive() {
                continue;
            }

            let applied = match &projectile.kind {
                ProjectileKind::Magic { damage_kind, .. } => {
                    monster.take_damage(projectile.damage, *damage_kind)
                }
                ProjectileKind::Arrow { weapon } | ProjectileKind::Melee { weapon } => weapon_hit(
                    catalogs,
                    weapon,
                    projectile.damage,
                    monster,
                    ctx.messages,
                    ctx.rng,
                ),
            };

            projectile.deactivate();
            if let Err(error) = collisions.unregister(&projectile.id) {
                log::error!("failed to unregister spent projectile: {error}");
            }
            hits.push(HitReport::new(projectile, projectile.position, catalogs));

            if monster.is_alive() {
                ctx.messages.add_combat_message(format!(
                    "{} takes {applied} damage ({}/{} HP)",
                    monster.name, monster.hp, monster.max_hp
                ));
            } else {
                let fallen = monster.clone();
                self.award_experience_and_gold(ctx, &fallen);
            }
        }
        hits
    }

    /// Pays out a slain monster: gold, an even experience share per living
    /// member with level-ups, and an independent roll of its loot table.
    pub fn award_experience_and_gold(&mut self, ctx: &mut GameContext<'_>, monster: &Monster) {
        let catalogs = ctx.catalogs;
        ctx.party.gold += monster.gold;
        let experience = rewards::share_experience(
            ctx.party,
            monster.experience,
            &ctx.config.character,
            ctx.messages,
        );

        ctx.totals.gold_collected += monster.gold;
        ctx.totals.experience_awarded += experience;
        ctx.totals.monsters_slain += 1;

        ctx.messages.add_combat_message(format!(
            "{} dies! +{} gold, +{experience} experience",
            monster.name, monster.gold
        ));

        for item in catalogs.loot.roll(&monster.key, &catalogs.items, ctx.rng) {
            ctx.messages
                .add_combat_message(format!("Found {}", item.name));
            ctx.party.inventory.push(item);
        }
    }

    /// Pays the reward of an emptied encounter group.
    pub fn award_encounter_reward(&mut self, ctx: &mut GameContext<'_>, reward: EncounterReward) {
        ctx.party.gold += reward.gold;
        let experience = rewards::share_experience(
            ctx.party,
            reward.experience,
            &ctx.config.character,
            ctx.messages,
        );
        ctx.totals.gold_collected += reward.gold;
        ctx.totals.experience_awarded += experience;

        log::info!(
            "encounter reward paid: {} gold, {experience} experience",
            reward.gold
        );
        ctx.messages
            .add_combat_message(format!("Encounter cleared! +{} gold", reward.gold));
        ctx.messages
            .add_combat_message(format!("+{experience} experience for the party"));
    }
}

fn weapon_hit(
    catalogs: &Catalogs,
    weapon: &str,
    damage: i32,
    monster: &mut Monster,
    messages: &mut CombatLog,
    rng: &mut GameRng,
) -> i32 {
    let Some(stats) = catalogs.items.weapon_stats(weapon) else {
        log::warn!("projectile references unknown weapon `{weapon}`");
        return monster.take_damage(damage, DamageKind::Physical);
    };

    let mut damage = (damage as f32 * stats.multiplier_against(&monster.kind)).round() as i32;
    if stats.crit_chance > 0.0 && rng.gen_bool(f64::from(stats.crit_chance)) {
        damage *= 2;
        messages.add_combat_message("Critical hit!");
    }
    if stats.disintegrate_chance > 0.0 && rng.gen_bool(f64::from(stats.disintegrate_chance)) {
        messages.add_combat_message(format!("{} is disintegrated!", monster.name));
        return monster.disintegrate();
    }
    monster.take_damage(damage, stats.damage_kind)
}

/// Registers a fresh projectile and adds it to the live set.
///
/// Projectiles born without lifetime are dropped.
fn launch(ctx: &mut GameContext<'_>, projectile: Projectile) -> bool {
    if !projectile.is_live() {
        log::debug!("discarding projectile {} without lifetime", projectile.id);
        return false;
    }
    let entity = CollisionEntity::new(
        projectile.id.clone(),
        EntityKind::Projectile,
        projectile.position,
        Vec2::splat(projectile.bounding_size()),
    );
    if let Err(error) = ctx.collisions.register(entity) {
        log::error!("failed to register projectile: {error}");
        return false;
    }
    ctx.projectiles.push(projectile);
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use gridcrawl_core::{
        Character, CharacterClass, Condition, EquipSlot, Mastery, Skill, SkillKind, SpellId,
        Stats,
    };
    use gridcrawl_system_collision::WallMask;
    use gridcrawl_world::{TileCell, TileMap};
    use rand::SeedableRng;

    use super::*;

    pub(crate) struct Fixture {
        pub(crate) config: Config,
        pub(crate) catalogs: Catalogs,
        pub(crate) world: World,
        pub(crate) party: Party,
        pub(crate) collisions: CollisionIndex,
        pub(crate) projectiles: Vec<Projectile>,
        pub(crate) messages: CombatLog,
        pub(crate) ids: IdAllocator,
        pub(crate) rng: GameRng,
        pub(crate) totals: SessionTotals,
        resolver: CombatResolver,
    }

    impl Fixture {
        /// Sorcerer and cleric standing on the overworld start tile.
        pub(crate) fn new() -> Self {
            let config = Config::default();
            let catalogs = Catalogs::builtin().expect("builtin catalogs");
            let definition = catalogs.map("overworld").expect("overworld map");
            let map = TileMap::from_definition(definition, config.world.tile_size)
                .expect("valid overworld");
            let walls = WallMask::from_fn(map.columns(), map.rows(), map.tile_size(), |c, r| {
                map.is_wall(TileCell::new(c, r))
            });
            let position = map.starting_position();
            let collisions = CollisionIndex::new(walls);
            collisions
                .register(CollisionEntity::new(
                    EntityId::player(),
                    EntityKind::Player,
                    position,
                    Vec2::splat(config.world.player_radius * 2.0),
                ))
                .expect("player registers");

            let sorcerer = Character::new(
                "Ilsa",
                CharacterClass::Sorcerer,
                Stats {
                    might: 8,
                    intellect: 20,
                    personality: 10,
                    endurance: 10,
                    accuracy: 12,
                    speed: 12,
                    luck: 0,
                },
                &config.character,
            );
            let cleric = Character::new(
                "Mira",
                CharacterClass::Cleric,
                Stats {
                    might: 10,
                    intellect: 8,
                    personality: 20,
                    endurance: 12,
                    accuracy: 10,
                    speed: 10,
                    luck: 0,
                },
                &config.character,
            );

            Self {
                messages: CombatLog::new(config.messages.retained),
                party: Party::new(vec![sorcerer, cleric], position),
                world: World::new(map),
                config,
                catalogs,
                collisions,
                projectiles: Vec::new(),
                ids: IdAllocator::new(),
                rng: GameRng::seed_from_u64(7),
                totals: SessionTotals::default(),
                resolver: CombatResolver::new(),
            }
        }

        pub(crate) fn resolve<T>(
            &mut self,
            action: impl FnOnce(&mut CombatResolver, &mut GameContext<'_>) -> T,
        ) -> T {
            let mut ctx = GameContext {
                config: &self.config,
                catalogs: &self.catalogs,
                world: &mut self.world,
                party: &mut self.party,
                collisions: &self.collisions,
                projectiles: &mut self.projectiles,
                messages: &mut self.messages,
                ids: &mut self.ids,
                rng: &mut self.rng,
                totals: &mut self.totals,
            };
            action(&mut self.resolver, &mut ctx)
        }

        pub(crate) fn equip_spell(&mut self, member: usize, spell: &str) {
            self.party.members[member].equipped_spell = Some(SpellId::new(spell));
        }

        pub(crate) fn learn_spell(&mut self, member: usize, spell: &str) {
            let character = &mut self.party.members[member];
            character.known_spells.push(SpellId::new(spell));
            character.selected_spell = character.known_spells.len() - 1;
        }

        pub(crate) fn set_skill(&mut self, member: usize, kind: SkillKind, level: u32) {
            let _ = self.party.members[member]
                .skills
                .insert(kind, Skill::new(level, Mastery::Novice));
        }

        pub(crate) fn spell_cost(&self, spell: &str) -> i32 {
            self.catalogs
                .spells
                .spell_definition_by_id(&SpellId::new(spell))
                .expect("known spell")
                .cost
        }

        pub(crate) fn spell_duration(&self, spell: &str) -> f32 {
            self.catalogs
                .spells
                .spell_definition_by_id(&SpellId::new(spell))
                .expect("known spell")
                .duration_seconds
        }

        pub(crate) fn stock(&mut self, key: &str) {
            let item = self.catalogs.items.item(key).expect("known item");
            self.party.inventory.push(item);
        }

        fn arm(&mut self, member: usize, weapon: &str) {
            let item = self.catalogs.items.weapon(weapon).expect("known weapon");
            let _ = self.party.members[member]
                .equipment
                .insert(EquipSlot::MainHand, item);
        }

        fn spawn(&mut self, key: &str, offset: Vec2) -> EntityId {
            let id = self.ids.next_id("monster");
            let position = self.party.position + offset;
            let monster = self
                .catalogs
                .monsters
                .spawn(key, id.clone(), position, None)
                .expect("known monster");
            let size = Vec2::splat(monster.radius * 2.0);
            self.world.spawn_monster(monster).expect("unique monster");
            self.collisions
                .register(CollisionEntity::new(
                    id.clone(),
                    EntityKind::Monster,
                    position,
                    size,
                ))
                .expect("monster registers");
            id
        }

        fn place_bolt(&mut self, offset: Vec2, damage: i32) -> EntityId {
            let id = self.ids.next_id("spell");
            let projectile = Projectile::new(
                id.clone(),
                ProjectileKind::Magic {
                    spell: SpellId::new("fire_bolt"),
                    damage_kind: DamageKind::Fire,
                },
                self.party.position + offset,
                Vec2::ZERO,
                damage,
                10,
                16.0,
            );
            assert!(self.resolve(|_, ctx| launch(ctx, projectile)));
            id
        }

        fn monster(&self, id: &EntityId) -> &Monster {
            gridcrawl_world::query::monster(&self.world, id).expect("monster present")
        }
    }

    #[test]
    fn short_weapons_place_a_hitbox_one_range_ahead() {
        let mut fixture = Fixture::new();
        fixture.arm(0, "longsword");

        assert!(fixture.resolve(|resolver, ctx| resolver.equipped_melee(ctx)));

        let swing = &fixture.projectiles[0];
        let expected_lifetime = fixture
            .config
            .weapons
            .category(gridcrawl_core::WeaponCategory::Sword)
            .lifetime;
        assert!(matches!(swing.kind, ProjectileKind::Melee { .. }));
        assert_eq!(swing.position, fixture.party.position + Vec2::new(64.0, 0.0));
        assert_eq!(swing.velocity, Vec2::ZERO);
        assert_eq!(swing.lifetime, expected_lifetime);
        assert!(fixture.collisions.contains(&swing.id));
    }

    #[test]
    fn long_weapons_fire_arrows() {
        let mut fixture = Fixture::new();
        fixture.arm(0, "short_bow");

        assert!(fixture.resolve(|resolver, ctx| resolver.equipped_melee(ctx)));

        let arrow = &fixture.projectiles[0];
        assert!(matches!(arrow.kind, ProjectileKind::Arrow { .. }));
        assert_eq!(arrow.position, fixture.party.position);
        assert_eq!(
            arrow.velocity,
            Vec2::new(fixture.config.projectiles.arrow_speed, 0.0)
        );
        assert_eq!(arrow.lifetime, fixture.config.projectiles.arrow_lifetime);
    }

    #[test]
    fn unarmed_or_fallen_members_cannot_attack() {
        let mut fixture = Fixture::new();
        assert!(!fixture.resolve(|resolver, ctx| resolver.equipped_melee(ctx)));

        fixture.arm(0, "dagger");
        fixture.party.members[0].hp = 0;
        let _ = fixture.party.members[0].add_condition(Condition::Unconscious);
        assert!(!fixture.resolve(|resolver, ctx| resolver.equipped_melee(ctx)));
        assert!(fixture.projectiles.is_empty());
    }

    #[test]
    fn monsters_at_attack_distance_strike_and_recoil() {
        let mut fixture = Fixture::new();
        let reach = fixture.config.monster_ai.attack_distance;
        let goblin = fixture.spawn("goblin", Vec2::new(0.0, reach));
        let before = fixture.party.members[0].hp;

        fixture.resolve(|resolver, ctx| resolver.handle_monster_interactions(ctx));

        assert!(fixture.party.members[0].hp < before);
        assert_eq!(
            fixture.party.damage_blink[0],
            fixture.config.combat.damage_blink_frames
        );
        let pushed = fixture.party.position
            + Vec2::new(0.0, reach + fixture.config.monster_ai.pushback);
        assert_eq!(fixture.monster(&goblin).position, pushed);
        assert_eq!(
            fixture.collisions.entity_by_id(&goblin).map(|e| e.position),
            Some(pushed)
        );
        assert_eq!(
            fixture.monster(&goblin).attack_cooldown,
            fixture.config.monster_ai.attack_cooldown_frames
        );
        assert!(fixture.messages.contains("Goblin hits Ilsa"));
    }

    #[test]
    fn monsters_beyond_reach_hold_their_blow() {
        let mut fixture = Fixture::new();
        let reach = fixture.config.monster_ai.attack_distance;
        let goblin = fixture.spawn("goblin", Vec2::new(0.0, reach + 1.0));
        let before = fixture.party.members[0].hp;

        fixture.resolve(|resolver, ctx| resolver.handle_monster_interactions(ctx));

        assert_eq!(fixture.party.members[0].hp, before);
        assert_eq!(fixture.monster(&goblin).attack_cooldown, 0);
    }

    #[test]
    fn blows_fall_back_to_the_first_conscious_member() {
        let mut fixture = Fixture::new();
        fixture.party.members[0].hp = 0;
        let _ = fixture.party.members[0].add_condition(Condition::Unconscious);
        let _ = fixture.spawn("goblin", Vec2::new(0.0, 40.0));
        let before = fixture.party.members[1].hp;

        fixture.resolve(|resolver, ctx| resolver.handle_monster_interactions(ctx));

        assert!(fixture.party.members[1].hp < before);
        assert_eq!(fixture.party.members[0].hp, 0);
    }

    #[test]
    fn surviving_monsters_report_remaining_health() {
        let mut fixture = Fixture::new();
        let goblin = fixture.spawn("goblin", Vec2::new(0.0, 64.0));
        let bolt = fixture.place_bolt(Vec2::new(0.0, 64.0), 3);

        let hits =
            fixture.resolve(|resolver, ctx| resolver.check_projectile_monster_collisions(ctx));

        assert_eq!(fixture.monster(&goblin).hp, 17);
        assert!(!fixture.projectiles[0].active);
        assert!(!fixture.collisions.contains(&bolt));
        assert!(fixture.messages.contains("Goblin takes 3 damage (17/20 HP)"));
        assert_eq!(
            hits,
            vec![HitReport {
                position: fixture.party.position + Vec2::new(0.0, 64.0),
                kind: HitKind::Spell {
                    damage_base: 4,
                    radius: 8.0,
                },
            }]
        );
    }

    #[test]
    fn slain_monsters_pay_out_immediately() {
        let mut fixture = Fixture::new();
        let rat = fixture.spawn("rat", Vec2::new(0.0, 64.0));
        let _ = fixture.place_bolt(Vec2::new(0.0, 64.0), 50);
        let template = fixture
            .catalogs
            .monsters
            .definition("rat")
            .expect("rat")
            .clone();

        let _ = fixture.resolve(|resolver, ctx| resolver.check_projectile_monster_collisions(ctx));

        assert!(!fixture.monster(&rat).is_alive());
        assert_eq!(fixture.party.gold, template.gold);
        let share = template.experience / 2;
        assert_eq!(fixture.party.members[0].experience, share);
        assert_eq!(fixture.party.members[1].experience, share);
        assert_eq!(fixture.totals.monsters_slain, 1);
        assert_eq!(fixture.totals.experience_awarded, share * 2);
    }

    #[test]
    fn a_projectile_strikes_only_one_monster() {
        let mut fixture = Fixture::new();
        let first = fixture.spawn("goblin", Vec2::new(-4.0, 64.0));
        let second = fixture.spawn("goblin", Vec2::new(4.0, 64.0));
        let _ = fixture.place_bolt(Vec2::new(0.0, 64.0), 5);

        let hits =
            fixture.resolve(|resolver, ctx| resolver.check_projectile_monster_collisions(ctx));

        assert_eq!(hits.len(), 1);
        let wounded = [first, second]
            .iter()
            .filter(|id| fixture.monster(id).hp < 20)
            .count();
        assert_eq!(wounded, 1);
    }

    #[test]
    fn encounter_rewards_are_shared_and_announced() {
        let mut fixture = Fixture::new();
        let reward = EncounterReward {
            gold: 60,
            experience: 150,
        };

        fixture.resolve(|resolver, ctx| resolver.award_encounter_reward(ctx, reward));

        assert_eq!(fixture.party.gold, 60);
        assert_eq!(fixture.party.members[0].experience, 75);
        assert!(fixture.messages.contains("+60 gold"));
        assert!(fixture.messages.contains("+150 experience"));
        assert_eq!(fixture.totals.gold_collected, 60);
    }
}
