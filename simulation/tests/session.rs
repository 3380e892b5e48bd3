use glam::Vec2;
use gridcrawl_catalog::{Catalogs, MonsterCatalog};
use gridcrawl_core::{
    Character, CharacterClass, Config, EffectKind, EncounterId, EntityId, EntityKind, EquipSlot,
    MovementModes, SpellId, Stats,
};
use gridcrawl_simulation::{Intent, Mode, Simulation, Turn};
use gridcrawl_world::{query, EncounterReward, TileCell, TileMap};

const S: f32 = 64.0;

fn knight(name: &str) -> Character {
    Character::new(
        name,
        CharacterClass::Knight,
        Stats {
            might: 16,
            intellect: 6,
            personality: 6,
            endurance: 14,
            accuracy: 12,
            speed: 10,
            luck: 0,
        },
        &Config::default().character,
    )
}

/// 34 by 34 tiles of open floor inside a wall ring.
fn arena() -> TileMap {
    let wall = "#".repeat(34);
    let floor = format!("#{}#", ".".repeat(32));
    let rows = std::iter::once(wall.clone())
        .chain(std::iter::repeat(floor).take(32))
        .chain(std::iter::once(wall));
    TileMap::from_rows("arena", rows, TileCell::new(1, 1), S).expect("valid arena")
}

fn arena_session() -> Simulation {
    let catalogs = Catalogs::builtin().expect("builtin catalogs");
    Simulation::from_map(
        Config::default(),
        catalogs,
        vec![knight("Aldric"), knight("Beren")],
        arena(),
    )
    .expect("session starts")
}

#[test]
fn fireball_stops_at_the_wall() {
    let mut session = arena_session();
    let origin = Vec2::new(32.0 * S + 1.0, 32.0 * S + 1.0);
    let mut fireball = session
        .catalogs()
        .spells
        .create_projectile(
            &SpellId::new("fireball"),
            EntityId::new("projectile-test"),
            origin,
            0.0,
            10,
            S,
        )
        .expect("fireball launches");
    fireball.velocity = Vec2::new(S, 0.0);
    assert!(session.launch_projectile(fireball).expect("registers"));
    assert_eq!(session.collisions().count_kind(EntityKind::Projectile), 1);

    let report = session.tick();

    assert_eq!(report.wall_impacts, 1);
    assert_eq!(session.projectile_count(), 0);
    assert_eq!(session.collisions().count_kind(EntityKind::Projectile), 0);
    assert!(!session
        .collisions()
        .contains(&EntityId::new("projectile-test")));
    assert_eq!(session.hit_effects().effects().len(), 1);
}

#[test]
fn encounter_rewards_are_paid_once() {
    let mut session = arena_session();
    session.register_encounter(
        EncounterId::new(1),
        EncounterReward {
            gold: 60,
            experience: 150,
        },
    );
    let goblins: Vec<EntityId> = [20, 22, 24]
        .into_iter()
        .map(|column| {
            let position = query::map(session.world()).tile_center(TileCell::new(column, 20));
            session
                .spawn_monster("goblin", position, Some(EncounterId::new(1)))
                .expect("goblin spawns")
        })
        .collect();

    for (index, goblin) in goblins.iter().enumerate() {
        let _ = session.monster_mut(goblin).expect("goblin").disintegrate();
        let report = session.tick();
        assert_eq!(report.monsters_removed, 1);
        if index < 2 {
            assert_eq!(session.party().gold, 0);
        }
    }

    assert_eq!(session.party().gold, 60);
    assert_eq!(session.totals().experience_awarded, 150);
    assert!(session.messages().contains("Encounter cleared! +60 gold"));
    assert!(session.messages().contains("+150 experience for the party"));
    assert_eq!(session.collisions().count_kind(EntityKind::Monster), 0);

    let _ = session.tick();
    assert_eq!(session.party().gold, 60);
}

#[test]
fn water_breathing_expiry_returns_to_the_surface() {
    let catalogs = Catalogs::builtin().expect("builtin catalogs");
    let mut session = Simulation::new(
        Config::default(),
        catalogs,
        vec![knight("Aldric")],
        "underwater",
    )
    .expect("session starts");
    session
        .party_mut()
        .effects
        .activate(EffectKind::WaterBreathing, 2, 0);
    assert_eq!(session.collisions().count_kind(EntityKind::Monster), 1);

    let _ = session.tick();
    assert_eq!(query::map(session.world()).key(), "underwater");
    let _ = session.tick();

    let map = query::map(session.world());
    assert_eq!(map.key(), "overworld");
    assert!(map.can_move_to(session.party().position, MovementModes::NONE));
    assert_eq!(session.collisions().count_kind(EntityKind::Monster), 5);
    assert_eq!(query::monsters(session.world()).len(), 5);
    assert!(session.messages().contains("Water Breathing wears off"));
}

#[test]
fn failed_map_change_keeps_the_current_map() {
    let mut catalogs = Catalogs::builtin().expect("builtin catalogs");
    // Only the underwater inhabitants remain, so the overworld cannot be populated.
    catalogs.monsters = MonsterCatalog::from_toml(
        r#"
        [sea_serpent]
        name = "Sea Serpent"
        kind = "beast"
        hp = 40
        radius = 20.0
        attack_radius = 20.0
        damage_min = 4
        damage_max = 10
        experience = 120
        gold = 35
        speed = 1.4
        "#,
    )
    .expect("valid monsters");
    let mut session = Simulation::new(
        Config::default(),
        catalogs,
        vec![knight("Aldric")],
        "underwater",
    )
    .expect("session starts");
    let position = session.party().position;

    assert!(session.change_map("overworld").is_err());

    assert_eq!(query::map(session.world()).key(), "underwater");
    assert_eq!(query::monsters(session.world()).len(), 1);
    assert_eq!(session.collisions().count_kind(EntityKind::Monster), 1);
    assert_eq!(session.party().position, position);
}

#[test]
fn bless_expiry_restores_the_stat_bonus() {
    let mut session = arena_session();
    session.party_mut().effects.activate(EffectKind::Bless, 3, 20);
    assert_eq!(session.party().stat_bonus(), 20);

    for _ in 0..3 {
        let _ = session.tick();
    }

    assert_eq!(session.party().stat_bonus(), 0);
    assert!(!session.party().effects.is_active(EffectKind::Bless));
    assert!(session.messages().contains("Bless wears off"));
}

#[test]
fn defeated_parties_ignore_intents() {
    let mut session = arena_session();
    for member in &mut session.party_mut().members {
        let _ = member.take_damage(1000);
    }
    assert!(session.is_party_defeated());

    session.push_intent(Intent::Turn { radians: 1.0 });
    let report = session.tick();

    assert_eq!(report.intents, 0);
    assert_eq!(session.party().angle, 0.0);
}

#[test]
fn turn_based_rounds_alternate() {
    let mut session = arena_session();
    for member in 0..2 {
        let dagger = session.catalogs().items.weapon("dagger").expect("dagger");
        let _ = session.party_mut().members[member]
            .equipment
            .insert(EquipSlot::MainHand, dagger);
    }

    session.push_intent(Intent::ToggleTurnBased);
    session.push_intent(Intent::MeleeAttack);
    session.push_intent(Intent::MeleeAttack);
    let first = session.tick();

    assert_eq!(session.mode(), Mode::TurnBased);
    assert!(session.turns().has_acted(0));
    assert!(first.monster_turn.is_none());
    assert_eq!(session.turns().current_turn(), Turn::Party);

    session.push_intent(Intent::SelectMember(1));
    session.push_intent(Intent::MeleeAttack);
    let second = session.tick();

    assert!(second.monster_turn.is_some());
    assert_eq!(session.turns().round(), 1);
    assert_eq!(session.turns().current_turn(), Turn::Party);
    assert!(!session.turns().has_acted(0));
}

#[test]
fn ending_the_turn_hands_over_to_monsters() {
    let mut session = arena_session();
    assert!(!session.apply_intent(Intent::EndTurn));
    assert!(session.apply_intent(Intent::ToggleTurnBased));
    assert!(session.apply_intent(Intent::EndTurn));
    assert_eq!(session.turns().current_turn(), Turn::Monsters);

    let report = session.tick();
    assert!(report.monster_turn.is_some());
    assert_eq!(session.turns().current_turn(), Turn::Party);

    assert!(session.apply_intent(Intent::ToggleTurnBased));
    assert_eq!(session.mode(), Mode::RealTime);
}

#[test]
fn regeneration_pulses_on_the_configured_interval() {
    let mut session = arena_session();
    let interval = session.config().regen.interval_frames;
    let per_pulse = session.config().regen.hp_per_interval;
    session.party_mut().members[0].hp = 5;

    for _ in 0..interval - 1 {
        let _ = session.tick();
    }
    assert_eq!(session.party().members[0].hp, 5);

    let _ = session.tick();
    assert_eq!(session.party().members[0].hp, 5 + per_pulse);
}

#[test]
fn walls_stop_the_party() {
    let mut session = arena_session();
    let start = session.party().position;

    assert!(session.apply_intent(Intent::Move {
        forward: S / 2.0,
        strafe: 0.0,
    }));
    assert_eq!(session.party().position, start + Vec2::new(S / 2.0, 0.0));
    assert_eq!(
        session
            .collisions()
            .entity_by_id(&EntityId::player())
            .map(|body| body.position),
        Some(session.party().position)
    );

    let here = session.party().position;
    assert!(!session.apply_intent(Intent::Move {
        forward: -1.5 * S,
        strafe: 0.0,
    }));
    assert_eq!(session.party().position, here);
}

#[test]
fn counters_track_ticks() {
    let mut session = arena_session();
    for _ in 0..4 {
        let _ = session.tick();
    }
    assert_eq!(session.counters().ticks(), 4);
    assert_eq!(session.totals().ticks, 4);
    assert_eq!(session.counters().peak_projectiles(), 0);
    assert!(session.score() > 0);
}
