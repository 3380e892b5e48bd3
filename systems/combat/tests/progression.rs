use gridcrawl_core::{
    config::CharacterConfig, ArmorCategory, ArmorStats, Character, CharacterClass, CombatLog,
    EquipSlot, Item, ItemKind, Stats,
};
use gridcrawl_system_combat::{apply_armor_damage_reduction, check_level_up};

fn paladin() -> Character {
    Character::new(
        "Bram",
        CharacterClass::Paladin,
        Stats {
            might: 14,
            intellect: 8,
            personality: 12,
            endurance: 14,
            accuracy: 10,
            speed: 10,
            luck: 5,
        },
        &CharacterConfig::default(),
    )
}

#[test]
fn exact_threshold_levels_once_and_restores() {
    let config = CharacterConfig::default();
    let mut messages = CombatLog::default();
    let mut character = paladin();
    character.hp = 3;
    character.sp = 1;
    character.experience += 100;

    let _ = check_level_up(&mut character, &config, &mut messages);

    assert_eq!(character.level, 2);
    assert_eq!(character.experience, 0);
    assert_eq!(character.free_stat_points, 5);
    assert_eq!(character.hp, character.max_hp);
    assert_eq!(character.sp, character.max_sp);
    assert!(messages.contains("reached level 2"));
}

#[test]
fn six_hundred_experience_reaches_level_four() {
    let config = CharacterConfig::default();
    let mut messages = CombatLog::default();
    let mut character = paladin();
    character.experience = 600;

    assert_eq!(check_level_up(&mut character, &config, &mut messages), 3);
    assert_eq!(character.level, 4);
    assert_eq!(character.experience, 0);
    assert_eq!(character.free_stat_points, 15);
}

#[test]
fn leveling_raises_maximum_hit_points() {
    let config = CharacterConfig::default();
    let mut messages = CombatLog::default();
    let mut character = paladin();
    let before = character.max_hp;
    character.experience = 100;

    let _ = check_level_up(&mut character, &config, &mut messages);

    assert!(character.max_hp > before);
}

#[test]
fn heavy_armor_floors_damage_at_one() {
    let mut character = paladin();
    let _ = character.equipment.insert(
        EquipSlot::Body,
        Item {
            key: "fortress_plate".to_owned(),
            name: "Fortress Plate".to_owned(),
            kind: ItemKind::Armor(ArmorStats {
                slot: EquipSlot::Body,
                category: ArmorCategory::Plate,
                armor_class: 100,
                endurance_divisor: 0,
            }),
        },
    );

    assert_eq!(apply_armor_damage_reduction(10, &character, 0), 1);
}
