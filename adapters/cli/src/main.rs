#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless gridcrawl session.

mod autopilot;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use gridcrawl_catalog::Catalogs;
use gridcrawl_core::{Character, CharacterClass, Config, EquipSlot, SpellId, Stats};
use gridcrawl_simulation::{Intent, Simulation};
use gridcrawl_system_scoring::score_breakdown;

use crate::autopilot::Autopilot;

/// Runs an autopiloted party through a gridcrawl map and prints the outcome.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding config.toml, the catalogs and maps/; builtin data when omitted.
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Map the party starts on.
    #[arg(short, long, default_value = "overworld")]
    map: String,
    /// Maximum ticks to simulate.
    #[arg(short, long, default_value_t = 3_600)]
    ticks: u64,
    /// Overrides the configured random seed.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overrides the configured worker count.
    #[arg(short, long)]
    workers: Option<usize>,
    /// Plays in turn-based mode.
    #[arg(long)]
    turn_based: bool,
}

/// Entry point for the gridcrawl command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.data {
        Some(dir) => load_config(dir)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.rng_seed = seed;
    }
    if let Some(workers) = args.workers {
        config.simulation.worker_threads = workers;
    }

    let catalogs = match &args.data {
        Some(dir) => Catalogs::load_dir(dir)?,
        None => Catalogs::builtin()?,
    };
    let members = demo_party(&config, &catalogs)?;
    let autopilot = Autopilot::new(config.world.tile_size);
    let mut session = Simulation::new(config, catalogs, members, &args.map)
        .with_context(|| format!("failed to start a session on `{}`", args.map))?;
    give_provisions(&mut session)?;
    if args.turn_based {
        let _ = session.apply_intent(Intent::ToggleTurnBased);
    }

    let mut shown: Vec<String> = Vec::new();
    let mut ran = 0;
    while ran < args.ticks {
        for intent in autopilot.plan(ran, &session) {
            session.push_intent(intent);
        }
        let _ = session.tick();
        ran += 1;
        shown = print_new_messages(&session, shown);

        if session.is_party_defeated() {
            println!("The party has fallen.");
            break;
        }
        if gridcrawl_world::query::alive_monster_count(session.world()) == 0 {
            println!("The map is cleared.");
            break;
        }
    }

    report(&session, ran);
    Ok(())
}

fn load_config(dir: &Path) -> Result<Config> {
    let path = dir.join("config.toml");
    if !path.exists() {
        log::warn!("{} not found; using defaults", path.display());
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

fn parse_config(contents: &str) -> Result<Config> {
    Ok(toml::from_str(contents)?)
}

fn demo_party(config: &Config, catalogs: &Catalogs) -> Result<Vec<Character>> {
    let stats = |might, intellect, personality, endurance| Stats {
        might,
        intellect,
        personality,
        endurance,
        accuracy: 12,
        speed: 11,
        luck: 8,
    };

    let mut knight = Character::new(
        "Aldric",
        CharacterClass::Knight,
        stats(18, 6, 6, 16),
        &config.character,
    );
    let _ = knight
        .equipment
        .insert(EquipSlot::MainHand, catalogs.items.weapon("longsword")?);
    let _ = knight
        .equipment
        .insert(EquipSlot::Body, catalogs.items.item("chain_mail")?);

    let mut sorcerer = Character::new(
        "Ilsa",
        CharacterClass::Sorcerer,
        stats(8, 20, 10, 10),
        &config.character,
    );
    sorcerer.equipped_spell = Some(SpellId::new("fire_bolt"));

    let mut cleric = Character::new(
        "Mira",
        CharacterClass::Cleric,
        stats(12, 8, 20, 12),
        &config.character,
    );
    let _ = cleric
        .equipment
        .insert(EquipSlot::MainHand, catalogs.items.weapon("holy_mace")?);

    let mut archer = Character::new(
        "Tamsin",
        CharacterClass::Archer,
        stats(12, 12, 8, 12),
        &config.character,
    );
    let _ = archer
        .equipment
        .insert(EquipSlot::MainHand, catalogs.items.weapon("short_bow")?);
    archer.equipped_spell = Some(SpellId::new("ice_bolt"));

    Ok(vec![knight, sorcerer, cleric, archer])
}

fn give_provisions(session: &mut Simulation) -> Result<()> {
    for key in ["healing_potion", "healing_potion", "mana_potion"] {
        let item = session.catalogs().items.item(key)?;
        session.party_mut().inventory.push(item);
    }
    Ok(())
}

/// Prints messages that were not on screen after the previous tick.
fn print_new_messages(session: &Simulation, previous: Vec<String>) -> Vec<String> {
    let current: Vec<String> = session
        .messages()
        .messages()
        .map(str::to_owned)
        .collect();
    let overlap = (0..=previous.len().min(current.len()))
        .rev()
        .find(|&len| previous[previous.len() - len..] == current[..len])
        .unwrap_or(0);
    for message in &current[overlap..] {
        println!("{message}");
    }
    current
}

fn report(session: &Simulation, ticks: u64) {
    let totals = session.totals();
    let party = session.party();
    let tps = session.config().simulation.ticks_per_second;
    let levels: Vec<u32> = party.members.iter().map(|member| member.level).collect();
    let breakdown = score_breakdown(
        totals.experience_awarded,
        party.gold,
        &levels,
        totals.play_seconds(tps),
    );

    println!();
    println!("ticks simulated:   {ticks}");
    println!("monsters slain:    {}", totals.monsters_slain);
    println!("gold:              {}", party.gold);
    println!("experience:        {}", totals.experience_awarded);
    for member in &party.members {
        println!(
            "  {:<8} level {:>2}  {:>3}/{:<3} HP  {:>3}/{:<3} SP",
            member.name, member.level, member.hp, member.max_hp, member.sp, member.max_sp
        );
    }
    println!(
        "score:             {} (base {}, time bonus {})",
        breakdown.total(),
        breakdown.base,
        breakdown.time_bonus
    );
    let counters = session.counters();
    log::info!(
        "mean tick {:?}, last tick {:?}, peak projectiles {}",
        counters.mean_tick(),
        counters.last_tick(),
        counters.peak_projectiles()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped =
            parse_config(include_str!("../../../data/config.toml")).expect("valid config");
        let defaults = Config::default();
        assert_eq!(shipped.world, defaults.world);
        assert_eq!(shipped.simulation, defaults.simulation);
        assert_eq!(shipped.monster_ai, defaults.monster_ai);
        assert_eq!(shipped.combat, defaults.combat);
        assert_eq!(shipped.maps, defaults.maps);
        assert_eq!(shipped.weapons.fallback, defaults.weapons.fallback);
    }

    #[test]
    fn partial_configs_keep_defaults() {
        let config = parse_config("[world]\ntile_size = 32.0\n").expect("valid config");
        assert_eq!(config.world.tile_size, 32.0);
        assert_eq!(config.world.player_radius, 8.0);
        assert_eq!(config.regen, Config::default().regen);
    }

    #[test]
    fn demo_party_is_fully_equipped() {
        let config = Config::default();
        let catalogs = Catalogs::builtin().expect("builtin catalogs");
        let party = demo_party(&config, &catalogs).expect("demo party");
        assert_eq!(party.len(), 4);
        assert!(party[0].main_hand().is_some());
        assert!(party[1].equipped_spell.is_some());
    }
}
