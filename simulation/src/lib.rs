#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick driver owning every gameplay subsystem.
//!
//! [`Simulation`] is the composition root: it owns the world, the party,
//! the collision index and the projectile sequence, and hands subsystems a
//! [`GameContext`] scoped to a single call. Each [`Simulation::tick`] runs
//! the phases in a fixed order:
//!
//! 1. party regeneration (real-time only)
//! 2. damage blink and effect timers, including Water Breathing surfacing
//! 3. queued intents, unless the party is defeated
//! 4. monster movement, parallel in real time or the monster turn
//! 5. monster melee against the party (real-time only)
//! 6. projectile hits, parallel integration and cleanup under the
//!    projectile mutex
//! 7. removal of dead monsters and encounter payouts
//! 8. performance counters

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Instant,
};

use glam::Vec2;
use gridcrawl_catalog::{CatalogError, Catalogs};
use gridcrawl_core::{
    Character, CombatLog, Config, EffectKind, EncounterId, EntityId, EntityKind, GameRng,
    IdAllocator, Monster, Party, Projectile, SessionTotals,
};
use gridcrawl_system_collision::{CollisionEntity, CollisionError, CollisionIndex, WallMask};
use gridcrawl_system_combat::{CombatResolver, GameContext, HitKind, HitReport};
use gridcrawl_system_entity_update::{EntityUpdater, MonsterUpdateContext, UpdaterError};
use gridcrawl_system_hit_effects::HitEffects;
use gridcrawl_world::{
    query, EncounterReward, MapDefinition, TileCell, TileMap, World, WorldError,
};
use rand::SeedableRng;
use thiserror::Error;

mod counters;
mod intents;

pub use counters::PerformanceCounters;
pub use gridcrawl_system_turn_based::{MonsterTurnReport, Turn, TurnBased};
pub use intents::Intent;

/// Seed offset of the cosmetic random stream.
const EFFECTS_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Failures while building or reshaping a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A map or monster could not be installed.
    #[error(transparent)]
    World(#[from] WorldError),
    /// The collision index rejected a registration.
    #[error(transparent)]
    Collision(#[from] CollisionError),
    /// The worker pool could not be started.
    #[error(transparent)]
    Updater(#[from] UpdaterError),
}

/// Timing mode of the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Monsters act every tick.
    #[default]
    RealTime,
    /// Party and monsters alternate turns.
    TurnBased,
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Intents taken from the queue.
    pub intents: usize,
    /// Monsters that moved during real-time movement.
    pub monsters_moved: usize,
    /// Outcome of the monster turn, when one ran.
    pub monster_turn: Option<MonsterTurnReport>,
    /// Projectiles that struck a monster.
    pub hits: usize,
    /// Projectiles stopped by a wall.
    pub wall_impacts: usize,
    /// Dead monsters swept out of the world.
    pub monsters_removed: usize,
}

/// State shared with subsystems through [`GameContext`].
#[derive(Debug)]
struct GameState {
    config: Config,
    catalogs: Catalogs,
    world: World,
    party: Party,
    collisions: CollisionIndex,
    messages: CombatLog,
    ids: IdAllocator,
    rng: GameRng,
    totals: SessionTotals,
}

impl GameState {
    fn context<'a>(&'a mut self, projectiles: &'a mut Vec<Projectile>) -> GameContext<'a> {
        GameContext {
            config: &self.config,
            catalogs: &self.catalogs,
            world: &mut self.world,
            party: &mut self.party,
            collisions: &self.collisions,
            projectiles,
            messages: &mut self.messages,
            ids: &mut self.ids,
            rng: &mut self.rng,
            totals: &mut self.totals,
        }
    }
}

/// Gameplay session advanced one fixed tick at a time.
#[derive(Debug)]
pub struct Simulation {
    state: GameState,
    projectiles: Mutex<Vec<Projectile>>,
    resolver: CombatResolver,
    updater: EntityUpdater,
    turns: TurnBased,
    mode: Mode,
    intents: VecDeque<Intent>,
    hit_effects: HitEffects,
    effects_rng: GameRng,
    counters: PerformanceCounters,
}

impl Simulation {
    /// Starts a session on the catalog map `map_key`, spawning its monsters.
    pub fn new(
        config: Config,
        catalogs: Catalogs,
        members: Vec<Character>,
        map_key: &str,
    ) -> Result<Self, SimulationError> {
        let definition = catalogs.map(map_key)?.clone();
        let map = TileMap::from_definition(&definition, config.world.tile_size)?;
        let mut simulation = Self::from_map(config, catalogs, members, map)?;
        let state = &mut simulation.state;
        let staged = stage_monsters(
            &definition,
            query::map(&state.world),
            &state.catalogs,
            &mut state.ids,
        )?;
        let spawned = simulation.populate(&definition, staged)?;
        log::info!("session started on `{map_key}` with {spawned} monsters");
        Ok(simulation)
    }

    /// Starts a session on an already built map with no inhabitants.
    pub fn from_map(
        config: Config,
        catalogs: Catalogs,
        members: Vec<Character>,
        map: TileMap,
    ) -> Result<Self, SimulationError> {
        let collisions = CollisionIndex::new(wall_mask(&map));
        let start = map.starting_position();
        collisions.register(CollisionEntity::new(
            EntityId::player(),
            EntityKind::Player,
            start,
            Vec2::splat(config.world.player_radius * 2.0),
        ))?;
        let updater = EntityUpdater::new(config.simulation.worker_threads)?;
        let seed = config.simulation.rng_seed;

        Ok(Self {
            state: GameState {
                messages: CombatLog::new(config.messages.retained),
                catalogs,
                world: World::new(map),
                party: Party::new(members, start),
                collisions,
                ids: IdAllocator::new(),
                rng: GameRng::seed_from_u64(seed),
                totals: SessionTotals::default(),
                config,
            },
            projectiles: Mutex::new(Vec::new()),
            resolver: CombatResolver::new(),
            updater,
            turns: TurnBased::new(),
            mode: Mode::RealTime,
            intents: VecDeque::new(),
            hit_effects: HitEffects::new(),
            effects_rng: GameRng::seed_from_u64(seed ^ EFFECTS_SEED_SALT),
            counters: PerformanceCounters::default(),
        })
    }

    /// Queues an intent for the next tick's input phase.
    pub fn push_intent(&mut self, intent: Intent) {
        self.intents.push_back(intent);
    }

    /// Advances the session by one tick.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        if self.mode == Mode::RealTime {
            self.regenerate();
        }
        self.advance_timers();

        if self.state.party.is_defeated() {
            if !self.intents.is_empty() {
                log::debug!("party defeated; dropping {} intents", self.intents.len());
                self.intents.clear();
            }
        } else {
            while let Some(intent) = self.intents.pop_front() {
                report.intents += 1;
                let _ = self.apply_intent(intent);
            }
        }

        match self.mode {
            Mode::TurnBased => {
                if self.turns.current_turn() == Turn::Monsters {
                    let projectiles = lock_free(&mut self.projectiles);
                    let outcome = self
                        .turns
                        .run_monster_turn(&mut self.state.context(projectiles));
                    report.monster_turn = Some(outcome);
                }
            }
            Mode::RealTime => {
                let state = &mut self.state;
                let player = state.party.position;
                let (map, monsters) = state.world.map_and_monsters_mut();
                let ctx = MonsterUpdateContext::new(
                    map,
                    &state.collisions,
                    player,
                    &state.config.monster_ai,
                );
                report.monsters_moved = self.updater.update_monsters_parallel(monsters, &ctx);

                let projectiles = lock_free(&mut self.projectiles);
                self.resolver
                    .handle_monster_interactions(&mut self.state.context(projectiles));
            }
        }

        self.projectile_phase(&mut report);
        report.monsters_removed = self.sweep_dead_monsters();
        self.hit_effects.update();

        let live = self.projectile_count();
        self.counters.record(started.elapsed(), live);
        self.state.totals.ticks += 1;
        report
    }

    /// Switches the world to the catalog map `key`.
    ///
    /// Monsters of the old map and every projectile in flight are dropped,
    /// the wall mask is rebuilt and the party lands on the walkable tile
    /// nearest to where it stood. The new map's monsters are built before
    /// anything is torn down, so a failure leaves the current map in place.
    pub fn change_map(&mut self, key: &str) -> Result<(), SimulationError> {
        let definition = self.state.catalogs.map(key)?.clone();
        let map = TileMap::from_definition(&definition, self.state.config.world.tile_size)?;
        let staged = stage_monsters(
            &definition,
            &map,
            &self.state.catalogs,
            &mut self.state.ids,
        )?;
        let walls = wall_mask(&map);
        let party = &self.state.party;
        let landing = map.must_find_walkable(party.position, party.movement_modes());

        let state = &mut self.state;
        for monster in state.world.replace_map(map) {
            release(&state.collisions, &monster.id);
        }
        for projectile in lock_free(&mut self.projectiles).drain(..) {
            release(&state.collisions, &projectile.id);
        }
        state.collisions.set_walls(walls);
        self.place_party(landing);
        let _ = self.populate(&definition, staged)?;
        Ok(())
    }

    /// Adds a catalog monster at `position` and registers its body.
    pub fn spawn_monster(
        &mut self,
        key: &str,
        position: Vec2,
        encounter: Option<EncounterId>,
    ) -> Result<EntityId, SimulationError> {
        let state = &mut self.state;
        let id = state.ids.next_id("monster");
        let monster = state.catalogs.monsters.spawn(key, id, position, encounter)?;
        self.install_monster(monster)
    }

    /// Declares the reward paid once every monster of `encounter` is slain.
    pub fn register_encounter(&mut self, encounter: EncounterId, reward: EncounterReward) {
        self.state.world.register_encounter(encounter, reward);
    }

    /// Registers and launches an externally created projectile.
    ///
    /// Projectiles that are already spent are ignored.
    pub fn launch_projectile(&mut self, projectile: Projectile) -> Result<bool, SimulationError> {
        if !projectile.is_live() {
            return Ok(false);
        }
        self.state.collisions.register(CollisionEntity::new(
            projectile.id.clone(),
            EntityKind::Projectile,
            projectile.position,
            Vec2::splat(projectile.bounding_size()),
        ))?;
        lock_free(&mut self.projectiles).push(projectile);
        Ok(true)
    }

    /// Snapshot of the projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> Vec<Projectile> {
        self.projectiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(&self) -> usize {
        self.projectiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Reports whether no party member can act.
    #[must_use]
    pub fn is_party_defeated(&self) -> bool {
        self.state.party.is_defeated()
    }

    /// Score of the session so far.
    #[must_use]
    pub fn score(&self) -> u64 {
        gridcrawl_system_scoring::score_session(
            &self.state.totals,
            &self.state.party,
            self.state.config.simulation.ticks_per_second,
        )
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Loaded catalogs.
    #[must_use]
    pub fn catalogs(&self) -> &Catalogs {
        &self.state.catalogs
    }

    /// Current world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.state.world
    }

    /// Mutable access to a monster by handle.
    pub fn monster_mut(&mut self, id: &EntityId) -> Option<&mut Monster> {
        self.state.world.monster_mut(id)
    }

    /// The party.
    #[must_use]
    pub fn party(&self) -> &Party {
        &self.state.party
    }

    /// Mutable access to the party.
    pub fn party_mut(&mut self) -> &mut Party {
        &mut self.state.party
    }

    /// Collision index shared with the workers.
    #[must_use]
    pub fn collisions(&self) -> &CollisionIndex {
        &self.state.collisions
    }

    /// Recent combat messages.
    #[must_use]
    pub fn messages(&self) -> &CombatLog {
        &self.state.messages
    }

    /// Cumulative session figures.
    #[must_use]
    pub fn totals(&self) -> &SessionTotals {
        &self.state.totals
    }

    /// Current timing mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Turn bookkeeping of turn-based mode.
    #[must_use]
    pub fn turns(&self) -> &TurnBased {
        &self.turns
    }

    /// Live hit effects.
    #[must_use]
    pub fn hit_effects(&self) -> &HitEffects {
        &self.hit_effects
    }

    /// Tick timing figures.
    #[must_use]
    pub const fn counters(&self) -> &PerformanceCounters {
        &self.counters
    }

    fn install_monster(&mut self, monster: Monster) -> Result<EntityId, SimulationError> {
        let state = &mut self.state;
        let id = monster.id.clone();
        state.collisions.register(CollisionEntity::new(
            id.clone(),
            EntityKind::Monster,
            monster.position,
            Vec2::splat(monster.radius * 2.0),
        ))?;
        if let Err(error) = state.world.spawn_monster(monster) {
            release(&state.collisions, &id);
            return Err(error.into());
        }
        Ok(id)
    }

    fn populate(
        &mut self,
        definition: &MapDefinition,
        staged: Vec<Monster>,
    ) -> Result<usize, SimulationError> {
        for encounter in &definition.encounters {
            self.register_encounter(
                EncounterId::new(encounter.id),
                EncounterReward {
                    gold: encounter.gold,
                    experience: encounter.experience,
                },
            );
        }
        let count = staged.len();
        for monster in staged {
            let _ = self.install_monster(monster)?;
        }
        Ok(count)
    }

    fn regenerate(&mut self) {
        let regen = &self.state.config.regen;
        if regen.interval_frames == 0
            || (self.state.totals.ticks + 1) % u64::from(regen.interval_frames) != 0
        {
            return;
        }
        for member in &mut self.state.party.members {
            if member.is_conscious() {
                let _ = member.heal(regen.hp_per_interval);
                let _ = member.restore_sp(regen.sp_per_interval);
            }
        }
    }

    fn advance_timers(&mut self) {
        self.state.party.tick_blinks();
        for kind in self.state.party.effects.tick() {
            log::info!("{kind:?} expired");
            self.state
                .messages
                .add_combat_message(format!("{} wears off", effect_label(kind)));
            if kind == EffectKind::WaterBreathing {
                self.surface();
            }
        }
    }

    fn surface(&mut self) {
        let maps = &self.state.config.maps;
        if query::map(&self.state.world).key() != maps.underwater_key {
            return;
        }
        let return_key = maps.return_map_key.clone();
        match self.change_map(&return_key) {
            Ok(()) => log::info!("party surfaced on `{return_key}`"),
            Err(error) => {
                log::warn!("cannot return to `{return_key}`: {error}");
                let party = &self.state.party;
                let landing = query::map(&self.state.world)
                    .must_find_walkable(party.position, party.movement_modes());
                self.place_party(landing);
            }
        }
    }

    fn place_party(&mut self, position: Vec2) {
        self.state.party.position = position;
        if let Err(error) = self.state.collisions.update(&EntityId::player(), position) {
            log::error!("party body is missing from the index: {error}");
        }
    }

    fn projectile_phase(&mut self, report: &mut TickReport) {
        let mut projectiles = self
            .projectiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let hits = self
            .resolver
            .check_projectile_monster_collisions(&mut self.state.context(&mut projectiles));
        report.hits = hits.len();
        for hit in &hits {
            spawn_hit_effect(&mut self.hit_effects, hit, &mut self.effects_rng);
        }

        let collisions = &self.state.collisions;
        let impacts = self
            .updater
            .update_projectiles_parallel(&mut projectiles, |position| {
                !collisions.is_wall_at(position)
            });
        report.wall_impacts = impacts.len();
        for impact in &impacts {
            if let Some(projectile) = projectiles.get(impact.index) {
                let hit = HitReport::new(projectile, impact.position, &self.state.catalogs);
                spawn_hit_effect(&mut self.hit_effects, &hit, &mut self.effects_rng);
            }
        }

        projectiles.retain(|projectile| {
            if projectile.is_live() {
                if let Err(error) = collisions.update(&projectile.id, projectile.position) {
                    log::error!("projectile {} is missing from the index: {error}", projectile.id);
                }
                return true;
            }
            release(collisions, &projectile.id);
            false
        });
    }

    fn sweep_dead_monsters(&mut self) -> usize {
        let sweep = self.state.world.remove_dead_monsters();
        for monster in &sweep.removed {
            release(&self.state.collisions, &monster.id);
        }
        for (encounter, reward) in sweep.rewards {
            log::debug!("paying encounter {}", encounter.get());
            let projectiles = lock_free(&mut self.projectiles);
            self.resolver
                .award_encounter_reward(&mut self.state.context(projectiles), reward);
        }
        sweep.removed.len()
    }
}

/// Builds every monster placed on `map` without touching the world.
fn stage_monsters(
    definition: &MapDefinition,
    map: &TileMap,
    catalogs: &Catalogs,
    ids: &mut IdAllocator,
) -> Result<Vec<Monster>, SimulationError> {
    definition
        .monsters
        .iter()
        .map(|placement| {
            let position = map.tile_center(TileCell::new(placement.column, placement.row));
            let encounter = placement.encounter.map(EncounterId::new);
            let id = ids.next_id("monster");
            Ok(catalogs.monsters.spawn(&placement.key, id, position, encounter)?)
        })
        .collect()
}

/// Exclusive access to a mutex-guarded value without locking.
fn lock_free<T>(mutex: &mut Mutex<T>) -> &mut T {
    mutex.get_mut().unwrap_or_else(PoisonError::into_inner)
}

/// Unregisters a body that may already be gone.
fn release(collisions: &CollisionIndex, id: &EntityId) {
    if !collisions.contains(id) {
        return;
    }
    if let Err(error) = collisions.unregister(id) {
        log::error!("failed to unregister {id}: {error}");
    }
}

fn wall_mask(map: &TileMap) -> WallMask {
    WallMask::from_fn(map.columns(), map.rows(), map.tile_size(), |column, row| {
        map.is_wall(TileCell::new(column, row))
    })
}

fn spawn_hit_effect(effects: &mut HitEffects, hit: &HitReport, rng: &mut GameRng) {
    match hit.kind {
        HitKind::Arrow | HitKind::Melee => effects.spawn_arrow_hit(hit.position, rng),
        HitKind::Spell {
            damage_base,
            radius,
        } => effects.spawn_spell_hit(hit.position, damage_base, radius, rng),
    }
}

fn effect_label(kind: EffectKind) -> &'static str {
    match kind {
        EffectKind::TorchLight => "Torch Light",
        EffectKind::WizardEye => "Wizard Eye",
        EffectKind::WalkOnWater => "Walk on Water",
        EffectKind::WaterBreathing => "Water Breathing",
        EffectKind::Bless => "Bless",
    }
}
