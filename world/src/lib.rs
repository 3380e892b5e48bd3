#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for gridcrawl.
//!
//! The world owns the active tile map, the monsters that inhabit it and the
//! encounter reward records. Systems read it through [`query`] and mutate it
//! only through the narrow methods exposed on [`World`].

use std::collections::BTreeMap;

use glam::Vec2;
use gridcrawl_core::{Color, EncounterId, EntityId, Monster, MovementModes, TileKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod encounters;
mod navigation;

pub use encounters::EncounterReward;

use encounters::EncounterRegistry;

/// Errors raised while constructing or populating a world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The map contains no tiles.
    #[error("map `{key}` has no tiles")]
    EmptyGrid {
        /// Key of the offending map.
        key: String,
    },
    /// A row differs in width from the first row.
    #[error("map `{key}` row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Key of the offending map.
        key: String,
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A glyph does not name a tile kind.
    #[error("map `{key}` has unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Key of the offending map.
        key: String,
        /// Glyph that failed to parse.
        glyph: char,
        /// Zero-based column index.
        column: usize,
        /// Zero-based row index.
        row: usize,
    },
    /// The starting tile lies outside the grid or cannot be walked on.
    #[error("map `{key}` starts on a tile that is not walkable: ({column}, {row})")]
    InvalidStart {
        /// Key of the offending map.
        key: String,
        /// Column of the starting tile.
        column: u32,
        /// Row of the starting tile.
        row: u32,
    },
    /// A monster with the same identifier already lives in the world.
    #[error("monster `{0}` is already present")]
    DuplicateMonster(EntityId),
}

/// Location of a single tile expressed in grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCell {
    column: u32,
    row: u32,
}

impl TileCell {
    /// Creates a new tile location.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Map file contents before validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDefinition {
    /// Key identifying the map.
    pub key: String,
    /// Glyph rows from north to south.
    pub rows: Vec<String>,
    /// Starting tile as `[column, row]`.
    pub start: [u32; 2],
    /// Sky color override.
    pub sky_color: Option<Color>,
    /// Ground color override.
    pub ground_color: Option<Color>,
    /// Monsters placed when the map is installed.
    pub monsters: Vec<MonsterPlacement>,
    /// Encounter reward records referenced by placements.
    pub encounters: Vec<EncounterDefinition>,
}

/// Placement of a catalog monster on a map tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterPlacement {
    /// Monster catalog key.
    pub key: String,
    /// Column of the tile the monster is centered on.
    pub column: u32,
    /// Row of the tile the monster is centered on.
    pub row: u32,
    /// Encounter the monster belongs to.
    #[serde(default)]
    pub encounter: Option<u32>,
}

/// Encounter reward record declared by a map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDefinition {
    /// Numeric encounter identifier.
    pub id: u32,
    /// Gold paid when the group is emptied.
    pub gold: u64,
    /// Experience paid when the group is emptied.
    pub experience: u64,
}

/// Immutable grid of tile kinds for a single map.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    key: String,
    columns: u32,
    rows: u32,
    tile_size: f32,
    tiles: Vec<TileKind>,
    start: TileCell,
    sky_color: Option<Color>,
    ground_color: Option<Color>,
}

impl TileMap {
    /// Parses glyph rows into a validated tile map.
    pub fn from_rows<I, S>(
        key: impl Into<String>,
        rows: I,
        start: TileCell,
        tile_size: f32,
    ) -> Result<Self, WorldError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = key.into();
        let mut tiles = Vec::new();
        let mut width = None;
        let mut height = 0usize;

        for (row_index, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            let mut found = 0usize;
            for (column, glyph) in row.chars().enumerate() {
                let Some(kind) = TileKind::from_glyph(glyph) else {
                    return Err(WorldError::UnknownGlyph {
                        key,
                        glyph,
                        column,
                        row: row_index,
                    });
                };
                tiles.push(kind);
                found += 1;
            }
            let expected = *width.get_or_insert(found);
            if found != expected {
                return Err(WorldError::RaggedRow {
                    key,
                    row: row_index,
                    expected,
                    found,
                });
            }
            height += 1;
        }

        let width = width.unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyGrid { key });
        }

        let map = Self {
            columns: u32::try_from(width).unwrap_or(u32::MAX),
            rows: u32::try_from(height).unwrap_or(u32::MAX),
            tile_size: tile_size.max(1.0),
            tiles,
            start,
            sky_color: None,
            ground_color: None,
            key,
        };

        if !map
            .tile_at(start)
            .is_some_and(|kind| kind.is_walkable(MovementModes::NONE))
        {
            return Err(WorldError::InvalidStart {
                key: map.key,
                column: start.column(),
                row: start.row(),
            });
        }

        Ok(map)
    }

    /// Builds a tile map from parsed map file contents.
    pub fn from_definition(definition: &MapDefinition, tile_size: f32) -> Result<Self, WorldError> {
        let start = TileCell::new(definition.start[0], definition.start[1]);
        let mut map = Self::from_rows(definition.key.clone(), &definition.rows, start, tile_size)?;
        map.sky_color = definition.sky_color;
        map.ground_color = definition.ground_color;
        Ok(map)
    }

    /// Key identifying the map.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// World pixels per tile.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Sky color declared by the map.
    #[must_use]
    pub const fn sky_color(&self) -> Option<Color> {
        self.sky_color
    }

    /// Ground color declared by the map.
    #[must_use]
    pub const fn ground_color(&self) -> Option<Color> {
        self.ground_color
    }

    /// Tile kind stored at the provided location, `None` outside the grid.
    #[must_use]
    pub fn tile_at(&self, cell: TileCell) -> Option<TileKind> {
        if cell.column >= self.columns || cell.row >= self.rows {
            return None;
        }
        let index = usize::try_from(cell.row)
            .ok()?
            .checked_mul(usize::try_from(self.columns).ok()?)?
            .checked_add(usize::try_from(cell.column).ok()?)?;
        self.tiles.get(index).copied()
    }

    /// Tile containing the world position, `None` outside the grid.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<TileCell> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return None;
        }
        let column = (position.x / self.tile_size).floor();
        let row = (position.y / self.tile_size).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let (column, row) = (column as u32, row as u32);
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(TileCell::new(column, row))
    }

    /// World position of the center of a tile.
    #[must_use]
    pub fn tile_center(&self, cell: TileCell) -> Vec2 {
        Vec2::new(
            (cell.column as f32 + 0.5) * self.tile_size,
            (cell.row as f32 + 0.5) * self.tile_size,
        )
    }

    /// Reports whether the position may be entered under the movement modes.
    ///
    /// Positions outside the grid are never walkable.
    #[must_use]
    pub fn can_move_to(&self, position: Vec2, modes: MovementModes) -> bool {
        self.cell_at(position)
            .and_then(|cell| self.tile_at(cell))
            .is_some_and(|kind| kind.is_walkable(modes))
    }

    /// Reports whether the tile blocks projectiles and bodies alike.
    #[must_use]
    pub fn is_wall(&self, cell: TileCell) -> bool {
        self.tile_at(cell).map_or(true, TileKind::is_wall_kind)
    }

    /// Starting tile of the map.
    #[must_use]
    pub const fn starting_cell(&self) -> TileCell {
        self.start
    }

    /// Center of the starting tile in world pixels.
    #[must_use]
    pub fn starting_position(&self) -> Vec2 {
        self.tile_center(self.start)
    }

    /// Center of the walkable tile closest to `position`, if one exists.
    #[must_use]
    pub fn nearest_walkable(&self, position: Vec2, modes: MovementModes) -> Option<Vec2> {
        let origin = self.clamped_cell(position);
        navigation::nearest_matching(self.columns, self.rows, origin, |cell| {
            self.tile_at(cell)
                .is_some_and(|kind| kind.is_walkable(modes))
        })
        .map(|cell| self.tile_center(cell))
    }

    /// Walkable position closest to `position`; never fails.
    ///
    /// Falls back to plain walking when the requested modes leave nothing
    /// reachable, and to the starting tile after that, which construction
    /// guarantees is walkable.
    #[must_use]
    pub fn must_find_walkable(&self, position: Vec2, modes: MovementModes) -> Vec2 {
        if self.can_move_to(position, modes) {
            return position;
        }
        self.nearest_walkable(position, modes)
            .or_else(|| self.nearest_walkable(position, MovementModes::NONE))
            .unwrap_or_else(|| self.starting_position())
    }

    fn clamped_cell(&self, position: Vec2) -> TileCell {
        let clamp = |value: f32, limit: u32| -> u32 {
            if !value.is_finite() || value <= 0.0 {
                return 0;
            }
            ((value / self.tile_size) as u32).min(limit.saturating_sub(1))
        };
        TileCell::new(clamp(position.x, self.columns), clamp(position.y, self.rows))
    }
}

/// Outcome of sweeping dead monsters out of the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonsterSweep {
    /// Monsters removed this sweep.
    pub removed: Vec<Monster>,
    /// Encounter rewards that became payable this sweep.
    pub rewards: Vec<(EncounterId, EncounterReward)>,
}

/// Represents the authoritative gridcrawl world state.
#[derive(Clone, Debug)]
pub struct World {
    map: TileMap,
    monsters: Vec<Monster>,
    monster_index: BTreeMap<EntityId, usize>,
    encounters: EncounterRegistry,
}

impl World {
    /// Creates a world around the provided map with no inhabitants.
    #[must_use]
    pub fn new(map: TileMap) -> Self {
        Self {
            map,
            monsters: Vec::new(),
            monster_index: BTreeMap::new(),
            encounters: EncounterRegistry::new(),
        }
    }

    /// Adds a monster to the world.
    pub fn spawn_monster(&mut self, monster: Monster) -> Result<(), WorldError> {
        if self.monster_index.contains_key(&monster.id) {
            return Err(WorldError::DuplicateMonster(monster.id));
        }
        let _ = self
            .monster_index
            .insert(monster.id.clone(), self.monsters.len());
        self.monsters.push(monster);
        Ok(())
    }

    /// Declares the reward paid when an encounter group is emptied.
    pub fn register_encounter(&mut self, id: EncounterId, reward: EncounterReward) {
        self.encounters.register(id, reward);
    }

    /// Mutable access to every monster; the slice length is fixed.
    pub fn monsters_mut(&mut self) -> &mut [Monster] {
        &mut self.monsters
    }

    /// Read access to the map alongside mutable access to every monster.
    pub fn map_and_monsters_mut(&mut self) -> (&TileMap, &mut [Monster]) {
        (&self.map, &mut self.monsters)
    }

    /// Mutable access to a monster by collision handle.
    pub fn monster_mut(&mut self, id: &EntityId) -> Option<&mut Monster> {
        let index = *self.monster_index.get(id)?;
        self.monsters.get_mut(index)
    }

    /// Removes monsters that died and pays out emptied encounter groups once.
    pub fn remove_dead_monsters(&mut self) -> MonsterSweep {
        if self.monsters.iter().all(Monster::is_alive) {
            return MonsterSweep::default();
        }

        let (alive, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.monsters)
            .into_iter()
            .partition(Monster::is_alive);
        self.monsters = alive;
        self.rebuild_index();

        let mut rewards = Vec::new();
        for monster in &removed {
            let Some(encounter) = monster.encounter else {
                continue;
            };
            let remaining = self
                .monsters
                .iter()
                .filter(|other| other.encounter == Some(encounter))
                .count();
            if remaining > 0 {
                continue;
            }
            if let Some(reward) = self.encounters.claim(encounter) {
                log::info!("encounter {} cleared", encounter.get());
                rewards.push((encounter, reward));
            }
        }

        MonsterSweep { removed, rewards }
    }

    /// Installs a different map, evicting every monster and encounter record.
    ///
    /// The evicted monsters are returned so callers can release their
    /// collision registrations.
    pub fn replace_map(&mut self, map: TileMap) -> Vec<Monster> {
        log::info!("switching map `{}` -> `{}`", self.map.key(), map.key());
        self.map = map;
        self.monster_index.clear();
        self.encounters.clear();
        std::mem::take(&mut self.monsters)
    }

    fn rebuild_index(&mut self) {
        self.monster_index = self
            .monsters
            .iter()
            .enumerate()
            .map(|(index, monster)| (monster.id.clone(), index))
            .collect();
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridcrawl_core::{EncounterId, EntityId, Monster};

    use super::{EncounterReward, TileMap, World};

    /// Provides read-only access to the active tile map.
    #[must_use]
    pub fn map(world: &World) -> &TileMap {
        &world.map
    }

    /// Every monster currently in the world, in spawn order.
    #[must_use]
    pub fn monsters(world: &World) -> &[Monster] {
        &world.monsters
    }

    /// Looks a monster up by its collision handle.
    #[must_use]
    pub fn monster<'a>(world: &'a World, id: &EntityId) -> Option<&'a Monster> {
        let index = *world.monster_index.get(id)?;
        world.monsters.get(index)
    }

    /// Number of monsters with hit points left.
    #[must_use]
    pub fn alive_monster_count(world: &World) -> usize {
        world.monsters.iter().filter(|monster| monster.is_alive()).count()
    }

    /// Number of living monsters still belonging to the encounter.
    #[must_use]
    pub fn remaining_in_encounter(world: &World, encounter: EncounterId) -> usize {
        world
            .monsters
            .iter()
            .filter(|monster| monster.encounter == Some(encounter) && monster.is_alive())
            .count()
    }

    /// Reward record declared for the encounter.
    #[must_use]
    pub fn encounter_reward(world: &World, encounter: EncounterId) -> Option<EncounterReward> {
        world.encounters.reward(encounter)
    }

    /// Reports whether the encounter reward has already been paid.
    #[must_use]
    pub fn encounter_paid(world: &World, encounter: EncounterId) -> bool {
        world.encounters.is_paid(encounter)
    }
}
