#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision index shared by the simulation driver and its worker pool.
//!
//! Entities are registered under caller-assigned string handles with an
//! axis-aligned bounding box centered on their position. The index never
//! interprets the handles; it only answers movement and overlap queries.
//! State sits behind an [`RwLock`]: predicates take the shared lock and may be
//! called from parallel workers, registration changes take the exclusive lock.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use glam::Vec2;
use gridcrawl_core::{EntityId, EntityKind};
use thiserror::Error;

/// Contract violations reported by the index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollisionError {
    /// An entity with the same handle is already registered.
    #[error("entity `{0}` is already registered")]
    DuplicateId(EntityId),
    /// No entity is registered under the handle.
    #[error("entity `{0}` is not registered")]
    UnknownId(EntityId),
}

/// Registration record of a single entity.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionEntity {
    /// Caller-assigned handle.
    pub id: EntityId,
    /// Entity category.
    pub kind: EntityKind,
    /// Center of the bounding box.
    pub position: Vec2,
    /// Width and height of the bounding box.
    pub size: Vec2,
    /// Reserved for immovable entities; not consulted by queries.
    pub is_static: bool,
}

impl CollisionEntity {
    /// Creates a dynamic entity record.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, position: Vec2, size: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            size,
            is_static: false,
        }
    }

    fn min(&self) -> Vec2 {
        self.position - self.size * 0.5
    }

    fn max(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    fn overlaps(&self, other: &Self) -> bool {
        overlap(self.position, self.size, other.position, other.size)
    }
}

/// Overlapping pair of entities reported by [`CollisionIndex::collisions`].
///
/// `first` has the first kind of the query filter and `second` the other.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Entity of the first requested kind.
    pub first: EntityId,
    /// Entity of the second requested kind.
    pub second: EntityId,
}

/// Tiles that block every entity kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WallMask {
    columns: u32,
    rows: u32,
    tile_size: f32,
    blocked: Vec<bool>,
}

impl WallMask {
    /// Builds a mask by sampling `is_wall` for every tile.
    #[must_use]
    pub fn from_fn<F>(columns: u32, rows: u32, tile_size: f32, mut is_wall: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut blocked = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                blocked.push(is_wall(column, row));
            }
        }
        Self {
            columns,
            rows,
            tile_size: tile_size.max(1.0),
            blocked,
        }
    }

    /// Reports whether the tile containing `position` blocks movement.
    ///
    /// Positions outside the grid count as walls.
    #[must_use]
    pub fn is_wall_at(&self, position: Vec2) -> bool {
        let column = (position.x / self.tile_size).floor();
        let row = (position.y / self.tile_size).floor();
        self.is_wall_tile(column, row)
    }

    /// Reports whether any tile touched by the box blocks movement.
    #[must_use]
    pub fn box_hits_wall(&self, center: Vec2, size: Vec2) -> bool {
        let half = size * 0.5;
        let min = ((center - half) / self.tile_size).floor();
        // Stay inside the box when its edge lies exactly on a tile boundary.
        let max = ((center + half - Vec2::splat(1e-3)) / self.tile_size)
            .floor()
            .max(min);
        let mut row = min.y;
        while row <= max.y {
            let mut column = min.x;
            while column <= max.x {
                if self.is_wall_tile(column, row) {
                    return true;
                }
                column += 1.0;
            }
            row += 1.0;
        }
        false
    }

    fn is_wall_tile(&self, column: f32, row: f32) -> bool {
        if !column.is_finite() || !row.is_finite() || column < 0.0 || row < 0.0 {
            return true;
        }
        let (column, row) = (column as u32, row as u32);
        if column >= self.columns || row >= self.rows {
            return true;
        }
        let index = row as usize * self.columns as usize + column as usize;
        self.blocked.get(index).copied().unwrap_or(true)
    }
}

#[derive(Debug, Default)]
struct IndexState {
    entities: BTreeMap<EntityId, CollisionEntity>,
    walls: WallMask,
}

/// Thread-safe registry of entity bounding boxes.
#[derive(Debug, Default)]
pub struct CollisionIndex {
    state: RwLock<IndexState>,
}

impl CollisionIndex {
    /// Creates an empty index over the provided walls.
    #[must_use]
    pub fn new(walls: WallMask) -> Self {
        Self {
            state: RwLock::new(IndexState {
                entities: BTreeMap::new(),
                walls,
            }),
        }
    }

    /// Replaces the wall mask, keeping every registration.
    pub fn set_walls(&self, walls: WallMask) {
        self.write().walls = walls;
    }

    /// Registers an entity; duplicate handles are rejected without side effects.
    pub fn register(&self, entity: CollisionEntity) -> Result<(), CollisionError> {
        let mut state = self.write();
        if state.entities.contains_key(&entity.id) {
            return Err(CollisionError::DuplicateId(entity.id));
        }
        let _ = state.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Removes an entity and returns its last registration.
    pub fn unregister(&self, id: &EntityId) -> Result<CollisionEntity, CollisionError> {
        self.write()
            .entities
            .remove(id)
            .ok_or_else(|| CollisionError::UnknownId(id.clone()))
    }

    /// Moves an entity's bounding box.
    pub fn update(&self, id: &EntityId, position: Vec2) -> Result<(), CollisionError> {
        let mut state = self.write();
        let entity = state
            .entities
            .get_mut(id)
            .ok_or_else(|| CollisionError::UnknownId(id.clone()))?;
        entity.position = position;
        Ok(())
    }

    /// Snapshot of an entity's registration.
    #[must_use]
    pub fn entity_by_id(&self, id: &EntityId) -> Option<CollisionEntity> {
        self.read().entities.get(id).cloned()
    }

    /// Reports whether a handle is registered.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.read().entities.contains_key(id)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entities.len()
    }

    /// Reports whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().entities.is_empty()
    }

    /// Number of registered entities of the kind.
    #[must_use]
    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.read()
            .entities
            .values()
            .filter(|entity| entity.kind == kind)
            .count()
    }

    /// Reports whether the tile containing `position` is a wall.
    #[must_use]
    pub fn is_wall_at(&self, position: Vec2) -> bool {
        self.read().walls.is_wall_at(position)
    }

    /// Reports whether the entity could occupy `position`.
    ///
    /// Players and monsters test their box at the new position against every
    /// wall tile and every other player or monster. Projectiles and
    /// unregistered handles are tested as a point against the walls, the
    /// same rule as [`CollisionIndex::is_wall_at`].
    #[must_use]
    pub fn can_move_to(&self, id: &EntityId, position: Vec2) -> bool {
        let state = self.read();
        let mover = match state.entities.get(id) {
            Some(mover) if mover.kind != EntityKind::Projectile => mover,
            _ => return !state.walls.is_wall_at(position),
        };
        if state.walls.box_hits_wall(position, mover.size) {
            return false;
        }
        !state.entities.values().any(|other| {
            other.id != mover.id
                && blocks(mover.kind, other.kind)
                && overlap(position, mover.size, other.position, other.size)
        })
    }

    /// Every currently overlapping pair between entities of the two kinds.
    ///
    /// Uses a spatial hash with tile-sized buckets as the broad phase and an
    /// exact box test as the narrow phase. Each unordered pair is reported at
    /// most once and the output order is deterministic for a given state.
    #[must_use]
    pub fn collisions(&self, first: EntityKind, second: EntityKind) -> Vec<CollisionPair> {
        let state = self.read();
        let cell = state.walls.tile_size.max(1.0);

        let mut buckets: HashMap<(i64, i64), Vec<&CollisionEntity>> = HashMap::new();
        for entity in state.entities.values().filter(|e| e.kind == second) {
            for key in covered_cells(entity, cell) {
                buckets.entry(key).or_default().push(entity);
            }
        }

        let mut pairs = BTreeSet::new();
        for entity in state.entities.values().filter(|e| e.kind == first) {
            for key in covered_cells(entity, cell) {
                let Some(candidates) = buckets.get(&key) else {
                    continue;
                };
                for candidate in candidates {
                    if candidate.id == entity.id || !entity.overlaps(candidate) {
                        continue;
                    }
                    if first == second && candidate.id < entity.id {
                        continue;
                    }
                    let _ = pairs.insert(CollisionPair {
                        first: entity.id.clone(),
                        second: candidate.id.clone(),
                    });
                }
            }
        }

        pairs.into_iter().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn blocks(mover: EntityKind, other: EntityKind) -> bool {
    matches!(
        (mover, other),
        (
            EntityKind::Player | EntityKind::Monster,
            EntityKind::Player | EntityKind::Monster
        )
    )
}

fn overlap(a_center: Vec2, a_size: Vec2, b_center: Vec2, b_size: Vec2) -> bool {
    let delta = (a_center - b_center).abs();
    let reach = (a_size + b_size) * 0.5;
    delta.x < reach.x && delta.y < reach.y
}

fn covered_cells(entity: &CollisionEntity, cell: f32) -> impl Iterator<Item = (i64, i64)> {
    let min = (entity.min() / cell).floor();
    let max = (entity.max() / cell).floor();
    let (min_x, min_y) = (min.x as i64, min.y as i64);
    let (max_x, max_y) = (max.x as i64, max.y as i64);
    (min_y..=max_y).flat_map(move |row| (min_x..=max_x).map(move |column| (column, row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f32 = 64.0;

    fn open_room() -> WallMask {
        // 6x6 room with a solid border.
        WallMask::from_fn(6, 6, TILE, |column, row| {
            column == 0 || row == 0 || column == 5 || row == 5
        })
    }

    fn body(id: &str, kind: EntityKind, x: f32, y: f32, size: f32) -> CollisionEntity {
        CollisionEntity::new(EntityId::new(id), kind, Vec2::new(x, y), Vec2::splat(size))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let index = CollisionIndex::new(open_room());
        index
            .register(body("m-1", EntityKind::Monster, 100.0, 100.0, 32.0))
            .expect("first registration");
        let result = index.register(body("m-1", EntityKind::Monster, 200.0, 200.0, 32.0));

        assert_eq!(result, Err(CollisionError::DuplicateId(EntityId::new("m-1"))));
        let stored = index.entity_by_id(&EntityId::new("m-1")).expect("still there");
        assert_eq!(stored.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn register_update_unregister_round_trips() {
        let index = CollisionIndex::new(open_room());
        let id = EntityId::new("p-1");
        index
            .register(body("p-1", EntityKind::Projectile, 100.0, 100.0, 16.0))
            .expect("register");
        index.update(&id, Vec2::new(150.0, 120.0)).expect("update");
        let removed = index.unregister(&id).expect("unregister");

        assert_eq!(removed.position, Vec2::new(150.0, 120.0));
        assert!(index.is_empty());
        assert_eq!(index.entity_by_id(&id), None);
    }

    #[test]
    fn double_unregister_reports_unknown_id() {
        let index = CollisionIndex::new(open_room());
        let id = EntityId::new("p-1");
        index
            .register(body("p-1", EntityKind::Projectile, 100.0, 100.0, 16.0))
            .expect("register");
        index
            .register(body("m-1", EntityKind::Monster, 200.0, 200.0, 32.0))
            .expect("register");
        let _ = index.unregister(&id).expect("first unregister");

        assert_eq!(index.unregister(&id), Err(CollisionError::UnknownId(id.clone())));
        assert_eq!(index.update(&id, Vec2::ZERO), Err(CollisionError::UnknownId(id)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn walls_and_bodies_block_movement() {
        let index = CollisionIndex::new(open_room());
        index
            .register(body("player", EntityKind::Player, 96.0, 96.0, 16.0))
            .expect("player");
        index
            .register(body("m-1", EntityKind::Monster, 224.0, 96.0, 32.0))
            .expect("monster");
        let player = EntityId::new("player");

        assert!(index.can_move_to(&player, Vec2::new(120.0, 96.0)));
        assert!(!index.can_move_to(&player, Vec2::new(70.0, 96.0)));
        assert!(!index.can_move_to(&player, Vec2::new(205.0, 96.0)));
        assert!(!index.can_move_to(&player, Vec2::new(-500.0, 96.0)));
    }

    #[test]
    fn projectiles_pass_through_bodies_but_not_walls() {
        let index = CollisionIndex::new(open_room());
        index
            .register(body("m-1", EntityKind::Monster, 224.0, 96.0, 32.0))
            .expect("monster");
        index
            .register(body("p-1", EntityKind::Projectile, 150.0, 96.0, 16.0))
            .expect("projectile");
        let projectile = EntityId::new("p-1");

        assert!(index.can_move_to(&projectile, Vec2::new(224.0, 96.0)));
        assert!(!index.can_move_to(&projectile, Vec2::new(32.0, 96.0)));
    }

    #[test]
    fn projectile_wall_checks_match_the_point_test() {
        let index = CollisionIndex::new(open_room());
        index
            .register(body("p-1", EntityKind::Projectile, 150.0, 96.0, 40.0))
            .expect("projectile");
        let projectile = EntityId::new("p-1");

        // The box would overlap the border tile while the center stays clear.
        let grazing = Vec2::new(70.0, 96.0);
        assert!(!index.is_wall_at(grazing));
        assert!(index.can_move_to(&projectile, grazing));

        let inside = Vec2::new(60.0, 96.0);
        assert!(index.is_wall_at(inside));
        assert!(!index.can_move_to(&projectile, inside));
    }

    #[test]
    fn collisions_report_each_overlap_once() {
        let index = CollisionIndex::new(open_room());
        // Large box spanning several hash buckets.
        index
            .register(body("m-1", EntityKind::Monster, 128.0, 128.0, 120.0))
            .expect("monster");
        index
            .register(body("m-2", EntityKind::Monster, 300.0, 300.0, 20.0))
            .expect("monster");
        index
            .register(body("p-1", EntityKind::Projectile, 128.0, 128.0, 100.0))
            .expect("projectile");
        index
            .register(body("p-2", EntityKind::Projectile, 310.0, 300.0, 8.0))
            .expect("projectile");
        index
            .register(body("p-3", EntityKind::Projectile, 250.0, 64.0, 8.0))
            .expect("projectile");

        let pairs = index.collisions(EntityKind::Projectile, EntityKind::Monster);
        assert_eq!(
            pairs,
            vec![
                CollisionPair {
                    first: EntityId::new("p-1"),
                    second: EntityId::new("m-1"),
                },
                CollisionPair {
                    first: EntityId::new("p-2"),
                    second: EntityId::new("m-2"),
                },
            ]
        );
    }

    #[test]
    fn same_kind_queries_report_unordered_pairs_once() {
        let index = CollisionIndex::new(open_room());
        index
            .register(body("m-1", EntityKind::Monster, 100.0, 100.0, 32.0))
            .expect("monster");
        index
            .register(body("m-2", EntityKind::Monster, 110.0, 100.0, 32.0))
            .expect("monster");

        let pairs = index.collisions(EntityKind::Monster, EntityKind::Monster);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn wall_mask_treats_outside_as_solid() {
        let walls = open_room();
        assert!(walls.is_wall_at(Vec2::new(10.0, 10.0)));
        assert!(!walls.is_wall_at(Vec2::new(100.0, 100.0)));
        assert!(walls.is_wall_at(Vec2::new(-1.0, 100.0)));
        assert!(walls.is_wall_at(Vec2::new(100.0, 6.0 * TILE)));
        assert!(!walls.box_hits_wall(Vec2::new(96.0, 96.0), Vec2::splat(64.0)));
        assert!(walls.box_hits_wall(Vec2::new(96.0, 96.0), Vec2::splat(66.0)));
    }
}
