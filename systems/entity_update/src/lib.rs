#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fork-join updates of monsters and projectiles on a persistent worker pool.
//!
//! Each phase splits its slice into one chunk per worker and blocks until
//! every chunk is done. Workers only write to the entities of their own
//! chunk and only read shared state, so results do not depend on the number
//! of workers or on scheduling.

use std::{num::NonZeroUsize, thread};

use glam::Vec2;
use gridcrawl_core::{config::MonsterAiConfig, Monster, MovementModes, Projectile, ProjectileStep};
use gridcrawl_system_collision::CollisionIndex;
use gridcrawl_world::TileMap;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

/// Failures raised while preparing the worker pool.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// The operating system refused to start the workers.
    #[error("failed to build the worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

/// Shared, read-only inputs of the monster phase.
#[derive(Clone, Copy, Debug)]
pub struct MonsterUpdateContext<'a> {
    /// Terrain the monsters walk on.
    pub map: &'a TileMap,
    /// Spatial index consulted for walls and bodies.
    pub collisions: &'a CollisionIndex,
    /// Position of the party.
    pub player: Vec2,
    /// Distance at which monsters stop closing in.
    pub attack_distance: f32,
    /// Distance within which monsters notice the party.
    pub aggro_range: f32,
}

impl<'a> MonsterUpdateContext<'a> {
    /// Builds the context from the monster tuning section.
    #[must_use]
    pub fn new(
        map: &'a TileMap,
        collisions: &'a CollisionIndex,
        player: Vec2,
        ai: &MonsterAiConfig,
    ) -> Self {
        Self {
            map,
            collisions,
            player,
            attack_distance: ai.attack_distance,
            aggro_range: ai.aggro_range_tiles * map.tile_size(),
        }
    }
}

/// Projectile that struck terrain during an update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileImpact {
    /// Index of the projectile in the updated slice.
    pub index: usize,
    /// Where the projectile stopped.
    pub position: Vec2,
}

/// Parallel updater backed by a persistent worker pool.
#[derive(Debug)]
pub struct EntityUpdater {
    pool: ThreadPool,
    workers: usize,
}

impl EntityUpdater {
    /// Starts a pool of `worker_threads` workers, or one per available core
    /// when zero.
    pub fn new(worker_threads: usize) -> Result<Self, UpdaterError> {
        let workers = if worker_threads == 0 {
            thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            worker_threads
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("gridcrawl-worker-{index}"))
            .build()?;
        log::debug!("entity updater started with {workers} workers");
        Ok(Self { pool, workers })
    }

    /// Number of workers in the pool.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Advances real-time monster behavior by one frame.
    ///
    /// Workers tick attack cooldowns and plan a step toward the party for
    /// every monster within aggro range that is not yet within attack
    /// distance, sliding along blocked axes. Planned steps are then
    /// committed in slice order, each re-checked against bodies that already
    /// moved. Returns the number of monsters that moved.
    pub fn update_monsters_parallel(
        &self,
        monsters: &mut [Monster],
        ctx: &MonsterUpdateContext<'_>,
    ) -> usize {
        if monsters.is_empty() {
            return 0;
        }
        let chunk = self.chunk_len(monsters.len());
        let plans: Vec<Option<Vec2>> = self.pool.install(|| {
            monsters
                .par_chunks_mut(chunk)
                .flat_map_iter(|slice| {
                    slice
                        .iter_mut()
                        .map(|monster| plan_step(monster, ctx))
                        .collect::<Vec<_>>()
                })
                .collect()
        });

        let mut moved = 0;
        for (monster, plan) in monsters.iter_mut().zip(plans) {
            let Some(target) = plan else {
                continue;
            };
            if !ctx.collisions.can_move_to(&monster.id, target) {
                continue;
            }
            monster.position = target;
            if let Err(error) = ctx.collisions.update(&monster.id, target) {
                log::error!("monster {} is missing from the index: {error}", monster.id);
            }
            moved += 1;
        }
        moved
    }

    /// Integrates every projectile by one frame.
    ///
    /// `can_move_to` must be safe to call from several workers at once. A
    /// projectile whose next position is rejected deactivates in place and
    /// is reported as an impact, in slice order.
    pub fn update_projectiles_parallel<F>(
        &self,
        projectiles: &mut [Projectile],
        can_move_to: F,
    ) -> Vec<ProjectileImpact>
    where
        F: Fn(Vec2) -> bool + Sync,
    {
        if projectiles.is_empty() {
            return Vec::new();
        }
        let chunk = self.chunk_len(projectiles.len());
        let can_move_to = &can_move_to;
        self.pool.install(|| {
            projectiles
                .par_chunks_mut(chunk)
                .enumerate()
                .flat_map_iter(|(chunk_index, chunk_slice)| {
                    let offset = chunk_index * chunk;
                    chunk_slice
                        .iter_mut()
                        .enumerate()
                        .filter_map(move |(index, projectile)| {
                            match projectile.integrate(can_move_to) {
                                ProjectileStep::Blocked { at } => Some(ProjectileImpact {
                                    index: offset + index,
                                    position: at,
                                }),
                                _ => None,
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        })
    }

    fn chunk_len(&self, len: usize) -> usize {
        len.div_ceil(self.workers.max(1)).max(1)
    }
}

fn plan_step(monster: &mut Monster, ctx: &MonsterUpdateContext<'_>) -> Option<Vec2> {
    monster.attack_cooldown = monster.attack_cooldown.saturating_sub(1);
    if !monster.is_alive() || monster.speed <= 0.0 {
        return None;
    }

    let offset = ctx.player - monster.position;
    let distance = offset.length();
    if distance > ctx.aggro_range || distance <= ctx.attack_distance {
        return None;
    }

    let step = offset / distance * monster.speed.min(distance - ctx.attack_distance);
    let origin = monster.position;
    [
        origin + step,
        origin + Vec2::new(step.x, 0.0),
        origin + Vec2::new(0.0, step.y),
    ]
    .into_iter()
    .filter(|candidate| *candidate != origin)
    .find(|candidate| {
        ctx.map.can_move_to(*candidate, MovementModes::NONE)
            && ctx.collisions.can_move_to(&monster.id, *candidate)
    })
}

#[cfg(test)]
mod tests {
    use gridcrawl_core::{DamageKind, EntityId, EntityKind, ProjectileKind, SpellId};
    use gridcrawl_system_collision::{CollisionEntity, WallMask};
    use gridcrawl_world::TileCell;

    use super::*;

    const TILE: f32 = 64.0;

    fn arena() -> (TileMap, CollisionIndex) {
        let map = TileMap::from_rows(
            "arena",
            [
                "##########",
                "#........#",
                "#........#",
                "#...#....#",
                "#........#",
                "##########",
            ],
            TileCell::new(1, 1),
            TILE,
        )
        .expect("valid arena");
        let walls = WallMask::from_fn(map.columns(), map.rows(), TILE, |c, r| {
            map.is_wall(TileCell::new(c, r))
        });
        (map, CollisionIndex::new(walls))
    }

    fn rat(id: &str, position: Vec2, index: &CollisionIndex) -> Monster {
        index
            .register(CollisionEntity::new(
                EntityId::new(id),
                EntityKind::Monster,
                position,
                Vec2::splat(24.0),
            ))
            .expect("registers");
        Monster {
            id: EntityId::new(id),
            key: "rat".to_owned(),
            name: "Giant Rat".to_owned(),
            kind: "beast".to_owned(),
            position,
            hp: 8,
            max_hp: 8,
            radius: 12.0,
            attack_radius: 12.0,
            damage_min: 1,
            damage_max: 3,
            experience: 15,
            gold: 2,
            speed: 2.0,
            resistances: Default::default(),
            encounter: None,
            attack_cooldown: 3,
            dead: false,
        }
    }

    fn ai() -> MonsterAiConfig {
        MonsterAiConfig {
            attack_distance: 48.0,
            aggro_range_tiles: 6.0,
            ..MonsterAiConfig::default()
        }
    }

    #[test]
    fn monsters_close_in_and_hold_at_attack_distance() {
        let (map, index) = arena();
        let player = Vec2::new(96.0, 96.0);
        let mut monsters = vec![rat("rat-1", Vec2::new(352.0, 96.0), &index)];
        let updater = EntityUpdater::new(2).expect("pool");
        let ctx = MonsterUpdateContext::new(&map, &index, player, &ai());

        for _ in 0..400 {
            let _ = updater.update_monsters_parallel(&mut monsters, &ctx);
        }

        let distance = monsters[0].position.distance(player);
        assert!((distance - 48.0).abs() < 1e-3, "distance {distance}");
        assert_eq!(monsters[0].attack_cooldown, 0);
        assert_eq!(
            index.entity_by_id(&monsters[0].id).map(|e| e.position),
            Some(monsters[0].position)
        );
    }

    #[test]
    fn distant_monsters_stay_idle() {
        let (map, index) = arena();
        let player = Vec2::new(96.0, 96.0);
        let start = Vec2::new(544.0, 224.0);
        let mut monsters = vec![rat("rat-1", start, &index)];
        let updater = EntityUpdater::new(1).expect("pool");
        let ctx = MonsterUpdateContext {
            aggro_range: 100.0,
            ..MonsterUpdateContext::new(&map, &index, player, &ai())
        };

        assert_eq!(updater.update_monsters_parallel(&mut monsters, &ctx), 0);
        assert_eq!(monsters[0].position, start);
        assert_eq!(monsters[0].attack_cooldown, 2);
    }

    #[test]
    fn blocked_diagonals_slide_along_the_free_axis() {
        let (map, index) = arena();
        // The pillar at (4, 3) sits between the rat and the player.
        let player = Vec2::new(160.0, 160.0);
        let start = Vec2::new(352.0, 224.0);
        let mut monsters = vec![rat("rat-1", start, &index)];
        let updater = EntityUpdater::new(1).expect("pool");
        let ctx = MonsterUpdateContext::new(&map, &index, player, &ai());

        for _ in 0..60 {
            let _ = updater.update_monsters_parallel(&mut monsters, &ctx);
        }

        assert!(monsters[0].position.distance(player) < start.distance(player));
        assert!(!map.is_wall(map.cell_at(monsters[0].position).expect("inside")));
    }

    #[test]
    fn results_do_not_depend_on_worker_count() {
        let run = |workers: usize| {
            let (map, index) = arena();
            let player = Vec2::new(96.0, 96.0);
            let mut monsters: Vec<Monster> = (0..12)
                .map(|n| {
                    let column = (n % 6) as f32;
                    let row = (n / 6) as f32;
                    let position = Vec2::new(160.0 + 30.0 * column, 100.0 + 40.0 * row);
                    rat(&format!("rat-{n}"), position, &index)
                })
                .collect();
            let updater = EntityUpdater::new(workers).expect("pool");
            let ctx = MonsterUpdateContext::new(&map, &index, player, &ai());
            for _ in 0..90 {
                let _ = updater.update_monsters_parallel(&mut monsters, &ctx);
            }
            monsters.iter().map(|m| m.position).collect::<Vec<_>>()
        };

        assert_eq!(run(1), run(4));
    }

    fn bolt(position: Vec2, velocity: Vec2, lifetime: u32) -> Projectile {
        Projectile::new(
            EntityId::new("spell-1"),
            ProjectileKind::Magic {
                spell: SpellId::new("fireball"),
                damage_kind: DamageKind::Fire,
            },
            position,
            velocity,
            20,
            lifetime,
            32.0,
        )
    }

    #[test]
    fn projectiles_entering_walls_deactivate_and_report() {
        let (_, index) = arena();
        let updater = EntityUpdater::new(3).expect("pool");
        let start = Vec2::new(65.0, 65.0);
        let mut projectiles = vec![
            bolt(start, Vec2::new(-8.0, 0.0), 30),
            bolt(Vec2::new(200.0, 96.0), Vec2::new(8.0, 0.0), 30),
        ];

        let impacts =
            updater.update_projectiles_parallel(&mut projectiles, |p| !index.is_wall_at(p));

        assert_eq!(
            impacts,
            vec![ProjectileImpact {
                index: 0,
                position: start,
            }]
        );
        assert!(!projectiles[0].active);
        assert_eq!(projectiles[0].lifetime, 0);
        assert!(projectiles[1].is_live());
        assert_eq!(projectiles[1].position, Vec2::new(208.0, 96.0));
        assert_eq!(projectiles[1].lifetime, 29);
    }

    #[test]
    fn projectiles_expire_when_lifetime_runs_out() {
        let (_, index) = arena();
        let updater = EntityUpdater::new(2).expect("pool");
        let mut projectiles = vec![bolt(Vec2::new(200.0, 96.0), Vec2::new(1.0, 0.0), 2)];

        for _ in 0..2 {
            let impacts =
                updater.update_projectiles_parallel(&mut projectiles, |p| !index.is_wall_at(p));
            assert!(impacts.is_empty());
        }

        assert!(!projectiles[0].active);
        assert_eq!(projectiles[0].lifetime, 0);
    }
}
