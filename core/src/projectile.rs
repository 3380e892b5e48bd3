//! Short-lived moving entities that can strike monsters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{DamageKind, EntityId, SpellId};

/// Variant-specific payload of a projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Spell bolt carrying elemental damage.
    Magic {
        /// Spell that produced the bolt.
        spell: SpellId,
        /// Element of the damage dealt.
        damage_kind: DamageKind,
    },
    /// Arrow fired from a bow.
    Arrow {
        /// Catalog key of the firing weapon.
        weapon: String,
    },
    /// Stationary hitbox of a melee swing.
    Melee {
        /// Catalog key of the swung weapon.
        weapon: String,
    },
}

/// Outcome of integrating a projectile for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectileStep {
    /// Still flying.
    Moved,
    /// Struck impassable terrain at the recorded position and deactivated.
    Blocked {
        /// Position at which the projectile stopped.
        at: Vec2,
    },
    /// Lifetime ran out.
    Expired,
    /// Was already inactive; nothing changed.
    Inactive,
}

/// Magic bolt, arrow, or melee hitbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Collision handle.
    pub id: EntityId,
    /// Variant payload.
    pub kind: ProjectileKind,
    /// Center in world pixels.
    pub position: Vec2,
    /// Displacement per frame.
    pub velocity: Vec2,
    /// Damage dealt on impact before monster resistances.
    pub damage: i32,
    /// Frames left to live.
    pub lifetime: u32,
    /// Whether the projectile can still hit.
    pub active: bool,
    /// Side length of the bounding box in pixels.
    pub size: f32,
    /// Party member that produced the projectile.
    pub owner: usize,
}

impl Projectile {
    /// Creates a projectile, active exactly when `lifetime` is positive.
    #[must_use]
    pub fn new(
        id: EntityId,
        kind: ProjectileKind,
        position: Vec2,
        velocity: Vec2,
        damage: i32,
        lifetime: u32,
        size: f32,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            velocity,
            damage,
            lifetime,
            active: lifetime > 0,
            size,
            owner: 0,
        }
    }

    /// Attributes the projectile to a party member.
    #[must_use]
    pub fn with_owner(mut self, owner: usize) -> Self {
        self.owner = owner;
        self
    }

    /// Reports whether the projectile is active with lifetime left.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.active && self.lifetime > 0
    }

    /// Terminates the projectile; it must be unregistered before the next tick.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.lifetime = 0;
    }

    /// Kind of damage dealt on impact.
    #[must_use]
    pub fn damage_kind(&self) -> DamageKind {
        match &self.kind {
            ProjectileKind::Magic { damage_kind, .. } => *damage_kind,
            ProjectileKind::Arrow { .. } | ProjectileKind::Melee { .. } => DamageKind::Physical,
        }
    }

    /// Side length of the bounding box, never below one pixel.
    #[must_use]
    pub fn bounding_size(&self) -> f32 {
        self.size.max(1.0)
    }

    /// Advances the projectile by one frame.
    ///
    /// A moving projectile whose next position is rejected by `can_move_to`
    /// stays in place and deactivates; otherwise it moves and loses one frame
    /// of lifetime, deactivating once the lifetime is spent.
    pub fn integrate<F>(&mut self, can_move_to: F) -> ProjectileStep
    where
        F: Fn(Vec2) -> bool,
    {
        if !self.is_live() {
            if self.active {
                self.deactivate();
            }
            return ProjectileStep::Inactive;
        }

        if self.velocity != Vec2::ZERO {
            let next = self.position + self.velocity;
            if !can_move_to(next) {
                self.deactivate();
                return ProjectileStep::Blocked { at: self.position };
            }
            self.position = next;
        }

        self.lifetime -= 1;
        if self.lifetime == 0 {
            self.active = false;
            return ProjectileStep::Expired;
        }
        ProjectileStep::Moved
    }
}
