#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cosmetic particle bursts spawned where projectiles connect.

use glam::Vec2;
use gridcrawl_core::Color;
use rand::Rng;
use rand_distr::UnitCircle;

/// Upper bound on particles in a single burst.
pub const MAX_PARTICLES: usize = 48;

const ARROW_PARTICLES: usize = 6;
const ARROW_COLOR: Color = Color::from_rgb(200, 180, 140);
const SPELL_COLOR: Color = Color::from_rgb(255, 140, 40);

/// A single short-lived spark.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Current position in pixels.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Remaining ticks.
    pub lifetime: u32,
    /// Display tint.
    pub color: Color,
}

impl Particle {
    /// Reports whether the particle still has ticks left.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.lifetime > 0
    }
}

/// Burst of particles originating from one impact.
#[derive(Clone, Debug, Default)]
pub struct HitEffect {
    particles: Vec<Particle>,
}

impl HitEffect {
    /// Particles still alive in this burst.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

/// Every live hit effect.
#[derive(Clone, Debug, Default)]
pub struct HitEffects {
    effects: Vec<HitEffect>,
}

impl HitEffects {
    /// Creates an empty effect set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live bursts.
    #[must_use]
    pub fn effects(&self) -> &[HitEffect] {
        &self.effects
    }

    /// Total live particles across all bursts.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.effects.iter().map(|effect| effect.particles.len()).sum()
    }

    /// Spawns the small splinter burst of an arrow or melee hit.
    pub fn spawn_arrow_hit<R: Rng + ?Sized>(&mut self, position: Vec2, rng: &mut R) {
        self.spawn(position, ARROW_PARTICLES, 1.0..2.5, 8..16, ARROW_COLOR, rng);
    }

    /// Spawns a spell burst sized by the spell's damage and collision radius.
    pub fn spawn_spell_hit<R: Rng + ?Sized>(
        &mut self,
        position: Vec2,
        damage_base: i32,
        radius: f32,
        rng: &mut R,
    ) {
        let count = spell_particle_count(damage_base, radius);
        let top_speed = 1.5 + radius.max(0.0) / 8.0;
        self.spawn(position, count, 1.0..top_speed, 20..40, SPELL_COLOR, rng);
    }

    /// Advances every particle by one tick.
    ///
    /// Expired particles are dropped and a burst disappears once none of its
    /// particles remain.
    pub fn update(&mut self) {
        for effect in &mut self.effects {
            for particle in &mut effect.particles {
                particle.position += particle.velocity;
                particle.velocity *= 0.9;
                particle.lifetime = particle.lifetime.saturating_sub(1);
            }
            effect.particles.retain(Particle::is_active);
        }
        self.effects.retain(|effect| !effect.particles.is_empty());
    }

    fn spawn<R: Rng + ?Sized>(
        &mut self,
        position: Vec2,
        count: usize,
        speed: std::ops::Range<f32>,
        lifetime: std::ops::Range<u32>,
        color: Color,
        rng: &mut R,
    ) {
        let particles = (0..count.min(MAX_PARTICLES))
            .map(|_| {
                let [x, y]: [f32; 2] = rng.sample(UnitCircle);
                let magnitude = rng.gen_range(speed.clone());
                Particle {
                    position,
                    velocity: Vec2::new(x, y) * magnitude,
                    lifetime: rng.gen_range(lifetime.clone()),
                    color,
                }
            })
            .collect();
        self.effects.push(HitEffect { particles });
    }
}

/// Number of particles a spell impact produces.
#[must_use]
pub fn spell_particle_count(damage_base: i32, radius: f32) -> usize {
    let from_damage = usize::try_from(damage_base.max(0)).unwrap_or(0);
    let from_radius = (radius.max(0.0) / 2.0) as usize;
    (8 + from_damage + from_radius).min(MAX_PARTICLES)
}
