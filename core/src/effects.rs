//! Frame-counted party buffs and their cumulative stat bonus.

use serde::{Deserialize, Serialize};

use crate::MovementModes;

/// Timed party-wide effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Extends the party's light radius.
    TorchLight,
    /// Reveals the surroundings.
    WizardEye,
    /// Allows crossing shallow water.
    WalkOnWater,
    /// Allows entering deep water.
    WaterBreathing,
    /// Raises every stat of every member.
    Bless,
}

impl EffectKind {
    /// Every effect kind in expiry processing order.
    pub const ALL: [Self; 5] = [
        Self::TorchLight,
        Self::WizardEye,
        Self::WalkOnWater,
        Self::WaterBreathing,
        Self::Bless,
    ];
}

/// Boolean plus frame counter backing a single effect.
///
/// The stat bonus contributed on activation is remembered so that expiry
/// subtracts exactly the amount that was added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEffect {
    /// Whether the effect is currently running.
    pub active: bool,
    /// Frames left before expiry.
    pub frames: u32,
    /// Stat bonus contributed while active.
    pub bonus: i32,
}

impl TimedEffect {
    fn start(&mut self, frames: u32, bonus: i32) -> i32 {
        if self.active {
            self.frames = self.frames.max(frames);
            return 0;
        }
        self.active = true;
        self.frames = frames;
        self.bonus = bonus;
        bonus
    }

    fn tick(&mut self) -> Option<i32> {
        if !self.active {
            return None;
        }
        self.frames = self.frames.saturating_sub(1);
        if self.frames > 0 {
            return None;
        }
        self.active = false;
        let bonus = self.bonus;
        self.bonus = 0;
        Some(bonus)
    }
}

/// Party-wide effect counters and the cumulative stat bonus they grant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    /// Torch Light state.
    pub torch_light: TimedEffect,
    /// Light radius in tiles while Torch Light is active.
    pub torch_radius: f32,
    /// Wizard Eye state.
    pub wizard_eye: TimedEffect,
    /// Walk on Water state.
    pub walk_on_water: TimedEffect,
    /// Water Breathing state.
    pub water_breathing: TimedEffect,
    /// Bless state.
    pub bless: TimedEffect,
    /// Sum of the bonuses of all running effects.
    pub stat_bonus: i32,
}

impl ActiveEffects {
    /// Starts or refreshes an effect.
    ///
    /// A fresh activation adds `bonus` to the cumulative stat bonus. Refreshing
    /// a running effect only extends its counter, so every lifecycle adds and
    /// removes its contribution exactly once.
    pub fn activate(&mut self, kind: EffectKind, frames: u32, bonus: i32) {
        if frames == 0 {
            return;
        }
        let added = self.slot_mut(kind).start(frames, bonus);
        self.stat_bonus += added;
    }

    /// Starts or refreshes Torch Light with the provided radius.
    pub fn activate_torch_light(&mut self, frames: u32, radius: f32) {
        self.activate(EffectKind::TorchLight, frames, 0);
        if self.torch_light.active {
            self.torch_radius = self.torch_radius.max(radius);
        }
    }

    /// Advances every running effect by one frame and returns those that expired.
    pub fn tick(&mut self) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        for kind in EffectKind::ALL {
            if let Some(bonus) = self.slot_mut(kind).tick() {
                self.stat_bonus -= bonus;
                if kind == EffectKind::TorchLight {
                    self.torch_radius = 0.0;
                }
                expired.push(kind);
            }
        }
        expired
    }

    /// Reports whether the effect is running.
    #[must_use]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.slot(kind).active
    }

    /// Frames left on the effect, zero when inactive.
    #[must_use]
    pub fn frames_remaining(&self, kind: EffectKind) -> u32 {
        let slot = self.slot(kind);
        if slot.active {
            slot.frames
        } else {
            0
        }
    }

    /// Movement modes currently granted by running effects.
    #[must_use]
    pub fn movement_modes(&self) -> MovementModes {
        MovementModes {
            walk_on_water: self.walk_on_water.active,
            water_breathing: self.water_breathing.active,
        }
    }

    fn slot(&self, kind: EffectKind) -> &TimedEffect {
        match kind {
            EffectKind::TorchLight => &self.torch_light,
            EffectKind::WizardEye => &self.wizard_eye,
            EffectKind::WalkOnWater => &self.walk_on_water,
            EffectKind::WaterBreathing => &self.water_breathing,
            EffectKind::Bless => &self.bless,
        }
    }

    fn slot_mut(&mut self, kind: EffectKind) -> &mut TimedEffect {
        match kind {
            EffectKind::TorchLight => &mut self.torch_light,
            EffectKind::WizardEye => &mut self.wizard_eye,
            EffectKind::WalkOnWater => &mut self.walk_on_water,
            EffectKind::WaterBreathing => &mut self.water_breathing,
            EffectKind::Bless => &mut self.bless,
        }
    }
}
