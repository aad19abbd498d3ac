//! Signal conditioning for raw grip-sensor samples.
//!
//! The hardware delivers noisy integer readings at an arbitrary rate; the
//! simulation reads once per tick through a one-pole low-pass filter. The
//! smoothing factor trades responsiveness against noise rejection: 1.0 passes
//! raw samples through untouched, small values settle slowly but reject
//! skin-contact chatter.

use serde::{Deserialize, Serialize};

/// Clamp a value into `[0, 1]`.
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Linear interpolation from `a` toward `b` by factor `t`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Map a smoothed reading into `[0, 1]` against a calibrated `(min, max)`
/// range. Degenerate ranges (max ≤ min) map everything to 0 so a stuck
/// sensor reads as "released" rather than dividing by zero.
pub fn normalize(smoothed: f32, min: f32, max: f32) -> f32 {
    if max <= min {
        return 0.0;
    }
    clamp01((smoothed - min) / (max - min))
}

/// One-pole low-pass filter over a stream of raw samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowPass {
    smoothed: f32,
    /// Blend factor per update, in `(0, 1]`.
    factor: f32,
}

impl LowPass {
    pub fn new(factor: f32) -> Self {
        Self {
            smoothed: 0.0,
            factor: factor.clamp(f32::EPSILON, 1.0),
        }
    }

    /// Fold one raw sample into the smoothed value. Call once per tick.
    pub fn update(&mut self, raw: f32) -> f32 {
        self.smoothed = lerp(self.smoothed, raw, self.factor);
        self.smoothed
    }

    pub fn value(&self) -> f32 {
        self.smoothed
    }

    /// Reset state (used when a device reconnects).
    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }
}
