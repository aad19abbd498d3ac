//! Aggregate tuning configuration.
//!
//! Collects every component's tuning into one serializable struct so a
//! harness or front-end can load a full parameter set from JSON and hand
//! slices of it to each component. Defaults are the shipped game feel.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::grip::GripConfig;
use crate::reaction::ReactionConfig;
use crate::separation::SeparationConfig;
use crate::sway::SwayConfig;

/// Full tuning set for the simulation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub sensor: SensorConfig,
    pub calibration: CalibrationConfig,
    pub grip: GripConfig,
    pub sway: SwayConfig,
    pub reaction: ReactionConfig,
    pub separation: SeparationConfig,
    pub pool: PoolConfig,
}

/// Sensor channel tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Number of physical grip channels (1 or 2).
    pub channels: usize,
    /// One-pole low-pass blend factor per tick, in `(0, 1]`.
    pub smoothing_factor: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            smoothing_factor: 0.25,
        }
    }
}

/// Pool pre-sizing per passenger kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub normal_capacity: usize,
    pub heavy_capacity: usize,
    pub suitcase_capacity: usize,
    pub battery_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            normal_capacity: 16,
            heavy_capacity: 4,
            suitcase_capacity: 4,
            battery_capacity: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = TuningConfig::default();
        assert!(cfg.sensor.channels >= 1 && cfg.sensor.channels <= 2);
        assert!(cfg.sensor.smoothing_factor > 0.0 && cfg.sensor.smoothing_factor <= 1.0);
        assert!(cfg.grip.release_grace_period > 0.0);
        assert!(cfg.sway.min_launch_power < cfg.sway.max_sway_power);
        assert!(cfg.reaction.thresholds.sat < cfg.reaction.thresholds.fallen);
    }
}
