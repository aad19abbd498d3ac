//! Grip debouncing: smoothed channel readings → a single stable boolean.
//!
//! Each configured channel is normalized against its calibrated range; the
//! raw grip signal is the logical AND over every channel (a one-handed or
//! partial grip must not register on a dual-sensor strap). The debounced
//! signal latches releases through a grace period so micro-dropouts from
//! skin-contact noise don't drop the commuter mid-swing.
//!
//! Game logic never reads the continuous signal directly — only the
//! pressed/released edges reported by [`GripDebouncer::update`].

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationResult;
use crate::filter::normalize;

/// Debouncer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GripConfig {
    /// Normalized level a channel must exceed to count as gripped.
    pub normalized_threshold: f32,
    /// Seconds a release is held back before the debounced signal drops.
    pub release_grace_period: f32,
}

impl Default for GripConfig {
    fn default() -> Self {
        Self {
            normalized_threshold: 0.5,
            release_grace_period: 0.1,
        }
    }
}

/// Per-tick debouncer output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GripEdges {
    /// Debounced signal went inactive → active this tick.
    pub pressed: bool,
    /// Debounced signal went active → inactive this tick.
    pub released: bool,
    /// Debounced level after this tick (exposed for presentation only).
    pub active: bool,
}

/// Converts normalized channel readings into debounced grip edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GripDebouncer {
    config: GripConfig,
    ranges: Vec<CalibrationResult>,
    inactive_for: f32,
    debounced: bool,
    previous: bool,
}

impl GripDebouncer {
    /// A debouncer with no calibrated channels never activates.
    pub fn new(config: GripConfig) -> Self {
        Self {
            config,
            ranges: Vec::new(),
            inactive_for: 0.0,
            debounced: false,
            previous: false,
        }
    }

    /// Install calibrated ranges, one per channel. This is the injection
    /// point that enables input: before it is called, `update` reports no
    /// grip regardless of sensor values.
    pub fn set_calibration(&mut self, ranges: Vec<CalibrationResult>) {
        self.ranges = ranges;
        self.inactive_for = 0.0;
        self.debounced = false;
        self.previous = false;
    }

    pub fn is_calibrated(&self) -> bool {
        !self.ranges.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.ranges.len()
    }

    /// Feed this tick's smoothed readings (one per calibrated channel,
    /// extras ignored) and advance the grace timer by `dt`.
    pub fn update(&mut self, smoothed: &[f32], dt: f32) -> GripEdges {
        let raw_active = self.is_calibrated()
            && smoothed.len() >= self.ranges.len()
            && self
                .ranges
                .iter()
                .zip(smoothed)
                .all(|(range, &value)| {
                    normalize(value, range.min(), range.max()) > self.config.normalized_threshold
                });

        if raw_active {
            // Any active sample resets the grace window immediately.
            self.inactive_for = 0.0;
            self.debounced = true;
        } else if self.debounced {
            self.inactive_for += dt;
            if self.inactive_for >= self.config.release_grace_period {
                self.debounced = false;
            }
        }

        let edges = GripEdges {
            pressed: self.debounced && !self.previous,
            released: !self.debounced && self.previous,
            active: self.debounced,
        };
        self.previous = self.debounced;
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrated(channels: usize) -> GripDebouncer {
        let mut d = GripDebouncer::new(GripConfig::default());
        d.set_calibration(vec![
            CalibrationResult {
                released_average: 50.0,
                gripped_average: 950.0,
            };
            channels
        ]);
        d
    }

    const DT: f32 = 0.025;

    #[test]
    fn uncalibrated_never_activates() {
        let mut d = GripDebouncer::new(GripConfig::default());
        let edges = d.update(&[10_000.0], DT);
        assert!(!edges.pressed);
        assert!(!edges.active);
    }

    #[test]
    fn single_channel_press_edge_fires_once() {
        let mut d = calibrated(1);
        let first = d.update(&[900.0], DT);
        assert!(first.pressed);
        let second = d.update(&[900.0], DT);
        assert!(!second.pressed);
        assert!(second.active);
    }

    #[test]
    fn dual_channel_requires_both() {
        let mut d = calibrated(2);
        // One hand only: no grip.
        let edges = d.update(&[900.0, 60.0], DT);
        assert!(!edges.active);
        // Both hands: grip.
        let edges = d.update(&[900.0, 900.0], DT);
        assert!(edges.pressed);
    }

    #[test]
    fn short_dropout_is_absorbed() {
        let mut d = calibrated(1);
        d.update(&[900.0], DT);
        // Inactive for 0.075 s < 0.1 s grace: still held.
        for _ in 0..3 {
            let edges = d.update(&[0.0], DT);
            assert!(edges.active);
            assert!(!edges.released);
        }
        // Raw returns: grace timer resets to zero.
        d.update(&[900.0], DT);
        for _ in 0..3 {
            assert!(d.update(&[0.0], DT).active);
        }
    }

    #[test]
    fn sustained_dropout_releases() {
        let mut d = calibrated(1);
        d.update(&[900.0], DT);
        let mut released_at = None;
        for i in 0..8 {
            let edges = d.update(&[0.0], DT);
            if edges.released {
                released_at = Some(i);
                break;
            }
        }
        // 0.1 s grace at 0.025 s ticks → released on the 4th inactive tick.
        assert_eq!(released_at, Some(3));
    }

    #[test]
    fn scenario_grace_window() {
        // Full scenario: grip at raw 900 for 3 ticks, drop 0.05 s (held),
        // 0.15 s total low → released.
        let mut d = calibrated(1);
        for _ in 0..3 {
            assert!(d.update(&[900.0], DT).active);
        }
        for _ in 0..2 {
            assert!(d.update(&[0.0], DT).active); // 0.05 s low
        }
        let mut active = true;
        for _ in 0..4 {
            active = d.update(&[0.0], DT).active; // up to 0.15 s low
        }
        assert!(!active);
    }

    #[test]
    fn recalibration_clears_latched_state() {
        let mut d = calibrated(1);
        d.update(&[900.0], DT);
        assert!(d.update(&[900.0], DT).active);
        d.set_calibration(vec![CalibrationResult {
            released_average: 50.0,
            gripped_average: 950.0,
        }]);
        // No spurious released edge after reset.
        let edges = d.update(&[0.0], DT);
        assert!(!edges.released);
        assert!(!edges.active);
    }
}
