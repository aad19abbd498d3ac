//! Hold-to-measure grip calibration.
//!
//! At session start the commuter is asked to hold the sensor in two steady
//! states while the session measures the channel's resting levels:
//!
//! 1. **Released** — hand off the strap. Samples below the provisional
//!    threshold accumulate; any sample above it resets the phase.
//! 2. **Gripped** — full grip. Samples above the provisional threshold
//!    accumulate; any sample below it resets the phase.
//!
//! Released is measured first, then gripped. Each phase requires the state to
//! be held *continuously* for the full measure duration — an interruption at
//! any point discards the partial measurement entirely, no partial credit.
//!
//! After both phases the averages are checked for separation. A stuck or
//! disconnected sensor can produce `gripped ≈ released`; rather than failing
//! the session (and leaving the game unplayable) the gripped average is
//! forced up by a fallback margin. Availability beats accuracy here.
//!
//! The session is a suspension sequence: `advance` is called once per tick
//! with the latest smoothed sample and never blocks.

use serde::{Deserialize, Serialize};

/// Tuning for one calibration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Seconds each state must be held continuously.
    pub measure_duration: f32,
    /// Provisional split point: released samples must sit below this,
    /// gripped samples above it.
    pub provisional_threshold: f32,
    /// Minimum required `gripped - released` gap.
    pub minimum_separation: f32,
    /// Gap synthesized when the measured separation is insufficient.
    pub fallback_margin: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            measure_duration: 2.0,
            provisional_threshold: 512.0,
            minimum_separation: 50.0,
            fallback_margin: 100.0,
        }
    }
}

/// Final calibrated range for one channel. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub released_average: f32,
    pub gripped_average: f32,
}

impl CalibrationResult {
    /// Lower bound of the normalized range.
    pub fn min(&self) -> f32 {
        self.released_average
    }

    /// Upper bound of the normalized range.
    pub fn max(&self) -> f32 {
        self.gripped_average
    }
}

/// Which state is currently being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPhase {
    Released,
    Gripped,
    Complete,
}

/// One channel's calibration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSession {
    config: CalibrationConfig,
    phase: CalibrationPhase,
    sum: f64,
    count: u32,
    elapsed: f32,
    released_average: f32,
    result: Option<CalibrationResult>,
}

impl CalibrationSession {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            phase: CalibrationPhase::Released,
            sum: 0.0,
            count: 0,
            elapsed: 0.0,
            released_average: 0.0,
            result: None,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Seconds the current state has been held continuously.
    pub fn held_for(&self) -> f32 {
        self.elapsed
    }

    pub fn is_complete(&self) -> bool {
        self.phase == CalibrationPhase::Complete
    }

    /// The finished result, once both phases are measured.
    pub fn result(&self) -> Option<CalibrationResult> {
        self.result
    }

    /// Feed one smoothed sample. Returns the result on the tick the session
    /// completes; `None` before and after.
    pub fn advance(&mut self, sample: f32, dt: f32) -> Option<CalibrationResult> {
        let holds = match self.phase {
            CalibrationPhase::Released => sample < self.config.provisional_threshold,
            CalibrationPhase::Gripped => sample > self.config.provisional_threshold,
            CalibrationPhase::Complete => return None,
        };

        if !holds {
            // State broken: the whole phase starts over.
            self.sum = 0.0;
            self.count = 0;
            self.elapsed = 0.0;
            return None;
        }

        self.sum += f64::from(sample);
        self.count += 1;
        self.elapsed += dt;

        if self.elapsed < self.config.measure_duration {
            return None;
        }

        let average = (self.sum / f64::from(self.count)) as f32;
        self.sum = 0.0;
        self.count = 0;
        self.elapsed = 0.0;

        match self.phase {
            CalibrationPhase::Released => {
                self.released_average = average;
                self.phase = CalibrationPhase::Gripped;
                None
            }
            CalibrationPhase::Gripped => {
                let mut gripped = average;
                if gripped - self.released_average < self.config.minimum_separation {
                    // Stuck or dead sensor: synthesize a usable range.
                    gripped = self.released_average + self.config.fallback_margin;
                }
                let result = CalibrationResult {
                    released_average: self.released_average,
                    gripped_average: gripped,
                };
                self.result = Some(result);
                self.phase = CalibrationPhase::Complete;
                Some(result)
            }
            CalibrationPhase::Complete => None,
        }
    }
}
