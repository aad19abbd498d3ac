//! Sensor input: cross-thread raw values, smoothing, debouncing, tilt.
//!
//! Two execution contexts touch sensor state:
//! - a background reader thread parses hardware frames and is the **only
//!   writer** of the raw atomic fields (latest value wins, `Relaxed` is
//!   enough for single-word publish);
//! - the simulation thread reads the raw fields once per tick and owns all
//!   smoothing, calibration and debouncing state.
//!
//! A missing or disconnected device leaves the raw fields at zero — grip
//! simply never activates. Input unavailable is not an error.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use straphanger_logic::calibration::CalibrationResult;
use straphanger_logic::config::SensorConfig;
use straphanger_logic::filter::LowPass;
use straphanger_logic::grip::{GripConfig, GripDebouncer, GripEdges};
use straphanger_logic::sway::tilt_from_accel;

/// Hardware supports at most two grip channels (one per hand).
pub const MAX_CHANNELS: usize = 2;

/// How long the reader blocks waiting for one frame.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// One parsed hardware frame. Framing/protocol is the I/O collaborator's
/// concern; the core only consumes numeric samples.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame {
    pub grip: [i32; MAX_CHANNELS],
    pub accel_horizontal: f32,
    pub accel_vertical: f32,
}

/// Result of one blocking read from the device.
#[derive(Debug, Clone, Copy)]
pub enum SourceRead {
    Frame(RawFrame),
    /// Nothing arrived within the timeout; keep the last values.
    TimedOut,
    /// Device gone. The reader zeroes the raw fields and exits.
    Disconnected,
}

/// Source of parsed hardware frames, driven from the reader thread.
pub trait SampleSource: Send {
    fn read(&mut self, timeout: Duration) -> SourceRead;
}

/// Raw sensor fields shared between the reader thread and the simulation.
#[derive(Debug)]
pub struct RawSensors {
    grip: [AtomicI32; MAX_CHANNELS],
    accel_horizontal: AtomicU32,
    accel_vertical: AtomicU32,
    connected: AtomicBool,
}

impl Default for RawSensors {
    fn default() -> Self {
        Self {
            grip: [AtomicI32::new(0), AtomicI32::new(0)],
            accel_horizontal: AtomicU32::new(0f32.to_bits()),
            accel_vertical: AtomicU32::new(0f32.to_bits()),
            connected: AtomicBool::new(false),
        }
    }
}

impl RawSensors {
    /// Producer side: publish one frame. Reader thread only.
    pub fn publish(&self, frame: &RawFrame) {
        for (slot, &value) in self.grip.iter().zip(frame.grip.iter()) {
            slot.store(value, Ordering::Relaxed);
        }
        self.accel_horizontal
            .store(frame.accel_horizontal.to_bits(), Ordering::Relaxed);
        self.accel_vertical
            .store(frame.accel_vertical.to_bits(), Ordering::Relaxed);
        self.connected.store(true, Ordering::Relaxed);
    }

    /// Producer side: device lost. Raw values fall back to zero.
    pub fn mark_disconnected(&self) {
        for slot in &self.grip {
            slot.store(0, Ordering::Relaxed);
        }
        self.connected.store(false, Ordering::Relaxed);
    }

    pub fn grip(&self, channel: usize) -> i32 {
        self.grip[channel].load(Ordering::Relaxed)
    }

    pub fn accel(&self) -> (f32, f32) {
        (
            f32::from_bits(self.accel_horizontal.load(Ordering::Relaxed)),
            f32::from_bits(self.accel_vertical.load(Ordering::Relaxed)),
        )
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// Spawn the background reader. It loops on blocking reads and publishes
/// into `raw` until the source reports disconnection.
pub fn spawn_reader(raw: Arc<RawSensors>, mut source: impl SampleSource + 'static) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match source.read(READ_TIMEOUT) {
            SourceRead::Frame(frame) => raw.publish(&frame),
            SourceRead::TimedOut => {}
            SourceRead::Disconnected => {
                log::warn!("sensor device disconnected; grip input unavailable");
                raw.mark_disconnected();
                break;
            }
        }
    })
}

/// Simulation-tick sensor output.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    pub edges: GripEdges,
    /// Tilt drive signal in radians (device angle, or the debug axis).
    pub tilt: f32,
}

/// Simulation-side sensor state: filters, debouncer, tilt source.
///
/// All methods here run on the simulation thread only.
#[derive(Debug)]
pub struct SensorHub {
    raw: Arc<RawSensors>,
    filters: Vec<LowPass>,
    debouncer: GripDebouncer,
    smoothed: Vec<f32>,
    debug_axis: Option<f32>,
    debug_grip: Option<bool>,
    debug_grip_active: bool,
}

impl SensorHub {
    pub fn new(sensor: &SensorConfig, grip: GripConfig) -> Self {
        let channels = sensor.channels.clamp(1, MAX_CHANNELS);
        Self {
            raw: Arc::new(RawSensors::default()),
            filters: vec![LowPass::new(sensor.smoothing_factor); channels],
            debouncer: GripDebouncer::new(grip),
            smoothed: vec![0.0; channels],
            debug_axis: None,
            debug_grip: None,
            debug_grip_active: false,
        }
    }

    /// Shared handle for the producer thread.
    pub fn raw(&self) -> Arc<RawSensors> {
        Arc::clone(&self.raw)
    }

    pub fn channel_count(&self) -> usize {
        self.filters.len()
    }

    /// Last tick's smoothed readings (consumed by calibration).
    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }

    /// Keyboard/debug tilt override; `None` returns to the device angle.
    pub fn set_debug_axis(&mut self, axis: Option<f32>) {
        self.debug_axis = axis;
    }

    /// Keyboard/debug grip override, the only way grip activates with no
    /// device. Bypasses calibration and the debouncer; `None` returns to
    /// the sensor path.
    pub fn set_debug_grip(&mut self, grip: Option<bool>) {
        self.debug_grip = grip;
    }

    pub fn is_calibrated(&self) -> bool {
        self.debouncer.is_calibrated()
    }

    /// Injection point completing calibration. Until this is called the
    /// debouncer reports no grip whatever the sensors read.
    pub fn set_calibration_values(&mut self, ranges: Vec<CalibrationResult>) {
        let channels = self.filters.len();
        if ranges.len() != channels {
            log::warn!(
                "calibration supplied {} ranges for {} channels; truncating",
                ranges.len(),
                channels
            );
        }
        let mut ranges = ranges;
        ranges.truncate(channels);
        self.debouncer.set_calibration(ranges);
    }

    /// Once per simulation tick: fold raw samples through the filters, run
    /// the debouncer, resolve the tilt drive signal.
    pub fn tick(&mut self, dt: f32) -> InputFrame {
        for (i, filter) in self.filters.iter_mut().enumerate() {
            self.smoothed[i] = filter.update(self.raw.grip(i) as f32);
        }
        let mut edges = self.debouncer.update(&self.smoothed, dt);
        if let Some(forced) = self.debug_grip {
            edges = GripEdges {
                pressed: forced && !self.debug_grip_active,
                released: !forced && self.debug_grip_active,
                active: forced,
            };
            self.debug_grip_active = forced;
        }
        let tilt = self.debug_axis.unwrap_or_else(|| {
            let (h, v) = self.raw.accel();
            tilt_from_accel(h, v)
        });
        InputFrame { edges, tilt }
    }
}
