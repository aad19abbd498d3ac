//! Collaborator seams: the stage timeline and the impact instigator.
//!
//! The stage/wave scheduler lives outside the core; the core only needs
//! fire-and-forget notifications and the carriage's current inertia vector.
//! Services are injected at construction — no self-registering singletons.

use straphanger_logic::vec2::Vec2;

/// The stage collaborator the core reports into.
pub trait Stage {
    /// A passenger was defeated (score/sound handled by the stage).
    fn report_defeat(&mut self);
    /// Incremental score event accompanying a defeat.
    fn report_score_increment(&mut self);
    /// Current carriage acceleration/deceleration bonus vector.
    fn ambient_inertia(&self) -> Vec2;
}

/// Stage that ignores everything; inertia is zero.
#[derive(Debug, Default)]
pub struct NullStage;

impl Stage for NullStage {
    fn report_defeat(&mut self) {}
    fn report_score_increment(&mut self) {}
    fn ambient_inertia(&self) -> Vec2 {
        Vec2::ZERO
    }
}

/// Stage double that records every notification. Used by tests and the
/// headless harness.
#[derive(Debug, Default)]
pub struct RecordingStage {
    pub defeats: usize,
    pub score_increments: usize,
    pub inertia: Vec2,
}

impl Stage for RecordingStage {
    fn report_defeat(&mut self) {
        self.defeats += 1;
    }

    fn report_score_increment(&mut self) {
        self.score_increments += 1;
    }

    fn ambient_inertia(&self) -> Vec2 {
        self.inertia
    }
}

/// Whoever delivered an impact. Probed by reaction policies: the heavy
/// guard shoves back only if a physical body is exposed, the battery
/// passenger hands its battery only to an instigator that can equip one.
pub trait Instigator {
    /// Position of the instigator's physical body, if it has one.
    fn body_position(&self) -> Option<Vec2>;

    /// Receive a heavy guard's counter-shove. No-op without a body.
    fn apply_counter_impulse(&mut self, impulse: Vec2);

    /// Equip-battery capability probe. Returns whether the grant was
    /// accepted. Default: capability absent.
    fn equip_battery(&mut self) -> bool {
        false
    }
}

/// Instigator for a free-flying projectile: it has a body (so guards can
/// swat it back) but no equip capability.
#[derive(Debug)]
pub struct ProjectileInstigator {
    pub position: Vec2,
    /// Counter-shove accumulated this impact, applied back to the
    /// projectile body by the engine.
    pub counter: Vec2,
}

impl Instigator for ProjectileInstigator {
    fn body_position(&self) -> Option<Vec2> {
        Some(self.position)
    }

    fn apply_counter_impulse(&mut self, impulse: Vec2) {
        self.counter += impulse;
    }
}
