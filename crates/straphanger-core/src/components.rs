//! ECS components for the carriage population.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use straphanger_logic::reaction::NpcKind;
use straphanger_logic::vec2::Vec2;

/// 2D physical body. Angle/angular velocity are used by ragdoll-ish
/// knockdown presentation and by the detached-case spin.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
}

impl Body {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }
}

/// Marker: entity participates in simulation and logic this tick.
/// Inserted/removed by the pool and by the LOD activation calls.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Active;

/// Passenger kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub kind: NpcKind,
}

/// Reaction-machine state of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcState {
    Idle,
    KnockedDown,
}

/// Pending despawn after a defeat: lie still until `fade_at`, fade linearly
/// until `done_at`, then return to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Despawn {
    pub fade_at: f64,
    pub done_at: f64,
}

/// Per-passenger reaction bookkeeping. Reset on every pool activation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Reaction {
    pub state: NpcState,
    /// Battery already handed out this activation cycle.
    pub battery_granted: bool,
    /// Sim-time deadline for standing back up after a "sat" knockdown.
    pub recovery_at: Option<f64>,
    /// Fade-then-despawn sequence after a "fallen" knockdown.
    pub despawn: Option<Despawn>,
}

impl Default for Reaction {
    fn default() -> Self {
        Self {
            state: NpcState::Idle,
            battery_granted: false,
            recovery_at: None,
            despawn: None,
        }
    }
}

impl Reaction {
    pub fn knocked_down(&self) -> bool {
        self.state == NpcState::KnockedDown
    }
}

/// What the renderer should show for a passenger. The core only selects the
/// cue; drawing is a collaborator's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub pose: Pose,
    /// 1.0 opaque → 0.0 gone (driven by the despawn fade).
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pose {
    Standing,
    Sat,
    Fallen,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            pose: Pose::Standing,
            opacity: 1.0,
        }
    }
}

/// A case knocked loose from a suitcase passenger, flying free.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    /// Contact against the attacker that knocked it loose is ignored.
    pub ignores_player: bool,
    /// The carrier it detached from (never re-hits its own carrier).
    pub carrier: Entity,
}
