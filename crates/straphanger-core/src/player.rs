//! The player rig: grip edges in, swing physics and launch impulses out.
//!
//! State machine `Idle → Grabbing → Swaying → Launched` driven exclusively
//! by debounced grip edges and the tilt drive signal. The timed
//! grab-to-sway transition is a deadline field checked each tick;
//! cancellation clears the field and is idempotent.

use serde::{Deserialize, Serialize};

use straphanger_logic::filter::{clamp01, lerp};
use straphanger_logic::grip::GripEdges;
use straphanger_logic::sway::{
    accumulate_power, direct_step, impact_impulse, inertia_bonus, physical_torque,
    release_outcome, ReleaseOutcome, SwayConfig, SwayMode,
};
use straphanger_logic::vec2::Vec2;

use crate::components::Body;
use crate::stage::Instigator;
use crate::straps::{StrapId, StrapRegistry};

/// Distance from strap anchor to the player's center of mass.
const STRAP_LENGTH: f32 = 1.0;
const GRAVITY: f32 = 9.81;
/// How fast the body rights itself while airborne, per second.
const ATTITUDE_CORRECTION_SPEED: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Grabbing,
    Swaying,
    Launched,
}

/// The commuter.
#[derive(Debug)]
pub struct PlayerRig {
    config: SwayConfig,
    pub state: PlayerState,
    pub body: Body,
    pub sway_power: f32,
    /// Facing direction, locked in at launch.
    pub facing: i8,
    /// Relation only; the registry owns the strap.
    pub attached_strap: Option<StrapId>,
    /// Batteries equipped via the battery passenger's grant.
    pub batteries: u32,
    anchor: Vec2,
    /// Pending grab→sway transition deadline (sim time).
    sway_at: Option<f64>,
    grounded: bool,
}

impl PlayerRig {
    pub fn new(config: SwayConfig) -> Self {
        Self {
            config,
            state: PlayerState::Idle,
            body: Body::default(),
            sway_power: 0.0,
            facing: 1,
            attached_strap: None,
            batteries: 0,
            anchor: Vec2::ZERO,
            sway_at: None,
            grounded: true,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Consume this tick's grip edges.
    pub fn handle_grip(&mut self, edges: GripEdges, straps: &StrapRegistry, now: f64) {
        if edges.pressed {
            self.try_grab(straps, now);
        }
        if edges.released {
            self.release(now);
        }
    }

    fn try_grab(&mut self, straps: &StrapRegistry, now: f64) {
        if !matches!(self.state, PlayerState::Idle | PlayerState::Launched) {
            return;
        }
        let Some(id) = straps.nearest_within(self.body.position, self.config.max_grab_distance)
        else {
            log::warn!("grab attempt with no strap in range");
            return;
        };
        let Some(anchor) = straps.position(id) else {
            return;
        };

        self.attached_strap = Some(id);
        self.anchor = anchor;
        // Seed the hang angle from where the player is relative to the anchor.
        let offset = self.body.position - anchor;
        self.body.angle = offset.x.atan2(-offset.y);

        if self.grounded {
            self.state = PlayerState::Grabbing;
            self.sway_at = Some(now + f64::from(self.config.grab_to_sway_transition_time));
        } else {
            // Re-catch in mid-air: free momentum is damped so the move
            // can't be farmed for distance.
            self.body.velocity = self.body.velocity * self.config.aerial_recatch_dampener;
            self.body.angular_velocity = 0.0;
            self.state = PlayerState::Swaying;
        }
    }

    /// Let go of the strap. Cancels any pending grab→sway transition;
    /// harmless to call when not attached.
    pub fn release(&mut self, _now: f64) {
        if !matches!(self.state, PlayerState::Grabbing | PlayerState::Swaying) {
            return;
        }
        self.sway_at = None;
        self.attached_strap = None;

        let airborne = !self.grounded;
        match release_outcome(
            self.sway_power,
            self.body.velocity,
            airborne,
            self.facing,
            &self.config,
        ) {
            ReleaseOutcome::Drop { airborne } => {
                self.sway_power = 0.0;
                self.state = if airborne {
                    // Keep aerial attitude control active while falling.
                    PlayerState::Launched
                } else {
                    PlayerState::Idle
                };
            }
            ReleaseOutcome::Launch { impulse, facing } => {
                self.body.angular_velocity = 0.0;
                self.body.apply_impulse(impulse);
                self.facing = facing;
                self.sway_power = 0.0;
                self.grounded = false;
                self.state = PlayerState::Launched;
            }
        }
    }

    /// Advance one physics tick.
    pub fn tick(&mut self, tilt: f32, ambient_inertia: Vec2, dt: f32, now: f64) {
        if let Some(deadline) = self.sway_at {
            if now >= deadline && self.state == PlayerState::Grabbing {
                self.state = PlayerState::Swaying;
                self.sway_at = None;
            }
        }

        match self.state {
            PlayerState::Grabbing | PlayerState::Swaying => self.swing_step(tilt, ambient_inertia, dt),
            PlayerState::Launched => self.aerial_step(dt),
            PlayerState::Idle => {}
        }
    }

    fn swing_step(&mut self, tilt: f32, ambient_inertia: Vec2, dt: f32) {
        match self.config.mode {
            SwayMode::Direct => {
                let step = direct_step(self.body.angle, tilt, dt, &self.config);
                self.body.angle = step.angle;
                // Momentum disabled every tick in the assistive mode.
                self.body.angular_velocity = 0.0;
                self.sway_power = step.sway_power;
            }
            SwayMode::Physical => {
                let mut torque = physical_torque(tilt, self.sway_power, &self.config)
                    + inertia_bonus(tilt, ambient_inertia, &self.config);
                // Pendulum restoring torque.
                torque -= GRAVITY / STRAP_LENGTH * self.body.angle.sin();
                self.body.angular_velocity += torque * dt;
                self.sway_power = accumulate_power(
                    self.sway_power,
                    tilt,
                    self.body.angular_velocity,
                    dt,
                    &self.config,
                );
            }
        }
        self.body.angle += self.body.angular_velocity * dt;

        // Hang kinematics: position and velocity follow the strap.
        let (sin, cos) = (self.body.angle.sin(), self.body.angle.cos());
        self.body.position = self.anchor + Vec2::new(sin * STRAP_LENGTH, -cos * STRAP_LENGTH);
        self.body.velocity =
            Vec2::new(cos, sin) * (self.body.angular_velocity * STRAP_LENGTH);
    }

    fn aerial_step(&mut self, dt: f32) {
        self.body.velocity.y -= GRAVITY * dt;
        self.body.position += self.body.velocity * dt;
        // Attitude correction: right the body while flying.
        self.body.angle = lerp(
            self.body.angle,
            0.0,
            clamp01(ATTITUDE_CORRECTION_SPEED * dt),
        );
    }

    /// Externally detected ground contact.
    pub fn ground_contact(&mut self) {
        self.grounded = true;
        if self.state == PlayerState::Launched {
            self.body.angle = 0.0;
            self.body.angular_velocity = 0.0;
            self.body.velocity.x *= self.config.ground_braking;
            self.body.velocity.y = 0.0;
            self.state = PlayerState::Idle;
        }
    }

    /// Impulse this rig delivers on contact. Timed swings hit harder.
    pub fn contact_impulse(&self) -> Vec2 {
        impact_impulse(
            self.body.velocity,
            self.state == PlayerState::Swaying,
            self.sway_power,
            &self.config,
        )
    }
}

impl Instigator for PlayerRig {
    fn body_position(&self) -> Option<Vec2> {
        Some(self.body.position)
    }

    fn apply_counter_impulse(&mut self, impulse: Vec2) {
        self.body.apply_impulse(impulse);
    }

    fn equip_battery(&mut self) -> bool {
        self.batteries += 1;
        true
    }
}
