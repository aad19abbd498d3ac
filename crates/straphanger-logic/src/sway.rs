//! Swing, power and launch math for the strap-hanging player.
//!
//! Pure functions only — the stateful action machine in the engine crate
//! calls into these each physics tick. Two swing modes exist:
//!
//! - **Direct**: the body angle tracks the tilt input directly and angular
//!   momentum is disabled every tick. Power is derived from the current
//!   angle rather than accumulated. An assistive mode: no timing skill
//!   required, no decay.
//! - **Physical**: tilt input becomes torque, amplified by stored power
//!   (rhythm is rewarded with swing authority). Power accumulates only while
//!   the body actually rotates in the driven direction fast enough, and
//!   decays linearly otherwise.

use serde::{Deserialize, Serialize};

use crate::filter::{clamp01, lerp};
use crate::vec2::Vec2;

/// Swing physics mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwayMode {
    /// Angle follows tilt, momentum disabled (assistive).
    Direct,
    /// Tilt drives torque, momentum and pumping rhythm matter.
    Physical,
}

/// Swing/launch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwayConfig {
    pub mode: SwayMode,
    /// Maximum body angle in radians (both modes clamp to ±this).
    pub sway_max_angle: f32,
    /// Invert the tilt axis (device mounted mirrored).
    pub invert_tilt: bool,
    /// Direct mode: lerp speed toward the target angle, per second.
    pub direct_lerp_speed: f32,
    /// Physical mode: base torque per unit of drive signal.
    pub sway_force_by_angle: f32,
    /// Physical mode: how much stored power amplifies torque.
    pub power_to_swing_multiplier: f32,
    /// Minimum |angular velocity| for power to accumulate.
    pub swing_velocity_threshold: f32,
    /// Accumulation rate factor (drive × angular velocity × this × dt).
    pub accumulation_gain: f32,
    /// Linear power decay per second while not accumulating (physical only).
    pub sway_decay_rate: f32,
    pub max_sway_power: f32,
    /// Power below this launches nothing on release.
    pub min_launch_power: f32,
    /// Impulse per unit of power at launch.
    pub launch_multiplier: f32,
    /// Extra impact impulse per unit of power while swaying.
    pub sway_impact_bonus: f32,
    /// Torque bonus per unit of opposing ambient inertia.
    pub inertia_bonus_gain: f32,
    /// Velocity retained when re-grabbing while airborne.
    pub aerial_recatch_dampener: f32,
    /// Horizontal velocity retained on landing.
    pub ground_braking: f32,
    /// Seconds between grabbing the strap and swinging (grab animation).
    pub grab_to_sway_transition_time: f32,
    /// Furthest strap the player can grab.
    pub max_grab_distance: f32,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            mode: SwayMode::Physical,
            sway_max_angle: 1.2,
            invert_tilt: false,
            direct_lerp_speed: 8.0,
            sway_force_by_angle: 40.0,
            power_to_swing_multiplier: 0.15,
            swing_velocity_threshold: 0.5,
            accumulation_gain: 2.0,
            sway_decay_rate: 1.5,
            max_sway_power: 10.0,
            min_launch_power: 2.0,
            launch_multiplier: 1.8,
            sway_impact_bonus: 0.6,
            inertia_bonus_gain: 6.0,
            aerial_recatch_dampener: 0.3,
            ground_braking: 0.4,
            grab_to_sway_transition_time: 0.25,
            max_grab_distance: 1.5,
        }
    }
}

/// Tilt angle (radians) from the accelerometer's horizontal and vertical
/// components. Zero when hanging straight down.
pub fn tilt_from_accel(horizontal: f32, vertical: f32) -> f32 {
    horizontal.atan2(vertical)
}

/// Direct-mode result for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectStep {
    /// New body angle. Angular velocity must be forced to zero alongside.
    pub angle: f32,
    /// Power derived from the new angle (not accumulated).
    pub sway_power: f32,
}

/// Direct mode: move the body angle toward the (clamped, optionally
/// inverted) tilt target and derive power from angular displacement.
pub fn direct_step(current_angle: f32, tilt: f32, dt: f32, config: &SwayConfig) -> DirectStep {
    let signed = if config.invert_tilt { -tilt } else { tilt };
    let target = signed.clamp(-config.sway_max_angle, config.sway_max_angle);
    let angle = lerp(current_angle, target, clamp01(config.direct_lerp_speed * dt));
    let sway_power = angle.abs() / config.sway_max_angle * config.max_sway_power;
    DirectStep { angle, sway_power }
}

/// Physical mode: torque for this tick's drive signal. Stored power
/// amplifies swing authority (positive feedback rewarding rhythm).
pub fn physical_torque(drive: f32, sway_power: f32, config: &SwayConfig) -> f32 {
    let signed = if config.invert_tilt { -drive } else { drive };
    signed * config.sway_force_by_angle * (1.0 + sway_power * config.power_to_swing_multiplier)
}

/// Additive torque bonus from the carriage's ambient inertia. Only paid
/// when the inertia opposes the intentional drive direction — swinging
/// against the train's momentum is the skilled move.
pub fn inertia_bonus(drive: f32, ambient: Vec2, config: &SwayConfig) -> f32 {
    if drive == 0.0 || ambient.x == 0.0 {
        return 0.0;
    }
    if drive.signum() == ambient.x.signum() {
        return 0.0;
    }
    drive.signum() * ambient.x.abs() * config.inertia_bonus_gain
}

/// Physical mode: advance stored power by one tick.
///
/// Power accumulates only while the body rotates in the driven direction
/// faster than the swing velocity threshold — well-timed pumping, not mere
/// holding. Otherwise it decays linearly. Result clamped to
/// `[0, max_sway_power]`.
pub fn accumulate_power(
    power: f32,
    drive: f32,
    angular_velocity: f32,
    dt: f32,
    config: &SwayConfig,
) -> f32 {
    let pumping = drive != 0.0
        && angular_velocity.signum() == drive.signum()
        && angular_velocity.abs() > config.swing_velocity_threshold;

    let next = if pumping {
        power + drive.abs() * angular_velocity.abs() * config.accumulation_gain * dt
    } else {
        power - config.sway_decay_rate * dt
    };
    next.clamp(0.0, config.max_sway_power)
}

/// What releasing the strap does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseOutcome {
    /// Not enough power: no impulse, power zeroed. The player falls
    /// (aerial attitude control stays active) or simply stands.
    Drop { airborne: bool },
    /// Launch: apply the impulse, zero angular velocity, lock facing.
    Launch { impulse: Vec2, facing: i8 },
}

/// Resolve a strap release into a launch or a drop.
///
/// At exactly `min_launch_power` the launch fires; below it nothing does.
/// A near-zero velocity launches straight up.
pub fn release_outcome(
    sway_power: f32,
    velocity: Vec2,
    airborne: bool,
    current_facing: i8,
    config: &SwayConfig,
) -> ReleaseOutcome {
    if sway_power < config.min_launch_power {
        return ReleaseOutcome::Drop { airborne };
    }

    let direction = if velocity.length_squared() < 1e-6 {
        Vec2::UP
    } else {
        velocity.normalize()
    };
    let impulse = direction * (sway_power * config.launch_multiplier);
    let facing = if direction.x > 0.0 {
        1
    } else if direction.x < 0.0 {
        -1
    } else {
        current_facing
    };
    ReleaseOutcome::Launch { impulse, facing }
}

/// Impulse delivered to a body the player runs into. Velocity is the base;
/// a timed swing adds a power bonus along the same direction.
pub fn impact_impulse(velocity: Vec2, swaying: bool, sway_power: f32, config: &SwayConfig) -> Vec2 {
    if !swaying {
        return velocity;
    }
    velocity + velocity.normalize() * (sway_power * config.sway_impact_bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SwayConfig {
        SwayConfig::default()
    }

    #[test]
    fn tilt_angle_zero_when_vertical() {
        assert!(tilt_from_accel(0.0, 1.0).abs() < 1e-6);
        assert!(tilt_from_accel(1.0, 1.0) > 0.0);
        assert!(tilt_from_accel(-1.0, 1.0) < 0.0);
    }

    #[test]
    fn direct_step_tracks_and_clamps() {
        let cfg = config();
        // Huge tilt clamps to the max angle; large dt snaps to target.
        let step = direct_step(0.0, 10.0, 1.0, &cfg);
        assert!((step.angle - cfg.sway_max_angle).abs() < 1e-6);
        assert!((step.sway_power - cfg.max_sway_power).abs() < 1e-4);
    }

    #[test]
    fn direct_step_inverts() {
        let mut cfg = config();
        cfg.invert_tilt = true;
        let step = direct_step(0.0, 0.5, 1.0, &cfg);
        assert!(step.angle < 0.0);
    }

    #[test]
    fn direct_power_is_proportional_to_angle() {
        let cfg = config();
        let step = direct_step(cfg.sway_max_angle / 2.0, cfg.sway_max_angle / 2.0, 0.0, &cfg);
        assert!((step.sway_power - cfg.max_sway_power / 2.0).abs() < 1e-4);
    }

    #[test]
    fn torque_amplified_by_power() {
        let cfg = config();
        let base = physical_torque(1.0, 0.0, &cfg);
        let amped = physical_torque(1.0, cfg.max_sway_power, &cfg);
        assert!(amped > base);
        assert!((base - cfg.sway_force_by_angle).abs() < 1e-6);
    }

    #[test]
    fn power_accumulates_only_when_pumping() {
        let cfg = config();
        // Velocity matches drive sign and clears the threshold.
        let up = accumulate_power(1.0, 0.8, 2.0, 0.1, &cfg);
        assert!(up > 1.0);
        // Velocity opposes drive: decay.
        let down = accumulate_power(1.0, 0.8, -2.0, 0.1, &cfg);
        assert!(down < 1.0);
        // Velocity matches but below threshold: decay.
        let slow = accumulate_power(1.0, 0.8, 0.1, 0.1, &cfg);
        assert!(slow < 1.0);
    }

    #[test]
    fn power_decay_is_linear_and_floored() {
        let cfg = config();
        let rate = cfg.sway_decay_rate;
        let dt = 0.05;
        let initial = 3.0;
        let mut power = initial;
        for _ in 0..10 {
            power = accumulate_power(power, 0.0, 0.0, dt, &cfg);
        }
        assert!((power - (initial - 10.0 * rate * dt)).abs() < 1e-4);
        // Decay never goes negative.
        for _ in 0..100 {
            power = accumulate_power(power, 0.0, 0.0, dt, &cfg);
        }
        assert_eq!(power, 0.0);
    }

    #[test]
    fn power_clamped_at_max() {
        let cfg = config();
        let mut power = cfg.max_sway_power - 0.01;
        for _ in 0..100 {
            power = accumulate_power(power, 1.0, 5.0, 0.1, &cfg);
        }
        assert_eq!(power, cfg.max_sway_power);
    }

    #[test]
    fn inertia_bonus_only_when_opposed() {
        let cfg = config();
        let opposed = inertia_bonus(1.0, Vec2::new(-2.0, 0.0), &cfg);
        assert!(opposed > 0.0);
        let aligned = inertia_bonus(1.0, Vec2::new(2.0, 0.0), &cfg);
        assert_eq!(aligned, 0.0);
        let no_drive = inertia_bonus(0.0, Vec2::new(-2.0, 0.0), &cfg);
        assert_eq!(no_drive, 0.0);
        // Bonus pushes in the drive direction.
        let negative_drive = inertia_bonus(-1.0, Vec2::new(2.0, 0.0), &cfg);
        assert!(negative_drive < 0.0);
    }

    #[test]
    fn release_below_threshold_never_launches() {
        let cfg = config();
        let eps = 1e-4;
        let outcome = release_outcome(
            cfg.min_launch_power - eps,
            Vec2::new(3.0, 1.0),
            false,
            1,
            &cfg,
        );
        assert_eq!(outcome, ReleaseOutcome::Drop { airborne: false });
    }

    #[test]
    fn release_at_threshold_launches() {
        let cfg = config();
        let outcome = release_outcome(cfg.min_launch_power, Vec2::new(3.0, 1.0), false, 1, &cfg);
        match outcome {
            ReleaseOutcome::Launch { impulse, facing } => {
                let expected = cfg.min_launch_power * cfg.launch_multiplier;
                assert!((impulse.length() - expected).abs() < 1e-4);
                assert_eq!(facing, 1);
            }
            ReleaseOutcome::Drop { .. } => panic!("expected launch at threshold"),
        }
    }

    #[test]
    fn release_with_zero_velocity_launches_up() {
        let cfg = config();
        let outcome = release_outcome(cfg.max_sway_power, Vec2::ZERO, false, -1, &cfg);
        match outcome {
            ReleaseOutcome::Launch { impulse, facing } => {
                assert_eq!(impulse.x, 0.0);
                assert!(impulse.y > 0.0);
                // Facing unchanged for a straight-up launch.
                assert_eq!(facing, -1);
            }
            ReleaseOutcome::Drop { .. } => panic!("expected launch"),
        }
    }

    #[test]
    fn release_facing_follows_direction() {
        let cfg = config();
        let outcome = release_outcome(cfg.max_sway_power, Vec2::new(-5.0, 2.0), true, 1, &cfg);
        match outcome {
            ReleaseOutcome::Launch { facing, .. } => assert_eq!(facing, -1),
            ReleaseOutcome::Drop { .. } => panic!("expected launch"),
        }
    }

    #[test]
    fn impact_bonus_only_while_swaying() {
        let cfg = config();
        let velocity = Vec2::new(4.0, 0.0);
        let plain = impact_impulse(velocity, false, 5.0, &cfg);
        assert_eq!(plain, velocity);
        let boosted = impact_impulse(velocity, true, 5.0, &cfg);
        assert!(boosted.length() > velocity.length());
        // Bonus lies along the velocity direction.
        assert_eq!(boosted.y, 0.0);
    }
}
