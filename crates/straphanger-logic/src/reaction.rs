//! NPC impact reactions.
//!
//! Every passenger kind shares one contract: an impact either knocks them
//! flat (defeat, fade out, back to the pool), sits them down (timed
//! recovery), or is absorbed. Kind-specific behavior is a policy branch over
//! a tagged variant rather than an override hierarchy — each policy returns
//! a [`ReactionDecision`] describing exactly what the engine must do, so no
//! policy can forget to delegate.
//!
//! Policies:
//! - `Normal`: base thresholds only.
//! - `Heavy`: guards below a resistance threshold (flinch + counter-shove
//!   toward the attacker, no knockdown); above it the guard breaks and the
//!   amplified impulse goes through the base logic.
//! - `Suitcase`: any impact that lands while standing knocks the carried
//!   case loose as a free projectile; the carrier then reacts normally.
//! - `Battery`: grants its battery to a capable attacker once per
//!   activation cycle, then reacts normally.

use serde::{Deserialize, Serialize};

use crate::vec2::Vec2;

/// Passenger variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcKind {
    Normal,
    Heavy,
    Suitcase,
    Battery,
}

impl NpcKind {
    pub const ALL: [NpcKind; 4] = [
        NpcKind::Normal,
        NpcKind::Heavy,
        NpcKind::Suitcase,
        NpcKind::Battery,
    ];
}

/// Impact magnitude thresholds for the base reaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReactionThresholds {
    /// Above this the passenger sits down (timed recovery).
    pub sat: f32,
    /// Above this the passenger is defeated (fade out, pool return).
    pub fallen: f32,
}

/// Heavy-kind guard tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeavyTuning {
    /// Impacts below this are guarded instead of forwarded to base logic.
    pub resistance_threshold: f32,
    /// Counter-impulse toward the attacker, per unit of incoming impulse.
    pub bounce_back_multiplier: f32,
    /// Impulse amplification once the guard breaks.
    pub break_guard_multiplier: f32,
    /// Magnitude of the guard's own flinch.
    pub flinch_force: f32,
}

/// Suitcase-kind prop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuitcaseTuning {
    /// |impulse.x| below this counts as near-vertical; launch direction is
    /// then up to the caller (randomized by the engine).
    pub vertical_epsilon: f32,
    /// Initial speed of the detached case.
    pub prop_speed: f32,
}

/// Reaction timing and crowd tuning shared by all kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub thresholds: ReactionThresholds,
    pub heavy: HeavyTuning,
    pub suitcase: SuitcaseTuning,
    /// Seconds a defeated passenger lies still before fading.
    pub time_before_fade: f32,
    /// Seconds of linear opacity decay before pool return.
    pub fade_duration: f32,
    /// Seconds a sat passenger takes to stand back up.
    pub recovery_time: f32,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            thresholds: ReactionThresholds {
                sat: 3.0,
                fallen: 7.0,
            },
            heavy: HeavyTuning {
                resistance_threshold: 9.0,
                bounce_back_multiplier: 0.5,
                break_guard_multiplier: 1.5,
                flinch_force: 0.5,
            },
            suitcase: SuitcaseTuning {
                vertical_epsilon: 0.05,
                prop_speed: 4.0,
            },
            time_before_fade: 1.0,
            fade_duration: 0.75,
            recovery_time: 2.0,
        }
    }
}

/// Game-logic outcome of an impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Already knocked down: the impact does nothing at all.
    Ignored,
    /// Below every threshold (or guarded): no state change.
    Absorbed,
    /// Knocked down, recovers after `recovery_time`.
    Sat,
    /// Defeated: fade-then-despawn, defeat notification, pool return.
    Fallen,
}

/// Everything the engine must apply for one impact.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionDecision {
    /// Impulse to apply to the passenger's body (amplified for a broken
    /// guard, zero when ignored).
    pub body_impulse: Vec2,
    pub outcome: ReactionOutcome,
    /// Heavy guard: shove to apply to the attacker's body, if it has one.
    pub counter_impulse: Option<Vec2>,
    /// Suitcase: detach the carried case as a projectile.
    pub detach_prop: bool,
    /// Battery: offer the battery to the attacker's equip capability.
    pub grant_battery: bool,
}

/// Base threshold branch shared by every kind.
fn base_outcome(magnitude: f32, thresholds: &ReactionThresholds) -> ReactionOutcome {
    if magnitude > thresholds.fallen {
        ReactionOutcome::Fallen
    } else if magnitude > thresholds.sat {
        ReactionOutcome::Sat
    } else {
        ReactionOutcome::Absorbed
    }
}

/// Resolve an impact against a passenger.
///
/// * `knocked_down` — passenger is already in its knockdown state; the
///   impact is ignored entirely (checked precondition, not an error).
/// * `battery_granted` — the battery was already handed out this
///   activation cycle (duplicate grants are suppressed).
/// * `toward_instigator` — unit vector from the passenger to the attacker,
///   `None` when the attacker has no physical body.
pub fn decide(
    kind: NpcKind,
    knocked_down: bool,
    battery_granted: bool,
    impulse: Vec2,
    toward_instigator: Option<Vec2>,
    config: &ReactionConfig,
) -> ReactionDecision {
    if knocked_down {
        return ReactionDecision {
            body_impulse: Vec2::ZERO,
            outcome: ReactionOutcome::Ignored,
            counter_impulse: None,
            detach_prop: false,
            grant_battery: false,
        };
    }

    let magnitude = impulse.length();

    match kind {
        NpcKind::Normal => ReactionDecision {
            body_impulse: impulse,
            outcome: base_outcome(magnitude, &config.thresholds),
            counter_impulse: None,
            detach_prop: false,
            grant_battery: false,
        },
        NpcKind::Heavy => {
            if magnitude < config.heavy.resistance_threshold {
                // Guard holds: flinch, shove the attacker back, skip base.
                ReactionDecision {
                    body_impulse: impulse.normalize() * config.heavy.flinch_force,
                    outcome: ReactionOutcome::Absorbed,
                    counter_impulse: toward_instigator
                        .map(|dir| dir * (magnitude * config.heavy.bounce_back_multiplier)),
                    detach_prop: false,
                    grant_battery: false,
                }
            } else {
                // Guard break: amplified impulse through base logic.
                let amplified = impulse * config.heavy.break_guard_multiplier;
                ReactionDecision {
                    body_impulse: amplified,
                    outcome: base_outcome(amplified.length(), &config.thresholds),
                    counter_impulse: None,
                    detach_prop: false,
                    grant_battery: false,
                }
            }
        }
        NpcKind::Suitcase => ReactionDecision {
            body_impulse: impulse,
            outcome: base_outcome(magnitude, &config.thresholds),
            counter_impulse: None,
            // The case always comes loose, however light the hit.
            detach_prop: true,
            grant_battery: false,
        },
        NpcKind::Battery => ReactionDecision {
            body_impulse: impulse,
            outcome: base_outcome(magnitude, &config.thresholds),
            counter_impulse: None,
            detach_prop: false,
            grant_battery: !battery_granted,
        },
    }
}

/// Horizontal launch sign for a detached case: follows the impulse when it
/// has a clear horizontal component, otherwise the caller-supplied fallback
/// (randomized by the engine for near-vertical hits).
pub fn prop_launch_sign(impulse: Vec2, fallback_sign: f32, tuning: &SuitcaseTuning) -> f32 {
    if impulse.x.abs() < tuning.vertical_epsilon {
        fallback_sign.signum()
    } else {
        impulse.x.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReactionConfig {
        ReactionConfig::default()
    }

    fn hit(kind: NpcKind, impulse: Vec2) -> ReactionDecision {
        decide(kind, false, false, impulse, Some(Vec2::new(-1.0, 0.0)), &config())
    }

    #[test]
    fn base_thresholds() {
        let cfg = config();
        assert_eq!(
            hit(NpcKind::Normal, Vec2::new(cfg.thresholds.fallen + 0.1, 0.0)).outcome,
            ReactionOutcome::Fallen
        );
        assert_eq!(
            hit(NpcKind::Normal, Vec2::new(cfg.thresholds.sat + 0.1, 0.0)).outcome,
            ReactionOutcome::Sat
        );
        assert_eq!(
            hit(NpcKind::Normal, Vec2::new(cfg.thresholds.sat - 0.1, 0.0)).outcome,
            ReactionOutcome::Absorbed
        );
    }

    #[test]
    fn knocked_down_ignores_everything() {
        let d = decide(
            NpcKind::Normal,
            true,
            false,
            Vec2::new(100.0, 0.0),
            None,
            &config(),
        );
        assert_eq!(d.outcome, ReactionOutcome::Ignored);
        assert_eq!(d.body_impulse, Vec2::ZERO);
        // Even a suitcase keeps its case while down.
        let d = decide(
            NpcKind::Suitcase,
            true,
            false,
            Vec2::new(100.0, 0.0),
            None,
            &config(),
        );
        assert!(!d.detach_prop);
    }

    #[test]
    fn heavy_guard_below_resistance() {
        let cfg = config();
        let eps = 1e-3;
        let d = hit(
            NpcKind::Heavy,
            Vec2::new(cfg.heavy.resistance_threshold - eps, 0.0),
        );
        assert_eq!(d.outcome, ReactionOutcome::Absorbed);
        // Flinch is small, counter goes toward the attacker.
        assert!((d.body_impulse.length() - cfg.heavy.flinch_force).abs() < 1e-4);
        let counter = d.counter_impulse.expect("guard counters");
        assert!(counter.x < 0.0);
        let expected =
            (cfg.heavy.resistance_threshold - eps) * cfg.heavy.bounce_back_multiplier;
        assert!((counter.length() - expected).abs() < 1e-3);
    }

    #[test]
    fn heavy_guard_break_at_resistance() {
        let cfg = config();
        let d = hit(
            NpcKind::Heavy,
            Vec2::new(cfg.heavy.resistance_threshold, 0.0),
        );
        // 9.0 * 1.5 = 13.5 > fallen threshold.
        assert_eq!(d.outcome, ReactionOutcome::Fallen);
        assert!(
            (d.body_impulse.length()
                - cfg.heavy.resistance_threshold * cfg.heavy.break_guard_multiplier)
                .abs()
                < 1e-3
        );
        assert!(d.counter_impulse.is_none());
    }

    #[test]
    fn heavy_counter_skipped_without_instigator_body() {
        let d = decide(
            NpcKind::Heavy,
            false,
            false,
            Vec2::new(1.0, 0.0),
            None,
            &config(),
        );
        assert!(d.counter_impulse.is_none());
        assert_eq!(d.outcome, ReactionOutcome::Absorbed);
    }

    #[test]
    fn suitcase_detaches_even_on_absorbed_hit() {
        let d = hit(NpcKind::Suitcase, Vec2::new(0.5, 0.0));
        assert_eq!(d.outcome, ReactionOutcome::Absorbed);
        assert!(d.detach_prop);
    }

    #[test]
    fn suitcase_reacts_with_original_impulse() {
        let cfg = config();
        let impulse = Vec2::new(cfg.thresholds.fallen + 1.0, 0.0);
        let d = hit(NpcKind::Suitcase, impulse);
        assert_eq!(d.body_impulse, impulse);
        assert_eq!(d.outcome, ReactionOutcome::Fallen);
        assert!(d.detach_prop);
    }

    #[test]
    fn battery_grants_once() {
        let d = decide(
            NpcKind::Battery,
            false,
            false,
            Vec2::new(1.0, 0.0),
            None,
            &config(),
        );
        assert!(d.grant_battery);
        let d = decide(
            NpcKind::Battery,
            false,
            true,
            Vec2::new(1.0, 0.0),
            None,
            &config(),
        );
        assert!(!d.grant_battery);
    }

    #[test]
    fn prop_sign_follows_horizontal_impulse() {
        let tuning = config().suitcase;
        assert_eq!(prop_launch_sign(Vec2::new(3.0, 1.0), -1.0, &tuning), 1.0);
        assert_eq!(prop_launch_sign(Vec2::new(-3.0, 1.0), 1.0, &tuning), -1.0);
        // Near-vertical: fallback decides.
        assert_eq!(prop_launch_sign(Vec2::new(0.01, 9.0), -1.0, &tuning), -1.0);
    }
}
