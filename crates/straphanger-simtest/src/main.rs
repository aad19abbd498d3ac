//! Straphanger Headless Simulation Harness
//!
//! Validates pure game logic and the shipped tuning data without a renderer
//! or sensor hardware. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p straphanger-simtest
//!   cargo run -p straphanger-simtest -- --verbose

use straphanger_core::engine::SimulationEngine;
use straphanger_core::input::RawFrame;
use straphanger_core::player::PlayerState;
use straphanger_core::stage::RecordingStage;
use straphanger_logic::calibration::{CalibrationResult, CalibrationSession};
use straphanger_logic::config::TuningConfig;
use straphanger_logic::grip::GripDebouncer;
use straphanger_logic::reaction::{decide, NpcKind, ReactionOutcome};
use straphanger_logic::sway::{accumulate_power, release_outcome, ReleaseOutcome};
use straphanger_logic::vec2::Vec2;

const DT: f32 = 1.0 / 60.0;

// ── Shipped tuning (same JSON a front-end would load) ───────────────────
const TUNING_JSON: &str = include_str!("../../../data/tuning.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Straphanger Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Tuning data validation
    let config = match validate_tuning(&mut results) {
        Some(c) => c,
        None => {
            report(&results, verbose);
            std::process::exit(1);
        }
    };

    // 2. Calibration session sweep
    results.extend(validate_calibration(&config));

    // 3. Grip debouncing
    results.extend(validate_grip(&config));

    // 4. Sway power and release
    results.extend(validate_sway(&config));

    // 5. Reaction policy sweep
    results.extend(validate_reactions(&config));

    // 6. Full engine session
    results.extend(validate_engine_session(&config));

    report(&results, verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Tuning data ──────────────────────────────────────────────────────

fn validate_tuning(results: &mut Vec<TestResult>) -> Option<TuningConfig> {
    println!("--- Tuning Data ---");

    let config: TuningConfig = match serde_json::from_str(TUNING_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(check(
                "tuning_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return None;
        }
    };

    results.push(check(
        "tuning_channels",
        (1..=2).contains(&config.sensor.channels),
        format!("{} grip channels", config.sensor.channels),
    ));
    results.push(check(
        "tuning_smoothing_range",
        config.sensor.smoothing_factor > 0.0 && config.sensor.smoothing_factor <= 1.0,
        format!("smoothing factor {}", config.sensor.smoothing_factor),
    ));
    results.push(check(
        "tuning_thresholds_ordered",
        config.reaction.thresholds.sat < config.reaction.thresholds.fallen,
        format!(
            "sat {} < fallen {}",
            config.reaction.thresholds.sat, config.reaction.thresholds.fallen
        ),
    ));
    results.push(check(
        "tuning_launch_reachable",
        config.sway.min_launch_power <= config.sway.max_sway_power,
        format!(
            "min launch {} within cap {}",
            config.sway.min_launch_power, config.sway.max_sway_power
        ),
    ));
    results.push(check(
        "tuning_grace_positive",
        config.grip.release_grace_period > 0.0,
        format!("release grace {}s", config.grip.release_grace_period),
    ));
    results.push(check(
        "tuning_pool_nonempty",
        config.pool.normal_capacity > 0,
        format!("{} pre-warmed normals", config.pool.normal_capacity),
    ));

    Some(config)
}

// ── 2. Calibration ──────────────────────────────────────────────────────

fn validate_calibration(config: &TuningConfig) -> Vec<TestResult> {
    println!("--- Calibration ---");
    let mut results = Vec::new();
    let ticks_per_phase = (config.calibration.measure_duration / DT).ceil() as u32 + 1;

    // Clean two-phase run. The result arrives on the completing tick only.
    let mut session = CalibrationSession::new(config.calibration.clone());
    let mut outcome = None;
    for _ in 0..ticks_per_phase {
        session.advance(50.0, DT);
    }
    for _ in 0..ticks_per_phase {
        if let Some(r) = session.advance(950.0, DT) {
            outcome = Some(r);
        }
    }
    results.push(check(
        "calibration_clean_run",
        matches!(
            outcome,
            Some(CalibrationResult {
                released_average,
                gripped_average,
            }) if (released_average - 50.0).abs() < 1.0
                && (gripped_average - 950.0).abs() < 1.0
        ),
        format!("{:?}", outcome),
    ));

    // Interrupted hold: the measurement restarts, so completion needs a
    // second uninterrupted window.
    let mut session = CalibrationSession::new(config.calibration.clone());
    for _ in 0..ticks_per_phase - 2 {
        session.advance(50.0, DT);
    }
    session.advance(800.0, DT); // squeeze mid-measurement
    let mut completed_early = false;
    for _ in 0..ticks_per_phase - 2 {
        completed_early |= session.advance(50.0, DT).is_some();
    }
    results.push(check(
        "calibration_restarts_on_break",
        !completed_early && !session.is_complete(),
        "interrupted window measured again from zero".into(),
    ));

    // Near-equal levels straddling the provisional threshold: the session
    // synthesizes a usable range rather than rejecting.
    let split = config.calibration.provisional_threshold;
    let mut session = CalibrationSession::new(config.calibration.clone());
    let mut outcome = None;
    for _ in 0..ticks_per_phase {
        session.advance(split - 12.0, DT);
    }
    for _ in 0..ticks_per_phase {
        if let Some(r) = session.advance(split + 8.0, DT) {
            outcome = Some(r);
        }
    }
    let margin_ok = outcome.map_or(false, |r| {
        r.gripped_average - r.released_average
            >= config.calibration.fallback_margin - 0.01
    });
    results.push(check(
        "calibration_failsafe_separation",
        margin_ok,
        format!("{:?}", outcome),
    ));

    results
}

// ── 3. Grip debouncing ──────────────────────────────────────────────────

fn validate_grip(config: &TuningConfig) -> Vec<TestResult> {
    println!("--- Grip Debouncing ---");
    let mut results = Vec::new();
    let ranges: Vec<CalibrationResult> = (0..config.sensor.channels)
        .map(|_| CalibrationResult {
            released_average: 50.0,
            gripped_average: 950.0,
        })
        .collect();
    let high = vec![900.0; config.sensor.channels];
    let low = vec![60.0; config.sensor.channels];

    let mut debouncer = GripDebouncer::new(config.grip.clone());
    let edges = debouncer.update(&high, DT);
    results.push(check(
        "grip_inactive_without_calibration",
        !edges.pressed && !edges.active,
        "uncalibrated squeeze produced no edge".into(),
    ));

    debouncer.set_calibration(ranges);
    let edges = debouncer.update(&high, DT);
    results.push(check(
        "grip_pressed_edge",
        edges.pressed && edges.active,
        "calibrated squeeze fired a pressed edge".into(),
    ));

    // A dropout shorter than the grace period is held.
    let dropout_ticks = (config.grip.release_grace_period / DT / 2.0).ceil() as u32;
    let mut dropped = false;
    for _ in 0..dropout_ticks {
        dropped |= debouncer.update(&low, DT).released;
    }
    let edges = debouncer.update(&high, DT);
    results.push(check(
        "grip_grace_holds_dropout",
        !dropped && edges.active && !edges.pressed,
        format!("{} low ticks survived, no re-press", dropout_ticks),
    ));

    // A sustained release crosses the grace period exactly once.
    let release_ticks = (config.grip.release_grace_period / DT).ceil() as u32 + 2;
    let mut released_edges = 0;
    for _ in 0..release_ticks {
        if debouncer.update(&low, DT).released {
            released_edges += 1;
        }
    }
    results.push(check(
        "grip_release_after_grace",
        released_edges == 1,
        format!("{} released edge(s)", released_edges),
    ));

    results
}

// ── 4. Sway power ───────────────────────────────────────────────────────

fn validate_sway(config: &TuningConfig) -> Vec<TestResult> {
    println!("--- Sway Power ---");
    let mut results = Vec::new();
    let sway = &config.sway;

    // Pumping in phase accumulates; capped at the maximum.
    let mut power = 0.0;
    let fast_swing = sway.swing_velocity_threshold * 10.0;
    for _ in 0..3600 {
        power = accumulate_power(power, 1.0, fast_swing, DT, sway);
    }
    results.push(check(
        "sway_power_caps",
        (power - sway.max_sway_power).abs() < 1e-3,
        format!("power settled at {}", power),
    ));

    // Out-of-phase drive decays linearly toward zero.
    let mut decayed = power;
    for _ in 0..3600 {
        decayed = accumulate_power(decayed, -1.0, fast_swing, DT, sway);
    }
    results.push(check(
        "sway_power_decays",
        decayed == 0.0,
        format!("power decayed to {}", decayed),
    ));

    // Release below the launch threshold drops; at threshold it launches.
    let weak = release_outcome(
        sway.min_launch_power - 0.01,
        Vec2::new(1.0, 0.0),
        false,
        1,
        sway,
    );
    let strong = release_outcome(sway.min_launch_power, Vec2::new(1.0, 0.0), false, 1, sway);
    results.push(check(
        "sway_release_threshold",
        matches!(weak, ReleaseOutcome::Drop { .. })
            && matches!(strong, ReleaseOutcome::Launch { .. }),
        format!("weak={:?} strong={:?}", weak, strong),
    ));

    // Launching with no linear velocity still goes somewhere (straight up).
    let stalled = release_outcome(sway.max_sway_power, Vec2::ZERO, false, 1, sway);
    results.push(check(
        "sway_stalled_launch_goes_up",
        matches!(stalled, ReleaseOutcome::Launch { impulse, .. } if impulse.y > 0.0),
        format!("{:?}", stalled),
    ));

    results
}

// ── 5. Reaction policy ──────────────────────────────────────────────────

fn validate_reactions(config: &TuningConfig) -> Vec<TestResult> {
    println!("--- Reaction Policy ---");
    let mut results = Vec::new();
    let reaction = &config.reaction;
    let toward = Some(Vec2::new(-1.0, 0.0));

    let hit = |kind, magnitude: f32| {
        decide(
            kind,
            false,
            false,
            Vec2::new(magnitude, 0.0),
            toward,
            reaction,
        )
    };

    // Normal passengers walk the ladder: absorb, sit, fall.
    let ladder_ok = hit(NpcKind::Normal, reaction.thresholds.sat - 0.1).outcome
        == ReactionOutcome::Absorbed
        && hit(NpcKind::Normal, reaction.thresholds.sat + 0.1).outcome == ReactionOutcome::Sat
        && hit(NpcKind::Normal, reaction.thresholds.fallen + 0.1).outcome
            == ReactionOutcome::Fallen;
    results.push(check(
        "reaction_normal_ladder",
        ladder_ok,
        "absorb < sat < fallen ladder holds".into(),
    ));

    // Heavy guard: below the resistance threshold nothing budges them and
    // the instigator eats a counter-shove.
    let guarded = hit(NpcKind::Heavy, reaction.heavy.resistance_threshold - 0.1);
    let broken = hit(
        NpcKind::Heavy,
        reaction.thresholds.fallen * reaction.heavy.break_guard_multiplier
            + reaction.heavy.resistance_threshold,
    );
    results.push(check(
        "reaction_heavy_guard",
        guarded.outcome == ReactionOutcome::Absorbed
            && guarded.counter_impulse.is_some()
            && broken.outcome == ReactionOutcome::Fallen,
        format!("guarded={:?} broken={:?}", guarded.outcome, broken.outcome),
    ));

    // Suitcase carriers shed the case on any delivered hit.
    let carrier = hit(NpcKind::Suitcase, 1.0);
    results.push(check(
        "reaction_suitcase_detaches",
        carrier.detach_prop,
        "case detached on first delivered hit".into(),
    ));

    // Battery grants exactly once per activation cycle.
    let fresh = hit(NpcKind::Battery, 1.0);
    let spent = decide(
        NpcKind::Battery,
        false,
        true,
        Vec2::new(1.0, 0.0),
        toward,
        reaction,
    );
    results.push(check(
        "reaction_battery_single_grant",
        fresh.grant_battery && !spent.grant_battery,
        "grant flag honored".into(),
    ));

    // Knocked-down passengers are immune to everything.
    let ignored = decide(
        NpcKind::Normal,
        true,
        false,
        Vec2::new(100.0, 0.0),
        toward,
        reaction,
    );
    results.push(check(
        "reaction_knockdown_immunity",
        ignored.outcome == ReactionOutcome::Ignored && ignored.body_impulse == Vec2::ZERO,
        "downed passenger ignored a massive hit".into(),
    ));

    results
}

// ── 6. Engine session ───────────────────────────────────────────────────

fn validate_engine_session(config: &TuningConfig) -> Vec<TestResult> {
    println!("--- Engine Session ---");
    let mut results = Vec::new();

    let mut session_config = config.clone();
    session_config.sensor.channels = 1;
    session_config.sensor.smoothing_factor = 1.0;
    let mut engine = SimulationEngine::new(session_config, RecordingStage::default());
    engine.straps.register(Vec2::new(0.0, 1.0));
    let victim = match engine.spawn_passenger(NpcKind::Normal, Vec2::new(2.0, 0.0)) {
        Some(e) => e,
        None => {
            results.push(check(
                "engine_spawn",
                false,
                "pool refused a normal passenger".into(),
            ));
            return results;
        }
    };
    let pooled_before = engine.pool.pooled_count(NpcKind::Normal);

    let grip = |value: i32| RawFrame {
        grip: [value, 0],
        accel_horizontal: 0.0,
        accel_vertical: 1.0,
    };
    let run = |engine: &mut SimulationEngine<RecordingStage>, seconds: f32| {
        for _ in 0..(seconds / DT).ceil() as u32 {
            engine.tick(DT);
        }
    };

    // Calibrate both phases, then hold the squeeze.
    engine.begin_calibration();
    let phase = engine.config().calibration.measure_duration + 0.2;
    engine.sensors.raw().publish(&grip(50));
    run(&mut engine, phase);
    engine.sensors.raw().publish(&grip(950));
    run(&mut engine, phase);
    results.push(check(
        "engine_calibrates",
        engine.is_calibrated(),
        "two-phase session completed".into(),
    ));

    run(&mut engine, 1.0);
    results.push(check(
        "engine_grab_to_sway",
        engine.player.state == PlayerState::Swaying,
        format!("player state {:?}", engine.player.state),
    ));

    // Pump, then let go.
    engine.sensors.set_debug_axis(Some(1.0));
    run(&mut engine, 3.0);
    let banked = engine.player.sway_power;
    engine.sensors.raw().publish(&grip(50));
    run(&mut engine, 1.0);
    results.push(check(
        "engine_launches",
        engine.player.state == PlayerState::Launched
            && banked >= engine.config().sway.min_launch_power,
        format!("banked {} power, state {:?}", banked, engine.player.state),
    ));

    // Mid-flight contact defeats the victim exactly once.
    let first = engine.player_hits(victim);
    let second = engine.player_hits(victim);
    results.push(check(
        "engine_defeat_once",
        first == ReactionOutcome::Fallen
            && second == ReactionOutcome::Ignored
            && engine.stage.defeats == 1
            && engine.stage.score_increments == 1,
        format!("first={:?} second={:?}", first, second),
    ));

    // Land, fade, recycle.
    engine.player_ground_contact();
    let fade = engine.config().reaction.time_before_fade
        + engine.config().reaction.fade_duration
        + 0.2;
    run(&mut engine, fade);
    results.push(check(
        "engine_pool_recycles",
        !engine.pool.is_active(victim)
            && engine.pool.pooled_count(NpcKind::Normal) == pooled_before + 1,
        format!(
            "{} normals pooled after fade",
            engine.pool.pooled_count(NpcKind::Normal)
        ),
    ));
    results.push(check(
        "engine_player_lands",
        engine.player.state == PlayerState::Idle && engine.player.is_grounded(),
        format!("player state {:?}", engine.player.state),
    ));

    results
}
