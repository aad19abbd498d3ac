//! Simulation engine - composition root and fixed-order tick.
//!
//! Owns every service (world, player rig, pool, strap registry, sensor hub)
//! and advances them once per physics tick in a fixed order: sensors →
//! calibration → player → knockdown timers → crowd separation → body
//! integration. Impacts are applied via direct calls, never queued, so
//! running the player before NPC reactions is safe.
//!
//! Collision detection is a collaborator's concern: contacts are reported
//! in through [`SimulationEngine::player_hits`],
//! [`SimulationEngine::projectile_hits`] and
//! [`SimulationEngine::player_ground_contact`].

use hecs::{Entity, World};

use straphanger_logic::calibration::{CalibrationResult, CalibrationSession};
use straphanger_logic::config::TuningConfig;
use straphanger_logic::reaction::{NpcKind, ReactionOutcome};
use straphanger_logic::vec2::Vec2;

use crate::components::{Body, Projectile};
use crate::input::SensorHub;
use crate::npc;
use crate::player::PlayerRig;
use crate::pool::NpcPool;
use crate::stage::{ProjectileInstigator, Stage};
use crate::straps::StrapRegistry;

/// The simulation core. Everything is injected/constructed here; there are
/// no global managers.
pub struct SimulationEngine<S: Stage> {
    pub world: World,
    pub player: PlayerRig,
    pub pool: NpcPool,
    pub straps: StrapRegistry,
    pub sensors: SensorHub,
    pub stage: S,
    config: TuningConfig,
    sim_time: f64,
    /// Per-channel calibration sessions while a calibration runs.
    calibration: Option<Vec<CalibrationSession>>,
}

impl<S: Stage> SimulationEngine<S> {
    pub fn new(config: TuningConfig, stage: S) -> Self {
        let mut world = World::new();
        let mut pool = NpcPool::new();
        pool.prewarm(&mut world, NpcKind::Normal, config.pool.normal_capacity);
        pool.prewarm(&mut world, NpcKind::Heavy, config.pool.heavy_capacity);
        pool.prewarm(&mut world, NpcKind::Suitcase, config.pool.suitcase_capacity);
        pool.prewarm(&mut world, NpcKind::Battery, config.pool.battery_capacity);

        Self {
            sensors: SensorHub::new(&config.sensor, config.grip.clone()),
            player: PlayerRig::new(config.sway.clone()),
            world,
            pool,
            straps: StrapRegistry::new(),
            stage,
            config,
            sim_time: 0.0,
            calibration: None,
        }
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// Start a calibration session on every channel. Grip input stays
    /// disabled until it completes (or until values are injected).
    pub fn begin_calibration(&mut self) {
        let sessions = (0..self.sensors.channel_count())
            .map(|_| CalibrationSession::new(self.config.calibration.clone()))
            .collect();
        self.calibration = Some(sessions);
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn is_calibrated(&self) -> bool {
        self.sensors.is_calibrated()
    }

    /// Inject calibration directly (e.g. from a saved session), completing
    /// any running calibration.
    pub fn set_calibration_values(&mut self, ranges: Vec<CalibrationResult>) {
        self.sensors.set_calibration_values(ranges);
        self.calibration = None;
    }

    /// Advance one fixed physics tick.
    pub fn tick(&mut self, dt: f32) {
        self.sim_time += f64::from(dt);

        let frame = self.sensors.tick(dt);

        if let Some(sessions) = &mut self.calibration {
            let smoothed = self.sensors.smoothed();
            for (session, &value) in sessions.iter_mut().zip(smoothed) {
                session.advance(value, dt);
            }
            if sessions.iter().all(CalibrationSession::is_complete) {
                let ranges: Vec<CalibrationResult> =
                    sessions.iter().filter_map(CalibrationSession::result).collect();
                self.sensors.set_calibration_values(ranges);
                self.calibration = None;
            }
        }

        // Player before NPCs: impacts are direct calls, not queued.
        self.player
            .handle_grip(frame.edges, &self.straps, self.sim_time);
        let inertia = self.stage.ambient_inertia();
        self.player.tick(frame.tilt, inertia, dt, self.sim_time);

        npc::update_knockdowns(&mut self.world, &mut self.pool, self.sim_time);
        npc::apply_separation(&mut self.world, &self.config.separation, dt);
        npc::integrate_bodies(&mut self.world, dt);
    }

    // ── External contact reports ────────────────────────────────────────

    /// The player's body touched a passenger.
    pub fn player_hits(&mut self, passenger: Entity) -> ReactionOutcome {
        let impulse = self.player.contact_impulse();
        npc::take_impact(
            &mut self.world,
            &mut self.stage,
            &self.config.reaction,
            passenger,
            impulse,
            &mut self.player,
            self.sim_time,
        )
    }

    /// A flying case touched a passenger. The case is consumed by a
    /// delivered hit, unless a guard swats it back with a counter-shove;
    /// contact with its own carrier is ignored.
    pub fn projectile_hits(&mut self, projectile: Entity, passenger: Entity) -> ReactionOutcome {
        let (position, velocity, carrier) = {
            let Ok(proj) = self.world.get::<&Projectile>(projectile) else {
                log::error!("projectile contact from non-projectile {:?}", projectile);
                return ReactionOutcome::Ignored;
            };
            let Ok(body) = self.world.get::<&Body>(projectile) else {
                return ReactionOutcome::Ignored;
            };
            (body.position, body.velocity, proj.carrier)
        };

        if passenger == carrier {
            return ReactionOutcome::Ignored;
        }

        let mut instigator = ProjectileInstigator {
            position,
            counter: Vec2::ZERO,
        };
        let outcome = npc::take_impact(
            &mut self.world,
            &mut self.stage,
            &self.config.reaction,
            passenger,
            velocity,
            &mut instigator,
            self.sim_time,
        );
        if instigator.counter != Vec2::ZERO {
            // Guard-and-reflect: the case keeps flying, deflected.
            if let Ok(mut body) = self.world.get::<&mut Body>(projectile) {
                body.apply_impulse(instigator.counter);
            }
        } else if outcome != ReactionOutcome::Ignored {
            let _ = self.world.despawn(projectile);
        }
        outcome
    }

    /// The player's body touched the floor.
    pub fn player_ground_contact(&mut self) {
        self.player.ground_contact();
    }

    // ── Spawner contract ────────────────────────────────────────────────

    /// Place a pooled passenger at `position`. `None` for an unregistered
    /// kind (configuration defect).
    pub fn spawn_passenger(&mut self, kind: NpcKind, position: Vec2) -> Option<Entity> {
        let entity = self.pool.get(&mut self.world, kind)?;
        if let Ok(mut body) = self.world.get::<&mut Body>(entity) {
            body.position = position;
        }
        Some(entity)
    }
}
