//! NPC impact handling, knockdown timers, and crowd behavior.
//!
//! `take_impact` is the public entry point for every impact source (player
//! swing or flying case). It asks the pure reaction policy what to do, then
//! applies the decision: body impulses, counter-shoves, battery grants,
//! case detachment, and the knockdown sub-sequences. Timed sequences are
//! deadline fields resolved by [`update_knockdowns`] each tick.

use hecs::{Entity, World};
use rand::Rng;

use straphanger_logic::reaction::{decide, prop_launch_sign, ReactionConfig, ReactionOutcome};
use straphanger_logic::separation::{separation_force, SeparationConfig};
use straphanger_logic::vec2::Vec2;

use crate::components::{
    Active, Body, Despawn, NpcState, Passenger, Pose, Presentation, Projectile, Reaction,
};
use crate::pool::NpcPool;
use crate::stage::{Instigator, Stage};

/// Horizontal drag on shoved passengers, per second.
const NPC_DRAG: f32 = 4.0;
const GRAVITY: f32 = 9.81;
/// Detached cases pop out slightly above the carrier.
const PROP_SPAWN_LIFT: f32 = 0.4;

/// Deliver one impact to a passenger. Returns the game-logic outcome.
///
/// Consumes the impact exactly once: a passenger already knocked down
/// ignores it entirely (no impulse, no notifications, no detach).
pub fn take_impact(
    world: &mut World,
    stage: &mut dyn Stage,
    config: &ReactionConfig,
    entity: Entity,
    impulse: Vec2,
    instigator: &mut dyn Instigator,
    now: f64,
) -> ReactionOutcome {
    let (kind, knocked_down, battery_granted, position) = {
        let Ok(passenger) = world.get::<&Passenger>(entity) else {
            log::error!("impact delivered to non-passenger {:?}", entity);
            return ReactionOutcome::Ignored;
        };
        let Ok(reaction) = world.get::<&Reaction>(entity) else {
            return ReactionOutcome::Ignored;
        };
        let position = world
            .get::<&Body>(entity)
            .map(|b| b.position)
            .unwrap_or_default();
        (
            passenger.kind,
            reaction.knocked_down(),
            reaction.battery_granted,
            position,
        )
    };

    let toward_instigator = instigator
        .body_position()
        .map(|p| (p - position).normalize());

    let decision = decide(
        kind,
        knocked_down,
        battery_granted,
        impulse,
        toward_instigator,
        config,
    );

    if decision.outcome == ReactionOutcome::Ignored {
        log::debug!("impact on knocked-down {:?} ignored", entity);
        return ReactionOutcome::Ignored;
    }

    if let Ok(mut body) = world.get::<&mut Body>(entity) {
        body.apply_impulse(decision.body_impulse);
    }

    if let Some(counter) = decision.counter_impulse {
        instigator.apply_counter_impulse(counter);
    }

    if decision.grant_battery && instigator.equip_battery() {
        // The grant is spent only when an instigator actually equips it; a
        // capability-less hit (e.g. a flying case) leaves it available.
        if let Ok(mut reaction) = world.get::<&mut Reaction>(entity) {
            reaction.battery_granted = true;
        }
        log::debug!("battery equipped from {:?}", entity);
    }

    if decision.detach_prop {
        detach_case(world, config, entity, position, impulse);
    }

    match decision.outcome {
        ReactionOutcome::Fallen => {
            stage.report_defeat();
            stage.report_score_increment();
            if let Ok(mut reaction) = world.get::<&mut Reaction>(entity) {
                reaction.state = NpcState::KnockedDown;
                reaction.despawn = Some(Despawn {
                    fade_at: now + f64::from(config.time_before_fade),
                    done_at: now
                        + f64::from(config.time_before_fade)
                        + f64::from(config.fade_duration),
                });
            }
            if let Ok(mut presentation) = world.get::<&mut Presentation>(entity) {
                presentation.pose = Pose::Fallen;
            }
        }
        ReactionOutcome::Sat => {
            if let Ok(mut reaction) = world.get::<&mut Reaction>(entity) {
                reaction.state = NpcState::KnockedDown;
                reaction.recovery_at = Some(now + f64::from(config.recovery_time));
            }
            if let Ok(mut presentation) = world.get::<&mut Presentation>(entity) {
                presentation.pose = Pose::Sat;
            }
        }
        ReactionOutcome::Absorbed | ReactionOutcome::Ignored => {}
    }

    decision.outcome
}

/// Knock the carried case loose as an independent projectile.
fn detach_case(
    world: &mut World,
    config: &ReactionConfig,
    carrier: Entity,
    carrier_position: Vec2,
    impulse: Vec2,
) {
    // Near-vertical hits launch in a random direction.
    let fallback = if rand::thread_rng().gen_bool(0.5) {
        1.0
    } else {
        -1.0
    };
    let sign = prop_launch_sign(impulse, fallback, &config.suitcase);
    let velocity = Vec2::new(sign * config.suitcase.prop_speed, 0.0);

    world.spawn((
        Body {
            position: carrier_position + Vec2::new(0.0, PROP_SPAWN_LIFT),
            velocity,
            angle: 0.0,
            angular_velocity: sign * 3.0,
        },
        Projectile {
            ignores_player: true,
            carrier,
        },
        Active,
    ));
}

/// Resolve knockdown deadlines: stand sat passengers back up, fade fallen
/// ones, and return fully faded ones to the pool.
pub fn update_knockdowns(world: &mut World, pool: &mut NpcPool, now: f64) {
    let mut recovered: Vec<Entity> = Vec::new();
    let mut fading: Vec<(Entity, Despawn)> = Vec::new();
    let mut finished: Vec<(Entity, straphanger_logic::reaction::NpcKind)> = Vec::new();

    for (entity, (reaction, passenger)) in world.query::<(&Reaction, &Passenger)>().iter() {
        if let Some(deadline) = reaction.recovery_at {
            if now >= deadline {
                recovered.push(entity);
            }
        }
        if let Some(despawn) = reaction.despawn {
            if now >= despawn.done_at {
                finished.push((entity, passenger.kind));
            } else if now >= despawn.fade_at {
                fading.push((entity, despawn));
            }
        }
    }

    for entity in recovered {
        if let Ok(mut reaction) = world.get::<&mut Reaction>(entity) {
            reaction.state = NpcState::Idle;
            reaction.recovery_at = None;
        }
        if let Ok(mut presentation) = world.get::<&mut Presentation>(entity) {
            presentation.pose = Pose::Standing;
        }
    }

    for (entity, despawn) in fading {
        if let Ok(mut presentation) = world.get::<&mut Presentation>(entity) {
            let span = (despawn.done_at - despawn.fade_at).max(f64::EPSILON);
            let progress = ((now - despawn.fade_at) / span).clamp(0.0, 1.0) as f32;
            presentation.opacity = 1.0 - progress;
        }
    }

    for (entity, kind) in finished {
        pool.return_to_pool(world, entity, kind);
    }
}

/// Personal-space repulsion for standing, active passengers.
pub fn apply_separation(world: &mut World, config: &SeparationConfig, dt: f32) {
    let standing: Vec<(Entity, Vec2)> = world
        .query::<(&Body, &Reaction)>()
        .with::<(&Passenger, &Active)>()
        .iter()
        .filter(|(_, (_, reaction))| reaction.state == NpcState::Idle)
        .map(|(entity, (body, _))| (entity, body.position))
        .collect();

    for (entity, position) in &standing {
        let neighbors: Vec<Vec2> = standing
            .iter()
            .filter(|(other, _)| other != entity)
            .map(|(_, p)| *p)
            .collect();
        let force = separation_force(*position, &neighbors, config);
        if let Ok(mut body) = world.get::<&mut Body>(*entity) {
            body.velocity += force * dt;
        }
    }
}

/// Integrate active bodies: drag for passengers, ballistics for cases.
pub fn integrate_bodies(world: &mut World, dt: f32) {
    // Passengers: shoves decay, feet stay on the floor.
    for (_, (body, _)) in world
        .query_mut::<(&mut Body, &Passenger)>()
        .with::<&Active>()
    {
        let pos = body.position + body.velocity * dt;
        body.position = pos;
        body.velocity = body.velocity * (1.0 - NPC_DRAG * dt).max(0.0);
        if body.position.y < 0.0 {
            body.position.y = 0.0;
            body.velocity.y = 0.0;
        }
    }

    // Cases: free flight.
    for (_, (body, _)) in world
        .query_mut::<(&mut Body, &Projectile)>()
        .with::<&Active>()
    {
        body.velocity.y -= GRAVITY * dt;
        let pos = body.position + body.velocity * dt;
        body.position = pos;
        let angle = body.angle + body.angular_velocity * dt;
        body.angle = angle;
    }
}

/// LOD hook: resume simulating this passenger.
pub fn activate(world: &mut World, entity: Entity) {
    let _ = world.insert_one(entity, Active);
}

/// LOD hook: stop simulating this passenger. Refused while knocked down —
/// a knockdown must finish its recovery or despawn sequence first.
pub fn try_deactivate(world: &mut World, entity: Entity) -> bool {
    let knocked_down = world
        .get::<&Reaction>(entity)
        .map(|r| r.knocked_down())
        .unwrap_or(false);
    if knocked_down {
        log::debug!("deactivate refused for knocked-down {:?}", entity);
        return false;
    }
    let _ = world.remove_one::<Active>(entity);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::RecordingStage;
    use straphanger_logic::reaction::NpcKind;

    struct NoBodyInstigator;

    impl Instigator for NoBodyInstigator {
        fn body_position(&self) -> Option<Vec2> {
            None
        }
        fn apply_counter_impulse(&mut self, _impulse: Vec2) {}
    }

    struct EquippingInstigator {
        position: Vec2,
        batteries: u32,
        counters: Vec<Vec2>,
    }

    impl EquippingInstigator {
        fn new() -> Self {
            Self {
                position: Vec2::new(-1.0, 0.0),
                batteries: 0,
                counters: Vec::new(),
            }
        }
    }

    impl Instigator for EquippingInstigator {
        fn body_position(&self) -> Option<Vec2> {
            Some(self.position)
        }
        fn apply_counter_impulse(&mut self, impulse: Vec2) {
            self.counters.push(impulse);
        }
        fn equip_battery(&mut self) -> bool {
            self.batteries += 1;
            true
        }
    }

    fn setup(kind: NpcKind) -> (World, NpcPool, Entity) {
        let mut world = World::new();
        let mut pool = NpcPool::new();
        pool.register(kind);
        let entity = pool.get(&mut world, kind).unwrap();
        (world, pool, entity)
    }

    fn fallen_impulse(config: &ReactionConfig) -> Vec2 {
        Vec2::new(config.thresholds.fallen + 1.0, 0.0)
    }

    #[test]
    fn knockdown_is_idempotent_within_a_tick() {
        let config = ReactionConfig::default();
        let (mut world, _pool, entity) = setup(NpcKind::Normal);
        let mut stage = RecordingStage::default();
        let mut instigator = EquippingInstigator::new();

        let impulse = fallen_impulse(&config);
        let first = take_impact(
            &mut world, &mut stage, &config, entity, impulse, &mut instigator, 0.0,
        );
        let second = take_impact(
            &mut world, &mut stage, &config, entity, impulse, &mut instigator, 0.0,
        );

        assert_eq!(first, ReactionOutcome::Fallen);
        assert_eq!(second, ReactionOutcome::Ignored);
        // Exactly one defeat notification and one despawn sequence.
        assert_eq!(stage.defeats, 1);
        let reaction = world.get::<&Reaction>(entity).unwrap();
        assert!(reaction.despawn.is_some());
    }

    #[test]
    fn sat_recovers_after_timeout() {
        let config = ReactionConfig::default();
        let (mut world, mut pool, entity) = setup(NpcKind::Normal);
        let mut stage = RecordingStage::default();
        let mut instigator = EquippingInstigator::new();

        let impulse = Vec2::new(config.thresholds.sat + 0.5, 0.0);
        let outcome = take_impact(
            &mut world, &mut stage, &config, entity, impulse, &mut instigator, 0.0,
        );
        assert_eq!(outcome, ReactionOutcome::Sat);
        assert_eq!(stage.defeats, 0);

        // Before the recovery deadline: still down, still active.
        update_knockdowns(&mut world, &mut pool, f64::from(config.recovery_time) - 0.1);
        assert!(world.get::<&Reaction>(entity).unwrap().knocked_down());

        update_knockdowns(&mut world, &mut pool, f64::from(config.recovery_time) + 0.1);
        let reaction = world.get::<&Reaction>(entity).unwrap();
        assert_eq!(reaction.state, NpcState::Idle);
        assert!(reaction.recovery_at.is_none());
        assert!(pool.is_active(entity));
    }

    #[test]
    fn fallen_fades_then_returns_to_pool() {
        let config = ReactionConfig::default();
        let (mut world, mut pool, entity) = setup(NpcKind::Normal);
        let mut stage = RecordingStage::default();
        let mut instigator = EquippingInstigator::new();

        take_impact(
            &mut world,
            &mut stage,
            &config,
            entity,
            fallen_impulse(&config),
            &mut instigator,
            0.0,
        );

        let fade_at = f64::from(config.time_before_fade);
        let done_at = fade_at + f64::from(config.fade_duration);

        // Mid-fade: opacity dropping, still checked out.
        update_knockdowns(&mut world, &mut pool, fade_at + f64::from(config.fade_duration) / 2.0);
        let opacity = world.get::<&Presentation>(entity).unwrap().opacity;
        assert!(opacity > 0.0 && opacity < 1.0);
        assert!(pool.is_active(entity));

        update_knockdowns(&mut world, &mut pool, done_at + 0.01);
        assert!(!pool.is_active(entity));
        assert_eq!(pool.pooled_count(NpcKind::Normal), 1);
    }

    #[test]
    fn heavy_counters_only_with_instigator_body() {
        let config = ReactionConfig::default();
        let (mut world, _pool, entity) = setup(NpcKind::Heavy);
        let mut stage = RecordingStage::default();

        let weak = Vec2::new(config.heavy.resistance_threshold - 1.0, 0.0);
        let mut with_body = EquippingInstigator::new();
        let outcome = take_impact(
            &mut world, &mut stage, &config, entity, weak, &mut with_body, 0.0,
        );
        assert_eq!(outcome, ReactionOutcome::Absorbed);
        assert_eq!(with_body.counters.len(), 1);
        // Shove points from the heavy toward the instigator (negative x).
        assert!(with_body.counters[0].x < 0.0);

        let mut bodiless = NoBodyInstigator;
        let outcome = take_impact(
            &mut world, &mut stage, &config, entity, weak, &mut bodiless, 0.0,
        );
        assert_eq!(outcome, ReactionOutcome::Absorbed);
    }

    #[test]
    fn battery_grants_once_per_activation_cycle() {
        let config = ReactionConfig::default();
        let (mut world, mut pool, entity) = setup(NpcKind::Battery);
        let mut stage = RecordingStage::default();
        let mut instigator = EquippingInstigator::new();

        let tap = Vec2::new(1.0, 0.0);
        take_impact(&mut world, &mut stage, &config, entity, tap, &mut instigator, 0.0);
        take_impact(&mut world, &mut stage, &config, entity, tap, &mut instigator, 0.1);
        assert_eq!(instigator.batteries, 1);

        // Recycle: the flag resets with the activation cycle.
        pool.return_to_pool(&mut world, entity, NpcKind::Battery);
        let entity = pool.get(&mut world, NpcKind::Battery).unwrap();
        take_impact(&mut world, &mut stage, &config, entity, tap, &mut instigator, 1.0);
        assert_eq!(instigator.batteries, 2);
    }

    #[test]
    fn capability_less_hit_leaves_battery_available() {
        let config = ReactionConfig::default();
        let (mut world, _pool, entity) = setup(NpcKind::Battery);
        let mut stage = RecordingStage::default();
        let tap = Vec2::new(1.0, 0.0);

        // No equip capability: the grant must survive the hit.
        let mut bodiless = NoBodyInstigator;
        take_impact(&mut world, &mut stage, &config, entity, tap, &mut bodiless, 0.0);
        assert!(!world.get::<&Reaction>(entity).unwrap().battery_granted);

        let mut equipping = EquippingInstigator::new();
        take_impact(&mut world, &mut stage, &config, entity, tap, &mut equipping, 0.1);
        assert_eq!(equipping.batteries, 1);
        assert!(world.get::<&Reaction>(entity).unwrap().battery_granted);
    }

    #[test]
    fn suitcase_detaches_projectile_ignoring_player() {
        let config = ReactionConfig::default();
        let (mut world, _pool, entity) = setup(NpcKind::Suitcase);
        let mut stage = RecordingStage::default();
        let mut instigator = EquippingInstigator::new();

        take_impact(
            &mut world,
            &mut stage,
            &config,
            entity,
            Vec2::new(2.0, 0.0),
            &mut instigator,
            0.0,
        );

        let props: Vec<(Entity, Projectile, Body)> = world
            .query::<(&Projectile, &Body)>()
            .iter()
            .map(|(e, (p, b))| (e, *p, *b))
            .collect();
        assert_eq!(props.len(), 1);
        let (_, projectile, body) = props[0];
        assert!(projectile.ignores_player);
        assert_eq!(projectile.carrier, entity);
        // Positive-x impact launches the case in +x.
        assert!(body.velocity.x > 0.0);
    }

    #[test]
    fn separation_pushes_stacked_idlers_apart() {
        let config = SeparationConfig::default();
        let mut world = World::new();
        let mut pool = NpcPool::new();
        pool.register(NpcKind::Normal);
        let a = pool.get(&mut world, NpcKind::Normal).unwrap();
        let b = pool.get(&mut world, NpcKind::Normal).unwrap();
        world.get::<&mut Body>(a).unwrap().position = Vec2::new(0.0, 0.0);
        world.get::<&mut Body>(b).unwrap().position = Vec2::new(0.1, 0.0);

        apply_separation(&mut world, &config, 1.0 / 60.0);

        let va = world.get::<&Body>(a).unwrap().velocity;
        let vb = world.get::<&Body>(b).unwrap().velocity;
        assert!(va.x < 0.0);
        assert!(vb.x > 0.0);
        assert_eq!(va.y, 0.0);
    }

    #[test]
    fn deactivate_refused_while_knocked_down() {
        let config = ReactionConfig::default();
        let (mut world, _pool, entity) = setup(NpcKind::Normal);
        let mut stage = RecordingStage::default();
        let mut instigator = EquippingInstigator::new();

        assert!(try_deactivate(&mut world, entity));
        activate(&mut world, entity);

        take_impact(
            &mut world,
            &mut stage,
            &config,
            entity,
            fallen_impulse(&config),
            &mut instigator,
            0.0,
        );
        assert!(!try_deactivate(&mut world, entity));
        assert!(world.get::<&Active>(entity).is_ok());
    }
}
