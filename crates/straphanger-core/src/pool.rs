//! Per-kind passenger pool.
//!
//! Defeated passengers are recycled instead of destroyed: `return_to_pool`
//! parks the entity in a FIFO queue for its kind, `get` hands it back out
//! with its reaction state reset. The pool grows on demand and never
//! blocks. Invariant: an entity is in exactly one of {queue, active}.

use std::collections::{HashMap, HashSet, VecDeque};

use hecs::{Entity, World};

use straphanger_logic::reaction::NpcKind;

use crate::components::{Active, Body, Passenger, Presentation, Reaction};

/// Spawn a fresh, inactive passenger entity of the given kind.
fn spawn_passenger(world: &mut World, kind: NpcKind) -> Entity {
    world.spawn((
        Passenger { kind },
        Body::default(),
        Reaction::default(),
        Presentation::default(),
    ))
}

#[derive(Debug, Default)]
pub struct NpcPool {
    queues: HashMap<NpcKind, VecDeque<Entity>>,
    active: HashSet<Entity>,
}

impl NpcPool {
    /// An empty pool with no kinds registered. Kinds must be registered
    /// before use; asking for an unregistered kind is a configuration
    /// defect, not a recoverable condition.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: NpcKind) {
        self.queues.entry(kind).or_default();
    }

    pub fn is_registered(&self, kind: NpcKind) -> bool {
        self.queues.contains_key(&kind)
    }

    /// Pre-spawn `count` inactive passengers into the kind's queue.
    pub fn prewarm(&mut self, world: &mut World, kind: NpcKind, count: usize) {
        self.register(kind);
        for _ in 0..count {
            let entity = spawn_passenger(world, kind);
            if let Some(queue) = self.queues.get_mut(&kind) {
                queue.push_back(entity);
            }
        }
    }

    /// Hand out a passenger of `kind`: reused from the queue when possible,
    /// freshly allocated otherwise. The instance comes back activated with
    /// reaction state and per-activation flags reset.
    pub fn get(&mut self, world: &mut World, kind: NpcKind) -> Option<Entity> {
        let Some(queue) = self.queues.get_mut(&kind) else {
            log::error!("pool: kind {:?} was never registered", kind);
            return None;
        };

        let entity = queue
            .pop_front()
            .unwrap_or_else(|| spawn_passenger(world, kind));

        if let Ok(mut reaction) = world.get::<&mut Reaction>(entity) {
            *reaction = Reaction::default();
        }
        if let Ok(mut presentation) = world.get::<&mut Presentation>(entity) {
            *presentation = Presentation::default();
        }
        if let Ok(mut body) = world.get::<&mut Body>(entity) {
            *body = Body::default();
        }
        let _ = world.insert_one(entity, Active);
        self.active.insert(entity);
        Some(entity)
    }

    /// Reclaim a passenger. Deactivates and enqueues; a double return or an
    /// unregistered kind is logged and ignored.
    pub fn return_to_pool(&mut self, world: &mut World, entity: Entity, kind: NpcKind) {
        if !self.queues.contains_key(&kind) {
            log::error!("pool: returning to unregistered kind {:?}", kind);
            return;
        }
        if !self.active.remove(&entity) {
            log::warn!("pool: double return of {:?} ignored", entity);
            return;
        }
        let _ = world.remove_one::<Active>(entity);
        if let Some(queue) = self.queues.get_mut(&kind) {
            queue.push_back(entity);
        }
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.active.contains(&entity)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pooled_count(&self, kind: NpcKind) -> usize {
        self.queues.get(&kind).map_or(0, VecDeque::len)
    }
}
