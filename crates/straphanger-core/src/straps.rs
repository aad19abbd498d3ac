//! Hanging-strap registry and spatial lookup.

use straphanger_logic::vec2::Vec2;

pub type StrapId = u32;

/// All grabbable straps in the carriage. Straps own themselves; the player
/// rig only keeps a `StrapId` relation while attached.
#[derive(Debug, Default)]
pub struct StrapRegistry {
    straps: Vec<(StrapId, Vec2)>,
    next_id: StrapId,
}

impl StrapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, position: Vec2) -> StrapId {
        let id = self.next_id;
        self.next_id += 1;
        self.straps.push((id, position));
        id
    }

    pub fn remove(&mut self, id: StrapId) {
        self.straps.retain(|(sid, _)| *sid != id);
    }

    pub fn position(&self, id: StrapId) -> Option<Vec2> {
        self.straps
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.straps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.straps.is_empty()
    }

    /// Nearest strap within `max_distance` of `position`, or `None`.
    /// Exact ties go to the earliest-registered strap.
    pub fn nearest_within(&self, position: Vec2, max_distance: f32) -> Option<StrapId> {
        let mut best: Option<(StrapId, f32)> = None;
        for &(id, strap_pos) in &self.straps {
            let d = position.distance(&strap_pos);
            if d > max_distance {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((id, d)),
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_picks_closest() {
        let mut reg = StrapRegistry::new();
        let far = reg.register(Vec2::new(3.0, 2.0));
        let near = reg.register(Vec2::new(1.0, 2.0));
        assert_eq!(reg.nearest_within(Vec2::ZERO, 10.0), Some(near));
        assert_ne!(reg.nearest_within(Vec2::ZERO, 10.0), Some(far));
    }

    #[test]
    fn out_of_range_returns_none() {
        let mut reg = StrapRegistry::new();
        reg.register(Vec2::new(5.0, 0.0));
        assert_eq!(reg.nearest_within(Vec2::ZERO, 2.0), None);
    }

    #[test]
    fn tie_goes_to_first_registered() {
        let mut reg = StrapRegistry::new();
        let a = reg.register(Vec2::new(1.0, 0.0));
        let _b = reg.register(Vec2::new(-1.0, 0.0));
        assert_eq!(reg.nearest_within(Vec2::ZERO, 2.0), Some(a));
    }

    #[test]
    fn removed_strap_not_returned() {
        let mut reg = StrapRegistry::new();
        let a = reg.register(Vec2::new(1.0, 0.0));
        reg.remove(a);
        assert_eq!(reg.nearest_within(Vec2::ZERO, 2.0), None);
        assert!(reg.is_empty());
    }
}
