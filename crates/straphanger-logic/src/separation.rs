//! Personal-space repulsion between standing passengers.
//!
//! A simple crowd-separation rule: each passenger pushes horizontally away
//! from every same-layer neighbor inside its personal-space radius, with
//! strength falling off linearly to zero at the radius edge. Prevents
//! visual stacking without pathfinding.

use serde::{Deserialize, Serialize};

use crate::vec2::Vec2;

/// Crowd separation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationConfig {
    /// Neighbors inside this radius are pushed away from.
    pub personal_space_radius: f32,
    /// Force at zero distance (falls off linearly to zero at the radius).
    pub strength: f32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            personal_space_radius: 0.8,
            strength: 2.0,
        }
    }
}

/// Sum of horizontal repulsion forces on a passenger at `position` from
/// `neighbors`. A coincident neighbor (distance 0) pushes at full strength
/// in +x so two stacked bodies always split.
pub fn separation_force(
    position: Vec2,
    neighbors: &[Vec2],
    config: &SeparationConfig,
) -> Vec2 {
    let radius = config.personal_space_radius;
    let mut force = Vec2::ZERO;
    for neighbor in neighbors {
        let distance = position.distance(neighbor);
        if distance >= radius {
            continue;
        }
        let weight = 1.0 - distance / radius;
        let direction = if distance > 0.0 {
            (position.x - neighbor.x).signum()
        } else {
            1.0
        };
        force.x += direction * weight * config.strength;
    }
    force
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SeparationConfig {
        SeparationConfig {
            personal_space_radius: 1.0,
            strength: 2.0,
        }
    }

    #[test]
    fn pushes_away_from_close_neighbor() {
        let f = separation_force(Vec2::ZERO, &[Vec2::new(0.5, 0.0)], &config());
        assert!(f.x < 0.0);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn falls_off_linearly() {
        let cfg = config();
        let near = separation_force(Vec2::ZERO, &[Vec2::new(0.25, 0.0)], &cfg);
        let far = separation_force(Vec2::ZERO, &[Vec2::new(0.75, 0.0)], &cfg);
        assert!(near.x.abs() > far.x.abs());
        assert!((near.x.abs() - 1.5).abs() < 1e-4); // (1 - 0.25) * 2.0
        assert!((far.x.abs() - 0.5).abs() < 1e-4); // (1 - 0.75) * 2.0
    }

    #[test]
    fn outside_radius_is_ignored() {
        let f = separation_force(Vec2::ZERO, &[Vec2::new(1.0, 0.0)], &config());
        assert_eq!(f, Vec2::ZERO);
    }

    #[test]
    fn forces_sum_over_neighbors() {
        let cfg = config();
        let f = separation_force(
            Vec2::ZERO,
            &[Vec2::new(0.5, 0.0), Vec2::new(-0.5, 0.0)],
            &cfg,
        );
        // Symmetric neighbors cancel.
        assert!(f.x.abs() < 1e-6);

        let f = separation_force(
            Vec2::ZERO,
            &[Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.1)],
            &cfg,
        );
        assert!(f.x < -1.0);
    }

    #[test]
    fn coincident_neighbor_still_splits() {
        let f = separation_force(Vec2::ZERO, &[Vec2::ZERO], &config());
        assert!(f.x.abs() > 0.0);
    }

    #[test]
    fn force_is_horizontal_only() {
        let f = separation_force(Vec2::ZERO, &[Vec2::new(0.1, 0.5)], &config());
        assert_eq!(f.y, 0.0);
    }
}
