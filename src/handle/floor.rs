//! Floor height estimation and the minimum clearance every placement keeps.
//!
//! The reference is recomputed from the floor entity (never from the prop),
//! so repeated drops cannot ratchet it downward.

use std::time::Instant;

use glam::Vec3A;

use crate::backend::scene::{Bounds, Role, Scene, SceneIndex};

/// Floor estimates below this are considered broken geometry.
pub const IMPLAUSIBLE_FLOOR_Y: f32 = -2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorReference {
    pub y: f32,
    pub computed_at: Instant,
}

pub struct FloorSafety {
    reference: Option<FloorReference>,
    absolute_safety_height: f32,
}

/// Most conservative (highest) of the finite estimates, clamped to 0 when implausible.
pub fn combine_estimates<I>(estimates: I) -> f32
where
    I: IntoIterator<Item = Option<f32>>,
{
    let best = estimates
        .into_iter()
        .flatten()
        .filter(|y| y.is_finite())
        .reduce(f32::max);

    match best {
        Some(y) if y >= IMPLAUSIBLE_FLOOR_Y => y,
        Some(y) => {
            log::warn!("Floor estimate {:.3} is implausible, using 0.0", y);
            0.0
        }
        None => {
            log::warn!("No usable floor estimate, using 0.0");
            0.0
        }
    }
}

impl FloorSafety {
    pub const fn new(absolute_safety_height: f32) -> Self {
        Self {
            reference: None,
            absolute_safety_height,
        }
    }

    /// Recompute and cache the floor surface height.
    pub fn compute_floor_reference(
        &mut self,
        scene: &dyn Scene,
        index: &SceneIndex,
        now: Instant,
    ) -> f32 {
        let y = match index.get(Role::Floor) {
            Some(floor) => {
                let pose = scene.pose(floor);
                let world_top = scene.world_bounds(floor).map(|b| b.max.y);
                let anchored_top = pose
                    .zip(scene.local_bounds(floor))
                    .map(|(p, b)| p.position.y + b.max.y);
                let raw_y = pose.map(|p| p.position.y);
                combine_estimates([world_top, anchored_top, raw_y])
            }
            None => {
                log::warn!("Floor entity missing, floor reference defaults to 0.0");
                0.0
            }
        };

        log::debug!("Floor reference: {:.4}", y);
        self.reference = Some(FloorReference { y, computed_at: now });
        y
    }

    pub fn reference(&self) -> Option<FloorReference> {
        self.reference
    }

    pub fn reference_y(&self) -> f32 {
        self.reference.map_or(0.0, |r| r.y)
    }

    /// Clearance between floor surface and pivot for an object with these bounds.
    pub fn minimum_safe_height(&self, bounds: Option<Bounds>) -> f32 {
        match bounds {
            Some(b) if !b.is_degenerate() => self.absolute_safety_height.max(b.size().y * 0.5),
            Some(_) => {
                log::debug!("Degenerate prop bounds, using absolute safety height");
                self.absolute_safety_height
            }
            None => self.absolute_safety_height,
        }
    }

    pub fn safe_pivot_y(&self, bounds: Option<Bounds>) -> f32 {
        self.reference_y() + self.minimum_safe_height(bounds)
    }

    pub fn clamp_placement(&self, position: Vec3A, bounds: Option<Bounds>) -> Vec3A {
        let min_y = self.safe_pivot_y(bounds);
        if position.y < min_y {
            Vec3A::new(position.x, min_y, position.z)
        } else {
            position
        }
    }
}
