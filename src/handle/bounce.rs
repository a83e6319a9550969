use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Quat, Vec3A};
use smallvec::SmallVec;

use crate::backend::{
    common::AnimationError,
    scene::{Bounds, Pose},
};

pub const FALL_DURATION: f32 = 0.8;
/// (rise as a fraction of the fall height, up-and-down duration)
pub const BOUNCES: [(f32, f32); 3] = [(0.25, 0.2), (0.10, 0.15), (0.03, 0.1)];
pub const SETTLE_DURATION: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceSegment {
    pub from: Vec3A,
    pub to: Vec3A,
    pub from_rotation: Quat,
    pub rotation: Quat,
    pub duration: f32,
    pub easing: Easing,
}

impl BounceSegment {
    fn pose_at(&self, t: f32) -> Pose {
        let k = self.easing.apply(t);
        Pose::new(
            self.from.lerp(self.to, k),
            self.from_rotation.slerp(self.rotation, k),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSample {
    pub pose: Pose,
    /// Index of the segment being played, `None` once finished.
    pub segment: Option<usize>,
}

impl DropSample {
    pub fn finished(&self) -> bool {
        self.segment.is_none()
    }
}

/// Fully precomputed drop: fall, three decaying bounces, settle.
/// Not resumable; every drop builds a fresh one.
#[derive(Debug, Clone)]
pub struct BounceAnimation {
    segments: SmallVec<[BounceSegment; 8]>,
    target: Pose,
    duration: f32,
}

/// Rotation that leaves the largest face of `size` facing the floor, keeping the yaw of `current`.
pub fn flattest_face_down(current: Quat, size: Vec3A) -> Result<Quat, AnimationError> {
    let bounds = Bounds::from_size(size);
    if bounds.is_degenerate() {
        return Err(AnimationError::DegenerateBounds(size));
    }

    let area_x = size.y * size.z;
    let area_y = size.x * size.z;
    let area_z = size.x * size.y;

    // ties prefer the rotation that moves the prop least
    let face = if area_y >= area_z && area_y >= area_x {
        Quat::IDENTITY
    } else if area_z >= area_x {
        Quat::from_rotation_x(-FRAC_PI_2)
    } else {
        Quat::from_rotation_z(FRAC_PI_2)
    };

    let (yaw, _, _) = current.to_euler(EulerRot::YXZ);
    Ok((Quat::from_rotation_y(yaw) * face).normalize())
}

impl BounceAnimation {
    pub fn build(start: Pose, target: Vec3A, bounds: Bounds) -> Result<Self, AnimationError> {
        if !start.position.is_finite() {
            return Err(AnimationError::NonFinite(start.position));
        }
        if !target.is_finite() {
            return Err(AnimationError::NonFinite(target));
        }
        let rest = flattest_face_down(start.rotation, bounds.size())?;
        let fall_height = (start.position.y - target.y).max(0.0);

        let mut segments: SmallVec<[BounceSegment; 8]> = SmallVec::new();
        segments.push(BounceSegment {
            from: start.position,
            to: target,
            from_rotation: start.rotation,
            rotation: rest,
            duration: FALL_DURATION,
            easing: Easing::EaseIn,
        });

        for (ratio, duration) in BOUNCES {
            let apex = target + Vec3A::Y * (fall_height * ratio);
            segments.push(BounceSegment {
                from: target,
                to: apex,
                from_rotation: rest,
                rotation: rest,
                duration: duration * 0.5,
                easing: Easing::EaseOut,
            });
            segments.push(BounceSegment {
                from: apex,
                to: target,
                from_rotation: rest,
                rotation: rest,
                duration: duration * 0.5,
                easing: Easing::EaseIn,
            });
        }

        segments.push(BounceSegment {
            from: target,
            to: target,
            from_rotation: rest,
            rotation: rest,
            duration: SETTLE_DURATION,
            easing: Easing::EaseOut,
        });

        let duration = segments.iter().map(|s| s.duration).sum();
        Ok(Self {
            segments,
            target: Pose::new(target, rest),
            duration,
        })
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn target(&self) -> Pose {
        self.target
    }

    pub fn segments(&self) -> &[BounceSegment] {
        &self.segments
    }

    /// Seconds from the start of the drop until the first floor contact.
    pub fn impact_time(&self) -> f32 {
        self.segments.first().map_or(0.0, |s| s.duration)
    }

    pub fn sample(&self, elapsed: f32) -> DropSample {
        let mut remaining = elapsed.max(0.0);
        for (i, segment) in self.segments.iter().enumerate() {
            if remaining < segment.duration {
                return DropSample {
                    pose: segment.pose_at(remaining / segment.duration),
                    segment: Some(i),
                };
            }
            remaining -= segment.duration;
        }
        // exact target, no accumulated float drift
        DropSample {
            pose: self.target,
            segment: None,
        }
    }
}
