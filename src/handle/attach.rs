use glam::Vec3A;

use crate::backend::{
    common::InteractionError,
    scene::{Pose, Role, Scene, SceneIndex},
};

pub fn is_near_target(object: Vec3A, anchor: Vec3A, threshold: f32) -> bool {
    object.distance(anchor) < threshold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Attach,
    Drop,
}

/// Decides at drag-end whether the loose handle snaps back onto its anchor,
/// and where the attached handle goes when it does.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    threshold: f32,
    /// Attached handle pose in anchor space, captured once at scene load.
    initial_offset: Pose,
}

impl AttachmentResolver {
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            initial_offset: Pose::IDENTITY,
        }
    }

    /// Remember how the attached handle sits on its anchor.
    pub fn capture_initial(
        &mut self,
        scene: &dyn Scene,
        index: &SceneIndex,
    ) -> Result<(), InteractionError> {
        let anchor = index.require(Role::HandleAnchor)?;
        let attached = index.require(Role::HandleAttached)?;
        let anchor = scene
            .pose(anchor)
            .ok_or(InteractionError::MissingEntity(Role::HandleAnchor))?;
        let attached = scene
            .pose(attached)
            .ok_or(InteractionError::MissingEntity(Role::HandleAttached))?;

        let inv = anchor.rotation.inverse();
        self.initial_offset = Pose::new(
            inv * (attached.position - anchor.position),
            (inv * attached.rotation).normalize(),
        );
        Ok(())
    }

    pub fn resolve(&self, object: Vec3A, anchor: Vec3A) -> Resolution {
        let distance = object.distance(anchor);
        if is_near_target(object, anchor, self.threshold) {
            log::debug!("Handle {:.3} from anchor, attaching", distance);
            Resolution::Attach
        } else {
            log::debug!("Handle {:.3} from anchor, dropping", distance);
            Resolution::Drop
        }
    }

    pub fn attached_pose(&self, anchor: Pose) -> Pose {
        Pose::new(
            anchor.position + anchor.rotation * self.initial_offset.position,
            (anchor.rotation * self.initial_offset.rotation).normalize(),
        )
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::backend::scene::{Bounds, MemoryEntity, MemoryScene};

    #[test]
    fn test_threshold_is_strict() {
        assert!(is_near_target(Vec3A::ZERO, Vec3A::new(0.25, 0.0, 0.0), 0.30));
        assert!(!is_near_target(Vec3A::ZERO, Vec3A::new(0.30, 0.0, 0.0), 0.30));
    }

    #[test]
    fn test_resolve() {
        let resolver = AttachmentResolver::new(0.30);
        let anchor = Vec3A::new(1.0, 1.0, 1.0);
        assert_eq!(
            resolver.resolve(anchor + Vec3A::new(0.0, 0.25, 0.0), anchor),
            Resolution::Attach
        );
        assert_eq!(
            resolver.resolve(anchor + Vec3A::new(0.0, 0.0, 0.5), anchor),
            Resolution::Drop
        );
    }

    #[test]
    fn test_attached_pose_reproduces_initial() {
        let mut scene = MemoryScene::new();
        let mut index = SceneIndex::new();
        let bounds = Bounds::from_size(Vec3A::splat(0.1));
        let anchor_pose = Pose::new(Vec3A::new(0.5, 1.2, -1.0), Quat::from_rotation_y(0.7));
        let attached_pose = Pose::new(
            Vec3A::new(0.55, 1.3, -1.0),
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.2),
        );
        index.insert(
            Role::HandleAnchor,
            scene.spawn(MemoryEntity::new(anchor_pose, bounds)),
        );
        index.insert(
            Role::HandleAttached,
            scene.spawn(MemoryEntity::new(attached_pose, bounds)),
        );

        let mut resolver = AttachmentResolver::new(0.30);
        resolver.capture_initial(&scene, &index).unwrap();
        let pose = resolver.attached_pose(anchor_pose);
        assert!(pose.position.abs_diff_eq(attached_pose.position, 1e-5));
        assert!(pose.rotation.abs_diff_eq(attached_pose.rotation, 1e-5));
    }

    #[test]
    fn test_capture_requires_entities() {
        let scene = MemoryScene::new();
        let mut resolver = AttachmentResolver::new(0.30);
        assert!(resolver.capture_initial(&scene, &SceneIndex::new()).is_err());
    }
}
