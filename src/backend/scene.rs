//! The scene collaborator the interaction core talks to.
//!
//! Asset loading and name lookups happen elsewhere; by the time the core runs,
//! every entity it needs has been resolved into a [`SceneIndex`] that maps a
//! logical [`Role`] to an opaque [`EntityId`]. All transform and physics
//! traffic then goes through the [`Scene`] trait.

use std::collections::HashMap;

use glam::{Quat, Vec3A};
use serde::{Deserialize, Serialize};

use super::common::InteractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Floor,
    /// Switch lever, 1-based.
    Switch(u8),
    /// Where the detachable handle sits when attached.
    HandleAnchor,
    HandleAttached,
    HandleDetached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhysicsMode {
    Dynamic,
    #[default]
    Kinematic,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3A,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3A::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub const fn new(position: Vec3A, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Bounds {
    pub const fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    pub fn from_size(size: Vec3A) -> Self {
        Self {
            min: size * -0.5,
            max: size * 0.5,
        }
    }

    pub fn size(&self) -> Vec3A {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        !size.is_finite() || size.cmple(Vec3A::ZERO).any()
    }

    pub fn translated(&self, by: Vec3A) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    Box { size: Vec3A },
    Sphere { radius: f32 },
}

/// Everything the core needs from the host scene graph.
pub trait Scene {
    fn pose(&self, id: EntityId) -> Option<Pose>;
    fn set_pose(&mut self, id: EntityId, pose: Pose);
    /// Bounds in the entity's local space.
    fn local_bounds(&self, id: EntityId) -> Option<Bounds>;
    /// Bounds in world space.
    fn world_bounds(&self, id: EntityId) -> Option<Bounds>;
    fn physics(&self, id: EntityId) -> Option<(PhysicsMode, bool)>;
    fn set_physics(&mut self, id: EntityId, mode: PhysicsMode, gravity: bool);
    fn apply_impulse(&mut self, id: EntityId, impulse: Vec3A);
    fn set_collision_shape(&mut self, id: EntityId, shape: Option<CollisionShape>);
    fn set_enabled(&mut self, id: EntityId, enabled: bool);
    fn is_enabled(&self, id: EntityId) -> bool;
}

/// Role to entity map, built once when the scene has been loaded.
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    entities: HashMap<Role, EntityId>,
}

impl SceneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: Role, id: EntityId) {
        if let Some(old) = self.entities.insert(role, id) {
            log::warn!("{:?} re-registered: {:?} -> {:?}", role, old, id);
        }
    }

    pub fn get(&self, role: Role) -> Option<EntityId> {
        self.entities.get(&role).copied()
    }

    pub fn require(&self, role: Role) -> Result<EntityId, InteractionError> {
        self.get(role).ok_or(InteractionError::MissingEntity(role))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryEntity {
    pub pose: Pose,
    pub local_bounds: Bounds,
    pub physics: PhysicsMode,
    pub gravity: bool,
    pub enabled: bool,
    pub collision: Option<CollisionShape>,
    pub impulses: Vec<Vec3A>,
}

impl MemoryEntity {
    pub fn new(pose: Pose, local_bounds: Bounds) -> Self {
        Self {
            pose,
            local_bounds,
            physics: PhysicsMode::Static,
            gravity: false,
            enabled: true,
            collision: None,
            impulses: Vec::new(),
        }
    }
}

/// Headless scene: stores transforms and physics flags, simulates nothing.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    entities: Vec<MemoryEntity>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: MemoryEntity) -> EntityId {
        self.entities.push(entity);
        EntityId(self.entities.len() - 1)
    }

    pub fn entity(&self, id: EntityId) -> Option<&MemoryEntity> {
        self.entities.get(id.0)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut MemoryEntity> {
        self.entities.get_mut(id.0)
    }
}

impl Scene for MemoryScene {
    fn pose(&self, id: EntityId) -> Option<Pose> {
        self.entity(id).map(|e| e.pose)
    }

    fn set_pose(&mut self, id: EntityId, pose: Pose) {
        if let Some(e) = self.entity_mut(id) {
            e.pose = pose;
        }
    }

    fn local_bounds(&self, id: EntityId) -> Option<Bounds> {
        self.entity(id).map(|e| e.local_bounds)
    }

    fn world_bounds(&self, id: EntityId) -> Option<Bounds> {
        // rotation is ignored, good enough for floors and props at rest
        self.entity(id)
            .map(|e| e.local_bounds.translated(e.pose.position))
    }

    fn physics(&self, id: EntityId) -> Option<(PhysicsMode, bool)> {
        self.entity(id).map(|e| (e.physics, e.gravity))
    }

    fn set_physics(&mut self, id: EntityId, mode: PhysicsMode, gravity: bool) {
        if let Some(e) = self.entity_mut(id) {
            e.physics = mode;
            e.gravity = gravity;
        }
    }

    fn apply_impulse(&mut self, id: EntityId, impulse: Vec3A) {
        if let Some(e) = self.entity_mut(id) {
            e.impulses.push(impulse);
        }
    }

    fn set_collision_shape(&mut self, id: EntityId, shape: Option<CollisionShape>) {
        if let Some(e) = self.entity_mut(id) {
            e.collision = shape;
        }
    }

    fn set_enabled(&mut self, id: EntityId, enabled: bool) {
        if let Some(e) = self.entity_mut(id) {
            e.enabled = enabled;
        }
    }

    fn is_enabled(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(|e| e.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_require_missing() {
        let index = SceneIndex::new();
        assert!(matches!(
            index.require(Role::Floor),
            Err(InteractionError::MissingEntity(Role::Floor))
        ));
    }

    #[test]
    fn test_degenerate_bounds() {
        assert!(Bounds::from_size(Vec3A::new(0.1, 0.0, 0.1)).is_degenerate());
        assert!(Bounds::from_size(Vec3A::new(0.1, f32::NAN, 0.1)).is_degenerate());
        assert!(!Bounds::from_size(Vec3A::splat(0.1)).is_degenerate());
    }

    #[test]
    fn test_memory_scene_world_bounds_follow_pose() {
        let mut scene = MemoryScene::new();
        let id = scene.spawn(MemoryEntity::new(
            Pose::new(Vec3A::new(0.0, 1.0, 0.0), Quat::IDENTITY),
            Bounds::from_size(Vec3A::splat(0.2)),
        ));
        let world = scene.world_bounds(id).unwrap();
        assert!((world.max.y - 1.1).abs() < 1e-6);
        assert!(scene.world_bounds(EntityId(7)).is_none());
    }
}
