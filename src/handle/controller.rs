//! Mode state machine for the detachable handle.
//!
//! ```text
//! Idle ──drag──▶ HandTracking ──pinch──▶ PinchMode ──release + grace──▶ BounceAnimating ──▶ Grounded
//!   ▲                 │                      │                                ▲               │
//!   └──── attach ◀────┴──── drag-end ◀───────┘                                └── hand sweep ─┘
//! ```
//!
//! Drag translations arrive already mapped into world axes; the host owns that mapping.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use glam::Vec3A;
use strum::AsRefStr;

use crate::{
    backend::{
        audio::SoundId,
        common::AnimationError,
        gesture::DragDeltaTracker,
        input::HandSample,
        scene::{CollisionShape, EntityId, PhysicsMode, Pose, Role},
        task::{TimerKind, TimerQueue},
    },
    config::InteractionConfig,
    state::InteractionEvent,
};

use super::{
    attach::{AttachmentResolver, Resolution},
    bounce::BounceAnimation,
    HandleContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum ModeKind {
    Idle,
    HandTracking,
    PinchMode,
    Grounded,
    BounceAnimating,
}

#[derive(Debug, Clone)]
pub enum Bounce {
    Drop {
        animation: BounceAnimation,
        started_at: Instant,
        impact_played: bool,
    },
    /// Handed to the physics engine with an upward kick until the settle timer fires.
    Protective { rest: Vec3A, started_at: Instant },
}

#[derive(Debug, Clone)]
pub enum Mode {
    Idle,
    HandTracking {
        base: Vec3A,
        accumulated: Vec3A,
    },
    PinchMode {
        base: Vec3A,
        target: Vec3A,
        activated_at: Instant,
        /// Set while the grace timer runs.
        released_at: Option<Instant>,
    },
    Grounded {
        rest: Vec3A,
        /// The protective bounce only fires after the hand has been away once.
        armed: bool,
    },
    BounceAnimating(Bounce),
}

impl Mode {
    pub const fn kind(&self) -> ModeKind {
        match self {
            Self::Idle => ModeKind::Idle,
            Self::HandTracking { .. } => ModeKind::HandTracking,
            Self::PinchMode { .. } => ModeKind::PinchMode,
            Self::Grounded { .. } => ModeKind::Grounded,
            Self::BounceAnimating(_) => ModeKind::BounceAnimating,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub drag_sensitivity: f32,
    pub drag_max_offset: f32,
    pub hand_tracking_ceiling: f32,
    pub pinch_ceiling: f32,
    pub anchor_exception_radius: f32,
    pub pinch_follow_speed: f32,
    pub pinch_snap_distance: f32,
    pub grace_period: Duration,
    pub protective_radius: f32,
    pub protective_impulse: f32,
    pub protective_settle: Duration,
    pub grounded_height: f32,
    pub glitch_threshold: f32,
}

impl From<&InteractionConfig> for ControllerSettings {
    fn from(config: &InteractionConfig) -> Self {
        Self {
            drag_sensitivity: config.drag_sensitivity,
            drag_max_offset: config.drag_max_offset,
            hand_tracking_ceiling: config.hand_tracking_ceiling,
            pinch_ceiling: config.pinch_ceiling,
            anchor_exception_radius: config.anchor_exception_radius,
            pinch_follow_speed: config.pinch_follow_speed,
            pinch_snap_distance: config.pinch_snap_distance,
            grace_period: Duration::from_secs_f32(config.grace_period),
            protective_radius: config.protective_radius,
            protective_impulse: config.protective_impulse,
            protective_settle: Duration::from_secs_f32(config.protective_settle),
            grounded_height: config.grounded_height,
            glitch_threshold: config.glitch_threshold,
        }
    }
}

pub struct DetachedObjectController {
    mode: Mode,
    attached: bool,
    dragging: bool,
    drag: DragDeltaTracker,
    resolver: AttachmentResolver,
    timers: TimerQueue,
    settings: ControllerSettings,
    last_tick: Option<Instant>,
}

impl DetachedObjectController {
    pub fn new(settings: ControllerSettings, resolver: AttachmentResolver, attached: bool) -> Self {
        Self {
            mode: Mode::Idle,
            attached,
            dragging: false,
            drag: DragDeltaTracker::new(settings.glitch_threshold),
            resolver,
            timers: TimerQueue::new(),
            settings,
            last_tick: None,
        }
    }

    pub const fn mode(&self) -> &Mode {
        &self.mode
    }

    pub const fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_timer_pending(&self, kind: TimerKind) -> bool {
        self.timers.is_pending(kind)
    }

    fn set_mode(&mut self, mode: Mode, ctx: &mut HandleContext<'_>) {
        let from = self.mode.kind();
        let to = mode.kind();
        self.mode = mode;

        if matches!(to, ModeKind::BounceAnimating | ModeKind::Grounded)
            && self.timers.cancel(TimerKind::PinchGrace)
        {
            log::debug!("Pinch grace cancelled by {}", to.as_ref());
        }

        if from != to {
            log::info!("Handle: {} -> {}", from.as_ref(), to.as_ref());
            ctx.events.push(InteractionEvent::ModeChanged { from, to });
        }
    }

    fn handle_pose(ctx: &HandleContext<'_>) -> Option<(EntityId, Pose)> {
        let Some(id) = ctx.index.get(Role::HandleDetached) else {
            log::warn!("Detached handle is not registered");
            return None;
        };
        let Some(pose) = ctx.scene.pose(id) else {
            log::warn!("Detached handle {:?} has no transform", id);
            return None;
        };
        Some((id, pose))
    }

    fn anchor_position(ctx: &HandleContext<'_>) -> Option<Vec3A> {
        ctx.index
            .get(Role::HandleAnchor)
            .and_then(|id| ctx.scene.pose(id))
            .map(|p| p.position)
    }

    fn within_ceiling(&self, candidate: Vec3A, ceiling: f32, anchor: Option<Vec3A>) -> bool {
        let from_origin = candidate.length();
        if from_origin <= ceiling {
            return true;
        }
        if anchor.is_some_and(|a| candidate.distance(a) <= self.settings.anchor_exception_radius) {
            log::debug!("Handle beyond {:.1} but inside the anchor area", ceiling);
            return true;
        }
        log::warn!(
            "Handle move rejected: {:.2} from origin exceeds {:.1} in {}",
            from_origin,
            ceiling,
            self.mode.kind().as_ref()
        );
        false
    }

    fn restore_collision(ctx: &mut HandleContext<'_>, id: EntityId) {
        let shape = match ctx.scene.local_bounds(id) {
            Some(b) if !b.is_degenerate() => CollisionShape::Box { size: b.size() },
            _ => CollisionShape::Sphere { radius: 0.05 },
        };
        ctx.scene.set_collision_shape(id, Some(shape));
    }

    pub fn begin_drag(&mut self, ctx: &mut HandleContext<'_>, now: Instant) {
        if self.attached {
            log::debug!("Drag on attached handle ignored");
            return;
        }
        match &self.mode {
            Mode::BounceAnimating(Bounce::Drop { .. }) => {
                log::debug!("Drag ignored while the handle is dropping");
                return;
            }
            Mode::BounceAnimating(Bounce::Protective { .. }) => {
                self.timers.cancel(TimerKind::ProtectiveSettle);
            }
            _ => {}
        }
        let Some((id, pose)) = Self::handle_pose(ctx) else {
            return;
        };

        ctx.floor.compute_floor_reference(&*ctx.scene, ctx.index, now);
        self.drag.reset();
        self.dragging = true;

        if matches!(self.mode, Mode::PinchMode { .. }) {
            // the pinching hand stays in charge
            return;
        }
        ctx.scene.set_physics(id, PhysicsMode::Kinematic, false);
        self.set_mode(
            Mode::HandTracking {
                base: pose.position,
                accumulated: Vec3A::ZERO,
            },
            ctx,
        );
    }

    pub fn drag_changed(&mut self, ctx: &mut HandleContext<'_>, translation: Vec3A) {
        if !self.dragging {
            return;
        }
        let Some(delta) = self.drag.update(translation) else {
            return;
        };
        let Mode::HandTracking { base, accumulated } = self.mode else {
            return;
        };
        let Some((id, pose)) = Self::handle_pose(ctx) else {
            return;
        };

        let next = (accumulated + delta * self.settings.drag_sensitivity)
            .clamp_length_max(self.settings.drag_max_offset);
        let candidate = base + next;
        if !self.within_ceiling(
            candidate,
            self.settings.hand_tracking_ceiling,
            Self::anchor_position(ctx),
        ) {
            return;
        }

        let placed = ctx
            .floor
            .clamp_placement(candidate, ctx.scene.local_bounds(id));
        ctx.scene.set_pose(id, Pose::new(placed, pose.rotation));
        if let Mode::HandTracking { accumulated, .. } = &mut self.mode {
            *accumulated = next;
        }
    }

    pub fn end_drag(&mut self, ctx: &mut HandleContext<'_>, now: Instant) {
        if !self.dragging {
            return;
        }
        self.dragging = false;

        let pinching = match self.mode {
            Mode::HandTracking { .. } => false,
            Mode::PinchMode { .. } => true,
            _ => return,
        };
        let Some((_, pose)) = Self::handle_pose(ctx) else {
            return;
        };
        let Some(anchor) = Self::anchor_position(ctx) else {
            log::warn!(
                "Handle anchor missing, staying in {}",
                self.mode.kind().as_ref()
            );
            return;
        };

        match self.resolver.resolve(pose.position, anchor) {
            Resolution::Attach => self.attach(ctx),
            Resolution::Drop if pinching => {
                log::debug!("Drag ended mid-pinch, the hand keeps the handle");
            }
            Resolution::Drop => self.start_drop(ctx, now),
        }
    }

    /// Per-frame step: pinch transitions, then due timers, then position.
    pub fn update(&mut self, ctx: &mut HandleContext<'_>, hand: Option<HandSample>, now: Instant) {
        let dt = self
            .last_tick
            .map_or(0.0, |t| now.saturating_duration_since(t).as_secs_f32());
        self.last_tick = Some(now);
        if self.attached {
            return;
        }

        let hand = hand.filter(|h| h.tracked);
        let pinching = hand.is_some_and(|h| h.pinching);
        let hand_pos = hand.and_then(|h| h.position);

        self.update_pinch(ctx, pinching, hand_pos, now);
        self.run_timers(ctx, now);
        self.update_position(ctx, hand_pos, pinching, dt, now);
    }

    fn update_pinch(
        &mut self,
        ctx: &mut HandleContext<'_>,
        pinching: bool,
        hand_pos: Option<Vec3A>,
        now: Instant,
    ) {
        match self.mode {
            Mode::HandTracking { base, .. } if pinching => {
                let Some(target) = hand_pos else {
                    log::debug!("Pinch without a hand position ignored");
                    return;
                };
                ctx.sounds.play(SoundId::PinchGrab);
                self.set_mode(
                    Mode::PinchMode {
                        base,
                        target,
                        activated_at: now,
                        released_at: None,
                    },
                    ctx,
                );
            }
            Mode::PinchMode {
                base,
                target,
                activated_at,
                released_at: None,
            } if !pinching => {
                log::debug!(
                    "Pinch released after {:.2}s, grace {:.1}s",
                    now.saturating_duration_since(activated_at).as_secs_f32(),
                    self.settings.grace_period.as_secs_f32()
                );
                self.timers
                    .schedule_at(TimerKind::PinchGrace, now + self.settings.grace_period);
                self.mode = Mode::PinchMode {
                    base,
                    target,
                    activated_at,
                    released_at: Some(now),
                };
            }
            Mode::PinchMode {
                base,
                released_at: Some(released_at),
                ..
            } if pinching => {
                let Some(target) = hand_pos else {
                    return;
                };
                self.timers.cancel(TimerKind::PinchGrace);
                log::debug!(
                    "Pinch resumed {:.2}s into grace",
                    now.saturating_duration_since(released_at).as_secs_f32()
                );
                ctx.sounds.play(SoundId::PinchGrab);
                self.mode = Mode::PinchMode {
                    base,
                    target,
                    activated_at: now,
                    released_at: None,
                };
            }
            _ => {}
        }
    }

    fn run_timers(&mut self, ctx: &mut HandleContext<'_>, now: Instant) {
        let mut due = VecDeque::new();
        self.timers.retrieve_due(now, &mut due);
        while let Some(kind) = due.pop_front() {
            match kind {
                TimerKind::PinchGrace => {
                    if matches!(self.mode, Mode::PinchMode { released_at: Some(_), .. }) {
                        log::info!("Pinch grace expired, dropping handle");
                        self.start_drop(ctx, now);
                    }
                }
                TimerKind::ProtectiveSettle => self.settle_protective(ctx),
            }
        }
    }

    fn update_position(
        &mut self,
        ctx: &mut HandleContext<'_>,
        hand_pos: Option<Vec3A>,
        pinching: bool,
        dt: f32,
        now: Instant,
    ) {
        match &self.mode {
            Mode::PinchMode {
                released_at: None, ..
            } => self.follow_hand(ctx, hand_pos, dt),
            Mode::BounceAnimating(Bounce::Drop { .. }) => self.step_drop(ctx, now),
            Mode::Grounded { .. } => self.check_protective(ctx, hand_pos, pinching, now),
            _ => {}
        }
    }

    fn follow_hand(&mut self, ctx: &mut HandleContext<'_>, hand_pos: Option<Vec3A>, dt: f32) {
        let Mode::PinchMode { target, .. } = &mut self.mode else {
            return;
        };
        if let Some(pos) = hand_pos {
            *target = pos;
        }
        let target = *target;
        let Some((id, pose)) = Self::handle_pose(ctx) else {
            return;
        };

        let to_target = target - pose.position;
        let distance = to_target.length();
        let mut next = if distance > 0.0 {
            let step = distance.min(self.settings.pinch_follow_speed * dt);
            pose.position + to_target * (step / distance)
        } else {
            target
        };
        if next.distance(target) <= self.settings.pinch_snap_distance {
            next = target;
        }

        if !self.within_ceiling(next, self.settings.pinch_ceiling, Self::anchor_position(ctx)) {
            return;
        }
        let placed = ctx.floor.clamp_placement(next, ctx.scene.local_bounds(id));
        ctx.scene.set_pose(id, Pose::new(placed, pose.rotation));
    }

    fn start_drop(&mut self, ctx: &mut HandleContext<'_>, now: Instant) {
        self.dragging = false;
        let Some((id, pose)) = Self::handle_pose(ctx) else {
            return;
        };
        if ctx.floor.reference().is_none() {
            ctx.floor.compute_floor_reference(&*ctx.scene, ctx.index, now);
        }

        let origin = if pose.position.is_finite() {
            pose.position
        } else {
            log::warn!("Handle position {} is not finite, dropping at anchor", pose.position);
            Self::anchor_position(ctx).unwrap_or(Vec3A::ZERO)
        };
        let bounds = ctx.scene.local_bounds(id);
        let target = Vec3A::new(origin.x, ctx.floor.safe_pivot_y(bounds), origin.z);

        let animation = bounds
            .ok_or(AnimationError::DegenerateBounds(Vec3A::ZERO))
            .and_then(|b| BounceAnimation::build(pose, target, b));

        match animation {
            Ok(animation) => {
                ctx.scene.set_physics(id, PhysicsMode::Kinematic, false);
                ctx.scene.set_collision_shape(id, None);
                self.set_mode(
                    Mode::BounceAnimating(Bounce::Drop {
                        animation,
                        started_at: now,
                        impact_played: false,
                    }),
                    ctx,
                );
            }
            Err(e) => {
                log::warn!("Drop animation unavailable ({}), placing handle directly", e);
                ctx.sounds.play(SoundId::DropImpact);
                let rotation = if pose.rotation.is_finite() {
                    pose.rotation
                } else {
                    glam::Quat::IDENTITY
                };
                self.complete_drop(ctx, id, Pose::new(target, rotation));
            }
        }
    }

    fn step_drop(&mut self, ctx: &mut HandleContext<'_>, now: Instant) {
        let Mode::BounceAnimating(Bounce::Drop {
            animation,
            started_at,
            impact_played,
        }) = &mut self.mode
        else {
            return;
        };

        let elapsed = now.saturating_duration_since(*started_at).as_secs_f32();
        let sample = animation.sample(elapsed);
        let target = animation.target();
        if !*impact_played && elapsed >= animation.impact_time() {
            *impact_played = true;
            ctx.sounds.play(SoundId::DropImpact);
        }

        let Some(id) = ctx.index.get(Role::HandleDetached) else {
            log::warn!("Detached handle vanished mid-drop");
            return;
        };
        if sample.finished() {
            self.complete_drop(ctx, id, target);
        } else {
            ctx.scene.set_pose(id, sample.pose);
        }
    }

    fn complete_drop(&mut self, ctx: &mut HandleContext<'_>, id: EntityId, target: Pose) {
        ctx.scene.set_pose(id, target);
        ctx.scene.set_physics(id, PhysicsMode::Static, false);
        Self::restore_collision(ctx, id);
        log::info!(
            "Handle grounded at y={:.3} (floor {:.3})",
            target.position.y,
            ctx.floor.reference_y()
        );
        self.set_mode(
            Mode::Grounded {
                rest: target.position,
                armed: false,
            },
            ctx,
        );
    }

    fn check_protective(
        &mut self,
        ctx: &mut HandleContext<'_>,
        hand_pos: Option<Vec3A>,
        pinching: bool,
        now: Instant,
    ) {
        let Mode::Grounded { rest, armed } = self.mode else {
            return;
        };
        let near = hand_pos.is_some_and(|p| p.distance(rest) < self.settings.protective_radius);
        if !near {
            if !armed {
                self.mode = Mode::Grounded { rest, armed: true };
            }
            return;
        }
        if pinching || !armed {
            return;
        }
        let Some(id) = ctx.index.get(Role::HandleDetached) else {
            log::warn!("Detached handle is not registered");
            return;
        };

        log::info!("Hand swept past grounded handle, protective bounce");
        ctx.scene.set_physics(id, PhysicsMode::Dynamic, true);
        ctx.scene
            .apply_impulse(id, Vec3A::Y * self.settings.protective_impulse);
        self.timers.schedule_at(
            TimerKind::ProtectiveSettle,
            now + self.settings.protective_settle,
        );
        self.set_mode(
            Mode::BounceAnimating(Bounce::Protective {
                rest,
                started_at: now,
            }),
            ctx,
        );
    }

    fn settle_protective(&mut self, ctx: &mut HandleContext<'_>) {
        let Mode::BounceAnimating(Bounce::Protective { rest, .. }) = self.mode else {
            return;
        };
        let Some((id, pose)) = Self::handle_pose(ctx) else {
            return;
        };

        let settled = Vec3A::new(
            rest.x,
            ctx.floor.reference_y() + self.settings.grounded_height,
            rest.z,
        );
        ctx.scene.set_pose(id, Pose::new(settled, pose.rotation));
        ctx.scene.set_physics(id, PhysicsMode::Static, false);
        self.set_mode(
            Mode::Grounded {
                rest: settled,
                armed: false,
            },
            ctx,
        );
    }

    fn attach(&mut self, ctx: &mut HandleContext<'_>) {
        let (Some(anchor_id), Some(attached_id)) = (
            ctx.index.get(Role::HandleAnchor),
            ctx.index.get(Role::HandleAttached),
        ) else {
            log::warn!("Cannot attach: anchor or attached handle not registered");
            return;
        };
        let Some(anchor) = ctx.scene.pose(anchor_id) else {
            log::warn!("Cannot attach: anchor {:?} has no transform", anchor_id);
            return;
        };

        if let Some(detached) = ctx.index.get(Role::HandleDetached) {
            ctx.scene.set_enabled(detached, false);
            ctx.scene.set_physics(detached, PhysicsMode::Static, false);
            ctx.scene.set_collision_shape(detached, None);
        }
        ctx.scene
            .set_pose(attached_id, self.resolver.attached_pose(anchor));
        ctx.scene.set_enabled(attached_id, true);

        self.timers.cancel(TimerKind::PinchGrace);
        self.timers.cancel(TimerKind::ProtectiveSettle);
        self.attached = true;
        self.dragging = false;

        log::info!("Handle attached");
        ctx.sounds.play(SoundId::Attach);
        ctx.events.push(InteractionEvent::HandleAttached);
        self.set_mode(Mode::Idle, ctx);
    }

    /// Pull the handle off its anchor. Returns false if it was not attached.
    pub fn detach(&mut self, ctx: &mut HandleContext<'_>, now: Instant) -> bool {
        if !self.attached {
            log::debug!("Detach requested but handle is already loose");
            return false;
        }
        let (Some(attached_id), Some(detached_id)) = (
            ctx.index.get(Role::HandleAttached),
            ctx.index.get(Role::HandleDetached),
        ) else {
            log::warn!("Cannot detach: handle representations not registered");
            return false;
        };
        let Some(pose) = ctx.scene.pose(attached_id) else {
            log::warn!("Cannot detach: attached handle has no transform");
            return false;
        };

        ctx.scene.set_enabled(attached_id, false);
        ctx.scene.set_pose(detached_id, pose);
        ctx.scene.set_enabled(detached_id, true);
        ctx.scene
            .set_physics(detached_id, PhysicsMode::Kinematic, false);
        Self::restore_collision(ctx, detached_id);
        ctx.floor.compute_floor_reference(&*ctx.scene, ctx.index, now);

        self.attached = false;
        log::info!("Handle detached");
        ctx.events.push(InteractionEvent::HandleDetached);
        self.set_mode(Mode::Idle, ctx);
        true
    }
}
