use std::time::Instant;

use glam::Vec3A;
use serde::{Deserialize, Serialize};

use crate::{
    backend::{
        audio::SoundSink,
        common::PuzzleError,
        input::{Chirality, HandJoints, InputState, PinchSettings},
        scene::{Role, Scene, SceneIndex},
    },
    config::InteractionConfig,
    handle::{
        attach::AttachmentResolver,
        controller::{ControllerSettings, DetachedObjectController, ModeKind},
        floor::FloorSafety,
        HandleContext,
    },
    puzzle::{SwitchDirection, SwitchPattern, SwitchPuzzle, ToggleOutcome},
};

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    ModeChanged { from: ModeKind, to: ModeKind },
    HandleAttached,
    HandleDetached,
    SwitchChanged { index: usize, state: SwitchPattern },
    PuzzleSolved,
}

/// Drag gesture on the loose handle; translations are cumulative since `Began`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    Began,
    Changed(Vec3A),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchGesture {
    pub index: usize,
    pub direction: SwitchDirection,
}

#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub left: Option<HandJoints>,
    pub right: Option<HandJoints>,
    pub drag: Option<DragEvent>,
    pub switch: Option<SwitchGesture>,
    pub detach: bool,
}

/// Everything one session needs, owned in one place.
pub struct AppState<S, A>
where
    S: Scene,
    A: SoundSink,
{
    pub config: InteractionConfig,
    pub scene: S,
    pub index: SceneIndex,
    pub sounds: A,
    pub input_state: InputState,
    pub floor: FloorSafety,
    pub handle: DetachedObjectController,
    pub puzzle: SwitchPuzzle,
}

impl<S, A> AppState<S, A>
where
    S: Scene,
    A: SoundSink,
{
    pub fn new(
        config: InteractionConfig,
        mut scene: S,
        index: SceneIndex,
        sounds: A,
        now: Instant,
    ) -> anyhow::Result<Self> {
        config.post_load()?;
        let pattern = config.pattern()?;

        let mut resolver = AttachmentResolver::new(config.attach_threshold);
        if let Err(e) = resolver.capture_initial(&scene, &index) {
            log::warn!("Attached handle pose unknown ({}), attaching at the anchor origin", e);
        }

        let attached = config.handle_starts_attached;
        if let Some(id) = index.get(Role::HandleAttached) {
            scene.set_enabled(id, attached);
        }
        if let Some(id) = index.get(Role::HandleDetached) {
            scene.set_enabled(id, !attached);
        }

        let mut floor = FloorSafety::new(config.absolute_safety_height);
        floor.compute_floor_reference(&scene, &index, now);

        let input_state = InputState::new(PinchSettings {
            threshold: config.pinch_threshold,
            forward_offset: config.hand_forward_offset,
        });
        let handle =
            DetachedObjectController::new(ControllerSettings::from(&config), resolver, attached);

        log::info!(
            "Session ready: handle {}, target combination {}",
            if attached { "attached" } else { "loose" },
            pattern
        );

        Ok(Self {
            config,
            scene,
            index,
            sounds,
            input_state,
            floor,
            handle,
            puzzle: SwitchPuzzle::new(pattern),
        })
    }

    /// One frame. Pinch transitions run before position updates, which run
    /// before the drag-end attachment check.
    pub fn tick(&mut self, frame: &FrameInput, now: Instant) -> Vec<InteractionEvent> {
        let mut events = Vec::new();

        self.input_state.pre_update();
        self.input_state
            .update_hand(Chirality::Left, frame.left.as_ref());
        self.input_state
            .update_hand(Chirality::Right, frame.right.as_ref());
        self.input_state.post_update();
        let hand = self.input_state.active_sample();

        {
            let mut ctx = HandleContext {
                scene: &mut self.scene,
                index: &self.index,
                sounds: &mut self.sounds,
                floor: &mut self.floor,
                events: &mut events,
            };

            if frame.detach {
                self.handle.detach(&mut ctx, now);
            }
            if frame.drag == Some(DragEvent::Began) {
                self.handle.begin_drag(&mut ctx, now);
            }

            self.handle.update(&mut ctx, hand, now);

            match frame.drag {
                Some(DragEvent::Changed(translation)) => {
                    self.handle.drag_changed(&mut ctx, translation);
                }
                Some(DragEvent::Ended) => self.handle.end_drag(&mut ctx, now),
                _ => {}
            }
        }

        if let Some(gesture) = frame.switch {
            if let Err(e) = self.toggle_switch(gesture.index, gesture.direction, &mut events) {
                log::warn!("Switch gesture dropped: {}", e);
            }
        }

        events
    }

    /// Switch 1 has no lever until the handle sits on its anchor.
    pub fn toggle_switch(
        &mut self,
        index: usize,
        direction: SwitchDirection,
        events: &mut Vec<InteractionEvent>,
    ) -> Result<ToggleOutcome, PuzzleError> {
        if index == 1 && !self.handle.is_attached() {
            log::debug!("Switch 1 has no handle, gesture ignored");
            return Ok(ToggleOutcome::Unchanged);
        }

        let outcome = self.puzzle.toggle(index, direction, &mut self.sounds)?;
        if let ToggleOutcome::Changed { solved } = outcome {
            events.push(InteractionEvent::SwitchChanged {
                index,
                state: self.puzzle.state(),
            });
            if solved {
                events.push(InteractionEvent::PuzzleSolved);
            }
        }
        Ok(outcome)
    }

    pub fn detach_handle(&mut self, now: Instant) -> Vec<InteractionEvent> {
        let mut events = Vec::new();
        let mut ctx = HandleContext {
            scene: &mut self.scene,
            index: &self.index,
            sounds: &mut self.sounds,
            floor: &mut self.floor,
            events: &mut events,
        };
        self.handle.detach(&mut ctx, now);
        events
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Quat;

    use super::*;
    use crate::{
        backend::{
            audio::{SoundId, SoundLog},
            scene::{MemoryScene, PhysicsMode, Pose},
            task::TimerKind,
        },
        handle::controller::{Bounce, Mode},
        replay::SceneSpec,
    };

    type TestApp = AppState<MemoryScene, SoundLog>;

    fn app_with(config: InteractionConfig, t0: Instant) -> TestApp {
        let (scene, index) = SceneSpec::default().build();
        AppState::new(config, scene, index, SoundLog::new(), t0).unwrap()
    }

    fn app(t0: Instant) -> TestApp {
        app_with(InteractionConfig::default(), t0)
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    /// Joints whose derived hand position is exactly `pos`.
    fn hand_at(pos: Vec3A, pinching: bool) -> HandJoints {
        let wrist = pos + Vec3A::new(0.0, 0.0, 0.08);
        let index_tip = wrist + Vec3A::new(0.0, 0.0, -0.15);
        let gap = if pinching { 0.01 } else { 0.1 };
        HandJoints {
            wrist,
            thumb_tip: index_tip + Vec3A::new(gap, 0.0, 0.0),
            index_tip,
        }
    }

    fn right(pos: Vec3A, pinching: bool) -> FrameInput {
        FrameInput {
            right: Some(hand_at(pos, pinching)),
            ..Default::default()
        }
    }

    fn drag(event: DragEvent) -> FrameInput {
        FrameInput {
            drag: Some(event),
            ..Default::default()
        }
    }

    fn handle_id(app: &TestApp) -> crate::backend::scene::EntityId {
        app.index.get(Role::HandleDetached).unwrap()
    }

    fn handle_pos(app: &TestApp) -> Vec3A {
        app.scene.pose(handle_id(app)).unwrap().position
    }

    fn place_handle(app: &mut TestApp, pos: Vec3A) {
        let id = handle_id(app);
        app.scene.set_pose(id, Pose::new(pos, Quat::IDENTITY));
    }

    fn anchor_pos(app: &TestApp) -> Vec3A {
        let id = app.index.get(Role::HandleAnchor).unwrap();
        app.scene.pose(id).unwrap().position
    }

    /// Drag, pinch, release; returns the instant the pinch was released.
    fn pinch_then_release(app: &mut TestApp, t0: Instant) -> Instant {
        let hand = handle_pos(app);
        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&right(hand, true), at(t0, 100));
        assert_eq!(app.handle.kind(), ModeKind::PinchMode);
        app.tick(&right(hand, false), at(t0, 200));
        assert!(app.handle.is_timer_pending(TimerKind::PinchGrace));
        at(t0, 200)
    }

    /// Drop the loose handle from where it is and run the animation out.
    fn drop_and_settle(app: &mut TestApp, start: Instant) -> Instant {
        app.tick(&drag(DragEvent::Began), start);
        app.tick(&drag(DragEvent::Changed(Vec3A::new(0.0, 90.0, 0.0))), start);
        app.tick(&drag(DragEvent::Ended), start);
        assert_eq!(app.handle.kind(), ModeKind::BounceAnimating);
        let done = start + Duration::from_millis(1500);
        app.tick(&FrameInput::default(), done);
        assert_eq!(app.handle.kind(), ModeKind::Grounded);
        done
    }

    #[test]
    fn test_switch_scenario() {
        let t0 = Instant::now();
        let mut app = app(t0);
        assert_eq!(app.puzzle.state_string(), "00000");

        let gestures = [
            (2, SwitchDirection::Down),
            (3, SwitchDirection::Down),
            (1, SwitchDirection::Up),
            (4, SwitchDirection::Up),
            (5, SwitchDirection::Up),
        ];
        let mut events = Vec::new();
        for (i, (index, direction)) in gestures.into_iter().enumerate() {
            let frame = FrameInput {
                switch: Some(SwitchGesture { index, direction }),
                ..Default::default()
            };
            events.extend(app.tick(&frame, at(t0, i as u64 * 16)));
        }

        assert_eq!(app.puzzle.state_string(), "01100");
        let solved = events
            .iter()
            .filter(|e| **e == InteractionEvent::PuzzleSolved)
            .count();
        assert_eq!(solved, 1);
        assert_eq!(app.sounds.count(SoundId::Toggle), 2);
        assert_eq!(app.sounds.count(SoundId::PuzzleSolved), 1);
    }

    #[test]
    fn test_switch_one_needs_handle() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let mut events = Vec::new();
        assert_eq!(
            app.toggle_switch(1, SwitchDirection::Down, &mut events),
            Ok(ToggleOutcome::Unchanged)
        );
        assert_eq!(app.puzzle.state_string(), "00000");

        let mut attached = app_with(
            InteractionConfig {
                handle_starts_attached: true,
                ..Default::default()
            },
            t0,
        );
        assert_eq!(
            attached.toggle_switch(1, SwitchDirection::Down, &mut events),
            Ok(ToggleOutcome::Changed { solved: false })
        );
        assert_eq!(attached.puzzle.state_string(), "10000");
    }

    #[test]
    fn test_protective_bounce_scenario() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let grounded = drop_and_settle(&mut app, t0);

        let rest = handle_pos(&app);
        // hand away first arms the rule
        app.tick(&FrameInput::default(), grounded + Duration::from_millis(16));
        let swept = grounded + Duration::from_millis(32);
        app.tick(&right(rest + Vec3A::new(0.3, 0.0, 0.0), false), swept);
        assert!(matches!(
            app.handle.mode(),
            Mode::BounceAnimating(Bounce::Protective { .. })
        ));

        let id = handle_id(&app);
        let entity = app.scene.entity(id).unwrap();
        assert_eq!(entity.physics, PhysicsMode::Dynamic);
        assert!(entity.gravity);
        assert_eq!(entity.impulses.len(), 1);
        assert!(entity.impulses[0].y > 0.0);

        app.tick(
            &right(rest + Vec3A::new(0.3, 0.0, 0.0), false),
            swept + Duration::from_millis(1000),
        );
        assert_eq!(app.handle.kind(), ModeKind::Grounded);
        let y = handle_pos(&app).y;
        assert!((y - (app.floor.reference_y() + 0.08)).abs() < 1e-6);
        assert_eq!(app.scene.physics(id), Some((PhysicsMode::Static, false)));

        // the hand never left, so no second bounce
        app.tick(
            &right(rest + Vec3A::new(0.3, 0.0, 0.0), false),
            swept + Duration::from_millis(1100),
        );
        assert_eq!(app.handle.kind(), ModeKind::Grounded);
    }

    #[test]
    fn test_pinching_hand_near_grounded_handle_is_ignored() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let grounded = drop_and_settle(&mut app, t0);
        let rest = handle_pos(&app);
        app.tick(&FrameInput::default(), grounded + Duration::from_millis(16));
        app.tick(&right(rest, true), grounded + Duration::from_millis(32));
        assert_eq!(app.handle.kind(), ModeKind::Grounded);
        assert_eq!(handle_pos(&app), rest);
    }

    #[test]
    fn test_pinch_resumes_within_grace() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let released = pinch_then_release(&mut app, t0);
        let hand = handle_pos(&app);

        let resumed = released + Duration::from_millis(1000);
        let events = app.tick(&right(hand, true), resumed);
        assert_eq!(app.handle.kind(), ModeKind::PinchMode);
        assert!(!app.handle.is_timer_pending(TimerKind::PinchGrace));
        assert!(events.is_empty());

        app.tick(&right(hand, true), released + Duration::from_millis(3000));
        assert_eq!(app.handle.kind(), ModeKind::PinchMode);
        assert_eq!(app.sounds.count(SoundId::DropImpact), 0);
        assert_eq!(app.sounds.count(SoundId::PinchGrab), 2);
    }

    #[test]
    fn test_pinch_grace_expiry_drops() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let released = pinch_then_release(&mut app, t0);

        app.tick(&FrameInput::default(), released + Duration::from_millis(1500));
        assert_eq!(app.handle.kind(), ModeKind::PinchMode);

        app.tick(&FrameInput::default(), released + Duration::from_millis(2500));
        assert_eq!(app.handle.kind(), ModeKind::BounceAnimating);
        assert!(!app.handle.is_timer_pending(TimerKind::PinchGrace));

        app.tick(&FrameInput::default(), released + Duration::from_millis(4000));
        assert_eq!(app.handle.kind(), ModeKind::Grounded);
        assert_eq!(app.sounds.count(SoundId::DropImpact), 1);

        let min_y = app.floor.safe_pivot_y(app.scene.local_bounds(handle_id(&app)));
        assert!((handle_pos(&app).y - min_y).abs() < 1e-6);
    }

    #[test]
    fn test_pinch_follows_hand() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let start = handle_pos(&app);
        app.tick(&drag(DragEvent::Began), t0);

        let hand = start + Vec3A::new(0.0, 0.3, 0.0);
        app.tick(&right(hand, true), at(t0, 100));
        // 2 m/s for 0.1 s covers 0.2 of the 0.3
        assert!(handle_pos(&app).abs_diff_eq(start + Vec3A::new(0.0, 0.2, 0.0), 1e-4));

        app.tick(&right(hand, true), at(t0, 140));
        // within snap distance after the next step
        assert!(handle_pos(&app).abs_diff_eq(hand, 1e-5));
    }

    #[test]
    fn test_drag_end_near_anchor_attaches() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let anchor = anchor_pos(&app);
        place_handle(&mut app, anchor + Vec3A::new(0.25, 0.0, 0.0));

        app.tick(&drag(DragEvent::Began), t0);
        let events = app.tick(&drag(DragEvent::Ended), at(t0, 16));

        assert!(app.handle.is_attached());
        assert_eq!(app.handle.kind(), ModeKind::Idle);
        assert!(events.contains(&InteractionEvent::HandleAttached));
        assert!(!app.scene.is_enabled(handle_id(&app)));
        let attached = app.index.get(Role::HandleAttached).unwrap();
        assert!(app.scene.is_enabled(attached));
        assert_eq!(app.sounds.count(SoundId::Attach), 1);
    }

    #[test]
    fn test_drag_end_far_from_anchor_drops() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let anchor = anchor_pos(&app);
        place_handle(&mut app, anchor + Vec3A::new(0.5, 0.0, 0.0));

        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&drag(DragEvent::Ended), at(t0, 16));
        assert!(!app.handle.is_attached());
        assert_eq!(app.handle.kind(), ModeKind::BounceAnimating);
    }

    #[test]
    fn test_attach_detach_round_trip() {
        let t0 = Instant::now();
        let mut app = app_with(
            InteractionConfig {
                handle_starts_attached: true,
                ..Default::default()
            },
            t0,
        );
        let attached = app.index.get(Role::HandleAttached).unwrap();
        let original = app.scene.pose(attached).unwrap();

        let events = app.detach_handle(t0);
        assert!(events.contains(&InteractionEvent::HandleDetached));
        assert!(!app.handle.is_attached());
        assert!(!app.scene.is_enabled(attached));
        assert!(app.scene.is_enabled(handle_id(&app)));

        // wander off and come back
        app.tick(&drag(DragEvent::Began), at(t0, 16));
        app.tick(&drag(DragEvent::Changed(Vec3A::new(60.0, 0.0, 0.0))), at(t0, 32));
        app.tick(&drag(DragEvent::Changed(Vec3A::new(0.0, 0.0, 0.0))), at(t0, 48));
        app.tick(&drag(DragEvent::Ended), at(t0, 64));
        assert!(app.handle.is_attached());

        let restored = app.scene.pose(attached).unwrap();
        assert!(restored.position.abs_diff_eq(original.position, 1e-5));
        assert!(restored.rotation.abs_diff_eq(original.rotation, 1e-5));
    }

    #[test]
    fn test_glitch_frame_leaves_handle_in_place() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&drag(DragEvent::Changed(Vec3A::new(20.0, 0.0, 0.0))), at(t0, 16));
        let before = handle_pos(&app);

        app.tick(&drag(DragEvent::Changed(Vec3A::new(520.0, 0.0, 0.0))), at(t0, 32));
        assert_eq!(handle_pos(&app), before);

        app.tick(&drag(DragEvent::Changed(Vec3A::new(530.0, 0.0, 0.0))), at(t0, 48));
        assert!(handle_pos(&app).abs_diff_eq(before + Vec3A::new(0.03, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_ceiling_rejects_unless_near_anchor() {
        let t0 = Instant::now();
        let mut app = app(t0);
        place_handle(&mut app, Vec3A::new(14.5, 0.5, 0.0));

        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&drag(DragEvent::Changed(Vec3A::new(90.0, 0.0, 0.0))), at(t0, 16));
        assert!((handle_pos(&app).x - 14.77).abs() < 1e-4);

        app.tick(&drag(DragEvent::Changed(Vec3A::new(180.0, 0.0, 0.0))), at(t0, 32));
        assert!((handle_pos(&app).x - 14.77).abs() < 1e-4);

        // same move is fine once the anchor is close by
        let anchor = app.index.get(Role::HandleAnchor).unwrap();
        app.scene
            .set_pose(anchor, Pose::new(Vec3A::new(15.5, 0.5, 0.0), Quat::IDENTITY));
        // the rejected frame never accumulated, so this lands one step further
        app.tick(&drag(DragEvent::Changed(Vec3A::new(270.0, 0.0, 0.0))), at(t0, 48));
        assert!((handle_pos(&app).x - 15.04).abs() < 1e-4);
    }

    #[test]
    fn test_pinch_ceiling_rejects_unless_near_anchor() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let start = Vec3A::new(9.8, 0.5, 0.0);
        place_handle(&mut app, start);

        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&right(start, true), at(t0, 100));
        assert_eq!(app.handle.kind(), ModeKind::PinchMode);

        let beyond = Vec3A::new(10.5, 0.5, 0.0);
        app.tick(&right(beyond, true), at(t0, 1100));
        assert!(handle_pos(&app).abs_diff_eq(start, 1e-4));
        assert_eq!(app.handle.kind(), ModeKind::PinchMode);

        let anchor = app.index.get(Role::HandleAnchor).unwrap();
        app.scene.set_pose(anchor, Pose::new(beyond, Quat::IDENTITY));
        app.tick(&right(beyond, true), at(t0, 1200));
        assert!((handle_pos(&app).x - 10.0).abs() < 1e-4);
        app.tick(&right(beyond, true), at(t0, 1600));
        assert!(handle_pos(&app).abs_diff_eq(beyond, 1e-4));
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let t0 = Instant::now();
        for config in [
            InteractionConfig {
                grace_period: -1.0,
                ..Default::default()
            },
            InteractionConfig {
                protective_settle: f32::NAN,
                ..Default::default()
            },
            InteractionConfig {
                winning_pattern: "0110".into(),
                ..Default::default()
            },
        ] {
            let (scene, index) = SceneSpec::default().build();
            assert!(AppState::new(config, scene, index, SoundLog::new(), t0).is_err());
        }
    }

    #[test]
    fn test_drag_end_without_anchor_keeps_mode() {
        let t0 = Instant::now();
        let (scene, full) = SceneSpec::default().build();
        let mut index = SceneIndex::new();
        for role in [Role::Floor, Role::HandleAttached, Role::HandleDetached] {
            index.insert(role, full.get(role).unwrap());
        }
        let mut app =
            AppState::new(InteractionConfig::default(), scene, index, SoundLog::new(), t0)
                .unwrap();
        let before = handle_pos(&app);

        app.tick(&drag(DragEvent::Began), t0);
        let events = app.tick(&drag(DragEvent::Ended), at(t0, 16));
        assert_eq!(app.handle.kind(), ModeKind::HandTracking);
        assert!(!app.handle.is_dragging());
        assert!(!app.handle.is_attached());
        assert!(events.is_empty());

        app.tick(&FrameInput::default(), at(t0, 2000));
        assert_eq!(handle_pos(&app), before);
        assert_eq!(app.sounds.count(SoundId::DropImpact), 0);
    }

    #[test]
    fn test_repeated_drops_do_not_drift() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let min_y = app.floor.safe_pivot_y(app.scene.local_bounds(handle_id(&app)));

        let mut now = t0;
        for _ in 0..20 {
            now = drop_and_settle(&mut app, now + Duration::from_millis(16));
            let y = handle_pos(&app).y;
            assert!(y >= min_y - 1e-6);
            assert!((y - min_y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_drag_ignored_while_dropping() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&drag(DragEvent::Ended), at(t0, 16));
        assert_eq!(app.handle.kind(), ModeKind::BounceAnimating);

        app.tick(&drag(DragEvent::Began), at(t0, 100));
        assert_eq!(app.handle.kind(), ModeKind::BounceAnimating);
        assert!(!app.handle.is_dragging());
    }

    #[test]
    fn test_degenerate_bounds_still_grounds_safely() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let id = handle_id(&app);
        app.scene.entity_mut(id).unwrap().local_bounds =
            crate::backend::scene::Bounds::from_size(Vec3A::ZERO);

        app.tick(&drag(DragEvent::Began), t0);
        app.tick(&drag(DragEvent::Ended), at(t0, 16));
        assert_eq!(app.handle.kind(), ModeKind::Grounded);
        let y = handle_pos(&app).y;
        assert!((y - (app.floor.reference_y() + 0.10)).abs() < 1e-6);
        assert_eq!(app.scene.physics(id), Some((PhysicsMode::Static, false)));
    }

    #[test]
    fn test_drag_from_grounded_cancels_protective_bounce() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let grounded = drop_and_settle(&mut app, t0);
        let rest = handle_pos(&app);
        app.tick(&FrameInput::default(), grounded + Duration::from_millis(16));
        app.tick(
            &right(rest + Vec3A::new(0.2, 0.0, 0.0), false),
            grounded + Duration::from_millis(32),
        );
        assert!(app.handle.is_timer_pending(TimerKind::ProtectiveSettle));

        app.tick(&drag(DragEvent::Began), grounded + Duration::from_millis(48));
        assert_eq!(app.handle.kind(), ModeKind::HandTracking);
        assert!(!app.handle.is_timer_pending(TimerKind::ProtectiveSettle));
    }
}
