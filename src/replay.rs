//! Scripted sessions: a room layout plus timestamped frames, fed through [`AppState::tick`].

use std::time::{Duration, Instant};

use glam::{Quat, Vec3A};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{
        audio::SoundSink,
        input::HandJoints,
        scene::{Bounds, EntityId, MemoryEntity, MemoryScene, Pose, Role, Scene, SceneIndex},
    },
    config::InteractionConfig,
    handle::controller::ModeKind,
    puzzle::{SwitchDirection, SWITCH_COUNT},
    state::{AppState, DragEvent, FrameInput, InteractionEvent, SwitchGesture},
};

const DEMO_SCRIPT: &str = include_str!("res/demo.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySpec {
    pub position: Vec3A,
    #[serde(default)]
    pub yaw_deg: f32,
    pub size: Vec3A,
}

impl EntitySpec {
    fn spawn(&self, scene: &mut MemoryScene) -> EntityId {
        let rotation = Quat::from_rotation_y(self.yaw_deg.to_radians());
        scene.spawn(MemoryEntity::new(
            Pose::new(self.position, rotation),
            Bounds::from_size(self.size),
        ))
    }
}

fn entity(position: [f32; 3], size: [f32; 3]) -> EntitySpec {
    EntitySpec {
        position: Vec3A::from_array(position),
        yaw_deg: 0.0,
        size: Vec3A::from_array(size),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSpec {
    pub floor: EntitySpec,
    pub anchor: EntitySpec,
    pub handle_attached: EntitySpec,
    pub handle_detached: EntitySpec,
    #[serde(default)]
    pub switches: Vec<EntitySpec>,
}

impl Default for SceneSpec {
    fn default() -> Self {
        Self {
            floor: entity([0.0, -0.05, 0.0], [10.0, 0.1, 10.0]),
            anchor: entity([0.0, 1.2, -1.5], [0.1, 0.1, 0.1]),
            handle_attached: entity([0.0, 1.25, -1.5], [0.05, 0.3, 0.05]),
            handle_detached: entity([0.8, 0.6, -1.0], [0.05, 0.3, 0.05]),
            switches: (0..SWITCH_COUNT)
                .map(|i| entity([-0.4 + 0.2 * i as f32, 1.2, -1.6], [0.04, 0.1, 0.04]))
                .collect(),
        }
    }
}

impl SceneSpec {
    pub fn build(&self) -> (MemoryScene, SceneIndex) {
        let mut scene = MemoryScene::new();
        let mut index = SceneIndex::new();

        index.insert(Role::Floor, self.floor.spawn(&mut scene));
        index.insert(Role::HandleAnchor, self.anchor.spawn(&mut scene));
        index.insert(Role::HandleAttached, self.handle_attached.spawn(&mut scene));
        index.insert(Role::HandleDetached, self.handle_detached.spawn(&mut scene));
        for (i, switch) in self.switches.iter().enumerate().take(SWITCH_COUNT) {
            index.insert(Role::Switch(i as u8 + 1), switch.spawn(&mut scene));
        }
        if self.switches.len() > SWITCH_COUNT {
            log::warn!(
                "Scene lists {} switches, only {} are wired",
                self.switches.len(),
                SWITCH_COUNT
            );
        }
        (scene, index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Began,
    Changed,
    Ended,
}

/// Either an explicit direction or a raw vertical drag that gets classified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwitchSpec {
    pub index: usize,
    #[serde(default)]
    pub direction: Option<SwitchDirection>,
    #[serde(default)]
    pub drag_dy: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSpec {
    /// Seconds since the start of the script.
    pub at: f32,
    #[serde(default)]
    pub left: Option<HandJoints>,
    #[serde(default)]
    pub right: Option<HandJoints>,
    #[serde(default)]
    pub drag: Option<DragPhase>,
    #[serde(default)]
    pub translation: Option<Vec3A>,
    #[serde(default)]
    pub switch: Option<SwitchSpec>,
    #[serde(default)]
    pub detach: bool,
}

impl FrameSpec {
    fn to_input(&self, dead_zone: f32) -> FrameInput {
        let drag = match self.drag {
            Some(DragPhase::Began) => Some(DragEvent::Began),
            Some(DragPhase::Changed) => {
                let translation = self.translation.unwrap_or_else(|| {
                    log::warn!("Drag change at {:.2}s has no translation", self.at);
                    Vec3A::ZERO
                });
                Some(DragEvent::Changed(translation))
            }
            Some(DragPhase::Ended) => Some(DragEvent::Ended),
            None => None,
        };

        let switch = self.switch.and_then(|s| {
            let direction = s
                .direction
                .or_else(|| s.drag_dy.and_then(|dy| SwitchDirection::from_drag(dy, dead_zone)));
            if direction.is_none() {
                log::debug!("Switch {} gesture at {:.2}s too small", s.index, self.at);
            }
            direction.map(|direction| SwitchGesture {
                index: s.index,
                direction,
            })
        });

        FrameInput {
            left: self.left,
            right: self.right,
            drag,
            switch,
            detach: self.detach,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub scene: SceneSpec,
    pub frames: Vec<FrameSpec>,
}

impl ReplayScript {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let mut script: Self = serde_yaml::from_str(yaml)?;
        if script.frames.windows(2).any(|w| w[1].at < w[0].at) {
            log::warn!("Script frames out of order, sorting by time");
            script.frames.sort_by(|a, b| a.at.total_cmp(&b.at));
        }
        Ok(script)
    }

    pub fn demo() -> anyhow::Result<Self> {
        Self::from_yaml(DEMO_SCRIPT)
    }
}

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub events: Vec<(f32, InteractionEvent)>,
    pub mode: ModeKind,
    pub attached: bool,
    pub switches: String,
    pub solved: bool,
    pub handle_position: Option<Vec3A>,
}

pub fn run<A>(
    config: InteractionConfig,
    script: &ReplayScript,
    sounds: A,
) -> anyhow::Result<ReplaySummary>
where
    A: SoundSink,
{
    let (scene, index) = script.scene.build();
    let dead_zone = config.switch_drag_dead_zone;
    let t0 = Instant::now();
    let mut app = AppState::new(config, scene, index, sounds, t0)?;

    let mut events = Vec::new();
    for frame in &script.frames {
        let Some(now) = Duration::try_from_secs_f32(frame.at)
            .ok()
            .and_then(|offset| t0.checked_add(offset))
        else {
            log::warn!("Skipping frame with bad timestamp {}", frame.at);
            continue;
        };
        for event in app.tick(&frame.to_input(dead_zone), now) {
            log::info!("[{:6.2}s] {:?}", frame.at, event);
            events.push((frame.at, event));
        }
    }

    let handle_position = app
        .index
        .get(Role::HandleDetached)
        .and_then(|id| app.scene.pose(id))
        .map(|p| p.position);

    Ok(ReplaySummary {
        events,
        mode: app.handle.kind(),
        attached: app.handle.is_attached(),
        switches: app.puzzle.state_string(),
        solved: app.puzzle.is_solved(),
        handle_position,
    })
}
