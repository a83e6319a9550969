use glam::Vec3A;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr)]
pub enum Chirality {
    #[default]
    Left,
    Right,
}

/// Raw joints reported by the tracking runtime for one hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandJoints {
    pub wrist: Vec3A,
    pub thumb_tip: Vec3A,
    pub index_tip: Vec3A,
}

/// Derived per-hand state. `position == None` means "no position", never stale data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandSample {
    pub chirality: Chirality,
    pub tracked: bool,
    pub position: Option<Vec3A>,
    pub pinching: bool,
}

impl HandSample {
    const fn untracked(chirality: Chirality) -> Self {
        Self {
            chirality,
            tracked: false,
            position: None,
            pinching: false,
        }
    }
}

pub struct Hand {
    pub chirality: Chirality,
    pub now: HandSample,
    pub before: HandSample,
}

impl Hand {
    const fn new(chirality: Chirality) -> Self {
        Self {
            chirality,
            now: HandSample::untracked(chirality),
            before: HandSample::untracked(chirality),
        }
    }

    pub fn pinch_started(&self) -> bool {
        self.now.pinching && !self.before.pinching
    }

    pub fn pinch_released(&self) -> bool {
        !self.now.pinching && self.before.pinching
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PinchSettings {
    pub threshold: f32,
    pub forward_offset: f32,
}

impl Default for PinchSettings {
    fn default() -> Self {
        Self {
            threshold: 0.04,
            forward_offset: 0.08,
        }
    }
}

pub struct InputState {
    pub hands: [Hand; 2],
    settings: PinchSettings,
}

impl InputState {
    pub const fn new(settings: PinchSettings) -> Self {
        Self {
            hands: [Hand::new(Chirality::Left), Hand::new(Chirality::Right)],
            settings,
        }
    }

    pub fn pre_update(&mut self) {
        self.hands[0].before = self.hands[0].now;
        self.hands[1].before = self.hands[1].now;
    }

    /// Feed the joints for one hand; `None` means the runtime lost it.
    pub fn update_hand(&mut self, chirality: Chirality, joints: Option<&HandJoints>) {
        let settings = self.settings;
        let hand = &mut self.hands[chirality as usize];
        hand.now = match joints {
            Some(joints) => sample_from_joints(chirality, joints, &settings),
            None => HandSample::untracked(chirality),
        };
    }

    pub fn post_update(&mut self) {
        #[cfg(debug_assertions)]
        for hand in &self.hands {
            if hand.now.tracked != hand.before.tracked {
                log::debug!(
                    "Hand {}: tracked {}",
                    hand.chirality.as_ref(),
                    hand.now.tracked
                );
            }
            if hand.pinch_started() {
                log::debug!("Hand {}: pinch start", hand.chirality.as_ref());
            } else if hand.pinch_released() {
                log::debug!("Hand {}: pinch release", hand.chirality.as_ref());
            }
        }
    }

    pub fn hand(&self, chirality: Chirality) -> &Hand {
        &self.hands[chirality as usize]
    }

    /// The hand that drives interaction: right if tracked, else left.
    pub fn active_hand(&self) -> Option<&Hand> {
        [Chirality::Right, Chirality::Left]
            .into_iter()
            .map(|c| self.hand(c))
            .find(|h| h.now.tracked)
    }

    pub fn active_sample(&self) -> Option<HandSample> {
        self.active_hand().map(|h| h.now)
    }
}

fn sample_from_joints(
    chirality: Chirality,
    joints: &HandJoints,
    settings: &PinchSettings,
) -> HandSample {
    if !(joints.wrist.is_finite() && joints.thumb_tip.is_finite() && joints.index_tip.is_finite())
    {
        log::debug!("Hand {}: non-finite joints dropped", chirality.as_ref());
        return HandSample::untracked(chirality);
    }

    let pinching = joints.thumb_tip.distance(joints.index_tip) < settings.threshold;

    let forward = (joints.index_tip - joints.wrist).normalize_or_zero();
    let position = joints.wrist + forward * settings.forward_offset;

    HandSample {
        chirality,
        tracked: true,
        position: Some(position),
        pinching,
    }
}
