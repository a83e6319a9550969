pub mod attach;
pub mod bounce;
pub mod controller;
pub mod floor;

use crate::{
    backend::{
        audio::SoundSink,
        scene::{Scene, SceneIndex},
    },
    state::InteractionEvent,
};

use floor::FloorSafety;

/// Collaborators the handle controller borrows for one call.
pub struct HandleContext<'a> {
    pub scene: &'a mut dyn Scene,
    pub index: &'a SceneIndex,
    pub sounds: &'a mut dyn SoundSink,
    pub floor: &'a mut FloorSafety,
    pub events: &'a mut Vec<InteractionEvent>,
}
