use thiserror::Error;

use super::scene::Role;

#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("scene entity for {0:?} is not registered")]
    MissingEntity(Role),
}

#[derive(Error, Debug, PartialEq)]
pub enum AnimationError {
    #[error("non-finite drop endpoint {0}")]
    NonFinite(glam::Vec3A),
    #[error("cannot pick a resting face from bounds {0}")]
    DegenerateBounds(glam::Vec3A),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("switch index {0} is outside 1..=5")]
    InvalidSwitch(usize),
    #[error("switch pattern must be five 0/1 characters, got {0:?}")]
    BadPattern(String),
}
