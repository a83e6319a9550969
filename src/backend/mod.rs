pub mod audio;
pub mod common;
pub mod gesture;
pub mod input;
pub mod scene;
pub mod task;
