//! Camera module - a transform node with view and projection matrices.
//!
//! Cameras are owned by the caller (usually the `Scene`); the engine only
//! reads them when a frame is rendered or the window is resized.

mod camera;

pub use camera::{Camera, CameraConfiguration, YAW_CORRECTION};
