//! Scene module
//!
//! Provides the transform hierarchy (`ObjectGraph`) and the `Scene` seam the
//! render pipeline traverses every pass.

mod object_graph;
mod scene;
mod basic_scene;

pub use object_graph::{EngineObject, ObjectGraph, ObjectKey};
pub use scene::Scene;
pub use basic_scene::BasicScene;
