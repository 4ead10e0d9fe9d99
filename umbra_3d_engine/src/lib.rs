/*!
# Umbra 3D Engine

Transform hierarchy and shadowed forward rendering for the Umbra3D engine.

The crate is organised around a rendering session (`Engine`) that owns a
`GraphicsDevice` and a `ForwardRenderPipeline`. Each frame the pipeline
uploads the scene's lights to a storage buffer, renders one cube shadow map
per light (up to four), then runs the main color pass and presents.

## Architecture

- **ObjectGraph**: arena of transform nodes with memoized world matrices
- **Camera** / **Light**: transform nodes with cached view/projection matrices
- **GraphicsDevice**: OpenGL-style device seam (a mock implementation ships with the crate)
- **RenderContext**: framebuffer plus GPU state toggles, flagged depth-only or not
- **ForwardRenderPipeline**: PreRender, LightSync, ShadowPass, MainPass, PostRender
- **Scene** / **Material**: traversal and per-object binding seams
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod graphics_device;
pub mod scene;
pub mod camera;
pub mod light;
pub mod render;

// Main umbra3d namespace module
pub mod umbra3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Rendering session
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{EngineConfig, PipelineConfig, DEFAULT_SHADOW_MAP_SIZE, MAX_SHADOW_MAPS};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, format_entry};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod light {
        pub use crate::light::*;
    }

    pub mod render {
        pub use crate::render::*;
    }
}

// Re-export math library at crate root
pub use glam;
