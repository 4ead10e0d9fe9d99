/// Umbra3D Engine - rendering session
///
/// An `Engine` owns the graphics device and the render pipeline for one
/// window. It is created once, passed around by `&mut`, and torn down with
/// `shutdown`. Nothing here is a global except the logger slot, which every
/// module reaches through the `engine_*!` macros.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use winit::event::WindowEvent;
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::render::{ForwardRenderPipeline, FrameStats, RenderPipeline};
use crate::scene::Scene;

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

// ===== PUBLIC API =====

/// Rendering session
///
/// # Example
///
/// ```no_run
/// use umbra_3d_engine::umbra3d::{Engine, EngineConfig};
/// use umbra_3d_engine::umbra3d::camera::CameraConfiguration;
/// use umbra_3d_engine::umbra3d::graphics_device::mock_graphics_device::MockGraphicsDevice;
/// use umbra_3d_engine::umbra3d::scene::BasicScene;
///
/// let mut engine = Engine::new(Box::new(MockGraphicsDevice::new(1280, 720)), EngineConfig::default())?;
/// let mut scene = BasicScene::new(CameraConfiguration::default());
/// scene.add_light(umbra_3d_engine::glam::Vec3::new(0.0, 4.0, 0.0), umbra_3d_engine::glam::Vec3::ONE, 12.0);
///
/// engine.render_frame(&scene)?;
/// engine.shutdown();
/// # Ok::<(), umbra_3d_engine::umbra3d::Error>(())
/// ```
pub struct Engine {
    // Declared first so GPU resources are released while the device is alive
    pipeline: ForwardRenderPipeline,
    device: Box<dyn GraphicsDevice>,
    config: EngineConfig,
    frame_count: u64,
}

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("umbra3d::Engine", "Initialization failed: {}", msg);
            }
            Error::InvalidConfig(msg) => {
                crate::engine_error!("umbra3d::Engine", "Invalid configuration: {}", msg);
            }
            _ => {
                crate::engine_error!("umbra3d::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    /// Create a session rendering through `device`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the pipeline settings are rejected,
    /// or the device error if the shadow program cannot be built.
    pub fn new(mut device: Box<dyn GraphicsDevice>, config: EngineConfig) -> Result<Self> {
        let pipeline = ForwardRenderPipeline::new(device.as_mut(), config.pipeline.clone())
            .map_err(Self::log_and_return_error)?;

        crate::engine_info!(
            "umbra3d::Engine",
            "Engine started for '{}' ({}x{})",
            config.app_name,
            config.window_size.0,
            config.window_size.1
        );

        Ok(Self {
            pipeline,
            device,
            config,
            frame_count: 0,
        })
    }

    /// Render and present one frame
    pub fn render_frame(&mut self, scene: &dyn Scene) -> Result<FrameStats> {
        let stats = self.pipeline.render_frame(self.device.as_mut(), scene)?;
        self.frame_count += 1;
        Ok(stats)
    }

    /// Resize the window surface and adapt `camera` to it
    ///
    /// A zero-sized surface (minimized window) is ignored.
    pub fn resize(&mut self, width: u32, height: u32, camera: &mut Camera) -> Result<()> {
        if width == 0 || height == 0 {
            crate::engine_debug!("umbra3d::Engine", "Ignoring resize to {}x{}", width, height);
            return Ok(());
        }
        self.device.resize(width, height)?;
        self.pipeline.resize(self.device.as_ref());
        camera.resize(width, height);
        self.config.window_size = (width, height);
        Ok(())
    }

    /// Route a window event, returning whether the engine consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent, camera: &mut Camera) -> Result<bool> {
        match event {
            WindowEvent::Resized(size) => {
                self.resize(size.width, size.height, camera)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    pub fn pipeline(&self) -> &ForwardRenderPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut ForwardRenderPipeline {
        &mut self.pipeline
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frames rendered and presented successfully
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Release the pipeline's GPU resources, then the device
    pub fn shutdown(self) {
        let Self { pipeline, device, config, frame_count } = self;
        drop(pipeline);
        drop(device);
        crate::engine_info!(
            "umbra3d::Engine",
            "Engine for '{}' shut down after {} frames",
            config.app_name,
            frame_count
        );
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, network logger, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use umbra_3d_engine::umbra3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
