/// Mock graphics device (no GPU required)
///
/// Records every device call as a command string and mirrors the GL state
/// the calls would leave behind. Tests keep a handle on the shared
/// `MockDeviceLog` and inspect it after driving the pipeline.
///
/// Command strings:
/// - `create_buffer <handle> <size>`, `update_buffer <handle> <offset> <len>`,
///   `release_buffer <handle>`, `bind_storage_buffer <binding> <handle>`
/// - `create_texture <handle> <kind> <w>x<h>`, `bind_texture <unit> <handle>`
/// - `create_framebuffer <handle> <w>x<h>`, `release_framebuffer <handle>`,
///   `bind_framebuffer <handle>`, `set_viewport <x> <y> <w> <h>`
/// - `clear color+depth` / `clear depth` / `clear color`
/// - `set_blend_enabled <bool>`, `set_depth_test_enabled <bool>`,
///   `set_depth_func <op>`, `set_blend_func <src> <dst>`, `set_clear_color`
/// - `create_program <handle> <name>`, `bind_program <name>`,
///   `set_uniform <program> <uniform>`
/// - `unbind_all`, `present`, `resize <w>x<h>`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, Buffer, BufferDesc, Texture, TextureDesc, TextureInfo, TextureFormat,
    TextureUsage, TextureKind, Framebuffer, FramebufferDesc, ShaderProgram, ShaderDesc,
    UniformValue, ClearFlags, CompareOp, BlendFactor, Viewport, DeviceStats,
};

// ============================================================================
// Shared log
// ============================================================================

/// Everything the mock device observed
#[derive(Debug, Default)]
pub struct MockDeviceLog {
    /// Every call, in order
    pub commands: Vec<String>,
    /// Contents of live buffers by handle
    pub buffers: FxHashMap<u32, Vec<u8>>,
    /// Live offscreen framebuffers by handle
    pub framebuffers: FxHashSet<u32>,
    /// Last value of each uniform, keyed by (program name, uniform name)
    pub uniforms: FxHashMap<(String, String), UniformValue>,
    /// Storage binding point -> buffer handle
    pub storage_bindings: FxHashMap<u32, u32>,
    /// Texture unit -> texture handle
    pub texture_bindings: FxHashMap<u32, u32>,
    pub bound_framebuffer: u32,
    pub bound_program: Option<String>,
    pub viewport: Option<Viewport>,
    pub blend_enabled: bool,
    pub depth_test_enabled: bool,
    pub depth_func: Option<CompareOp>,
    pub blend_func: Option<(BlendFactor, BlendFactor)>,
    pub clear_color: [f32; 4],
    pub frames_presented: u64,
    /// Operation names that fail with `Error::BackendError`
    failures: FxHashSet<String>,
}

impl MockDeviceLog {
    /// Make every later call of `operation` (e.g. `"create_buffer"`) fail
    pub fn fail_operation(&mut self, operation: &str) {
        self.failures.insert(operation.to_string());
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Forget recorded commands, keeping state
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Index of the first command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.starts_with(prefix))
    }

    /// Commands starting with `prefix`, in order
    pub fn matching(&self, prefix: &str) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn record(&mut self, command: String) {
        self.commands.push(command);
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failures.contains(operation) {
            crate::engine_bail!("umbra3d::MockGraphicsDevice", "mock failure injected for {}", operation);
        }
        Ok(())
    }
}

type SharedLog = Arc<Mutex<MockDeviceLog>>;

fn lock(log: &SharedLog) -> MutexGuard<'_, MockDeviceLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_label(flags: ClearFlags) -> &'static str {
    if flags.contains(ClearFlags::COLOR | ClearFlags::DEPTH) {
        "color+depth"
    } else if flags.contains(ClearFlags::DEPTH) {
        "depth"
    } else if flags.contains(ClearFlags::COLOR) {
        "color"
    } else {
        "none"
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

/// Buffer backed by the shared log
pub struct MockBuffer {
    handle: u32,
    size: u64,
    log: SharedLog,
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("update_buffer")?;
        let end = offset + data.len() as u64;
        if end > self.size {
            return Err(Error::InvalidResource(format!(
                "update of {} bytes at offset {} overflows buffer {} ({} bytes)",
                data.len(), offset, self.handle, self.size
            )));
        }
        if let Some(contents) = log.buffers.get_mut(&self.handle) {
            contents[offset as usize..end as usize].copy_from_slice(data);
        }
        log.record(format!("update_buffer {} {} {}", self.handle, offset, data.len()));
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn handle(&self) -> u32 {
        self.handle
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        let mut log = lock(&self.log);
        log.buffers.remove(&self.handle);
        log.record(format!("release_buffer {}", self.handle));
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

/// Texture whose readiness can be toggled to simulate background uploads
pub struct MockTexture {
    handle: u32,
    info: TextureInfo,
    ready: AtomicBool,
}

impl MockTexture {
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn handle(&self) -> u32 {
        self.handle
    }
}

// ============================================================================
// Mock Framebuffer
// ============================================================================

pub struct MockFramebuffer {
    handle: u32,
    width: u32,
    height: u32,
    depth_attachment: Option<Arc<dyn Texture>>,
    /// `None` for the window framebuffer, which is never released
    log: Option<SharedLog>,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>> {
        self.depth_attachment.as_ref()
    }

    fn handle(&self) -> u32 {
        self.handle
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        if let Some(shared) = &self.log {
            let mut log = lock(shared);
            log.framebuffers.remove(&self.handle);
            log.record(format!("release_framebuffer {}", self.handle));
        }
    }
}

// ============================================================================
// Mock Shader Program
// ============================================================================

pub struct MockShaderProgram {
    handle: u32,
    name: String,
    log: SharedLog,
}

impl ShaderProgram for MockShaderProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_uniform(&self, name: &str, value: UniformValue) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("set_uniform")?;
        if log.bound_program.as_deref() != Some(self.name.as_str()) {
            return Err(Error::InvalidResource(format!(
                "uniform '{}' set on program '{}' while it is not bound",
                name, self.name
            )));
        }
        log.record(format!("set_uniform {} {}", self.name, name));
        log.uniforms.insert((self.name.clone(), name.to_string()), value);
        Ok(())
    }

    fn handle(&self) -> u32 {
        self.handle
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Graphics device that renders nothing and records everything
pub struct MockGraphicsDevice {
    log: SharedLog,
    next_handle: u32,
    default_framebuffer: Arc<MockFramebuffer>,
    placeholder: Arc<MockTexture>,
}

impl MockGraphicsDevice {
    /// Create a mock device with a `width × height` window framebuffer
    pub fn new(width: u32, height: u32) -> Self {
        let placeholder = Arc::new(MockTexture {
            handle: 1,
            info: TextureInfo {
                width: 1,
                height: 1,
                format: TextureFormat::R8G8B8A8_UNORM,
                usage: TextureUsage::Sampled,
                kind: TextureKind::Texture2D,
                array_layers: 1,
            },
            ready: AtomicBool::new(true),
        });
        Self {
            log: Arc::new(Mutex::new(MockDeviceLog::default())),
            next_handle: 2,
            default_framebuffer: Arc::new(MockFramebuffer {
                handle: 0,
                width,
                height,
                depth_attachment: None,
                log: None,
            }),
            placeholder,
        }
    }

    /// Shared log, kept by tests while the device is moved into an engine
    pub fn log(&self) -> Arc<Mutex<MockDeviceLog>> {
        Arc::clone(&self.log)
    }

    /// Create a texture that reports not ready until `set_ready(true)`
    pub fn create_pending_texture(&mut self, desc: TextureDesc) -> Result<Arc<MockTexture>> {
        let texture = self.new_texture(desc)?;
        texture.set_ready(false);
        Ok(texture)
    }

    fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn new_texture(&mut self, desc: TextureDesc) -> Result<Arc<MockTexture>> {
        lock(&self.log).check("create_texture")?;
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource("texture dimensions must be non-zero".to_string()));
        }
        if desc.kind == TextureKind::CubeMap && desc.width != desc.height {
            return Err(Error::InvalidResource(format!(
                "cube map faces must be square, got {}x{}",
                desc.width, desc.height
            )));
        }
        let handle = self.allocate_handle();
        lock(&self.log).record(format!(
            "create_texture {} {:?} {}x{}",
            handle, desc.kind, desc.width, desc.height
        ));
        Ok(Arc::new(MockTexture {
            handle,
            info: TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
                kind: desc.kind,
                array_layers: desc.kind.layer_count(),
            },
            ready: AtomicBool::new(true),
        }))
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        lock(&self.log).check("create_buffer")?;
        let mut contents = vec![0u8; desc.size as usize];
        if let Some(data) = &desc.data {
            if data.len() as u64 > desc.size {
                return Err(Error::InvalidResource(format!(
                    "initial data ({} bytes) larger than buffer ({} bytes)",
                    data.len(), desc.size
                )));
            }
            contents[..data.len()].copy_from_slice(data);
        }

        let handle = self.allocate_handle();
        let mut log = lock(&self.log);
        log.buffers.insert(handle, contents);
        log.record(format!("create_buffer {} {}", handle, desc.size));
        drop(log);

        Ok(Arc::new(MockBuffer { handle, size: desc.size, log: Arc::clone(&self.log) }))
    }

    fn bind_storage_buffer(&mut self, binding: u32, buffer: &Arc<dyn Buffer>) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("bind_storage_buffer")?;
        log.storage_bindings.insert(binding, buffer.handle());
        log.record(format!("bind_storage_buffer {} {}", binding, buffer.handle()));
        Ok(())
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        let texture: Arc<dyn Texture> = self.new_texture(desc)?;
        Ok(texture)
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        lock(&self.log).check("create_framebuffer")?;
        if let Some(depth) = &desc.depth_attachment {
            if !depth.info().format.is_depth() {
                return Err(Error::InvalidResource(
                    "depth attachment must use a depth format".to_string(),
                ));
            }
        }

        let handle = self.allocate_handle();
        let mut log = lock(&self.log);
        log.framebuffers.insert(handle);
        log.record(format!("create_framebuffer {} {}x{}", handle, desc.width, desc.height));
        drop(log);

        Ok(Arc::new(MockFramebuffer {
            handle,
            width: desc.width,
            height: desc.height,
            depth_attachment: desc.depth_attachment.clone(),
            log: Some(Arc::clone(&self.log)),
        }))
    }

    fn default_framebuffer(&self) -> Arc<dyn Framebuffer> {
        self.default_framebuffer.clone()
    }

    fn bind_framebuffer(&mut self, framebuffer: &Arc<dyn Framebuffer>) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("bind_framebuffer")?;
        log.bound_framebuffer = framebuffer.handle();
        log.record(format!("bind_framebuffer {}", framebuffer.handle()));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let mut log = lock(&self.log);
        log.viewport = Some(viewport);
        log.record(format!(
            "set_viewport {} {} {} {}",
            viewport.x, viewport.y, viewport.width, viewport.height
        ));
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        let mut log = lock(&self.log);
        log.clear_color = color;
        log.record("set_clear_color".to_string());
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("clear")?;
        log.record(format!("clear {}", clear_label(flags)));
        Ok(())
    }

    fn set_blend_enabled(&mut self, enabled: bool) {
        let mut log = lock(&self.log);
        log.blend_enabled = enabled;
        log.record(format!("set_blend_enabled {}", enabled));
    }

    fn set_depth_test_enabled(&mut self, enabled: bool) {
        let mut log = lock(&self.log);
        log.depth_test_enabled = enabled;
        log.record(format!("set_depth_test_enabled {}", enabled));
    }

    fn set_depth_func(&mut self, func: CompareOp) {
        let mut log = lock(&self.log);
        log.depth_func = Some(func);
        log.record(format!("set_depth_func {:?}", func));
    }

    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        let mut log = lock(&self.log);
        log.blend_func = Some((src, dst));
        log.record(format!("set_blend_func {:?} {:?}", src, dst));
    }

    fn create_program(&mut self, desc: ShaderDesc) -> Result<Arc<dyn ShaderProgram>> {
        lock(&self.log).check("create_program")?;
        if desc.stages.is_empty() {
            return Err(Error::InvalidResource(format!("program '{}' has no stages", desc.name)));
        }
        let handle = self.allocate_handle();
        lock(&self.log).record(format!("create_program {} {}", handle, desc.name));
        Ok(Arc::new(MockShaderProgram {
            handle,
            name: desc.name,
            log: Arc::clone(&self.log),
        }))
    }

    fn bind_program(&mut self, program: &Arc<dyn ShaderProgram>) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("bind_program")?;
        log.bound_program = Some(program.name().to_string());
        log.record(format!("bind_program {}", program.name()));
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("bind_texture")?;
        log.texture_bindings.insert(unit, texture.handle());
        log.record(format!("bind_texture {} {}", unit, texture.handle()));
        Ok(())
    }

    fn placeholder_texture(&self) -> Arc<dyn Texture> {
        self.placeholder.clone()
    }

    fn unbind_all(&mut self) {
        let mut log = lock(&self.log);
        log.bound_program = None;
        log.texture_bindings.clear();
        log.record("unbind_all".to_string());
    }

    fn present(&mut self) -> Result<()> {
        let mut log = lock(&self.log);
        log.check("present")?;
        log.frames_presented += 1;
        log.record("present".to_string());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        lock(&self.log).check("resize")?;
        self.default_framebuffer = Arc::new(MockFramebuffer {
            handle: 0,
            width,
            height,
            depth_attachment: None,
            log: None,
        });
        lock(&self.log).record(format!("resize {}x{}", width, height));
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        let log = lock(&self.log);
        DeviceStats {
            frames_presented: log.frames_presented,
            live_buffers: log.buffers.len() as u32,
            buffer_memory: log.buffers.values().map(|b| b.len() as u64).sum(),
            live_framebuffers: log.framebuffers.len() as u32,
        }
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
