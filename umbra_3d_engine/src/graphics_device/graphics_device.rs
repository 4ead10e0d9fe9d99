/// GraphicsDevice trait - render-thread GPU state machine

use std::sync::Arc;
use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, Texture, TextureDesc, Framebuffer, FramebufferDesc,
    ShaderProgram, ShaderDesc,
};

// ============================================================================
// State selectors
// ============================================================================

bitflags! {
    /// Buffers cleared by `GraphicsDevice::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 0b01;
        const DEPTH = 0b10;
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Blend factor for source or destination color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport covering a whole `width × height` target
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Device statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Frames presented since creation
    pub frames_presented: u64,
    /// Buffers currently alive
    pub live_buffers: u32,
    /// Bytes held by live buffers
    pub buffer_memory: u64,
    /// Offscreen framebuffers currently alive
    pub live_framebuffers: u32,
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// GPU device used by the render pipeline
///
/// Modeled on an OpenGL context: binds and toggles are immediate and
/// persist until changed. Every call happens on the render thread.
/// Resources are reference counted and released when the last `Arc` drops.
pub trait GraphicsDevice: Send {
    /// Create a buffer
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Bind a storage buffer to an indexed binding point
    fn bind_storage_buffer(&mut self, binding: u32, buffer: &Arc<dyn Buffer>) -> Result<()>;

    /// Create a texture (2D or cube map)
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create an offscreen framebuffer
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// The window's framebuffer
    fn default_framebuffer(&self) -> Arc<dyn Framebuffer>;

    /// Make `framebuffer` the render target
    fn bind_framebuffer(&mut self, framebuffer: &Arc<dyn Framebuffer>) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear the selected buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags) -> Result<()>;

    fn set_blend_enabled(&mut self, enabled: bool);

    fn set_depth_test_enabled(&mut self, enabled: bool);

    fn set_depth_func(&mut self, func: CompareOp);

    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Compile and link a program from its stage sources
    fn create_program(&mut self, desc: ShaderDesc) -> Result<Arc<dyn ShaderProgram>>;

    /// Make `program` current; `ShaderProgram::set_uniform` targets it
    fn bind_program(&mut self, program: &Arc<dyn ShaderProgram>) -> Result<()>;

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: &Arc<dyn Texture>) -> Result<()>;

    /// Texture substituted for resources that are not ready yet
    fn placeholder_texture(&self) -> Arc<dyn Texture>;

    /// Reset program and texture bindings
    ///
    /// Indexed storage buffer bindings persist, as in GL.
    fn unbind_all(&mut self);

    /// Swap buffers (blocks on vsync)
    fn present(&mut self) -> Result<()>;

    /// Resize the default framebuffer
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn stats(&self) -> DeviceStats;
}
