/// Framebuffer trait - groups render target attachments
///
/// Created once and reused every frame. Recreated only when the
/// attachments change (window resize, shadow map reallocation).

use std::sync::Arc;
use crate::graphics_device::Texture;

/// Framebuffer - color and depth attachments rendered into together
pub trait Framebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Depth attachment, if any
    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>>;

    /// Backend object name (0 is the window framebuffer)
    fn handle(&self) -> u32;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc {
    /// Color attachments
    pub color_attachments: Vec<Arc<dyn Texture>>,
    /// Depth attachment; a cube map texture attaches all six layers
    pub depth_attachment: Option<Arc<dyn Texture>>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}
