/// ShadowFramebuffer - depth cube map and the framebuffer rendering into it.
///
/// One per shadowed light. The cube texture has six square `D32_FLOAT`
/// layers; the shadow geometry shader selects the layer per face.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Framebuffer, FramebufferDesc, GraphicsDevice, Texture, TextureDesc, TextureFormat,
    TextureKind, TextureUsage, Viewport,
};

pub struct ShadowFramebuffer {
    framebuffer: Arc<dyn Framebuffer>,
    depth_cube: Arc<dyn Texture>,
    size: u32,
}

impl ShadowFramebuffer {
    /// Allocate a `size × size` depth cube map and its framebuffer
    pub fn create(device: &mut dyn GraphicsDevice, size: u32) -> Result<Self> {
        let depth_cube = device.create_texture(TextureDesc {
            width: size,
            height: size,
            format: TextureFormat::D32_FLOAT,
            usage: TextureUsage::DepthSampled,
            kind: TextureKind::CubeMap,
            data: None,
        })?;

        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            color_attachments: Vec::new(),
            depth_attachment: Some(depth_cube.clone()),
            width: size,
            height: size,
        })?;

        Ok(Self { framebuffer, depth_cube, size })
    }

    /// Bind the framebuffer with a viewport covering one face
    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        device.bind_framebuffer(&self.framebuffer)?;
        device.set_viewport(Viewport::full(self.size, self.size));
        Ok(())
    }

    pub fn framebuffer(&self) -> &Arc<dyn Framebuffer> {
        &self.framebuffer
    }

    /// Depth cube map sampled by the main pass
    pub fn depth_cube(&self) -> &Arc<dyn Texture> {
        &self.depth_cube
    }

    /// Edge length of a face in texels
    pub fn size(&self) -> u32 {
        self.size
    }
}

#[cfg(test)]
#[path = "shadow_framebuffer_tests.rs"]
mod tests;
