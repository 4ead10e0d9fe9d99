/// RenderContext - target framebuffer plus the GPU state toggles of a pass.
///
/// `bind` applies every toggle on every call, without diffing against the
/// previous device state. The `depth_only` flag is not GPU state: materials
/// read it to pick their shadow variant.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{BlendFactor, CompareOp, Framebuffer, GraphicsDevice, Viewport};

pub struct RenderContext {
    framebuffer: Arc<dyn Framebuffer>,
    blend: bool,
    depth_test: bool,
    depth_func: CompareOp,
    blend_func: (BlendFactor, BlendFactor),
    depth_only: bool,
}

impl RenderContext {
    /// Context for 3D geometry: depth test on with LESS, blending off
    pub fn new_3d(framebuffer: Arc<dyn Framebuffer>) -> Self {
        Self {
            framebuffer,
            blend: false,
            depth_test: true,
            depth_func: CompareOp::Less,
            blend_func: (BlendFactor::One, BlendFactor::Zero),
            depth_only: false,
        }
    }

    /// Context for UI overlays: alpha blending on, depth function ALWAYS
    pub fn new_ui(framebuffer: Arc<dyn Framebuffer>) -> Self {
        Self {
            framebuffer,
            blend: true,
            depth_test: true,
            depth_func: CompareOp::Always,
            blend_func: (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            depth_only: false,
        }
    }

    /// Bind the framebuffer (with a full viewport), then apply every toggle
    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        device.bind_framebuffer(&self.framebuffer)?;
        device.set_viewport(Viewport::full(self.framebuffer.width(), self.framebuffer.height()));
        self.apply_state(device);
        Ok(())
    }

    /// Apply the toggles without touching the framebuffer binding
    ///
    /// Used when a pass renders into another target (shadow cube maps)
    /// with this context's state.
    pub fn apply_state(&self, device: &mut dyn GraphicsDevice) {
        device.set_blend_enabled(self.blend);
        device.set_depth_test_enabled(self.depth_test);
        device.set_depth_func(self.depth_func);
        device.set_blend_func(self.blend_func.0, self.blend_func.1);
    }

    pub fn framebuffer(&self) -> &Arc<dyn Framebuffer> {
        &self.framebuffer
    }

    /// Retarget the context (e.g. window framebuffer recreated on resize)
    pub fn set_framebuffer(&mut self, framebuffer: Arc<dyn Framebuffer>) {
        self.framebuffer = framebuffer;
    }

    pub fn is_depth_only(&self) -> bool {
        self.depth_only
    }

    pub fn set_depth_only(&mut self, depth_only: bool) {
        self.depth_only = depth_only;
    }

    pub fn blend_enabled(&self) -> bool {
        self.blend
    }

    pub fn set_blend_enabled(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.depth_test
    }

    pub fn set_depth_test_enabled(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    pub fn depth_func(&self) -> CompareOp {
        self.depth_func
    }

    pub fn set_depth_func(&mut self, func: CompareOp) {
        self.depth_func = func;
    }

    pub fn blend_func(&self) -> (BlendFactor, BlendFactor) {
        self.blend_func
    }

    pub fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blend_func = (src, dst);
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
