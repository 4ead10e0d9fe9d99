/// RenderPipeline - per-frame orchestration of light sync, shadow and main passes.
///
/// Stages run in a fixed order:
///
/// ```text
/// PreRender -> LightSync -> ShadowPass (if enabled) -> MainPass -> PostRender
/// ```
///
/// Failure policy: PreRender and present errors are returned. A failed light
/// sync is logged and the frame continues with the previous buffer state. A
/// failure inside the shadow pass is logged and skips the remaining shadow
/// renders. A failed main pass is logged and the frame is still presented.

use std::sync::Arc;
use crate::camera::Camera;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::graphics_device::{
    ClearFlags, Framebuffer, GraphicsDevice, ShaderDesc, ShaderProgram, ShaderStage,
};
use crate::render::{
    CameraUniforms, FrameStage, LightBuffer, PassContext, RenderContext, ShadowFramebuffer,
    ShadowUniforms, SyncOutcome,
};
use crate::scene::{ObjectGraph, Scene};

const SHADOW_DEPTH_VERT: &str = include_str!("../../shaders/shadow_depth.vert");
const SHADOW_DEPTH_GEOM: &str = include_str!("../../shaders/shadow_depth.geom");
const SHADOW_DEPTH_FRAG: &str = include_str!("../../shaders/shadow_depth.frag");

/// What happened during one frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Lights in the scene this frame
    pub light_count: usize,
    /// Shadow cube maps rendered
    pub shadow_passes: usize,
    /// The light buffer was recreated (count change or first frame)
    pub light_buffer_reallocated: bool,
    /// The shadow framebuffer set was destroyed and rebuilt
    pub shadow_framebuffers_recreated: bool,
}

/// Frame orchestrator
pub trait RenderPipeline {
    /// Render and present one frame of `scene`
    fn render_frame(&mut self, device: &mut dyn GraphicsDevice, scene: &dyn Scene) -> Result<FrameStats>;

    /// Context of 3D geometry (default framebuffer)
    fn context_3d(&self) -> &RenderContext;

    /// Context of UI overlays (default framebuffer)
    fn ui_context(&self) -> &RenderContext;

    /// Stage being executed, `None` between frames
    fn stage(&self) -> Option<FrameStage>;
}

/// Forward renderer with omnidirectional shadow maps
pub struct ForwardRenderPipeline {
    config: PipelineConfig,
    context_3d: RenderContext,
    ui_context: RenderContext,
    light_buffer: LightBuffer,
    shadow_framebuffers: Vec<ShadowFramebuffer>,
    shadow_program: Arc<dyn ShaderProgram>,
    stage: Option<FrameStage>,
    frame_index: u64,
}

impl ForwardRenderPipeline {
    /// Validate `config` and build the shadow program
    ///
    /// No light buffer or shadow framebuffer exists until the first frame.
    pub fn new(device: &mut dyn GraphicsDevice, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let shadow_program = device.create_program(
            ShaderDesc::new("shadow_depth")
                .with_stage(ShaderStage::Vertex, SHADOW_DEPTH_VERT)
                .with_stage(ShaderStage::Geometry, SHADOW_DEPTH_GEOM)
                .with_stage(ShaderStage::Fragment, SHADOW_DEPTH_FRAG),
        )?;

        let framebuffer = device.default_framebuffer();
        crate::engine_info!(
            "umbra3d::RenderPipeline",
            "Forward pipeline created ({}x{}, shadows {}, {} maps of {}px)",
            framebuffer.width(),
            framebuffer.height(),
            if config.shadows_enabled { "on" } else { "off" },
            config.max_shadow_maps,
            config.shadow_map_size
        );

        Ok(Self {
            context_3d: RenderContext::new_3d(framebuffer.clone()),
            ui_context: RenderContext::new_ui(framebuffer),
            config,
            light_buffer: LightBuffer::new(),
            shadow_framebuffers: Vec::new(),
            shadow_program,
            stage: None,
            frame_index: 0,
        })
    }

    /// Point both contexts at the device's current default framebuffer
    ///
    /// Call after `GraphicsDevice::resize`.
    pub fn resize(&mut self, device: &dyn GraphicsDevice) {
        let framebuffer = device.default_framebuffer();
        crate::engine_debug!(
            "umbra3d::RenderPipeline",
            "Contexts retargeted to {}x{}",
            framebuffer.width(),
            framebuffer.height()
        );
        self.context_3d.set_framebuffer(framebuffer.clone());
        self.ui_context.set_framebuffer(framebuffer);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn light_buffer(&self) -> &LightBuffer {
        &self.light_buffer
    }

    pub fn shadow_framebuffers(&self) -> &[ShadowFramebuffer] {
        &self.shadow_framebuffers
    }

    pub fn shadow_program(&self) -> &Arc<dyn ShaderProgram> {
        &self.shadow_program
    }

    pub fn context_3d_mut(&mut self) -> &mut RenderContext {
        &mut self.context_3d
    }

    pub fn ui_context_mut(&mut self) -> &mut RenderContext {
        &mut self.ui_context
    }

    /// Frames presented by this pipeline
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn run_frame(&mut self, device: &mut dyn GraphicsDevice, scene: &dyn Scene) -> Result<FrameStats> {
        let mut stats = FrameStats {
            light_count: scene.lights().len(),
            ..FrameStats::default()
        };

        self.stage = Some(FrameStage::PreRender);
        self.pre_render(device)?;

        self.stage = Some(FrameStage::LightSync);
        self.sync_lights(device, scene, &mut stats);

        if self.config.shadows_enabled {
            self.stage = Some(FrameStage::ShadowPass);
            if let Err(e) = self.shadow_pass(device, scene, &mut stats) {
                crate::engine_error!(
                    "umbra3d::RenderPipeline",
                    "Shadow pass aborted after {} lights: {}",
                    stats.shadow_passes,
                    e
                );
            }
        }

        self.stage = Some(FrameStage::MainPass);
        if let Err(e) = self.main_pass(device, scene) {
            crate::engine_error!("umbra3d::RenderPipeline", "Main pass skipped: {}", e);
        }

        self.stage = Some(FrameStage::PostRender);
        device.unbind_all();
        device.present()?;

        Ok(stats)
    }

    fn pre_render(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.context_3d.bind(device)?;
        device.set_clear_color(self.config.clear_color);
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH)
    }

    fn sync_lights(&mut self, device: &mut dyn GraphicsDevice, scene: &dyn Scene, stats: &mut FrameStats) {
        // No cube map is bound when shadows are off, so no light gets a slot
        let shadow_maps = if self.config.shadows_enabled { self.config.max_shadow_maps } else { 0 };
        let outcome = self.light_buffer.sync(
            device,
            scene.objects(),
            scene.lights(),
            self.config.light_buffer_binding,
            shadow_maps,
        );
        match outcome {
            Ok(SyncOutcome::Reallocated) => stats.light_buffer_reallocated = true,
            Ok(SyncOutcome::UpdatedInPlace) => {}
            Err(e) => {
                crate::engine_error!("umbra3d::RenderPipeline", "Light sync failed: {}", e);
            }
        }
    }

    /// Make the shadow framebuffer count match `min(lights, max_shadow_maps)`
    ///
    /// On a mismatch every existing framebuffer is released before the new
    /// set is created. A creation failure leaves the set empty.
    fn reconcile_shadow_framebuffers(
        &mut self,
        device: &mut dyn GraphicsDevice,
        light_count: usize,
        stats: &mut FrameStats,
    ) -> Result<()> {
        let wanted = light_count.min(self.config.max_shadow_maps);
        if self.shadow_framebuffers.len() == wanted {
            return Ok(());
        }

        self.shadow_framebuffers.clear();
        stats.shadow_framebuffers_recreated = true;

        let mut created = Vec::with_capacity(wanted);
        for _ in 0..wanted {
            created.push(ShadowFramebuffer::create(device, self.config.shadow_map_size)?);
        }
        self.shadow_framebuffers = created;

        crate::engine_debug!(
            "umbra3d::RenderPipeline",
            "Shadow framebuffers recreated: {} cube maps for {} lights",
            wanted,
            light_count
        );
        Ok(())
    }

    fn shadow_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &dyn Scene,
        stats: &mut FrameStats,
    ) -> Result<()> {
        let lights = scene.lights();
        self.reconcile_shadow_framebuffers(device, lights.len(), stats)?;
        self.context_3d.set_depth_only(true);

        let graph = scene.objects();
        for (index, (light, shadow)) in lights.iter().zip(&self.shadow_framebuffers).enumerate() {
            shadow.bind(device)?;
            self.context_3d.apply_state(device);
            device.clear(ClearFlags::DEPTH)?;

            device.bind_program(&self.shadow_program)?;
            let uniforms = ShadowUniforms::for_light(light, graph)?;
            uniforms.apply(self.shadow_program.as_ref())?;

            let mut pass = PassContext::new(device, &self.context_3d, FrameStage::ShadowPass, graph)
                .with_light(index, uniforms)
                .with_bound_program(self.shadow_program.clone());
            scene.render(&mut pass)?;
            stats.shadow_passes += 1;
        }
        Ok(())
    }

    fn main_pass(&mut self, device: &mut dyn GraphicsDevice, scene: &dyn Scene) -> Result<()> {
        self.context_3d.set_depth_only(false);
        self.context_3d.bind(device)?;

        if self.config.shadows_enabled {
            for (slot, shadow) in self.shadow_framebuffers.iter().enumerate() {
                device.bind_texture(self.config.shadow_texture_unit_base + slot as u32, shadow.depth_cube())?;
            }
        }

        let graph = scene.objects();
        let uniforms = camera_uniforms(scene.active_camera(), graph)?;
        let mut pass = PassContext::new(device, &self.context_3d, FrameStage::MainPass, graph)
            .with_camera(uniforms);
        scene.render(&mut pass)
    }
}

fn camera_uniforms(camera: &Camera, graph: &ObjectGraph) -> Result<CameraUniforms> {
    Ok(CameraUniforms {
        view: camera.view_matrix(graph)?,
        projection: camera.projection_matrix(),
        position: graph.pos(camera.key())?,
    })
}

impl RenderPipeline for ForwardRenderPipeline {
    fn render_frame(&mut self, device: &mut dyn GraphicsDevice, scene: &dyn Scene) -> Result<FrameStats> {
        let result = self.run_frame(device, scene);
        self.stage = None;
        if result.is_ok() {
            self.frame_index += 1;
        }
        result
    }

    fn context_3d(&self) -> &RenderContext {
        &self.context_3d
    }

    fn ui_context(&self) -> &RenderContext {
        &self.ui_context
    }

    fn stage(&self) -> Option<FrameStage> {
        self.stage
    }
}

#[cfg(test)]
#[path = "render_pipeline_tests.rs"]
mod tests;
