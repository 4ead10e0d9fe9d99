/// PassContext - what a scene traversal sees during one render pass.
///
/// Built by the pipeline for every shadow pass and for the main pass. It
/// lends the device, exposes the active `RenderContext` (whose depth-only
/// flag selects material variants), and carries the per-pass uniforms that
/// materials push after binding their own program.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, ShaderProgram, UniformValue};
use crate::light::Light;
use crate::render::RenderContext;
use crate::scene::ObjectGraph;

/// Stages of a frame, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameStage {
    PreRender,
    LightSync,
    ShadowPass,
    MainPass,
    PostRender,
}

/// Uniforms of the cube shadow program for one light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowUniforms {
    pub light_views: [Mat4; 6],
    pub light_pos: Vec3,
    pub far_plane: f32,
    pub light_projection: Mat4,
}

impl ShadowUniforms {
    pub fn for_light(light: &Light, graph: &ObjectGraph) -> Result<Self> {
        Ok(Self {
            light_views: light.view_matrices(graph)?,
            light_pos: light.pos(graph)?,
            far_plane: light.far_plane(),
            light_projection: light.projection_matrix(),
        })
    }

    /// Push `light_views[6]`, `light_pos`, `far_plane` and `light_projection`
    pub fn apply(&self, program: &dyn ShaderProgram) -> Result<()> {
        program.set_uniform("light_views", UniformValue::Mat4Array(self.light_views.to_vec()))?;
        program.set_uniform("light_pos", UniformValue::Vec3(self.light_pos))?;
        program.set_uniform("far_plane", UniformValue::Float(self.far_plane))?;
        program.set_uniform("light_projection", UniformValue::Mat4(self.light_projection))?;
        Ok(())
    }
}

/// Camera uniforms of the main pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl CameraUniforms {
    /// Push `view`, `projection` and `camera_pos`
    pub fn apply(&self, program: &dyn ShaderProgram) -> Result<()> {
        program.set_uniform("view", UniformValue::Mat4(self.view))?;
        program.set_uniform("projection", UniformValue::Mat4(self.projection))?;
        program.set_uniform("camera_pos", UniformValue::Vec3(self.position))?;
        Ok(())
    }
}

pub struct PassContext<'a> {
    device: &'a mut dyn GraphicsDevice,
    render_context: &'a RenderContext,
    stage: FrameStage,
    objects: &'a ObjectGraph,
    light_index: Option<usize>,
    shadow_uniforms: Option<ShadowUniforms>,
    camera_uniforms: Option<CameraUniforms>,
    pass_program: Option<Arc<dyn ShaderProgram>>,
    bound_program: Option<Arc<dyn ShaderProgram>>,
}

impl<'a> PassContext<'a> {
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        render_context: &'a RenderContext,
        stage: FrameStage,
        objects: &'a ObjectGraph,
    ) -> Self {
        Self {
            device,
            render_context,
            stage,
            objects,
            light_index: None,
            shadow_uniforms: None,
            camera_uniforms: None,
            pass_program: None,
            bound_program: None,
        }
    }

    /// Shadow pass of the light at `index`
    pub fn with_light(mut self, index: usize, uniforms: ShadowUniforms) -> Self {
        self.light_index = Some(index);
        self.shadow_uniforms = Some(uniforms);
        self
    }

    pub fn with_camera(mut self, uniforms: CameraUniforms) -> Self {
        self.camera_uniforms = Some(uniforms);
        self
    }

    /// Record the pass program the pipeline already bound on the device
    pub fn with_bound_program(mut self, program: Arc<dyn ShaderProgram>) -> Self {
        self.pass_program = Some(program.clone());
        self.bound_program = Some(program);
        self
    }

    pub fn device(&mut self) -> &mut dyn GraphicsDevice {
        &mut *self.device
    }

    pub fn render_context(&self) -> &RenderContext {
        self.render_context
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn objects(&self) -> &ObjectGraph {
        self.objects
    }

    /// Index of the light whose cube map is being rendered (shadow pass only)
    pub fn light_index(&self) -> Option<usize> {
        self.light_index
    }

    pub fn shadow_uniforms(&self) -> Option<&ShadowUniforms> {
        self.shadow_uniforms.as_ref()
    }

    pub fn camera_uniforms(&self) -> Option<&CameraUniforms> {
        self.camera_uniforms.as_ref()
    }

    pub fn bound_program(&self) -> Option<&Arc<dyn ShaderProgram>> {
        self.bound_program.as_ref()
    }

    /// Program the pipeline bound for the whole pass, if any
    pub fn pass_program(&self) -> Option<&Arc<dyn ShaderProgram>> {
        self.pass_program.as_ref()
    }

    /// Rebind the pass program if a material replaced it
    ///
    /// Its per-pass uniforms are still on the program object, so only the
    /// device binding changes. No-op when nothing replaced it.
    pub fn restore_pass_program(&mut self) -> Result<()> {
        let Some(program) = self.pass_program.clone() else {
            return Ok(());
        };
        let current = self.bound_program.as_ref().is_some_and(|bound| Arc::ptr_eq(bound, &program));
        if !current {
            self.bind_program(&program)?;
        }
        Ok(())
    }

    /// Bind `program` on the device and make it the uniform target
    pub fn bind_program(&mut self, program: &Arc<dyn ShaderProgram>) -> Result<()> {
        self.device.bind_program(program)?;
        self.bound_program = Some(program.clone());
        Ok(())
    }

    /// Set a uniform on the bound program
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if no program is bound in this pass.
    pub fn set_uniform(&self, name: &str, value: UniformValue) -> Result<()> {
        match &self.bound_program {
            Some(program) => program.set_uniform(name, value),
            None => Err(Error::InvalidResource(format!(
                "uniform '{}' set with no program bound",
                name
            ))),
        }
    }
}
