/// Material trait and a program-based material implementation.
///
/// A material binds whatever its objects need for the current pass. It must
/// read `pass.render_context().is_depth_only()`: during shadow passes the
/// normal (lit, colored) program is never bound.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{ShaderProgram, Texture, UniformValue};
use crate::render::PassContext;
use crate::scene::ObjectKey;

/// Binds per-object GPU state for a pass
pub trait Material {
    fn bind(&self, pass: &mut PassContext<'_>, object: ObjectKey) -> Result<()>;
}

/// Material built from shader programs and an optional texture
///
/// - normal pass: binds `program`, pushes camera uniforms, binds the texture
///   (or the device placeholder while it is not ready), then `model` and
///   `normal_matrix`
/// - depth-only pass: binds the shadow variant if there is one (alpha-tested
///   or transparent shadows), otherwise restores the pipeline's shadow
///   program in case an earlier material replaced it, and pushes `model`
pub struct ShaderMaterial {
    program: Arc<dyn ShaderProgram>,
    shadow_variant: Option<Arc<dyn ShaderProgram>>,
    texture: Option<Arc<dyn Texture>>,
    texture_unit: u32,
}

impl ShaderMaterial {
    pub fn new(program: Arc<dyn ShaderProgram>) -> Self {
        Self {
            program,
            shadow_variant: None,
            texture: None,
            texture_unit: 0,
        }
    }

    pub fn with_shadow_variant(mut self, program: Arc<dyn ShaderProgram>) -> Self {
        self.shadow_variant = Some(program);
        self
    }

    pub fn with_texture(mut self, texture: Arc<dyn Texture>, unit: u32) -> Self {
        self.texture = Some(texture);
        self.texture_unit = unit;
        self
    }

    pub fn program(&self) -> &Arc<dyn ShaderProgram> {
        &self.program
    }

    pub fn shadow_variant(&self) -> Option<&Arc<dyn ShaderProgram>> {
        self.shadow_variant.as_ref()
    }

    fn bind_texture(&self, pass: &mut PassContext<'_>) -> Result<()> {
        if let Some(texture) = &self.texture {
            let device = pass.device();
            if texture.is_ready() {
                device.bind_texture(self.texture_unit, texture)?;
            } else {
                let placeholder = device.placeholder_texture();
                device.bind_texture(self.texture_unit, &placeholder)?;
            }
        }
        Ok(())
    }

    fn bind_depth_only(&self, pass: &mut PassContext<'_>, object: ObjectKey) -> Result<()> {
        if let Some(variant) = &self.shadow_variant {
            pass.bind_program(variant)?;
            if let Some(uniforms) = pass.shadow_uniforms().copied() {
                uniforms.apply(variant.as_ref())?;
            }
            self.bind_texture(pass)?;
        } else {
            pass.restore_pass_program()?;
        }
        let model = pass.objects().world_matrix(object)?;
        pass.set_uniform("model", UniformValue::Mat4(model))
    }
}

impl Material for ShaderMaterial {
    fn bind(&self, pass: &mut PassContext<'_>, object: ObjectKey) -> Result<()> {
        if pass.render_context().is_depth_only() {
            return self.bind_depth_only(pass, object);
        }

        pass.bind_program(&self.program)?;
        if let Some(camera) = pass.camera_uniforms().copied() {
            camera.apply(self.program.as_ref())?;
        }
        self.bind_texture(pass)?;

        let model = pass.objects().world_matrix(object)?;
        let normal = pass.objects().normal_matrix(object)?;
        pass.set_uniform("model", UniformValue::Mat4(model))?;
        pass.set_uniform("normal_matrix", UniformValue::Mat4(normal))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
