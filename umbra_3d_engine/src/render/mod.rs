//! Render module
//!
//! Frame orchestration (`ForwardRenderPipeline`), render contexts, the light
//! storage buffer, shadow cube framebuffers and the material seam.

mod render_context;
mod shadow_framebuffer;
mod light_buffer;
mod pass_context;
mod material;
mod render_pipeline;

pub use render_context::RenderContext;
pub use shadow_framebuffer::ShadowFramebuffer;
pub use light_buffer::{
    buffer_size, encode_lights, expand_light_include, glsl_declaration, shadow_slot,
    std430_layout, FieldLayout, GlslType, GpuPointLight, LightBuffer, LightBufferHeader,
    SyncOutcome, HEADER_FIELDS, HEADER_SIZE, LIGHT_INCLUDE_DIRECTIVE, POINT_LIGHT_FIELDS,
    POINT_LIGHT_STRIDE,
};
pub use pass_context::{CameraUniforms, FrameStage, PassContext, ShadowUniforms};
pub use material::{Material, ShaderMaterial};
pub use render_pipeline::{ForwardRenderPipeline, FrameStats, RenderPipeline};
