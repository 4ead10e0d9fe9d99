use std::cell::RefCell;
use std::sync::Arc;
use glam::{Quat, Vec3};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{
    GraphicsDevice, ShaderDesc, ShaderProgram, ShaderStage, Texture, TextureDesc, TextureFormat,
    TextureKind, TextureUsage, UniformValue,
};
use crate::light::Light;
use crate::render::{FrameStage, PassContext, RenderContext, ShadowUniforms};
use crate::scene::{ObjectGraph, ObjectKey};
use super::*;

/// Material that only records which branch its bind took
#[derive(Default)]
struct SpyMaterial {
    branches: RefCell<Vec<&'static str>>,
}

impl Material for SpyMaterial {
    fn bind(&self, pass: &mut PassContext<'_>, _object: ObjectKey) -> crate::error::Result<()> {
        let branch = if pass.render_context().is_depth_only() { "shadow" } else { "normal" };
        self.branches.borrow_mut().push(branch);
        Ok(())
    }
}

fn program(device: &mut MockGraphicsDevice, name: &str) -> Arc<dyn ShaderProgram> {
    device
        .create_program(ShaderDesc::new(name).with_stage(ShaderStage::Vertex, "void main() {}"))
        .unwrap()
}

fn color_texture_desc() -> TextureDesc {
    TextureDesc {
        width: 4,
        height: 4,
        format: TextureFormat::R8G8B8A8_SRGB,
        usage: TextureUsage::Sampled,
        kind: TextureKind::Texture2D,
        data: None,
    }
}

// ============================================================================
// Depth-only propagation
// ============================================================================

#[test]
fn test_spy_material_follows_depth_only_flag() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let mut graph = ObjectGraph::new();
    let object = graph.create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let mut context = RenderContext::new_3d(device.default_framebuffer());
    let spy = SpyMaterial::default();

    context.set_depth_only(true);
    context.bind(&mut device).unwrap();
    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::ShadowPass, &graph);
        spy.bind(&mut pass, object).unwrap();
    }

    context.set_depth_only(false);
    context.bind(&mut device).unwrap();
    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::MainPass, &graph);
        spy.bind(&mut pass, object).unwrap();
    }

    assert_eq!(*spy.branches.borrow(), vec!["shadow", "normal"]);
}

// ============================================================================
// ShaderMaterial
// ============================================================================

#[test]
fn test_shader_material_normal_pass() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let log = device.log();
    let mut graph = ObjectGraph::new();
    let object = graph.create_object(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
    let context = RenderContext::new_3d(device.default_framebuffer());
    let material = ShaderMaterial::new(program(&mut device, "lit"))
        .with_shadow_variant(program(&mut device, "cutout_shadow"));

    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::MainPass, &graph);
        material.bind(&mut pass, object).unwrap();
    }

    let log = log.lock().unwrap();
    assert_eq!(log.bound_program.as_deref(), Some("lit"));
    assert_eq!(log.count("bind_program cutout_shadow"), 0);
    assert_eq!(
        log.uniforms[&("lit".to_string(), "model".to_string())],
        UniformValue::Mat4(graph.world_matrix(object).unwrap())
    );
    assert_eq!(
        log.uniforms[&("lit".to_string(), "normal_matrix".to_string())],
        UniformValue::Mat4(graph.normal_matrix(object).unwrap())
    );
}

#[test]
fn test_shader_material_binds_shadow_variant_in_depth_only_pass() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let log = device.log();
    let mut graph = ObjectGraph::new();
    let object = graph.create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let light = Light::new(&mut graph, Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, 10.0);
    let mut context = RenderContext::new_3d(device.default_framebuffer());
    context.set_depth_only(true);
    let material = ShaderMaterial::new(program(&mut device, "lit"))
        .with_shadow_variant(program(&mut device, "cutout_shadow"));
    let uniforms = ShadowUniforms::for_light(&light, &graph).unwrap();

    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::ShadowPass, &graph)
            .with_light(0, uniforms);
        material.bind(&mut pass, object).unwrap();
    }

    let log = log.lock().unwrap();
    assert_eq!(log.count("bind_program lit"), 0);
    assert_eq!(log.bound_program.as_deref(), Some("cutout_shadow"));
    assert_eq!(
        log.uniforms[&("cutout_shadow".to_string(), "far_plane".to_string())],
        UniformValue::Float(20.0)
    );
    assert!(log.uniforms.contains_key(&("cutout_shadow".to_string(), "model".to_string())));
}

#[test]
fn test_shader_material_keeps_pipeline_shadow_program() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let log = device.log();
    let mut graph = ObjectGraph::new();
    let object = graph.create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let mut context = RenderContext::new_3d(device.default_framebuffer());
    context.set_depth_only(true);
    let shadow_program = program(&mut device, "shadow_depth");
    let material = ShaderMaterial::new(program(&mut device, "lit"));

    device.bind_program(&shadow_program).unwrap();
    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::ShadowPass, &graph)
            .with_bound_program(shadow_program.clone());
        material.bind(&mut pass, object).unwrap();
    }

    let log = log.lock().unwrap();
    assert_eq!(log.bound_program.as_deref(), Some("shadow_depth"));
    assert!(log.uniforms.contains_key(&("shadow_depth".to_string(), "model".to_string())));
}

#[test]
fn test_plain_material_after_variant_restores_shadow_program() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let log = device.log();
    let mut graph = ObjectGraph::new();
    let leaves = graph.create_object(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
    let crate_box = graph.create_object(Vec3::new(-2.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
    let light = Light::new(&mut graph, Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, 10.0);
    let mut context = RenderContext::new_3d(device.default_framebuffer());
    context.set_depth_only(true);
    let shadow_program = program(&mut device, "shadow_depth");
    let cutout = ShaderMaterial::new(program(&mut device, "foliage"))
        .with_shadow_variant(program(&mut device, "alpha_shadow"));
    let plain = ShaderMaterial::new(program(&mut device, "lit"));
    let uniforms = ShadowUniforms::for_light(&light, &graph).unwrap();

    device.bind_program(&shadow_program).unwrap();
    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::ShadowPass, &graph)
            .with_light(0, uniforms)
            .with_bound_program(shadow_program.clone());
        cutout.bind(&mut pass, leaves).unwrap();
        plain.bind(&mut pass, crate_box).unwrap();
        assert!(Arc::ptr_eq(pass.bound_program().unwrap(), &shadow_program));
    }

    let log = log.lock().unwrap();
    assert_eq!(log.bound_program.as_deref(), Some("shadow_depth"));
    assert_eq!(
        log.matching("bind_program"),
        vec!["bind_program shadow_depth", "bind_program alpha_shadow", "bind_program shadow_depth"]
    );
    assert_eq!(
        log.uniforms[&("shadow_depth".to_string(), "model".to_string())],
        UniformValue::Mat4(graph.world_matrix(crate_box).unwrap())
    );
    assert_eq!(
        log.uniforms[&("alpha_shadow".to_string(), "model".to_string())],
        UniformValue::Mat4(graph.world_matrix(leaves).unwrap())
    );
}

#[test]
fn test_consecutive_plain_materials_do_not_rebind() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let log = device.log();
    let mut graph = ObjectGraph::new();
    let a = graph.create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let b = graph.create_object(Vec3::X, Quat::IDENTITY, Vec3::ONE);
    let mut context = RenderContext::new_3d(device.default_framebuffer());
    context.set_depth_only(true);
    let shadow_program = program(&mut device, "shadow_depth");
    let plain = ShaderMaterial::new(program(&mut device, "lit"));

    device.bind_program(&shadow_program).unwrap();
    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::ShadowPass, &graph)
            .with_bound_program(shadow_program.clone());
        plain.bind(&mut pass, a).unwrap();
        plain.bind(&mut pass, b).unwrap();
    }

    assert_eq!(log.lock().unwrap().count("bind_program"), 1);
}

#[test]
fn test_shader_material_substitutes_placeholder_for_pending_texture() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let log = device.log();
    let mut graph = ObjectGraph::new();
    let object = graph.create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let context = RenderContext::new_3d(device.default_framebuffer());
    let texture = device.create_pending_texture(color_texture_desc()).unwrap();
    let material = ShaderMaterial::new(program(&mut device, "lit")).with_texture(texture.clone(), 2);
    let placeholder = device.placeholder_texture().handle();

    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::MainPass, &graph);
        material.bind(&mut pass, object).unwrap();
    }
    assert_eq!(log.lock().unwrap().texture_bindings[&2], placeholder);

    texture.set_ready(true);
    {
        let mut pass = PassContext::new(&mut device, &context, FrameStage::MainPass, &graph);
        material.bind(&mut pass, object).unwrap();
    }
    assert_eq!(log.lock().unwrap().texture_bindings[&2], texture.handle());
}

#[test]
fn test_shader_material_stale_object_is_invalid_handle() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let mut graph = ObjectGraph::new();
    let object = graph.create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    graph.delete(object).unwrap();
    let context = RenderContext::new_3d(device.default_framebuffer());
    let material = ShaderMaterial::new(program(&mut device, "lit"));

    let mut pass = PassContext::new(&mut device, &context, FrameStage::MainPass, &graph);
    assert!(matches!(
        material.bind(&mut pass, object),
        Err(crate::error::Error::InvalidHandle(_))
    ));
}

#[test]
fn test_set_uniform_without_program_fails() {
    let mut device = MockGraphicsDevice::new(320, 240);
    let graph = ObjectGraph::new();
    let context = RenderContext::new_3d(device.default_framebuffer());
    let pass = PassContext::new(&mut device, &context, FrameStage::MainPass, &graph);

    assert!(pass.set_uniform("model", UniformValue::Float(0.0)).is_err());
}
