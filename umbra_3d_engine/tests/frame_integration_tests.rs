//! Integration tests for full frames through the public API
//!
//! An `Engine` drives a `BasicScene` on the mock device; assertions read the
//! mock's shared log. No GPU required.
//!
//! Run with: cargo test --test frame_integration_tests

use std::sync::{Arc, Mutex};
use serial_test::serial;
use umbra_3d_engine::glam::{Quat, Vec3};
use umbra_3d_engine::umbra3d::{Engine, EngineConfig};
use umbra_3d_engine::umbra3d::camera::CameraConfiguration;
use umbra_3d_engine::umbra3d::graphics_device::mock_graphics_device::{MockDeviceLog, MockGraphicsDevice};
use umbra_3d_engine::umbra3d::graphics_device::{
    Buffer, GraphicsDevice, ShaderDesc, ShaderProgram, ShaderStage, TextureDesc, TextureFormat,
    TextureKind, TextureUsage, UniformValue,
};
use umbra_3d_engine::umbra3d::log::{LogEntry, LogSeverity, Logger};
use umbra_3d_engine::umbra3d::render::{GpuPointLight, ShaderMaterial, HEADER_SIZE, POINT_LIGHT_STRIDE};
use umbra_3d_engine::umbra3d::scene::{BasicScene, Scene};

// ============================================================================
// HELPERS
// ============================================================================

struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn start_engine() -> (Engine, Arc<Mutex<MockDeviceLog>>) {
    let device = MockGraphicsDevice::new(1280, 720);
    let log = device.log();
    (Engine::new(Box::new(device), EngineConfig::default()).unwrap(), log)
}

fn program(engine: &mut Engine, name: &str) -> Arc<dyn ShaderProgram> {
    engine
        .device_mut()
        .create_program(
            ShaderDesc::new(name)
                .with_stage(ShaderStage::Vertex, "void main() {}")
                .with_stage(ShaderStage::Fragment, "void main() {}"),
        )
        .unwrap()
}

fn uniform(log: &MockDeviceLog, program: &str, name: &str) -> Option<UniformValue> {
    log.uniforms.get(&(program.to_string(), name.to_string())).cloned()
}

fn light_records(log: &MockDeviceLog, engine: &Engine) -> Vec<GpuPointLight> {
    let buffer = engine.pipeline().light_buffer().buffer().unwrap();
    let bytes = &log.buffers[&buffer.handle()];
    let count = (bytes.len() - HEADER_SIZE) / POINT_LIGHT_STRIDE;
    (0..count)
        .map(|i| {
            let start = HEADER_SIZE + i * POINT_LIGHT_STRIDE;
            bytemuck::pod_read_unaligned(&bytes[start..start + POINT_LIGHT_STRIDE])
        })
        .collect()
}

// ============================================================================
// FRAMES
// ============================================================================

#[test]
#[serial]
fn test_textured_cube_casts_shadows_then_shades() {
    let (mut engine, log) = start_engine();
    let mut scene = BasicScene::new(CameraConfiguration::default());
    scene.add_light(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 0.9, 0.8), 15.0);
    let cube = scene
        .objects_mut()
        .create_object(Vec3::new(0.0, 0.0, -4.0), Quat::IDENTITY, Vec3::ONE);

    let texture = engine
        .device_mut()
        .create_texture(TextureDesc {
            width: 8,
            height: 8,
            format: TextureFormat::R8G8B8A8_SRGB,
            usage: TextureUsage::Sampled,
            kind: TextureKind::Texture2D,
            data: None,
        })
        .unwrap();
    let lit = program(&mut engine, "lit");
    scene.add_drawable(cube, Arc::new(ShaderMaterial::new(lit).with_texture(texture, 0)));

    let stats = engine.render_frame(&scene).unwrap();

    assert_eq!(stats.shadow_passes, 1);
    let log = log.lock().unwrap();
    let world = scene.objects().world_matrix(cube).unwrap();
    assert_eq!(uniform(&log, "shadow_depth", "model"), Some(UniformValue::Mat4(world)));
    assert_eq!(uniform(&log, "shadow_depth", "far_plane"), Some(UniformValue::Float(30.0)));
    assert_eq!(uniform(&log, "lit", "model"), Some(UniformValue::Mat4(world)));
    assert_eq!(
        uniform(&log, "lit", "view"),
        Some(UniformValue::Mat4(scene.active_camera().view_matrix(scene.objects()).unwrap()))
    );
    assert_eq!(log.matching("bind_program"), vec!["bind_program shadow_depth", "bind_program lit"]);
    assert_eq!(log.frames_presented, 1);
}

#[test]
#[serial]
fn test_fifth_light_is_uploaded_without_shadow() {
    let (mut engine, log) = start_engine();
    let mut scene = BasicScene::new(CameraConfiguration::default());
    for i in 0..5 {
        scene.add_light(Vec3::new(i as f32 * 2.0, 3.0, 0.0), Vec3::ONE, 10.0);
    }

    let stats = engine.render_frame(&scene).unwrap();

    assert_eq!(stats.light_count, 5);
    assert_eq!(stats.shadow_passes, 4);
    assert_eq!(engine.pipeline().shadow_framebuffers().len(), 4);
    let log = log.lock().unwrap();
    let records = light_records(&log, &engine);
    assert_eq!(records.len(), 5);
    assert_eq!(records[4].shadow_slot, -1);
    assert_eq!(records[4].pos, [8.0, 3.0, 0.0]);
    assert_eq!(records[3].shadow_slot, 3);
}

#[test]
#[serial]
fn test_removing_a_light_shrinks_gpu_resources() {
    let (mut engine, log) = start_engine();
    let mut scene = BasicScene::new(CameraConfiguration::default());
    scene.add_light(Vec3::X, Vec3::ONE, 10.0);
    scene.add_light(Vec3::Y, Vec3::ONE, 10.0);
    engine.render_frame(&scene).unwrap();
    assert_eq!(engine.device().stats().live_framebuffers, 2);

    scene.remove_light(0).unwrap();
    let stats = engine.render_frame(&scene).unwrap();

    assert!(stats.light_buffer_reallocated);
    assert!(stats.shadow_framebuffers_recreated);
    assert_eq!(engine.device().stats().live_framebuffers, 1);
    assert_eq!(engine.device().stats().live_buffers, 1);
    let log = log.lock().unwrap();
    assert_eq!(light_records(&log, &engine)[0].pos, [0.0, 1.0, 0.0]);
}

#[test]
#[serial]
fn test_parented_light_follows_its_parent() {
    let (mut engine, log) = start_engine();
    let mut scene = BasicScene::new(CameraConfiguration::default());
    let lantern = scene
        .objects_mut()
        .create_object(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
    scene.add_light(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE, 10.0);
    let light_key = scene.lights()[0].key();
    scene.objects_mut().set_parent(light_key, Some(lantern)).unwrap();
    engine.render_frame(&scene).unwrap();

    scene.objects_mut().set_relative_pos(lantern, Vec3::new(-3.0, 0.0, 0.0)).unwrap();
    let stats = engine.render_frame(&scene).unwrap();

    assert!(!stats.light_buffer_reallocated);
    let log = log.lock().unwrap();
    assert_eq!(light_records(&log, &engine)[0].pos, [-3.0, 2.0, 0.0]);
    assert_eq!(
        uniform(&log, "shadow_depth", "light_pos"),
        Some(UniformValue::Vec3(Vec3::new(-3.0, 2.0, 0.0)))
    );
}

#[test]
#[serial]
fn test_deleted_drawable_is_reported_and_frame_continues() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    let (mut engine, log) = start_engine();
    let mut scene = BasicScene::new(CameraConfiguration::default());
    scene.add_light(Vec3::Y, Vec3::ONE, 10.0);
    let doomed = scene.objects_mut().create_object(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    let lit = program(&mut engine, "lit");
    scene.add_drawable(doomed, Arc::new(ShaderMaterial::new(lit)));
    scene.objects_mut().delete(doomed).unwrap();

    let result = engine.render_frame(&scene);
    Engine::reset_logger();

    assert!(result.is_ok());
    assert_eq!(log.lock().unwrap().frames_presented, 1);
    let entries = entries.lock().unwrap();
    assert!(entries
        .iter()
        .any(|e| e.severity == LogSeverity::Error && e.source == "umbra3d::ObjectGraph"));
}

#[test]
#[serial]
fn test_resize_event_then_frame_uses_new_viewport() {
    let (mut engine, log) = start_engine();
    let mut scene = BasicScene::new(CameraConfiguration::default());

    let event = winit::event::WindowEvent::Resized(winit::dpi::PhysicalSize::new(1920, 1080));
    assert!(engine.handle_window_event(&event, scene.camera_mut()).unwrap());
    log.lock().unwrap().clear_commands();
    engine.render_frame(&scene).unwrap();

    assert_eq!(log.lock().unwrap().position("set_viewport 0 0 1920 1080"), Some(1));
    assert_eq!(scene.active_camera().configuration().aspect(), 1920.0 / 1080.0);
}
