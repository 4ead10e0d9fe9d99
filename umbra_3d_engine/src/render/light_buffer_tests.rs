use std::mem::offset_of;
use std::sync::Arc;
use glam::Vec3;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::light::{calculate_light_values, Light};
use crate::scene::ObjectGraph;
use super::*;

const SHIPPED_LIGHTS_GLSL: &str = include_str!("../../shaders/lights.glsl");

fn scene_with_lights(count: usize) -> (ObjectGraph, Vec<Light>) {
    let mut graph = ObjectGraph::new();
    let lights = (0..count)
        .map(|i| Light::new(&mut graph, Vec3::new(i as f32, 2.0, 0.0), Vec3::ONE, 10.0))
        .collect();
    (graph, lights)
}

fn read_record(bytes: &[u8], index: usize) -> GpuPointLight {
    let start = HEADER_SIZE + index * POINT_LIGHT_STRIDE;
    bytemuck::pod_read_unaligned(&bytes[start..start + POINT_LIGHT_STRIDE])
}

// ============================================================================
// Schema
// ============================================================================

#[test]
fn test_host_structs_match_schema_offsets() {
    let host_offsets = [
        offset_of!(GpuPointLight, color),
        offset_of!(GpuPointLight, linear),
        offset_of!(GpuPointLight, pos),
        offset_of!(GpuPointLight, quadratic),
        offset_of!(GpuPointLight, constant),
        offset_of!(GpuPointLight, shadow_slot),
        offset_of!(GpuPointLight, far_plane),
        offset_of!(GpuPointLight, pad),
    ];
    let schema_offsets: Vec<usize> = POINT_LIGHT_FIELDS.iter().map(|f| f.offset).collect();
    assert_eq!(schema_offsets, host_offsets);

    assert_eq!(offset_of!(LightBufferHeader, light_count), HEADER_FIELDS[0].offset);
    assert_eq!(offset_of!(LightBufferHeader, pad), HEADER_FIELDS[1].offset);
}

#[test]
fn test_schema_offsets_follow_std430() {
    let (offsets, stride) = std430_layout(POINT_LIGHT_FIELDS);
    let schema_offsets: Vec<usize> = POINT_LIGHT_FIELDS.iter().map(|f| f.offset).collect();
    assert_eq!(offsets, schema_offsets);
    assert_eq!(stride, POINT_LIGHT_STRIDE);

    let (offsets, size) = std430_layout(HEADER_FIELDS);
    assert_eq!(offsets, vec![0, 4, 8, 12]);
    assert_eq!(size, HEADER_SIZE);
}

#[test]
fn test_std430_layout_pads_vec3_and_stride() {
    let fields = [
        FieldLayout { name: "intensity", ty: GlslType::Float, offset: 0 },
        FieldLayout { name: "direction", ty: GlslType::Vec3, offset: 16 },
        FieldLayout { name: "range", ty: GlslType::Float, offset: 28 },
        FieldLayout { name: "enabled", ty: GlslType::Int, offset: 32 },
    ];
    let (offsets, stride) = std430_layout(&fields);

    assert_eq!(offsets, vec![0, 16, 28, 32]);
    assert_eq!(stride, 48);
    assert_eq!(std430_layout(&[]), (Vec::new(), 0));
}

#[test]
fn test_generated_declaration_matches_shipped_shader() {
    let shipped = SHIPPED_LIGHTS_GLSL.replace("\r\n", "\n");
    assert_eq!(glsl_declaration(0).trim_end(), shipped.trim_end());
}

#[test]
fn test_expand_light_include() {
    let source = "#version 430 core\n#include <lights>\nvoid main() {}\n";
    let expanded = expand_light_include(source, 2);

    assert!(!expanded.contains(LIGHT_INCLUDE_DIRECTIVE));
    assert!(expanded.contains("layout(std430, binding = 2) buffer lights_buffer {"));
    assert!(expanded.starts_with("#version 430 core\nstruct point_light {"));
    assert!(expanded.ends_with("};\nvoid main() {}\n"));
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_buffer_size() {
    assert_eq!(buffer_size(0), 16);
    assert_eq!(buffer_size(3), 16 + 3 * 48);
}

#[test]
fn test_encode_lights_records() {
    let (graph, mut lights) = scene_with_lights(2);
    lights[1].set_color(Vec3::new(1.0, 0.5, 0.25));
    lights[1].set_target_distance(20.0);

    let bytes = encode_lights(&graph, &lights, 4).unwrap();
    assert_eq!(bytes.len() as u64, buffer_size(2));

    let header: LightBufferHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);
    assert_eq!(header.light_count, 2);

    let record = read_record(&bytes, 1);
    let attenuation = calculate_light_values(20.0);
    assert_eq!(record.color, [1.0, 0.5, 0.25]);
    assert_eq!(record.pos, [1.0, 2.0, 0.0]);
    assert_eq!(record.constant, attenuation.constant);
    assert_eq!(record.linear, attenuation.linear);
    assert_eq!(record.quadratic, attenuation.quadratic);
    assert_eq!(record.far_plane, 40.0);
    assert_eq!(record.shadow_slot, 1);
}

#[test]
fn test_lights_past_limit_get_no_shadow_slot() {
    let (graph, lights) = scene_with_lights(6);
    let bytes = encode_lights(&graph, &lights, 4).unwrap();

    let slots: Vec<i32> = (0..6).map(|i| read_record(&bytes, i).shadow_slot).collect();
    assert_eq!(slots, vec![0, 1, 2, 3, -1, -1]);
}

// ============================================================================
// Sync
// ============================================================================

#[test]
fn test_first_sync_allocates_and_binds() {
    let mut device = MockGraphicsDevice::new(640, 480);
    let log = device.log();
    let (graph, lights) = scene_with_lights(2);
    let mut light_buffer = LightBuffer::new();

    let outcome = light_buffer.sync(&mut device, &graph, &lights, 5, 4).unwrap();

    assert_eq!(outcome, SyncOutcome::Reallocated);
    let buffer = light_buffer.buffer().unwrap();
    assert_eq!(buffer.size(), buffer_size(2));
    assert_eq!(light_buffer.synced_count(), Some(2));
    assert_eq!(log.lock().unwrap().storage_bindings[&5], buffer.handle());
}

#[test]
fn test_same_count_updates_in_place() {
    let mut device = MockGraphicsDevice::new(640, 480);
    let log = device.log();
    let (mut graph, mut lights) = scene_with_lights(2);
    let mut light_buffer = LightBuffer::new();
    light_buffer.sync(&mut device, &graph, &lights, 0, 4).unwrap();
    let first = light_buffer.buffer().unwrap().clone();

    lights[0].set_color(Vec3::new(0.0, 1.0, 0.0));
    lights[1].set_target_distance(30.0);
    graph.set_relative_pos(lights[0].key(), Vec3::new(9.0, 9.0, 9.0)).unwrap();
    let outcome = light_buffer.sync(&mut device, &graph, &lights, 0, 4).unwrap();

    assert_eq!(outcome, SyncOutcome::UpdatedInPlace);
    assert!(Arc::ptr_eq(light_buffer.buffer().unwrap(), &first));

    let log = log.lock().unwrap();
    assert_eq!(log.count("create_buffer"), 1);
    assert_eq!(log.count("update_buffer"), 1);
    let record = read_record(&log.buffers[&first.handle()], 0);
    assert_eq!(record.color, [0.0, 1.0, 0.0]);
    assert_eq!(record.pos, [9.0, 9.0, 9.0]);
}

#[test]
fn test_count_change_reallocates() {
    let mut device = MockGraphicsDevice::new(640, 480);
    let log = device.log();
    let (mut graph, mut lights) = scene_with_lights(1);
    let mut light_buffer = LightBuffer::new();
    light_buffer.sync(&mut device, &graph, &lights, 0, 4).unwrap();
    let first = light_buffer.buffer().unwrap().clone();
    let first_handle = first.handle();
    drop(first);

    lights.push(Light::new(&mut graph, Vec3::ZERO, Vec3::ONE, 10.0));
    let outcome = light_buffer.sync(&mut device, &graph, &lights, 0, 4).unwrap();

    assert_eq!(outcome, SyncOutcome::Reallocated);
    let second = light_buffer.buffer().unwrap();
    assert_ne!(second.handle(), first_handle);
    assert_eq!(second.size(), buffer_size(2));

    let log = log.lock().unwrap();
    let release = log.position(&format!("release_buffer {}", first_handle)).unwrap();
    let create = log.position(&format!("create_buffer {}", second.handle())).unwrap();
    assert!(release < create, "old buffer must be released before the new one is created");
    assert_eq!(log.buffers.len(), 1);
}

#[test]
fn test_failed_allocation_retries_next_sync() {
    let mut device = MockGraphicsDevice::new(640, 480);
    let log = device.log();
    let (graph, lights) = scene_with_lights(1);
    let mut light_buffer = LightBuffer::new();

    log.lock().unwrap().fail_operation("create_buffer");
    assert!(light_buffer.sync(&mut device, &graph, &lights, 0, 4).is_err());
    assert!(light_buffer.buffer().is_none());

    log.lock().unwrap().clear_failures();
    let outcome = light_buffer.sync(&mut device, &graph, &lights, 0, 4).unwrap();
    assert_eq!(outcome, SyncOutcome::Reallocated);
}

#[test]
fn test_stale_light_fails_sync() {
    let mut device = MockGraphicsDevice::new(640, 480);
    let (mut graph, lights) = scene_with_lights(1);
    graph.delete(lights[0].key()).unwrap();

    let mut light_buffer = LightBuffer::new();
    assert!(matches!(
        light_buffer.sync(&mut device, &graph, &lights, 0, 4),
        Err(crate::error::Error::InvalidHandle(_))
    ));
}
