/// Light buffer - the storage buffer holding every point light of the scene.
///
/// Layout (std430, shared with `shaders/lights.glsl`):
///
/// ```text
/// offset 0   header   { int light_count; int pad0, pad1, pad2; }           16 bytes
/// offset 16  records  point_light[light_count], 48 bytes each
/// ```
///
/// `HEADER_FIELDS` and `POINT_LIGHT_FIELDS` are the single description of
/// that layout. The GLSL block is generated from them, and the host structs
/// are checked against them.
///
/// The GPU buffer is reallocated only when the light count changes. With an
/// unchanged count the contents are rewritten in place and the buffer keeps
/// its identity.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::error::Result;
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, GraphicsDevice};
use crate::light::Light;
use crate::scene::ObjectGraph;

// ============================================================================
// Schema
// ============================================================================

/// GLSL scalar and vector types used by the light block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslType {
    Int,
    Float,
    Vec3,
}

impl GlslType {
    pub fn glsl_name(&self) -> &'static str {
        match self {
            GlslType::Int => "int",
            GlslType::Float => "float",
            GlslType::Vec3 => "vec3",
        }
    }

    /// Size in bytes under std430
    pub fn size(&self) -> usize {
        match self {
            GlslType::Int | GlslType::Float => 4,
            GlslType::Vec3 => 12,
        }
    }

    /// Base alignment under std430
    pub fn align(&self) -> usize {
        match self {
            GlslType::Int | GlslType::Float => 4,
            GlslType::Vec3 => 16,
        }
    }
}

/// One member of a GPU block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub ty: GlslType,
    pub offset: usize,
}

const fn field(name: &'static str, ty: GlslType, offset: usize) -> FieldLayout {
    FieldLayout { name, ty, offset }
}

/// Members of the `lights_buffer` header, in declaration order
pub const HEADER_FIELDS: &[FieldLayout] = &[
    field("light_count", GlslType::Int, 0),
    field("pad0", GlslType::Int, 4),
    field("pad1", GlslType::Int, 8),
    field("pad2", GlslType::Int, 12),
];

/// Members of `struct point_light`, in declaration order
pub const POINT_LIGHT_FIELDS: &[FieldLayout] = &[
    field("color", GlslType::Vec3, 0),
    field("linear", GlslType::Float, 12),
    field("pos", GlslType::Vec3, 16),
    field("quadratic", GlslType::Float, 28),
    field("constant", GlslType::Float, 32),
    field("shadow_slot", GlslType::Int, 36),
    field("far_plane", GlslType::Float, 40),
    field("pad", GlslType::Float, 44),
];

/// Header size in bytes
pub const HEADER_SIZE: usize = std::mem::size_of::<LightBufferHeader>();

/// Stride of one light record in bytes
pub const POINT_LIGHT_STRIDE: usize = std::mem::size_of::<GpuPointLight>();

/// Offsets of `fields` computed with std430 rules, plus the padded stride
pub fn std430_layout(fields: &[FieldLayout]) -> (Vec<usize>, usize) {
    let mut offsets = Vec::with_capacity(fields.len());
    let mut cursor: usize = 0;
    let mut max_align: usize = 1;
    for f in fields {
        let align = f.ty.align();
        max_align = max_align.max(align);
        cursor = cursor.next_multiple_of(align);
        offsets.push(cursor);
        cursor += f.ty.size();
    }
    (offsets, cursor.next_multiple_of(max_align))
}

/// GLSL declaration of the light block (struct + storage buffer)
pub fn glsl_declaration(binding: u32) -> String {
    let mut out = String::from("struct point_light {\n");
    for f in POINT_LIGHT_FIELDS {
        out.push_str(&format!("    {} {};\n", f.ty.glsl_name(), f.name));
    }
    out.push_str("};\n\n");
    out.push_str(&format!(
        "layout(std430, binding = {}) buffer lights_buffer {{\n",
        binding
    ));
    for f in HEADER_FIELDS {
        out.push_str(&format!("    {} {};\n", f.ty.glsl_name(), f.name));
    }
    out.push_str("    point_light point_lights[];\n};\n");
    out
}

/// Line replaced by `expand_light_include`
pub const LIGHT_INCLUDE_DIRECTIVE: &str = "#include <lights>";

/// Replace `#include <lights>` in a shader source with the light block
pub fn expand_light_include(source: &str, binding: u32) -> String {
    source.replace(LIGHT_INCLUDE_DIRECTIVE, glsl_declaration(binding).trim_end())
}

// ============================================================================
// Host records
// ============================================================================

/// Header of the light buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightBufferHeader {
    pub light_count: i32,
    pub pad: [i32; 3],
}

/// One point light as seen by shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    pub color: [f32; 3],
    pub linear: f32,
    pub pos: [f32; 3],
    pub quadratic: f32,
    pub constant: f32,
    pub shadow_slot: i32,
    pub far_plane: f32,
    pub pad: f32,
}

const _: () = assert!(HEADER_SIZE == 16);
const _: () = assert!(POINT_LIGHT_STRIDE == 48);

/// Total buffer size for `light_count` lights
pub fn buffer_size(light_count: usize) -> u64 {
    (HEADER_SIZE + light_count * POINT_LIGHT_STRIDE) as u64
}

/// Shadow slot of the light at `index`: its index while below the limit, else -1
pub fn shadow_slot(index: usize, max_shadow_maps: usize) -> i32 {
    if index < max_shadow_maps {
        index as i32
    } else {
        -1
    }
}

/// Serialize header and records for `lights`
///
/// # Errors
///
/// Returns `Error::InvalidHandle` if a light's object was deleted.
pub fn encode_lights(graph: &ObjectGraph, lights: &[Light], max_shadow_maps: usize) -> Result<Vec<u8>> {
    let header = LightBufferHeader {
        light_count: lights.len() as i32,
        pad: [0; 3],
    };

    let mut bytes = Vec::with_capacity(buffer_size(lights.len()) as usize);
    bytes.extend_from_slice(bytemuck::bytes_of(&header));

    for (index, light) in lights.iter().enumerate() {
        let attenuation = light.attenuation();
        let record = GpuPointLight {
            color: light.color().to_array(),
            linear: attenuation.linear,
            pos: light.pos(graph)?.to_array(),
            quadratic: attenuation.quadratic,
            constant: attenuation.constant,
            shadow_slot: shadow_slot(index, max_shadow_maps),
            far_plane: light.far_plane(),
            pad: 0.0,
        };
        bytes.extend_from_slice(bytemuck::bytes_of(&record));
    }
    Ok(bytes)
}

// ============================================================================
// LightBuffer
// ============================================================================

/// What `LightBuffer::sync` did this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The light count changed: a new buffer was created and bound
    Reallocated,
    /// Same count: contents rewritten in the existing buffer
    UpdatedInPlace,
}

/// Owner of the light storage buffer
#[derive(Default)]
pub struct LightBuffer {
    buffer: Option<Arc<dyn Buffer>>,
    synced_count: Option<usize>,
}

impl LightBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current GPU buffer (`None` before the first successful sync)
    pub fn buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.buffer.as_ref()
    }

    /// Light count of the last successful sync
    pub fn synced_count(&self) -> Option<usize> {
        self.synced_count
    }

    /// Upload the current light list
    ///
    /// On a count change the old buffer is released before a buffer of
    /// `16 + 48 × count` bytes is created and bound at `binding`. If that
    /// fails the buffer stays empty and the next sync reallocates.
    pub fn sync(
        &mut self,
        device: &mut dyn GraphicsDevice,
        graph: &ObjectGraph,
        lights: &[Light],
        binding: u32,
        max_shadow_maps: usize,
    ) -> Result<SyncOutcome> {
        let bytes = encode_lights(graph, lights, max_shadow_maps)?;

        if self.synced_count == Some(lights.len()) {
            if let Some(buffer) = &self.buffer {
                buffer.update(0, &bytes)?;
                return Ok(SyncOutcome::UpdatedInPlace);
            }
        }

        self.buffer = None;
        self.synced_count = None;

        let buffer = device.create_buffer(BufferDesc {
            size: buffer_size(lights.len()),
            usage: BufferUsage::Storage,
            data: Some(bytes),
        })?;
        device.bind_storage_buffer(binding, &buffer)?;

        crate::engine_info!(
            "umbra3d::LightBuffer",
            "Light buffer reallocated for {} lights ({} bytes)",
            lights.len(),
            buffer.size()
        );

        self.buffer = Some(buffer);
        self.synced_count = Some(lights.len());
        Ok(SyncOutcome::Reallocated)
    }
}

#[cfg(test)]
#[path = "light_buffer_tests.rs"]
mod tests;
