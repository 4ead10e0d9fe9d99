/// Shader program trait, stage sources and uniform values

use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

/// GLSL source of one stage
#[derive(Debug, Clone)]
pub struct ShaderStageSource {
    pub stage: ShaderStage,
    pub source: String,
}

/// Descriptor for creating a shader program
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Debug name
    pub name: String,
    /// Stage sources, linked together
    pub stages: Vec<ShaderStageSource>,
}

impl ShaderDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), stages: Vec::new() }
    }

    pub fn with_stage(mut self, stage: ShaderStage, source: impl Into<String>) -> Self {
        self.stages.push(ShaderStageSource { stage, source: source.into() });
        self
    }

    pub fn source(&self, stage: ShaderStage) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.source.as_str())
    }
}

/// Value pushed to a named uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Mat4Array(Vec<Mat4>),
}

/// Linked shader program
pub trait ShaderProgram: Send + Sync {
    /// Debug name
    fn name(&self) -> &str;

    /// Set a uniform on this program
    ///
    /// The program must be bound. Unknown names are ignored, as the GL
    /// driver does for uniforms optimized out of the program.
    fn set_uniform(&self, name: &str, value: UniformValue) -> Result<()>;

    /// Backend object name
    fn handle(&self) -> u32;
}
