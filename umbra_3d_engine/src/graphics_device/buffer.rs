/// Buffer trait and buffer descriptor

use crate::error::Result;

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform buffer
    Uniform,
    /// Shader storage buffer
    Storage,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Initial contents (uploaded at creation, at most `size` bytes)
    pub data: Option<Vec<u8>>,
}

/// Buffer resource trait
///
/// The GPU object is released when the last reference drops.
pub trait Buffer: Send + Sync {
    /// Write `data` at `offset` (in bytes)
    ///
    /// # Errors
    ///
    /// Returns an error if the write would run past the end of the buffer.
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Backend object name
    fn handle(&self) -> u32;
}
