/// Graphics device module - GPU abstraction used by the render pipeline

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod frame_buffer;
pub mod shader;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use texture::*;
pub use frame_buffer::*;
pub use shader::*;

// Mock graphics device for tests and tools (no GPU required)
pub mod mock_graphics_device;
