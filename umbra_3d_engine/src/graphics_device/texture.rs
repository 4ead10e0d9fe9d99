/// Texture trait, texture descriptor, and texture info

/// Texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    D16_UNORM,
    D24_UNORM_S8_UINT,
    D32_FLOAT,
}

impl TextureFormat {
    /// True for depth (and depth/stencil) formats
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM | TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT
        )
    }
}

/// Texture usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled in shaders
    Sampled,
    /// Depth attachment that is also sampled (shadow maps)
    DepthSampled,
    /// Color attachment that is also sampled
    RenderTarget,
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Single 2D image
    Texture2D,
    /// Six square faces, ordered +X, -X, +Y, -Y, +Z, -Z
    CubeMap,
}

impl TextureKind {
    pub fn layer_count(&self) -> u32 {
        match self {
            TextureKind::Texture2D => 1,
            TextureKind::CubeMap => 6,
        }
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub kind: TextureKind,
    /// Pixel data for 2D textures; `None` leaves the storage uninitialized
    pub data: Option<Vec<u8>>,
}

/// Texture information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub kind: TextureKind,
    pub array_layers: u32,
}

/// Texture resource trait
pub trait Texture: Send + Sync {
    /// Get texture information
    fn info(&self) -> &TextureInfo;

    /// False while the contents are still being decoded or uploaded
    ///
    /// Renderers bind the device placeholder instead of a texture that is
    /// not ready; they never wait for it.
    fn is_ready(&self) -> bool;

    /// Backend object name
    fn handle(&self) -> u32;
}
