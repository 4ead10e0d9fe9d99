/// Engine and pipeline configuration
///
/// Plain structs with defaults and builder-style setters. Nothing here is
/// persisted; the application builds a config in code and hands it to
/// `Engine::new`.

use crate::error::{Error, Result};

/// Hard upper bound on simultaneously shadowed lights
///
/// Lights past this index get shadow slot -1 in the light buffer and no
/// cube map.
pub const MAX_SHADOW_MAPS: usize = 4;

/// Default edge length of a shadow cube face, in texels
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 1024;

/// Render pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Edge length of each shadow cube face (power of two)
    pub shadow_map_size: u32,
    /// Number of lights that receive a shadow cube map (at most `MAX_SHADOW_MAPS`)
    pub max_shadow_maps: usize,
    /// Run the shadow pass at all
    ///
    /// When false every light record carries `shadow_slot = -1` and no cube
    /// map is bound in the main pass.
    pub shadows_enabled: bool,
    /// Storage buffer binding point of the light buffer
    pub light_buffer_binding: u32,
    /// First texture unit used for shadow cube maps (slot i binds to base + i)
    pub shadow_texture_unit_base: u32,
    /// Clear color of the default framebuffer
    pub clear_color: [f32; 4],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: DEFAULT_SHADOW_MAP_SIZE,
            max_shadow_maps: MAX_SHADOW_MAPS,
            shadows_enabled: true,
            light_buffer_binding: 0,
            shadow_texture_unit_base: 8,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl PipelineConfig {
    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    pub fn with_max_shadow_maps(mut self, count: usize) -> Self {
        self.max_shadow_maps = count;
        self
    }

    pub fn with_shadows_enabled(mut self, enabled: bool) -> Self {
        self.shadows_enabled = enabled;
        self
    }

    pub fn with_light_buffer_binding(mut self, binding: u32) -> Self {
        self.light_buffer_binding = binding;
        self
    }

    pub fn with_shadow_texture_unit_base(mut self, unit: u32) -> Self {
        self.shadow_texture_unit_base = unit;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Check the configuration before any GPU resource is created
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the shadow map size is zero or not a
    /// power of two, or if more than `MAX_SHADOW_MAPS` shadow maps are requested.
    pub fn validate(&self) -> Result<()> {
        if !self.shadow_map_size.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "shadow_map_size must be a non-zero power of two, got {}",
                self.shadow_map_size
            )));
        }
        if self.max_shadow_maps > MAX_SHADOW_MAPS {
            return Err(Error::InvalidConfig(format!(
                "max_shadow_maps must be at most {}, got {}",
                MAX_SHADOW_MAPS, self.max_shadow_maps
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Render pipeline settings
    pub pipeline: PipelineConfig,
    /// Application name (used in log lines)
    pub app_name: String,
    /// Initial window size in pixels
    pub window_size: (u32, u32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            app_name: "Umbra3D Application".to_string(),
            window_size: (1280, 720),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
