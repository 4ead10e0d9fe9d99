//! Light module - point lights and their cube shadow geometry.

mod light;

pub use light::{
    Attenuation, Light, calculate_light_values,
    CUBE_FACE_DIRECTIONS, CUBE_FACE_UPS, SHADOW_NEAR_PLANE,
};
