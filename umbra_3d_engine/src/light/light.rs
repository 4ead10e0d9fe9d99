/// Light - point light bound to an object of the graph.
///
/// Besides color and attenuation, a light provides the geometry of its cube
/// shadow map: six face view matrices and one 90° projection.
/// - view matrices are cached against the node's world stamp, so any change
///   of position or rotation (own or inherited) recomputes them
/// - the projection is cached against `target_distance`

use std::cell::Cell;
use std::f32::consts::FRAC_PI_2;
use glam::{Mat4, Quat, Vec3};
use crate::error::Result;
use crate::scene::{ObjectGraph, ObjectKey};

/// Near plane of every shadow projection
pub const SHADOW_NEAR_PLANE: f32 = 0.1;

/// Cube face look directions, in GL cube map layer order
pub const CUBE_FACE_DIRECTIONS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Up vector for each face of `CUBE_FACE_DIRECTIONS`
pub const CUBE_FACE_UPS: [Vec3; 6] = [
    Vec3::NEG_Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
    Vec3::NEG_Y,
    Vec3::NEG_Y,
];

/// Constant/linear/quadratic falloff coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// Attenuation coefficients for a light meant to reach `target_distance`
///
/// `constant = 1`, `linear = 4.4 / d`, `quadratic = 3 / (d - 5)`.
/// Distances at or below 5 yield an infinite or negative quadratic term;
/// callers are expected to stay above that range.
pub fn calculate_light_values(target_distance: f32) -> Attenuation {
    Attenuation {
        constant: 1.0,
        linear: 4.4 / target_distance,
        quadratic: 3.0 / (target_distance - 5.0),
    }
}

/// Point light
#[derive(Debug)]
pub struct Light {
    key: ObjectKey,
    color: Vec3,
    target_distance: f32,
    attenuation: Attenuation,
    view_cache: Cell<Option<(u64, [Mat4; 6])>>,
    projection_cache: Cell<Option<(f32, Mat4)>>,
}

impl Light {
    /// Create a root object at `pos` and bind a light to it
    pub fn new(graph: &mut ObjectGraph, pos: Vec3, color: Vec3, target_distance: f32) -> Self {
        let key = graph.create_object(pos, Quat::IDENTITY, Vec3::ONE);
        Self::from_object(key, color, target_distance)
    }

    /// Bind a light to an existing object
    pub fn from_object(key: ObjectKey, color: Vec3, target_distance: f32) -> Self {
        Self {
            key,
            color,
            target_distance,
            attenuation: calculate_light_values(target_distance),
            view_cache: Cell::new(None),
            projection_cache: Cell::new(None),
        }
    }

    pub fn key(&self) -> ObjectKey {
        self.key
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    pub fn target_distance(&self) -> f32 {
        self.target_distance
    }

    /// Change the reach of the light
    ///
    /// Recomputes the attenuation and drops the cached shadow projection.
    pub fn set_target_distance(&mut self, target_distance: f32) {
        if self.target_distance == target_distance {
            return;
        }
        self.target_distance = target_distance;
        self.attenuation = calculate_light_values(target_distance);
        self.projection_cache.set(None);
    }

    pub fn attenuation(&self) -> Attenuation {
        self.attenuation
    }

    /// Override the derived attenuation
    ///
    /// The next `set_target_distance` call replaces it again.
    pub fn set_attenuation(&mut self, attenuation: Attenuation) {
        self.attenuation = attenuation;
    }

    /// Far plane of the shadow projection (`2 × target_distance`)
    pub fn far_plane(&self) -> f32 {
        2.0 * self.target_distance
    }

    /// Absolute position of the light
    pub fn pos(&self, graph: &ObjectGraph) -> Result<Vec3> {
        graph.pos(self.key)
    }

    /// One look-at matrix per cube face, ordered `+X, -X, +Y, -Y, +Z, -Z`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHandle` if the light's object was deleted.
    pub fn view_matrices(&self, graph: &ObjectGraph) -> Result<[Mat4; 6]> {
        let stamp = graph.world_version(self.key)?;
        if let Some((cached_stamp, views)) = self.view_cache.get() {
            if cached_stamp == stamp {
                return Ok(views);
            }
        }

        let pos = graph.pos(self.key)?;
        let mut views = [Mat4::IDENTITY; 6];
        for (face, view) in views.iter_mut().enumerate() {
            *view = Mat4::look_at_rh(pos, pos + CUBE_FACE_DIRECTIONS[face], CUBE_FACE_UPS[face]);
        }
        self.view_cache.set(Some((stamp, views)));
        Ok(views)
    }

    /// 90° square perspective covering one cube face
    pub fn projection_matrix(&self) -> Mat4 {
        if let Some((distance, matrix)) = self.projection_cache.get() {
            if distance == self.target_distance {
                return matrix;
            }
        }
        let matrix = Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, SHADOW_NEAR_PLANE, self.far_plane());
        self.projection_cache.set(Some((self.target_distance, matrix)));
        matrix
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
