/// Camera - an object in the graph plus a projection configuration.
///
/// The camera owns the `ObjectKey` of its transform node. Position and
/// rotation are edited through the `ObjectGraph` like any other object;
/// the camera only adds the view and projection matrices on top.
///
/// Both matrices are memoized:
/// - the view matrix against the node's world stamp
/// - the projection matrix until `resize` changes the aspect ratio or a new
///   configuration is set

use std::cell::Cell;
use std::f32::consts::FRAC_PI_2;
use glam::{Mat4, Quat, Vec3};
use crate::error::Result;
use crate::scene::{ObjectGraph, ObjectKey};

/// Rotation applied after the look-at so an identity rotation looks down +X
pub const YAW_CORRECTION: f32 = FRAC_PI_2;

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraConfiguration {
    /// Symmetric perspective, `fov_y` in radians
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Orthographic box spanning `[-half_height * aspect, half_height * aspect]`
    /// horizontally and `[-half_height, half_height]` vertically
    Orthographic {
        half_height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl CameraConfiguration {
    pub fn aspect(&self) -> f32 {
        match *self {
            CameraConfiguration::Perspective { aspect, .. } => aspect,
            CameraConfiguration::Orthographic { aspect, .. } => aspect,
        }
    }

    /// Same configuration with another aspect ratio
    pub fn with_aspect(self, new_aspect: f32) -> Self {
        match self {
            CameraConfiguration::Perspective { fov_y, near, far, .. } => {
                CameraConfiguration::Perspective { fov_y, aspect: new_aspect, near, far }
            }
            CameraConfiguration::Orthographic { half_height, near, far, .. } => {
                CameraConfiguration::Orthographic { half_height, aspect: new_aspect, near, far }
            }
        }
    }

    /// OpenGL clip-space projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match *self {
            CameraConfiguration::Perspective { fov_y, aspect, near, far } => {
                Mat4::perspective_rh_gl(fov_y, aspect, near, far)
            }
            CameraConfiguration::Orthographic { half_height, aspect, near, far } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh_gl(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }
}

impl Default for CameraConfiguration {
    fn default() -> Self {
        CameraConfiguration::Perspective {
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Camera bound to one object of an `ObjectGraph`
#[derive(Debug)]
pub struct Camera {
    key: ObjectKey,
    configuration: CameraConfiguration,
    projection_cache: Cell<Option<Mat4>>,
    view_cache: Cell<Option<(u64, Mat4)>>,
}

impl Camera {
    /// Create a root object for the camera and bind to it
    pub fn new(graph: &mut ObjectGraph, pos: Vec3, rot: Quat, configuration: CameraConfiguration) -> Self {
        let key = graph.create_object(pos, rot, Vec3::ONE);
        Self::from_object(key, configuration)
    }

    /// Bind a camera to an existing object
    pub fn from_object(key: ObjectKey, configuration: CameraConfiguration) -> Self {
        Self {
            key,
            configuration,
            projection_cache: Cell::new(None),
            view_cache: Cell::new(None),
        }
    }

    /// Handle of the camera's transform node
    pub fn key(&self) -> ObjectKey {
        self.key
    }

    pub fn configuration(&self) -> &CameraConfiguration {
        &self.configuration
    }

    /// Replace the projection configuration
    pub fn set_configuration(&mut self, configuration: CameraConfiguration) {
        if self.configuration != configuration {
            self.configuration = configuration;
            self.projection_cache.set(None);
        }
    }

    /// Adapt the aspect ratio to a new window size
    ///
    /// A zero height (minimized window) is ignored. The projection is only
    /// recomputed when the aspect ratio actually changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let aspect = width as f32 / height as f32;
        if aspect != self.configuration.aspect() {
            self.configuration = self.configuration.with_aspect(aspect);
            self.projection_cache.set(None);
            crate::engine_debug!(
                "umbra3d::Camera",
                "Projection aspect updated to {:.3} ({}x{})",
                aspect, width, height
            );
        }
    }

    /// Projection matrix, recomputed only after a configuration change
    pub fn projection_matrix(&self) -> Mat4 {
        if let Some(matrix) = self.projection_cache.get() {
            return matrix;
        }
        let matrix = self.configuration.projection_matrix();
        self.projection_cache.set(Some(matrix));
        matrix
    }

    /// View matrix `R_y(YAW_CORRECTION) · look_at(pos, pos + forward, up)`
    ///
    /// `forward` and `up` are the absolute rotation applied to -Z and +Y.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHandle` if the camera's object was deleted.
    pub fn view_matrix(&self, graph: &ObjectGraph) -> Result<Mat4> {
        let stamp = graph.world_version(self.key)?;
        if let Some((cached_stamp, matrix)) = self.view_cache.get() {
            if cached_stamp == stamp {
                return Ok(matrix);
            }
        }

        let pos = graph.pos(self.key)?;
        let rot = graph.rot(self.key)?;
        let look_at = Mat4::look_at_rh(pos, pos + rot * Vec3::NEG_Z, rot * Vec3::Y);
        let matrix = Mat4::from_rotation_y(YAW_CORRECTION) * look_at;
        self.view_cache.set(Some((stamp, matrix)));
        Ok(matrix)
    }

    /// `projection · view`
    pub fn view_projection(&self, graph: &ObjectGraph) -> Result<Mat4> {
        Ok(self.projection_matrix() * self.view_matrix(graph)?)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
