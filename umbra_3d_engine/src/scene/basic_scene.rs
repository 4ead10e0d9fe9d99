/// BasicScene - a ready-made `Scene` owning its graph, lights and camera.
///
/// Drawables are (object, material) pairs rendered in insertion order.
/// A drawable whose object was deleted is skipped for the pass: the stale
/// handle is already reported at error severity by the graph.

use std::sync::Arc;
use glam::{Quat, Vec3};
use crate::camera::{Camera, CameraConfiguration};
use crate::error::{Error, Result};
use crate::light::Light;
use crate::render::{Material, PassContext};
use crate::scene::{ObjectGraph, ObjectKey, Scene};

pub struct BasicScene {
    objects: ObjectGraph,
    lights: Vec<Light>,
    camera: Camera,
    drawables: Vec<(ObjectKey, Arc<dyn Material>)>,
}

impl BasicScene {
    /// Empty scene with a camera at the origin looking down -Z
    pub fn new(configuration: CameraConfiguration) -> Self {
        let mut objects = ObjectGraph::new();
        let camera = Camera::new(&mut objects, Vec3::ZERO, Quat::IDENTITY, configuration);
        Self {
            objects,
            lights: Vec::new(),
            camera,
            drawables: Vec::new(),
        }
    }

    pub fn objects_mut(&mut self) -> &mut ObjectGraph {
        &mut self.objects
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Create a point light object and append it to the light list
    pub fn add_light(&mut self, pos: Vec3, color: Vec3, target_distance: f32) -> usize {
        let light = Light::new(&mut self.objects, pos, color, target_distance);
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Remove the light at `index` and delete its object
    ///
    /// Later lights shift down one slot.
    pub fn remove_light(&mut self, index: usize) -> Result<Light> {
        if index >= self.lights.len() {
            return Err(Error::InvalidHandle(format!(
                "light index {} out of range ({} lights)",
                index,
                self.lights.len()
            )));
        }
        let light = self.lights.remove(index);
        self.objects.delete(light.key())?;
        Ok(light)
    }

    pub fn add_drawable(&mut self, object: ObjectKey, material: Arc<dyn Material>) {
        self.drawables.push((object, material));
    }

    /// Drop every drawable attached to `object`, returning how many were removed
    pub fn remove_drawables(&mut self, object: ObjectKey) -> usize {
        let before = self.drawables.len();
        self.drawables.retain(|(key, _)| *key != object);
        before - self.drawables.len()
    }

    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }
}

impl Scene for BasicScene {
    fn objects(&self) -> &ObjectGraph {
        &self.objects
    }

    fn lights(&self) -> &[Light] {
        &self.lights
    }

    fn active_camera(&self) -> &Camera {
        &self.camera
    }

    fn render(&self, pass: &mut PassContext<'_>) -> Result<()> {
        for (object, material) in &self.drawables {
            match material.bind(pass, *object) {
                Ok(()) | Err(Error::InvalidHandle(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "basic_scene_tests.rs"]
mod tests;
