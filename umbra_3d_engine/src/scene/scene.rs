/// Scene - the seam the render pipeline traverses.
///
/// The pipeline reads the object graph, the ordered light list and the
/// active camera, then calls `render` once per shadow pass and once for the
/// main pass. `render` is where a scene binds its materials and submits
/// its draws.

use crate::camera::Camera;
use crate::error::Result;
use crate::light::Light;
use crate::render::PassContext;
use crate::scene::ObjectGraph;

pub trait Scene {
    /// Transform hierarchy every light, camera and drawable lives in
    fn objects(&self) -> &ObjectGraph;

    /// Lights in slot order (index `i` gets shadow slot `i` while below
    /// the shadow map limit)
    fn lights(&self) -> &[Light];

    fn active_camera(&self) -> &Camera;

    /// Draw the scene for the current pass
    ///
    /// Called with `pass.render_context().is_depth_only()` set during
    /// shadow passes.
    fn render(&self, pass: &mut PassContext<'_>) -> Result<()>;
}
