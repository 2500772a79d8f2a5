use crate::geometry::Shape;
use crate::primitives::{Ray, Vec3};

/// Ordered container of shapes plus the camera and the image-plane-to-world
/// mapping.
///
/// Shape identity (used by emitter sampling) is by index into `objects`,
/// not by value — two visually identical shapes at different indices are
/// distinct emitters.
pub struct Scene {
    /// Width of the image plane in world units.
    pub width: f64,
    /// Height of the image plane in world units.
    pub height: f64,
    pub rows: usize,
    pub cols: usize,
    pub objects: Vec<Shape>,
    pub camera: Ray,
    pub near: f64,
    pub pix_w: f64,
    pub pix_h: f64,
}

impl Scene {
    /// Builds a scene from a field of view (degrees) and output resolution.
    ///
    /// The image plane height is fixed at `2.0` world units; width follows
    /// the pixel aspect ratio. The camera sits at `(0, 0, near)` looking
    /// down `-z`, with `near = |fov / tan(fov / 2)|`.
    pub fn new(fov_degrees: f64, cols: usize, rows: usize, objects: Vec<Shape>) -> Self {
        let height = 2.0;
        let width = height * (cols as f64 / rows as f64);
        let fov = fov_degrees.to_radians();
        let near = (fov / (fov / 2.0).tan()).abs();

        let camera = Ray::new(Vec3::new(0.0, 0.0, near), Vec3::new(0.0, 0.0, -1.0));

        Self {
            width,
            height,
            rows,
            cols,
            objects,
            camera,
            near,
            pix_w: 2.0 * width / cols as f64,
            pix_h: 2.0 * height / rows as f64,
        }
    }

    /// Indices and references of every emissive shape in the scene.
    pub fn emitters(&self) -> impl Iterator<Item = (usize, &Shape)> {
        self.objects.iter().enumerate().filter(|(_, shape)| shape.is_emitter())
    }
}
