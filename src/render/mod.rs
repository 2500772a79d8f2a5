//! The tile scheduler: partitions the image into row bands, drives the eye
//! pass over each band on its own worker thread, and collects per-pixel
//! results into the image buffer consumed by [`crate::post`].

use std::sync::mpsc::sync_channel;
use std::thread;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::RenderError;
use crate::kdtree::KdTree;
use crate::photon::PhotonHit;
use crate::primitives::Vec3;
use crate::radiance::radiance;
use crate::scene::Scene;

/// Capacity of the per-pixel result channel; matches the photon emitter's
/// channel so both concurrency stages share the same backpressure shape.
const CHANNEL_CAPACITY: usize = 128;

/// One pixel's averaged colour, tagged with its image-space coordinates so
/// the collector can place it regardless of arrival order.
struct PixelResult {
    x: usize,
    y: usize,
    colour: Vec3,
}

/// The two parallel per-pixel arrays the bloom stage reads: the tone-mapped
/// colour and the "peaks" buffer seeded from it.
pub struct ImageBuffer {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec3>,
    pub peaks: Vec<Vec3>,
}

impl ImageBuffer {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Vec3::ZERO; rows * cols],
            peaks: vec![Vec3::ZERO; rows * cols],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        self.data[self.index(x, y)]
    }
}

/// Drives the eye pass over `scene`, using `chunks` worker threads each
/// handling an equal-height row band. `rows` must divide evenly by `chunks`.
#[allow(clippy::too_many_arguments)]
pub fn render(
    scene: &Scene,
    diffuse_tree: &KdTree<PhotonHit>,
    caustic_tree: &KdTree<PhotonHit>,
    num_rays: u32,
    min_depth: u32,
    chunks: usize,
    seed: u64,
) -> Result<ImageBuffer, RenderError> {
    let rows = scene.rows;
    let cols = scene.cols;

    if rows % chunks != 0 {
        return Err(RenderError::Config(format!(
            "image height {rows} does not divide evenly into {chunks} chunks"
        )));
    }

    let band_height = rows / chunks;
    let mut buffer = ImageBuffer::new(rows, cols);

    let (sender, receiver) = sync_channel::<PixelResult>(CHANNEL_CAPACITY);
    let progress = ProgressBar::new((rows * cols) as u64);
    progress.set_style(
        ProgressStyle::with_template("{msg} {bar:40} {pos}/{len}")
            .expect("valid progress template")
            .progress_chars("=>-"),
    );
    progress.set_message("tracing eye rays");

    thread::scope(|scope| {
        for chunk in 0..chunks {
            let sender = sender.clone();
            let row_start = chunk * band_height;
            let row_end = row_start + band_height;

            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed ^ ((chunk as u64) << 48));
                for y in row_start..row_end {
                    for x in 0..cols {
                        let colour = trace_pixel(scene, diffuse_tree, caustic_tree, x, y, num_rays, min_depth, &mut rng);
                        let _ = sender.send(PixelResult { x, y, colour });
                    }
                }
            });
        }
        drop(sender);

        let expected = rows * cols;
        for _ in 0..expected {
            let result = receiver.recv().expect("worker threads exit only after sending every pixel");
            let index = buffer.index(result.x, result.y);
            buffer.data[index] = result.colour.clamp01();
            buffer.peaks[index] = result.colour.peaks(0.8);
            progress.inc(1);
        }
    });

    progress.finish_with_message("eye pass complete");
    Ok(buffer)
}

fn trace_pixel(
    scene: &Scene,
    diffuse_tree: &KdTree<PhotonHit>,
    caustic_tree: &KdTree<PhotonHit>,
    x: usize,
    y: usize,
    num_rays: u32,
    min_depth: u32,
    rng: &mut StdRng,
) -> Vec3 {
    let py = scene.height - 2.0 * scene.height * y as f64 / scene.rows as f64;
    let px = -scene.width + 2.0 * scene.width * x as f64 / scene.cols as f64;

    let mut accum = Vec3::ZERO;
    for _ in 0..num_rays {
        let dx = rng.gen_range(0.0..scene.pix_w);
        let dy = rng.gen_range(0.0..scene.pix_h);

        let target = Vec3::new(px + dx, py + dy, 0.0);
        let direction = (target - scene.camera.origin).normalise();
        let ray = crate::primitives::Ray::new(scene.camera.origin, direction);

        accum += radiance(ray, &scene.objects, diffuse_tree, caustic_tree, 0, 1.0, min_depth, rng);
    }

    accum / num_rays as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Material, Shape};

    fn trivial_scene(rows: usize, cols: usize) -> Scene {
        let objects = vec![Shape::sphere(Vec3::new(0.0, 0.0, -10.0), 2.0, Material::Diffuse, Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 1.0))];
        Scene::new(90.0, cols, rows, objects)
    }

    #[test]
    fn chunk_count_not_dividing_rows_is_rejected() {
        let scene = trivial_scene(10, 10);
        let diffuse = KdTree::build(Vec::new());
        let caustic = KdTree::build(Vec::new());
        let result = render(&scene, &diffuse, &caustic, 1, 2, 3, 1);
        assert!(matches!(result, Err(RenderError::Config(_))));
    }

    #[test]
    fn every_pixel_is_filled() {
        let scene = trivial_scene(8, 8);
        let diffuse = KdTree::build(Vec::new());
        let caustic = KdTree::build(Vec::new());
        let buffer = render(&scene, &diffuse, &caustic, 2, 1, 4, 1).unwrap();
        assert_eq!(buffer.data.len(), 64);
    }

    fn luminance(c: Vec3) -> f64 {
        c.x + c.y + c.z
    }

    /// A lit emissive sphere above a diffuse floor should make the image
    /// centre (which looks straight at the sphere) markedly brighter than
    /// the image edges (which look past it into empty space).
    #[test]
    fn lit_sphere_is_brighter_at_centre_than_at_edges() {
        let objects = vec![
            Shape::sphere(Vec3::new(0.0, 0.0, -10.0), 1.0, Material::Diffuse, Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0)),
            Shape::plane(Vec3::new(0.0, -2.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Material::Diffuse, Vec3::new(0.8, 0.8, 0.8), Vec3::ZERO),
        ];
        let scene = Scene::new(90.0, 20, 20, objects);
        let diffuse = KdTree::build(Vec::new());
        let caustic = KdTree::build(Vec::new());
        let buffer = render(&scene, &diffuse, &caustic, 48, 2, 4, 1).unwrap();

        let centre = luminance(buffer.get(10, 10));
        let edge = luminance(buffer.get(0, 0)).max(luminance(buffer.get(19, 0))).max(luminance(buffer.get(0, 19))).max(luminance(buffer.get(19, 19)));

        assert!(centre >= 3.0 * edge, "centre {centre} was not >= 3x edge {edge}");
    }

    /// Smoke-tests the full eye pass over a multi-shape scene with mixed
    /// materials: every pixel fills, and the image isn't pathologically dark
    /// or saturated.
    #[test]
    fn full_scene_smoke_test_has_sane_average_luminance() {
        let objects = crate::scene::scenes::build("default");
        let scene = Scene::new(90.0, 16, 8, objects);
        let diffuse = KdTree::build(Vec::new());
        let caustic = KdTree::build(Vec::new());
        let buffer = render(&scene, &diffuse, &caustic, 8, 2, 4, 1).unwrap();

        let total: f64 = buffer.data.iter().map(|c| luminance(*c)).sum();
        let average = total / (buffer.rows * buffer.cols) as f64;

        assert!(average > 0.0, "average luminance should not be exactly black");
        assert!(average < 3.0, "average luminance {average} looks saturated");
    }
}
