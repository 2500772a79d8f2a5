//! Photon emission: traces light from every emissive shape into the scene
//! and deposits the scattering events it records into two separate photon
//! maps, caustic and diffuse/global.

use std::sync::mpsc::{sync_channel, SyncSender};
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::{closest_intersection, Material, Shape};
use crate::kdtree::{KdTree, Positioned};
use crate::optics::{self, Refraction};
use crate::primitives::{Ray, Vec3};
use crate::jitter::standard_normal;

/// Producers feeding the shared photon channel, per emissive shape.
const CHUNKS: usize = 8;
/// Capacity of the photon-hit channel; matches the tile scheduler's result
/// channel so both concurrency stages share the same backpressure shape.
const CHANNEL_CAPACITY: usize = 128;

const CAUSTIC_FACTOR: usize = 128;
const DIFFUSE_FACTOR: usize = 16;

/// A recorded scattering event: where light landed, how much of it, which
/// direction it arrived from, and how many bounces it took to get there.
#[derive(Debug, Clone, Copy)]
pub struct PhotonHit {
    pub location: Vec3,
    pub photon: Vec3,
    pub incoming: Vec3,
    pub depth: u8,
}

impl Positioned for PhotonHit {
    fn position(&self) -> Vec3 {
        self.location
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Caustic,
    Diffuse,
}

/// Builds both photon maps for `scene`. Blocking: each pass runs its
/// emission to completion (every chunk's "done" barrier is awaited) before
/// its k-d tree is built.
pub fn generate_maps(scene: &[Shape], master_seed: u64) -> (KdTree<PhotonHit>, KdTree<PhotonHit>) {
    let caustics = emit(scene, Strategy::Caustic, CAUSTIC_FACTOR, master_seed);
    let diffuse = emit(scene, Strategy::Diffuse, DIFFUSE_FACTOR, master_seed.wrapping_add(1));
    (KdTree::build(diffuse), KdTree::build(caustics))
}

fn emit(scene: &[Shape], strategy: Strategy, factor: usize, seed: u64) -> Vec<PhotonHit> {
    let mut hits = Vec::new();

    for (emitter_index, shape) in scene.iter().enumerate() {
        if !shape.is_emitter() {
            continue;
        }
        hits.extend(emit_from_shape(scene, emitter_index, strategy, factor, seed));
    }

    hits
}

fn emit_from_shape(
    scene: &[Shape],
    emitter_index: usize,
    strategy: Strategy,
    factor: usize,
    seed: u64,
) -> Vec<PhotonHit> {
    let photons = factor * factor * 2;
    let chunk_size = photons / CHUNKS;
    let (sender, receiver) = sync_channel::<PhotonHit>(CHANNEL_CAPACITY);

    thread::scope(|scope| {
        for chunk in 0..CHUNKS {
            let sender = sender.clone();
            let scene = &scene;
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed ^ ((emitter_index as u64) << 32) ^ chunk as u64);
                trace_chunk(scene, emitter_index, strategy, factor, chunk, chunk_size, &sender, &mut rng);
            });
        }
        drop(sender);

        receiver.iter().collect()
    })
}

fn trace_chunk(
    scene: &[Shape],
    emitter_index: usize,
    strategy: Strategy,
    factor: usize,
    chunk: usize,
    chunk_size: usize,
    sender: &SyncSender<PhotonHit>,
    rng: &mut StdRng,
) {
    let shape = &scene[emitter_index];

    for i in 0..chunk_size {
        let global_index = chunk * chunk_size + i;
        let longitude = global_index / factor;
        let latitude = global_index % factor;

        let sign = if longitude % 2 == 0 { 1.0 } else { -1.0 };
        let phi = 2.0 * std::f64::consts::PI * longitude as f64 / factor as f64;
        let theta = std::f64::consts::PI * latitude as f64 / factor as f64;

        let direction = Vec3::new(theta.sin() * phi.cos(), sign * theta.cos(), theta.sin() * phi.sin()).normalise();
        let ray = Ray::new(shape.position(), direction);

        trace_photon(scene, emitter_index, strategy, ray, shape.emission(), 1.0, 0, rng, sender);
    }
}

fn trace_photon(
    scene: &[Shape],
    emitter_index: usize,
    strategy: Strategy,
    ray: Ray,
    colour: Vec3,
    alpha: f64,
    depth: u8,
    rng: &mut StdRng,
    sender: &SyncSender<PhotonHit>,
) {
    if rng.gen::<f64>() > alpha {
        return;
    }

    let (hit_index, distance) = closest_intersection(scene, &ray);
    let Some(hit_index) = hit_index else { return };

    let impact = ray.at(distance);

    let leaving_emitter = hit_index == emitter_index
        && match strategy {
            Strategy::Caustic => true,
            Strategy::Diffuse => depth == 0,
        };
    if leaving_emitter {
        let retrace = Ray::new(impact, ray.direction);
        trace_photon(scene, emitter_index, strategy, retrace, colour, alpha, depth, rng, sender);
        return;
    }

    let shape = &scene[hit_index];
    let normal = shape.normal_dir(impact).normalise();
    let reverse = -ray.direction;
    let outgoing = if normal.dot(&reverse) < 0.0 { -normal } else { normal };

    match strategy {
        Strategy::Caustic => caustic_event(scene, emitter_index, ray, shape, impact, normal, outgoing, colour, alpha, depth, distance, rng, sender),
        Strategy::Diffuse => diffuse_event(scene, emitter_index, ray, shape, impact, normal, outgoing, colour, alpha, depth, rng, sender),
    }
}

#[allow(clippy::too_many_arguments)]
fn caustic_event(
    scene: &[Shape],
    emitter_index: usize,
    ray: Ray,
    shape: &Shape,
    impact: Vec3,
    normal: Vec3,
    outgoing: Vec3,
    colour: Vec3,
    alpha: f64,
    depth: u8,
    distance: f64,
    rng: &mut StdRng,
    sender: &SyncSender<PhotonHit>,
) {
    if depth > 0 {
        let energy = colour * (1.0 / (alpha + distance));
        let _ = sender.send(PhotonHit { location: impact, photon: energy, incoming: ray.direction, depth });
    }

    if shape.material() != Material::Refractive {
        return;
    }

    let entering = normal.dot(&outgoing) >= 0.0;
    match optics::refract(ray.direction, outgoing, entering) {
        Refraction::TotalInternalReflection => {
            let reflected = reflect(ray.direction, outgoing);
            let next = Ray::new(impact, reflected);
            trace_photon(scene, emitter_index, Strategy::Caustic, next, colour, alpha * 0.9, depth + 1, rng, sender);
        }
        Refraction::Degenerate => {}
        Refraction::Transmitted { direction, transmittance, .. } => {
            let next = Ray::new(impact, direction);
            trace_photon(scene, emitter_index, Strategy::Caustic, next, colour * transmittance, alpha * 0.9, depth + 1, rng, sender);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn diffuse_event(
    scene: &[Shape],
    emitter_index: usize,
    ray: Ray,
    shape: &Shape,
    impact: Vec3,
    normal: Vec3,
    outgoing: Vec3,
    colour: Vec3,
    alpha: f64,
    depth: u8,
    rng: &mut StdRng,
    sender: &SyncSender<PhotonHit>,
) {
    let distance = impact.distance(&ray.origin);
    let energy = colour * (alpha / (1.0 + distance));
    let _ = sender.send(PhotonHit { location: impact, photon: energy, incoming: ray.direction, depth });

    if shape.material() == Material::Diffuse {
        let u = normal.cross(&(-ray.direction)).normalise();
        let v = u.cross(&normal).normalise();
        let jitter_u = standard_normal(rng);
        let jitter_v = standard_normal(rng);
        let bounce = (u * (jitter_u * 0.5) + outgoing + v * (jitter_v * 0.5)).normalise();
        let bounce_ray = Ray::new(impact, bounce);
        let bleed = colour.mul_vec(&shape.colour()) * alpha;
        trace_photon(scene, emitter_index, Strategy::Diffuse, bounce_ray, bleed, alpha * 0.66, depth + 1, rng, sender);
    }

    let shadow_ray = Ray::new(impact, ray.direction);
    trace_photon(scene, emitter_index, Strategy::Diffuse, shadow_ray, Vec3::ZERO, alpha * 0.9, depth + 1, rng, sender);
}

fn reflect(direction: Vec3, outgoing: Vec3) -> Vec3 {
    (direction - outgoing * (2.0 * outgoing.dot(&direction))).normalise()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;

    fn single_emitter_scene() -> Vec<Shape> {
        vec![
            Shape::sphere(Vec3::new(0.0, 5.0, -10.0), 1.0, Material::Diffuse, Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0)),
            Shape::plane(Vec3::new(0.0, -2.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Material::Diffuse, Vec3::new(0.8, 0.8, 0.8), Vec3::ZERO),
        ]
    }

    #[test]
    fn caustic_pass_on_scene_without_refractives_records_nothing() {
        let scene = single_emitter_scene();
        let hits = emit(&scene, Strategy::Caustic, 8, 1);
        assert!(hits.is_empty(), "no refractive surfaces means no caustic photons are ever recorded");
    }

    #[test]
    fn diffuse_pass_records_photons_on_the_floor() {
        let scene = single_emitter_scene();
        let hits = emit(&scene, Strategy::Diffuse, 8, 1);
        assert!(!hits.is_empty());
        assert!(hits.iter().any(|h| h.location.y < 0.0), "some photons should land on the floor plane");
    }

    #[test]
    fn scene_with_no_emitters_produces_no_photons() {
        let scene = vec![Shape::sphere(Vec3::ZERO, 1.0, Material::Diffuse, Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO)];
        assert!(emit(&scene, Strategy::Diffuse, 8, 1).is_empty());
        assert!(emit(&scene, Strategy::Caustic, 8, 1).is_empty());
    }
}
