//! The recursive radiance estimator: the eye-pass path tracer that dispatches
//! on material class and consumes the photon maps built in [`crate::photon`].

use rand::rngs::StdRng;
use rand::Rng;

use crate::geometry::{closest_intersection, Material, Shape};
use crate::kdtree::KdTree;
use crate::optics::{self, Refraction};
use crate::photon::PhotonHit;
use crate::primitives::{Ray, Vec3};
use crate::jitter::standard_normal;

/// Radius of the caustic-tree gather around a diffuse hit point.
const CAUSTIC_GATHER_RADIUS: f64 = 0.1;
/// Radius of the diffuse/global-tree query used for the shadow-photon
/// occlusion estimate in [`emitter_sampling`].
const SHADOW_QUERY_RADIUS: f64 = 0.5;
/// Below this many neighbours, the shadow-photon estimate is considered too
/// noisy and a traced shadow ray is used instead.
const SHADOW_SAMPLE_MIN: usize = 8;

/// Computes the radiance arriving back along `-ray.direction` from whatever
/// `ray` hits in `scene`.
///
/// `diffuse_tree` is the global/diffuse photon map (consulted for direct
/// lighting via a shadow-photon occlusion estimate); `caustic_tree` is
/// gathered at every diffuse hit to approximate caustic irradiance.
pub fn radiance(
    ray: Ray,
    scene: &[Shape],
    diffuse_tree: &KdTree<PhotonHit>,
    caustic_tree: &KdTree<PhotonHit>,
    depth: u32,
    alpha: f64,
    min_depth: u32,
    rng: &mut StdRng,
) -> Vec3 {
    if depth > min_depth && rng.gen::<f64>() > alpha {
        return Vec3::ZERO;
    }

    let (hit_index, distance) = closest_intersection(scene, &ray);
    let Some(hit_index) = hit_index else { return Vec3::ZERO };
    let shape = &scene[hit_index];

    let impact = ray.at(distance);
    let normal = shape.normal_dir(impact).normalise();
    let reverse = -ray.direction;
    let outgoing = if normal.dot(&reverse) < 0.0 { -normal } else { normal };

    match shape.material() {
        Material::Diffuse => diffuse_radiance(ray, shape, scene, diffuse_tree, caustic_tree, impact, normal, outgoing, reverse, depth, alpha, min_depth, rng),
        Material::Specular => specular_radiance(scene, diffuse_tree, caustic_tree, ray, impact, normal, outgoing, reverse, depth, alpha, min_depth, rng),
        Material::Refractive => refractive_radiance(scene, diffuse_tree, caustic_tree, ray, impact, normal, outgoing, reverse, depth, alpha, min_depth, rng),
    }
}

#[allow(clippy::too_many_arguments)]
fn diffuse_radiance(
    ray: Ray,
    shape: &Shape,
    scene: &[Shape],
    diffuse_tree: &KdTree<PhotonHit>,
    caustic_tree: &KdTree<PhotonHit>,
    impact: Vec3,
    normal: Vec3,
    outgoing: Vec3,
    reverse: Vec3,
    depth: u32,
    alpha: f64,
    min_depth: u32,
    rng: &mut StdRng,
) -> Vec3 {
    let caustic = caustic_gather(caustic_tree, impact, outgoing);
    let direct = emitter_sampling(impact, normal, scene, diffuse_tree, rng);

    let u = normal.cross(&reverse).normalise();
    let v = u.cross(&normal).normalise();
    let bounce = (u * (standard_normal(rng) * 0.5) + outgoing + v * (standard_normal(rng) * 0.5)).normalise();
    let indirect = radiance(Ray::new(impact, bounce), scene, diffuse_tree, caustic_tree, depth + 1, alpha * 0.9, min_depth, rng);

    let albedo = shape.colour();
    shape.emission() + (albedo.mul_vec(&(direct + indirect)) + caustic) * outgoing.dot(&reverse)
}

#[allow(clippy::too_many_arguments)]
fn specular_radiance(
    scene: &[Shape],
    diffuse_tree: &KdTree<PhotonHit>,
    caustic_tree: &KdTree<PhotonHit>,
    ray: Ray,
    impact: Vec3,
    normal: Vec3,
    outgoing: Vec3,
    reverse: Vec3,
    depth: u32,
    alpha: f64,
    min_depth: u32,
    rng: &mut StdRng,
) -> Vec3 {
    let bounce = ray.direction - normal * (2.0 * outgoing.dot(&ray.direction));
    let incoming = radiance(Ray::new(impact, bounce.normalise()), scene, diffuse_tree, caustic_tree, depth + 1, alpha * 0.99, min_depth, rng);
    incoming * outgoing.dot(&reverse)
}

#[allow(clippy::too_many_arguments)]
fn refractive_radiance(
    scene: &[Shape],
    diffuse_tree: &KdTree<PhotonHit>,
    caustic_tree: &KdTree<PhotonHit>,
    ray: Ray,
    impact: Vec3,
    normal: Vec3,
    outgoing: Vec3,
    reverse: Vec3,
    depth: u32,
    alpha: f64,
    min_depth: u32,
    rng: &mut StdRng,
) -> Vec3 {
    let entering = normal.dot(&outgoing) >= 0.0;

    match optics::refract(ray.direction, outgoing, entering) {
        Refraction::TotalInternalReflection => {
            let bounce = ray.direction - outgoing * (2.0 * outgoing.dot(&ray.direction));
            let reflected = radiance(Ray::new(impact, bounce.normalise()), scene, diffuse_tree, caustic_tree, depth + 1, alpha * 0.9, min_depth, rng);
            reflected * outgoing.dot(&reverse)
        }
        Refraction::Degenerate => Vec3::ZERO,
        Refraction::Transmitted { direction, reflectance, transmittance } => {
            let reflect_dir = ray.direction - outgoing * (2.0 * outgoing.dot(&ray.direction));
            let reflected = radiance(Ray::new(impact, reflect_dir.normalise()), scene, diffuse_tree, caustic_tree, depth + 1, alpha * 0.9, min_depth, rng);
            let transmitted = radiance(Ray::new(impact, direction), scene, diffuse_tree, caustic_tree, depth + 1, alpha * 0.9, min_depth, rng);

            (reflected * reflectance + transmitted * transmittance) * outgoing.dot(&reverse)
        }
    }
}

/// Approximates caustic irradiance by gathering nearby caustic photons and
/// weighting each by its cosine falloff and inverse distance.
fn caustic_gather(caustic_tree: &KdTree<PhotonHit>, impact: Vec3, outgoing: Vec3) -> Vec3 {
    let neighbors = caustic_tree.neighbors(impact, CAUSTIC_GATHER_RADIUS);
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }

    let mut total = Vec3::ZERO;
    for hit in &neighbors {
        let dist = impact.distance(&hit.location);
        let weight = outgoing.dot(&hit.incoming) * (-1.0 / (std::f64::consts::PI * (1.0 + dist)));
        total += hit.photon * weight;
    }
    total / neighbors.len() as f64
}

/// Direct lighting at a diffuse hit.
///
/// First consults the diffuse/global photon tree: if enough photons lie
/// within [`SHADOW_QUERY_RADIUS`], the ratio of zero-energy shadow photons
/// among them estimates visibility to the emitters without tracing a ray.
/// Below that threshold, falls back to a traced, jittered shadow ray per
/// emitter.
fn emitter_sampling(impact: Vec3, normal: Vec3, scene: &[Shape], diffuse_tree: &KdTree<PhotonHit>, rng: &mut StdRng) -> Vec3 {
    let neighbors = diffuse_tree.neighbors(impact, SHADOW_QUERY_RADIUS);

    if neighbors.len() >= SHADOW_SAMPLE_MIN {
        let shadowed = neighbors.iter().filter(|hit| hit.photon == Vec3::ZERO).count();
        let visibility = 1.0 - (shadowed as f64 / neighbors.len() as f64);

        let mut total = Vec3::ZERO;
        for (_, shape) in scene.iter().enumerate().filter(|(_, s)| s.is_emitter()) {
            let towards_emitter = (-shape.normal_dir(impact)).normalise();
            let distance = impact.distance(&shape.position());
            let cosine = towards_emitter.dot(&normal).max(0.0);
            total += shape.emission() * (cosine * visibility / (1.0 + distance));
        }
        return total;
    }

    let mut total = Vec3::ZERO;
    for (index, shape) in scene.iter().enumerate() {
        if !shape.is_emitter() {
            continue;
        }

        let base = (-shape.normal_dir(impact)).normalise();
        let (u, v) = orthonormal_basis(base);
        let jitter = u * (standard_normal(rng) * 0.3) + v * (standard_normal(rng) * 0.3);
        let direction = (base + jitter).normalise();

        let shadow_ray = Ray::new(impact + normal * 1e-4, direction);
        let (hit_index, distance) = closest_intersection(scene, &shadow_ray);

        if hit_index == Some(index) {
            let cosine = direction.dot(&normal);
            total += shape.emission() * (cosine / (1.0 + distance));
        }
    }
    total
}

fn orthonormal_basis(direction: Vec3) -> (Vec3, Vec3) {
    let reference = if direction.x.abs() < 0.9 { Vec3::new(1.0, 0.0, 0.0) } else { Vec3::new(0.0, 1.0, 0.0) };
    let u = direction.cross(&reference).normalise();
    let v = u.cross(&direction).normalise();
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use rand::SeedableRng;

    fn empty_trees() -> (KdTree<PhotonHit>, KdTree<PhotonHit>) {
        (KdTree::build(Vec::new()), KdTree::build(Vec::new()))
    }

    #[test]
    fn empty_scene_returns_black() {
        let (diffuse, caustic) = empty_trees();
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let result = radiance(ray, &[], &diffuse, &caustic, 0, 1.0, 2, &mut rng);
        assert_eq!(result, Vec3::ZERO);
    }

    #[test]
    fn ray_that_misses_every_shape_returns_black() {
        let (diffuse, caustic) = empty_trees();
        let mut rng = StdRng::seed_from_u64(1);
        let scene = vec![Shape::sphere(Vec3::new(0.0, 0.0, -10.0), 1.0, Material::Diffuse, Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO)];
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let result = radiance(ray, &scene, &diffuse, &caustic, 0, 1.0, 2, &mut rng);
        assert_eq!(result, Vec3::ZERO);
    }

    #[test]
    fn hitting_an_emitter_directly_includes_its_emission() {
        let (diffuse, caustic) = empty_trees();
        let mut rng = StdRng::seed_from_u64(1);
        let scene = vec![Shape::sphere(Vec3::new(0.0, 0.0, -10.0), 1.0, Material::Diffuse, Vec3::new(1.0, 1.0, 1.0), Vec3::new(5.0, 5.0, 5.0))];
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let result = radiance(ray, &scene, &diffuse, &caustic, 0, 1.0, 2, &mut rng);
        assert!(result.x > 0.0 && result.y > 0.0 && result.z > 0.0);
    }

    #[test]
    fn normal_incidence_refraction_matches_known_reflectance() {
        let (diffuse, caustic) = empty_trees();
        let mut rng = StdRng::seed_from_u64(1);
        let scene = vec![
            Shape::sphere(Vec3::new(0.0, 0.0, -10.0), 1.5, Material::Refractive, Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO),
        ];
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let outgoing = Vec3::new(0.0, 0.0, 1.0);
        match optics::refract(ray.direction, outgoing, true) {
            Refraction::Transmitted { reflectance, transmittance, .. } => {
                assert!((reflectance - 0.04).abs() < 1e-9);
                assert!((transmittance - 0.96).abs() < 1e-9);
            }
            Refraction::TotalInternalReflection => panic!("normal incidence must transmit"),
            Refraction::Degenerate => panic!("normal incidence must not be degenerate"),
        }
        let _ = radiance(ray, &scene, &diffuse, &caustic, 0, 1.0, 2, &mut rng);
    }
}
