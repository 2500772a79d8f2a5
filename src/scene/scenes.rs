//! Hard-coded scene construction.
//!
//! Out of scope for the core per the spec: this module is an external
//! collaborator that hands the core a fully-populated [`Scene`]. Its only
//! contract with the rest of the crate is the `Vec<Shape>` it returns.

use crate::geometry::{Material, Shape};
use crate::primitives::Vec3;

/// Builds the scene selected by `-in`. Unknown selectors fall back to
/// `"default"`, matching the CLI's tolerant-default behaviour for scene
/// selection elsewhere in this crate (see `config::RenderConfig`).
pub fn build(name: &str) -> Vec<Shape> {
    match name {
        "cornell" => cornell_box(),
        _ => default_scene(),
    }
}

/// The classic two-sphere, four-wall, one-light arrangement.
fn default_scene() -> Vec<Shape> {
    vec![
        Shape::sphere(
            Vec3::new(2.5, 0.5, -8.0),
            2.5,
            Material::Diffuse,
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::ZERO,
        ),
        Shape::sphere(
            Vec3::new(-5.0, 3.0, -15.0),
            5.0,
            Material::Specular,
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(0.0, -2.0, -10.0),
            Vec3::new(0.0, 10.0, 1.0),
            Material::Diffuse,
            Vec3::new(0.0, 0.0, 0.9),
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(-10.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Material::Diffuse,
            Vec3::new(0.0, 0.9, 0.0),
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Material::Diffuse,
            Vec3::new(0.4, 0.0, 0.4),
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(0.0, 0.0, -16.0),
            Vec3::new(0.0, 0.0, 1.0),
            Material::Diffuse,
            Vec3::new(0.4, 0.4, 0.4),
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(0.0, 11.0, -10.0),
            Vec3::new(0.0, -1.0, 0.0),
            Material::Diffuse,
            Vec3::new(0.0, 0.6, 0.6),
            Vec3::ZERO,
        ),
        Shape::sphere(
            Vec3::new(0.0, 9.0, -11.0),
            1.0,
            Material::Diffuse,
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, 2.0, 2.0),
        ),
        Shape::sphere(
            Vec3::new(8.2, 0.6, -15.0),
            1.0,
            Material::Refractive,
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::ZERO,
        ),
    ]
}

/// A Cornell-box-style enclosure: coloured side walls, a glass sphere, and
/// a small ceiling light.
fn cornell_box() -> Vec<Shape> {
    let white = Vec3::new(0.75, 0.75, 0.75);
    let red = Vec3::new(0.75, 0.15, 0.15);
    let blue = Vec3::new(0.15, 0.15, 0.75);

    vec![
        Shape::plane(
            Vec3::new(0.0, -2.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Material::Diffuse,
            white,
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(0.0, 8.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Material::Diffuse,
            white,
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(0.0, 0.0, -16.0),
            Vec3::new(0.0, 0.0, 1.0),
            Material::Diffuse,
            white,
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(-6.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Material::Diffuse,
            red,
            Vec3::ZERO,
        ),
        Shape::plane(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Material::Diffuse,
            blue,
            Vec3::ZERO,
        ),
        Shape::sphere(
            Vec3::new(-2.5, -0.5, -11.0),
            1.5,
            Material::Refractive,
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::ZERO,
        ),
        Shape::sphere(
            Vec3::new(2.5, -0.8, -9.0),
            1.2,
            Material::Specular,
            Vec3::new(0.9, 0.9, 0.9),
            Vec3::ZERO,
        ),
        Shape::sphere(
            Vec3::new(0.0, 7.0, -10.0),
            0.8,
            Material::Diffuse,
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(3.0, 3.0, 3.0),
        ),
    ]
}
