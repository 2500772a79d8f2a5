//! Refractive transport shared by the photon emission pass and the eye-pass
//! radiance estimator: Fresnel reflectance via the Schlick-style approximation
//! and the corresponding transmission direction.

use crate::primitives::Vec3;

/// Index of refraction of the glass material used by every [`crate::geometry::Material::Refractive`] shape.
pub const GLASS: f64 = 1.5;
/// Index of refraction of the surrounding medium.
pub const AIR: f64 = 1.0;

/// Result of a refraction query at a dielectric interface.
pub enum Refraction {
    /// Total internal reflection: no transmitted ray exists.
    TotalInternalReflection,
    /// The Fresnel coefficients came out NaN; the caller must abort the
    /// branch and return black. Already logged by [`refract`] itself.
    Degenerate,
    /// A transmitted ray exists; carries its direction and the Fresnel
    /// reflectance/transmittance pair `(r, t)` with `r + t == 1`.
    Transmitted { direction: Vec3, reflectance: f64, transmittance: f64 },
}

/// `normal` is the ray-facing (possibly flipped) surface normal. `entering`
/// is true when the ray is travelling from air into glass, matching the
/// leaving/entering branch in the estimator.
pub fn refract(direction: Vec3, normal: Vec3, entering: bool) -> Refraction {
    let (n1, n2) = if entering { (AIR, GLASS) } else { (GLASS, AIR) };
    let f = n1 / n2;

    let cos_theta_i = normal.dot(&direction).abs();
    let sin_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0).sqrt();
    let k = (1.0 - f * f * sin_theta_i * sin_theta_i).max(0.0);

    if n1 > n2 && sin_theta_i.asin() > (n2 / n1).asin() {
        return Refraction::TotalInternalReflection;
    }

    let reflectance = ((n1 - n2) / (n1 + n2)).powi(2);
    let transmittance = 1.0 - reflectance;

    if reflectance.is_nan() || transmittance.is_nan() {
        log::warn!("NaN Fresnel coefficient at the dielectric interface; returning black");
        return Refraction::Degenerate;
    }

    let cos_theta_t = k.sqrt();
    let normal_dot_direction = normal.dot(&direction);
    let transmitted = direction * f + normal * (f * normal_dot_direction - cos_theta_t);

    Refraction::Transmitted {
        direction: transmitted.normalise(),
        reflectance,
        transmittance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_incidence_matches_known_reflectance() {
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        match refract(direction, normal, true) {
            Refraction::Transmitted { reflectance, transmittance, .. } => {
                assert_relative_eq!(reflectance, 0.04, epsilon = 1e-9);
                assert_relative_eq!(transmittance, 0.96, epsilon = 1e-9);
            }
            Refraction::TotalInternalReflection => panic!("normal incidence must transmit"),
            Refraction::Degenerate => panic!("normal incidence must not be degenerate"),
        }
    }

    #[test]
    fn grazing_angle_from_glass_triggers_tir() {
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let direction = Vec3::new(0.999, -0.01, 0.0).normalise();
        match refract(direction, normal, false) {
            Refraction::TotalInternalReflection => {}
            Refraction::Transmitted { .. } => panic!("grazing exit from glass should TIR"),
            Refraction::Degenerate => panic!("grazing exit should not be degenerate"),
        }
    }
}
