//! Small sampling helpers shared by the photon emitter and the radiance
//! estimator, both of which need standard-normal jitter for their
//! diffuse-bounce and direct-lighting offsets.

use rand::Rng;
use rand_distr::StandardNormal;

/// One sample from the standard normal distribution.
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    rng.sample(StandardNormal)
}
