use super::Vec3;

/// A ray consisting of an origin and a direction.
///
/// Direction is expected to be unit-length at call sites that care about
/// distance semantics; the radiance estimator normalises incoming primary
/// directions itself before use.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + t * self.direction
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
    }
}
