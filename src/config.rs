use clap::Parser;

use crate::error::RenderError;

/// Command-line configuration for a single render. Mirrors the original
/// tool's flag set; `-caustics`, `-cpuprofile`, and `-memprofile` have no
/// counterpart here (see the design notes for why).
#[derive(Debug, Clone, Parser)]
#[command(name = "photonforge", about = "Photon-mapped Monte Carlo path tracer")]
pub struct RenderConfig {
    /// Image width in pixels.
    #[arg(long = "w", default_value_t = 800)]
    pub width: usize,

    /// Image height in pixels.
    #[arg(long = "h", default_value_t = 600)]
    pub height: usize,

    /// Field of view, in degrees.
    #[arg(long = "fov", default_value_t = 90.0)]
    pub fov: f64,

    /// Samples per pixel.
    #[arg(long = "rays", default_value_t = 16)]
    pub rays: u32,

    /// Russian-roulette minimum depth before termination can occur.
    #[arg(long = "depth", default_value_t = 2)]
    pub depth: u32,

    /// Bloom filter iterations.
    #[arg(long = "bloom", default_value_t = 10)]
    pub bloom: u32,

    /// Gamma correction factor.
    #[arg(long = "gamma", default_value_t = 2.2)]
    pub gamma: f64,

    /// Worker-thread cap; only used to derive the default chunk count and
    /// to size the rayon pool behind the k-d tree build.
    #[arg(long = "cores", default_value_t = 2)]
    pub cores: usize,

    /// Row-band count for the tile scheduler.
    #[arg(long = "chunks", default_value_t = 8)]
    pub chunks: usize,

    /// Master PRNG seed.
    #[arg(long = "seed", default_value_t = 1)]
    pub seed: u64,

    /// Output PNG path.
    #[arg(long = "out", default_value = "out.png")]
    pub out: String,

    /// Hard-coded scene selector.
    #[arg(long = "in", default_value = "default")]
    pub scene: String,
}

impl RenderConfig {
    /// Applies the `chunks` auto-raise rule (`2 * cores` when `cores >
    /// chunks`) and validates that rows divide evenly by the resulting
    /// chunk count.
    pub fn validated(mut self) -> Result<Self, RenderError> {
        if self.cores > self.chunks {
            self.chunks = 2 * self.cores;
        }

        if self.chunks == 0 {
            return Err(RenderError::Config("chunks must be greater than zero".into()));
        }

        if self.height % self.chunks != 0 {
            return Err(RenderError::Config(format!(
                "image height {} does not divide evenly by {} chunks",
                self.height, self.chunks
            )));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RenderConfig {
        RenderConfig {
            width: 800,
            height: 600,
            fov: 90.0,
            rays: 16,
            depth: 2,
            bloom: 10,
            gamma: 2.2,
            cores: 2,
            chunks: 8,
            seed: 1,
            out: "out.png".into(),
            scene: "default".into(),
        }
    }

    #[test]
    fn chunks_is_raised_when_cores_exceeds_it() {
        let mut config = base_config();
        config.cores = 20;
        config.chunks = 8;
        config.height = 40;
        let validated = config.validated().unwrap();
        assert_eq!(validated.chunks, 40);
    }

    #[test]
    fn non_dividing_chunk_count_is_rejected() {
        let mut config = base_config();
        config.height = 601;
        assert!(config.validated().is_err());
    }

    #[test]
    fn dividing_chunk_count_is_accepted() {
        let config = base_config();
        assert!(config.validated().is_ok());
    }
}
