use std::io;

use thiserror::Error;

/// Top-level failure modes of a render. Numerical Fresnel degeneracy and
/// unknown-material conditions are not represented here: the former is
/// handled inline by the radiance estimator (diagnostic + black return,
/// render continues), and the latter cannot occur at runtime since
/// [`crate::geometry::Material`] is matched exhaustively.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PNG encode error: {0}")]
    Encode(#[from] image::ImageError),
}
