//! Post-processing: bloom filtering of the "peaks" buffer and gamma-corrected
//! composition into the final 8-bit image.

use image::{ImageBuffer as PngBuffer, Rgba};

use crate::primitives::Vec3;
use crate::render::ImageBuffer;

const BLOOM_KERNEL_RADIUS: isize = 2;
const BLOOM_FACTOR: f64 = 1.0 / 25.0;
const BORDER: usize = 2;

/// Applies `iterations` passes of a 5x5 box filter to `buffer.peaks`,
/// double-buffered so a pass never reads pixels it has already written this
/// iteration. The 2-pixel border is left untouched each pass.
pub fn bloom(buffer: &ImageBuffer, iterations: u32) -> Vec<Vec3> {
    let mut front = buffer.peaks.clone();
    let mut back = front.clone();

    for _ in 0..iterations {
        for y in BORDER..buffer.rows.saturating_sub(BORDER) {
            for x in BORDER..buffer.cols.saturating_sub(BORDER) {
                let mut sum = Vec3::ZERO;
                for dy in -BLOOM_KERNEL_RADIUS..=BLOOM_KERNEL_RADIUS {
                    for dx in -BLOOM_KERNEL_RADIUS..=BLOOM_KERNEL_RADIUS {
                        let sx = (x as isize + dx) as usize;
                        let sy = (y as isize + dy) as usize;
                        sum += front[sy * buffer.cols + sx];
                    }
                }
                back[y * buffer.cols + x] = sum * BLOOM_FACTOR;
            }
        }
        std::mem::swap(&mut front, &mut back);
    }

    front
}

/// `255 * x^(1/gamma) + 0.5`, rounded down by the final `u8` cast.
fn gamma_correct(channel: f64, gamma: f64) -> u8 {
    let corrected = 255.0 * channel.powf(1.0 / gamma) + 0.5;
    corrected.clamp(0.0, 255.0) as u8
}

/// Composes `buffer.data + bloomed_peaks`, gamma-corrects, clamps, and packs
/// into an NRGBA PNG-ready buffer.
pub fn compose(buffer: &ImageBuffer, bloomed: &[Vec3], gamma: f64) -> PngBuffer<Rgba<u8>, Vec<u8>> {
    let mut image = PngBuffer::new(buffer.cols as u32, buffer.rows as u32);

    for y in 0..buffer.rows {
        for x in 0..buffer.cols {
            let index = y * buffer.cols + x;
            let combined = (buffer.data[index] + bloomed[index]).clamp01();

            image.put_pixel(
                x as u32,
                y as u32,
                Rgba([
                    gamma_correct(combined.x, gamma),
                    gamma_correct(combined.y, gamma),
                    gamma_correct(combined.z, gamma),
                    255,
                ]),
            );
        }
    }

    image
}
