use rayon::prelude::*;

use crate::image_pipeline::common::error::{FlatFieldError, Result};

const ROWS_PER_CHUNK: usize = 8;

/// Normalized 1D Gaussian kernel truncated at 3 sigma, or at `max_radius`
/// taps when that is shorter.
pub fn gaussian_kernel_1d(sigma: f32, max_radius: usize) -> Result<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FlatFieldError::NumericError(format!(
            "blur sigma must be finite and positive, got {sigma}"
        )));
    }

    let reach = (3.0 * sigma as f64).ceil();
    let radius = if reach >= max_radius as f64 { max_radius } else { reach as usize };
    let sigma = sigma as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma_sq).exp() as f32
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    Ok(kernel)
}

/// Mirrors an out-of-range index back into `0..len` (`d c b a | a b c d | d c b a`).
#[inline]
fn reflect(i: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let mut i = i.rem_euclid(period);
    if i >= len {
        i = period - 1 - i;
    }
    i as usize
}

/// Separable Gaussian blur with reflected borders. A zero sigma leaves the
/// input unchanged; the kernel never reaches further than the image extent.
///
/// Zero input pixels farther than the kernel radius from any nonzero pixel
/// stay exactly zero.
pub fn gaussian_blur(input: &[f32], width: usize, height: usize, sigma: f32) -> Result<Vec<f32>> {
    if sigma == 0.0 {
        return Ok(input.to_vec());
    }
    let kernel = gaussian_kernel_1d(sigma, width.max(height))?;
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; input.len()];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let in_row = &input[y * width..(y + 1) * width];
            for (x, out) in out_row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = reflect(x as isize + k as isize - radius, width);
                    acc += w * in_row[sx];
                }
                *out = acc;
            }
        });

    let mut output = vec![0.0f32; input.len()];
    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            for (local_y, out_row) in out_chunk.chunks_mut(width).enumerate() {
                let y = y_start + local_y;
                for (x, out) in out_row.iter_mut().enumerate() {
                    let mut acc = 0.0f32;
                    for (k, &w) in kernel.iter().enumerate() {
                        let sy = reflect(y as isize + k as isize - radius, height);
                        acc += w * horizontal[sy * width + x];
                    }
                    *out = acc;
                }
            }
        });
    Ok(output)
}
