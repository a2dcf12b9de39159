use std::ops::Add;

use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::types::{CorrectionMap, Image, Mask};

/// Stored value of correction factor 1.0.
pub const UNITY: u16 = u16::MAX;

/// Inpainted intensities below this make the ratio fall back to 1.0.
pub const RATIO_EPSILON: f32 = 1e-6;

/// Counters gathered while synthesizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    /// Pixels with mask exactly 0, stored as unity
    pub untouched: usize,
    /// Pixels whose ratio fell back to 1.0
    pub ratio_fallbacks: usize,
    /// Pixels whose factor exceeded 1.0 and was clipped
    pub clipped_high: usize,
    /// Pixels whose factor was below 0.0 and was clipped
    pub clipped_low: usize,
}

impl Add for SynthesisStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            untouched: self.untouched + other.untouched,
            ratio_fallbacks: self.ratio_fallbacks + other.ratio_fallbacks,
            clipped_high: self.clipped_high + other.clipped_high,
            clipped_low: self.clipped_low + other.clipped_low,
        }
    }
}

/// `M / I`, or 1.0 where `I` is near zero or the quotient is unusable.
#[inline]
fn safe_ratio(median: f32, inpainted: f32) -> Option<f32> {
    if inpainted.is_nan() || inpainted < RATIO_EPSILON {
        return None;
    }
    let ratio = median / inpainted;
    ratio.is_finite().then_some(ratio)
}

/// Quantizes one pixel; returns the stored value and which fallbacks fired.
#[inline]
pub fn synthesize_pixel(median: f32, inpainted: f32, mask: f32) -> (u16, SynthesisStats) {
    let mut stats = SynthesisStats::default();
    if mask == 0.0 {
        stats.untouched = 1;
        return (UNITY, stats);
    }

    let ratio = safe_ratio(median, inpainted).unwrap_or_else(|| {
        stats.ratio_fallbacks = 1;
        1.0
    });
    let factor = (1.0 - mask) + mask * ratio;
    let factor = if factor.is_finite() { factor } else { 1.0 };

    if factor > 1.0 {
        stats.clipped_high = 1;
    } else if factor < 0.0 {
        stats.clipped_low = 1;
    }
    let scaled = (factor.clamp(0.0, 1.0) as f64 * UNITY as f64).round();
    (scaled.clamp(0.0, UNITY as f64) as u16, stats)
}

/// Blends the median/inpainted ratio into a unity field under the mask:
/// `(1 - m) * 1.0 + m * (M / I)`, quantized so that 65535 means 1.0.
///
/// Pixels with `m == 0` are stored as exactly 65535.
#[instrument(skip_all, fields(width = median.width, height = median.height))]
pub fn synthesize(
    median: &Image,
    inpainted: &Image,
    mask: &Mask,
) -> Result<(CorrectionMap, SynthesisStats)> {
    median.ensure_same_dimensions(inpainted)?;
    median.ensure_same_dimensions(mask)?;

    let mut data = vec![UNITY; median.data.len()];
    let stats = data
        .par_iter_mut()
        .zip(&median.data)
        .zip(&inpainted.data)
        .zip(&mask.data)
        .map(|(((out, &m_val), &i_val), &mask_val)| {
            let (value, stats) = synthesize_pixel(m_val, i_val, mask_val);
            *out = value;
            stats
        })
        .reduce(SynthesisStats::default, Add::add);

    let total = data.len();
    if stats.clipped_high > 0 {
        warn!(
            pixels = stats.clipped_high,
            percent = 100.0 * stats.clipped_high as f64 / total as f64,
            "Correction factors above 1.0 clipped to 1.0"
        );
    }
    if stats.ratio_fallbacks > 0 {
        warn!(pixels = stats.ratio_fallbacks, "Near-zero inpainted pixels fell back to ratio 1.0");
    }
    info!(untouched = stats.untouched, total, "Synthesized flat field");

    Ok((
        CorrectionMap {
            width: median.width,
            height: median.height,
            data,
        },
        stats,
    ))
}
