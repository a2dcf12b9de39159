//! Quantile-based histogram matching restricted to trusted pixels.
//!
//! Both images are sampled where the mask is (numerically) zero. The sorted
//! samples give each image's empirical quantile function; the mapping sends a
//! candidate intensity at quantile `q` to the reference intensity at `q`,
//! linearly interpolated between evenly spaced knots.

use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{Image, Mask};

/// Number of quantile knots in the mapping.
pub const QUANTILE_KNOTS: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramConfig {
    /// Mask values below this count as untouched
    pub mask_epsilon: f32,
    /// Fewer trusted samples than this leaves the candidate unchanged
    pub min_samples: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            mask_epsilon: 1e-6,
            min_samples: 64,
        }
    }
}

/// Monotonic piecewise-linear intensity mapping.
#[derive(Debug, Clone)]
pub struct HistogramMapping {
    source: Vec<f32>,
    target: Vec<f32>,
}

/// Value at quantile `q` of an ascending slice, linearly interpolated.
fn quantile(sorted: &[f32], q: f64) -> f32 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = (pos - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl HistogramMapping {
    /// Builds the mapping from ascending candidate and reference samples.
    pub fn from_sorted_samples(candidate: &[f32], reference: &[f32]) -> Result<Self> {
        if candidate.is_empty() || reference.is_empty() {
            return Err(FlatFieldError::NumericError(
                "histogram mapping needs at least one sample".to_string(),
            ));
        }
        let knots = QUANTILE_KNOTS.min(candidate.len().max(reference.len())).max(2);
        let (source, target) = (0..knots)
            .map(|k| {
                let q = k as f64 / (knots - 1) as f64;
                (quantile(candidate, q), quantile(reference, q))
            })
            .unzip();
        Ok(Self { source, target })
    }

    /// Maps one intensity; values outside the sampled range take the end knots.
    pub fn map(&self, value: f32) -> f32 {
        let last = self.source.len() - 1;
        if value.is_nan() {
            return value;
        }
        if value <= self.source[0] {
            return self.target[0];
        }
        if value >= self.source[last] {
            return self.target[last];
        }
        let hi = self.source.partition_point(|&s| s <= value);
        let lo = hi - 1;
        let span = self.source[hi] - self.source[lo];
        if span <= 0.0 {
            return self.target[lo];
        }
        let t = (value - self.source[lo]) / span;
        self.target[lo] + (self.target[hi] - self.target[lo]) * t
    }

    pub fn apply(&self, image: &Image) -> Image {
        Image {
            width: image.width,
            height: image.height,
            data: image.data.par_iter().map(|&v| self.map(v)).collect(),
        }
    }
}

fn trusted_samples(image: &Image, mask: &Mask, epsilon: f32) -> Vec<f32> {
    let mut samples: Vec<f32> = image
        .data
        .iter()
        .zip(&mask.data)
        .filter(|&(v, m)| *m < epsilon && v.is_finite())
        .map(|(&v, _)| v)
        .collect();
    samples.par_sort_unstable_by(f32::total_cmp);
    samples
}

/// Matches `candidate`'s intensity distribution to `reference` using only
/// pixels where `mask` is below `config.mask_epsilon`, then applies the
/// mapping to every pixel of `candidate`.
///
/// Returns the candidate unchanged when too few trusted pixels exist.
#[instrument(skip_all, fields(width = candidate.width, height = candidate.height))]
pub fn match_histogram(
    reference: &Image,
    candidate: &Image,
    mask: &Mask,
    config: &HistogramConfig,
) -> Result<Image> {
    reference.ensure_same_dimensions(candidate)?;
    reference.ensure_same_dimensions(mask)?;

    let candidate_samples = trusted_samples(candidate, mask, config.mask_epsilon);
    let reference_samples = trusted_samples(reference, mask, config.mask_epsilon);
    let usable = candidate_samples.len().min(reference_samples.len());

    if usable < config.min_samples.max(1) {
        warn!(
            usable,
            required = config.min_samples,
            "Too few unmasked pixels, skipping histogram matching"
        );
        return Ok(candidate.clone());
    }

    info!(samples = usable, "Performing histogram matching");
    let mapping = HistogramMapping::from_sorted_samples(&candidate_samples, &reference_samples)?;
    let matched = mapping.apply(candidate);

    if matched.data.iter().any(|v| v.is_infinite()) {
        return Err(FlatFieldError::NumericError(
            "histogram mapping produced infinite values".to_string(),
        ));
    }
    Ok(matched)
}
