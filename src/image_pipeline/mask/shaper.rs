use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{Image, Mask};
use crate::image_pipeline::mask::dilation::dilate_disk;
use crate::image_pipeline::mask::gaussian::gaussian_blur;

/// Raw mask values above this count as covered before dilation.
pub const BINARIZE_THRESHOLD: f32 = 0.5;

/// Parameters of the dilate-then-feather mask shaping
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeConfig {
    /// Radius of the disk structuring element, in pixels
    pub dilation_radius: usize,
    /// Sigma of the feathering blur, in pixels
    pub blur_sigma: f32,
}

impl ShapeConfig {
    /// Rejects a blur sigma that is negative or not finite. Zero disables
    /// feathering.
    pub fn validate(&self) -> Result<()> {
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(FlatFieldError::NumericError(format!(
                "blur sigma must be finite and non-negative, got {}",
                self.blur_sigma
            )));
        }
        Ok(())
    }
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            dilation_radius: 10,
            blur_sigma: 3.0,
        }
    }
}

/// Grows and feathers a raw detection mask.
///
/// The result never covers less than the raw mask (`max(shaped, raw)`), and
/// every value is clamped into [0,1].
#[instrument(skip(raw), fields(width = raw.width, height = raw.height))]
pub fn shape_mask(raw: &Mask, config: &ShapeConfig) -> Result<Mask> {
    config.validate()?;
    let (width, height) = raw.dimensions();

    let sanitized: Vec<f32> = raw
        .data
        .iter()
        .map(|&v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
        .collect();

    let binary: Vec<bool> = sanitized.iter().map(|&v| v > BINARIZE_THRESHOLD).collect();
    let dilated = dilate_disk(&binary, width, height, config.dilation_radius);

    let as_float: Vec<f32> = dilated.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
    let blurred = gaussian_blur(&as_float, width, height, config.blur_sigma)?;

    let data: Vec<f32> = blurred
        .iter()
        .zip(&sanitized)
        .map(|(&b, &r)| b.max(r).clamp(0.0, 1.0))
        .collect();

    let covered = data.iter().filter(|&&v| v > 0.0).count();
    debug!(
        covered,
        total = data.len(),
        radius = config.dilation_radius,
        sigma = config.blur_sigma,
        "Shaped mask"
    );

    Image::new(width, height, data)
}
