use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use tracing::warn;

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{Image, Mask};

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

fn as_u32(width: usize, height: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(FlatFieldError::InvalidDimensions(width, height)),
    }
}

/// Brings a model output onto the reference grid with a Lanczos3 resize.
/// Output that already matches is returned unchanged.
pub fn conform_to(reference: &Image, candidate: Image) -> Result<Image> {
    if reference.dimensions() == candidate.dimensions() {
        return Ok(candidate);
    }
    warn!(
        from_width = candidate.width,
        from_height = candidate.height,
        to_width = reference.width,
        to_height = reference.height,
        "Model output size differs from the input, resampling"
    );

    let (src_w, src_h) = as_u32(candidate.width, candidate.height)?;
    let (dst_w, dst_h) = as_u32(reference.width, reference.height)?;
    let buffer = GrayF32::from_raw(src_w, src_h, candidate.data)
        .ok_or(FlatFieldError::InvalidDimensions(candidate.width, candidate.height))?;

    let resized = imageops::resize(&buffer, dst_w, dst_h, FilterType::Lanczos3);
    Image::new(reference.width, reference.height, resized.into_raw())
}

/// [`conform_to`] for masks; Lanczos ringing is clamped back into [0,1].
pub fn conform_mask_to(reference: &Image, candidate: Mask) -> Result<Mask> {
    let resampled = candidate.dimensions() != reference.dimensions();
    let mut mask = conform_to(reference, candidate)?;
    if resampled {
        for v in &mut mask.data {
            *v = v.clamp(0.0, 1.0);
        }
    }
    Ok(mask)
}
