//! Per-pixel temporal median.
//!
//! All frames are held in one contiguous sample buffer; the median is then
//! computed in parallel over row chunks, each pixel independently.

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::Image;
use crate::image_pipeline::ser::Frame;

const ROWS_PER_CHUNK: usize = 8;

/// Median of `values`; mean of the two middle order statistics for even counts.
/// Reorders `values`.
pub fn median_u16(values: &mut [u16]) -> f32 {
    debug_assert!(!values.is_empty());
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid] as f32
    } else {
        (values[mid - 1] as f32 + values[mid] as f32) / 2.0
    }
}

/// Stacks every frame of `frames` into a median image.
///
/// `expected_frames` sizes the stack up front; allocation failure surfaces as
/// `ResourceError` so the caller can retry with fewer frames.
#[instrument(skip(frames))]
pub fn median_stack<I>(frames: I, expected_frames: usize) -> Result<Image>
where
    I: IntoIterator<Item = Result<Frame>>,
{
    let mut frames = frames.into_iter();
    let first = frames
        .next()
        .ok_or_else(|| FlatFieldError::FormatError("no frames to stack".to_string()))??;
    let (width, height) = (first.width, first.height);
    let pixels = width * height;

    let capacity = pixels
        .checked_mul(expected_frames.max(1))
        .ok_or_else(|| FlatFieldError::ResourceError("frame stack size overflows".to_string()))?;
    let mut stack: Vec<u16> = Vec::new();
    stack.try_reserve_exact(capacity).map_err(|e| {
        FlatFieldError::ResourceError(format!(
            "cannot hold {expected_frames} frames of {width}x{height}: {e}"
        ))
    })?;
    stack.extend_from_slice(&first.data);
    drop(first);

    let mut count = 1;
    for frame in frames {
        let frame = frame?;
        if (frame.width, frame.height) != (width, height) {
            return Err(FlatFieldError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: frame.width,
                height: frame.height,
            });
        }
        stack.try_reserve(pixels).map_err(|e| {
            FlatFieldError::ResourceError(format!("cannot hold frame {}: {e}", frame.index))
        })?;
        stack.extend_from_slice(&frame.data);
        count += 1;
        if count % 50 == 0 {
            debug!(count, "Loaded frames");
        }
    }

    info!(frames = count, width, height, "Computing temporal median");

    let mut data = vec![0.0f32; pixels];
    data.par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let base = chunk_idx * width * ROWS_PER_CHUNK;
            let mut column = vec![0u16; count];
            for (offset, out) in out_chunk.iter_mut().enumerate() {
                let pixel = base + offset;
                for (f, value) in column.iter_mut().enumerate() {
                    *value = stack[f * pixels + pixel];
                }
                *out = median_u16(&mut column);
            }
        });

    Image::new(width, height, data)
}
