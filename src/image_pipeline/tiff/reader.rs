use std::io::{Read, Seek};

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{CorrectionMap, Image};
use crate::image_pipeline::tiff::types::SampleScaling;

fn open<R: Read + Seek>(input: R) -> Result<(Decoder<R>, usize, usize)> {
    let mut decoder = Decoder::new(input).map_err(|e| FlatFieldError::DecodeError(e.to_string()))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| FlatFieldError::DecodeError(e.to_string()))?;
    match decoder.colortype().map_err(|e| FlatFieldError::DecodeError(e.to_string()))? {
        ColorType::Gray(_) => {}
        other => {
            return Err(FlatFieldError::DecodeError(format!(
                "expected a single-channel image, got {other:?}"
            )));
        }
    }
    Ok((decoder, width as usize, height as usize))
}

/// Decodes a single-channel TIFF into a float image.
pub fn read_image<R: Read + Seek>(input: R, scaling: SampleScaling) -> Result<Image> {
    let (mut decoder, width, height) = open(input)?;
    let decoded = decoder
        .read_image()
        .map_err(|e| FlatFieldError::DecodeError(e.to_string()))?;

    let unit = scaling == SampleScaling::UnitRange;
    let data: Vec<f32> = match decoded {
        DecodingResult::F32(values) => values,
        DecodingResult::F64(values) => values.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(values) => {
            let scale = if unit { u8::MAX as f32 } else { 1.0 };
            values.into_iter().map(|v| v as f32 / scale).collect()
        }
        DecodingResult::U16(values) => {
            let scale = if unit { u16::MAX as f32 } else { 1.0 };
            values.into_iter().map(|v| v as f32 / scale).collect()
        }
        _ => {
            return Err(FlatFieldError::DecodeError(
                "unsupported TIFF sample format".to_string(),
            ));
        }
    };

    debug!(width, height, "Decoded TIFF image");
    Image::new(width, height, data)
}

/// Decodes a 16-bit correction map.
pub fn read_correction_map<R: Read + Seek>(input: R) -> Result<CorrectionMap> {
    let (mut decoder, width, height) = open(input)?;
    match decoder
        .read_image()
        .map_err(|e| FlatFieldError::DecodeError(e.to_string()))?
    {
        DecodingResult::U16(data) if data.len() == width * height => Ok(CorrectionMap { width, height, data }),
        _ => Err(FlatFieldError::DecodeError(
            "correction map is not a 16-bit raster".to_string(),
        )),
    }
}
