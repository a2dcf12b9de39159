use std::io::{Cursor, Write};

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{CorrectionMap, Image};
use crate::image_pipeline::tiff::types::{TiffCompression, TiffConfig};
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

fn compression_for(compression: TiffCompression) -> Compression {
    match compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

fn encoder_for<'a>(buffer: &'a mut Vec<u8>, config: &TiffConfig) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
    let encoder = TiffEncoder::new(Cursor::new(buffer))
        .map_err(|e| FlatFieldError::EncodeError(e.to_string()))?
        .with_compression(compression_for(config.compression));
    Ok(encoder)
}

impl TiffWriter for StandardTiffWriter {
    fn write_correction_map(&self, map: &CorrectionMap, output: &mut dyn Write, config: &TiffConfig) -> Result<()> {
        debug!("Encoding 16-bit TIFF image: {}x{}", map.width, map.height);

        let mut buffer = Vec::new();
        let mut encoder = encoder_for(&mut buffer, config)?;

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        encoder.write_image::<tiff::encoder::colortype::Gray16>(
            map.width as u32,
            map.height as u32,
            &map.data,
        ).map_err(|e| FlatFieldError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }

    fn write_float_image(&self, image: &Image, output: &mut dyn Write, config: &TiffConfig) -> Result<()> {
        debug!("Encoding float TIFF image: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();
        // Horizontal differencing is defined for integer samples only.
        let mut encoder = encoder_for(&mut buffer, config)?;

        encoder.write_image::<tiff::encoder::colortype::Gray32Float>(
            image.width as u32,
            image.height as u32,
            &image.data,
        ).map_err(|e| FlatFieldError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}
