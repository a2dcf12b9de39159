use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::types::{CorrectionMap, Image};
use crate::image_pipeline::tiff::types::TiffConfig;

pub trait TiffWriter {
    fn write_correction_map(&self, map: &CorrectionMap, output: &mut dyn Write, config: &TiffConfig) -> Result<()>;
    /// Float checkpoints; `config.predictor` is ignored.
    fn write_float_image(&self, image: &Image, output: &mut dyn Write, config: &TiffConfig) -> Result<()>;
}
