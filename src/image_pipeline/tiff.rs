//! TIFF module
//!
//! Writes the 16-bit correction map and float checkpoint rasters, and reads
//! them back.

mod reader;
mod standard_tiff_writer;
pub mod types;
mod writer;


pub use reader::{read_correction_map, read_image};
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{SampleScaling, TiffCompression, TiffConfig};
pub use writer::TiffWriter;
