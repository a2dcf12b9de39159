//! TIFF encoding configuration types

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// Encoding options for 16-bit rasters
#[derive(Debug, Clone, PartialEq)]
pub struct TiffConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    pub predictor: Option<u16>,
}

impl Default for TiffConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
        }
    }
}

/// How integer samples are scaled when decoded to floating point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleScaling {
    /// Keep stored values as-is
    Raw,
    /// Divide integer samples by their type maximum (masks)
    UnitRange,
}
