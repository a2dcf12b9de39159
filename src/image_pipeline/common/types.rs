//! Floating-point image grids shared by every stage

use crate::image_pipeline::common::error::{FlatFieldError, Result};

/// Single-channel floating-point raster, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Pixel values, `width * height` long
    pub data: Vec<f32>,
}

/// Values in [0,1]; 0 means "leave untouched", 1 means "fully replaced".
pub type Mask = Image;

impl Image {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FlatFieldError::InvalidDimensions(width, height));
        }
        if data.len() != width * height {
            return Err(FlatFieldError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: data.len() / height,
                height,
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Fails with `DimensionMismatch` unless `other` has the same shape.
    pub fn ensure_same_dimensions(&self, other: &Image) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(FlatFieldError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: other.width,
                height: other.height,
            });
        }
        Ok(())
    }
}

/// Final 16-bit correction map; 65535 encodes factor 1.0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}
