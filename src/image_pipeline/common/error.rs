use thiserror::Error;

use crate::image_pipeline::collaborator::ServiceError;

#[derive(Error, Debug)]
pub enum FlatFieldError {
    #[error("Malformed capture file: {0}")]
    FormatError(String),

    #[error("Insufficient resources: {0}")]
    ResourceError(String),

    #[error("Numeric failure: {0}")]
    NumericError(String),

    #[error("Dust model call failed: {0}")]
    ExternalService(#[from] ServiceError),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode TIFF image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlatFieldError>;
