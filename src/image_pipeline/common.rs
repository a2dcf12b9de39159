//! Common utilities module
//!
//! This module contains the error type and image grids shared across the pipeline.

pub mod error;
pub mod types;

pub use error::{FlatFieldError, Result};
pub use types::{CorrectionMap, Image, Mask};
