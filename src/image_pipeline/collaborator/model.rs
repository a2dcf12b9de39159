use thiserror::Error;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::types::{Image, Mask};

/// Failures reported by the dust detection/inpainting service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transient service failure: {0}")]
    Transient(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ServiceError {
    /// Only transient failures are worth an automatic retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }
}

/// Nondeterministic dust detection and inpainting capability.
///
/// Two calls with identical input may return different results.
pub trait DustModel {
    /// Returns a mask with values in [0,1], same dimensions as `image`.
    fn detect(&mut self, image: &Image) -> Result<Mask>;

    /// Returns `image` with the masked regions reconstructed. Pixels outside
    /// the mask may drift in intensity.
    fn inpaint(&mut self, image: &Image, mask: &Mask) -> Result<Image>;
}

impl<M: DustModel + ?Sized> DustModel for Box<M> {
    fn detect(&mut self, image: &Image) -> Result<Mask> {
        (**self).detect(image)
    }

    fn inpaint(&mut self, image: &Image, mask: &Mask) -> Result<Image> {
        (**self).inpaint(image, mask)
    }
}
