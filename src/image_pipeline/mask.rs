//! Mask shaping module
//!
//! Dilates and feathers the dust mask returned by the detection model.

mod dilation;
mod gaussian;
mod shaper;


pub use dilation::dilate_disk;
pub use gaussian::{gaussian_blur, gaussian_kernel_1d};
pub use shaper::{BINARIZE_THRESHOLD, ShapeConfig, shape_mask};
