//! Flat-field synthesis module
//!
//! Turns the median, normalized inpainted image and shaped mask into the
//! 16-bit correction map.

mod synthesis;

#[cfg(test)]
mod tests;

pub use synthesis::{RATIO_EPSILON, SynthesisStats, UNITY, synthesize, synthesize_pixel};
