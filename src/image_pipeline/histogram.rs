//! Histogram normalization module
//!
//! Corrects global intensity drift of the inpainted image against the median.

mod matching;


pub use matching::{HistogramConfig, HistogramMapping, QUANTILE_KNOTS, match_histogram};
