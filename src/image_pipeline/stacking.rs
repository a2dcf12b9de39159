//! Temporal aggregation of capture frames

mod median;


pub use median::{median_stack, median_u16};
