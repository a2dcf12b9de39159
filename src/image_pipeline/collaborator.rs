//! Dust model collaborator module
//!
//! The detection/inpainting model is an injected capability; this module
//! defines its interface, retry handling, and the external-program adapter.

mod command;
mod model;
mod resample;
mod retry;

#[cfg(test)]
mod tests;

pub use command::{CommandModel, EXIT_QUOTA, EXIT_REJECTED, EXIT_TRANSIENT};
pub use model::{DustModel, ServiceError};
pub use resample::{conform_mask_to, conform_to};
pub use retry::{RetryPolicy, RetryingModel};
