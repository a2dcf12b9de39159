use std::time::Duration;

use tracing::warn;

use crate::image_pipeline::collaborator::model::DustModel;
use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{Image, Mask};

/// Capped exponential backoff for transient service failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first call
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1` (1-based `attempt`).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Runs `call` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T, F>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Err(FlatFieldError::ExternalService(e)) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient model failure, retrying"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Applies a [`RetryPolicy`] to every call of the wrapped model.
pub struct RetryingModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: DustModel> RetryingModel<M> {
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: DustModel> DustModel for RetryingModel<M> {
    fn detect(&mut self, image: &Image) -> Result<Mask> {
        let inner = &mut self.inner;
        self.policy.run("detect", || inner.detect(image))
    }

    fn inpaint(&mut self, image: &Image, mask: &Mask) -> Result<Image> {
        let inner = &mut self.inner;
        self.policy.run("inpaint", || inner.inpaint(image, mask))
    }
}
