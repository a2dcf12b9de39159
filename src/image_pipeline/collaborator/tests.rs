use std::time::Duration;

use crate::image_pipeline::collaborator::{
    DustModel, RetryPolicy, RetryingModel, ServiceError, conform_mask_to, conform_to,
};
use crate::image_pipeline::common::error::FlatFieldError;
use crate::image_pipeline::common::types::Image;
use crate::image_pipeline::test_utils::ScriptedModel;

fn instant_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
    }
}

#[test]
fn test_backoff_doubles_up_to_cap() {
    let policy = RetryPolicy {
        max_attempts: 10,
        initial_backoff: Duration::from_secs(2),
        max_backoff: Duration::from_secs(30),
    };

    assert_eq!(policy.backoff(1), Duration::from_secs(2));
    assert_eq!(policy.backoff(2), Duration::from_secs(4));
    assert_eq!(policy.backoff(4), Duration::from_secs(16));
    assert_eq!(policy.backoff(5), Duration::from_secs(30));
    assert_eq!(policy.backoff(64), Duration::from_secs(30));
}

#[test]
fn test_transient_errors_exhaust_attempts() {
    let mut attempts = 0;
    let result: crate::image_pipeline::common::error::Result<()> =
        instant_policy(3).run("detect", || {
            attempts += 1;
            Err(ServiceError::Transient("timeout".into()).into())
        });

    assert_eq!(attempts, 3);
    assert!(matches!(
        result,
        Err(FlatFieldError::ExternalService(ServiceError::Transient(_)))
    ));
}

#[test]
fn test_non_service_errors_are_not_retried() {
    let mut attempts = 0;
    let result: crate::image_pipeline::common::error::Result<()> =
        instant_policy(5).run("inpaint", || {
            attempts += 1;
            Err(FlatFieldError::NumericError("nan".into()))
        });

    assert_eq!(attempts, 1);
    assert!(matches!(result, Err(FlatFieldError::NumericError(_))));
}

#[test]
fn test_zero_attempts_still_calls_once() {
    let mut attempts = 0;
    let result = instant_policy(0).run("detect", || {
        attempts += 1;
        Ok(attempts)
    });
    assert_eq!(result.unwrap(), 1);
}

#[test]
fn test_retrying_model_recovers_from_transient_failures() {
    let inner = ScriptedModel::failing_with([
        ServiceError::Transient("503".into()),
        ServiceError::Transient("503".into()),
    ]);
    let calls = inner.calls.clone();
    let mut model = RetryingModel::new(inner, instant_policy(3));

    let mask = model.detect(&Image::filled(8, 8, 1000.0)).unwrap();

    assert_eq!(mask.dimensions(), (8, 8));
    assert_eq!(*calls.lock().unwrap(), vec!["detect"; 3]);
}

#[test]
fn test_retrying_model_surfaces_quota_at_once() {
    let inner = ScriptedModel::failing_with([ServiceError::QuotaExceeded("daily".into())]);
    let calls = inner.calls.clone();
    let mut model = RetryingModel::new(inner, instant_policy(3));

    let image = Image::filled(4, 4, 1000.0);
    let err = model.inpaint(&image, &image).unwrap_err();

    assert!(matches!(
        err,
        FlatFieldError::ExternalService(ServiceError::QuotaExceeded(_))
    ));
    assert_eq!(*calls.lock().unwrap(), vec!["inpaint"]);
    assert!(model.into_inner().failures.is_empty());
}

#[test]
fn test_matching_output_is_not_resampled() {
    let reference = Image::filled(5, 3, 0.0);
    let candidate = Image::new(5, 3, (0..15).map(|v| v as f32).collect()).unwrap();
    assert_eq!(conform_to(&reference, candidate.clone()).unwrap(), candidate);
}

#[test]
fn test_resampled_output_takes_reference_dimensions() {
    let reference = Image::filled(64, 48, 0.0);
    let candidate = Image::filled(16, 12, 1000.0);

    let resized = conform_to(&reference, candidate).unwrap();

    assert_eq!(resized.dimensions(), (64, 48));
    assert!(resized.data.iter().all(|v| (v - 1000.0).abs() < 1.0));
}

#[test]
fn test_resampled_mask_stays_in_unit_range() {
    // A hard edge makes Lanczos ring above 1 and below 0.
    let mut candidate = Image::filled(8, 8, 0.0);
    for y in 0..8 {
        for x in 4..8 {
            candidate.set(x, y, 1.0);
        }
    }
    let reference = Image::filled(29, 29, 0.0);

    let mask = conform_mask_to(&reference, candidate).unwrap();

    assert_eq!(mask.dimensions(), (29, 29));
    assert!(mask.data.iter().all(|v| (0.0..=1.0).contains(v)));
    assert!(mask.get(28, 14) > 0.99);
    assert!(mask.get(0, 14) < 0.01);
}
