use std::time::Duration;

use anyllm_common::{GatewayError, backoff};

/// What to do with a failed attempt once it has been classified.
#[derive(Debug)]
pub(crate) enum Disposition {
    /// Sleep for `delay`, then run the next attempt
    Retry { delay: Duration, err: GatewayError },
    /// Surface the error to the caller; no further attempts
    Fail(GatewayError),
}

/// Decide between retrying and failing after attempt `attempt` (0-based).
///
/// `max_retries` counts total attempts, so the loop index runs
/// `0..max_retries` and the last attempt's failure is always terminal,
/// wrapped in `RetriesExhausted` when it would otherwise have retried.
/// A backend-supplied `Retry-After` overrides the computed backoff.
pub(crate) fn classify(
    err: GatewayError,
    attempt: u32,
    max_retries: u32,
    initial_delay: Duration,
) -> Disposition {
    if !err.is_retryable() {
        return Disposition::Fail(err);
    }

    if attempt + 1 >= max_retries {
        return Disposition::Fail(GatewayError::RetriesExhausted {
            attempts: max_retries,
            last_error: err.to_string(),
        });
    }

    let delay = match &err {
        GatewayError::RateLimited {
            retry_after: Some(requested),
            ..
        } => *requested,
        _ => backoff::compute_delay(attempt, initial_delay),
    };

    Disposition::Retry { delay, err }
}
