use std::time::Duration;

use rand::Rng;

/// Upper bound on the pre-jitter delay between attempts.
pub const BACKOFF_CAP: Duration = Duration::from_secs(8);

/// Compute the delay before retrying `attempt` (0-based).
///
/// The base delay doubles per attempt (`initial_delay * 2^attempt`), capped at
/// [`BACKOFF_CAP`], with jitter drawn uniformly from `[0, base/10)` added on
/// top so that concurrent callers do not retry in lockstep. Stateless: the
/// same attempt always yields the same base.
pub fn compute_delay(attempt: u32, initial_delay: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    let base = initial_delay.saturating_mul(factor).min(BACKOFF_CAP);
    let jitter = rand::rng().random_range(0.0..0.1);
    base + base.mul_f64(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_within_jitter_band() {
        let initial = Duration::from_millis(500);
        for attempt in 0..=10 {
            let expected_base = initial
                .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
                .min(BACKOFF_CAP);
            for _ in 0..50 {
                let delay = compute_delay(attempt, initial);
                assert!(
                    delay >= expected_base,
                    "attempt {attempt}: {delay:?} < base {expected_base:?}"
                );
                assert!(
                    delay <= expected_base.mul_f64(1.1),
                    "attempt {attempt}: {delay:?} above jitter band for {expected_base:?}"
                );
            }
        }
    }

    #[test]
    fn delay_is_capped() {
        let delay = compute_delay(20, Duration::from_millis(500));
        assert!(delay >= BACKOFF_CAP);
        assert!(delay <= BACKOFF_CAP.mul_f64(1.1));
    }

    #[test]
    fn huge_attempt_counts_saturate() {
        // shift overflow must not panic
        let delay = compute_delay(u32::MAX, Duration::from_millis(100));
        assert!(delay >= BACKOFF_CAP);
        assert!(delay <= BACKOFF_CAP.mul_f64(1.1));
    }

    #[test]
    fn doubles_per_attempt_before_cap() {
        let initial = Duration::from_millis(100);
        assert!(compute_delay(0, initial) >= Duration::from_millis(100));
        assert!(compute_delay(1, initial) >= Duration::from_millis(200));
        assert!(compute_delay(2, initial) >= Duration::from_millis(400));
        assert!(compute_delay(3, initial) <= Duration::from_millis(880));
    }
}
