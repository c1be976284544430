//! Retry with exponential backoff for backend calls

use std::time::Duration;

use rand::Rng;

/// Retry policy for home-automation backend calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Whether an HTTP status is worth retrying
///
/// Rate limiting (429), request timeout (408) and server errors (5xx) are
/// transient. Auth and other client errors are terminal.
#[must_use]
pub fn is_recoverable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Whether a transport-level failure is worth retrying
#[must_use]
pub fn is_recoverable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Parse a `Retry-After` header value given in seconds
#[must_use]
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value?.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Compute the delay before retry number `attempt` (0-based)
///
/// A server-provided `retry_after` wins but is capped at `max_delay`.
/// Otherwise `min(base_delay * 2^attempt, max_delay)` plus 0-25% jitter,
/// still capped at `max_delay`.
#[must_use]
pub fn delay_for_attempt(
    policy: &RetryPolicy,
    attempt: u32,
    retry_after: Option<Duration>,
) -> Duration {
    if let Some(ra) = retry_after {
        return ra.min(policy.max_delay);
    }

    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(policy.max_delay);

    let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..=0.25));

    (base + jitter).min(policy.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_statuses() {
        assert!(is_recoverable_status(429));
        assert!(is_recoverable_status(408));
        assert!(is_recoverable_status(500));
        assert!(is_recoverable_status(503));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!is_recoverable_status(200));
        assert!(!is_recoverable_status(400));
        assert!(!is_recoverable_status(401));
        assert!(!is_recoverable_status(403));
        assert!(!is_recoverable_status(404));
    }

    #[test]
    fn parses_retry_after_seconds() {
        assert_eq!(parse_retry_after(Some("3")), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(Some(" 10 ")), Some(Duration::from_secs(10)));
    }

    #[test]
    fn ignores_unparseable_retry_after() {
        assert_eq!(parse_retry_after(None), None);
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2026 07:28:00 GMT")), None);
    }

    #[test]
    fn retry_after_is_capped() {
        let policy = RetryPolicy::default();
        let d = delay_for_attempt(&policy, 0, Some(Duration::from_secs(600)));
        assert_eq!(d, policy.max_delay);
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        assert!(delay_for_attempt(&policy, 0, None) >= Duration::from_millis(100));
        assert!(delay_for_attempt(&policy, 1, None) >= Duration::from_millis(200));
        assert!(delay_for_attempt(&policy, 2, None) >= Duration::from_millis(400));
    }

    #[test]
    fn jitter_within_quarter() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        for _ in 0..50 {
            let d = delay_for_attempt(&policy, 0, None);
            assert!(d >= Duration::from_millis(1000), "below base: {d:?}");
            assert!(d <= Duration::from_millis(1250), "above 125%: {d:?}");
        }
    }

    #[test]
    fn never_exceeds_max() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(3),
            ..RetryPolicy::default()
        };
        assert!(delay_for_attempt(&policy, 5, None) <= policy.max_delay);
    }
}
