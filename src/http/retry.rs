//! Retry policies for HTTP requests.

use std::time::Duration;

/// Retry policy for an HTTP request.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Single attempt. The default for every endpoint, and the only policy
    /// ever applied to mutating requests.
    #[default]
    None,
    /// Caller-configured retries for read-only (GET) endpoints.
    Reads(RetryConfig),
}

impl RetryPolicy {
    /// The policy to use for a request: reads get `self`, everything else gets `None`.
    pub fn for_method(&self, method: &reqwest::Method) -> RetryPolicy {
        if method == reqwest::Method::GET {
            self.clone()
        } else {
            RetryPolicy::None
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts, not counting the initial request.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Spread each delay by up to ±25%.
    pub jitter: bool,
    /// HTTP status codes that trigger a retry. 4xx never does.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::reads()
    }
}

impl RetryConfig {
    /// Transport errors, timeouts and gateway failures, three retries from 200 ms.
    pub fn reads() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Whether a response status should be retried. Client errors never are.
    pub fn retries_status(&self, status: u16) -> bool {
        !(400..500).contains(&status) && self.retryable_statuses.contains(&status)
    }

    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base =
            self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let jitter_range = capped * 0.25;
            let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default_is_none() {
        assert!(matches!(RetryPolicy::default(), RetryPolicy::None));
    }

    #[test]
    fn test_mutating_methods_never_retry() {
        let policy = RetryPolicy::Reads(RetryConfig::reads());
        assert!(matches!(
            policy.for_method(&reqwest::Method::POST),
            RetryPolicy::None
        ));
        assert!(matches!(
            policy.for_method(&reqwest::Method::GET),
            RetryPolicy::Reads(_)
        ));
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let mut config = RetryConfig::reads();
        config.retryable_statuses.push(429);
        assert!(config.retries_status(503));
        assert!(!config.retries_status(429));
        assert!(!config.retries_status(401));
        assert!(!config.retries_status(500));
    }

    #[test]
    fn test_delay_for_attempt_no_jitter() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(100),
            ..RetryConfig::reads().without_jitter()
        };
        assert_eq!(config.delay_for_attempt(0).as_millis(), 100);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 200);
        assert_eq!(config.delay_for_attempt(2).as_millis(), 400);
    }

    #[test]
    fn test_delay_caps_at_max() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(2000),
            backoff_factor: 10.0,
            jitter: false,
            retryable_statuses: vec![],
        };
        assert_eq!(config.delay_for_attempt(3).as_millis(), 2000);
    }
}
