// Reconnect backoff with exponential growth and jitter

use crate::config::ReconnectConfig;
use rand::Rng;
use std::time::Duration;

/// Retry strategy trait for calculating delays between reconnect attempts
pub trait RetryStrategy: Send + Sync {
    /// Calculate the delay before the next attempt.
    /// Returns None once the attempt budget is spent.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Maximum number of attempts
    fn max_retries(&self) -> u32;

    /// Check if more attempts are allowed
    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries()
    }
}

/// Exponential backoff: base * 2^attempt, capped, plus random jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
    /// 0.0 to 1.0
    jitter_factor: f64,
    max_attempts: u32,
}

impl ExponentialBackoff {
    pub fn with_config(
        base_delay_ms: u64,
        max_delay_ms: u64,
        jitter_factor: f64,
        max_attempts: u32,
    ) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            max_attempts,
        }
    }

    /// Delay without jitter, in milliseconds
    fn calculate_base_delay(&self, attempt: u32) -> u64 {
        let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    fn add_jitter_ms(&self, base_delay_ms: u64) -> u64 {
        if self.jitter_factor == 0.0 {
            return base_delay_ms;
        }

        let jitter_range_ms = (base_delay_ms as f64 * self.jitter_factor) as u64;
        let jitter_ms = if jitter_range_ms > 0 {
            rand::thread_rng().gen_range(0..=jitter_range_ms)
        } else {
            0
        };

        base_delay_ms + jitter_ms
    }
}

impl From<&ReconnectConfig> for ExponentialBackoff {
    fn from(config: &ReconnectConfig) -> Self {
        Self::with_config(
            config.base_delay_ms,
            config.max_delay_ms,
            config.jitter_factor,
            config.max_attempts,
        )
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }

        let base_delay_ms = self.calculate_base_delay(attempt);
        Some(Duration::from_millis(self.add_jitter_ms(base_delay_ms)))
    }

    fn max_retries(&self) -> u32 {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_sequence() {
        let strategy = ExponentialBackoff::with_config(500, 30_000, 0.0, 10);

        assert_eq!(strategy.calculate_base_delay(0), 500);
        assert_eq!(strategy.calculate_base_delay(1), 1_000);
        assert_eq!(strategy.calculate_base_delay(2), 2_000);
        assert_eq!(strategy.calculate_base_delay(5), 16_000);
        // 500 * 2^6 = 32s, capped
        assert_eq!(strategy.calculate_base_delay(6), 30_000);
        assert_eq!(strategy.calculate_base_delay(63), 30_000);
        assert_eq!(strategy.calculate_base_delay(200), 30_000);
    }

    #[test]
    fn test_attempt_limit_enforcement() {
        let strategy = ExponentialBackoff::with_config(1, 10, 0.0, 4);

        for attempt in 0..4 {
            assert!(strategy.next_delay(attempt).is_some());
        }
        assert!(strategy.next_delay(4).is_none());
        assert!(strategy.next_delay(5).is_none());
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let strategy = ExponentialBackoff::with_config(1_000, 30_000, 0.1, 10);

        let delays: Vec<u128> = (0..20)
            .filter_map(|_| strategy.next_delay(0))
            .map(|d| d.as_millis())
            .collect();

        assert_eq!(delays.len(), 20);
        for delay in delays {
            assert!(
                (1_000..=1_100).contains(&delay),
                "Delay {}ms should be between 1000ms and 1100ms",
                delay
            );
        }
    }

    #[test]
    fn test_jitter_factor_clamping() {
        let low = ExponentialBackoff::with_config(5, 10, -0.5, 1);
        assert_eq!(low.jitter_factor, 0.0);

        let high = ExponentialBackoff::with_config(5, 10, 1.5, 1);
        assert_eq!(high.jitter_factor, 1.0);
    }

    #[test]
    fn test_from_reconnect_config() {
        let config = ReconnectConfig {
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            jitter_factor: 0.0,
            max_attempts: 3,
        };
        let strategy = ExponentialBackoff::from(&config);
        assert_eq!(strategy.max_retries(), 3);
        assert_eq!(strategy.next_delay(1), Some(Duration::from_millis(500)));
    }
}
