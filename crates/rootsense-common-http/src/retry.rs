// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry logic with exponential backoff for HTTP requests.

use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	/// Three attempts separated by 1s and 2s.
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(30),
			backoff_factor: 2.0,
			jitter: false,
		}
	}
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() || self.is_request() {
			return true;
		}

		if let Some(status) = self.status() {
			return status.is_server_error();
		}

		false
	}
}

/// Delay before the retry that follows attempt index `attempt` (zero-based).
///
/// Without jitter this is `base_delay * backoff_factor^attempt`, capped at
/// `max_delay`.
pub fn calculate_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
	let exponential_delay = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped_delay = exponential_delay.min(cfg.max_delay.as_secs_f64());

	let final_delay = if cfg.jitter {
		let jitter_factor = 0.5 + fastrand::f64();
		capped_delay * jitter_factor
	} else {
		capped_delay
	};

	Duration::from_secs_f64(final_delay)
}

pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: std::future::Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;

	loop {
		match f().await {
			Ok(result) => return Ok(result),
			Err(err) => {
				attempt += 1;

				if !err.is_retryable() {
					warn!(
							error = ?err,
							attempt = attempt,
							"non-retryable error encountered"
					);
					return Err(err);
				}

				if attempt >= cfg.max_attempts {
					warn!(
							error = ?err,
							attempt = attempt,
							max_attempts = cfg.max_attempts,
							"max retry attempts exhausted"
					);
					return Err(err);
				}

				let delay = calculate_delay(cfg, attempt - 1);
				warn!(
						error = ?err,
						attempt = attempt,
						max_attempts = cfg.max_attempts,
						delay_ms = delay.as_millis(),
						"retrying after error"
				);

				tokio::time::sleep(delay).await;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::{Arc, Mutex};
	use tokio::time::Instant;

	#[derive(Debug)]
	struct MockError {
		retryable: bool,
	}

	impl RetryableError for MockError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	/// A rejected request (4xx) must not be retried.
	#[tokio::test]
	async fn test_non_retryable_error_fails_immediately() {
		let attempt_count = Arc::new(AtomicU32::new(0));
		let attempt_count_clone = Arc::clone(&attempt_count);

		let cfg = RetryConfig::default();

		let result: Result<(), MockError> = retry(&cfg, || {
			let count = Arc::clone(&attempt_count_clone);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(MockError { retryable: false })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(
			attempt_count.load(Ordering::SeqCst),
			1,
			"non-retryable error should only attempt once"
		);
	}

	/// Transient failures are attempted exactly `max_attempts` times, waiting
	/// 1s and then 2s between attempts.
	#[tokio::test(start_paused = true)]
	async fn test_retryable_error_backs_off_exponentially() {
		let attempts = Arc::new(Mutex::new(Vec::new()));
		let attempts_clone = Arc::clone(&attempts);

		let cfg = RetryConfig::default();
		let started = Instant::now();

		let result: Result<(), MockError> = retry(&cfg, || {
			let attempts = Arc::clone(&attempts_clone);
			async move {
				attempts.lock().unwrap().push(Instant::now());
				Err(MockError { retryable: true })
			}
		})
		.await;

		assert!(result.is_err());
		let attempts = attempts.lock().unwrap();
		assert_eq!(attempts.len(), 3, "should retry exactly max_attempts times");
		assert_eq!(attempts[0] - started, Duration::ZERO);
		assert_eq!(attempts[1] - attempts[0], Duration::from_secs(1));
		assert_eq!(attempts[2] - attempts[1], Duration::from_secs(2));
	}

	#[tokio::test(start_paused = true)]
	async fn test_succeeds_after_retries() {
		let attempt_count = Arc::new(AtomicU32::new(0));
		let attempt_count_clone = Arc::clone(&attempt_count);

		let cfg = RetryConfig::default();

		let result: Result<&str, MockError> = retry(&cfg, || {
			let count = Arc::clone(&attempt_count_clone);
			async move {
				let current = count.fetch_add(1, Ordering::SeqCst);
				if current < 2 {
					Err(MockError { retryable: true })
				} else {
					Ok("success")
				}
			}
		})
		.await;

		assert_eq!(result.unwrap(), "success");
		assert_eq!(
			attempt_count.load(Ordering::SeqCst),
			3,
			"should succeed on third attempt"
		);
	}

	#[test]
	fn test_default_delays_double() {
		let cfg = RetryConfig::default();
		assert_eq!(calculate_delay(&cfg, 0), Duration::from_secs(1));
		assert_eq!(calculate_delay(&cfg, 1), Duration::from_secs(2));
		assert_eq!(calculate_delay(&cfg, 2), Duration::from_secs(4));
	}

	#[test]
	fn test_jitter_adds_randomness() {
		let cfg_with_jitter = RetryConfig {
			max_attempts: 3,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		};

		let delays: Vec<Duration> = (0..10)
			.map(|_| calculate_delay(&cfg_with_jitter, 1))
			.collect();

		let all_same = delays.windows(2).all(|w| w[0] == w[1]);
		assert!(!all_same, "delays with jitter should vary");
	}

	#[test]
	fn test_delay_respects_max_delay() {
		let cfg = RetryConfig {
			max_attempts: 10,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(5),
			backoff_factor: 10.0,
			jitter: false,
		};

		for attempt in 0..10 {
			let delay = calculate_delay(&cfg, attempt);
			assert!(
				delay <= Duration::from_secs(5),
				"delay {delay:?} at attempt {attempt} exceeds max_delay"
			);
		}
	}
}
