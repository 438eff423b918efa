// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Correlates successes with recent failures so the backend can auto-resolve
//! incidents.
//!
//! Failures are filed under the resolution key of their `(service, endpoint)`
//! pair, remembering every error fingerprint seen there. A later success on
//! the same pair yields one [`SuccessSignal`] per fingerprint still inside the
//! retention window and forgets them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rootsense_core::resolution_key;
use serde_json::{json, Value};
use tracing::debug;

/// A success signal ready to hand to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessSignal {
	/// Fingerprint of the error being resolved.
	pub fingerprint: String,
	pub context: serde_json::Map<String, Value>,
}

type FailureTable = HashMap<String, HashMap<String, DateTime<Utc>>>;

#[derive(Debug)]
pub struct ResolutionTracker {
	window: chrono::Duration,
	failures: Mutex<FailureTable>,
	successes: Mutex<HashMap<String, DateTime<Utc>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResolutionTracker {
	pub fn new(window: Duration) -> Self {
		Self {
			window: chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(36_500)),
			failures: Mutex::new(HashMap::new()),
			successes: Mutex::new(HashMap::new()),
		}
	}

	pub fn record_failure(&self, key: &str, fingerprint: &str) {
		self.record_failure_at(key, fingerprint, Utc::now());
	}

	pub fn record_failure_at(&self, key: &str, fingerprint: &str, now: DateTime<Utc>) {
		locked(&self.failures)
			.entry(key.to_string())
			.or_default()
			.insert(fingerprint.to_string(), now);
	}

	/// Records a success and returns the signals it triggers.
	pub fn record_success(
		&self,
		service: Option<&str>,
		endpoint: &str,
		method: &str,
		context: serde_json::Map<String, Value>,
	) -> Vec<SuccessSignal> {
		self.record_success_at(service, endpoint, method, context, Utc::now())
	}

	pub fn record_success_at(
		&self,
		service: Option<&str>,
		endpoint: &str,
		method: &str,
		context: serde_json::Map<String, Value>,
		now: DateTime<Utc>,
	) -> Vec<SuccessSignal> {
		let key = resolution_key(service, Some(endpoint));

		locked(&self.successes).insert(key.clone(), now);

		let Some(fingerprints) = locked(&self.failures).remove(&key) else {
			return Vec::new();
		};

		let mut signals: Vec<SuccessSignal> = fingerprints
			.into_iter()
			.filter(|(_, last_seen)| now.signed_duration_since(*last_seen) <= self.window)
			.map(|(fingerprint, last_seen)| {
				let mut signal_context = serde_json::Map::new();
				signal_context.insert("endpoint".into(), json!(endpoint));
				signal_context.insert("method".into(), json!(method));
				signal_context.insert(
					"last_error_time".into(),
					json!(last_seen.to_rfc3339_opts(SecondsFormat::Micros, true)),
				);
				for (k, v) in &context {
					signal_context.insert(k.clone(), v.clone());
				}
				SuccessSignal {
					fingerprint,
					context: signal_context,
				}
			})
			.collect();
		signals.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

		if !signals.is_empty() {
			debug!(
				resolution_key = %key,
				endpoint = %endpoint,
				count = signals.len(),
				"success correlated with recent failures"
			);
		}
		signals
	}

	/// Drops failures and successes older than the retention window.
	pub fn prune(&self) {
		self.prune_at(Utc::now());
	}

	pub fn prune_at(&self, now: DateTime<Utc>) {
		let fresh = |seen: &DateTime<Utc>| now.signed_duration_since(*seen) <= self.window;

		{
			let mut failures = locked(&self.failures);
			for fingerprints in failures.values_mut() {
				fingerprints.retain(|_, seen| fresh(seen));
			}
			failures.retain(|_, fingerprints| !fingerprints.is_empty());
		}
		locked(&self.successes).retain(|_, seen| fresh(seen));
	}

	pub fn has_failure(&self, key: &str) -> bool {
		locked(&self.failures).contains_key(key)
	}

	/// Number of distinct error fingerprints awaiting a success.
	pub fn pending_failures(&self) -> usize {
		locked(&self.failures).values().map(HashMap::len).sum()
	}

	pub fn last_success(&self, key: &str) -> Option<DateTime<Utc>> {
		locked(&self.successes).get(key).copied()
	}
}
