// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operation timing guards.
//!
//! Both guards record their outcome when dropped, so an early return or a
//! `?` still produces the completion breadcrumb.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rootsense_core::{Breadcrumb, Level};
use serde_json::{json, Value};
use tracing::warn;

use crate::scope::Scope;

pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_secs(1);
pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(500);

const MAX_QUERY_LEN: usize = 200;

/// Guard returned by [`Scope::track`].
#[must_use = "the operation is timed until the guard is dropped"]
#[derive(Debug)]
pub struct OperationGuard {
	scope: Scope,
	operation: String,
	tags: serde_json::Map<String, Value>,
	started: Instant,
	slow_threshold: Duration,
}

impl OperationGuard {
	pub(crate) fn start(scope: Scope, operation: String, slow_threshold: Duration) -> Self {
		scope.push_breadcrumb(
			Breadcrumb::new(format!("Started {operation}")).category("performance"),
		);
		Self {
			scope,
			operation,
			tags: serde_json::Map::new(),
			started: Instant::now(),
			slow_threshold,
		}
	}

	/// Attaches a tag recorded as `performance.{operation}.{key}` on completion.
	pub fn tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}
}

impl Drop for OperationGuard {
	fn drop(&mut self) {
		let duration = self.started.elapsed();
		let secs = duration.as_secs_f64();
		let op = &self.operation;

		self.scope.set_tag(format!("performance.{op}.duration"), secs);
		for (key, value) in &self.tags {
			self.scope
				.set_tag(format!("performance.{op}.{key}"), value.clone());
		}

		let mut data = self.tags.clone();
		data.insert("duration".into(), json!(secs));
		self.scope.push_breadcrumb(
			Breadcrumb::new(format!("Completed {op}"))
				.category("performance")
				.data(Value::Object(data)),
		);

		if duration > self.slow_threshold {
			warn!(operation = %op, duration_secs = secs, "slow operation detected");
		}
	}
}

/// Aggregate query timings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryStats {
	pub query_count: u64,
	pub total_time: Duration,
}

impl QueryStats {
	pub fn average_time(&self) -> Duration {
		if self.query_count == 0 {
			return Duration::ZERO;
		}
		self.total_time / self.query_count as u32
	}
}

/// Times database queries and keeps running totals.
#[derive(Debug)]
pub struct QueryTracker {
	slow_threshold: Duration,
	stats: Mutex<QueryStats>,
}

impl QueryTracker {
	pub fn new() -> Self {
		Self::with_threshold(SLOW_QUERY_THRESHOLD)
	}

	pub fn with_threshold(slow_threshold: Duration) -> Self {
		Self {
			slow_threshold,
			stats: Mutex::new(QueryStats::default()),
		}
	}

	/// Times one query against `scope` until the returned guard drops.
	pub fn track_query<'a>(
		&'a self,
		scope: &Scope,
		query: &str,
		operation: &str,
		database: Option<&str>,
	) -> QueryGuard<'a> {
		let query = truncate_query(query);
		let data = json!({
			"query": query,
			"operation": operation,
			"database": database,
		});
		scope.push_breadcrumb(
			Breadcrumb::new(format!("Database query started: {operation}"))
				.category("database")
				.data(data.clone()),
		);

		QueryGuard {
			tracker: self,
			scope: scope.clone(),
			operation: operation.to_string(),
			data,
			started: Instant::now(),
		}
	}

	pub fn stats(&self) -> QueryStats {
		*self.stats.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn reset_stats(&self) {
		*self.stats.lock().unwrap_or_else(PoisonError::into_inner) = QueryStats::default();
	}

	fn record(&self, duration: Duration) -> QueryStats {
		let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
		stats.query_count += 1;
		stats.total_time += duration;
		*stats
	}
}

impl Default for QueryTracker {
	fn default() -> Self {
		Self::new()
	}
}

/// Guard returned by [`QueryTracker::track_query`].
#[must_use = "the query is timed until the guard is dropped"]
#[derive(Debug)]
pub struct QueryGuard<'a> {
	tracker: &'a QueryTracker,
	scope: Scope,
	operation: String,
	data: Value,
	started: Instant,
}

impl Drop for QueryGuard<'_> {
	fn drop(&mut self) {
		let duration = self.started.elapsed();
		let stats = self.tracker.record(duration);

		self.scope.set_tag("database.query_count", stats.query_count);
		self.scope
			.set_tag("database.total_time", stats.total_time.as_secs_f64());
		self.scope
			.set_tag("database.last_query_duration", duration.as_secs_f64());

		if duration > self.tracker.slow_threshold {
			warn!(
				operation = %self.operation,
				duration_secs = duration.as_secs_f64(),
				query = %self.data["query"],
				"slow database query detected"
			);

			let mut data = self.data.clone();
			data["duration"] = json!(duration.as_secs_f64());
			self.scope.push_breadcrumb(
				Breadcrumb::new(format!("Slow query: {}", self.operation))
					.category("database")
					.level(Level::Warning)
					.data(data),
			);
		}
	}
}

fn truncate_query(query: &str) -> String {
	match query.char_indices().nth(MAX_QUERY_LEN) {
		Some((idx, _)) => format!("{}...", &query[..idx]),
		None => query.to_string(),
	}
}
