// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Span intake from tracing integrations.

use rootsense_core::{OperationType, SpanError, SpanEvent, SpanStatus, TimedEvent};
use serde_json::Value;

/// A finished span as handed over by an instrumentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanRecord {
	pub name: String,
	pub trace_id: String,
	pub span_id: String,
	pub parent_span_id: Option<String>,
	/// Unix epoch nanoseconds.
	pub start_time: Option<u64>,
	pub end_time: Option<u64>,
	pub status: SpanStatus,
	pub attributes: serde_json::Map<String, Value>,
	pub events: Vec<TimedEvent>,
	pub error: Option<SpanError>,
	/// Detected from `attributes` when unset.
	pub operation_type: Option<OperationType>,
}

impl SpanRecord {
	pub fn new(
		name: impl Into<String>,
		trace_id: impl Into<String>,
		span_id: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			trace_id: trace_id.into(),
			span_id: span_id.into(),
			..Self::default()
		}
	}

	pub fn parent(mut self, parent_span_id: impl Into<String>) -> Self {
		self.parent_span_id = Some(parent_span_id.into());
		self
	}

	pub fn timing(mut self, start_time: u64, end_time: u64) -> Self {
		self.start_time = Some(start_time);
		self.end_time = Some(end_time);
		self
	}

	pub fn status(mut self, status: SpanStatus) -> Self {
		self.status = status;
		self
	}

	pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}

	pub fn event(
		mut self,
		name: impl Into<String>,
		timestamp: Option<u64>,
		attributes: serde_json::Map<String, Value>,
	) -> Self {
		self.events.push(TimedEvent {
			name: name.into(),
			timestamp,
			attributes,
		});
		self
	}

	/// Records the exception that ended the span and marks it failed.
	pub fn error(mut self, error_type: &str, message: &str, stacktrace: Option<String>) -> Self {
		self.error = Some(SpanError {
			error_type: Some(error_type.to_string()),
			message: Some(message.to_string()),
			stacktrace,
		});
		if !self.status.is_error() {
			self.status = SpanStatus::error(message);
		}
		self
	}

	pub fn operation_type(&self) -> OperationType {
		self.operation_type
			.unwrap_or_else(|| OperationType::detect(&self.attributes))
	}

	pub fn is_error(&self) -> bool {
		self.status.is_error() || self.error.is_some()
	}

	/// Failed spans and spans of important operation types are exported.
	pub fn should_export(&self) -> bool {
		self.is_error() || self.operation_type().is_important()
	}

	/// `(route, method)` of a successful HTTP span, used for auto-resolution.
	pub fn success_endpoint(&self) -> Option<(String, String)> {
		if self.is_error() || self.operation_type() != OperationType::Http {
			return None;
		}
		let attr = |key: &str| self.attributes.get(key).and_then(Value::as_str);
		let route = attr("http.route").or_else(|| attr("http.target"))?;
		let method = attr("http.method").unwrap_or("UNKNOWN");
		Some((route.to_string(), method.to_string()))
	}

	pub fn into_event(self) -> SpanEvent {
		let operation_type = self.operation_type();
		let is_error = self.is_error();
		let duration_ns = match (self.start_time, self.end_time) {
			(Some(start), Some(end)) => Some(end.saturating_sub(start)),
			_ => None,
		};

		// Failed spans without explicit details fall back to their first
		// `exception` event.
		let error = match self.error {
			Some(error) => Some(error),
			None if is_error => self.events.iter().find_map(TimedEvent::as_span_error),
			None => None,
		};

		SpanEvent {
			operation_type,
			name: self.name,
			trace_id: self.trace_id,
			span_id: self.span_id,
			parent_span_id: self.parent_span_id,
			start_time: self.start_time,
			end_time: self.end_time,
			duration_ns,
			status: self.status,
			attributes: self.attributes,
			events: self.events,
			error,
			is_error,
		}
	}
}
