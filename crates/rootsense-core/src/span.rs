// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Span events produced by tracing integrations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Category of the operation a span describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
	Http,
	Db,
	Redis,
	Celery,
	Messaging,
	#[default]
	Generic,
}

impl OperationType {
	/// Infer the operation type from OpenTelemetry semantic-convention attributes.
	pub fn detect(attributes: &serde_json::Map<String, serde_json::Value>) -> Self {
		let has = |key: &str| attributes.contains_key(key);

		if has("http.method") || has("http.url") {
			return Self::Http;
		}
		if attributes.get("db.system").and_then(|v| v.as_str()) == Some("redis") {
			return Self::Redis;
		}
		if has("db.system") || has("db.statement") {
			return Self::Db;
		}
		if has("celery.task_name") {
			return Self::Celery;
		}
		if has("messaging.system") {
			return Self::Messaging;
		}
		Self::Generic
	}

	/// Operation types worth shipping even when the span succeeded.
	pub fn is_important(&self) -> bool {
		matches!(self, Self::Http | Self::Db | Self::Redis | Self::Celery)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Http => "http",
			Self::Db => "db",
			Self::Redis => "redis",
			Self::Celery => "celery",
			Self::Messaging => "messaging",
			Self::Generic => "generic",
		}
	}
}

impl fmt::Display for OperationType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OperationType {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"http" => Ok(Self::Http),
			"db" => Ok(Self::Db),
			"redis" => Ok(Self::Redis),
			"celery" => Ok(Self::Celery),
			"messaging" => Ok(Self::Messaging),
			"generic" => Ok(Self::Generic),
			_ => Err(CoreError::InvalidOperationType(s.to_string())),
		}
	}
}

/// Final status of a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStatus {
	/// "OK", "ERROR", "UNSET"
	pub code: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl SpanStatus {
	pub fn ok() -> Self {
		Self {
			code: "OK".to_string(),
			description: None,
		}
	}

	pub fn error(description: impl Into<String>) -> Self {
		Self {
			code: "ERROR".to_string(),
			description: Some(description.into()),
		}
	}

	pub fn is_error(&self) -> bool {
		self.code.eq_ignore_ascii_case("error")
	}
}

impl Default for SpanStatus {
	fn default() -> Self {
		Self {
			code: "UNSET".to_string(),
			description: None,
		}
	}
}

/// Exception details recorded on a failed span.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanError {
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub error_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stacktrace: Option<String>,
}

/// A timestamped event recorded during a span, such as `exception`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
	pub name: String,
	/// Unix nanoseconds
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<u64>,
	#[serde(default)]
	pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl TimedEvent {
	/// The OTel semantic-convention name for a recorded exception.
	pub const EXCEPTION: &'static str = "exception";

	/// Error details carried by an `exception` event's attributes.
	pub fn as_span_error(&self) -> Option<SpanError> {
		if self.name != Self::EXCEPTION {
			return None;
		}
		let attr = |key: &str| {
			self.attributes
				.get(key)
				.and_then(|v| v.as_str())
				.map(str::to_string)
		};
		Some(SpanError {
			error_type: attr("exception.type"),
			message: attr("exception.message"),
			stacktrace: attr("exception.stacktrace"),
		})
	}
}

/// Span-specific event fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
	pub operation_type: OperationType,
	pub name: String,
	/// 32 hex characters
	pub trace_id: String,
	/// 16 hex characters
	pub span_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parent_span_id: Option<String>,
	/// Unix nanoseconds
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start_time: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub end_time: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ns: Option<u64>,
	pub status: SpanStatus,
	#[serde(default)]
	pub attributes: serde_json::Map<String, serde_json::Value>,
	#[serde(default)]
	pub events: Vec<TimedEvent>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<SpanError>,
	pub is_error: bool,
}
