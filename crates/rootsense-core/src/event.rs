// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event types shipped to the RootSense backend.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::context::UserContext;
use crate::error::{CoreError, Result};
use crate::level::Level;
use crate::metric::MetricEvent;
use crate::span::SpanEvent;

/// Body keys that caller-supplied fields can never overwrite.
pub const IDENTITY_KEYS: [&str; 3] = ["event_id", "timestamp", "type"];

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Error,
	Message,
	Span,
	Metric,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Message => write!(f, "message"),
			Self::Span => write!(f, "span"),
			Self::Metric => write!(f, "metric"),
		}
	}
}

impl FromStr for EventKind {
	type Err = CoreError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"error" => Ok(Self::Error),
			"message" => Ok(Self::Message),
			"span" => Ok(Self::Span),
			"metric" => Ok(Self::Metric),
			_ => Err(CoreError::InvalidEventKind(s.to_string())),
		}
	}
}

/// Fields shared by every event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHeader {
	pub event_id: EventId,
	pub timestamp: DateTime<Utc>,
	pub environment: String,
	pub project_id: String,

	/// Enrichment
	pub tags: BTreeMap<String, serde_json::Value>,
	pub extra: serde_json::Map<String, serde_json::Value>,
	pub user: Option<UserContext>,
	pub breadcrumbs: Vec<Breadcrumb>,
}

impl EventHeader {
	/// Allocates a fresh id and stamps the current time.
	pub fn new(environment: impl Into<String>, project_id: impl Into<String>) -> Self {
		Self {
			event_id: EventId::new(),
			timestamp: Utc::now(),
			environment: environment.into(),
			project_id: project_id.into(),
			tags: BTreeMap::new(),
			extra: serde_json::Map::new(),
			user: None,
			breadcrumbs: Vec::new(),
		}
	}
}

/// A single stack frame parsed from a backtrace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub function: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub module: Option<String>,
	#[serde(default)]
	pub in_app: bool,
}

/// Error-specific event fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
	pub exception_type: String,
	pub message: String,
	pub stack_trace: String,
	pub fingerprint: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub frames: Vec<Frame>,
}

/// Message-specific event fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
	pub level: Level,
	pub message: String,
}

/// Variant-specific part of an event, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
	Error(ErrorEvent),
	Message(MessageEvent),
	Span(SpanEvent),
	Metric(MetricEvent),
}

impl EventPayload {
	pub fn kind(&self) -> EventKind {
		match self {
			Self::Error(_) => EventKind::Error,
			Self::Message(_) => EventKind::Message,
			Self::Span(_) => EventKind::Span,
			Self::Metric(_) => EventKind::Metric,
		}
	}
}

/// An event ready for delivery.
///
/// Serializes to a flat JSON object: header fields, the payload's fields with
/// its `type` tag, then caller-supplied `fields`, which may shadow anything
/// except [`IDENTITY_KEYS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub header: EventHeader,
	pub payload: EventPayload,
	pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Event {
	pub fn new(header: EventHeader, payload: EventPayload) -> Self {
		Self {
			header,
			payload,
			fields: serde_json::Map::new(),
		}
	}

	pub fn id(&self) -> EventId {
		self.header.event_id
	}

	pub fn kind(&self) -> EventKind {
		self.payload.kind()
	}

	pub fn as_error(&self) -> Option<&ErrorEvent> {
		match &self.payload {
			EventPayload::Error(error) => Some(error),
			_ => None,
		}
	}

	pub fn as_message(&self) -> Option<&MessageEvent> {
		match &self.payload {
			EventPayload::Message(message) => Some(message),
			_ => None,
		}
	}

	pub fn as_span(&self) -> Option<&SpanEvent> {
		match &self.payload {
			EventPayload::Span(span) => Some(span),
			_ => None,
		}
	}

	pub fn fingerprint(&self) -> Option<&str> {
		self.as_error().map(|e| e.fingerprint.as_str())
	}

	/// Build the wire representation.
	pub fn to_value(&self) -> Result<serde_json::Value> {
		use serde_json::Value;

		let mut body = match serde_json::to_value(&self.payload)? {
			Value::Object(map) => map,
			other => {
				let mut map = serde_json::Map::new();
				map.insert("payload".to_string(), other);
				map
			}
		};

		let header = &self.header;
		body.insert("event_id".into(), Value::String(header.event_id.to_string()));
		body.insert(
			"timestamp".into(),
			Value::String(header.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
		);
		body.insert("environment".into(), Value::String(header.environment.clone()));
		body.insert("project_id".into(), Value::String(header.project_id.clone()));

		if !header.tags.is_empty() {
			body.insert("tags".into(), serde_json::to_value(&header.tags)?);
		}
		if !header.extra.is_empty() {
			body.insert("extra".into(), Value::Object(header.extra.clone()));
		}
		if let Some(user) = header.user.as_ref().filter(|u| !u.is_empty()) {
			body.insert("user".into(), serde_json::to_value(user)?);
		}
		if !header.breadcrumbs.is_empty() {
			body.insert("breadcrumbs".into(), serde_json::to_value(&header.breadcrumbs)?);
		}

		for (key, value) in &self.fields {
			if IDENTITY_KEYS.contains(&key.as_str()) {
				continue;
			}
			body.insert(key.clone(), value.clone());
		}

		Ok(Value::Object(body))
	}
}

impl Serialize for Event {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let value = self.to_value().map_err(serde::ser::Error::custom)?;
		value.serialize(serializer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metric::MetricEvent;
	use proptest::prelude::*;
	use serde_json::json;

	fn error_event() -> Event {
		Event::new(
			EventHeader::new("production", "proj_123"),
			EventPayload::Error(ErrorEvent {
				exception_type: "ValueError".into(),
				message: "bad input".into(),
				stack_trace: "trace".into(),
				fingerprint: "abcdef0123456789".into(),
				frames: Vec::new(),
			}),
		)
	}

	#[test]
	fn error_event_wire_shape() {
		let event = error_event();
		let json = event.to_value().unwrap();

		assert_eq!(json["type"], "error");
		assert_eq!(json["event_id"], event.id().to_string());
		assert_eq!(json["exception_type"], "ValueError");
		assert_eq!(json["fingerprint"], "abcdef0123456789");
		assert_eq!(json["environment"], "production");
		assert_eq!(json["project_id"], "proj_123");
		assert!(json.get("tags").is_none());
		assert!(json.get("frames").is_none());
	}

	#[test]
	fn fields_shadow_defaults_but_not_identity() {
		let mut event = error_event();
		let original_id = event.id().to_string();
		event.fields.insert("event_id".into(), json!("forged"));
		event.fields.insert("type".into(), json!("message"));
		event.fields.insert("timestamp".into(), json!("yesterday"));
		event.fields.insert("environment".into(), json!("staging"));
		event.fields.insert("endpoint".into(), json!("/users"));

		let json = event.to_value().unwrap();
		assert_eq!(json["event_id"], original_id);
		assert_eq!(json["type"], "error");
		assert_ne!(json["timestamp"], "yesterday");
		assert_eq!(json["environment"], "staging");
		assert_eq!(json["endpoint"], "/users");
	}

	#[test]
	fn enrichment_is_emitted_when_present() {
		let mut event = error_event();
		event.header.tags.insert("region".into(), json!("eu"));
		event.header.user = Some(UserContext::with_id("u1"));
		event.header.breadcrumbs.push(Breadcrumb::new("clicked"));

		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["tags"]["region"], "eu");
		assert_eq!(json["user"]["id"], "u1");
		assert_eq!(json["breadcrumbs"][0]["message"], "clicked");
	}

	#[test]
	fn empty_user_is_omitted() {
		let mut event = error_event();
		event.header.user = Some(UserContext::default());
		assert!(event.to_value().unwrap().get("user").is_none());
	}

	#[test]
	fn metric_and_message_tags() {
		let metric = Event::new(
			EventHeader::new("dev", "p"),
			EventPayload::Metric(MetricEvent::sample("m", 1.0, Default::default())),
		);
		assert_eq!(metric.kind(), EventKind::Metric);
		assert_eq!(metric.to_value().unwrap()["type"], "metric");

		let message = Event::new(
			EventHeader::new("dev", "p"),
			EventPayload::Message(MessageEvent {
				level: Level::Warning,
				message: "disk low".into(),
			}),
		);
		let json = message.to_value().unwrap();
		assert_eq!(json["type"], "message");
		assert_eq!(json["level"], "warning");
		assert!(message.fingerprint().is_none());
	}

	#[test]
	fn event_ids_are_unique() {
		let ids: std::collections::HashSet<_> = (0..1000).map(|_| EventId::new()).collect();
		assert_eq!(ids.len(), 1000);
	}

	proptest! {
		#[test]
		fn event_id_roundtrip(bytes in any::<[u8; 16]>()) {
			let id = EventId(Uuid::from_bytes(bytes));
			let parsed: EventId = id.to_string().parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}
}
