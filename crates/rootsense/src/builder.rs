// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turns raw captures into [`Event`]s.

use rootsense_core::{
	fingerprint, operation_fingerprint, Breadcrumb, ErrorEvent, Event, EventHeader, EventPayload,
	Level, MessageEvent, MetricEvent, OperationType, SpanEvent, UserContext, IDENTITY_KEYS,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::context::CaptureContext;
use crate::sanitizer::Sanitizer;
use crate::scope::ScopeSnapshot;
use crate::stacktrace;

/// Stamps events with configuration, caller context and scope enrichment.
#[derive(Debug, Clone)]
pub struct EventBuilder {
	environment: String,
	project_id: String,
	default_tags: Vec<(String, Value)>,
	sanitizer: Option<Sanitizer>,
	attach_stacktrace: bool,
}

impl EventBuilder {
	pub fn new(config: &Config) -> Self {
		let mut default_tags = Vec::new();
		if let Some(name) = &config.service_name {
			default_tags.push(("service.name".to_string(), Value::String(name.clone())));
		}
		if let Some(version) = &config.service_version {
			default_tags.push(("service.version".to_string(), Value::String(version.clone())));
		}

		Self {
			environment: config.environment.clone(),
			project_id: config.project_id.clone(),
			default_tags,
			sanitizer: config.sanitize_pii.then(|| Sanitizer::new(false)),
			attach_stacktrace: config.attach_stacktrace,
		}
	}

	pub fn error(&self, exception_type: &str, message: &str, ctx: &CaptureContext) -> Event {
		let (stack_trace, frames) = if self.attach_stacktrace {
			stacktrace::capture()
		} else {
			(String::new(), Vec::new())
		};
		self.error_with_trace(exception_type, message, stack_trace, frames, ctx)
	}

	pub fn error_with_trace(
		&self,
		exception_type: &str,
		message: &str,
		stack_trace: String,
		frames: Vec<rootsense_core::Frame>,
		ctx: &CaptureContext,
	) -> Event {
		// A blank service or endpoint counts as missing and hashes as
		// "unknown"; the success path applies the same rule so both sides
		// land on one resolution key.
		let payload = EventPayload::Error(ErrorEvent {
			exception_type: exception_type.to_string(),
			message: message.to_string(),
			stack_trace,
			fingerprint: fingerprint(exception_type, ctx.service_name(), ctx.endpoint_name()),
			frames,
		});
		self.assemble(payload, ctx)
	}

	pub fn message(&self, message: &str, level: Level, ctx: &CaptureContext) -> Event {
		let payload = EventPayload::Message(MessageEvent {
			level,
			message: message.to_string(),
		});
		self.assemble(payload, ctx)
	}

	/// Builds a span event, filling in the operation type and an `operation`
	/// label when the integration did not provide them.
	pub fn span(&self, mut span: SpanEvent, ctx: &CaptureContext) -> Event {
		if span.operation_type == OperationType::Generic {
			span.operation_type = OperationType::detect(&span.attributes);
		}
		if !span.attributes.contains_key("operation") {
			let label = operation_fingerprint(span.operation_type, &span.name, &span.attributes);
			span.attributes.insert("operation".into(), Value::String(label));
		}
		span.is_error = span.is_error || span.status.is_error() || span.error.is_some();
		self.assemble(EventPayload::Span(span), ctx)
	}

	pub fn metric(&self, metric: MetricEvent, ctx: &CaptureContext) -> Event {
		self.assemble(EventPayload::Metric(metric), ctx)
	}

	fn assemble(&self, payload: EventPayload, ctx: &CaptureContext) -> Event {
		let mut event = Event::new(
			EventHeader::new(&self.environment, &self.project_id),
			payload,
		);

		apply_fields(&mut event, ctx.merged());
		if let Some(scope) = ctx.scope_handle() {
			apply_scope(&mut event, scope.snapshot());
		}
		for (key, value) in &self.default_tags {
			event
				.header
				.tags
				.entry(key.clone())
				.or_insert_with(|| value.clone());
		}

		if let Some(sanitizer) = &self.sanitizer {
			sanitizer.sanitize_event(&mut event);
		}
		event
	}
}

/// Caller fields go into the body; reserved keys fill the typed enrichment.
fn apply_fields(event: &mut Event, fields: serde_json::Map<String, Value>) {
	for (key, value) in fields {
		match key.as_str() {
			"tags" => match value {
				Value::Object(tags) => event.header.tags.extend(tags),
				other => warn!(value = %other, "ignoring non-object tags in capture context"),
			},
			"extra" => match value {
				Value::Object(extra) => event.header.extra.extend(extra),
				other => warn!(value = %other, "ignoring non-object extra in capture context"),
			},
			"user" => match serde_json::from_value::<UserContext>(value) {
				Ok(user) => event.header.user = Some(user),
				Err(e) => warn!(error = %e, "ignoring malformed user in capture context"),
			},
			"breadcrumbs" => match serde_json::from_value::<Vec<Breadcrumb>>(value) {
				Ok(breadcrumbs) => event.header.breadcrumbs = breadcrumbs,
				Err(e) => warn!(error = %e, "ignoring malformed breadcrumbs in capture context"),
			},
			k if IDENTITY_KEYS.contains(&k) => {
				debug!(key = %k, "ignoring reserved event field in capture context");
			}
			_ => {
				event.fields.insert(key, value);
			}
		}
	}
}

/// Scope values only fill gaps; anything the caller set explicitly wins.
fn apply_scope(event: &mut Event, scope: ScopeSnapshot) {
	let header = &mut event.header;

	for (key, value) in scope.tags {
		header.tags.entry(key).or_insert(value);
	}
	for (key, value) in scope.extra {
		header.extra.entry(key).or_insert(value);
	}
	if header.user.is_none() {
		header.user = scope.user;
	}
	if header.breadcrumbs.is_empty() {
		header.breadcrumbs = scope.breadcrumbs;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scope::Scope;
	use rootsense_core::{SpanStatus, UserContext};
	use serde_json::json;

	fn builder(sanitize: bool) -> EventBuilder {
		let config = Config::builder()
			.api_key("k")
			.project_id("proj_123")
			.environment("staging")
			.service_name("checkout")
			.sanitize_pii(sanitize)
			.attach_stacktrace(false)
			.build()
			.unwrap();
		EventBuilder::new(&config)
	}

	#[test]
	fn blank_service_and_endpoint_fingerprint_as_unknown() {
		let builder = builder(false);
		let blank = builder.error(
			"ValueError",
			"bad",
			&CaptureContext::new().service("").endpoint(""),
		);
		let missing = builder.error("ValueError", "bad", &CaptureContext::new());

		assert_eq!(blank.fingerprint(), missing.fingerprint());
		assert_eq!(
			blank.fingerprint(),
			Some(fingerprint("ValueError", Some("unknown"), Some("unknown")).as_str())
		);
	}

	#[test]
	fn error_events_carry_fingerprint_and_config() {
		let ctx = CaptureContext::new().service("api").endpoint("/users");
		let event = builder(false).error("ValueError", "bad", &ctx);

		let error = event.as_error().unwrap();
		assert_eq!(error.fingerprint, fingerprint("ValueError", Some("api"), Some("/users")));
		assert_eq!(event.header.environment, "staging");
		assert_eq!(event.header.project_id, "proj_123");
		assert_eq!(event.fields["endpoint"], "/users");
		assert_eq!(event.header.tags["service.name"], "checkout");
	}

	#[test]
	fn missing_service_and_endpoint_default_to_unknown() {
		let event = builder(false).error("KeyError", "k", &CaptureContext::new());
		assert_eq!(
			event.fingerprint(),
			Some(fingerprint("KeyError", Some("unknown"), Some("unknown")).as_str())
		);
	}

	#[test]
	fn identity_keys_are_never_overwritten() {
		let ctx = CaptureContext::new()
			.with("event_id", "forged")
			.kwarg("type", "metric")
			.kwarg("timestamp", "yesterday");
		let event = builder(false).message("hello", Level::Info, &ctx);

		assert!(event.fields.is_empty());
		let body = event.to_value().unwrap();
		assert_eq!(body["event_id"], event.id().to_string());
		assert_eq!(body["type"], "message");
	}

	#[test]
	fn explicit_tags_win_over_scope() {
		let scope = Scope::default();
		scope.set_tag("region", "eu");
		scope.set_tag("tier", "gold");
		scope.set_extra("cart", json!({"items": 2}));
		scope.set_user(UserContext::with_id("scope-user"));
		scope.push_breadcrumb(Breadcrumb::new("opened cart"));

		let ctx = CaptureContext::new()
			.with("tags", json!({"region": "us"}))
			.with("user", json!({"id": "explicit-user"}))
			.scope(&scope);
		let event = builder(false).error("E", "m", &ctx);

		assert_eq!(event.header.tags["region"], "us");
		assert_eq!(event.header.tags["tier"], "gold");
		assert_eq!(event.header.extra["cart"]["items"], 2);
		assert_eq!(
			event.header.user.as_ref().and_then(|u| u.id.as_deref()),
			Some("explicit-user")
		);
		assert_eq!(event.header.breadcrumbs.len(), 1);
	}

	#[test]
	fn malformed_enrichment_is_skipped() {
		let ctx = CaptureContext::new()
			.with("tags", "not-a-map")
			.with("breadcrumbs", json!([{"nope": true}]))
			.with("order_id", 42);
		let event = builder(false).message("m", Level::Warning, &ctx);

		assert!(event.header.tags.contains_key("service.name"));
		assert!(event.header.breadcrumbs.is_empty());
		assert_eq!(event.fields["order_id"], 42);
	}

	#[test]
	fn sanitizer_scrubs_fields_and_extra() {
		let ctx = CaptureContext::new()
			.with("password", "hunter2")
			.with("extra", json!({"contact": "john@example.com"}));
		let event = builder(true).error("E", "m", &ctx);

		assert_eq!(event.fields["password"], "[REDACTED]");
		assert_eq!(event.header.extra["contact"], "j**n@example.com");
	}

	#[test]
	fn spans_get_detected_type_and_operation_label() {
		let mut attributes = serde_json::Map::new();
		attributes.insert("http.method".into(), json!("GET"));
		attributes.insert("http.route".into(), json!("/users/{id}"));
		let span = SpanEvent {
			name: "GET /users/{id}".into(),
			status: SpanStatus::error("boom"),
			attributes,
			..Default::default()
		};

		let event = builder(false).span(span, &CaptureContext::new());
		let span = event.as_span().unwrap();
		assert_eq!(span.operation_type, OperationType::Http);
		assert_eq!(span.attributes["operation"], "http:GET:/users/{id}");
		assert!(span.is_error);
	}
}
