// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-capture context supplied by the caller.

use serde_json::Value;

use crate::scope::Scope;

pub const SERVICE_KEY: &str = "service";
pub const ENDPOINT_KEY: &str = "endpoint";
pub const METHOD_KEY: &str = "method";

/// Fields a caller attaches to a single capture.
///
/// `context` fields are merged into the event body first, then `kwargs`, so a
/// kwarg wins over a context field of the same name. The reserved keys
/// `tags`, `extra`, `user` and `breadcrumbs` populate the typed enrichment
/// instead of the body.
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
	context: serde_json::Map<String, Value>,
	kwargs: serde_json::Map<String, Value>,
	scope: Option<Scope>,
}

impl CaptureContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts from an existing context map, e.g. one built by middleware.
	pub fn from_map(context: serde_json::Map<String, Value>) -> Self {
		Self {
			context,
			..Self::default()
		}
	}

	pub fn service(self, service: impl Into<String>) -> Self {
		self.with(SERVICE_KEY, service.into())
	}

	pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
		self.with(ENDPOINT_KEY, endpoint.into())
	}

	pub fn method(self, method: impl Into<String>) -> Self {
		self.with(METHOD_KEY, method.into())
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.insert(key.into(), value.into());
		self
	}

	pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.kwargs.insert(key.into(), value.into());
		self
	}

	pub fn scope(mut self, scope: &Scope) -> Self {
		self.scope = Some(scope.clone());
		self
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.kwargs.get(key).or_else(|| self.context.get(key))
	}

	/// String value of `key`; empty strings count as absent.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
	}

	pub fn service_name(&self) -> Option<&str> {
		self.get_str(SERVICE_KEY)
	}

	pub fn endpoint_name(&self) -> Option<&str> {
		self.get_str(ENDPOINT_KEY)
	}

	pub fn scope_handle(&self) -> Option<&Scope> {
		self.scope.as_ref()
	}

	/// Context fields overlaid with kwargs.
	pub fn merged(&self) -> serde_json::Map<String, Value> {
		let mut merged = self.context.clone();
		for (key, value) in &self.kwargs {
			merged.insert(key.clone(), value.clone());
		}
		merged
	}
}
