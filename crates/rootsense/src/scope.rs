// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped enrichment: tags, extra data, user and breadcrumbs.
//!
//! A [`Scope`] is a cheap clonable handle. Create one per request or task and
//! pass it to captures through [`CaptureContext::scope`](crate::CaptureContext::scope).
//! Clones share state; separate scopes never do.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rootsense_core::{Breadcrumb, BreadcrumbTrail, UserContext, DEFAULT_MAX_BREADCRUMBS};
use serde_json::Value;

use crate::perf::{OperationGuard, SLOW_OPERATION_THRESHOLD};

#[derive(Debug)]
struct ScopeState {
	tags: BTreeMap<String, Value>,
	extra: serde_json::Map<String, Value>,
	user: Option<UserContext>,
	breadcrumbs: BreadcrumbTrail,
}

/// Point-in-time copy of a scope, applied to an event at build time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeSnapshot {
	pub tags: BTreeMap<String, Value>,
	pub extra: serde_json::Map<String, Value>,
	pub user: Option<UserContext>,
	pub breadcrumbs: Vec<Breadcrumb>,
}

#[derive(Debug, Clone)]
pub struct Scope {
	inner: Arc<Mutex<ScopeState>>,
}

impl Scope {
	pub fn new(max_breadcrumbs: usize) -> Self {
		Self {
			inner: Arc::new(Mutex::new(ScopeState {
				tags: BTreeMap::new(),
				extra: serde_json::Map::new(),
				user: None,
				breadcrumbs: BreadcrumbTrail::new(max_breadcrumbs),
			})),
		}
	}

	fn state(&self) -> MutexGuard<'_, ScopeState> {
		// Scope data stays usable even if a holder panicked.
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Sets a tag. Arrays and objects are stored as their JSON text so tags
	/// stay scalar.
	pub fn set_tag(&self, key: impl Into<String>, value: impl Into<Value>) {
		let value = match value.into() {
			v @ (Value::Array(_) | Value::Object(_)) => Value::String(v.to_string()),
			v => v,
		};
		self.state().tags.insert(key.into(), value);
	}

	pub fn remove_tag(&self, key: &str) {
		self.state().tags.remove(key);
	}

	pub fn set_extra(&self, key: impl Into<String>, value: Value) {
		self.state().extra.insert(key.into(), value);
	}

	pub fn set_user(&self, user: UserContext) {
		self.state().user = Some(user);
	}

	pub fn clear_user(&self) {
		self.state().user = None;
	}

	pub fn push_breadcrumb(&self, breadcrumb: Breadcrumb) {
		self.state().breadcrumbs.push(breadcrumb);
	}

	pub fn clear_breadcrumbs(&self) {
		self.state().breadcrumbs.clear();
	}

	/// Drops tags, extra, user and breadcrumbs.
	pub fn clear(&self) {
		let mut state = self.state();
		state.tags.clear();
		state.extra.clear();
		state.user = None;
		state.breadcrumbs.clear();
	}

	pub fn snapshot(&self) -> ScopeSnapshot {
		let state = self.state();
		ScopeSnapshot {
			tags: state.tags.clone(),
			extra: state.extra.clone(),
			user: state.user.clone(),
			breadcrumbs: state.breadcrumbs.snapshot(),
		}
	}

	/// Times an operation until the returned guard is dropped, recording
	/// breadcrumbs and `performance.*` tags on this scope.
	pub fn track(&self, operation: impl Into<String>) -> OperationGuard {
		OperationGuard::start(self.clone(), operation.into(), SLOW_OPERATION_THRESHOLD)
	}

	pub fn track_with_threshold(
		&self,
		operation: impl Into<String>,
		slow_threshold: Duration,
	) -> OperationGuard {
		OperationGuard::start(self.clone(), operation.into(), slow_threshold)
	}
}

impl Default for Scope {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_BREADCRUMBS)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn clones_share_state() {
		let scope = Scope::default();
		let handle = scope.clone();
		handle.set_tag("region", "eu");
		assert_eq!(scope.snapshot().tags["region"], json!("eu"));
	}

	#[test]
	fn separate_scopes_are_isolated() {
		let a = Scope::default();
		let b = Scope::default();
		a.push_breadcrumb(Breadcrumb::new("only in a"));
		a.set_user(UserContext::with_id("u1"));
		assert!(b.snapshot().breadcrumbs.is_empty());
		assert!(b.snapshot().user.is_none());
	}

	#[test]
	fn non_scalar_tags_are_stringified() {
		let scope = Scope::default();
		scope.set_tag("ids", json!([1, 2]));
		scope.set_tag("count", 3);
		let tags = scope.snapshot().tags;
		assert_eq!(tags["ids"], json!("[1,2]"));
		assert_eq!(tags["count"], json!(3));
	}

	#[test]
	fn breadcrumbs_are_bounded() {
		let scope = Scope::new(3);
		for i in 0..5 {
			scope.push_breadcrumb(Breadcrumb::new(format!("step {i}")));
		}
		let messages: Vec<_> = scope
			.snapshot()
			.breadcrumbs
			.into_iter()
			.map(|b| b.message)
			.collect();
		assert_eq!(messages, vec!["step 2", "step 3", "step 4"]);
	}

	#[test]
	fn clear_resets_everything() {
		let scope = Scope::default();
		scope.set_tag("a", "b");
		scope.set_extra("order", json!({"id": 1}));
		scope.set_user(UserContext::with_id("u1"));
		scope.push_breadcrumb(Breadcrumb::new("x"));
		scope.clear();
		assert_eq!(scope.snapshot(), ScopeSnapshot::default());
	}

	#[test]
	fn remove_tag_and_clear_user() {
		let scope = Scope::default();
		scope.set_tag("a", "b");
		scope.set_user(UserContext::with_id("u1"));
		scope.remove_tag("a");
		scope.clear_user();
		let snapshot = scope.snapshot();
		assert!(snapshot.tags.is_empty());
		assert!(snapshot.user.is_none());
	}
}
