// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fingerprinting for grouping errors into incidents and correlating recoveries.
//!
//! Error fingerprints hash `exception_type|service|endpoint`. Resolution keys
//! hash the same shape with the wildcard type `*`, so every error fingerprint
//! for an endpoint belongs to exactly one resolution key, and a success on that
//! endpoint computes the same key.

use sha2::{Digest, Sha256};

use crate::span::OperationType;

/// Placeholder for a missing service or endpoint.
pub const UNKNOWN: &str = "unknown";

/// Wildcard type marker used for resolution keys.
pub const WILDCARD_TYPE: &str = "*";

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

fn hash_triple(kind: &str, service: &str, endpoint: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(kind.as_bytes());
	hasher.update(b"|");
	hasher.update(service.as_bytes());
	hasher.update(b"|");
	hasher.update(endpoint.as_bytes());

	let mut digest = hex::encode(hasher.finalize());
	digest.truncate(FINGERPRINT_LEN);
	digest
}

/// Compute the grouping fingerprint for an error.
///
/// Missing `service` / `endpoint` default to [`UNKNOWN`].
pub fn fingerprint(exception_type: &str, service: Option<&str>, endpoint: Option<&str>) -> String {
	hash_triple(
		exception_type,
		service.unwrap_or(UNKNOWN),
		endpoint.unwrap_or(UNKNOWN),
	)
}

/// Compute the key that correlates failures and successes on an endpoint.
pub fn resolution_key(service: Option<&str>, endpoint: Option<&str>) -> String {
	hash_triple(
		WILDCARD_TYPE,
		service.unwrap_or(UNKNOWN),
		endpoint.unwrap_or(UNKNOWN),
	)
}

/// Describe an operation from its span attributes, e.g. `http:GET:/users/{id}`.
///
/// This is a human-readable label; correlation always goes through
/// [`resolution_key`].
pub fn operation_fingerprint(
	operation_type: OperationType,
	name: &str,
	attributes: &serde_json::Map<String, serde_json::Value>,
) -> String {
	let attr = |key: &str| attributes.get(key).and_then(|v| v.as_str());

	match operation_type {
		OperationType::Http => {
			let method = attr("http.method").unwrap_or("UNKNOWN");
			let route = attr("http.route").or_else(|| attr("http.target")).unwrap_or(name);
			format!("http:{method}:{route}")
		}
		OperationType::Db => {
			let system = attr("db.system").unwrap_or(UNKNOWN);
			let operation = name.split_whitespace().next().unwrap_or("query");
			let table = attr("db.sql.table").unwrap_or(UNKNOWN);
			format!("db:{system}:{operation}:{table}")
		}
		OperationType::Redis => {
			let command = attr("db.operation").unwrap_or(name);
			format!("redis:{command}")
		}
		OperationType::Celery => {
			let task = attr("celery.task_name").unwrap_or(name);
			format!("celery:{task}")
		}
		other => format!("{other}:{name}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	fn attrs(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn fingerprint_is_short_hex() {
		let fp = fingerprint("ValueError", Some("api"), Some("/users"));
		assert_eq!(fp.len(), FINGERPRINT_LEN);
		assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn missing_context_defaults_to_unknown() {
		assert_eq!(
			fingerprint("ValueError", None, None),
			fingerprint("ValueError", Some("unknown"), Some("unknown"))
		);
	}

	#[test]
	fn matches_reference_digest() {
		// sha256("ValueError|api|/users")
		let mut hasher = Sha256::new();
		hasher.update(b"ValueError|api|/users");
		let full = hex::encode(hasher.finalize());
		assert_eq!(
			fingerprint("ValueError", Some("api"), Some("/users")),
			full[..FINGERPRINT_LEN]
		);
	}

	#[test]
	fn resolution_key_differs_from_error_fingerprints() {
		let key = resolution_key(Some("api"), Some("/users"));
		assert_ne!(key, fingerprint("ValueError", Some("api"), Some("/users")));
		assert_eq!(key, fingerprint(WILDCARD_TYPE, Some("api"), Some("/users")));
	}

	#[test]
	fn http_operation_prefers_route() {
		let attributes = attrs(json!({
			"http.method": "GET",
			"http.route": "/users/{id}",
			"http.target": "/users/42",
		}));
		assert_eq!(
			operation_fingerprint(OperationType::Http, "GET /users", &attributes),
			"http:GET:/users/{id}"
		);
	}

	#[test]
	fn db_operation_uses_first_word_of_name() {
		let attributes = attrs(json!({"db.system": "postgresql", "db.sql.table": "users"}));
		assert_eq!(
			operation_fingerprint(OperationType::Db, "SELECT users", &attributes),
			"db:postgresql:SELECT:users"
		);
	}

	#[test]
	fn redis_and_celery_operations() {
		let redis = attrs(json!({"db.system": "redis", "db.operation": "GET"}));
		assert_eq!(operation_fingerprint(OperationType::Redis, "cache", &redis), "redis:GET");

		let celery = attrs(json!({"celery.task_name": "send_email"}));
		assert_eq!(
			operation_fingerprint(OperationType::Celery, "run", &celery),
			"celery:send_email"
		);
	}

	#[test]
	fn generic_operation_uses_name() {
		assert_eq!(
			operation_fingerprint(OperationType::Generic, "compute", &serde_json::Map::new()),
			"generic:compute"
		);
	}

	proptest! {
		#[test]
		fn fingerprint_is_deterministic(t in "[A-Za-z]{1,20}", s in "[a-z]{0,10}", e in "/[a-z/]{0,20}") {
			prop_assert_eq!(
				fingerprint(&t, Some(&s), Some(&e)),
				fingerprint(&t, Some(&s), Some(&e))
			);
		}

		#[test]
		fn different_endpoints_differ(t in "[A-Za-z]{1,20}", e1 in "/[a-z]{1,10}", e2 in "/[a-z]{1,10}") {
			prop_assume!(e1 != e2);
			prop_assert_ne!(
				fingerprint(&t, Some("api"), Some(&e1)),
				fingerprint(&t, Some("api"), Some(&e2))
			);
		}
	}
}
