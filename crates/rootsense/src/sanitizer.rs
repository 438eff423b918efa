// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! PII scrubbing for event payloads.
//!
//! Values under sensitive keys are replaced with `[REDACTED]`. Unless default
//! PII is allowed, strings are also scanned for emails (masked), phone
//! numbers, SSNs and card numbers (replaced with placeholders).

use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use rootsense_core::Event;
use serde_json::Value;

pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_KEYS: &[&str] = &[
	"password",
	"passwd",
	"pwd",
	"secret",
	"api_key",
	"apikey",
	"token",
	"auth",
	"authorization",
	"cookie",
	"session",
	"credit_card",
	"card_number",
	"cvv",
	"ssn",
	"private_key",
	"access_token",
	"refresh_token",
];

const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key"];

static EMAIL: Lazy<Option<Regex>> =
	Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").ok());

/// Fixed-replacement patterns, applied in order after emails.
static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
	[
		(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "XXX-XXX-XXXX"),
		(r"\b\d{3}-\d{2}-\d{4}\b", "XXX-XX-XXXX"),
		(
			r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b",
			"XXXX-XXXX-XXXX-XXXX",
		),
	]
	.into_iter()
	.filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
	.collect()
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
	send_default_pii: bool,
}

impl Sanitizer {
	/// With `send_default_pii` set, only sensitive keys are redacted.
	pub fn new(send_default_pii: bool) -> Self {
		Self { send_default_pii }
	}

	pub fn is_sensitive_key(key: &str) -> bool {
		let key = key.to_lowercase();
		SENSITIVE_KEYS.iter().any(|s| key.contains(s))
	}

	/// Scrubs a JSON value in place, recursing through objects and arrays.
	pub fn sanitize_value(&self, value: &mut Value) {
		match value {
			Value::Object(map) => self.sanitize_map(map),
			Value::Array(items) => items.iter_mut().for_each(|item| self.sanitize_value(item)),
			Value::String(text) if !self.send_default_pii => {
				let scrubbed = match self.sanitize_string(text) {
					Cow::Owned(scrubbed) => Some(scrubbed),
					Cow::Borrowed(_) => None,
				};
				if let Some(scrubbed) = scrubbed {
					*text = scrubbed;
				}
			}
			_ => {}
		}
	}

	pub fn sanitize_map(&self, map: &mut serde_json::Map<String, Value>) {
		for (key, value) in map.iter_mut() {
			if Self::is_sensitive_key(key) {
				*value = Value::String(REDACTED.to_string());
			} else {
				self.sanitize_value(value);
			}
		}
	}

	pub fn sanitize_headers(&self, headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
		headers
			.iter()
			.map(|(key, value)| {
				let value = if SENSITIVE_HEADERS.contains(&key.to_lowercase().as_str()) {
					REDACTED.to_string()
				} else {
					value.clone()
				};
				(key.clone(), value)
			})
			.collect()
	}

	pub fn sanitize_string<'a>(&self, text: &'a str) -> Cow<'a, str> {
		let mut result = Cow::Borrowed(text);

		if let Some(email) = EMAIL.as_ref() {
			if email.is_match(&result) {
				result = Cow::Owned(
					email
						.replace_all(&result, |caps: &regex::Captures<'_>| mask_email(&caps[0]))
						.into_owned(),
				);
			}
		}

		for (pattern, replacement) in PATTERNS.iter() {
			if pattern.is_match(&result) {
				result = Cow::Owned(pattern.replace_all(&result, *replacement).into_owned());
			}
		}

		result
	}

	/// Scrubs the free-form parts of an event: extra, body fields, the user's
	/// additional attributes and breadcrumb data.
	pub fn sanitize_event(&self, event: &mut Event) {
		self.sanitize_map(&mut event.header.extra);
		self.sanitize_map(&mut event.fields);
		if let Some(user) = event.header.user.as_mut() {
			self.sanitize_map(&mut user.other);
		}
		for breadcrumb in &mut event.header.breadcrumbs {
			self.sanitize_value(&mut breadcrumb.data);
		}
	}
}

/// `john.doe@example.com` becomes `j******e@example.com`.
fn mask_email(email: &str) -> String {
	let Some((user, domain)) = email.split_once('@') else {
		return "[EMAIL]".to_string();
	};

	let chars: Vec<char> = user.chars().collect();
	let masked = if chars.len() <= 2 {
		"**".to_string()
	} else {
		let mut masked = String::with_capacity(user.len());
		masked.push(chars[0]);
		masked.extend(std::iter::repeat('*').take(chars.len() - 2));
		masked.push(chars[chars.len() - 1]);
		masked
	};

	format!("{masked}@{domain}")
}
