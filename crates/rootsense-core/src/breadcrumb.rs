// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Breadcrumbs: the trail of lightweight events leading up to an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::level::Level;

/// Default capacity of a breadcrumb trail.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// A breadcrumb recorded before an event was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
	pub message: String,
	/// "http", "database", "performance", "default"
	pub category: String,
	pub level: Level,
	pub timestamp: DateTime<Utc>,
	pub data: serde_json::Value,
}

impl Breadcrumb {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			..Default::default()
		}
	}

	pub fn category(mut self, category: impl Into<String>) -> Self {
		self.category = category.into();
		self
	}

	pub fn level(mut self, level: Level) -> Self {
		self.level = level;
		self
	}

	pub fn data(mut self, data: serde_json::Value) -> Self {
		self.data = data;
		self
	}
}

impl Default for Breadcrumb {
	fn default() -> Self {
		Self {
			message: String::new(),
			category: "default".to_string(),
			level: Level::Info,
			timestamp: Utc::now(),
			data: serde_json::Value::Object(serde_json::Map::new()),
		}
	}
}

/// Fixed-capacity, chronologically ordered breadcrumb sequence.
///
/// When full, pushing evicts the oldest breadcrumb.
#[derive(Debug, Clone)]
pub struct BreadcrumbTrail {
	capacity: usize,
	items: VecDeque<Breadcrumb>,
}

impl BreadcrumbTrail {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			items: VecDeque::with_capacity(capacity.min(DEFAULT_MAX_BREADCRUMBS)),
		}
	}

	pub fn push(&mut self, breadcrumb: Breadcrumb) {
		if self.capacity == 0 {
			return;
		}
		while self.items.len() >= self.capacity {
			self.items.pop_front();
		}
		self.items.push_back(breadcrumb);
	}

	pub fn clear(&mut self) {
		self.items.clear();
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn iter(&self) -> impl Iterator<Item = &Breadcrumb> {
		self.items.iter()
	}

	/// Copies the trail out in chronological order.
	pub fn snapshot(&self) -> Vec<Breadcrumb> {
		self.items.iter().cloned().collect()
	}
}

impl Default for BreadcrumbTrail {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_BREADCRUMBS)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn builder_sets_fields() {
		let crumb = Breadcrumb::new("GET /users")
			.category("http")
			.level(Level::Warning)
			.data(serde_json::json!({"status": 503}));

		assert_eq!(crumb.message, "GET /users");
		assert_eq!(crumb.category, "http");
		assert_eq!(crumb.level, Level::Warning);
		assert_eq!(crumb.data["status"], 503);
	}

	#[test]
	fn trail_evicts_oldest_first() {
		let mut trail = BreadcrumbTrail::new(3);
		for i in 0..5 {
			trail.push(Breadcrumb::new(format!("crumb_{i}")));
		}

		let messages: Vec<_> = trail.iter().map(|b| b.message.as_str()).collect();
		assert_eq!(messages, vec!["crumb_2", "crumb_3", "crumb_4"]);
	}

	#[test]
	fn zero_capacity_trail_stays_empty() {
		let mut trail = BreadcrumbTrail::new(0);
		trail.push(Breadcrumb::new("ignored"));
		assert!(trail.is_empty());
	}

	#[test]
	fn clear_empties_trail() {
		let mut trail = BreadcrumbTrail::default();
		trail.push(Breadcrumb::new("one"));
		trail.clear();
		assert!(trail.is_empty());
		assert_eq!(trail.capacity(), DEFAULT_MAX_BREADCRUMBS);
	}

	proptest! {
		#[test]
		fn trail_never_exceeds_capacity(capacity in 1..50usize, pushes in 0..200usize) {
			let mut trail = BreadcrumbTrail::new(capacity);
			for i in 0..pushes {
				trail.push(Breadcrumb::new(i.to_string()));
			}
			prop_assert_eq!(trail.len(), pushes.min(capacity));
			if pushes > 0 {
				let last = trail.iter().last().unwrap();
				prop_assert_eq!(&last.message, &(pushes - 1).to_string());
			}
		}
	}
}
