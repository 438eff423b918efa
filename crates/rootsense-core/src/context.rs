// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User context attached to events.

use serde::{Deserialize, Serialize};

/// Identity of the user affected by an event.
///
/// All fields are optional and redactable; unset fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// IP address (sensitive)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ip_address: Option<String>,
	#[serde(flatten)]
	pub other: serde_json::Map<String, serde_json::Value>,
}

impl UserContext {
	pub fn with_id(id: impl Into<String>) -> Self {
		Self {
			id: Some(id.into()),
			..Default::default()
		}
	}

	pub fn is_empty(&self) -> bool {
		self.id.is_none()
			&& self.email.is_none()
			&& self.username.is_none()
			&& self.ip_address.is_none()
			&& self.other.is_empty()
	}
}
