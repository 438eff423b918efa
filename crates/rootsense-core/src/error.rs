// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for RootSense core types.

use thiserror::Error;

/// Errors raised while parsing or serializing core types.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid level: {0}")]
	InvalidLevel(String),

	#[error("invalid operation type: {0}")]
	InvalidOperationType(String),

	#[error("invalid event kind: {0}")]
	InvalidEventKind(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
