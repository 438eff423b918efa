// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the RootSense SDK.

use rootsense_common_http::RetryableError;
use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Configuration problems detected while building a [`Config`](crate::Config).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
	#[error("API key is required")]
	MissingApiKey,

	#[error("project ID is required")]
	MissingProjectId,

	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	#[error("invalid connection string: {0}")]
	InvalidConnectionString(String),

	#[error("sample rate must be within 0.0..=1.0, got {0}")]
	InvalidSampleRate(f64),

	#[error("{name} must be greater than zero")]
	ZeroLimit { name: &'static str },
}

/// Errors that can occur in the SDK.
#[derive(Debug, Error)]
pub enum SdkError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The collector has been stopped.
	#[error("collector has been stopped")]
	ClientShutdown,

	/// The collector needs a tokio runtime to spawn its worker.
	#[error("no tokio runtime available to run the batching worker")]
	NoRuntime,

	/// The API key contains characters that cannot be sent in a header.
	#[error("invalid API key format")]
	InvalidApiKey,

	/// A global collector is already installed.
	#[error("a global collector is already initialized")]
	AlreadyInitialized,

	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server answered with something other than 200.
	#[error("server error (status {status}): {message}")]
	ServerError { status: u16, message: String },

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error(transparent)]
	Core(#[from] rootsense_core::CoreError),
}

impl RetryableError for SdkError {
	fn is_retryable(&self) -> bool {
		match self {
			SdkError::RequestFailed(err) => err.is_retryable(),
			SdkError::ServerError { status, .. } => *status >= 500,
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_errors_are_retryable_client_errors_are_not() {
		let server = SdkError::ServerError {
			status: 503,
			message: "unavailable".into(),
		};
		let client = SdkError::ServerError {
			status: 400,
			message: "bad request".into(),
		};
		assert!(server.is_retryable());
		assert!(!client.is_retryable());
		assert!(!SdkError::ClientShutdown.is_retryable());
	}

	#[test]
	fn config_error_messages() {
		assert_eq!(ConfigError::MissingApiKey.to_string(), "API key is required");
		assert_eq!(
			ConfigError::ZeroLimit { name: "buffer_size" }.to_string(),
			"buffer_size must be greater than zero"
		);
	}
}
