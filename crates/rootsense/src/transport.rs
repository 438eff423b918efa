// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of event batches and success signals.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use rootsense_common_http::RetryConfig;
use rootsense_core::Event;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{Result, SdkError};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Ships events to the collection endpoint.
///
/// Implementations never surface errors to the pipeline: a `false` return
/// means the batch or signal was dropped after whatever retrying the
/// transport does.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send_batch(&self, events: &[Event]) -> bool;

	async fn send_success_signal(
		&self,
		fingerprint: &str,
		context: &serde_json::Map<String, Value>,
	) -> bool;
}

#[derive(Serialize)]
struct BatchRequest<'a> {
	events: &'a [Event],
}

#[derive(Serialize)]
struct SuccessRequest<'a> {
	fingerprint: &'a str,
	context: &'a serde_json::Map<String, Value>,
	project_id: &'a str,
}

/// JSON-over-HTTP transport.
///
/// Batches are retried on 5xx, timeouts and connection errors; anything
/// else that is not a 200 is terminal. Success signals get a single attempt.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	http_client: Client,
	batch_url: String,
	success_url: String,
	project_id: String,
	retry: RetryConfig,
	batch_timeout: Duration,
	success_timeout: Duration,
	debug: bool,
}

impl HttpTransport {
	pub fn new(config: &Config) -> Result<Self> {
		let mut api_key =
			HeaderValue::from_str(&config.api_key).map_err(|_| SdkError::InvalidApiKey)?;
		api_key.set_sensitive(true);

		let mut headers = HeaderMap::new();
		headers.insert(API_KEY_HEADER, api_key);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		let http_client = rootsense_common_http::builder()
			.default_headers(headers)
			.build()?;

		Ok(Self {
			http_client,
			batch_url: config.batch_url(),
			success_url: config.success_url(),
			project_id: config.project_id.clone(),
			retry: config.retry.clone(),
			batch_timeout: config.batch_timeout,
			success_timeout: config.success_timeout,
			debug: config.debug,
		})
	}

	/// Sends one batch, retrying transient failures.
	pub async fn try_send_batch(&self, events: &[Event]) -> Result<()> {
		if events.is_empty() {
			return Ok(());
		}

		let body = serde_json::to_vec(&BatchRequest { events })?;

		rootsense_common_http::retry(&self.retry, || {
			self.post(&self.batch_url, body.clone(), self.batch_timeout)
		})
		.await
	}

	pub async fn try_send_success_signal(
		&self,
		fingerprint: &str,
		context: &serde_json::Map<String, Value>,
	) -> Result<()> {
		let body = serde_json::to_vec(&SuccessRequest {
			fingerprint,
			context,
			project_id: &self.project_id,
		})?;

		self.post(&self.success_url, body, self.success_timeout).await
	}

	async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<()> {
		let response = self
			.http_client
			.post(url)
			.timeout(timeout)
			.body(body)
			.send()
			.await?;

		let status = response.status();
		if status == StatusCode::OK {
			return Ok(());
		}

		let message = response.text().await.unwrap_or_default();
		Err(SdkError::ServerError {
			status: status.as_u16(),
			message,
		})
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send_batch(&self, events: &[Event]) -> bool {
		match self.try_send_batch(events).await {
			Ok(()) => {
				if self.debug {
					debug!(count = events.len(), url = %self.batch_url, "event batch delivered");
				}
				true
			}
			Err(e) => {
				error!(error = %e, count = events.len(), "dropping event batch after failed delivery");
				false
			}
		}
	}

	async fn send_success_signal(
		&self,
		fingerprint: &str,
		context: &serde_json::Map<String, Value>,
	) -> bool {
		match self.try_send_success_signal(fingerprint, context).await {
			Ok(()) => {
				if self.debug {
					debug!(fingerprint = %fingerprint, "success signal delivered");
				}
				true
			}
			Err(e) => {
				warn!(error = %e, fingerprint = %fingerprint, "failed to send success signal");
				false
			}
		}
	}
}
