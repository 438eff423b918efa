// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SDK configuration.

use std::fmt;
use std::time::Duration;

use rootsense_common_http::RetryConfig;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.rootsense.ai";
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_BUFFER_SIZE: usize = 1000;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SUCCESS_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RESOLUTION_WINDOW: Duration = Duration::from_secs(60 * 60);

const CONNECTION_SCHEME: &str = "rootsense://";

pub const ENV_API_KEY: &str = "ROOTSENSE_API_KEY";
pub const ENV_PROJECT_ID: &str = "ROOTSENSE_PROJECT_ID";
pub const ENV_BACKEND_URL: &str = "ROOTSENSE_BACKEND_URL";
pub const ENV_ENVIRONMENT: &str = "ROOTSENSE_ENVIRONMENT";

/// Validated collector configuration.
///
/// Build one with [`Config::builder`], [`Config::from_env`] or
/// [`Config::from_connection_string`].
#[derive(Clone)]
pub struct Config {
	pub api_key: String,
	pub project_id: String,
	/// Normalized, without a trailing slash.
	pub base_url: String,
	pub environment: String,
	pub service_name: Option<String>,
	pub service_version: Option<String>,
	/// Fraction of error/message events kept, `0.0..=1.0`.
	pub sample_rate: f64,
	pub debug: bool,
	pub sanitize_pii: bool,
	pub attach_stacktrace: bool,
	pub max_breadcrumbs: usize,
	pub buffer_size: usize,
	pub max_batch_size: usize,
	pub flush_interval: Duration,
	pub poll_interval: Duration,
	pub retry: RetryConfig,
	pub batch_timeout: Duration,
	pub success_timeout: Duration,
	pub stop_timeout: Duration,
	pub resolution_window: Duration,
}

impl Config {
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::new()
	}

	/// Reads `ROOTSENSE_API_KEY`, `ROOTSENSE_PROJECT_ID`,
	/// `ROOTSENSE_BACKEND_URL` and `ROOTSENSE_ENVIRONMENT`.
	pub fn from_env() -> Result<Self, ConfigError> {
		ConfigBuilder::new().env_defaults().build()
	}

	/// Parses `rootsense://API_KEY@HOST/PROJECT_ID`. The base URL is always
	/// `https://HOST`.
	pub fn from_connection_string(connection_string: &str) -> Result<Self, ConfigError> {
		ConfigBuilder::new().connection_string(connection_string)?.build()
	}

	pub fn batch_url(&self) -> String {
		format!("{}/events/batch", self.base_url)
	}

	pub fn success_url(&self) -> String {
		format!("{}/events/success", self.base_url)
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("api_key", &"[REDACTED]")
			.field("project_id", &self.project_id)
			.field("base_url", &self.base_url)
			.field("environment", &self.environment)
			.field("service_name", &self.service_name)
			.field("service_version", &self.service_version)
			.field("sample_rate", &self.sample_rate)
			.field("debug", &self.debug)
			.field("sanitize_pii", &self.sanitize_pii)
			.field("buffer_size", &self.buffer_size)
			.field("max_batch_size", &self.max_batch_size)
			.field("flush_interval", &self.flush_interval)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Config`].
#[derive(Default, Clone)]
pub struct ConfigBuilder {
	api_key: Option<String>,
	project_id: Option<String>,
	base_url: Option<String>,
	environment: Option<String>,
	service_name: Option<String>,
	service_version: Option<String>,
	sample_rate: Option<f64>,
	debug: bool,
	sanitize_pii: Option<bool>,
	attach_stacktrace: Option<bool>,
	max_breadcrumbs: Option<usize>,
	buffer_size: Option<usize>,
	max_batch_size: Option<usize>,
	flush_interval: Option<Duration>,
	poll_interval: Option<Duration>,
	retry: Option<RetryConfig>,
	batch_timeout: Option<Duration>,
	success_timeout: Option<Duration>,
	stop_timeout: Option<Duration>,
	resolution_window: Option<Duration>,
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into());
		self
	}

	pub fn project_id(mut self, id: impl Into<String>) -> Self {
		self.project_id = Some(id.into());
		self
	}

	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	pub fn environment(mut self, env: impl Into<String>) -> Self {
		self.environment = Some(env.into());
		self
	}

	pub fn service_name(mut self, name: impl Into<String>) -> Self {
		self.service_name = Some(name.into());
		self
	}

	pub fn service_version(mut self, version: impl Into<String>) -> Self {
		self.service_version = Some(version.into());
		self
	}

	pub fn sample_rate(mut self, rate: f64) -> Self {
		self.sample_rate = Some(rate);
		self
	}

	/// Enables per-batch debug logging.
	pub fn debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;
		self
	}

	pub fn sanitize_pii(mut self, enabled: bool) -> Self {
		self.sanitize_pii = Some(enabled);
		self
	}

	/// Capture a backtrace for every error event. On by default.
	pub fn attach_stacktrace(mut self, enabled: bool) -> Self {
		self.attach_stacktrace = Some(enabled);
		self
	}

	pub fn max_breadcrumbs(mut self, max: usize) -> Self {
		self.max_breadcrumbs = Some(max);
		self
	}

	pub fn buffer_size(mut self, size: usize) -> Self {
		self.buffer_size = Some(size);
		self
	}

	pub fn max_batch_size(mut self, size: usize) -> Self {
		self.max_batch_size = Some(size);
		self
	}

	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.flush_interval = Some(interval);
		self
	}

	/// How often the worker wakes up to check the flush conditions.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = Some(interval);
		self
	}

	pub fn retry_config(mut self, config: RetryConfig) -> Self {
		self.retry = Some(config);
		self
	}

	pub fn batch_timeout(mut self, timeout: Duration) -> Self {
		self.batch_timeout = Some(timeout);
		self
	}

	pub fn success_timeout(mut self, timeout: Duration) -> Self {
		self.success_timeout = Some(timeout);
		self
	}

	pub fn stop_timeout(mut self, timeout: Duration) -> Self {
		self.stop_timeout = Some(timeout);
		self
	}

	pub fn resolution_window(mut self, window: Duration) -> Self {
		self.resolution_window = Some(window);
		self
	}

	/// Sets the API key, host and project from a `rootsense://` connection
	/// string. Later setters still override.
	pub fn connection_string(mut self, connection_string: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidConnectionString(connection_string.to_string());

		let rest = connection_string
			.strip_prefix(CONNECTION_SCHEME)
			.ok_or_else(invalid)?;
		let (api_key, location) = rest.split_once('@').ok_or_else(invalid)?;
		let (host, project_id) = location.split_once('/').ok_or_else(invalid)?;

		if api_key.is_empty() || host.is_empty() || project_id.is_empty() {
			return Err(invalid());
		}

		self.api_key = Some(api_key.to_string());
		self.base_url = Some(format!("https://{host}"));
		self.project_id = Some(project_id.to_string());
		Ok(self)
	}

	/// Fills unset fields from the process environment.
	pub fn env_defaults(self) -> Self {
		self.env_defaults_from(|name| std::env::var(name).ok())
	}

	/// Fills unset fields using `lookup` to resolve environment variables.
	pub fn env_defaults_from<F>(mut self, lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		if self.api_key.is_none() {
			self.api_key = lookup(ENV_API_KEY);
		}
		if self.project_id.is_none() {
			self.project_id = lookup(ENV_PROJECT_ID);
		}
		if self.base_url.is_none() {
			self.base_url = lookup(ENV_BACKEND_URL);
		}
		if self.environment.is_none() {
			self.environment = lookup(ENV_ENVIRONMENT);
		}
		self
	}

	pub fn build(self) -> Result<Config, ConfigError> {
		let api_key = self
			.api_key
			.filter(|k| !k.trim().is_empty())
			.ok_or(ConfigError::MissingApiKey)?;
		let project_id = self
			.project_id
			.filter(|p| !p.trim().is_empty())
			.ok_or(ConfigError::MissingProjectId)?;

		let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

		let sample_rate = self.sample_rate.unwrap_or(1.0);
		if !(0.0..=1.0).contains(&sample_rate) {
			return Err(ConfigError::InvalidSampleRate(sample_rate));
		}

		let buffer_size = self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
		if buffer_size == 0 {
			return Err(ConfigError::ZeroLimit { name: "buffer_size" });
		}
		let max_batch_size = self.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE);
		if max_batch_size == 0 {
			return Err(ConfigError::ZeroLimit {
				name: "max_batch_size",
			});
		}
		let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
		if poll_interval.is_zero() {
			return Err(ConfigError::ZeroLimit {
				name: "poll_interval",
			});
		}

		Ok(Config {
			api_key,
			project_id,
			base_url,
			environment: self
				.environment
				.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
			service_name: self.service_name,
			service_version: self.service_version,
			sample_rate,
			debug: self.debug,
			sanitize_pii: self.sanitize_pii.unwrap_or(true),
			attach_stacktrace: self.attach_stacktrace.unwrap_or(true),
			max_breadcrumbs: self
				.max_breadcrumbs
				.unwrap_or(rootsense_core::DEFAULT_MAX_BREADCRUMBS),
			buffer_size,
			max_batch_size,
			flush_interval: self.flush_interval.unwrap_or(DEFAULT_FLUSH_INTERVAL),
			poll_interval,
			retry: self.retry.unwrap_or_default(),
			batch_timeout: self.batch_timeout.unwrap_or(DEFAULT_BATCH_TIMEOUT),
			success_timeout: self.success_timeout.unwrap_or(DEFAULT_SUCCESS_TIMEOUT),
			stop_timeout: self.stop_timeout.unwrap_or(DEFAULT_STOP_TIMEOUT),
			resolution_window: self.resolution_window.unwrap_or(DEFAULT_RESOLUTION_WINDOW),
		})
	}
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
	let trimmed = raw.trim().trim_end_matches('/');
	let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl(format!("{raw}: {e}")))?;

	match parsed.scheme() {
		"http" | "https" => Ok(trimmed.to_string()),
		other => Err(ConfigError::InvalidBaseUrl(format!(
			"{raw}: unsupported scheme {other}"
		))),
	}
}
