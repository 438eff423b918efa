// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! RootSense telemetry SDK.
//!
//! Captures errors, messages, spans and metrics, batches them in memory and
//! ships them to the RootSense backend in the background. Errors are grouped
//! by a deterministic fingerprint, and successes on an endpoint that recently
//! failed produce signals the backend uses to auto-resolve incidents.
//!
//! # Example
//!
//! ```ignore
//! use rootsense::{CaptureContext, Collector, Config};
//! use std::time::Duration;
//!
//! let config = Config::from_connection_string("rootsense://KEY@api.rootsense.ai/proj_123")?;
//! let collector = Collector::new(config)?;
//!
//! let scope = collector.scope();
//! scope.set_tag("region", "eu-west-1");
//!
//! if let Err(e) = create_user().await {
//!     collector.capture_error(&e, CaptureContext::new().service("api").endpoint("/users").scope(&scope));
//! } else {
//!     collector.capture_success("/users", "POST", CaptureContext::new().service("api"));
//! }
//!
//! collector.flush(Duration::from_secs(2)).await;
//! collector.stop().await;
//! ```

pub mod batch;
pub mod builder;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
mod panic_hook;
pub mod perf;
pub mod registry;
pub mod resolution;
pub mod sanitizer;
pub mod scope;
pub mod span;
pub mod stacktrace;
pub mod stats;
pub mod transport;

pub use batch::{BatchConfig, BatchProcessor, WorkerState};
pub use builder::EventBuilder;
pub use client::{Collector, CollectorBuilder};
pub use config::{Config, ConfigBuilder};
pub use context::CaptureContext;
pub use error::{ConfigError, Result, SdkError};
pub use panic_hook::PANIC_EXCEPTION_TYPE;
pub use perf::{OperationGuard, QueryGuard, QueryStats, QueryTracker};
pub use registry::{get_client, init, init_with, shutdown};
pub use resolution::{ResolutionTracker, SuccessSignal};
pub use sanitizer::Sanitizer;
pub use scope::{Scope, ScopeSnapshot};
pub use span::SpanRecord;
pub use stats::{CollectorStats, StatsSnapshot};
pub use transport::{HttpTransport, Transport};

pub use rootsense_core::{
	fingerprint, resolution_key, Breadcrumb, DataPoint, Event, EventId, EventKind, Level,
	MetricData, MetricEvent, OperationType, SpanError, SpanEvent, SpanStatus, TimedEvent,
	UserContext,
};

/// Metric payload accepted by [`Collector::capture_metric`].
pub type MetricRecord = MetricEvent;
