// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the RootSense telemetry SDK.
//!
//! This crate holds the data model shared by the SDK and anything that needs to
//! produce or inspect RootSense events without pulling in the delivery
//! pipeline:
//!
//! - [`Event`]: the tagged union of error, message, span and metric events
//! - [`Breadcrumb`] and the bounded [`BreadcrumbTrail`]
//! - [`UserContext`] for redactable identity fields
//! - [`fingerprint`]: deterministic grouping keys for incident correlation

pub mod breadcrumb;
pub mod context;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod level;
pub mod metric;
pub mod span;

pub use breadcrumb::{Breadcrumb, BreadcrumbTrail, DEFAULT_MAX_BREADCRUMBS};
pub use context::UserContext;
pub use error::{CoreError, Result};
pub use event::{
	ErrorEvent, Event, EventHeader, EventId, EventKind, EventPayload, Frame, MessageEvent,
	IDENTITY_KEYS,
};
pub use fingerprint::{fingerprint, operation_fingerprint, resolution_key, UNKNOWN};
pub use level::Level;
pub use metric::{DataPoint, MetricData, MetricEvent};
pub use span::{OperationType, SpanError, SpanEvent, SpanStatus, TimedEvent};
