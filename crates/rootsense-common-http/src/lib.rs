// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the RootSense SDK.
//!
//! This crate provides:
//! - A pre-configured HTTP client with the SDK User-Agent header
//! - Retry logic with exponential backoff for transient failures

mod client;
mod retry;

pub use client::{builder, builder_with_user_agent, new_client_with_timeout, user_agent};
pub use retry::{calculate_delay, retry, RetryConfig, RetryableError};
