// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook that reports panics as error events.

use std::panic::{AssertUnwindSafe, PanicHookInfo};
use std::sync::Weak;

use tracing::error;

use crate::client::CollectorInner;
use crate::context::CaptureContext;

pub const PANIC_EXCEPTION_TYPE: &str = "panic";

/// Wraps the current hook. The previous hook always runs afterwards, and the
/// hook is inert once the collector has been dropped.
pub(crate) fn install_panic_hook(client: Weak<CollectorInner>) {
	let previous = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		if let Some(client) = client.upgrade() {
			let reported = std::panic::catch_unwind(AssertUnwindSafe(|| report_panic(&client, info)));
			if reported.is_err() {
				error!("failed to report panic");
			}
		}
		previous(info);
	}));
}

fn report_panic(client: &CollectorInner, info: &PanicHookInfo<'_>) {
	let message = extract_panic_message(info);

	let mut ctx = CaptureContext::new();
	if let Some(location) = info.location() {
		ctx = ctx.with(
			"location",
			format!("{}:{}:{}", location.file(), location.line(), location.column()),
		);
	}
	if let Some(thread) = std::thread::current().name() {
		ctx = ctx.with("thread", thread);
	}

	// Delivery happens on the worker; the panicking thread cannot await.
	if client
		.capture_exception(PANIC_EXCEPTION_TYPE, &message, &ctx)
		.is_some()
	{
		client.wake_worker();
	}
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
