// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The panic hook is process-wide, so this lives in its own test binary.

mod common;

use std::time::Duration;

use common::MockTransport;
use rootsense::PANIC_EXCEPTION_TYPE;

#[tokio::test]
async fn panics_are_reported_as_error_events() {
	let transport = MockTransport::new();
	let collector = common::collector(transport.clone(), common::config());
	collector.install_panic_hook();

	let result = std::thread::Builder::new()
		.name("worker-7".into())
		.spawn(|| panic!("boom"))
		.unwrap()
		.join();
	assert!(result.is_err());

	collector.flush(Duration::from_secs(2)).await;

	let events = transport.events();
	assert_eq!(events.len(), 1);
	let error = events[0].as_error().unwrap();
	assert_eq!(error.exception_type, PANIC_EXCEPTION_TYPE);
	assert_eq!(error.message, "boom");

	let json = events[0].to_value().unwrap();
	assert!(json["location"]
		.as_str()
		.unwrap()
		.contains("panic_hook_tests.rs"));
	assert_eq!(json["thread"], "worker-7");

	collector.stop().await;
}
