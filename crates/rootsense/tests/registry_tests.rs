// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The global collector slot is process-wide, so this lives in its own test
//! binary and runs as a single test.

mod common;

use common::MockTransport;
use rootsense::{CaptureContext, Collector, Level, SdkError};

#[tokio::test]
async fn global_collector_lifecycle() {
	assert!(rootsense::get_client().is_none());

	let transport = MockTransport::new();
	let config = common::config().build().unwrap();
	let collector =
		rootsense::init_with(Collector::builder(config.clone()).transport(transport.clone()))
			.unwrap();

	let global = rootsense::get_client().expect("collector should be installed");
	global.capture_message("from global", Level::Info, CaptureContext::new());
	assert_eq!(collector.queue_len(), 1);

	let second = rootsense::init_with(Collector::builder(config).transport(transport.clone()));
	assert!(matches!(second, Err(SdkError::AlreadyInitialized)));

	rootsense::shutdown().await;
	assert!(rootsense::get_client().is_none());
	assert!(collector.is_closed());
	assert_eq!(transport.events().len(), 1);
}
