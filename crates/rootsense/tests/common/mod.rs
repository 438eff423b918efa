// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rootsense::{Collector, Config, ConfigBuilder, Event, Transport};
use serde_json::Value;

/// Records everything it is asked to send.
#[derive(Default)]
pub struct MockTransport {
	batches: Mutex<Vec<Vec<Event>>>,
	signals: Mutex<Vec<(String, serde_json::Map<String, Value>)>>,
	fail_batches: AtomicBool,
	fail_signals: AtomicBool,
	signal_delay: Duration,
}

impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn failing() -> Arc<Self> {
		let transport = Self::default();
		transport.fail_batches.store(true, Ordering::SeqCst);
		Arc::new(transport)
	}

	/// Success signals are recorded as attempted but reported undelivered.
	pub fn failing_signals() -> Arc<Self> {
		let transport = Self::default();
		transport.fail_signals.store(true, Ordering::SeqCst);
		Arc::new(transport)
	}

	/// Each success signal takes `delay` before it is recorded.
	pub fn with_signal_delay(delay: Duration) -> Arc<Self> {
		Arc::new(Self {
			signal_delay: delay,
			..Self::default()
		})
	}

	pub fn batches(&self) -> Vec<Vec<Event>> {
		self.batches.lock().unwrap().clone()
	}

	pub fn batch_sizes(&self) -> Vec<usize> {
		self.batches.lock().unwrap().iter().map(Vec::len).collect()
	}

	pub fn events(&self) -> Vec<Event> {
		self.batches().into_iter().flatten().collect()
	}

	pub fn signals(&self) -> Vec<(String, serde_json::Map<String, Value>)> {
		self.signals.lock().unwrap().clone()
	}
}

#[async_trait]
impl Transport for MockTransport {
	async fn send_batch(&self, events: &[Event]) -> bool {
		self.batches.lock().unwrap().push(events.to_vec());
		!self.fail_batches.load(Ordering::SeqCst)
	}

	async fn send_success_signal(
		&self,
		fingerprint: &str,
		context: &serde_json::Map<String, Value>,
	) -> bool {
		if !self.signal_delay.is_zero() {
			tokio::time::sleep(self.signal_delay).await;
		}
		self.signals
			.lock()
			.unwrap()
			.push((fingerprint.to_string(), context.clone()));
		!self.fail_signals.load(Ordering::SeqCst)
	}
}

pub fn config() -> ConfigBuilder {
	Config::builder()
		.api_key("test-key")
		.project_id("proj_123")
		.environment("test")
		.attach_stacktrace(false)
}

pub fn collector(transport: Arc<MockTransport>, config: ConfigBuilder) -> Collector {
	Collector::builder(config.build().unwrap())
		.transport(transport)
		.build()
		.unwrap()
}
