// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded event buffer and the background batching worker.
//!
//! Producers call [`BatchProcessor::enqueue`] from any thread without
//! awaiting. A single worker task drains the queue into batches of at most
//! `max_batch_size` events when the queue reaches that size, when
//! `flush_interval` has passed since the last flush, on request, and on
//! shutdown. Every path takes events under the queue lock, so each event is
//! sent at most once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rootsense_core::Event;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::stats::CollectorStats;
use crate::transport::Transport;

/// How often `flush` re-checks whether the worker has caught up.
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lower bound for the worker tick; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct BatchConfig {
	/// Events held before new ones are dropped.
	pub capacity: usize,
	pub max_batch_size: usize,
	pub flush_interval: Duration,
	pub poll_interval: Duration,
	pub debug: bool,
}

impl BatchConfig {
	pub fn from_config(config: &Config) -> Self {
		Self {
			capacity: config.buffer_size,
			max_batch_size: config.max_batch_size,
			flush_interval: config.flush_interval,
			poll_interval: config.poll_interval,
			debug: config.debug,
		}
	}
}

impl Default for BatchConfig {
	fn default() -> Self {
		Self {
			capacity: crate::config::DEFAULT_BUFFER_SIZE,
			max_batch_size: crate::config::DEFAULT_MAX_BATCH_SIZE,
			flush_interval: crate::config::DEFAULT_FLUSH_INTERVAL,
			poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
			debug: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
	Idle = 0,
	/// Checking flush conditions.
	Draining = 1,
	/// Handing batches to the transport.
	Flushing = 2,
	Stopped = 3,
}

impl WorkerState {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => Self::Idle,
			1 => Self::Draining,
			2 => Self::Flushing,
			_ => Self::Stopped,
		}
	}
}

/// Decrements the in-flight counter when a send finishes or is abandoned.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

pub struct BatchProcessor {
	config: BatchConfig,
	transport: Arc<dyn Transport>,
	queue: Mutex<VecDeque<Event>>,
	in_flight: AtomicUsize,
	shutdown: AtomicBool,
	flush_requested: AtomicBool,
	wake: Notify,
	state: AtomicU8,
	stats: Arc<CollectorStats>,
}

impl BatchProcessor {
	/// A zero `poll_interval` or `max_batch_size` is raised to the smallest
	/// usable value.
	pub fn new(
		mut config: BatchConfig,
		transport: Arc<dyn Transport>,
		stats: Arc<CollectorStats>,
	) -> Self {
		config.poll_interval = config.poll_interval.max(MIN_POLL_INTERVAL);
		config.max_batch_size = config.max_batch_size.max(1);

		Self {
			queue: Mutex::new(VecDeque::with_capacity(config.capacity.min(1024))),
			config,
			transport,
			in_flight: AtomicUsize::new(0),
			shutdown: AtomicBool::new(false),
			flush_requested: AtomicBool::new(false),
			wake: Notify::new(),
			state: AtomicU8::new(WorkerState::Idle as u8),
			stats,
		}
	}

	fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Event>> {
		self.queue.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Queues an event without blocking. Returns `false` when the buffer is
	/// full or the processor is shut down; the event is dropped either way.
	pub fn enqueue(&self, event: Event) -> bool {
		if self.shutdown.load(Ordering::SeqCst) {
			return false;
		}

		let len = {
			let mut queue = self.lock_queue();
			if queue.len() >= self.config.capacity {
				drop(queue);
				self.stats.record_dropped();
				warn!(
					event_id = %event.id(),
					kind = %event.kind(),
					capacity = self.config.capacity,
					"event buffer full, dropping event"
				);
				return false;
			}
			queue.push_back(event);
			queue.len()
		};

		self.stats.record_enqueued();
		if len >= self.config.max_batch_size {
			self.wake.notify_one();
		}
		true
	}

	pub fn queue_len(&self) -> usize {
		self.lock_queue().len()
	}

	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::SeqCst)
	}

	pub fn state(&self) -> WorkerState {
		WorkerState::from_u8(self.state.load(Ordering::SeqCst))
	}

	fn set_state(&self, state: WorkerState) {
		self.state.store(state as u8, Ordering::SeqCst);
	}

	pub fn is_shutdown(&self) -> bool {
		self.shutdown.load(Ordering::SeqCst)
	}

	/// Stops accepting events and tells the worker to drain and exit.
	pub fn shutdown(&self) {
		self.shutdown.store(true, Ordering::SeqCst);
		self.wake.notify_one();
	}

	/// Wakes the worker and has it drain the whole queue.
	pub fn request_flush(&self) {
		self.flush_requested.store(true, Ordering::SeqCst);
		self.wake.notify_one();
	}

	fn is_drained(&self) -> bool {
		self.queue_len() == 0 && self.in_flight() == 0
	}

	/// Asks the worker to flush now and waits up to `timeout` for the queue to
	/// empty, then sends whatever is left from the calling task.
	pub async fn flush(&self, timeout: Duration) {
		let deadline = Instant::now() + timeout;

		if self.state() != WorkerState::Stopped {
			self.request_flush();

			while !self.is_drained() {
				let now = Instant::now();
				if now >= deadline {
					debug!(
						queued = self.queue_len(),
						in_flight = self.in_flight(),
						"flush timed out waiting for worker"
					);
					break;
				}
				tokio::time::sleep(FLUSH_POLL_INTERVAL.min(deadline - now)).await;
			}
		}

		self.drain_all().await;
	}

	fn take_batch(&self) -> Option<Vec<Event>> {
		let mut queue = self.lock_queue();
		if queue.is_empty() {
			return None;
		}
		let count = queue.len().min(self.config.max_batch_size);
		let batch: Vec<Event> = queue.drain(..count).collect();
		// Counted before the lock is released so flush never sees an empty
		// queue with nothing in flight while a batch is on its way out.
		self.in_flight.fetch_add(1, Ordering::SeqCst);
		Some(batch)
	}

	async fn deliver(&self, batch: Vec<Event>) {
		let _in_flight = InFlight(&self.in_flight);
		let count = batch.len();

		if self.config.debug {
			debug!(count, "sending event batch");
		}

		let delivered = self.transport.send_batch(&batch).await;
		self.stats.record_batch(count, delivered);
		if !delivered {
			warn!(count, "event batch dropped");
		}
	}

	async fn drain_all(&self) {
		while let Some(batch) = self.take_batch() {
			self.deliver(batch).await;
		}
	}

	async fn drain_full_batches(&self) {
		while self.queue_len() >= self.config.max_batch_size {
			match self.take_batch() {
				Some(batch) => self.deliver(batch).await,
				None => break,
			}
		}
	}

	/// Worker loop. Returns after a shutdown request once the queue is empty.
	pub async fn run(&self) {
		info!(
			flush_interval_ms = self.config.flush_interval.as_millis() as u64,
			max_batch_size = self.config.max_batch_size,
			capacity = self.config.capacity,
			"starting event batch worker"
		);

		let mut ticker = tokio::time::interval(self.config.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut last_flush = Instant::now();

		loop {
			self.set_state(WorkerState::Idle);
			tokio::select! {
				_ = ticker.tick() => {}
				_ = self.wake.notified() => {}
			}

			if self.shutdown.load(Ordering::SeqCst) {
				break;
			}

			self.set_state(WorkerState::Draining);
			let forced = self.flush_requested.swap(false, Ordering::SeqCst);
			let queued = self.queue_len();
			let size_due = queued >= self.config.max_batch_size;
			let time_due = queued > 0 && last_flush.elapsed() >= self.config.flush_interval;

			if !(forced || size_due || time_due) {
				continue;
			}

			self.set_state(WorkerState::Flushing);
			if forced || time_due {
				self.drain_all().await;
			} else {
				self.drain_full_batches().await;
			}
			last_flush = Instant::now();
		}

		self.set_state(WorkerState::Flushing);
		self.drain_all().await;
		self.set_state(WorkerState::Stopped);
		info!("event batch worker stopped");
	}
}
