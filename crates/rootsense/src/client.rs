// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The collector: capture entry points over the batching pipeline.

use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rootsense_core::{resolution_key, Event, EventId, Level, MetricEvent};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::batch::{BatchConfig, BatchProcessor, WorkerState};
use crate::builder::EventBuilder;
use crate::config::Config;
use crate::context::CaptureContext;
use crate::error::{Result, SdkError};
use crate::panic_hook::install_panic_hook;
use crate::resolution::{ResolutionTracker, SuccessSignal};
use crate::scope::Scope;
use crate::span::SpanRecord;
use crate::stats::{CollectorStats, StatsSnapshot};
use crate::transport::{HttpTransport, Transport};

/// How often `flush`/`stop` re-check for outstanding success signals.
const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Builder for [`Collector`].
pub struct CollectorBuilder {
	config: Config,
	transport: Option<Arc<dyn Transport>>,
}

impl CollectorBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			transport: None,
		}
	}

	/// Replaces the default [`HttpTransport`].
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Builds the collector and spawns its worker on the current tokio runtime.
	pub fn build(self) -> Result<Collector> {
		let runtime = Handle::try_current().map_err(|_| SdkError::NoRuntime)?;

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::new(&self.config)?),
		};

		let stats = Arc::new(CollectorStats::default());
		let processor = Arc::new(BatchProcessor::new(
			BatchConfig::from_config(&self.config),
			Arc::clone(&transport),
			Arc::clone(&stats),
		));

		let worker = runtime.spawn({
			let processor = Arc::clone(&processor);
			async move { processor.run().await }
		});

		info!(
			base_url = %self.config.base_url,
			project_id = %self.config.project_id,
			environment = %self.config.environment,
			"RootSense collector initialized"
		);

		Ok(Collector {
			inner: Arc::new(CollectorInner {
				builder: EventBuilder::new(&self.config),
				tracker: ResolutionTracker::new(self.config.resolution_window),
				config: self.config,
				processor,
				transport,
				stats,
				worker: Mutex::new(Some(worker)),
				runtime,
				signals_in_flight: Arc::new(AtomicUsize::new(0)),
				closed: AtomicBool::new(false),
			}),
		})
	}
}

pub(crate) struct CollectorInner {
	config: Config,
	builder: EventBuilder,
	tracker: ResolutionTracker,
	processor: Arc<BatchProcessor>,
	transport: Arc<dyn Transport>,
	stats: Arc<CollectorStats>,
	worker: Mutex<Option<JoinHandle<()>>>,
	runtime: Handle,
	signals_in_flight: Arc<AtomicUsize>,
	closed: AtomicBool,
}

/// Decrements the outstanding-signal counter when a send task finishes.
struct PendingSignal(Arc<AtomicUsize>);

impl Drop for PendingSignal {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

impl CollectorInner {
	fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	fn sampled(&self) -> bool {
		let rate = self.config.sample_rate;
		if rate >= 1.0 || fastrand::f64() < rate {
			return true;
		}
		self.stats.record_sampled_out();
		false
	}

	fn enqueue(&self, event: Event) -> Option<EventId> {
		let id = event.id();
		self.processor.enqueue(event).then_some(id)
	}

	/// Builds, records and queues an error. Shared with the panic hook.
	pub(crate) fn capture_exception(
		&self,
		exception_type: &str,
		message: &str,
		ctx: &CaptureContext,
	) -> Option<EventId> {
		if self.is_closed() {
			return None;
		}

		let event = self.builder.error(exception_type, message, ctx);
		if let Some(fingerprint) = event.fingerprint() {
			let key = resolution_key(ctx.service_name(), ctx.endpoint_name());
			self.tracker.record_failure(&key, fingerprint);
		}

		if !self.sampled() {
			return None;
		}
		self.enqueue(event)
	}

	pub(crate) fn wake_worker(&self) {
		self.processor.request_flush();
	}

	/// Sends a success signal on the runtime; the caller never waits for it.
	fn dispatch_signal(&self, signal: SuccessSignal) {
		let transport = Arc::clone(&self.transport);
		let stats = Arc::clone(&self.stats);
		self.signals_in_flight.fetch_add(1, Ordering::SeqCst);
		let pending = PendingSignal(Arc::clone(&self.signals_in_flight));

		self.runtime.spawn(async move {
			let _pending = pending;
			let delivered = transport
				.send_success_signal(&signal.fingerprint, &signal.context)
				.await;
			stats.record_signal(delivered);
			debug!(
				fingerprint = %signal.fingerprint,
				delivered,
				"success signal processed"
			);
		});
	}

	async fn wait_for_signals(&self, deadline: Instant) {
		loop {
			let outstanding = self.signals_in_flight.load(Ordering::SeqCst);
			if outstanding == 0 {
				return;
			}
			let now = Instant::now();
			if now >= deadline {
				debug!(outstanding, "timed out waiting for success signals");
				return;
			}
			tokio::time::sleep(SIGNAL_POLL_INTERVAL.min(deadline - now)).await;
		}
	}
}

/// Captures telemetry and ships it in the background.
///
/// Cheap to clone. All `capture_*` methods are synchronous and never block on
/// the network; they return the queued event's id, or `None` when the event
/// was dropped (buffer full, sampled out, filtered, or collector stopped).
/// They may be called from any thread once the collector is built.
#[derive(Clone)]
pub struct Collector {
	inner: Arc<CollectorInner>,
}

impl Collector {
	pub fn builder(config: Config) -> CollectorBuilder {
		CollectorBuilder::new(config)
	}

	/// Builds a collector with the default HTTP transport.
	pub fn new(config: Config) -> Result<Self> {
		CollectorBuilder::new(config).build()
	}

	pub fn config(&self) -> &Config {
		&self.inner.config
	}

	/// A fresh scope sized to `max_breadcrumbs`.
	pub fn scope(&self) -> Scope {
		Scope::new(self.inner.config.max_breadcrumbs)
	}

	/// Reports panics as error events before running the previous hook.
	pub fn install_panic_hook(&self) {
		install_panic_hook(Arc::downgrade(&self.inner));
		info!("panic hook installed");
	}

	pub fn capture_exception(
		&self,
		exception_type: &str,
		message: &str,
		ctx: CaptureContext,
	) -> Option<EventId> {
		self.inner.capture_exception(exception_type, message, &ctx)
	}

	/// Captures an error value, using its type name as the exception type.
	pub fn capture_error<E>(&self, error: &E, ctx: CaptureContext) -> Option<EventId>
	where
		E: StdError + ?Sized,
	{
		let mut message = error.to_string();
		let mut source = error.source();
		while let Some(cause) = source {
			message.push_str(": ");
			message.push_str(&cause.to_string());
			source = cause.source();
		}
		self.capture_exception(&short_type_name::<E>(), &message, ctx)
	}

	/// Captures `error` and hands it back, for use in `map_err`/`inspect_err`
	/// chains.
	pub fn capture_and_return<E: StdError>(&self, error: E, ctx: CaptureContext) -> E {
		self.capture_error(&error, ctx);
		error
	}

	pub fn capture_message(
		&self,
		message: &str,
		level: Level,
		ctx: CaptureContext,
	) -> Option<EventId> {
		let inner = &self.inner;
		if inner.is_closed() || !inner.sampled() {
			return None;
		}
		inner.enqueue(inner.builder.message(message, level, &ctx))
	}

	/// Records a successful operation and queues a success signal for each
	/// error recently seen on the same service and endpoint. Signals are sent
	/// in the background with a single attempt; the failures they resolve are
	/// forgotten whether or not delivery succeeds.
	pub fn capture_success(&self, endpoint: &str, method: &str, ctx: CaptureContext) {
		let inner = &self.inner;
		if inner.is_closed() {
			return;
		}

		let mut context = ctx.merged();
		let service = context
			.remove(crate::context::SERVICE_KEY)
			.and_then(|v| v.as_str().map(str::to_string))
			// Blank means missing, as in `CaptureContext::service_name`.
			.filter(|s| !s.is_empty());
		context.remove(crate::context::ENDPOINT_KEY);
		context.remove(crate::context::METHOD_KEY);

		let signals = inner
			.tracker
			.record_success(service.as_deref(), endpoint, method, context);

		for signal in signals {
			debug!(
				fingerprint = %signal.fingerprint,
				endpoint = %endpoint,
				"dispatching success signal"
			);
			inner.dispatch_signal(signal);
		}
	}

	/// Queues a span. Successful spans of unimportant operation types are
	/// filtered out; successful HTTP spans with a route also count as a
	/// success for auto-resolution.
	pub fn capture_span(&self, record: SpanRecord, ctx: CaptureContext) -> Option<EventId> {
		if self.inner.is_closed() {
			return None;
		}

		if !record.should_export() {
			debug!(name = %record.name, "skipping successful span of unimportant operation");
			return None;
		}

		let success = record.success_endpoint();
		let id = self
			.inner
			.enqueue(self.inner.builder.span(record.into_event(), &ctx));

		if let Some((route, method)) = success {
			self.capture_success(&route, &method, ctx);
		}
		id
	}

	pub fn capture_metric(&self, metric: MetricEvent, ctx: CaptureContext) -> Option<EventId> {
		if self.inner.is_closed() {
			return None;
		}
		self.inner.enqueue(self.inner.builder.metric(metric, &ctx))
	}

	/// Sends everything queued, waiting at most `timeout` for the worker
	/// before draining the remainder from this task, then waits out the rest
	/// of `timeout` for outstanding success signals.
	pub async fn flush(&self, timeout: Duration) {
		let deadline = Instant::now() + timeout;
		self.inner.processor.flush(timeout).await;
		self.inner.wait_for_signals(deadline).await;
	}

	/// Stops accepting events, lets the worker drain, and waits for it up to
	/// the configured stop timeout. Safe to call more than once.
	pub async fn stop(&self) {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return;
		}

		let deadline = Instant::now() + self.inner.config.stop_timeout;
		self.inner.processor.shutdown();
		let worker = self
			.inner
			.worker
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.take();

		if let Some(worker) = worker {
			match tokio::time::timeout(self.inner.config.stop_timeout, worker).await {
				Ok(Ok(())) => {}
				Ok(Err(e)) => warn!(error = %e, "batch worker terminated abnormally"),
				Err(_) => warn!(
					timeout_ms = self.inner.config.stop_timeout.as_millis() as u64,
					"batch worker did not stop in time"
				),
			}
		}

		self.inner.wait_for_signals(deadline).await;
		self.inner.tracker.prune();
		info!(stats = ?self.stats(), "RootSense collector stopped");
	}

	pub async fn close(&self) {
		self.stop().await;
	}

	pub fn is_closed(&self) -> bool {
		self.inner.is_closed()
	}

	pub fn stats(&self) -> StatsSnapshot {
		self.inner.stats.snapshot()
	}

	pub fn queue_len(&self) -> usize {
		self.inner.processor.queue_len()
	}

	pub fn worker_state(&self) -> WorkerState {
		self.inner.processor.state()
	}

	/// Drops expired entries from the auto-resolution tracker.
	pub fn prune_resolution_state(&self) {
		self.inner.tracker.prune();
	}
}

/// Drops module paths from every type in the name, generic arguments
/// included: `alloc::vec::Vec<std::io::error::Error>` becomes `Vec<Error>`.
fn short_type_name<E: ?Sized>() -> String {
	let full = std::any::type_name::<E>();
	let mut short = String::with_capacity(full.len());
	let mut path_start = 0;

	for (idx, ch) in full.char_indices() {
		if ch.is_alphanumeric() || ch == '_' || ch == ':' {
			continue;
		}
		short.push_str(last_path_segment(&full[path_start..idx]));
		short.push(ch);
		path_start = idx + ch.len_utf8();
	}
	short.push_str(last_path_segment(&full[path_start..]));
	short
}

fn last_path_segment(path: &str) -> &str {
	path.rsplit("::").next().unwrap_or(path)
}
