// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct CollectorStats {
	events_enqueued: AtomicU64,
	events_dropped: AtomicU64,
	events_sampled_out: AtomicU64,
	events_sent: AtomicU64,
	events_failed: AtomicU64,
	batches_sent: AtomicU64,
	batches_failed: AtomicU64,
	signals_sent: AtomicU64,
	signals_failed: AtomicU64,
}

/// Point-in-time copy of [`CollectorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
	pub events_enqueued: u64,
	/// Rejected because the buffer was full.
	pub events_dropped: u64,
	pub events_sampled_out: u64,
	pub events_sent: u64,
	/// Lost with a batch that could not be delivered.
	pub events_failed: u64,
	pub batches_sent: u64,
	pub batches_failed: u64,
	pub signals_sent: u64,
	pub signals_failed: u64,
}

fn bump(counter: &AtomicU64, n: u64) {
	counter.fetch_add(n, Ordering::Relaxed);
}

impl CollectorStats {
	pub(crate) fn record_enqueued(&self) {
		bump(&self.events_enqueued, 1);
	}

	pub(crate) fn record_dropped(&self) {
		bump(&self.events_dropped, 1);
	}

	pub(crate) fn record_sampled_out(&self) {
		bump(&self.events_sampled_out, 1);
	}

	pub(crate) fn record_batch(&self, events: usize, delivered: bool) {
		if delivered {
			bump(&self.batches_sent, 1);
			bump(&self.events_sent, events as u64);
		} else {
			bump(&self.batches_failed, 1);
			bump(&self.events_failed, events as u64);
		}
	}

	pub(crate) fn record_signal(&self, delivered: bool) {
		if delivered {
			bump(&self.signals_sent, 1);
		} else {
			bump(&self.signals_failed, 1);
		}
	}

	pub fn snapshot(&self) -> StatsSnapshot {
		let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
		StatsSnapshot {
			events_enqueued: load(&self.events_enqueued),
			events_dropped: load(&self.events_dropped),
			events_sampled_out: load(&self.events_sampled_out),
			events_sent: load(&self.events_sent),
			events_failed: load(&self.events_failed),
			batches_sent: load(&self.batches_sent),
			batches_failed: load(&self.batches_failed),
			signals_sent: load(&self.signals_sent),
			signals_failed: load(&self.signals_failed),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn batches_count_events_by_outcome() {
		let stats = CollectorStats::default();
		stats.record_batch(100, true);
		stats.record_batch(7, false);
		stats.record_signal(true);

		let snapshot = stats.snapshot();
		assert_eq!(snapshot.batches_sent, 1);
		assert_eq!(snapshot.events_sent, 100);
		assert_eq!(snapshot.batches_failed, 1);
		assert_eq!(snapshot.events_failed, 7);
		assert_eq!(snapshot.signals_sent, 1);
		assert_eq!(snapshot.signals_failed, 0);
	}
}
