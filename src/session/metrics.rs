// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Lock-free refresh counters kept by every session, independent of the `metrics` feature.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	superseded: AtomicU64,
	joins: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh calls actually handed to the refresher.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Refreshes that stored a new token.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Refreshes that ended in a rejection or a transient failure.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Refreshes whose result was discarded because a login or logout landed first.
	pub fn superseded(&self) -> u64 {
		self.superseded.load(Ordering::Relaxed)
	}

	/// Refresh requests satisfied by an overlapping refresh instead of a new call.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Point-in-time copy of every counter.
	pub fn snapshot(&self) -> RefreshCounts {
		RefreshCounts {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
			superseded: self.superseded(),
			joins: self.joins(),
		}
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_superseded(&self) {
		self.superseded.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}
}

/// Serializable snapshot of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshCounts {
	/// See [`RefreshMetrics::attempts`].
	pub attempts: u64,
	/// See [`RefreshMetrics::successes`].
	pub successes: u64,
	/// See [`RefreshMetrics::failures`].
	pub failures: u64,
	/// See [`RefreshMetrics::superseded`].
	pub superseded: u64,
	/// See [`RefreshMetrics::joins`].
	pub joins: u64,
}
