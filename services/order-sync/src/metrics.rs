//! Counters for the sync service
//!
//! Cheap atomic counters covering the decisions the engine makes: events
//! applied vs. ignored vs. dropped as malformed, forced resyncs, poll and
//! initialize outcomes, and stale results discarded by the epoch guard.
//! Read in tests and by an operator dump; never on the hot path of a
//! rendering frame.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the sync service.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Push events that mutated the working set.
    pub events_applied: AtomicU64,
    /// Push events outside the view or for untracked ids.
    pub events_ignored: AtomicU64,
    /// Push events dropped at the normalization boundary.
    pub events_malformed: AtomicU64,
    /// Full refreshes forced by membership-affecting updates.
    pub resyncs_forced: AtomicU64,
    /// Initialize calls that replaced the working set.
    pub initializes_completed: AtomicU64,
    /// Initialize calls that failed (working set cleared).
    pub initializes_failed: AtomicU64,
    /// Fallback polls that completed a reconcile pass.
    pub polls_completed: AtomicU64,
    /// Fallback polls that failed (working set untouched).
    pub polls_failed: AtomicU64,
    /// Fetch results discarded because a newer call superseded them.
    pub stale_results_discarded: AtomicU64,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub events_applied: u64,
    pub events_ignored: u64,
    pub events_malformed: u64,
    pub resyncs_forced: u64,
    pub initializes_completed: u64,
    pub initializes_failed: u64,
    pub polls_completed: u64,
    pub polls_failed: u64,
    pub stale_results_discarded: u64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_malformed(&self) {
        self.events_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resync_forced(&self) {
        self.resyncs_forced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_initialize_completed(&self) {
        self.initializes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_initialize_failed(&self) {
        self.initializes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_completed(&self) {
        self.polls_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_failed(&self) {
        self.polls_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_discard(&self) {
        self.stale_results_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters at once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_applied: self.events_applied.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            events_malformed: self.events_malformed.load(Ordering::Relaxed),
            resyncs_forced: self.resyncs_forced.load(Ordering::Relaxed),
            initializes_completed: self.initializes_completed.load(Ordering::Relaxed),
            initializes_failed: self.initializes_failed.load(Ordering::Relaxed),
            polls_completed: self.polls_completed.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            stale_results_discarded: self.stale_results_discarded.load(Ordering::Relaxed),
        }
    }
}
