use portable_atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by every task of a pool.
///
/// Counters only ever increase. Reads go through [`PoolStats::snapshot`],
/// which is not atomic across fields; each field is individually exact.
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: AtomicU64,
    dispatched: AtomicU64,
    busy_waits: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    dropped_outcomes: AtomicU64,
    lost: AtomicU64,
}

/// Point-in-time copy of [`PoolStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Items accepted by `add_task`.
    pub submitted: u64,
    /// Items placed into a worker inbox.
    pub dispatched: u64,
    /// Placements that found the target inbox full and had to wait.
    pub busy_waits: u64,
    /// Items classified as success by a worker.
    pub succeeded: u64,
    /// Items classified as failure by a worker.
    pub failed: u64,
    /// Outcomes discarded because their channel was full.
    pub dropped_outcomes: u64,
    /// Items the dispatcher could not place because the target worker had
    /// already exited. These never produce an outcome.
    pub lost: u64,
}

impl PoolStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_busy_wait(&self) {
        self.busy_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_outcome(&self) {
        self.dropped_outcomes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            busy_waits: self.busy_waits.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped_outcomes: self.dropped_outcomes.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
        }
    }
}
