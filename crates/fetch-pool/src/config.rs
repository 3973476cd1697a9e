use crate::{Error, Result};

/// Default number of workers in a pool.
pub const DEFAULT_WORKER_COUNT: usize = 3;
/// Default capacity of the shared intake queue.
pub const DEFAULT_INTAKE_CAPACITY: usize = 100;
/// Default capacity of each worker's private inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 10;
/// Default capacity of each shared outcome channel.
pub const DEFAULT_OUTCOME_CAPACITY: usize = 100;
/// Default prefix for worker identifiers.
pub const DEFAULT_WORKER_NAME_PREFIX: &str = "URLProcessor";

/// Static configuration of a [`crate::WorkerPool`].
///
/// All values are fixed for the lifetime of the pool. Build one with
/// [`PoolConfig::default`] and the `with_*` setters, then hand it to
/// [`crate::WorkerPool::new`], which validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers. Must be greater than zero.
    pub worker_count: usize,

    /// Capacity of the shared intake queue that `add_task` feeds.
    ///
    /// Bounded channels need at least one slot, so `0` is realized as a
    /// single-slot queue.
    pub intake_capacity: usize,

    /// Worker identifiers are `<prefix>-1` through `<prefix>-N`.
    pub worker_name_prefix: String,

    /// Capacity of each worker's inbox, independent of `intake_capacity`.
    pub inbox_capacity: usize,

    /// Capacity of each of the two shared outcome channels.
    ///
    /// Outcomes reported while a channel is full are dropped.
    pub outcome_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            worker_name_prefix: DEFAULT_WORKER_NAME_PREFIX.to_string(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            outcome_capacity: DEFAULT_OUTCOME_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Set the number of workers
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the intake queue capacity
    pub fn with_intake_capacity(mut self, capacity: usize) -> Self {
        self.intake_capacity = capacity;
        self
    }

    /// Set the worker name prefix
    pub fn with_worker_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_name_prefix = prefix.into();
        self
    }

    /// Set the per-worker inbox capacity
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    /// Set the outcome channel capacity
    pub fn with_outcome_capacity(mut self, capacity: usize) -> Self {
        self.outcome_capacity = capacity;
        self
    }

    /// Checks the invariants the pool relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the worker count, the inbox
    /// capacity or the outcome capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::InvalidConfig {
                reason: "worker_count must be greater than 0".to_string(),
            });
        }
        if self.inbox_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "inbox_capacity must be greater than 0".to_string(),
            });
        }
        if self.outcome_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "outcome_capacity must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Identifier of the worker at zero-based `index`.
    pub fn worker_name(&self, index: usize) -> String {
        format!("{}-{}", self.worker_name_prefix, index + 1)
    }

    /// Slot count actually used for the intake channel.
    pub(crate) fn effective_intake_capacity(&self) -> usize {
        self.intake_capacity.max(1)
    }
}
