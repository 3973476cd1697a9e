//! Error types for the fetch pool.
//!
//! This module defines the central `Error` enum, which captures every
//! recoverable and reportable failure of the pool itself. Fetch failures are
//! *not* errors at this level: they are classified as failure outcomes and
//! reported through the aggregator (see [`crate::OutcomeKind`]).
//!
//! ## Error Cases
//! - `InvalidConfig`: The [`crate::PoolConfig`] failed validation.
//! - `AlreadyStarted`: `start()` was called on a running pool.
//! - `ServiceShutdown`: The pool is stopped and refuses new work.
//! - `ChannelError`: An internal queue closed unexpectedly.
//! - `TaskJoin`: A pool task panicked or was aborted before shutdown.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the fetch pool.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The pool configuration is unusable.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The pool tasks are already running.
    #[error("Worker pool is already started")]
    AlreadyStarted,

    /// The pool has been stopped and no longer accepts work.
    #[error("Worker pool is shutting down")]
    ServiceShutdown,

    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A pool task did not finish cleanly.
    #[error("Task {task} failed: {reason}")]
    TaskJoin { task: String, reason: String },
}
