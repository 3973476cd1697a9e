//! Worker pool, dispatcher and outcome aggregation.
//!
//! ## Structure
//!
//! - [`manager`] - [`WorkerPool`], the public entry point.
//! - `dispatcher` - round-robin assignment from the intake queue.
//! - `worker` - per-worker fetch loop and outcome reporting.
//! - `aggregator` - merges outcome channels into an [`OutcomeSink`].

mod aggregator;
mod dispatcher;
pub mod manager;
mod worker;


pub use aggregator::OutcomeSink;
#[cfg(feature = "tracing")]
pub use aggregator::TracingSink;
pub use manager::{TaskQueue, WorkerPool};
