#![doc = include_str!("../README.md")]

mod config;
mod error;
pub mod fetch;
mod item;
pub mod outcome;
pub mod pool;
mod producer;
mod stats;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::fetch::{FetchError, FetchResult, Fetcher};
#[cfg(feature = "http")]
pub use crate::fetch::{DEFAULT_FETCH_TIMEOUT, HttpFetcher};
pub use crate::item::*;
pub use crate::outcome::{Outcome, OutcomeKind};
#[cfg(feature = "tracing")]
pub use crate::pool::TracingSink;
pub use crate::pool::{OutcomeSink, TaskQueue, WorkerPool};
pub use crate::producer::*;
pub use crate::stats::*;
