//! The fetch capability.
//!
//! Workers never talk to the network directly. They call a [`Fetcher`], which
//! either yields the status code returned by the remote end or a
//! [`FetchError`] describing a transport-level failure. Timeouts are a
//! property of the fetcher, not of the pool.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::*;

use core::future::Future;

/// Result of a single retrieval: a status code or a transport failure.
pub type FetchResult = Result<u16, FetchError>;

/// Transport-level failures. Any of these classifies the item as failed.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The retrieval did not complete within the fetcher's timeout.
    #[error("request timed out")]
    Timeout,

    /// The remote end could not be reached (DNS, refused, reset, ...).
    #[error("connection failed: {reason}")]
    Connect { reason: String },

    /// Any other failure while building or sending the request.
    #[error("request failed: {reason}")]
    Request { reason: String },

    /// The fetcher panicked. The worker survives and moves on.
    #[error("fetcher panicked: {reason}")]
    Panicked { reason: String },
}

/// An abstract retrieval operation shared by every worker in a pool.
///
/// Implementations must be cheap to share: the pool wraps the fetcher in an
/// `Arc` and every worker calls it concurrently.
pub trait Fetcher: Send + Sync + 'static {
    /// Retrieves `target`, returning its status code.
    fn fetch(&self, target: &str) -> impl Future<Output = FetchResult> + Send;
}
