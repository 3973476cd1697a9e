use crate::{
    WorkItem,
    fetch::{FetchError, Fetcher},
    outcome::{OutcomeKind, classify},
    stats::PoolStats,
};
use core::{any::Any, panic::AssertUnwindSafe};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Producer halves of the two outcome channels shared by every worker.
#[derive(Debug, Clone)]
pub(crate) struct OutcomeSenders {
    pub(crate) success: mpsc::Sender<String>,
    pub(crate) failure: mpsc::Sender<String>,
}

impl OutcomeSenders {
    /// Reports `id` without waiting.
    ///
    /// A full channel drops the outcome: notification is at-most-once and the
    /// worker is never held back by a slow aggregator. Returns whether the
    /// outcome was delivered.
    pub(crate) fn try_report(&self, id: String, kind: OutcomeKind, stats: &PoolStats) -> bool {
        let channel = match kind {
            OutcomeKind::Success => &self.success,
            OutcomeKind::Failure => &self.failure,
        };

        match channel.try_send(id) {
            Ok(()) => true,
            Err(TrySendError::Full(_id)) => {
                stats.record_dropped_outcome();
                #[cfg(feature = "tracing")]
                tracing::warn!("{kind} channel full for task {_id}");
                false
            }
            Err(TrySendError::Closed(_id)) => {
                stats.record_dropped_outcome();
                #[cfg(feature = "tracing")]
                tracing::error!("{kind} channel closed, outcome for task {_id} lost");
                false
            }
        }
    }
}

/// A worker owning one private inbox.
///
/// Each worker processes its inbox strictly in arrival order, one item at a
/// time. It runs until the inbox is closed and drained, which happens once
/// the dispatcher has exited.
pub(crate) struct Worker<F> {
    id: String,
    inbox: mpsc::Receiver<WorkItem>,
    fetcher: Arc<F>,
    outcomes: OutcomeSenders,
    stats: Arc<PoolStats>,
}

impl<F: Fetcher> Worker<F> {
    pub(crate) const fn new(
        id: String,
        inbox: mpsc::Receiver<WorkItem>,
        fetcher: Arc<F>,
        outcomes: OutcomeSenders,
        stats: Arc<PoolStats>,
    ) -> Self {
        Self {
            id,
            inbox,
            fetcher,
            outcomes,
            stats,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Worker loop. Returning drops this worker's outcome senders, which lets
    /// the aggregator terminate once every worker is done.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(worker = %self.id)))]
    pub(crate) async fn run(self) {
        let Self {
            id,
            mut inbox,
            fetcher,
            outcomes,
            stats,
        } = self;

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {id} started");

        while let Some(item) = inbox.recv().await {
            process_item(&id, item, fetcher.as_ref(), &outcomes, &stats).await;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {id} stopped");
    }
}

/// Fetches one item, classifies the result and reports it.
async fn process_item<F: Fetcher>(
    _worker_id: &str,
    item: WorkItem,
    fetcher: &F,
    outcomes: &OutcomeSenders,
    stats: &PoolStats,
) {
    // A fetcher panic counts as a failure; the worker keeps running.
    let result = AssertUnwindSafe(async { fetcher.fetch(item.target()).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(FetchError::Panicked {
                reason: panic_reason(payload.as_ref()),
            })
        });

    let kind = match classify(result) {
        Ok(_status) => {
            stats.record_succeeded();
            #[cfg(feature = "tracing")]
            tracing::trace!(
                "Worker {_worker_id}: task {} fetched {} ({_status})",
                item.id(),
                item.target()
            );
            OutcomeKind::Success
        }
        Err(_cause) => {
            stats.record_failed();
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Worker {_worker_id}: task {} failed for {}: {_cause}",
                item.id(),
                item.target()
            );
            OutcomeKind::Failure
        }
    };

    outcomes.try_report(item.into_id(), kind, stats);
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
