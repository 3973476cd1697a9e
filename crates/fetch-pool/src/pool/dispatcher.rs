use crate::{WorkItem, stats::PoolStats};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Producer half of one worker's inbox, tagged with the worker's identifier.
#[derive(Debug)]
pub(crate) struct Inbox {
    #[cfg(feature = "tracing")]
    pub(crate) worker_id: String,
    pub(crate) tx: mpsc::Sender<WorkItem>,
}

/// Moves items from the shared intake queue into worker inboxes.
///
/// The dispatcher is the only owner of the round-robin cursor and of every
/// inbox sender. When the intake queue is closed and drained, [`run`] returns
/// and drops the inbox senders, so workers observe their inboxes closing only
/// after the last item has been assigned.
///
/// [`run`]: Dispatcher::run
pub(crate) struct Dispatcher {
    intake: mpsc::Receiver<WorkItem>,
    inboxes: Vec<Inbox>,
    cursor: usize,
    stats: Arc<PoolStats>,
}

impl Dispatcher {
    pub(crate) fn new(
        intake: mpsc::Receiver<WorkItem>,
        inboxes: Vec<Inbox>,
        stats: Arc<PoolStats>,
    ) -> Self {
        debug_assert!(!inboxes.is_empty(), "dispatcher needs at least one inbox");
        Self {
            intake,
            inboxes,
            cursor: 0,
            stats,
        }
    }

    /// Returns the cursor position for this item and advances it.
    fn next_worker_index(&mut self) -> usize {
        let idx = self.cursor;
        self.cursor = (self.cursor + 1) % self.inboxes.len();
        idx
    }

    /// Dispatch loop.
    ///
    /// Each item goes to the worker under the cursor. A full inbox is not
    /// skipped: the dispatcher waits on that same inbox, which stalls all
    /// dispatch until the slow worker frees a slot.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "dispatcher"))]
    pub(crate) async fn run(mut self) {
        while let Some(item) = self.intake.recv().await {
            let idx = self.next_worker_index();
            let inbox = &self.inboxes[idx];
            #[cfg(feature = "tracing")]
            let task_id = item.id().to_string();

            match inbox.tx.try_send(item) {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Task {task_id} assigned to {}", inbox.worker_id);
                    self.stats.record_dispatched();
                }
                Err(TrySendError::Full(item)) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        "Worker {} is busy, task {} queued",
                        inbox.worker_id,
                        item.id()
                    );
                    self.stats.record_busy_wait();

                    match inbox.tx.send(item).await {
                        Ok(()) => self.stats.record_dispatched(),
                        Err(_e) => {
                            self.stats.record_lost();
                            #[cfg(feature = "tracing")]
                            tracing::error!(
                                "Worker {} inbox closed, task {} lost",
                                inbox.worker_id,
                                _e.0.id()
                            );
                        }
                    }
                }
                Err(TrySendError::Closed(_item)) => {
                    self.stats.record_lost();
                    #[cfg(feature = "tracing")]
                    tracing::error!(
                        "Worker {} inbox closed, task {} lost",
                        inbox.worker_id,
                        _item.id()
                    );
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Intake queue drained, closing {} worker inboxes",
            self.inboxes.len()
        );
    }
}
