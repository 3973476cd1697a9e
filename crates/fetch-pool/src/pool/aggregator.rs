use crate::outcome::{Outcome, OutcomeKind};
use tokio::sync::mpsc;

/// Destination for every outcome the aggregator receives.
///
/// The aggregator calls [`OutcomeSink::report`] once per delivered outcome,
/// from a single task, so implementations need no internal synchronization.
pub trait OutcomeSink: Send + 'static {
    fn report(&mut self, outcome: Outcome);
}

/// Forwards outcomes to another task. Send failures are ignored: a dropped
/// receiver simply means nobody is listening anymore.
impl OutcomeSink for mpsc::UnboundedSender<Outcome> {
    fn report(&mut self, outcome: Outcome) {
        let _ = self.send(outcome);
    }
}

/// Reports outcomes as `tracing` events.
#[cfg(feature = "tracing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl OutcomeSink for TracingSink {
    fn report(&mut self, outcome: Outcome) {
        match outcome.kind {
            OutcomeKind::Success => tracing::info!("Task {} completed successfully", outcome.id),
            OutcomeKind::Failure => tracing::warn!("Task {} completed with failure", outcome.id),
        }
    }
}

/// Merges the success and failure channels into one [`OutcomeSink`].
pub(crate) struct Aggregator<S> {
    success: mpsc::Receiver<String>,
    failure: mpsc::Receiver<String>,
    sink: S,
}

impl<S: OutcomeSink> Aggregator<S> {
    pub(crate) const fn new(
        success: mpsc::Receiver<String>,
        failure: mpsc::Receiver<String>,
        sink: S,
    ) -> Self {
        Self {
            success,
            failure,
            sink,
        }
    }

    /// Aggregation loop.
    ///
    /// Takes whichever channel is ready first. A channel that reports closed
    /// is no longer polled; the loop ends once both are closed and drained,
    /// i.e. once every worker has exited.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "aggregator"))]
    pub(crate) async fn run(mut self) -> S {
        let mut success_open = true;
        let mut failure_open = true;

        while success_open || failure_open {
            tokio::select! {
                msg = self.success.recv(), if success_open => match msg {
                    Some(id) => self.sink.report(Outcome { id, kind: OutcomeKind::Success }),
                    None => success_open = false,
                },
                msg = self.failure.recv(), if failure_open => match msg {
                    Some(id) => self.sink.report(Outcome { id, kind: OutcomeKind::Failure }),
                    None => failure_open = false,
                },
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Outcome channels closed, aggregator stopped");

        self.sink
    }
}
