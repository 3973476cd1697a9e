use super::telemetry;
use fetch_pool::{Outcome, OutcomeKind, OutcomeSink, Result, TaskQueue, WorkItem};
use std::sync::Arc;

/// Logs every outcome and feeds the success/failure counters.
#[derive(Debug, Default)]
pub struct ReportingSink {
    #[cfg(feature = "tracing")]
    inner: fetch_pool::TracingSink,
}

impl OutcomeSink for ReportingSink {
    fn report(&mut self, outcome: Outcome) {
        match outcome.kind {
            OutcomeKind::Success => telemetry::increment_tasks_succeeded(),
            OutcomeKind::Failure => telemetry::increment_tasks_failed(),
        }

        #[cfg(feature = "tracing")]
        self.inner.report(outcome);
    }
}

/// Counts every item its inner queue accepts.
pub struct MeteredQueue<Q> {
    inner: Arc<Q>,
}

impl<Q> MeteredQueue<Q> {
    pub const fn new(inner: Arc<Q>) -> Self {
        Self { inner }
    }
}

impl<Q: TaskQueue> TaskQueue for MeteredQueue<Q> {
    async fn add_task(&self, item: WorkItem) -> Result<()> {
        self.inner.add_task(item).await?;
        telemetry::increment_tasks_submitted();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetch_pool::Error;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl TaskQueue for Collect {
        async fn add_task(&self, item: WorkItem) -> Result<()> {
            if item.target().is_empty() {
                return Err(Error::ServiceShutdown);
            }
            self.0.lock().await.push(item.id().to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn metered_queue_forwards_results() {
        let inner = Arc::new(Collect::default());
        let queue = MeteredQueue::new(Arc::clone(&inner));

        queue.add_task(WorkItem::new("task-1", "https://a")).await.unwrap();
        assert_eq!(
            queue.add_task(WorkItem::new("task-2", "")).await,
            Err(Error::ServiceShutdown)
        );
        assert_eq!(*inner.0.lock().await, ["task-1"]);
    }

}
