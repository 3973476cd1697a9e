use crate::{Error, Result, TaskQueue, WorkItem};
use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Turns bare targets into [`WorkItem`]s and submits them to a queue.
///
/// The producer owns the task counter: identifiers are `task-1`, `task-2`,
/// ... in issue order, shared between [`process_url`] and the random
/// generator. The queue is injected, so any [`TaskQueue`] works, a
/// [`WorkerPool`](crate::WorkerPool) being the usual one.
///
/// [`process_url`]: TaskProducer::process_url
pub struct TaskProducer<Q> {
    queue: Arc<Q>,
    counter: AtomicU64,
}

impl<Q: TaskQueue> TaskProducer<Q> {
    pub fn new(queue: Arc<Q>) -> Self {
        Self {
            queue,
            counter: AtomicU64::new(0),
        }
    }

    /// Number of identifiers issued so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    fn next_item(&self, target: impl Into<String>) -> WorkItem {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        WorkItem::new(format!("task-{n}"), target)
    }

    /// Wraps `target` in a new item and submits it, waiting while the queue
    /// is full. Returns the identifier assigned to the item.
    ///
    /// # Errors
    ///
    /// Propagates the queue's error; the identifier is consumed either way.
    pub async fn process_url(&self, target: impl Into<String>) -> Result<String> {
        let item = self.next_item(target);
        let id = item.id().to_string();

        #[cfg(feature = "tracing")]
        tracing::info!("Processing new task: {id} for URL: {}", item.target());

        self.queue.add_task(item).await?;
        Ok(id)
    }

    /// Spawns a generator that submits one item per `interval`, each aimed at
    /// a target picked uniformly from `targets`.
    ///
    /// The first item is produced one full interval after the call. The
    /// generator stops when `cancel` fires, when the queue reports
    /// [`Error::ServiceShutdown`], or right away if `targets` is empty.
    pub fn spawn_random(
        self: &Arc<Self>,
        targets: Vec<String>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let producer = Arc::clone(self);
        tokio::spawn(async move {
            if targets.is_empty() {
                #[cfg(feature = "tracing")]
                tracing::warn!("No targets configured, random generation disabled");
                return;
            }

            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(target) = targets.choose(&mut rand::rng()).cloned() else {
                    break;
                };
                let item = producer.next_item(target);

                #[cfg(feature = "tracing")]
                tracing::info!("Generated random task: {} for URL: {}", item.id(), item.target());

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    res = producer.queue.add_task(item) => match res {
                        Ok(()) => {}
                        Err(Error::ServiceShutdown) => break,
                        Err(_e) => {
                            #[cfg(feature = "tracing")]
                            tracing::error!("Failed to submit generated task: {_e}");
                        }
                    },
                }
            }

            #[cfg(feature = "tracing")]
            tracing::info!("Random task generation stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OutcomeKind, PoolConfig, WorkerPool, fetch::mock::MockFetcher};
    use core::future::Future;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    /// Records submissions; rejects everything once closed.
    #[derive(Default)]
    struct RecordingQueue {
        items: Mutex<Vec<WorkItem>>,
        closed: Mutex<bool>,
    }

    impl RecordingQueue {
        fn ids(&self) -> Vec<String> {
            self.items.lock().iter().map(|i| i.id().to_string()).collect()
        }

        fn close(&self) {
            *self.closed.lock() = true;
        }
    }

    impl TaskQueue for RecordingQueue {
        fn add_task(&self, item: WorkItem) -> impl Future<Output = Result<()>> + Send {
            let res = if *self.closed.lock() {
                Err(Error::ServiceShutdown)
            } else {
                self.items.lock().push(item);
                Ok(())
            };
            core::future::ready(res)
        }
    }

    #[tokio::test]
    async fn process_url_issues_sequential_ids() {
        let queue = Arc::new(RecordingQueue::default());
        let producer = TaskProducer::new(Arc::clone(&queue));

        assert_eq!(producer.process_url("https://a").await.unwrap(), "task-1");
        assert_eq!(producer.process_url("https://b").await.unwrap(), "task-2");

        assert_eq!(queue.ids(), ["task-1", "task-2"]);
        assert_eq!(queue.items.lock()[1].target(), "https://b");
        assert_eq!(producer.issued(), 2);
    }

    #[tokio::test]
    async fn process_url_propagates_queue_errors() {
        let queue = Arc::new(RecordingQueue::default());
        let producer = TaskProducer::new(Arc::clone(&queue));
        queue.close();

        assert_eq!(
            producer.process_url("https://a").await,
            Err(Error::ServiceShutdown)
        );
        assert_eq!(producer.process_url("https://b").await, Err(Error::ServiceShutdown));
        assert_eq!(producer.issued(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn random_generation_ticks_until_cancelled() {
        let queue = Arc::new(RecordingQueue::default());
        let producer = Arc::new(TaskProducer::new(Arc::clone(&queue)));
        let targets = vec!["https://a".to_string(), "https://b".to_string()];
        let cancel = CancellationToken::new();

        let handle = producer.spawn_random(targets.clone(), Duration::from_secs(1), cancel.clone());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(queue.ids(), ["task-1", "task-2", "task-3"]);
        assert!(
            queue
                .items
                .lock()
                .iter()
                .all(|item| targets.iter().any(|t| t == item.target()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn random_generation_shares_the_counter() {
        let queue = Arc::new(RecordingQueue::default());
        let producer = Arc::new(TaskProducer::new(Arc::clone(&queue)));
        let cancel = CancellationToken::new();

        producer.process_url("https://manual").await.unwrap();
        let handle = producer.spawn_random(
            vec!["https://a".to_string()],
            Duration::from_secs(1),
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(queue.ids(), ["task-1", "task-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn random_generation_stops_on_shutdown() {
        let queue = Arc::new(RecordingQueue::default());
        let producer = Arc::new(TaskProducer::new(Arc::clone(&queue)));
        queue.close();

        let handle = producer.spawn_random(
            vec!["https://a".to_string()],
            Duration::from_secs(1),
            CancellationToken::new(),
        );
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn empty_target_list_exits_immediately() {
        let queue = Arc::new(RecordingQueue::default());
        let producer = Arc::new(TaskProducer::new(queue));

        let handle = producer.spawn_random(Vec::new(), Duration::from_secs(1), CancellationToken::new());
        handle.await.unwrap();
        assert_eq!(producer.issued(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn feeds_a_worker_pool() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = MockFetcher::new().with_status("https://missing", 404);
        let pool = Arc::new(WorkerPool::new(PoolConfig::default(), fetcher, tx).unwrap());
        let producer = TaskProducer::new(Arc::clone(&pool));
        pool.start().unwrap();

        producer.process_url("https://ok").await.unwrap();
        producer.process_url("https://missing").await.unwrap();
        pool.stop().await.unwrap();

        let mut outcomes = Vec::new();
        while let Ok(outcome) = rx.try_recv() {
            outcomes.push((outcome.id, outcome.kind));
        }
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            outcomes,
            [
                ("task-1".to_string(), OutcomeKind::Success),
                ("task-2".to_string(), OutcomeKind::Failure),
            ]
        );
    }
}
