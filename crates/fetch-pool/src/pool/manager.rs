//! Pool manager for concurrent fetch work.
//!
//! This module defines [`WorkerPool`], which owns the bounded intake queue,
//! a fixed set of workers with private inboxes, the dispatcher that assigns
//! items round-robin, and the aggregator that reports outcomes.
//!
//! Shutdown is sequenced so that no inbox is closed while the dispatcher may
//! still write to it: the intake queue is closed first, the dispatcher drains
//! it and closes the inboxes itself, workers drain their inboxes, and finally
//! the aggregator drains the outcome channels.

use super::{
    aggregator::{Aggregator, OutcomeSink},
    dispatcher::{Dispatcher, Inbox},
    worker::{OutcomeSenders, Worker},
};
use crate::{
    Error, PoolConfig, Result, WorkItem,
    fetch::Fetcher,
    stats::{PoolStats, StatsSnapshot},
};
use core::{future::Future, mem};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

/// Anything that accepts work items on behalf of a pool.
///
/// Producers depend on this trait rather than on [`WorkerPool`] directly so
/// they can be exercised against a plain queue.
pub trait TaskQueue: Send + Sync + 'static {
    /// Enqueues `item`, waiting while the queue is full.
    fn add_task(&self, item: WorkItem) -> impl Future<Output = Result<()>> + Send;
}

/// Tasks and channels before `start()`.
struct Idle<F, S> {
    dispatcher: Dispatcher,
    workers: Vec<Worker<F>>,
    aggregator: Aggregator<S>,
}

/// Join handles of a started pool.
struct Running {
    dispatcher: JoinHandle<()>,
    workers: Vec<(String, JoinHandle<()>)>,
    aggregator: JoinHandle<()>,
}

enum PoolState<F, S> {
    Idle(Idle<F, S>),
    Running(Running),
    Stopped,
}

/// A fixed-size pool of fetch workers fed through a bounded intake queue.
///
/// The pool is built stopped. [`start`](WorkerPool::start) spawns one task per
/// worker plus the dispatcher and the aggregator on the current Tokio runtime.
/// [`add_task`](WorkerPool::add_task) may be called concurrently from any
/// number of producers. [`stop`](WorkerPool::stop) drains all queued work
/// before returning.
pub struct WorkerPool<F, S> {
    config: PoolConfig,
    worker_ids: Vec<String>,
    intake: Mutex<Option<mpsc::Sender<WorkItem>>>,
    state: Mutex<PoolState<F, S>>,
    stats: Arc<PoolStats>,
}

impl<F: Fetcher, S: OutcomeSink> WorkerPool<F, S> {
    /// Builds a pool: `worker_count` workers with their inboxes, the intake
    /// queue and both outcome channels. No task runs until `start()`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation.
    pub fn new(config: PoolConfig, fetcher: F, sink: S) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(PoolStats::default());
        let fetcher = Arc::new(fetcher);
        let (intake_tx, intake_rx) = mpsc::channel(config.effective_intake_capacity());
        let (success_tx, success_rx) = mpsc::channel(config.outcome_capacity);
        let (failure_tx, failure_rx) = mpsc::channel(config.outcome_capacity);
        let outcomes = OutcomeSenders {
            success: success_tx,
            failure: failure_tx,
        };

        let mut worker_ids = Vec::with_capacity(config.worker_count);
        let mut inboxes = Vec::with_capacity(config.worker_count);
        let mut workers = Vec::with_capacity(config.worker_count);

        for index in 0..config.worker_count {
            let worker_id = config.worker_name(index);
            let (tx, rx) = mpsc::channel(config.inbox_capacity);

            inboxes.push(Inbox {
                #[cfg(feature = "tracing")]
                worker_id: worker_id.clone(),
                tx,
            });
            workers.push(Worker::new(
                worker_id.clone(),
                rx,
                Arc::clone(&fetcher),
                outcomes.clone(),
                Arc::clone(&stats),
            ));
            worker_ids.push(worker_id);
        }
        // Only workers hold outcome senders from here on, so the aggregator
        // sees both channels close once the last worker exits.
        drop(outcomes);

        let idle = Idle {
            dispatcher: Dispatcher::new(intake_rx, inboxes, Arc::clone(&stats)),
            workers,
            aggregator: Aggregator::new(success_rx, failure_rx, sink),
        };

        Ok(Self {
            config,
            worker_ids,
            intake: Mutex::new(Some(intake_tx)),
            state: Mutex::new(PoolState::Idle(idle)),
            stats,
        })
    }

    /// Spawns every worker, the dispatcher and the aggregator.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if the pool is running.
    /// - [`Error::ServiceShutdown`] if the pool was stopped.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        let idle = match mem::replace(&mut *state, PoolState::Stopped) {
            PoolState::Idle(idle) => idle,
            PoolState::Running(running) => {
                *state = PoolState::Running(running);
                return Err(Error::AlreadyStarted);
            }
            PoolState::Stopped => return Err(Error::ServiceShutdown),
        };

        let Idle {
            dispatcher,
            workers,
            aggregator,
        } = idle;

        #[cfg(feature = "tracing")]
        tracing::info!("Starting worker pool with {} workers", workers.len());

        let workers = workers
            .into_iter()
            .map(|worker| {
                let id = worker.id().to_string();
                (id, tokio::spawn(worker.run()))
            })
            .collect();
        let dispatcher = tokio::spawn(dispatcher.run());
        let aggregator = tokio::spawn(async move {
            aggregator.run().await;
        });

        *state = PoolState::Running(Running {
            dispatcher,
            workers,
            aggregator,
        });
        Ok(())
    }

    /// Gracefully stops the pool.
    ///
    /// - Closes the intake queue; later `add_task` calls fail.
    /// - Waits for the dispatcher to assign everything already queued. The
    ///   dispatcher closes the worker inboxes on exit.
    /// - Waits for every worker to drain its inbox and exit.
    /// - Waits for the aggregator to report every delivered outcome.
    ///
    /// In-flight fetches are never interrupted. Stopping a pool that was never
    /// started discards queued items. Stopping twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskJoin`] if any pool task panicked. All other tasks
    /// are still awaited first.
    pub async fn stop(&self) -> Result<()> {
        // === Phase 0: Stop accepting new work ===
        #[cfg(feature = "tracing")]
        tracing::info!("Closing intake queue");
        drop(self.intake.lock().take());

        let running = match mem::replace(&mut *self.state.lock(), PoolState::Stopped) {
            PoolState::Running(running) => running,
            PoolState::Idle(_idle) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker pool stopped before it was started");
                return Ok(());
            }
            PoolState::Stopped => return Ok(()),
        };

        let mut first_error = None;

        // === Phase 1: Dispatcher drains intake, then closes inboxes ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Waiting for dispatcher to drain the intake queue");
        if let Err(e) = running.dispatcher.await {
            record_join_error(&mut first_error, "dispatcher", &e);
        }

        // === Phase 2: Workers drain their inboxes ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Waiting for {} workers to drain", running.workers.len());
        let (names, handles): (Vec<_>, Vec<_>) = running.workers.into_iter().unzip();
        let results = futures::future::join_all(handles).await;
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {name} exited");
                }
                Err(e) => record_join_error(&mut first_error, name, &e),
            }
        }

        // === Phase 3: Aggregator drains outcome channels ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Waiting for aggregator to drain outcomes");
        if let Err(e) = running.aggregator.await {
            record_join_error(&mut first_error, "aggregator", &e);
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool stopped");

        first_error.map_or(Ok(()), Err)
    }
}

impl<F, S> WorkerPool<F, S> {
    /// Enqueues a work item, waiting while the intake queue is full.
    ///
    /// Items may be queued before `start()`; they are dispatched once the
    /// pool runs.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if `stop()` has been called.
    /// - [`Error::ChannelError`] if the dispatcher is gone.
    pub async fn add_task(&self, item: WorkItem) -> Result<()> {
        let intake = self.intake.lock().clone().ok_or(Error::ServiceShutdown)?;

        intake.send(item).await.map_err(|e| Error::ChannelError {
            context: format!("intake queue closed, task {} rejected", e.0.id()),
        })?;
        self.stats.record_submitted();
        Ok(())
    }

    /// Identifiers of the workers, in cursor order.
    pub fn worker_ids(&self) -> &[String] {
        &self.worker_ids
    }

    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether `start()` succeeded and `stop()` has not been called yet.
    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), PoolState::Running(_))
    }
}

impl<F, S> TaskQueue for WorkerPool<F, S>
where
    F: Send + Sync + 'static,
    S: Send + 'static,
{
    fn add_task(&self, item: WorkItem) -> impl Future<Output = Result<()>> + Send {
        WorkerPool::add_task(self, item)
    }
}

fn record_join_error(slot: &mut Option<Error>, task: &str, e: &tokio::task::JoinError) {
    #[cfg(feature = "tracing")]
    tracing::error!("Task {task} did not exit cleanly: {e}");

    slot.get_or_insert_with(|| Error::TaskJoin {
        task: task.to_string(),
        reason: e.to_string(),
    });
}
