#![doc = include_str!("../README.md")]

mod daemon;

use clap::Parser;
use daemon::config::{CliArgs, DaemonConfig};
use daemon::input::spawn_stdin_reader;
use daemon::reporting::{MeteredQueue, ReportingSink};
use daemon::telemetry::init_telemetry;
use fetch_pool::{HttpFetcher, TaskProducer, WorkerPool};
use std::sync::Arc;
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DaemonConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let pool = Arc::new(WorkerPool::new(
        config.pool.clone(),
        fetcher,
        ReportingSink::default(),
    )?);
    pool.start()?;

    let producer = Arc::new(TaskProducer::new(Arc::new(MeteredQueue::new(
        Arc::clone(&pool),
    ))));
    let cancel = CancellationToken::new();

    let generator = config.generate.then(|| {
        producer.spawn_random(
            config.targets.clone(),
            config.generate_interval,
            cancel.clone(),
        )
    });
    let reader = if config.stdin {
        Some(spawn_stdin_reader(Arc::clone(&producer), cancel.clone())?)
    } else {
        None
    };

    #[cfg(feature = "tracing")]
    tracing::info!("Application running. Press Ctrl+C to stop...");

    match reader {
        // Stdin is the only source: its end is the end of the run.
        Some(mut reader) if generator.is_none() => {
            let exhausted = tokio::select! {
                () = shutdown_signal() => false,
                _ = &mut reader => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Input exhausted, shutting down...");
                    true
                },
            };
            cancel.cancel();
            if !exhausted {
                await_source("stdin reader", reader).await;
            }
        }
        reader => {
            shutdown_signal().await;
            cancel.cancel();
            if let Some(reader) = reader {
                await_source("stdin reader", reader).await;
            }
        }
    }

    // 1. Producers are done: nothing new reaches the intake queue
    if let Some(generator) = generator {
        await_source("task generator", generator).await;
    }

    // 2. Drain the pool
    let result = pool.stop().await;

    #[cfg(feature = "tracing")]
    {
        let stats = pool.stats();
        tracing::info!(
            "Processed {} tasks: {} succeeded, {} failed, {} outcomes dropped",
            stats.dispatched,
            stats.succeeded,
            stats.failed,
            stats.dropped_outcomes
        );
    }

    // 3. Flush exporters
    providers.shutdown();

    result?;

    #[cfg(feature = "tracing")]
    tracing::info!("Application stopped");
    Ok(())
}

async fn await_source(_task: &str, handle: JoinHandle<()>) {
    if let Err(_e) = handle.await {
        #[cfg(feature = "tracing")]
        tracing::error!("Task {_task} did not exit cleanly: {_e}");
    }
}

fn log_startup_info(_config: &DaemonConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!("Starting fetch pool with full config: {:#?}", _config);
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting fetch pool with {} workers",
            _config.pool.worker_count
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to install SIGTERM handler: {_e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(_e) = signal::ctrl_c().await {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to install Ctrl+C handler: {_e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Shutdown signal received, terminating gracefully...");
}
