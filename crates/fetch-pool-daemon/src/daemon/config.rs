use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use fetch_pool::{
    DEFAULT_INBOX_CAPACITY, DEFAULT_INTAKE_CAPACITY, DEFAULT_OUTCOME_CAPACITY,
    DEFAULT_WORKER_COUNT, DEFAULT_WORKER_NAME_PREFIX, PoolConfig,
};

/// Targets the random generator picks from when `TARGETS` is not set.
pub const DEFAULT_TARGETS: &[&str] = &[
    "https://httpbin.org/status/200",
    "https://httpbin.org/status/404",
    "https://httpbin.org/status/500",
    "https://httpbin.org/delay/2",
    "https://httpbin.org/delay/1",
    "https://jsonplaceholder.typicode.com/posts/1",
    "https://jsonplaceholder.typicode.com/users/1",
    "https://www.google.com",
    "https://httpbin.org/status/201",
    "https://httpbin.org/status/301",
    "https://httpbin.org/timeout",
    "https://httpbin.org/get",
];

/// Runtime configuration for the `fetch-pool` binary.
///
/// Every value can come from a flag or from the environment (a `.env` file
/// is loaded first). Defaults match the library's [`PoolConfig::default`].
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fetch-pool",
    version,
    about = "Fetches URLs concurrently through a bounded round-robin worker pool"
)]
pub struct CliArgs {
    /// Number of workers, each with its own inbox.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_WORKER_COUNT)]
    pub num_workers: usize,

    /// Capacity of the shared intake queue. Producers wait while it is full.
    ///
    /// Environment variable: `TASK_QUEUE_BUFFER`
    #[arg(long, env = "TASK_QUEUE_BUFFER", default_value_t = DEFAULT_INTAKE_CAPACITY)]
    pub task_queue_buffer: usize,

    /// Workers are named `<prefix>-1` through `<prefix>-N`.
    ///
    /// Environment variable: `WORKER_NAME_PREFIX`
    #[arg(long, env = "WORKER_NAME_PREFIX", default_value_t = String::from(DEFAULT_WORKER_NAME_PREFIX))]
    pub worker_name_prefix: String,

    /// Capacity of each worker's inbox.
    ///
    /// A full inbox stalls the dispatcher until that worker catches up.
    ///
    /// Environment variable: `INBOX_BUFFER`
    #[arg(long, env = "INBOX_BUFFER", default_value_t = DEFAULT_INBOX_CAPACITY)]
    pub inbox_buffer: usize,

    /// Capacity of each outcome channel. Outcomes beyond it are dropped.
    ///
    /// Environment variable: `OUTCOME_BUFFER`
    #[arg(long, env = "OUTCOME_BUFFER", default_value_t = DEFAULT_OUTCOME_CAPACITY)]
    pub outcome_buffer: usize,

    /// Per-request timeout in seconds, connection included.
    ///
    /// Environment variable: `FETCH_TIMEOUT_SECS`
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Delay between two generated tasks, in milliseconds.
    ///
    /// Environment variable: `GENERATE_INTERVAL_MS`
    #[arg(long, env = "GENERATE_INTERVAL_MS", default_value_t = 1000)]
    pub generate_interval_ms: u64,

    /// Comma-separated targets for the random generator.
    ///
    /// Environment variable: `TARGETS`
    #[arg(long, env = "TARGETS", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Do not generate random tasks.
    #[arg(long, default_value_t = false)]
    pub no_generate: bool,

    /// Read one target per line from stdin and submit each as a task.
    #[arg(long, default_value_t = false)]
    pub stdin: bool,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub pool: PoolConfig,
    pub fetch_timeout: Duration,
    pub generate_interval: Duration,
    pub targets: Vec<String>,
    pub generate: bool,
    pub stdin: bool,
}

impl TryFrom<CliArgs> for DaemonConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }
        if args.inbox_buffer == 0 {
            bail!("INBOX_BUFFER must be greater than 0");
        }
        if args.outcome_buffer == 0 {
            bail!("OUTCOME_BUFFER must be greater than 0");
        }
        if args.fetch_timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be greater than 0");
        }
        if args.generate_interval_ms == 0 {
            bail!("GENERATE_INTERVAL_MS must be greater than 0");
        }
        if args.no_generate && !args.stdin {
            bail!("--no-generate requires --stdin, otherwise no task is ever submitted");
        }

        let targets: Vec<String> = args
            .targets
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let targets = if targets.is_empty() {
            DEFAULT_TARGETS.iter().map(|t| (*t).to_string()).collect()
        } else {
            targets
        };

        let pool = PoolConfig::default()
            .with_worker_count(args.num_workers)
            .with_intake_capacity(args.task_queue_buffer)
            .with_worker_name_prefix(args.worker_name_prefix)
            .with_inbox_capacity(args.inbox_buffer)
            .with_outcome_capacity(args.outcome_buffer);
        pool.validate()?;

        Ok(Self {
            pool,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
            generate_interval: Duration::from_millis(args.generate_interval_ms),
            targets,
            generate: !args.no_generate,
            stdin: args.stdin,
        })
    }
}
