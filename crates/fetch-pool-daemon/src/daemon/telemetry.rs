//! # Telemetry
//!
//! Console logging is always installed through `tracing_subscriber::fmt`.
//! Whether the pool emits anything depends on the `tracing` feature, which is
//! forwarded to `fetch-pool`.
//!
//! ## Feature matrix
//!
//! - `tracing` (default): log events from the pool, the producer and the
//!   daemon.
//! - `metrics`: OpenTelemetry counters for submitted, succeeded and failed
//!   tasks.
//! - `stdout`: periodic export of those counters to stdout.
//!
//! Without `metrics` the counter helpers compile to no-ops.
//!
//! ```bash
//! cargo run -p fetch-pool-daemon --features metrics,stdout
//! ```

#[cfg(all(feature = "stdout", not(feature = "metrics")))]
compile_error!("The 'stdout' feature requires 'metrics' to be enabled.");

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "metrics")]
use opentelemetry::{
    InstrumentationScope, KeyValue,
    metrics::{Counter, Meter},
};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::{Resource, metrics as sdkmetrics};
#[cfg(feature = "metrics")]
use opentelemetry_semantic_conventions as semvcns;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

pub struct TelemetryProviders {
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes and shuts down exporters. Errors go to stderr since the
    /// subscriber may already be unusable at this point.
    pub fn shutdown(self) {
        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {err:#?}");
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {err:#?}");
            }
        }
    }
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "metrics")]
    let meter_provider = {
        let provider = init_metrics();
        opentelemetry::global::set_meter_provider(provider.clone());

        let scope = InstrumentationScope::builder("fetch-pool")
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_schema_url(semvcns::SCHEMA_URL)
            .build();
        init_metric_handles(opentelemetry::global::meter_with_scope(scope));
        provider
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;

    Ok(TelemetryProviders {
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(feature = "metrics")]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name("fetch-pool")
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = sdkmetrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

#[cfg(feature = "metrics")]
static TASKS_SUBMITTED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static TASKS_SUCCEEDED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static TASKS_FAILED: OnceLock<Counter<u64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = TASKS_SUBMITTED.set(
        meter
            .u64_counter("tasks_submitted")
            .with_description("Tasks accepted by the pool")
            .build(),
    );

    let _ = TASKS_SUCCEEDED.set(
        meter
            .u64_counter("tasks_succeeded")
            .with_description("Tasks reported on the success channel")
            .build(),
    );

    let _ = TASKS_FAILED.set(
        meter
            .u64_counter("tasks_failed")
            .with_description("Tasks reported on the failure channel")
            .build(),
    );
}

#[cfg(feature = "metrics")]
pub fn increment_tasks_submitted() {
    if let Some(counter) = TASKS_SUBMITTED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_tasks_submitted() {}

#[cfg(feature = "metrics")]
pub fn increment_tasks_succeeded() {
    if let Some(counter) = TASKS_SUCCEEDED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_tasks_succeeded() {}

#[cfg(feature = "metrics")]
pub fn increment_tasks_failed() {
    if let Some(counter) = TASKS_FAILED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_tasks_failed() {}
