//! # Telemetry
//!
//! Structured logging is always on: `tracing` events are rendered by a
//! `tracing_subscriber::fmt` layer filtered through `RUST_LOG` (default
//! `info`).
//!
//! ## Feature matrix
//!
//! - `metrics`: Enables OpenTelemetry metrics (counters, histograms) exported
//!   periodically to stdout.
//!
//! Without `metrics`, every recording helper in this module compiles to a
//! no-op, so call sites never need to be feature-gated.
//!
//! ```bash
//! cargo run --features metrics
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "metrics")]
use opentelemetry::{
    InstrumentationScope, KeyValue,
    metrics::{Counter, Histogram, Meter, UpDownCounter},
};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::{Resource, metrics as sdkmetrics};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

pub struct TelemetryProviders {
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes and stops exporters. Called once during shutdown.
    pub fn shutdown(&self) {
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

    #[cfg(feature = "metrics")]
    let meter_provider = {
        let meter_provider = init_metrics();
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let scope = InstrumentationScope::builder("carstream")
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        init_metric_handles(opentelemetry::global::meter_with_scope(scope));
        meter_provider
    };

    Ok(TelemetryProviders {
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let exporter = opentelemetry_stdout::MetricExporter::default();
    let reader = sdkmetrics::PeriodicReader::builder(exporter)
        .with_interval(std::time::Duration::from_secs(5))
        .build();

    sdkmetrics::SdkMeterProvider::builder()
        .with_resource(Resource::builder().with_service_name("carstream").build())
        .with_reader(reader)
        .build()
}

#[cfg(feature = "metrics")]
static REQUESTS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static STREAMS_INFLIGHT: OnceLock<UpDownCounter<i64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static STREAM_ERRORS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static STREAM_DURATION_MS: OnceLock<Histogram<f64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RECORDS_DELIVERED: OnceLock<Counter<u64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = REQUESTS.set(
        meter
            .u64_counter("requests")
            .with_description("Requests per delivery mode")
            .build(),
    );

    let _ = STREAMS_INFLIGHT.set(
        meter
            .i64_up_down_counter("streams_inflight")
            .with_description("Subscriptions currently emitting")
            .build(),
    );

    let _ = STREAM_ERRORS.set(
        meter
            .u64_counter("errors")
            .with_description("Subscriptions ended by a source fault or a broken sink")
            .build(),
    );

    let _ = STREAM_DURATION_MS.set(
        meter
            .f64_histogram("stream_duration")
            .with_unit("ms")
            .with_description("Subscription start to terminal signal")
            .build(),
    );

    let _ = RECORDS_DELIVERED.set(
        meter
            .u64_counter("records_delivered")
            .with_description("Cars handed to clients")
            .build(),
    );
}

#[cfg(feature = "metrics")]
pub fn increment_requests(mode: &'static str) {
    if let Some(counter) = REQUESTS.get() {
        counter.add(1, &[KeyValue::new("mode", mode)]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_requests(_mode: &'static str) {}

#[cfg(feature = "metrics")]
pub fn increment_streams_inflight() {
    if let Some(counter) = STREAMS_INFLIGHT.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_streams_inflight() {}

#[cfg(feature = "metrics")]
pub fn decrement_streams_inflight() {
    if let Some(counter) = STREAMS_INFLIGHT.get() {
        counter.add(-1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn decrement_streams_inflight() {}

#[cfg(feature = "metrics")]
pub fn increment_stream_errors() {
    if let Some(counter) = STREAM_ERRORS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_stream_errors() {}

#[cfg(feature = "metrics")]
pub fn record_stream_duration(duration_ms: f64) {
    if let Some(histogram) = STREAM_DURATION_MS.get() {
        histogram.record(duration_ms, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_stream_duration(_duration_ms: f64) {}

#[cfg(feature = "metrics")]
pub fn increment_records_delivered(count: u64) {
    if let Some(counter) = RECORDS_DELIVERED.get() {
        counter.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_records_delivered(_count: u64) {}
