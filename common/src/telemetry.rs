// Telemetry module for structured logging, metrics, and tracing

use crate::config::LogFormat;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE_NAME: &str = "clinic-directory";

/// Initialize structured logging
///
/// - `RUST_LOG` wins over `log_level` when set
/// - `LogFormat::Json` emits one JSON object per event with span context
/// - spans are exported over OTLP when `tracing_endpoint` is given
#[tracing::instrument(skip_all)]
pub fn init_logging(
    log_level: &str,
    format: LogFormat,
    tracing_endpoint: Option<&str>,
) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let (json_layer, pretty_layer) = match format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        LogFormat::Pretty => (None, Some(fmt::layer().with_target(false))),
    };

    let telemetry_layer = match tracing_endpoint {
        Some(endpoint) => Some(tracing_opentelemetry::layer().with_tracer(init_tracer(endpoint)?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(telemetry_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(
        log_level = log_level,
        format = ?format,
        tracing_endpoint = tracing_endpoint,
        "Structured logging initialized"
    );

    Ok(())
}

/// Initialize OpenTelemetry tracer with OTLP exporter
fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", SERVICE_NAME),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());

    Ok(tracer_provider.tracer(SERVICE_NAME))
}

/// Flush and shut down the OTLP exporter, if one was installed
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Register descriptions for every metric this service emits.
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        "directory_queries_total",
        "Listing queries received, by entity and whether a filter was given"
    );
    describe_counter!(
        "directory_query_failures_total",
        "Listing queries that failed, by entity and reason"
    );
    describe_histogram!(
        "directory_query_duration_seconds",
        "Time spent executing listing queries against the store"
    );
    describe_gauge!(
        "directory_store_connected",
        "1 while the store connection is healthy, 0 otherwise"
    );
}

#[inline]
pub fn record_query(entity: &'static str, filtered: bool) {
    counter!(
        "directory_queries_total",
        "entity" => entity,
        "filtered" => if filtered { "true" } else { "false" }
    )
    .increment(1);
}

#[inline]
pub fn record_query_failure(entity: &'static str, reason: &'static str) {
    counter!(
        "directory_query_failures_total",
        "entity" => entity,
        "reason" => reason
    )
    .increment(1);
}

#[inline]
pub fn record_query_duration(entity: &'static str, duration_seconds: f64) {
    histogram!("directory_query_duration_seconds", "entity" => entity).record(duration_seconds);
}

#[inline]
pub fn set_store_connected(connected: bool) {
    gauge!("directory_store_connected").set(if connected { 1.0 } else { 0.0 });
}
