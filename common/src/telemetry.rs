// Telemetry module for structured logging, metrics, and tracing

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "study-planner";

/// Initialize structured logging with JSON formatting and trace context
///
/// `RUST_LOG` wins over `log_level` when set. When `tracing_endpoint` is
/// given, spans are also exported over OTLP.
pub fn init_logging(log_level: &str, tracing_endpoint: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(json_layer);

    if let Some(endpoint) = tracing_endpoint {
        let tracer = init_tracer(endpoint)?;
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        registry
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(
        log_level = log_level,
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
    let tracer = tracer_provider.tracer(SERVICE_NAME);

    tracing::info!(endpoint = endpoint, "OpenTelemetry tracer initialized");
    Ok(tracer)
}

/// Flush remaining spans on shutdown
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Install the Prometheus exporter and describe the planner metrics
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "schedule_runs_total",
        "Schedule distribution runs by trigger and outcome"
    );
    describe_counter!(
        "schedule_items_scheduled_total",
        "Work items given a date by distribution runs"
    );
    describe_counter!(
        "schedule_items_unscheduled_total",
        "Work items left without a date because the day bound was reached"
    );
    describe_histogram!(
        "schedule_run_duration_seconds",
        "Wall time of a distribution run including storage writes"
    );

    tracing::info!(
        metrics_port = metrics_port,
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Record a finished distribution run
#[inline]
pub fn record_schedule_run(
    trigger: &str,
    scheduled: usize,
    unscheduled: usize,
    duration_seconds: f64,
) {
    counter!("schedule_runs_total", "trigger" => trigger.to_string(), "outcome" => "success")
        .increment(1);
    counter!("schedule_items_scheduled_total", "trigger" => trigger.to_string())
        .increment(scheduled as u64);
    counter!("schedule_items_unscheduled_total", "trigger" => trigger.to_string())
        .increment(unscheduled as u64);
    histogram!("schedule_run_duration_seconds", "trigger" => trigger.to_string())
        .record(duration_seconds);
}

/// Record a failed distribution run
#[inline]
pub fn record_schedule_failure(trigger: &str, reason: &'static str, duration_seconds: f64) {
    counter!(
        "schedule_runs_total",
        "trigger" => trigger.to_string(),
        "outcome" => reason
    )
    .increment(1);
    histogram!("schedule_run_duration_seconds", "trigger" => trigger.to_string())
        .record(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_reports_error() {
        // The first call may race another test's subscriber; the second never installs
        let _ = init_logging("info", None);
        assert!(init_logging("debug", None).is_err());
    }

    #[test]
    fn test_metrics_recording_without_exporter() {
        record_schedule_run("generate", 12, 0, 0.02);
        record_schedule_run("recalculate", 3, 2, 0.01);
        record_schedule_failure("recalculate", "no_availability", 0.001);
    }
}
