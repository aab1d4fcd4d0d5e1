//! Tracer provider setup and shutdown-bound lifecycle.

use opentelemetry::trace::noop::NoopTracerProvider;
use opentelemetry::{KeyValue, global, propagation::TextMapCompositePropagator};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{BatchSpanProcessor, Sampler, SdkTracerProvider};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::TelemetryConfig;
use crate::error::SetupError;
use crate::exporter::{ExporterHandle, create_exporter};

/// Initialise global tracing for this process.
///
/// Loads the cached [`TelemetryConfig`] snapshot, builds the exporter and
/// tracer provider, installs them globally, and spawns a background task
/// that flushes and shuts the provider down when `shutdown` is cancelled.
///
/// Returns [`SetupError::Cancelled`] without building anything if the token
/// is already cancelled. When the SDK is disabled a no-op provider is
/// installed and no exporter, resource, or propagator is constructed.
///
/// Must be called from within a tokio runtime: the shutdown waiter is
/// spawned onto the current runtime.
pub fn setup_tracing(shutdown: &CancellationToken) -> Result<(), SetupError> {
    if shutdown.is_cancelled() {
        return Err(SetupError::Cancelled);
    }
    let config = TelemetryConfig::load();
    setup_with_config(&config, shutdown)
}

/// [`setup_tracing`] with an explicit configuration snapshot. Same runtime
/// requirement.
pub fn setup_with_config(
    config: &TelemetryConfig,
    shutdown: &CancellationToken,
) -> Result<(), SetupError> {
    if shutdown.is_cancelled() {
        return Err(SetupError::Cancelled);
    }

    if config.disabled {
        global::set_tracer_provider(NoopTracerProvider::new());
        tracing::info!("opentelemetry sdk disabled, using no-op tracer provider");
        return Ok(());
    }

    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    let exporter = create_exporter(config)?;
    let provider = build_tracer_provider(config, exporter);
    global::set_tracer_provider(provider.clone());

    tracing::info!(
        service.name = %config.service_name,
        service.version = %config.service_version,
        environment = %config.environment,
        endpoint = %if config.endpoint.is_empty() { "stdout" } else { &config.endpoint },
        "opentelemetry tracing initialised"
    );

    spawn_shutdown_waiter(provider, shutdown.clone());
    Ok(())
}

fn build_resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("deployment.environment", config.environment.clone()),
        ])
        .build()
}

fn build_tracer_provider(config: &TelemetryConfig, exporter: ExporterHandle) -> SdkTracerProvider {
    // The sampling ratio from config is recorded for diagnostics but not
    // applied; every span is sampled.
    let builder = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(build_resource(config));

    match exporter {
        ExporterHandle::Stdout(exporter) => builder
            .with_span_processor(BatchSpanProcessor::builder(exporter).build())
            .build(),
        ExporterHandle::Otlp(exporter) => builder
            .with_span_processor(BatchSpanProcessor::builder(exporter).build())
            .build(),
    }
}

fn spawn_shutdown_waiter(provider: SdkTracerProvider, shutdown: CancellationToken) {
    tokio::spawn(async move {
        shutdown.cancelled().await;

        if let Err(err) = provider.force_flush() {
            tracing::warn!(target: "otel_lifecycle", error = %err, "failed to flush spans on shutdown");
        }
        if let Err(err) = provider.shutdown() {
            tracing::warn!(target: "otel_lifecycle", error = %err, "failed to shut down tracer provider");
        } else {
            tracing::info!(target: "otel_lifecycle", "tracer provider shut down");
        }
    });
}

/// Install the process-wide `tracing` subscriber: an `EnvFilter` taken from
/// `RUST_LOG` (defaulting to `info`) in front of the fmt layer.
pub fn init_subscriber() -> Result<(), SetupError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()?;
    Ok(())
}
