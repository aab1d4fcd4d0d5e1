//! Error types for exporter construction and tracer setup.

use thiserror::Error;

/// Errors raised while building a span exporter from configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExporterError {
    /// The configured protocol is not one of the supported values.
    #[error("unsupported OTLP protocol: {0} (supported: grpc, http/protobuf)")]
    UnsupportedProtocol(String),

    /// The OTLP exporter builder rejected the configuration.
    #[error("failed to build span exporter")]
    Build(#[source] opentelemetry_otlp::ExporterBuildError),
}

/// Errors raised during tracer provider setup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    /// The shutdown token was already cancelled when setup began.
    #[error("telemetry setup cancelled before initialisation")]
    Cancelled,

    /// Exporter construction failed.
    #[error(transparent)]
    Exporter(#[from] ExporterError),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialise tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
