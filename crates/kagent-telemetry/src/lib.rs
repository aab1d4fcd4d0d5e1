//! Opinionated OpenTelemetry SDK configuration and lifecycle management for
//! kagent tool servers.
//!
//! This crate wires together the OpenTelemetry SDK, OTLP exporters, and the
//! `tracing` crate ecosystem into a cohesive tracing setup for a process that
//! serves tool invocations. It handles configuration loading, exporter
//! construction with protocol auto-detection, and tracer provider lifecycle
//! bound to a shutdown signal.
//!
//! # Features
//!
//! - **Environment-driven configuration** - Standard `OTEL_*` environment
//!   variables, loaded once per process and memoised ([`TelemetryConfig`])
//! - **Protocol auto-detection** - Port-based selection between OTLP/gRPC
//!   (4317) and OTLP/HTTP (4318), with an explicit override
//! - **Stdout fallback** - A human-readable stdout exporter when no collector
//!   endpoint is configured, for local development and tests
//! - **Shutdown-bound lifecycle** - A background task flushes and shuts down
//!   the provider when the root cancellation token fires
//! - **Disabled mode** - `OTEL_SDK_DISABLED=true` installs a true no-op
//!   provider without constructing any resource, exporter, or propagator
//!
//! # Example
//!
//! ```no_run
//! use kagent_telemetry::{setup_tracing, SetupError};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SetupError> {
//!     let shutdown = CancellationToken::new();
//!     setup_tracing(&shutdown)?;
//!
//!     // Serve requests...
//!
//!     // Cancelling the token flushes and shuts down the provider.
//!     shutdown.cancel();
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod exporter;
mod setup;

pub use config::{
    OTEL_ENVIRONMENT, OTEL_EXPORTER_OTLP_ENDPOINT, OTEL_EXPORTER_OTLP_HEADERS,
    OTEL_EXPORTER_OTLP_PROTOCOL, OTEL_EXPORTER_OTLP_TRACES_INSECURE, OTEL_SDK_DISABLED,
    OTEL_SERVICE_NAME, OTEL_SERVICE_VERSION, OTEL_TRACES_SAMPLER_ARG, TelemetryConfig,
};
pub use error::{ExporterError, SetupError};
pub use exporter::{
    DEFAULT_HTTP_TRACES_PATH, DEFAULT_OTLP_GRPC_PORT, DEFAULT_OTLP_HTTP_PORT, ExporterHandle,
    PROTOCOL_AUTO, PROTOCOL_GRPC, PROTOCOL_HTTP, Protocol, create_exporter, detect_protocol,
    grpc_transport_endpoint, normalize_grpc_endpoint, normalize_http_endpoint, parse_headers,
};
pub use setup::{init_subscriber, setup_tracing, setup_with_config};
