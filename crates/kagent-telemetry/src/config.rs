//! Environment-driven telemetry configuration.
//!
//! A [`TelemetryConfig`] snapshot is read from `OTEL_*` environment variables
//! once per process and memoised; every later [`TelemetryConfig::load`] call
//! returns the same snapshot. Malformed values fall back to their defaults
//! rather than failing startup.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::Serialize;

/// Logical service name reported in the trace resource.
pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// Service version reported in the trace resource.
pub const OTEL_SERVICE_VERSION: &str = "OTEL_SERVICE_VERSION";
/// Deployment environment reported in the trace resource.
pub const OTEL_ENVIRONMENT: &str = "OTEL_ENVIRONMENT";
/// OTLP collector endpoint; empty selects the stdout exporter.
pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// OTLP transport protocol: `grpc`, `http`, `http/protobuf`, or `auto`.
pub const OTEL_EXPORTER_OTLP_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
/// Extra headers sent to the collector, `key=value` pairs joined by commas.
pub const OTEL_EXPORTER_OTLP_HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";
/// Sampling ratio argument. Parsed for diagnostics; the provider currently
/// samples everything.
pub const OTEL_TRACES_SAMPLER_ARG: &str = "OTEL_TRACES_SAMPLER_ARG";
/// Force plaintext transport to the collector.
pub const OTEL_EXPORTER_OTLP_TRACES_INSECURE: &str = "OTEL_EXPORTER_OTLP_TRACES_INSECURE";
/// Disable the SDK entirely; a no-op provider is installed instead.
pub const OTEL_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";

const DEFAULT_SERVICE_NAME: &str = "kagent-tools";
const DEFAULT_SERVICE_VERSION: &str = "dev";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_PROTOCOL: &str = "auto";
const DEFAULT_SAMPLING_RATIO: f64 = 1.0;

/// Immutable snapshot of telemetry configuration for this process.
///
/// Note that `OTEL_EXPORTER_OTLP_HEADERS` is intentionally not part of the
/// snapshot; it is read from the environment when the exporter is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryConfig {
    /// Value for the `service.name` resource attribute.
    pub service_name: String,
    /// Value for the `service.version` resource attribute.
    pub service_version: String,
    /// Value for the `deployment.environment` resource attribute.
    pub environment: String,
    /// OTLP collector endpoint; empty means export to stdout.
    pub endpoint: String,
    /// Requested OTLP protocol (`auto` defers to port detection).
    pub protocol: String,
    /// Requested sampling ratio. Recorded but not applied; the provider
    /// uses an always-on sampler.
    pub sampling_ratio: f64,
    /// Use plaintext transport to the collector.
    pub insecure: bool,
    /// Skip all tracer setup and install a no-op provider.
    pub disabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            endpoint: String::new(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            sampling_ratio: DEFAULT_SAMPLING_RATIO,
            insecure: false,
            disabled: false,
        }
    }
}

impl TelemetryConfig {
    /// Read a fresh snapshot from the process environment.
    ///
    /// Unset variables take their defaults; malformed numeric and boolean
    /// values are dropped silently so a typo cannot prevent startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |key: &str, default: String| match lookup(key) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        };

        Self {
            service_name: string(OTEL_SERVICE_NAME, defaults.service_name),
            service_version: string(OTEL_SERVICE_VERSION, defaults.service_version),
            environment: string(OTEL_ENVIRONMENT, defaults.environment),
            endpoint: lookup(OTEL_EXPORTER_OTLP_ENDPOINT).unwrap_or_default(),
            protocol: string(OTEL_EXPORTER_OTLP_PROTOCOL, defaults.protocol),
            sampling_ratio: lookup(OTEL_TRACES_SAMPLER_ARG)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(DEFAULT_SAMPLING_RATIO),
            insecure: lookup(OTEL_EXPORTER_OTLP_TRACES_INSECURE)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
            disabled: lookup(OTEL_SDK_DISABLED)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
        }
    }

    /// Return the process-wide configuration snapshot, reading the
    /// environment on first call and reusing the result thereafter.
    pub fn load() -> Arc<TelemetryConfig> {
        cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the environment and replace the cached snapshot.
    ///
    /// Only for tests that manipulate `OTEL_*` variables.
    #[doc(hidden)]
    pub fn reload_from_env() {
        *cache().write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(TelemetryConfig::from_env());
    }
}

fn cache() -> &'static RwLock<Arc<TelemetryConfig>> {
    static CACHE: OnceLock<RwLock<Arc<TelemetryConfig>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(Arc::new(TelemetryConfig::from_env())))
}

/// Boolean parsing over the forms `1/t/true` and `0/f/false`,
/// case-insensitive. Anything else is rejected.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}
