//! Span exporter construction with OTLP protocol auto-detection.
//!
//! The factory maps a [`TelemetryConfig`] onto one of three exporters: the
//! stdout pretty printer when no endpoint is configured, OTLP over gRPC, or
//! OTLP over HTTP/protobuf. When the protocol is left on `auto` it is sniffed
//! from the endpoint port, matching collector conventions (4317 gRPC,
//! 4318 HTTP).

use std::collections::HashMap;
use std::time::Duration;

use opentelemetry_otlp::{WithExportConfig, WithHttpConfig, WithTonicConfig};
use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};

use crate::config::{OTEL_EXPORTER_OTLP_HEADERS, TelemetryConfig};
use crate::error::ExporterError;

/// Explicit OTLP/gRPC protocol value.
pub const PROTOCOL_GRPC: &str = "grpc";
/// Explicit OTLP/HTTP protocol value.
pub const PROTOCOL_HTTP: &str = "http/protobuf";
/// Protocol value requesting port-based detection.
pub const PROTOCOL_AUTO: &str = "auto";
/// Conventional collector port for OTLP/gRPC.
pub const DEFAULT_OTLP_GRPC_PORT: &str = "4317";
/// Conventional collector port for OTLP/HTTP.
pub const DEFAULT_OTLP_HTTP_PORT: &str = "4318";
/// Path suffix the OTLP/HTTP traces endpoint must carry.
pub const DEFAULT_HTTP_TRACES_PATH: &str = "/v1/traces";

const EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire protocol selected for OTLP export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// OTLP over gRPC (tonic transport).
    Grpc,
    /// OTLP over HTTP with protobuf payloads.
    Http,
}

/// A constructed span exporter, tagged by kind.
///
/// The SDK exporter trait is not object safe, so the two concrete exporters
/// are carried as enum variants and matched when the provider is built.
pub enum ExporterHandle {
    /// Human-readable stdout exporter, used when no endpoint is configured.
    Stdout(opentelemetry_stdout::SpanExporter),
    /// OTLP exporter, either transport.
    Otlp(opentelemetry_otlp::SpanExporter),
}

impl std::fmt::Debug for ExporterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExporterHandle::Stdout(_) => f.write_str("ExporterHandle::Stdout"),
            ExporterHandle::Otlp(_) => f.write_str("ExporterHandle::Otlp"),
        }
    }
}

/// Build the span exporter described by `config`.
///
/// An empty endpoint selects the stdout exporter. Otherwise the effective
/// protocol is resolved (explicit value or port detection) and the matching
/// OTLP exporter is constructed. An unrecognised explicit protocol fails
/// before any exporter is built.
pub fn create_exporter(config: &TelemetryConfig) -> Result<ExporterHandle, ExporterError> {
    if config.endpoint.is_empty() {
        return Ok(ExporterHandle::Stdout(
            opentelemetry_stdout::SpanExporter::default(),
        ));
    }

    match resolve_protocol(&config.protocol, &config.endpoint)? {
        Protocol::Grpc => build_grpc_exporter(config),
        Protocol::Http => build_http_exporter(config),
    }
}

fn resolve_protocol(protocol: &str, endpoint: &str) -> Result<Protocol, ExporterError> {
    match protocol.trim().to_ascii_lowercase().as_str() {
        "" | PROTOCOL_AUTO => Ok(detect_protocol(endpoint)),
        PROTOCOL_GRPC => Ok(Protocol::Grpc),
        "http" | PROTOCOL_HTTP => Ok(Protocol::Http),
        other => Err(ExporterError::UnsupportedProtocol(other.to_string())),
    }
}

/// Sniff the OTLP protocol from the endpoint's port.
///
/// `4317` selects gRPC and `4318` selects HTTP; any other port, or an
/// endpoint without one, defaults to HTTP. Works with or without a URL
/// scheme and ignores any path or query suffix.
pub fn detect_protocol(endpoint: &str) -> Protocol {
    match endpoint_port(endpoint) {
        Some(port) if port == DEFAULT_OTLP_GRPC_PORT => Protocol::Grpc,
        _ => Protocol::Http,
    }
}

fn endpoint_port(endpoint: &str) -> Option<&str> {
    let without_scheme = match endpoint.split_once("://") {
        Some((_, rest)) => rest,
        None => endpoint,
    };
    let authority = without_scheme
        .split(['/', '?'])
        .next()
        .unwrap_or(without_scheme);
    let (_, port) = authority.rsplit_once(':')?;
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}

/// Strip an `http://` or `https://` prefix; the tonic transport manages its
/// own scheme based on the insecure flag.
pub fn normalize_grpc_endpoint(endpoint: &str) -> &str {
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
}

/// Full endpoint handed to the tonic transport. Tonic requires a scheme, so
/// one is re-added after normalisation: `http://` when the insecure flag is
/// set, `https://` otherwise. Unlike the HTTP path, gRPC transport security
/// is governed by the insecure flag alone.
pub fn grpc_transport_endpoint(endpoint: &str, insecure: bool) -> String {
    let hostport = normalize_grpc_endpoint(endpoint);
    let scheme = if insecure { "http" } else { "https" };
    format!("{scheme}://{hostport}")
}

/// Normalise an endpoint for OTLP/HTTP export.
///
/// A missing scheme becomes `http://` when the insecure flag is set or the
/// host looks local, `https://` otherwise. The `/v1/traces` path is appended
/// unless already present, so re-normalising is a no-op.
pub fn normalize_http_endpoint(endpoint: &str, insecure: bool) -> String {
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else if insecure || is_local_host(endpoint) {
        format!("http://{endpoint}")
    } else {
        format!("https://{endpoint}")
    };

    if with_scheme.ends_with(DEFAULT_HTTP_TRACES_PATH) {
        with_scheme
    } else {
        format!(
            "{}{}",
            with_scheme.trim_end_matches('/'),
            DEFAULT_HTTP_TRACES_PATH
        )
    }
}

fn is_local_host(endpoint: &str) -> bool {
    endpoint.contains("localhost")
        || endpoint.contains("127.0.0.1")
        || endpoint.contains("docker.internal")
}

/// Parse `OTEL_EXPORTER_OTLP_HEADERS` syntax: comma-separated `key=value`
/// pairs, split at the first `=`, whitespace trimmed. Entries without an
/// `=` are dropped.
pub fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn configured_headers() -> HashMap<String, String> {
    match std::env::var(OTEL_EXPORTER_OTLP_HEADERS) {
        Ok(raw) if !raw.is_empty() => parse_headers(&raw),
        _ => HashMap::new(),
    }
}

fn build_grpc_exporter(config: &TelemetryConfig) -> Result<ExporterHandle, ExporterError> {
    let endpoint = grpc_transport_endpoint(&config.endpoint, config.insecure);

    let mut metadata = MetadataMap::new();
    for (key, value) in configured_headers() {
        if let (Ok(key), Ok(value)) = (
            key.parse::<MetadataKey<Ascii>>(),
            value.parse::<MetadataValue<Ascii>>(),
        ) {
            metadata.insert(key, value);
        }
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .with_metadata(metadata)
        .build()
        .map_err(ExporterError::Build)?;

    Ok(ExporterHandle::Otlp(exporter))
}

fn build_http_exporter(config: &TelemetryConfig) -> Result<ExporterHandle, ExporterError> {
    let endpoint = normalize_http_endpoint(&config.endpoint, config.insecure);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .with_headers(configured_headers())
        .build()
        .map_err(ExporterError::Build)?;

    Ok(ExporterHandle::Otlp(exporter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grpc_port_selects_grpc() {
        assert_eq!(detect_protocol("collector:4317"), Protocol::Grpc);
        assert_eq!(detect_protocol("http://collector:4317"), Protocol::Grpc);
        assert_eq!(
            detect_protocol("https://collector:4317/extra/path"),
            Protocol::Grpc
        );
    }

    #[test]
    fn http_port_selects_http() {
        assert_eq!(detect_protocol("collector:4318"), Protocol::Http);
        assert_eq!(detect_protocol("http://collector:4318"), Protocol::Http);
    }

    #[test]
    fn unknown_or_missing_port_defaults_to_http() {
        assert_eq!(detect_protocol("collector"), Protocol::Http);
        assert_eq!(detect_protocol("collector:9999"), Protocol::Http);
        assert_eq!(detect_protocol("https://collector"), Protocol::Http);
    }

    #[test]
    fn grpc_normalisation_strips_scheme() {
        assert_eq!(
            normalize_grpc_endpoint("http://collector:4317"),
            "collector:4317"
        );
        assert_eq!(
            normalize_grpc_endpoint("https://collector:4317"),
            "collector:4317"
        );
        assert_eq!(normalize_grpc_endpoint("collector:4317"), "collector:4317");
    }

    #[test]
    fn grpc_transport_scheme_follows_insecure_flag_only() {
        assert_eq!(
            grpc_transport_endpoint("localhost:4317", false),
            "https://localhost:4317"
        );
        assert_eq!(
            grpc_transport_endpoint("localhost:4317", true),
            "http://localhost:4317"
        );
        assert_eq!(
            grpc_transport_endpoint("127.0.0.1:4317", false),
            "https://127.0.0.1:4317"
        );
        assert_eq!(
            grpc_transport_endpoint("http://collector:4317", false),
            "https://collector:4317"
        );
        assert_eq!(
            grpc_transport_endpoint("collector.example.com:4317", true),
            "http://collector.example.com:4317"
        );
    }

    #[test]
    fn http_normalisation_uses_plaintext_for_local_hosts() {
        assert_eq!(
            normalize_http_endpoint("localhost:4318", false),
            "http://localhost:4318/v1/traces"
        );
        assert_eq!(
            normalize_http_endpoint("127.0.0.1:4318", false),
            "http://127.0.0.1:4318/v1/traces"
        );
        assert_eq!(
            normalize_http_endpoint("host.docker.internal:4318", false),
            "http://host.docker.internal:4318/v1/traces"
        );
    }

    #[test]
    fn http_normalisation_defaults_to_tls() {
        assert_eq!(
            normalize_http_endpoint("collector.example.com:4318", false),
            "https://collector.example.com:4318/v1/traces"
        );
    }

    #[test]
    fn http_normalisation_honours_insecure_flag() {
        assert_eq!(
            normalize_http_endpoint("collector.example.com:4318", true),
            "http://collector.example.com:4318/v1/traces"
        );
    }

    #[test]
    fn http_normalisation_is_idempotent() {
        let once = normalize_http_endpoint("localhost:4318", false);
        let twice = normalize_http_endpoint(&once, false);
        assert_eq!(once, twice);
        assert_eq!(
            normalize_http_endpoint("http://collector:4318/v1/traces", false),
            "http://collector:4318/v1/traces"
        );
    }

    #[test]
    fn http_normalisation_keeps_explicit_scheme() {
        assert_eq!(
            normalize_http_endpoint("https://collector:4318", true),
            "https://collector:4318/v1/traces"
        );
    }

    #[test]
    fn header_parsing_splits_pairs() {
        let headers = parse_headers("authorization=Bearer abc,x-tenant=blue");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["authorization"], "Bearer abc");
        assert_eq!(headers["x-tenant"], "blue");
    }

    #[test]
    fn header_parsing_splits_at_first_equals() {
        let headers = parse_headers("authorization=Basic dXNlcjpwYXNz==");
        assert_eq!(headers["authorization"], "Basic dXNlcjpwYXNz==");
    }

    #[test]
    fn header_parsing_drops_malformed_entries() {
        let headers = parse_headers("no-separator, x-ok = fine ,=empty-key");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["x-ok"], "fine");
    }

    #[test]
    fn header_parsing_of_empty_input_is_empty() {
        assert!(parse_headers("").is_empty());
    }

    #[test]
    fn empty_endpoint_selects_stdout() {
        let config = TelemetryConfig::default();
        let handle = create_exporter(&config).unwrap();
        assert!(matches!(handle, ExporterHandle::Stdout(_)));
    }

    #[test]
    fn unsupported_protocol_is_rejected() {
        let config = TelemetryConfig {
            endpoint: "collector:4317".to_string(),
            protocol: "thrift".to_string(),
            ..TelemetryConfig::default()
        };

        let err = create_exporter(&config).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ExporterError::UnsupportedProtocol(ref p) if p == "thrift"));
        assert!(message.contains("thrift"));
        assert!(message.contains("grpc"));
        assert!(message.contains("http/protobuf"));
    }

    #[test]
    fn explicit_protocol_overrides_port() {
        assert_eq!(
            resolve_protocol("grpc", "collector:4318").unwrap(),
            Protocol::Grpc
        );
        assert_eq!(
            resolve_protocol("http/protobuf", "collector:4317").unwrap(),
            Protocol::Http
        );
        assert_eq!(
            resolve_protocol("http", "collector:4317").unwrap(),
            Protocol::Http
        );
    }

    #[test]
    fn auto_protocol_defers_to_port_detection() {
        assert_eq!(
            resolve_protocol("auto", "collector:4317").unwrap(),
            Protocol::Grpc
        );
        assert_eq!(
            resolve_protocol("", "collector:4318").unwrap(),
            Protocol::Http
        );
    }
}
