//! Trace context extraction from incoming HTTP headers.

use std::collections::HashMap;

use http::HeaderMap;
use opentelemetry::Context;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TraceContextExt;

/// Headers copied from the transport into span attributes. Anything not on
/// this list is dropped at the boundary.
pub const HEADER_ALLOW_LIST: [&str; 6] = [
    "x-request-id",
    "x-correlation-id",
    "x-trace-id",
    "user-agent",
    "authorization",
    "x-forwarded-for",
];

/// Trace context captured at the transport edge for one request.
///
/// Carries the extracted remote OpenTelemetry context, the allow-listed
/// headers, and the remote trace/span identifiers when the incoming request
/// carried a valid trace context. Travels with the request (in `http`
/// extensions or a [`ToolInvocation`](crate::ToolInvocation)) down to the
/// handler instrumentation.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    otel_context: Context,
    headers: HashMap<String, String>,
    trace_id: Option<String>,
    span_id: Option<String>,
}

impl RequestContext {
    /// Extract trace context and allow-listed headers from `headers`.
    ///
    /// Runs the globally registered propagator over the header map. When the
    /// extracted remote span context is valid, its trace and span IDs are
    /// captured as lowercase hex strings.
    pub fn extract(headers: &HeaderMap) -> Self {
        let extractor = HeaderMapExtractor(headers);
        let otel_context =
            opentelemetry::global::get_text_map_propagator(|propagator| {
                propagator.extract(&extractor)
            });

        let mut copied = HashMap::new();
        for name in HEADER_ALLOW_LIST {
            if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
                copied.insert(name.to_string(), value.to_string());
            }
        }

        let span_context = otel_context.span().span_context().clone();
        let (trace_id, span_id) = if span_context.is_valid() {
            (
                Some(span_context.trace_id().to_string()),
                Some(span_context.span_id().to_string()),
            )
        } else {
            (None, None)
        };

        Self {
            otel_context,
            headers: copied,
            trace_id,
            span_id,
        }
    }

    /// Allow-listed headers captured from the request.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Remote trace ID, when the request carried a valid trace context.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Remote span ID, when the request carried a valid trace context.
    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }

    /// The OpenTelemetry context this request runs under.
    pub fn otel_context(&self) -> &Context {
        &self.otel_context
    }

    /// Replace the carried context, e.g. once a handler span has been
    /// started under it.
    pub fn set_otel_context(&mut self, context: Context) {
        self.otel_context = context;
    }
}

/// Propagation adapter over `http::HeaderMap`.
struct HeaderMapExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}
