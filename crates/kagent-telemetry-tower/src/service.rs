//! Tower Service implementation for tool handler instrumentation.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use opentelemetry::trace::{Span, SpanBuilder, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{KeyValue, global};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tower::Service;

use crate::context::RequestContext;
use crate::future::ToolTracingFuture;
use crate::request::{ToolCall, ToolInvocation, ToolOutcome};

/// Instrumentation scope for spans created by the tool wrapper.
const TRACER_SCOPE: &str = "kagent-tools/mcp";

/// Tower service that instruments tool handlers with OpenTelemetry tracing.
///
/// This service wraps an inner handler and:
/// 1. Starts an `mcp.tool.<name>` span under the invocation's extracted
///    trace context
/// 2. Records header, parent-trace, and MCP request attributes
/// 3. Writes the span's context back into the invocation so the handler can
///    create child spans
/// 4. Classifies the outcome and ends the span when the handler completes
#[derive(Clone)]
pub struct ToolTracingService<S> {
    inner: S,
    tool_name: Arc<str>,
    tracer_provider: Option<Arc<SdkTracerProvider>>,
}

impl<S> ToolTracingService<S> {
    pub(crate) fn new(
        inner: S,
        tool_name: Arc<str>,
        tracer_provider: Option<Arc<SdkTracerProvider>>,
    ) -> Self {
        Self {
            inner,
            tool_name,
            tracer_provider,
        }
    }
}

impl<S, T> Service<ToolInvocation<T>> for ToolTracingService<S>
where
    S: Service<ToolInvocation<T>>,
    S::Response: ToolOutcome,
    S::Error: std::fmt::Display,
    T: ToolCall,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ToolTracingFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut invocation: ToolInvocation<T>) -> Self::Future {
        let parent = invocation.context().otel_context().clone();
        let builder = SpanBuilder::from_name(format!("mcp.tool.{}", self.tool_name))
            .with_attributes(build_attributes(
                &self.tool_name,
                invocation.context(),
                &invocation.payload,
            ));

        // The explicit and the global provider hand out different tracer
        // types; both spans unify once wrapped in a Context.
        let cx = match &self.tracer_provider {
            Some(provider) => {
                let tracer = provider.tracer(TRACER_SCOPE);
                let mut span = tracer.build_with_context(builder, &parent);
                span.add_event("tool.execution.start", Vec::new());
                parent.with_span(span)
            }
            None => {
                let tracer = global::tracer(TRACER_SCOPE);
                let mut span = tracer.build_with_context(builder, &parent);
                span.add_event("tool.execution.start", Vec::new());
                parent.with_span(span)
            }
        };

        // Hand the span's context to the handler so it can start children.
        invocation.context.set_otel_context(cx.clone());

        let future = {
            let _guard = cx.clone().attach();
            self.inner.call(invocation)
        };

        ToolTracingFuture::new(future, cx, Instant::now())
    }
}

fn build_attributes<T: ToolCall>(
    tool_name: &str,
    context: &RequestContext,
    payload: &T,
) -> Vec<KeyValue> {
    let mut attributes = Vec::new();

    for (name, value) in context.headers() {
        attributes.push(KeyValue::new(format!("http.header.{name}"), value.clone()));
    }
    if let Some(trace_id) = context.trace_id() {
        attributes.push(KeyValue::new("http.parent_trace_id", trace_id.to_string()));
    }
    if let Some(span_id) = context.span_id() {
        attributes.push(KeyValue::new("http.parent_span_id", span_id.to_string()));
    }

    attributes.push(KeyValue::new("mcp.tool.name", tool_name.to_string()));
    attributes.push(KeyValue::new(
        "mcp.request.id",
        payload.request_name().to_string(),
    ));

    // Arguments are best effort; a value that fails to serialise is omitted
    // rather than failing the call.
    if let Some(arguments) = payload.arguments()
        && let Ok(json) = serde_json::to_string(arguments)
    {
        attributes.push(KeyValue::new("mcp.request.arguments", json));
    }

    attributes
}
