//! Tower Layer for tool handler instrumentation.

use std::sync::Arc;

use opentelemetry_sdk::trace::SdkTracerProvider;
use tower::Layer;

use crate::service::ToolTracingService;

/// Tower layer that instruments a tool handler with OpenTelemetry tracing.
///
/// Each invocation runs inside an `mcp.tool.<name>` span, started as a child
/// of the trace context the request arrived with, carrying MCP request and
/// result attributes plus execution lifecycle events.
///
/// # Example
///
/// ```ignore
/// use kagent_telemetry_tower::ToolTracingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(ToolTracingLayer::new("k8s_get_pods"))
///     .service(my_handler);
/// ```
#[derive(Clone)]
pub struct ToolTracingLayer {
    tool_name: Arc<str>,
    tracer_provider: Option<Arc<SdkTracerProvider>>,
}

impl ToolTracingLayer {
    /// Creates a tracing layer for the named tool, using the globally
    /// registered tracer provider.
    pub fn new(tool_name: impl Into<Arc<str>>) -> Self {
        Self {
            tool_name: tool_name.into(),
            tracer_provider: None,
        }
    }

    /// Creates a builder for more detailed configuration.
    pub fn builder(tool_name: impl Into<Arc<str>>) -> ToolTracingLayerBuilder {
        ToolTracingLayerBuilder {
            tool_name: tool_name.into(),
            tracer_provider: None,
        }
    }
}

impl<S> Layer<S> for ToolTracingLayer {
    type Service = ToolTracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ToolTracingService::new(
            inner,
            self.tool_name.clone(),
            self.tracer_provider.clone(),
        )
    }
}

/// Builder for configuring a [`ToolTracingLayer`].
#[must_use = "builders do nothing unless .build() is called"]
pub struct ToolTracingLayerBuilder {
    tool_name: Arc<str>,
    tracer_provider: Option<Arc<SdkTracerProvider>>,
}

impl ToolTracingLayerBuilder {
    /// Sets an explicit tracer provider for the spans this layer creates.
    ///
    /// If not set, the layer uses the global tracer provider. An explicit
    /// provider keeps tests and multi-provider hosts independent of global
    /// registration order.
    pub fn tracer_provider(mut self, provider: Arc<SdkTracerProvider>) -> Self {
        self.tracer_provider = Some(provider);
        self
    }

    /// Builds the configured layer.
    pub fn build(self) -> ToolTracingLayer {
        ToolTracingLayer {
            tool_name: self.tool_name,
            tracer_provider: self.tracer_provider,
        }
    }
}

/// Wraps `inner` with tracing for the named tool.
///
/// Convenience for `ToolTracingLayer::new(tool_name).layer(inner)`.
pub fn with_tracing<S>(tool_name: impl Into<Arc<str>>, inner: S) -> ToolTracingService<S> {
    ToolTracingLayer::new(tool_name).layer(inner)
}
