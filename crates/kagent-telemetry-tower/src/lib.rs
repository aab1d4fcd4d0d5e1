//! Tower middleware for MCP tool server tracing.
//!
//! This crate provides the request-path half of kagent telemetry: a
//! propagation layer that extracts W3C trace context and a fixed header
//! allow-list at the transport edge, and a tracing layer that wraps tool
//! handlers in `mcp.tool.<name>` spans with MCP request and result
//! attributes.
//!
//! # Usage
//!
//! ```no_run
//! use kagent_telemetry_tower::{
//!     CallToolRequest, CallToolResult, RequestContext, ToolInvocation, ToolTracingLayer,
//! };
//! use tower::{Layer, Service, ServiceExt};
//!
//! async fn handler(
//!     invocation: ToolInvocation<CallToolRequest>,
//! ) -> Result<CallToolResult, std::convert::Infallible> {
//!     // Child spans started here parent under the tool span.
//!     Ok(CallToolResult::default())
//! }
//!
//! # async fn run() -> Result<(), std::convert::Infallible> {
//! let mut service = ToolTracingLayer::new("k8s_get_pods")
//!     .layer(tower::service_fn(handler));
//!
//! let invocation = ToolInvocation::new(
//!     CallToolRequest { name: "k8s_get_pods".to_string(), arguments: None },
//!     RequestContext::default(),
//! );
//! let _result = service.ready().await?.call(invocation).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Trace context
//!
//! [`PropagationLayer`] runs the globally registered propagator over the
//! incoming headers and stores a [`RequestContext`] in the request
//! extensions. The tool layer starts its span as a child of that context
//! and writes the augmented context back into the invocation, so handler
//! code can create correctly parented child spans via the [`span`] facade.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod future;
mod layer;
mod propagation;
mod request;
mod service;

pub mod span;

pub use context::{HEADER_ALLOW_LIST, RequestContext};
pub use future::ToolTracingFuture;
pub use layer::{ToolTracingLayer, ToolTracingLayerBuilder, with_tracing};
pub use propagation::{PropagationLayer, PropagationService};
pub use request::{CallToolRequest, CallToolResult, ToolCall, ToolInvocation, ToolOutcome};
pub use service::ToolTracingService;
