//! Tool invocation envelope and the request/response seam traits.

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;

/// Request-side seam: what the instrumentation needs to know about a tool
/// call payload.
pub trait ToolCall {
    /// Identifier of the request, recorded as `mcp.request.id`.
    fn request_name(&self) -> &str;

    /// Structured arguments, recorded as JSON when serialisable.
    fn arguments(&self) -> Option<&serde_json::Value>;
}

/// Response-side seam: what the instrumentation needs to know about a tool
/// call result.
pub trait ToolOutcome {
    /// Whether the tool reported a domain-level error.
    fn is_error(&self) -> bool;

    /// Number of content items in the result, when the outcome carries a
    /// collection.
    fn content_count(&self) -> Option<usize>;
}

/// A tool call payload paired with the [`RequestContext`] captured at the
/// transport edge.
#[derive(Clone, Debug)]
pub struct ToolInvocation<T> {
    /// The tool call payload handed to the handler.
    pub payload: T,
    /// Trace context travelling with this invocation.
    pub context: RequestContext,
}

impl<T> ToolInvocation<T> {
    /// Pairs a payload with its request context.
    pub fn new(payload: T, context: RequestContext) -> Self {
        Self { payload, context }
    }

    /// Splits the invocation back into payload and context.
    pub fn into_parts(self) -> (T, RequestContext) {
        (self.payload, self.context)
    }

    /// The trace context travelling with this invocation.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

/// Concrete MCP `tools/call` request for hosts without their own protocol
/// types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool being invoked.
    pub name: String,
    /// Arguments object, if the caller supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl ToolCall for CallToolRequest {
    fn request_name(&self) -> &str {
        &self.name
    }

    fn arguments(&self) -> Option<&serde_json::Value> {
        self.arguments.as_ref()
    }
}

/// Concrete MCP `tools/call` result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content items produced by the tool.
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
    /// Domain-level error flag; absent means success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolOutcome for CallToolResult {
    fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    fn content_count(&self) -> Option<usize> {
        Some(self.content.len())
    }
}
