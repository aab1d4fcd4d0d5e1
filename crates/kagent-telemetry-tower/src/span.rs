//! Small facade over manual span creation for tool handler code.
//!
//! Handlers that need spans beyond the automatic `mcp.tool.<name>` wrapper
//! use these helpers instead of talking to the tracer directly.

use std::borrow::Cow;
use std::error::Error;

use opentelemetry::trace::{SpanBuilder, SpanRef, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue, global};

/// Instrumentation scope for spans created through this facade.
pub const TRACER_NAME: &str = "kagent-tools";

/// Start a span under `parent` and return a context carrying it.
///
/// The span is reachable through `cx.span()`. The caller is responsible for
/// ending it; dropping the returned context ends it too.
pub fn start_span(
    parent: &Context,
    name: impl Into<Cow<'static, str>>,
    attributes: Vec<KeyValue>,
) -> Context {
    let tracer = global::tracer(TRACER_NAME);
    let span = tracer.build_with_context(
        SpanBuilder::from_name(name.into()).with_attributes(attributes),
        parent,
    );
    parent.with_span(span)
}

/// Record `error` as an exception event and set the span status to error
/// with `message` as its description.
pub fn record_error(span: &SpanRef<'_>, error: &dyn Error, message: &str) {
    span.record_error(error);
    span.set_status(Status::error(message.to_string()));
}

/// Mark the span as successful.
///
/// The SDK carries no description on an ok status, so `message` is accepted
/// for call-site symmetry with [`record_error`] but not recorded.
pub fn record_success(span: &SpanRef<'_>, message: &str) {
    let _ = message;
    span.set_status(Status::Ok);
}

/// Add a named event with attributes to the span.
pub fn add_event(span: &SpanRef<'_>, name: impl Into<Cow<'static, str>>, attributes: Vec<KeyValue>) {
    span.add_event(name.into(), attributes);
}
