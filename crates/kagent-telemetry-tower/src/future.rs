//! Future implementation that manages the tool span lifecycle.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use opentelemetry_semantic_conventions::attribute::EXCEPTION_MESSAGE;
use pin_project::pin_project;

use crate::request::ToolOutcome;

/// Future that wraps an instrumented tool handler.
///
/// Attaches the span's context for every poll of the inner future so child
/// spans parent correctly, measures wall-clock duration, and on completion
/// records the outcome and ends the span. If the future is dropped
/// mid-flight the span is ended by the context being dropped; ending an
/// already-ended span is a no-op.
#[pin_project]
pub struct ToolTracingFuture<F> {
    #[pin]
    inner: F,
    otel_context: Option<Context>,
    started_at: Instant,
}

impl<F> ToolTracingFuture<F> {
    pub(crate) fn new(inner: F, otel_context: Context, started_at: Instant) -> Self {
        Self {
            inner,
            otel_context: Some(otel_context),
            started_at,
        }
    }
}

impl<F, T, E> Future for ToolTracingFuture<F>
where
    F: Future<Output = Result<T, E>>,
    T: ToolOutcome,
    E: std::fmt::Display,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let Some(otel_context) = this.otel_context.as_ref() else {
            return this.inner.poll(cx);
        };

        let poll_result = {
            let _guard = otel_context.clone().attach();
            this.inner.poll(cx)
        };

        match poll_result {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                let duration = this.started_at.elapsed().as_secs_f64();
                {
                    let span = otel_context.span();
                    span.set_attribute(KeyValue::new("mcp.tool.duration_seconds", duration));

                    match &result {
                        Ok(outcome) => {
                            span.set_status(Status::Ok);
                            span.add_event("tool.execution.success", Vec::new());
                            span.set_attribute(KeyValue::new(
                                "mcp.result.is_error",
                                outcome.is_error(),
                            ));
                            if let Some(count) = outcome.content_count() {
                                span.set_attribute(KeyValue::new(
                                    "mcp.result.content_count",
                                    count as i64,
                                ));
                            }
                        }
                        Err(error) => {
                            let message = error.to_string();
                            span.add_event(
                                "exception",
                                vec![KeyValue::new(EXCEPTION_MESSAGE, message.clone())],
                            );
                            span.set_status(Status::error(message.clone()));
                            span.add_event(
                                "tool.execution.error",
                                vec![KeyValue::new("error.message", message)],
                            );
                        }
                    }

                    span.end();
                }
                this.otel_context.take();

                Poll::Ready(result)
            }
        }
    }
}
