//! Integration tests for the manual span facade.

use kagent_telemetry_tower::span;
use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::{Context, KeyValue, Value, global};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SdkTracerProvider, SpanData, SpanExporter};
use serial_test::serial;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
struct CaptureExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl CaptureExporter {
    fn captured(&self) -> Vec<SpanData> {
        self.spans.lock().unwrap().clone()
    }
}

impl SpanExporter for CaptureExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        self.spans.lock().unwrap().extend(batch);
        std::future::ready(Ok(()))
    }
}

fn install_capture_provider() -> (CaptureExporter, SdkTracerProvider) {
    let exporter = CaptureExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    global::set_tracer_provider(provider.clone());
    (exporter, provider)
}

#[derive(Debug)]
struct FakeError(&'static str);

impl std::fmt::Display for FakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FakeError {}

#[test]
#[serial]
fn start_span_records_name_and_attributes() {
    let (exporter, provider) = install_capture_provider();

    let cx = span::start_span(
        &Context::new(),
        "shell.exec",
        vec![KeyValue::new("command", "kubectl get pods")],
    );
    span::add_event(&cx.span(), "command.started", Vec::new());
    span::record_success(&cx.span(), "command completed");
    cx.span().end();

    provider.force_flush().unwrap();
    let spans = exporter.captured();
    assert_eq!(spans.len(), 1);

    let span = &spans[0];
    assert_eq!(span.name, "shell.exec");
    assert!(matches!(span.status, Status::Ok));
    assert_eq!(span.events.events.len(), 1);
    assert_eq!(span.events.events[0].name, "command.started");
    assert!(
        span.attributes
            .iter()
            .any(|kv| kv.key.as_str() == "command"
                && kv.value == Value::from("kubectl get pods"))
    );
}

#[test]
#[serial]
fn record_error_sets_status_and_exception_event() {
    let (exporter, provider) = install_capture_provider();

    let cx = span::start_span(&Context::new(), "shell.exec", Vec::new());
    span::record_error(
        &cx.span(),
        &FakeError("command not found"),
        "shell execution failed",
    );
    cx.span().end();

    provider.force_flush().unwrap();
    let spans = exporter.captured();
    assert_eq!(spans.len(), 1);

    let span = &spans[0];
    match &span.status {
        Status::Error { description } => {
            assert_eq!(description.as_ref(), "shell execution failed")
        }
        other => panic!("expected error status, got {other:?}"),
    }
    assert_eq!(span.events.events.len(), 1);
    assert_eq!(span.events.events[0].name, "exception");
}

#[test]
#[serial]
fn child_span_parents_under_given_context() {
    let (exporter, provider) = install_capture_provider();

    let parent_cx = span::start_span(&Context::new(), "parent", Vec::new());
    let parent_span_id = parent_cx.span().span_context().span_id();

    let child_cx = span::start_span(&parent_cx, "child", Vec::new());
    child_cx.span().end();
    parent_cx.span().end();

    provider.force_flush().unwrap();
    let spans = exporter.captured();
    assert_eq!(spans.len(), 2);

    let child = spans.iter().find(|s| s.name == "child").unwrap();
    assert_eq!(child.parent_span_id, parent_span_id);
}
