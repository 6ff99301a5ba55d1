//! Integration tests for the message tracing middleware
//!
//! Spans are exported synchronously into memory, so each test can inspect
//! parentage, kinds, attributes and status after the handler returns.

use frolf_events_infrastructure::messaging::metadata;
use frolf_events_infrastructure::observability::tracing::attributes;
use frolf_events_infrastructure::{Message, TracingMiddleware};
use opentelemetry::trace::{SpanId, SpanKind, Status, TraceContextExt, TracerProvider};
use opentelemetry::{Context, Value};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracer, SdkTracerProvider, SpanData};

struct Harness {
    _provider: SdkTracerProvider,
    exporter: InMemorySpanExporter,
    middleware: TracingMiddleware<SdkTracer>,
}

impl Harness {
    fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let middleware = TracingMiddleware::with_trace_context(provider.tracer("test"));
        Self {
            _provider: provider,
            exporter,
            middleware,
        }
    }

    fn span(&self, name: &str) -> SpanData {
        self.exporter
            .get_finished_spans()
            .unwrap()
            .into_iter()
            .find(|span| span.name == name)
            .unwrap_or_else(|| panic!("no span named {name}"))
    }
}

fn attribute(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

#[derive(Debug, thiserror::Error)]
#[error("round not found")]
struct RoundNotFound;

// ============================================================================
// Propagation
// ============================================================================

#[tokio::test]
async fn test_consumer_continues_producer_trace() {
    let harness = Harness::new();

    let mut message = Message::new(b"{}".to_vec()).with_metadata(metadata::CORRELATION_ID, "cid-1");
    let producer_cx = harness
        .middleware
        .start_producer_span(&Context::new(), "round.created.v1", &mut message);
    producer_cx.span().end();
    assert!(message.metadata.contains_key("traceparent"));

    message.set_metadata(metadata::TOPIC, "round.created.v1");
    let result: Result<(), RoundNotFound> = harness
        .middleware
        .handle(message, |message, cx| async move {
            // The handler sees the consumer span's own context in the metadata
            let traceparent = message.metadata_value("traceparent").unwrap_or_default();
            let span_id = cx.span().span_context().span_id().to_string();
            assert!(traceparent.contains(&span_id));
            Ok(())
        })
        .await;
    assert!(result.is_ok());

    let producer = harness.span("round.created.v1 publish");
    let consumer = harness.span("round.created.v1 process");

    assert_eq!(producer.span_kind, SpanKind::Producer);
    assert_eq!(consumer.span_kind, SpanKind::Consumer);
    assert_eq!(consumer.span_context.trace_id(), producer.span_context.trace_id());
    assert_eq!(consumer.parent_span_id, producer.span_context.span_id());
    assert_eq!(consumer.status, Status::Ok);
}

#[tokio::test]
async fn test_message_without_trace_context_starts_new_trace() {
    let harness = Harness::new();
    let message = Message::new(b"{}".to_vec()).with_metadata(metadata::TOPIC, "round.deleted.v1");

    let result: Result<u8, RoundNotFound> = harness.middleware.handle(message, |_, _| async { Ok(7) }).await;
    assert_eq!(result.unwrap(), 7);

    let consumer = harness.span("round.deleted.v1 process");
    assert_eq!(consumer.parent_span_id, SpanId::INVALID);
    assert!(consumer.span_context.is_valid());
}

// ============================================================================
// Status and attributes
// ============================================================================

#[tokio::test]
async fn test_handler_error_marks_span_and_is_returned() {
    let harness = Harness::new();
    let message = Message::new(b"{}".to_vec()).with_metadata(metadata::TOPIC, "round.started.v1");

    let result: Result<(), RoundNotFound> = harness
        .middleware
        .handle(message, |_, _| async { Err(RoundNotFound) })
        .await;
    assert_eq!(result.unwrap_err().to_string(), "round not found");

    let consumer = harness.span("round.started.v1 process");
    assert_eq!(consumer.status, Status::error("round not found"));
}

#[tokio::test]
async fn test_consumer_span_attributes() {
    let harness = Harness::new();
    let message = Message::new(b"12345".to_vec())
        .with_metadata(metadata::TOPIC, "score.updated.v1")
        .with_metadata(metadata::CORRELATION_ID, "cid-9")
        .with_metadata(metadata::HANDLER_NAME, "HandleScoreUpdated")
        .with_metadata(metadata::DELIVERY_ATTEMPT, "3");

    let _: Result<(), RoundNotFound> = harness.middleware.handle(message, |_, _| async { Ok(()) }).await;

    let span = harness.span("score.updated.v1 process");
    assert_eq!(attribute(&span, attributes::MESSAGING_SYSTEM), Some("nats_jetstream".into()));
    assert_eq!(attribute(&span, attributes::OPERATION_TYPE), Some("process".into()));
    assert_eq!(attribute(&span, attributes::DESTINATION_NAME), Some("score.updated.v1".into()));
    assert_eq!(attribute(&span, attributes::CORRELATION_ID), Some("cid-9".into()));
    assert_eq!(attribute(&span, attributes::HANDLER_NAME), Some("HandleScoreUpdated".into()));
    assert_eq!(attribute(&span, attributes::BODY_SIZE), Some(5i64.into()));
    assert_eq!(attribute(&span, attributes::DELIVERY_ATTEMPT), Some(3i64.into()));
    assert_eq!(attribute(&span, attributes::DEAD_LETTER), Some(false.into()));
}

#[tokio::test]
async fn test_message_without_topic_uses_generic_name() {
    let harness = Harness::new();
    let message = Message::new(Vec::new());

    let _: Result<(), RoundNotFound> = harness.middleware.handle(message, |_, _| async { Ok(()) }).await;

    let span = harness.span("message process");
    assert_eq!(attribute(&span, attributes::DESTINATION_NAME), None);
}

#[test]
fn test_producer_span_is_child_of_parent() {
    let harness = Harness::new();

    let mut inbound = Message::new(Vec::new()).with_metadata(metadata::TOPIC, "round.created.v1");
    let consumer_cx = harness.middleware.start_consumer_span(&mut inbound);

    let mut outbound = Message::new(b"{}".to_vec());
    let producer_cx = harness
        .middleware
        .start_producer_span(&consumer_cx, "discord.round.created.v1", &mut outbound);
    producer_cx.span().end();
    consumer_cx.span().end();

    let consumer = harness.span("round.created.v1 process");
    let producer = harness.span("discord.round.created.v1 publish");
    assert_eq!(producer.parent_span_id, consumer.span_context.span_id());
    assert_eq!(attribute(&producer, attributes::DESTINATION_NAME), Some("discord.round.created.v1".into()));
    assert_eq!(attribute(&producer, attributes::OPERATION_TYPE), Some("publish".into()));
}
