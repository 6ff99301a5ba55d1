//! OpenTelemetry spans around message handling.
//!
//! Consumer spans continue the trace carried in a message's metadata and
//! write their own context back into it, so whatever the handler publishes
//! joins the same trace. Producer spans mark publish sites.

use std::future::Future;
use std::sync::Arc;

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;

use crate::messaging::Message;

/// Span attribute keys
pub mod attributes {
    pub const MESSAGING_SYSTEM: &str = "messaging.system";
    pub const OPERATION_TYPE: &str = "messaging.operation.type";
    pub const DESTINATION_NAME: &str = "messaging.destination.name";
    pub const MESSAGE_ID: &str = "messaging.message.id";
    pub const BODY_SIZE: &str = "messaging.message.body.size";
    pub const CORRELATION_ID: &str = "messaging.correlation_id";
    pub const HANDLER_NAME: &str = "messaging.handler.name";
    pub const DEAD_LETTER: &str = "messaging.dead_letter";
    pub const DELIVERY_ATTEMPT: &str = "messaging.delivery_attempt";
}

/// `messaging.system` value for every span
pub const MESSAGING_SYSTEM: &str = "nats_jetstream";

/// Instrumentation scope of the global tracer
pub const TRACER_NAME: &str = "frolf-bot/messaging";

/// Wraps handlers in consumer spans and starts producer spans.
///
/// Holds no mutable state; one instance can serve every handler.
pub struct TracingMiddleware<T = BoxedTracer> {
    tracer: T,
    propagator: Arc<dyn TextMapPropagator + Send + Sync>,
}

impl TracingMiddleware<BoxedTracer> {
    /// Middleware on the globally installed tracer provider, propagating
    /// W3C trace context
    pub fn from_global() -> Self {
        Self::new(global::tracer(TRACER_NAME), Arc::new(TraceContextPropagator::new()))
    }
}

impl<T> TracingMiddleware<T>
where
    T: Tracer + Send + Sync,
    T::Span: Send + Sync + 'static,
{
    pub fn new(tracer: T, propagator: Arc<dyn TextMapPropagator + Send + Sync>) -> Self {
        Self { tracer, propagator }
    }

    /// Middleware propagating W3C trace context
    pub fn with_trace_context(tracer: T) -> Self {
        Self::new(tracer, Arc::new(TraceContextPropagator::new()))
    }

    /// Start a consumer span for `message` and inject its context into the
    /// message metadata. The caller ends the span.
    pub fn start_consumer_span(&self, message: &mut Message) -> Context {
        let parent = self
            .propagator
            .extract_with_context(&Context::new(), &message.metadata);

        let name = match message.topic() {
            Some(topic) => format!("{topic} process"),
            None => "message process".to_string(),
        };

        let mut attrs = base_attributes(message, "process");
        if let Some(handler) = message.handler_name() {
            attrs.push(KeyValue::new(attributes::HANDLER_NAME, handler.to_string()));
        }
        attrs.push(KeyValue::new(attributes::DEAD_LETTER, message.is_dead_letter()));
        attrs.push(KeyValue::new(attributes::DELIVERY_ATTEMPT, message.delivery_attempt()));

        let span = self
            .tracer
            .span_builder(name)
            .with_kind(SpanKind::Consumer)
            .with_attributes(attrs)
            .start_with_context(&self.tracer, &parent);

        let cx = parent.with_span(span);
        self.propagator.inject_context(&cx, &mut message.metadata);
        cx
    }

    /// Run `handler` inside a consumer span.
    ///
    /// The handler receives the message, now carrying the span's context, and
    /// the context itself. A handler error is recorded on the span and
    /// returned unchanged.
    pub async fn handle<F, Fut, R, E>(&self, mut message: Message, handler: F) -> Result<R, E>
    where
        F: FnOnce(Message, Context) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: std::error::Error,
    {
        let cx = self.start_consumer_span(&mut message);
        let result = handler(message, cx.clone()).await;

        let span = cx.span();
        match &result {
            Ok(_) => span.set_status(Status::Ok),
            Err(err) => {
                span.record_error(err);
                span.set_status(Status::error(err.to_string()));
                ::tracing::debug!(error = %err, "Message handler failed");
            }
        }
        span.end();
        result
    }

    /// Start a producer span for publishing `message` on `topic`, as a child
    /// of `parent`, and inject its context into the message metadata.
    ///
    /// The caller ends the span once the publish returns.
    pub fn start_producer_span(&self, parent: &Context, topic: &str, message: &mut Message) -> Context {
        let mut attrs = base_attributes(message, "publish");
        if message.topic().is_none() {
            attrs.push(KeyValue::new(attributes::DESTINATION_NAME, topic.to_string()));
        }

        let span = self
            .tracer
            .span_builder(format!("{topic} publish"))
            .with_kind(SpanKind::Producer)
            .with_attributes(attrs)
            .start_with_context(&self.tracer, parent);

        let cx = parent.with_span(span);
        self.propagator.inject_context(&cx, &mut message.metadata);
        cx
    }
}

fn base_attributes(message: &Message, operation: &'static str) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new(attributes::MESSAGING_SYSTEM, MESSAGING_SYSTEM),
        KeyValue::new(attributes::OPERATION_TYPE, operation),
        KeyValue::new(attributes::MESSAGE_ID, message.uuid.clone()),
        KeyValue::new(attributes::BODY_SIZE, message.payload.len() as i64),
    ];
    if let Some(topic) = message.topic() {
        attrs.push(KeyValue::new(attributes::DESTINATION_NAME, topic.to_string()));
    }
    if let Some(cid) = message.correlation_id() {
        attrs.push(KeyValue::new(attributes::CORRELATION_ID, cid.to_string()));
    }
    attrs
}
