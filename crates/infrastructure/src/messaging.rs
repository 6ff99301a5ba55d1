//! Messaging module - Event bus abstraction
//!
//! Services publish and subscribe through [`EventBus`]. The production
//! broker lives outside this crate; [`InMemoryEventBus`] provides the same
//! contract in-process for tests and local tooling, including delayed
//! delivery of scheduled round messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{Error, Result};

/// Well-known metadata keys
pub mod metadata {
    pub const CORRELATION_ID: &str = "correlation_id";
    pub const TOPIC: &str = "topic";
    pub const HANDLER_NAME: &str = "handler_name";
    pub const DEAD_LETTER: &str = "dead_letter";
    pub const DELIVERY_ATTEMPT: &str = "jetstream.delivery_attempt";
    /// Round a scheduled message belongs to
    pub const ROUND_ID: &str = "round_id";
    /// RFC 3339 time before which a message must not be delivered
    pub const EXECUTE_AT: &str = "execute_at";
}

/// A message on the bus: an opaque payload plus string metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub uuid: String,
    pub payload: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

impl Message {
    /// Create a message with a fresh UUID
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            payload: payload.into(),
            metadata: HashMap::new(),
        }
    }

    /// Create a message carrying the JSON encoding of `payload`
    pub fn json<T: Serialize>(payload: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_vec(payload)?))
    }

    /// Decode the JSON payload
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set a metadata entry in place
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Look up a metadata entry
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.metadata_value(metadata::CORRELATION_ID)
    }

    pub fn topic(&self) -> Option<&str> {
        self.metadata_value(metadata::TOPIC)
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.metadata_value(metadata::HANDLER_NAME)
    }

    /// True when the message was routed to a dead-letter queue
    pub fn is_dead_letter(&self) -> bool {
        self.metadata_value(metadata::DEAD_LETTER)
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }

    /// Broker delivery attempt, 0 when unknown
    pub fn delivery_attempt(&self) -> i64 {
        self.metadata_value(metadata::DELIVERY_ATTEMPT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn round_id(&self) -> Option<&str> {
        self.metadata_value(metadata::ROUND_ID)
    }

    /// Scheduled delivery time, if any
    pub fn execute_at(&self) -> Option<DateTime<Utc>> {
        self.metadata_value(metadata::EXECUTE_AT)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Schedule the message for delivery at `at` on behalf of a round
    pub fn schedule(mut self, round_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.set_metadata(metadata::ROUND_ID, round_id);
        self.set_metadata(metadata::EXECUTE_AT, at.to_rfc3339());
        self
    }
}

/// Receiving end of a subscription. Closed when the subscription's
/// cancellation token fires or the bus is closed.
pub type MessageStream = mpsc::Receiver<Message>;

/// Publish/subscribe contract shared by all services.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish messages to a topic
    async fn publish(&self, topic: &str, messages: Vec<Message>) -> Result<()>;

    /// Subscribe to a topic until `token` is cancelled
    async fn subscribe(&self, token: CancellationToken, topic: &str) -> Result<MessageStream>;

    /// Drop every pending scheduled message of a round
    async fn cancel_scheduled_message(&self, token: CancellationToken, round_id: &str) -> Result<()>;

    /// Deliver scheduled messages as they come due, until `token` is cancelled
    async fn process_delayed_messages(&self, token: CancellationToken);

    /// Stop accepting publishes and end all subscriptions
    async fn close(&self) -> Result<()>;
}

/// In-memory bus configuration.
#[derive(Debug, Clone)]
pub struct InMemoryBusConfig {
    /// Per-topic buffer; slow subscribers beyond it lose messages
    pub channel_capacity: usize,
    /// Subscription stream buffer
    pub stream_capacity: usize,
    /// How often scheduled messages are checked
    pub poll_interval: Duration,
}

impl Default for InMemoryBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            stream_capacity: 100,
            poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
struct ScheduledMessage {
    topic: String,
    execute_at: DateTime<Utc>,
    message: Message,
}

/// Broadcast-backed in-process bus.
///
/// Every subscriber of a topic sees every message published after it
/// subscribed. Messages whose `execute_at` lies in the future are held,
/// keyed by their `round_id`, until [`EventBus::process_delayed_messages`]
/// or [`InMemoryEventBus::deliver_due`] releases them.
pub struct InMemoryEventBus {
    config: InMemoryBusConfig,
    topics: Mutex<HashMap<String, broadcast::Sender<Message>>>,
    scheduled: Mutex<BTreeMap<String, Vec<ScheduledMessage>>>,
    closed: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_config(InMemoryBusConfig::default())
    }

    pub fn with_config(config: InMemoryBusConfig) -> Self {
        Self {
            config,
            topics: Mutex::new(HashMap::new()),
            scheduled: Mutex::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of messages waiting for their scheduled time
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().values().map(Vec::len).sum()
    }

    /// Deliver every scheduled message due at or before `now`.
    ///
    /// Returns how many messages were delivered.
    pub fn deliver_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<ScheduledMessage> = {
            let mut scheduled = self.scheduled.lock();
            let mut due = Vec::new();
            scheduled.retain(|_, pending| {
                let (ready, waiting): (Vec<_>, Vec<_>) =
                    pending.drain(..).partition(|m| m.execute_at <= now);
                due.extend(ready);
                *pending = waiting;
                !pending.is_empty()
            });
            due
        };

        let delivered = due.len();
        for entry in due {
            self.dispatch(&entry.topic, entry.message);
        }
        delivered
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::BusClosed);
        }
        Ok(())
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Message> {
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .clone()
    }

    fn dispatch(&self, topic: &str, message: Message) {
        let sender = self.sender(topic);
        match sender.send(message) {
            Ok(receivers) => debug!(topic = %topic, receivers, "Message dispatched"),
            // No subscriber is not an error: the message is simply dropped
            Err(_) => debug!(topic = %topic, "Message dropped, no subscribers"),
        }
    }

    fn hold(&self, topic: &str, execute_at: DateTime<Utc>, message: Message) {
        let key = message.round_id().unwrap_or(message.uuid.as_str()).to_string();
        debug!(topic = %topic, round_id = %key, execute_at = %execute_at, "Message scheduled");
        self.scheduled.lock().entry(key).or_default().push(ScheduledMessage {
            topic: topic.to_string(),
            execute_at,
            message,
        });
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn publish(&self, topic: &str, messages: Vec<Message>) -> Result<()> {
        self.ensure_open()?;
        if topic.is_empty() {
            return Err(Error::Messaging("topic must not be empty".to_string()));
        }

        let now = Utc::now();
        for mut message in messages {
            message.set_metadata(metadata::TOPIC, topic);
            match message.execute_at() {
                Some(at) if at > now => self.hold(topic, at, message),
                _ => self.dispatch(topic, message),
            }
        }
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn subscribe(&self, token: CancellationToken, topic: &str) -> Result<MessageStream> {
        self.ensure_open()?;

        let mut receiver = self.sender(topic).subscribe();
        let (tx, rx) = mpsc::channel(self.config.stream_capacity);
        let topic_owned = topic.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    received = receiver.recv() => match received {
                        Ok(message) => {
                            if tx.send(message).await.is_err() {
                                // Receiver dropped, stop listening
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(topic = %topic_owned, skipped, "Subscriber lagged, messages lost");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(topic = %topic_owned, "Subscription ended");
        });

        debug!(topic = %topic, "Subscribed to topic");
        Ok(rx)
    }

    #[instrument(skip(self, token))]
    async fn cancel_scheduled_message(&self, token: CancellationToken, round_id: &str) -> Result<()> {
        if token.is_cancelled() {
            return Err(Error::Messaging("operation cancelled".to_string()));
        }
        let removed = self.scheduled.lock().remove(round_id).map_or(0, |m| m.len());
        info!(round_id = %round_id, removed, "Scheduled messages cancelled");
        Ok(())
    }

    async fn process_delayed_messages(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if self.closed.load(Ordering::Acquire) {
                        break;
                    }
                    let delivered = self.deliver_due(Utc::now());
                    if delivered > 0 {
                        debug!(delivered, "Scheduled messages delivered");
                    }
                }
            }
        }
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // Dropping the senders ends every subscription stream
        self.topics.lock().clear();
        self.scheduled.lock().clear();
        info!("Event bus closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_message_metadata_accessors() {
        let message = Message::new(b"{}".to_vec())
            .with_metadata(metadata::CORRELATION_ID, "cid")
            .with_metadata(metadata::DEAD_LETTER, "true")
            .with_metadata(metadata::DELIVERY_ATTEMPT, "3");

        assert_eq!(message.correlation_id(), Some("cid"));
        assert!(message.is_dead_letter());
        assert_eq!(message.delivery_attempt(), 3);
        assert_eq!(message.topic(), None);
    }

    #[test]
    fn test_malformed_metadata_falls_back() {
        let message = Message::new(Vec::new())
            .with_metadata(metadata::DEAD_LETTER, "maybe")
            .with_metadata(metadata::DELIVERY_ATTEMPT, "x")
            .with_metadata(metadata::EXECUTE_AT, "tomorrow");

        assert!(!message.is_dead_letter());
        assert_eq!(message.delivery_attempt(), 0);
        assert!(message.execute_at().is_none());
    }

    #[test]
    fn test_json_payload() {
        let message = Message::json(&serde_json::json!({"guild_id": "g1"})).unwrap();
        let value: serde_json::Value = message.decode().unwrap();
        assert_eq!(value["guild_id"], "g1");
        assert!(message.decode::<Vec<u8>>().is_err());
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = InMemoryEventBus::new();
        let token = CancellationToken::new();
        let mut stream = bus.subscribe(token.clone(), "round.created.v1").await.unwrap();

        bus.publish("round.created.v1", vec![Message::new(b"a".to_vec())])
            .await
            .unwrap();

        let received = stream.recv().await.unwrap();
        assert_eq!(received.payload, b"a");
        assert_eq!(received.topic(), Some("round.created.v1"));
    }

    #[tokio::test]
    async fn test_cancelled_token_ends_stream() {
        let bus = InMemoryEventBus::new();
        let token = CancellationToken::new();
        let mut stream = bus.subscribe(token.clone(), "user.created.v1").await.unwrap();

        token.cancel();
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_rejects_publish_and_ends_streams() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus
            .subscribe(CancellationToken::new(), "user.created.v1")
            .await
            .unwrap();

        bus.close().await.unwrap();

        assert!(stream.recv().await.is_none());
        let err = bus.publish("user.created.v1", vec![Message::new(Vec::new())]).await;
        assert!(matches!(err, Err(Error::BusClosed)));
        assert!(bus.subscribe(CancellationToken::new(), "x.y.v1").await.is_err());
    }

    #[tokio::test]
    async fn test_future_messages_are_held_until_due() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus
            .subscribe(CancellationToken::new(), "round.reminder.v1")
            .await
            .unwrap();

        let at = Utc::now() + ChronoDuration::hours(1);
        let message = Message::new(b"r".to_vec()).schedule("round-1", at);
        bus.publish("round.reminder.v1", vec![message]).await.unwrap();
        assert_eq!(bus.scheduled_count(), 1);

        assert_eq!(bus.deliver_due(Utc::now()), 0);
        assert_eq!(bus.deliver_due(at), 1);
        assert_eq!(bus.scheduled_count(), 0);

        let received = stream.recv().await.unwrap();
        assert_eq!(received.round_id(), Some("round-1"));
    }

    #[tokio::test]
    async fn test_cancel_scheduled_message_drops_round() {
        let bus = InMemoryEventBus::new();
        let at = Utc::now() + ChronoDuration::hours(1);
        bus.publish(
            "round.started.v1",
            vec![
                Message::new(Vec::new()).schedule("round-1", at),
                Message::new(Vec::new()).schedule("round-1", at),
                Message::new(Vec::new()).schedule("round-2", at),
            ],
        )
        .await
        .unwrap();

        bus.cancel_scheduled_message(CancellationToken::new(), "round-1")
            .await
            .unwrap();
        assert_eq!(bus.scheduled_count(), 1);

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        assert!(bus.cancel_scheduled_message(cancelled, "round-2").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let bus = InMemoryEventBus::new();
        let err = bus.publish("", vec![Message::new(Vec::new())]).await.unwrap_err();
        assert!(matches!(err, Error::Messaging(_)));
    }
}
