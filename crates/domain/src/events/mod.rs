//! Event contracts for the frolf bot message bus.
//!
//! Every event is published on a topic of the form `<domain>.<event>.v1`.
//! Each functional area owns a module exposing its topic constants, its V1
//! payload types and a `v1_registry()` accessor describing who produces and
//! who consumes each topic. [`v1_registry`] unions the areas and rejects
//! duplicate topics.
//!
//! A new payload revision never mutates an existing entry: it is registered as
//! a sibling topic with the next version suffix.

pub mod auth;
pub mod guild;
pub mod leaderboard;
pub mod round;
pub mod score;
pub mod user;

use crate::errors::RegistryError;
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// Version suffix carried by every topic
pub const V1_SUFFIX: &str = ".v1";

static TOPIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z_]*(\.[a-z_]+)+\.v1$").expect("topic pattern is a valid regex")
});

/// Service identity of a producer or consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Service {
    /// The backend (persistence and game logic)
    Backend,
    /// The Discord-facing bot
    Discord,
}

impl Service {
    /// Wire name of the service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Discord => "discord",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service plus the module inside it that produces or handles an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Actor {
    pub service: Service,
    pub module: &'static str,
}

impl Actor {
    /// Backend module
    pub const fn backend(module: &'static str) -> Self {
        Self {
            service: Service::Backend,
            module,
        }
    }

    /// Discord bot module
    pub const fn discord(module: &'static str) -> Self {
        Self {
            service: Service::Discord,
            module,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.module)
    }
}

type SchemaFn = fn(&mut SchemaGenerator) -> Schema;

fn subschema<T: JsonSchema>(generator: &mut SchemaGenerator) -> Schema {
    generator.subschema_for::<T>()
}

/// Compile-time descriptor of an event payload type.
///
/// Holds enough to derive the payload's JSON schema when generating
/// documentation; nothing at runtime consults it.
#[derive(Debug, Clone, Copy)]
pub struct PayloadSchema {
    type_name: &'static str,
    generate: Option<SchemaFn>,
}

impl PayloadSchema {
    /// Descriptor for a structured payload type
    pub fn of<T: JsonSchema>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            generate: Some(subschema::<T>),
        }
    }

    /// Descriptor for a free-form key/value payload
    pub const fn opaque() -> Self {
        Self {
            type_name: "map",
            generate: None,
        }
    }

    /// Fully-qualified Rust type name of the payload
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        self.type_name.rsplit("::").next().unwrap_or(self.type_name)
    }

    /// True for free-form payloads
    pub fn is_opaque(&self) -> bool {
        self.generate.is_none()
    }

    /// Schema for the payload, registering any named definitions with
    /// `generator`. Opaque payloads yield an empty object schema.
    pub fn schema(&self, generator: &mut SchemaGenerator) -> Schema {
        match self.generate {
            Some(generate) => generate(generator),
            None => json_schema!({ "type": "object" }),
        }
    }
}

/// Contract metadata for one topic
#[derive(Debug, Clone)]
pub struct EventInfo {
    pub payload: PayloadSchema,
    pub summary: &'static str,
    pub description: &'static str,
    pub producer: Actor,
    pub consumers: Vec<Actor>,
}

impl EventInfo {
    /// Describe an event carrying payload type `T`
    pub fn new<T: JsonSchema>(summary: &'static str, description: &'static str, producer: Actor) -> Self {
        Self::with_payload(PayloadSchema::of::<T>(), summary, description, producer)
    }

    /// Describe an event with an explicit payload descriptor
    pub fn with_payload(
        payload: PayloadSchema,
        summary: &'static str,
        description: &'static str,
        producer: Actor,
    ) -> Self {
        Self {
            payload,
            summary,
            description,
            producer,
            consumers: Vec::new(),
        }
    }

    /// Add consumers
    pub fn consumed_by(mut self, consumers: impl IntoIterator<Item = Actor>) -> Self {
        self.consumers.extend(consumers);
        self
    }
}

/// Topic-keyed event contracts, iterated in topic order
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    entries: BTreeMap<&'static str, EventInfo>,
}

impl EventRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic, failing if it is already present
    pub fn register(&mut self, topic: &'static str, info: EventInfo) -> Result<(), RegistryError> {
        match self.entries.entry(topic) {
            btree_map::Entry::Occupied(_) => Err(RegistryError::DuplicateTopic(topic.to_string())),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(info);
                Ok(())
            }
        }
    }

    /// Look up a topic
    pub fn get(&self, topic: &str) -> Option<&EventInfo> {
        self.entries.get(topic)
    }

    /// True if the topic is registered
    pub fn contains(&self, topic: &str) -> bool {
        self.entries.contains_key(topic)
    }

    /// Entries in topic order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &EventInfo)> {
        self.entries.iter().map(|(topic, info)| (*topic, info))
    }

    /// Registered topics in order
    pub fn topics(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered topics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every topic against the naming convention
    pub fn validate(&self) -> Result<(), RegistryError> {
        self.topics().try_for_each(validate_topic)
    }

    /// Merge registries, rejecting any topic registered twice
    pub fn union(registries: impl IntoIterator<Item = EventRegistry>) -> Result<Self, RegistryError> {
        let mut merged = Self::new();
        for registry in registries {
            for (topic, info) in registry.entries {
                merged.register(topic, info)?;
            }
        }
        Ok(merged)
    }

    fn from_entries(entries: impl IntoIterator<Item = (&'static str, EventInfo)>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (topic, info) in entries {
            registry.register(topic, info)?;
        }
        Ok(registry)
    }
}

/// Functional areas (bounded contexts) that own topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionalArea {
    Round,
    Score,
    User,
    Leaderboard,
    Guild,
    Auth,
}

impl FunctionalArea {
    /// All areas
    pub const ALL: [FunctionalArea; 6] = [
        Self::Round,
        Self::Score,
        Self::User,
        Self::Leaderboard,
        Self::Guild,
        Self::Auth,
    ];

    /// Topic prefix of the area
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Score => "score",
            Self::User => "user",
            Self::Leaderboard => "leaderboard",
            Self::Guild => "guild",
            Self::Auth => "auth",
        }
    }

    /// Parse a topic prefix
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|area| area.as_str() == prefix)
    }

    /// The area's V1 registry
    pub fn v1_registry(&self) -> Result<EventRegistry, RegistryError> {
        match self {
            Self::Round => round::v1_registry(),
            Self::Score => score::v1_registry(),
            Self::User => user::v1_registry(),
            Self::Leaderboard => leaderboard::v1_registry(),
            Self::Guild => guild::v1_registry(),
            Self::Auth => auth::v1_registry(),
        }
    }
}

impl fmt::Display for FunctionalArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every functional area's V1 registry, unmerged.
///
/// Fails if an area registers one of its topics twice.
pub fn all_v1_registries() -> Result<Vec<EventRegistry>, RegistryError> {
    FunctionalArea::ALL.iter().map(FunctionalArea::v1_registry).collect()
}

/// The union of every functional area's V1 registry.
///
/// Fails if two areas register the same topic or a topic breaks the naming
/// convention.
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    let registry = EventRegistry::union(all_v1_registries()?)?;
    registry.validate()?;
    Ok(registry)
}

/// Check a topic against `<domain>.<event>.v1`
pub fn validate_topic(topic: &str) -> Result<(), RegistryError> {
    if TOPIC_PATTERN.is_match(topic) {
        Ok(())
    } else {
        Err(RegistryError::InvalidTopic(topic.to_string()))
    }
}

/// Request topics are produced by the Discord bot and handled by the backend;
/// everything else flows the other way.
pub fn is_request_event(topic: &str) -> bool {
    topic.to_ascii_lowercase().contains("request")
}

/// Leading domain segment of a topic
pub fn topic_domain(topic: &str) -> &str {
    topic.split('.').next().unwrap_or(topic)
}
