//! AsyncAPI 2.4 projection of the event registry.
//!
//! Every registered topic becomes a channel with a single `publish`
//! operation. Payload schemas are derived with `schemars` through one shared
//! generator, so a type used by several payloads is emitted once under
//! `components.schemas`. All maps are ordered, which keeps the YAML output
//! byte-stable for an unchanged registry.

use frolf_events_domain::EventRegistry;
use schemars::SchemaGenerator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CodegenError, Result};

pub const ASYNCAPI_VERSION: &str = "2.4.0";
pub const TITLE: &str = "Frolf Bot Event API";
pub const API_VERSION: &str = "1.0.0";
pub const DESCRIPTION: &str =
    "Event contracts exchanged between the frolf bot backend and the Discord bot over NATS JetStream.";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Prefix of every reference into `components.schemas`
pub const COMPONENTS_SCHEMAS: &str = "#/components/schemas/";

const FOREIGN_DEFINITION_PREFIXES: [&str; 2] = ["#/$defs/", "#/definitions/"];

/// Root of an AsyncAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncApiDocument {
    pub asyncapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_content_type: Option<String>,
    #[serde(default)]
    pub servers: BTreeMap<String, Server>,
    #[serde(default)]
    pub channels: BTreeMap<String, Channel>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<Operation>,
}

impl Channel {
    /// The message of the channel's publish operation, falling back to the
    /// subscribe operation for documents written by other tools
    pub fn message(&self) -> Option<&MessageObject> {
        self.publish
            .as_ref()
            .or(self.subscribe.as_ref())
            .map(|operation| &operation.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub message: MessageObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Value>,
}

fn servers() -> BTreeMap<String, Server> {
    BTreeMap::from([
        (
            "production".to_string(),
            Server {
                url: "nats://nats:4222".to_string(),
                protocol: "nats".to_string(),
                description: "Production NATS JetStream cluster".to_string(),
            },
        ),
        (
            "development".to_string(),
            Server {
                url: "nats://localhost:4222".to_string(),
                protocol: "nats".to_string(),
                description: "Local NATS server".to_string(),
            },
        ),
    ])
}

/// Build the AsyncAPI document for `registry`.
///
/// Fails if a channel payload references a schema that was never emitted.
pub fn generate(registry: &EventRegistry) -> Result<AsyncApiDocument> {
    let mut generator = SchemaGenerator::default();
    let mut channels = BTreeMap::new();

    for (topic, info) in registry.iter() {
        let mut payload = info.payload.schema(&mut generator).to_value();
        rewrite_refs(&mut payload);

        let message = MessageObject {
            summary: Some(info.summary.to_string()),
            description: Some(info.description.to_string()),
            payload,
        };
        channels.insert(
            topic.to_string(),
            Channel {
                publish: Some(Operation { message }),
                subscribe: None,
            },
        );
    }

    let schemas = generator
        .definitions()
        .iter()
        .map(|(name, schema)| {
            let mut schema = schema.clone();
            rewrite_refs(&mut schema);
            (name.clone(), schema)
        })
        .collect::<BTreeMap<_, _>>();

    let document = AsyncApiDocument {
        asyncapi: ASYNCAPI_VERSION.to_string(),
        info: Info {
            title: TITLE.to_string(),
            version: API_VERSION.to_string(),
            description: DESCRIPTION.to_string(),
        },
        default_content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
        servers: servers(),
        channels,
        components: Components { schemas },
    };
    check_references(&document)?;

    tracing::debug!(
        channels = document.channels.len(),
        schemas = document.components.schemas.len(),
        "Generated AsyncAPI document"
    );
    Ok(document)
}

/// Serialize a document as YAML
pub fn to_yaml(document: &AsyncApiDocument) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Parse a YAML document
pub fn from_yaml(yaml: &str) -> Result<AsyncApiDocument> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Generate and serialize in one step
pub fn render(registry: &EventRegistry) -> Result<String> {
    to_yaml(&generate(registry)?)
}

/// Point every schema reference at `components.schemas`
fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                for prefix in FOREIGN_DEFINITION_PREFIXES {
                    if let Some(name) = reference.strip_prefix(prefix) {
                        *reference = format!("{COMPONENTS_SCHEMAS}{name}");
                        break;
                    }
                }
            }
            map.values_mut().for_each(rewrite_refs);
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_refs),
        _ => {}
    }
}

/// Names of the component schemas referenced anywhere inside `value`
pub fn referenced_schemas(value: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_refs(value, &mut names);
    names
}

fn collect_refs(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(name) = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|reference| reference.strip_prefix(COMPONENTS_SCHEMAS))
            {
                names.insert(name.to_string());
            }
            map.values().for_each(|v| collect_refs(v, names));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_refs(v, names)),
        _ => {}
    }
}

fn check_references(document: &AsyncApiDocument) -> Result<()> {
    let schemas = &document.components.schemas;
    for (topic, channel) in &document.channels {
        let Some(message) = channel.message() else {
            continue;
        };
        if let Some(name) = referenced_schemas(&message.payload)
            .into_iter()
            .find(|name| !schemas.contains_key(name))
        {
            return Err(CodegenError::MissingSchema {
                topic: topic.clone(),
                name,
            });
        }
    }
    Ok(())
}

/// Schema used for free-form payloads
pub fn opaque_schema() -> Value {
    json!({ "type": "object" })
}
