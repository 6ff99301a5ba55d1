//! EventCatalog documentation tree generated from an AsyncAPI document.
//!
//! The pipeline always runs in the same order: the five output directories
//! are removed, then the team, channel, event, service and domain pages are
//! written from scratch. Nothing in the output depends on the clock or on
//! the previous run, so generating twice from the same input yields identical
//! files.

use frolf_events_domain::events::{is_request_event, topic_domain};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::asyncapi::{self, AsyncApiDocument, COMPONENTS_SCHEMAS};
use crate::error::{CodegenError, Result};

/// Default location of the AsyncAPI input
pub const DEFAULT_INPUT: &str = "asyncapi/asyncapi.yaml";
/// Default root of the generated catalog
pub const DEFAULT_OUTPUT: &str = "eventcatalog";

/// Directories owned by the generator; removed on every run
pub const GENERATED_DIRS: [&str; 5] = ["events", "channels", "services", "domains", "teams"];

pub const TEAM_ID: &str = "frolf-bot-team";
pub const CHANNEL_ID: &str = "nats-jetstream";
pub const BACKEND_SERVICE_ID: &str = "frolf-bot";
pub const DISCORD_SERVICE_ID: &str = "discord-frolf-bot";
pub const CATALOG_VERSION: &str = "1.0.0";
pub const SCHEMA_FILE: &str = "schema.json";

/// Colors of the known domains, in page order
pub const DOMAIN_PALETTE: [(&str, &str); 5] = [
    ("round", "#10b981"),
    ("score", "#f59e0b"),
    ("user", "#3b82f6"),
    ("leaderboard", "#8b5cf6"),
    ("guild", "#ec4899"),
];
pub const FALLBACK_COLOR: &str = "#6b7280";

const TEXT_COLOR: &str = "#ffffff";
const VERSION_BADGE_COLOR: &str = "#374151";
const GO_BADGE_COLOR: &str = "#00add8";
const WATERMILL_BADGE_COLOR: &str = "#1f2937";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub content: String,
    pub background_color: String,
    pub text_color: String,
}

impl Badge {
    fn new(content: impl Into<String>, background_color: &str) -> Self {
        Self {
            content: content.into(),
            background_color: background_color.to_string(),
            text_color: TEXT_COLOR.to_string(),
        }
    }
}

/// Versioned pointer to another catalog resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub id: String,
    pub version: String,
}

impl ResourceRef {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: CATALOG_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TeamFrontMatter {
    id: String,
    name: String,
    summary: String,
}

#[derive(Debug, Serialize)]
struct ChannelFrontMatter {
    id: String,
    name: String,
    version: String,
    summary: String,
    address: String,
    protocols: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventFrontMatter {
    id: String,
    name: String,
    version: String,
    summary: String,
    owners: Vec<String>,
    schema_path: String,
    badges: Vec<Badge>,
    channels: Vec<ResourceRef>,
}

#[derive(Debug, Serialize)]
struct ServiceFrontMatter {
    id: String,
    name: String,
    version: String,
    summary: String,
    owners: Vec<String>,
    badges: Vec<Badge>,
    sends: Vec<ResourceRef>,
    receives: Vec<ResourceRef>,
}

#[derive(Debug, Serialize)]
struct DomainFrontMatter {
    id: String,
    name: String,
    version: String,
    summary: String,
    owners: Vec<String>,
    badges: Vec<Badge>,
    services: Vec<ResourceRef>,
}

/// Counts of the pages written by one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub events: usize,
    pub services: usize,
    pub domains: usize,
}

/// Read the AsyncAPI document at `input` and write the catalog under `output`
pub fn run(input: &Path, output: &Path) -> Result<CatalogSummary> {
    let yaml = fs::read_to_string(input).map_err(|e| CodegenError::io(input, e))?;
    let document = asyncapi::from_yaml(&yaml)?;
    generate(&document, output)
}

/// Write the catalog for `document` under `root`
pub fn generate(document: &AsyncApiDocument, root: &Path) -> Result<CatalogSummary> {
    clean(root)?;
    write_team(root)?;
    write_channel(root)?;
    let events = write_events(document, root)?;
    let services = write_services(document, root)?;
    let domains = write_domains(document, root)?;

    let summary = CatalogSummary {
        events,
        services,
        domains,
    };
    tracing::info!(
        root = %root.display(),
        events = summary.events,
        services = summary.services,
        domains = summary.domains,
        "Generated event catalog"
    );
    Ok(summary)
}

fn clean(root: &Path) -> Result<()> {
    for dir in GENERATED_DIRS {
        let path = root.join(dir);
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|e| CodegenError::io(&path, e))?;
        }
    }
    Ok(())
}

fn write_team(root: &Path) -> Result<()> {
    let front_matter = TeamFrontMatter {
        id: TEAM_ID.to_string(),
        name: "Frolf Bot Team".to_string(),
        summary: "Maintainers of the frolf bot backend, the Discord bot and their shared event contracts".to_string(),
    };
    let body = "\
## Overview

The Frolf Bot team owns every event, service and domain in this catalog.
Contract changes are made in the shared events library and regenerated here.
";
    write_page(&root.join("teams").join(format!("{TEAM_ID}.mdx")), &front_matter, body)
}

fn write_channel(root: &Path) -> Result<()> {
    let front_matter = ChannelFrontMatter {
        id: CHANNEL_ID.to_string(),
        name: "NATS JetStream".to_string(),
        version: CATALOG_VERSION.to_string(),
        summary: "Durable NATS JetStream subjects carrying every frolf bot event".to_string(),
        address: "{domain}.{event}.v1".to_string(),
        protocols: vec!["nats".to_string()],
    };
    let body = "\
## Overview

Every event is published on a JetStream subject named after its topic,
`{domain}.{event}.v1`. Messages carry JSON payloads and metadata headers for
correlation ids and trace context.

<NodeGraph />
";
    write_page(
        &root.join("channels").join(CHANNEL_ID).join("index.mdx"),
        &front_matter,
        body,
    )
}

fn write_events(document: &AsyncApiDocument, root: &Path) -> Result<usize> {
    let schemas = &document.components.schemas;

    for (topic, channel) in &document.channels {
        let message = channel.message().cloned().unwrap_or_default();
        let id = event_id(topic);
        let domain = topic_domain(topic);

        let name = message
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format_event_name(topic));
        let description = message
            .description
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| describe_event(topic));

        let front_matter = EventFrontMatter {
            id: id.clone(),
            name,
            version: CATALOG_VERSION.to_string(),
            summary: description.clone(),
            owners: vec![TEAM_ID.to_string()],
            schema_path: SCHEMA_FILE.to_string(),
            badges: vec![
                Badge::new(title_case(domain), domain_color(domain)),
                Badge::new("v1", VERSION_BADGE_COLOR),
            ],
            channels: vec![ResourceRef::new(CHANNEL_ID)],
        };

        let (producer, consumer) = if is_request_event(topic) {
            (DISCORD_SERVICE_ID, BACKEND_SERVICE_ID)
        } else {
            (BACKEND_SERVICE_ID, DISCORD_SERVICE_ID)
        };
        let body = format!(
            "\
## Overview

{description}

Topic: `{topic}`. Produced by `{producer}` and consumed by `{consumer}`.

## Schema

<SchemaViewer file=\"{SCHEMA_FILE}\" />

## Architecture

<NodeGraph />
"
        );

        let dir = root.join("events").join(&id);
        write_page(&dir.join("index.mdx"), &front_matter, &body)?;

        let schema = inline_refs(&message.payload, schemas, &mut Vec::new());
        let mut json = serde_json::to_string_pretty(&schema)?;
        json.push('\n');
        write_file(&dir.join(SCHEMA_FILE), &json)?;
    }

    Ok(document.channels.len())
}

fn write_services(document: &AsyncApiDocument, root: &Path) -> Result<usize> {
    let (requests, notifications): (Vec<&String>, Vec<&String>) =
        document.channels.keys().partition(|topic| is_request_event(topic));
    let refs = |topics: &[&String]| topics.iter().map(|t| ResourceRef::new(event_id(t))).collect::<Vec<_>>();

    let services = [
        (
            BACKEND_SERVICE_ID,
            "Frolf Bot Backend",
            "Backend service owning rounds, scores, leaderboards and guild configuration",
            refs(&notifications),
            refs(&requests),
        ),
        (
            DISCORD_SERVICE_ID,
            "Discord Frolf Bot",
            "Discord bot turning guild interactions into requests and rendering backend results",
            refs(&requests),
            refs(&notifications),
        ),
    ];
    let count = services.len();

    for (id, name, summary, sends, receives) in services {
        let body = format!(
            "\
## Overview

{summary}.

The service sends {} events and receives {} events over the `{CHANNEL_ID}` channel.

<NodeGraph />
",
            sends.len(),
            receives.len(),
        );
        let front_matter = ServiceFrontMatter {
            id: id.to_string(),
            name: name.to_string(),
            version: CATALOG_VERSION.to_string(),
            summary: summary.to_string(),
            owners: vec![TEAM_ID.to_string()],
            badges: vec![
                Badge::new("Go", GO_BADGE_COLOR),
                Badge::new("Watermill", WATERMILL_BADGE_COLOR),
            ],
            sends,
            receives,
        };
        write_page(&root.join("services").join(id).join("index.mdx"), &front_matter, &body)?;
    }

    Ok(count)
}

fn write_domains(document: &AsyncApiDocument, root: &Path) -> Result<usize> {
    let domains = catalog_domains(document.channels.keys().map(String::as_str));

    for domain in &domains {
        let name = title_case(domain);
        let event_count = document
            .channels
            .keys()
            .filter(|topic| topic_domain(topic) == domain.as_str())
            .count();
        let front_matter = DomainFrontMatter {
            id: domain.clone(),
            name: name.clone(),
            version: CATALOG_VERSION.to_string(),
            summary: format!("{name} bounded context of the frolf bot"),
            owners: vec![TEAM_ID.to_string()],
            badges: vec![Badge::new("DDD", domain_color(domain))],
            services: vec![
                ResourceRef::new(BACKEND_SERVICE_ID),
                ResourceRef::new(DISCORD_SERVICE_ID),
            ],
        };
        let body = format!(
            "\
## Overview

The {domain} domain groups {event_count} events published under `{domain}.*.v1`.

<NodeGraph />
"
        );
        write_page(&root.join("domains").join(domain).join("index.mdx"), &front_matter, &body)?;
    }

    Ok(domains.len())
}

/// Palette domains in palette order, then any other topic domain sorted
pub fn catalog_domains<'a>(topics: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut domains: Vec<String> = DOMAIN_PALETTE.iter().map(|(d, _)| d.to_string()).collect();
    let mut extra: Vec<String> = topics
        .into_iter()
        .map(topic_domain)
        .filter(|d| !d.is_empty() && domain_color_known(d).is_none())
        .map(str::to_string)
        .collect();
    extra.sort();
    extra.dedup();
    domains.extend(extra);
    domains
}

fn domain_color_known(domain: &str) -> Option<&'static str> {
    DOMAIN_PALETTE
        .iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, color)| *color)
}

/// Badge color of a topic domain
pub fn domain_color(domain: &str) -> &'static str {
    domain_color_known(domain).unwrap_or(FALLBACK_COLOR)
}

/// Catalog id of a topic: dots become dashes
pub fn event_id(topic: &str) -> String {
    topic.replace('.', "-")
}

/// Display name of a topic: the `.v1` suffix dropped and each segment title-cased.
///
/// `format_event_name("round.created.v1") == "Round Created"`
pub fn format_event_name(topic: &str) -> String {
    let base = topic.strip_suffix(".v1").unwrap_or(topic);
    base.split('.')
        .filter(|segment| !segment.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last path segment of a JSON reference; empty for an empty reference
pub fn extract_ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or_default()
}

fn title_case(text: &str) -> String {
    text.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Description for events the AsyncAPI document leaves undescribed
pub fn describe_event(topic: &str) -> String {
    let base = topic.strip_suffix(".v1").unwrap_or(topic).to_ascii_lowercase();
    let segments: Vec<&str> = base.split('.').collect();
    let subject_without = |keyword: &str| {
        segments
            .iter()
            .filter(|s| !s.contains(keyword))
            .map(|s| s.replace('_', " "))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let domain = topic_domain(topic);

    if base.contains("request") {
        format!(
            "Command event requesting a {} operation. Published by the Discord bot and handled by the backend.",
            subject_without("request")
        )
    } else if base.contains("created") {
        format!("Notification that a {} entity was successfully created.", subject_without("created"))
    } else if base.contains("updated") {
        format!("Notification that a {} entity was successfully updated.", subject_without("updated"))
    } else if base.contains("deleted") {
        format!("Notification that a {} entity was successfully deleted.", subject_without("deleted"))
    } else if base.contains("failed") {
        format!("Reports that a {} operation failed. Carries the failure reason.", subject_without("failed"))
    } else if base.contains("validated") {
        format!("Confirms that a {} passed validation.", subject_without("validated"))
    } else if base.contains("response") {
        format!("Response carrying the result of a {} request.", subject_without("response"))
    } else {
        format!("Event in the {domain} domain.")
    }
}

/// Replace references into `components.schemas` with the referenced schema.
///
/// A reference back to a schema that is already being expanded is left in
/// place. Unknown references are kept as-is.
fn inline_refs(value: &Value, schemas: &std::collections::BTreeMap<String, Value>, stack: &mut Vec<String>) -> Value {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .filter(|r| r.starts_with(COMPONENTS_SCHEMAS))
                .map(|r| extract_ref_name(r).to_string());

            if let Some(name) = target {
                match schemas.get(&name) {
                    Some(schema) if !stack.contains(&name) => {
                        stack.push(name);
                        let mut resolved = match inline_refs(schema, schemas, stack) {
                            Value::Object(resolved) => resolved,
                            other => {
                                stack.pop();
                                return other;
                            }
                        };
                        stack.pop();
                        for (key, sibling) in map {
                            if key != "$ref" {
                                resolved.insert(key.clone(), inline_refs(sibling, schemas, stack));
                            }
                        }
                        return Value::Object(resolved);
                    }
                    Some(_) => return value.clone(),
                    None => {
                        tracing::warn!(schema = %name, "Reference to unknown schema left unresolved");
                        return value.clone();
                    }
                }
            }

            Value::Object(
                map.iter()
                    .map(|(key, v)| (key.clone(), inline_refs(v, schemas, stack)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| inline_refs(v, schemas, stack)).collect()),
        other => other.clone(),
    }
}

fn write_page<T: Serialize>(path: &Path, front_matter: &T, body: &str) -> Result<()> {
    let yaml = serde_yaml::to_string(front_matter)?;
    write_file(path, &format!("---\n{yaml}---\n\n{body}"))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| CodegenError::io(PathBuf::from(path), e))
}
