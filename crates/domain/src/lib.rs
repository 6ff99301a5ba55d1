//! Frolf Bot Event Contracts
//!
//! This crate defines the wire contracts shared by the frolf bot services:
//! strongly-typed identifiers, guild configuration records, the V1 event
//! payloads of every functional area and the registry describing which
//! service produces and consumes each topic.
//!
//! ## Architecture
//!
//! - **identifiers**: Discord snowflake newtypes, round ids, tags and scores
//! - **shared**: Small records embedded in several payloads
//! - **guild**: Guild configuration and bot-created resource tracking
//! - **events**: Topics, payloads and the per-area event registries
//! - **error_event**: The payload published on the error topic
//! - **errors**: Registry construction errors
//!
//! ## Usage
//!
//! ```rust
//! use frolf_events_domain::events::{self, round};
//!
//! let registry = events::v1_registry().unwrap();
//! let info = registry.get(round::ROUND_CREATED_V1).unwrap();
//! assert!(!events::is_request_event(round::ROUND_CREATED_V1));
//! assert_eq!(info.payload.short_name(), "RoundCreatedPayloadV1");
//! ```

#![warn(clippy::all)]

pub mod error_event;
pub mod errors;
pub mod events;
pub mod guild;
pub mod identifiers;
pub mod shared;

// Re-export commonly used types
pub use error_event::{ErrorEventPayload, DEFAULT_ERROR_TOPIC};
pub use errors::RegistryError;
pub use events::{Actor, EventInfo, EventRegistry, FunctionalArea, PayloadSchema, Service};
pub use guild::{resource_state_is_empty, DeletionResult, DeletionStatus, GuildConfig, ResourceState};
pub use identifiers::*;
pub use shared::{ScoreInfo, TagMapping};
