//! Dashboard access events: one-time magic links issued to guild members.

use super::{Actor, EventInfo, EventRegistry, RegistryError};
use crate::identifiers::{GuildId, UserId};
use crate::events::user::UserRole;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const AUTH_MAGIC_LINK_REQUESTED_V1: &str = "auth.magic_link.requested.v1";
pub const AUTH_MAGIC_LINK_GENERATED_V1: &str = "auth.magic_link.generated.v1";
pub const AUTH_MAGIC_LINK_FAILED_V1: &str = "auth.magic_link.failed.v1";
pub const AUTH_SESSION_REVOKED_V1: &str = "auth.session.revoked.v1";

/// Every auth topic
pub const ALL_TOPICS: [&str; 4] = [
    AUTH_MAGIC_LINK_REQUESTED_V1,
    AUTH_MAGIC_LINK_GENERATED_V1,
    AUTH_MAGIC_LINK_FAILED_V1,
    AUTH_SESSION_REVOKED_V1,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MagicLinkRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role: UserRole,
    /// Where the bot should DM or reply with the link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MagicLinkGeneratedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MagicLinkFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionRevokedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub reason: String,
}

impl MagicLinkGeneratedPayloadV1 {
    /// True once the link can no longer be used
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Auth area registry
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    let backend = Actor::backend("auth");
    let discord = Actor::discord("auth");

    EventRegistry::from_entries([
        (
            AUTH_MAGIC_LINK_REQUESTED_V1,
            EventInfo::new::<MagicLinkRequestedPayloadV1>(
                "Magic Link Requested",
                "A member asked for a dashboard login link.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            AUTH_MAGIC_LINK_GENERATED_V1,
            EventInfo::new::<MagicLinkGeneratedPayloadV1>(
                "Magic Link Generated",
                "A single-use login link was issued; the bot delivers it privately.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            AUTH_MAGIC_LINK_FAILED_V1,
            EventInfo::new::<MagicLinkFailedPayloadV1>(
                "Magic Link Failed",
                "The login link could not be issued.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            AUTH_SESSION_REVOKED_V1,
            EventInfo::new::<SessionRevokedPayloadV1>(
                "Session Revoked",
                "Dashboard sessions for the member were invalidated.",
                backend,
            )
            .consumed_by([discord]),
        ),
    ])
}
