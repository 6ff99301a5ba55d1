//! Guild configuration events: setup, retrieval, updates and teardown.

use super::{Actor, EventInfo, EventRegistry, RegistryError};
use crate::guild::{GuildConfig, ResourceState};
use crate::identifiers::GuildId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GUILD_SETUP_REQUESTED_V1: &str = "guild.setup.requested.v1";
pub const GUILD_CONFIG_CREATION_REQUESTED_V1: &str = "guild.config.creation.requested.v1";
pub const GUILD_CONFIG_CREATED_V1: &str = "guild.config.created.v1";
pub const GUILD_CONFIG_CREATION_FAILED_V1: &str = "guild.config.creation.failed.v1";
pub const GUILD_CONFIG_RETRIEVAL_REQUESTED_V1: &str = "guild.config.retrieval.requested.v1";
pub const GUILD_CONFIG_RETRIEVED_V1: &str = "guild.config.retrieved.v1";
pub const GUILD_CONFIG_RETRIEVAL_FAILED_V1: &str = "guild.config.retrieval.failed.v1";
pub const GUILD_CONFIG_UPDATE_REQUESTED_V1: &str = "guild.config.update.requested.v1";
pub const GUILD_CONFIG_UPDATED_V1: &str = "guild.config.updated.v1";
pub const GUILD_CONFIG_UPDATE_FAILED_V1: &str = "guild.config.update.failed.v1";
pub const GUILD_CONFIG_DELETION_REQUESTED_V1: &str = "guild.config.deletion.requested.v1";
pub const GUILD_CONFIG_DELETED_V1: &str = "guild.config.deleted.v1";
pub const GUILD_CONFIG_DELETION_FAILED_V1: &str = "guild.config.deletion.failed.v1";
pub const GUILD_CONFIG_DELETION_RESULTS_V1: &str = "guild.config.deletion_results.v1";

/// Every guild topic
pub const ALL_TOPICS: [&str; 14] = [
    GUILD_SETUP_REQUESTED_V1,
    GUILD_CONFIG_CREATION_REQUESTED_V1,
    GUILD_CONFIG_CREATED_V1,
    GUILD_CONFIG_CREATION_FAILED_V1,
    GUILD_CONFIG_RETRIEVAL_REQUESTED_V1,
    GUILD_CONFIG_RETRIEVED_V1,
    GUILD_CONFIG_RETRIEVAL_FAILED_V1,
    GUILD_CONFIG_UPDATE_REQUESTED_V1,
    GUILD_CONFIG_UPDATED_V1,
    GUILD_CONFIG_UPDATE_FAILED_V1,
    GUILD_CONFIG_DELETION_REQUESTED_V1,
    GUILD_CONFIG_DELETED_V1,
    GUILD_CONFIG_DELETION_FAILED_V1,
    GUILD_CONFIG_DELETION_RESULTS_V1,
];

/// Which side deletes the Discord resources and fans out the per-resource
/// results on [`GUILD_CONFIG_DELETION_RESULTS_V1`].
///
/// The default keeps the topic consistent with [`is_request_event`]: a
/// non-request topic is produced by the backend.
///
/// [`is_request_event`]: crate::events::is_request_event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionFlow {
    /// The Discord worker tears down resources and reports back
    DiscordReportsResults,
    /// The backend collects results and broadcasts them
    #[default]
    BackendReportsResults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildSetupRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub guild_name: String,
    pub requested_by: String,
    /// Create channels and roles automatically instead of using existing ones
    #[serde(default)]
    pub auto_create_resources: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigCreationRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub signup_channel_id: String,
    pub signup_message_id: String,
    pub event_channel_id: String,
    pub leaderboard_channel_id: String,
    pub user_role_id: String,
    pub editor_role_id: String,
    pub admin_role_id: String,
    pub signup_emoji: String,
    pub auto_setup_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigPayloadV1 {
    pub guild_id: GuildId,
    pub config: GuildConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigFailedPayloadV1 {
    pub guild_id: GuildId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigRetrievalRequestedPayloadV1 {
    pub guild_id: GuildId,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signup_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signup_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signup_emoji: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub updated_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigDeletionRequestedPayloadV1 {
    pub guild_id: GuildId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigDeletedPayloadV1 {
    pub guild_id: GuildId,
    /// Resources to tear down; absent when the guild never completed setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_state: Option<ResourceState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfigDeletionResultsPayloadV1 {
    pub guild_id: GuildId,
    pub resource_state: ResourceState,
}

impl GuildConfigUpdateRequestedPayloadV1 {
    /// Apply the update to `config`, returning the names of changed fields.
    pub fn apply(&self, config: &mut GuildConfig) -> Vec<String> {
        let mut changed = Vec::new();
        let fields: [(&str, &Option<String>, &mut String); 8] = [
            ("signup_channel_id", &self.signup_channel_id, &mut config.signup_channel_id),
            ("signup_message_id", &self.signup_message_id, &mut config.signup_message_id),
            ("event_channel_id", &self.event_channel_id, &mut config.event_channel_id),
            ("leaderboard_channel_id", &self.leaderboard_channel_id, &mut config.leaderboard_channel_id),
            ("user_role_id", &self.user_role_id, &mut config.user_role_id),
            ("editor_role_id", &self.editor_role_id, &mut config.editor_role_id),
            ("admin_role_id", &self.admin_role_id, &mut config.admin_role_id),
            ("signup_emoji", &self.signup_emoji, &mut config.signup_emoji),
        ];
        for (name, update, target) in fields {
            if let Some(value) = update {
                if *target != *value {
                    *target = value.clone();
                    changed.push(name.to_string());
                }
            }
        }
        changed
    }
}

impl From<GuildConfigCreationRequestedPayloadV1> for GuildConfig {
    fn from(p: GuildConfigCreationRequestedPayloadV1) -> Self {
        Self {
            guild_id: p.guild_id,
            signup_channel_id: p.signup_channel_id,
            signup_message_id: p.signup_message_id,
            event_channel_id: p.event_channel_id,
            leaderboard_channel_id: p.leaderboard_channel_id,
            user_role_id: p.user_role_id,
            editor_role_id: p.editor_role_id,
            admin_role_id: p.admin_role_id,
            signup_emoji: p.signup_emoji,
            auto_setup_completed: p.auto_setup_completed,
            setup_completed_at: p.setup_completed_at,
            resource_state: None,
        }
    }
}

/// Guild area registry with the default deletion flow
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    v1_registry_with(DeletionFlow::default())
}

/// Guild area registry with an explicit deletion flow
pub fn v1_registry_with(flow: DeletionFlow) -> Result<EventRegistry, RegistryError> {
    let backend = Actor::backend("guild");
    let discord = Actor::discord("guild");

    let (results_producer, results_consumer) = match flow {
        DeletionFlow::DiscordReportsResults => (discord, backend),
        DeletionFlow::BackendReportsResults => (backend, discord),
    };

    EventRegistry::from_entries([
        (
            GUILD_SETUP_REQUESTED_V1,
            EventInfo::new::<GuildSetupRequestedPayloadV1>(
                "Guild Setup Requested",
                "An admin ran the setup command; the bot creates or adopts channels and roles.",
                discord,
            )
            .consumed_by([Actor::discord("guild_setup")]),
        ),
        (
            GUILD_CONFIG_CREATION_REQUESTED_V1,
            EventInfo::new::<GuildConfigCreationRequestedPayloadV1>(
                "Guild Config Creation Requested",
                "Setup finished on Discord; persist the resulting configuration.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            GUILD_CONFIG_CREATED_V1,
            EventInfo::new::<GuildConfigPayloadV1>(
                "Guild Config Created",
                "The guild configuration was stored.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_CREATION_FAILED_V1,
            EventInfo::new::<GuildConfigFailedPayloadV1>(
                "Guild Config Creation Failed",
                "The configuration could not be stored.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_RETRIEVAL_REQUESTED_V1,
            EventInfo::new::<GuildConfigRetrievalRequestedPayloadV1>(
                "Guild Config Retrieval Requested",
                "The bot's config cache missed and asks for the stored record.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            GUILD_CONFIG_RETRIEVED_V1,
            EventInfo::new::<GuildConfigPayloadV1>(
                "Guild Config Retrieved",
                "Stored configuration for cache population.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_RETRIEVAL_FAILED_V1,
            EventInfo::new::<GuildConfigFailedPayloadV1>(
                "Guild Config Retrieval Failed",
                "No configuration is stored for the guild.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_UPDATE_REQUESTED_V1,
            EventInfo::new::<GuildConfigUpdateRequestedPayloadV1>(
                "Guild Config Update Requested",
                "An admin changed configured channels, roles or emoji.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            GUILD_CONFIG_UPDATED_V1,
            EventInfo::new::<GuildConfigUpdatedPayloadV1>(
                "Guild Config Updated",
                "The configuration changed; caches must be invalidated.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_UPDATE_FAILED_V1,
            EventInfo::new::<GuildConfigFailedPayloadV1>(
                "Guild Config Update Failed",
                "The configuration update was rejected.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_DELETION_REQUESTED_V1,
            EventInfo::new::<GuildConfigDeletionRequestedPayloadV1>(
                "Guild Config Deletion Requested",
                "The bot was removed or an admin reset the guild.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            GUILD_CONFIG_DELETED_V1,
            EventInfo::new::<GuildConfigDeletedPayloadV1>(
                "Guild Config Deleted",
                "The configuration was tombstoned; carries the resources left to tear down.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_DELETION_FAILED_V1,
            EventInfo::new::<GuildConfigFailedPayloadV1>(
                "Guild Config Deletion Failed",
                "The configuration could not be deleted.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            GUILD_CONFIG_DELETION_RESULTS_V1,
            EventInfo::new::<GuildConfigDeletionResultsPayloadV1>(
                "Guild Resource Deletion Results",
                "Per-resource outcome of tearing down bot-created channels, messages and roles.",
                results_producer,
            )
            .consumed_by([results_consumer]),
        ),
    ])
}
