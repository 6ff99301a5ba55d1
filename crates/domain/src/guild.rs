//! Guild configuration and the Discord resources the bot creates for a guild.

use crate::identifiers::GuildId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource-kind keys used in [`ResourceState::results`].
pub mod resource_kind {
    /// Signup channel
    pub const SIGNUP_CHANNEL: &str = "signup_channel";
    /// Signup message posted in the signup channel
    pub const SIGNUP_MESSAGE: &str = "signup_message";
    /// Channel where round events are posted
    pub const EVENT_CHANNEL: &str = "event_channel";
    /// Channel hosting the leaderboard embed
    pub const LEADERBOARD_CHANNEL: &str = "leaderboard_channel";
    /// Base player role
    pub const USER_ROLE: &str = "user_role";
    /// Editor role
    pub const EDITOR_ROLE: &str = "editor_role";
    /// Admin role
    pub const ADMIN_ROLE: &str = "admin_role";

    /// Every canonical resource kind, in teardown order
    pub const ALL: [&str; 7] = [
        SIGNUP_MESSAGE,
        SIGNUP_CHANNEL,
        EVENT_CHANNEL,
        LEADERBOARD_CHANNEL,
        USER_ROLE,
        EDITOR_ROLE,
        ADMIN_ROLE,
    ];
}

/// Authoritative configuration record for one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuildConfig {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_state: Option<ResourceState>,
}

impl GuildConfig {
    /// Snapshot the resource ids currently recorded on this config.
    ///
    /// The returned state carries no deletion results; callers populate them
    /// as teardown progresses.
    pub fn resource_snapshot(&self) -> ResourceState {
        ResourceState {
            signup_channel_id: self.signup_channel_id.clone(),
            signup_message_id: self.signup_message_id.clone(),
            event_channel_id: self.event_channel_id.clone(),
            leaderboard_channel_id: self.leaderboard_channel_id.clone(),
            user_role_id: self.user_role_id.clone(),
            editor_role_id: self.editor_role_id.clone(),
            admin_role_id: self.admin_role_id.clone(),
            results: BTreeMap::new(),
        }
    }

    /// True once either manual or automatic setup has finished
    pub fn is_setup_complete(&self) -> bool {
        self.auto_setup_completed || self.setup_completed_at.is_some()
    }
}

/// Outcome of deleting one bot-created Discord resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Per-resource deletion result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeletionResult {
    pub status: DeletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DeletionResult {
    /// A successful deletion at `at`
    pub fn success(at: DateTime<Utc>) -> Self {
        Self {
            status: DeletionStatus::Success,
            error: None,
            deleted_at: Some(at),
        }
    }

    /// A failed deletion
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: DeletionStatus::Failed,
            error: Some(error.into()),
            deleted_at: None,
        }
    }
}

/// Snapshot of the Discord resources the bot created for a guild, plus the
/// deletion outcome for each resource kind (see [`resource_kind`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceState {
    #[serde(default)]
    pub signup_channel_id: String,
    #[serde(default)]
    pub signup_message_id: String,
    #[serde(default)]
    pub event_channel_id: String,
    #[serde(default)]
    pub leaderboard_channel_id: String,
    #[serde(default)]
    pub user_role_id: String,
    #[serde(default)]
    pub editor_role_id: String,
    #[serde(default)]
    pub admin_role_id: String,
    #[serde(default)]
    pub results: BTreeMap<String, DeletionResult>,
}

impl ResourceState {
    /// True iff every id field is empty and no deletion result is recorded.
    pub fn is_empty(&self) -> bool {
        self.ids().iter().all(|(_, id)| id.is_empty()) && self.results.is_empty()
    }

    /// Resource ids keyed by their canonical resource kind.
    pub fn ids(&self) -> [(&'static str, &str); 7] {
        [
            (resource_kind::SIGNUP_MESSAGE, self.signup_message_id.as_str()),
            (resource_kind::SIGNUP_CHANNEL, self.signup_channel_id.as_str()),
            (resource_kind::EVENT_CHANNEL, self.event_channel_id.as_str()),
            (resource_kind::LEADERBOARD_CHANNEL, self.leaderboard_channel_id.as_str()),
            (resource_kind::USER_ROLE, self.user_role_id.as_str()),
            (resource_kind::EDITOR_ROLE, self.editor_role_id.as_str()),
            (resource_kind::ADMIN_ROLE, self.admin_role_id.as_str()),
        ]
    }

    /// Record the deletion outcome for a resource kind
    pub fn record_result(&mut self, kind: impl Into<String>, result: DeletionResult) {
        self.results.insert(kind.into(), result);
    }

    /// Resource kinds whose deletion failed
    pub fn failed_kinds(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.status == DeletionStatus::Failed)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Absence-tolerant emptiness check: a missing state counts as empty.
pub fn resource_state_is_empty(state: Option<&ResourceState>) -> bool {
    state.map_or(true, ResourceState::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_value_is_empty() {
        assert!(ResourceState::default().is_empty());
        assert!(resource_state_is_empty(None));
        assert!(resource_state_is_empty(Some(&ResourceState::default())));
    }

    #[test]
    fn test_any_id_makes_state_non_empty() {
        let setters: [fn(&mut ResourceState); 7] = [
            |s| s.signup_channel_id = "1".into(),
            |s| s.signup_message_id = "1".into(),
            |s| s.event_channel_id = "1".into(),
            |s| s.leaderboard_channel_id = "1".into(),
            |s| s.user_role_id = "1".into(),
            |s| s.editor_role_id = "1".into(),
            |s| s.admin_role_id = "1".into(),
        ];
        for set in setters {
            let mut state = ResourceState::default();
            set(&mut state);
            assert!(!state.is_empty());
        }
    }

    #[test]
    fn test_result_entry_makes_state_non_empty() {
        let mut state = ResourceState::default();
        state.record_result(resource_kind::USER_ROLE, DeletionResult::default());
        assert!(!state.is_empty());
        assert!(!resource_state_is_empty(Some(&state)));
    }

    #[test]
    fn test_failed_kinds() {
        let mut state = ResourceState::default();
        state.record_result(resource_kind::EVENT_CHANNEL, DeletionResult::success(Utc::now()));
        state.record_result(resource_kind::ADMIN_ROLE, DeletionResult::failed("missing permissions"));
        assert_eq!(state.failed_kinds(), vec![resource_kind::ADMIN_ROLE]);
    }

    #[test]
    fn test_resource_snapshot_copies_ids() {
        let config = GuildConfig {
            guild_id: GuildId::new("g"),
            event_channel_id: "ev".into(),
            admin_role_id: "adm".into(),
            ..Default::default()
        };
        let snapshot = config.resource_snapshot();
        assert_eq!(snapshot.event_channel_id, "ev");
        assert_eq!(snapshot.admin_role_id, "adm");
        assert!(snapshot.results.is_empty());
    }

    #[test]
    fn test_deletion_status_wire_format() {
        let json = serde_json::to_string(&DeletionStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let config = GuildConfig::default();
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("setup_completed_at").is_none());
        assert!(value.get("resource_state").is_none());
    }
}
