//! User signup, role management and UDisc identity events.

use super::{Actor, EventInfo, EventRegistry, RegistryError};
use crate::identifiers::{GuildId, TagNumber, UserId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const USER_CREATION_REQUESTED_V1: &str = "user.creation.requested.v1";
pub const USER_CREATED_V1: &str = "user.created.v1";
pub const USER_CREATION_FAILED_V1: &str = "user.creation.failed.v1";
pub const USER_ROLE_UPDATE_REQUESTED_V1: &str = "user.role.update.requested.v1";
pub const USER_ROLE_UPDATED_V1: &str = "user.role.updated.v1";
pub const USER_ROLE_UPDATE_FAILED_V1: &str = "user.role.update.failed.v1";
pub const USER_UDISC_IDENTITY_UPDATE_REQUESTED_V1: &str = "user.udisc.identity.update.requested.v1";
pub const USER_UDISC_IDENTITY_UPDATED_V1: &str = "user.udisc.identity.updated.v1";
pub const USER_UDISC_IDENTITY_UPDATE_FAILED_V1: &str = "user.udisc.identity.update.failed.v1";
pub const USER_PROFILE_UPDATED_V1: &str = "user.profile.updated.v1";

/// Every user topic
pub const ALL_TOPICS: [&str; 10] = [
    USER_CREATION_REQUESTED_V1,
    USER_CREATED_V1,
    USER_CREATION_FAILED_V1,
    USER_ROLE_UPDATE_REQUESTED_V1,
    USER_ROLE_UPDATED_V1,
    USER_ROLE_UPDATE_FAILED_V1,
    USER_UDISC_IDENTITY_UPDATE_REQUESTED_V1,
    USER_UDISC_IDENTITY_UPDATED_V1,
    USER_UDISC_IDENTITY_UPDATE_FAILED_V1,
    USER_PROFILE_UPDATED_V1,
];

/// Bot permission level of a guild member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Editor,
    Admin,
}

impl UserRole {
    /// True if the role may edit rounds and scores of others
    pub fn can_edit(&self) -> bool {
        *self >= Self::Editor
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserCreationRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udisc_username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserCreatedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
    /// True when the user already existed in another guild
    #[serde(default)]
    pub is_returning_user: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserCreationFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserRoleUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role: UserRole,
    pub requester_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserRoleUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserRoleUpdateFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role: UserRole,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UdiscIdentityUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udisc_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udisc_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UdiscIdentityUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udisc_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udisc_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UdiscIdentityUpdateFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserProfileUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_hash: Option<String>,
}

impl UdiscIdentityUpdateRequestedPayloadV1 {
    /// Usernames are matched case-insensitively against scorecard exports
    pub fn normalized_username(&self) -> Option<String> {
        self.udisc_username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// User area registry
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    let backend = Actor::backend("user");
    let discord = Actor::discord("user");

    EventRegistry::from_entries([
        (
            USER_CREATION_REQUESTED_V1,
            EventInfo::new::<UserCreationRequestedPayloadV1>(
                "User Creation Requested",
                "A guild member completed signup, optionally claiming a tag.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            USER_CREATED_V1,
            EventInfo::new::<UserCreatedPayloadV1>(
                "User Created",
                "The member is registered; the bot grants the player role.",
                backend,
            )
            .consumed_by([discord, Actor::backend("leaderboard")]),
        ),
        (
            USER_CREATION_FAILED_V1,
            EventInfo::new::<UserCreationFailedPayloadV1>(
                "User Creation Failed",
                "Signup was rejected.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            USER_ROLE_UPDATE_REQUESTED_V1,
            EventInfo::new::<UserRoleUpdateRequestedPayloadV1>(
                "User Role Update Requested",
                "An admin changed a member's bot role.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            USER_ROLE_UPDATED_V1,
            EventInfo::new::<UserRoleUpdatedPayloadV1>(
                "User Role Updated",
                "The stored role changed; the bot syncs Discord roles.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            USER_ROLE_UPDATE_FAILED_V1,
            EventInfo::new::<UserRoleUpdateFailedPayloadV1>(
                "User Role Update Failed",
                "The role change was rejected.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            USER_UDISC_IDENTITY_UPDATE_REQUESTED_V1,
            EventInfo::new::<UdiscIdentityUpdateRequestedPayloadV1>(
                "UDisc Identity Update Requested",
                "A player linked their UDisc username for scorecard matching.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            USER_UDISC_IDENTITY_UPDATED_V1,
            EventInfo::new::<UdiscIdentityUpdatedPayloadV1>(
                "UDisc Identity Updated",
                "The UDisc identity was stored.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            USER_UDISC_IDENTITY_UPDATE_FAILED_V1,
            EventInfo::new::<UdiscIdentityUpdateFailedPayloadV1>(
                "UDisc Identity Update Failed",
                "The UDisc identity could not be stored.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            USER_PROFILE_UPDATED_V1,
            EventInfo::new::<UserProfileUpdatedPayloadV1>(
                "User Profile Updated",
                "Cached display name or avatar changed.",
                backend,
            )
            .consumed_by([discord]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_topic() {
        let registry = v1_registry().unwrap();
        assert_eq!(registry.len(), ALL_TOPICS.len());
        assert!(ALL_TOPICS.iter().all(|t| registry.contains(t)));
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Admin.can_edit());
        assert!(UserRole::Editor.can_edit());
        assert!(!UserRole::User.can_edit());
    }

    #[test]
    fn test_normalized_username() {
        let mut payload = UdiscIdentityUpdateRequestedPayloadV1 {
            udisc_username: Some("  DiscKing ".into()),
            ..Default::default()
        };
        assert_eq!(payload.normalized_username().as_deref(), Some("discking"));
        payload.udisc_username = Some("   ".into());
        assert_eq!(payload.normalized_username(), None);
    }
}
