//! Leaderboard events: tag order updates, swaps, assignment and availability.

use super::{Actor, EventInfo, EventRegistry, RegistryError};
use crate::identifiers::{GuildId, RoundId, TagNumber, UserId};
use crate::shared::TagMapping;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const LEADERBOARD_UPDATE_REQUESTED_V1: &str = "leaderboard.update.requested.v1";
pub const LEADERBOARD_UPDATED_V1: &str = "leaderboard.updated.v1";
pub const LEADERBOARD_UPDATE_FAILED_V1: &str = "leaderboard.update.failed.v1";
pub const LEADERBOARD_GET_REQUESTED_V1: &str = "leaderboard.get.requested.v1";
pub const LEADERBOARD_GET_RESPONSE_V1: &str = "leaderboard.get.response.v1";
pub const LEADERBOARD_TAG_SWAP_REQUESTED_V1: &str = "leaderboard.tag.swap.requested.v1";
pub const LEADERBOARD_TAG_SWAP_PROCESSED_V1: &str = "leaderboard.tag.swap.processed.v1";
pub const LEADERBOARD_TAG_SWAP_FAILED_V1: &str = "leaderboard.tag.swap.failed.v1";
pub const LEADERBOARD_TAG_ASSIGNMENT_REQUESTED_V1: &str = "leaderboard.tag.assignment.requested.v1";
pub const LEADERBOARD_TAG_ASSIGNED_V1: &str = "leaderboard.tag.assigned.v1";
pub const LEADERBOARD_TAG_ASSIGNMENT_FAILED_V1: &str = "leaderboard.tag.assignment.failed.v1";
pub const LEADERBOARD_TAG_AVAILABILITY_CHECK_REQUESTED_V1: &str =
    "leaderboard.tag.availability.check.requested.v1";
pub const LEADERBOARD_TAG_AVAILABLE_V1: &str = "leaderboard.tag.available.v1";
pub const LEADERBOARD_TAG_UNAVAILABLE_V1: &str = "leaderboard.tag.unavailable.v1";

/// Every leaderboard topic
pub const ALL_TOPICS: [&str; 14] = [
    LEADERBOARD_UPDATE_REQUESTED_V1,
    LEADERBOARD_UPDATED_V1,
    LEADERBOARD_UPDATE_FAILED_V1,
    LEADERBOARD_GET_REQUESTED_V1,
    LEADERBOARD_GET_RESPONSE_V1,
    LEADERBOARD_TAG_SWAP_REQUESTED_V1,
    LEADERBOARD_TAG_SWAP_PROCESSED_V1,
    LEADERBOARD_TAG_SWAP_FAILED_V1,
    LEADERBOARD_TAG_ASSIGNMENT_REQUESTED_V1,
    LEADERBOARD_TAG_ASSIGNED_V1,
    LEADERBOARD_TAG_ASSIGNMENT_FAILED_V1,
    LEADERBOARD_TAG_AVAILABILITY_CHECK_REQUESTED_V1,
    LEADERBOARD_TAG_AVAILABLE_V1,
    LEADERBOARD_TAG_UNAVAILABLE_V1,
];

/// Why a tag is being assigned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    #[default]
    Signup,
    Manual,
    Import,
}

/// One row of the leaderboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardEntry {
    pub tag_number: TagNumber,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    /// Finishing order of the round, best first, with the tag each player held
    pub sorted_participant_tags: Vec<TagMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardUpdateFailedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GetLeaderboardRequestedPayloadV1 {
    pub guild_id: GuildId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GetLeaderboardResponsePayloadV1 {
    pub guild_id: GuildId,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagSwapRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub requestor_id: UserId,
    pub target_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagSwapProcessedPayloadV1 {
    pub guild_id: GuildId,
    pub requestor_id: UserId,
    pub target_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagSwapFailedPayloadV1 {
    pub guild_id: GuildId,
    pub requestor_id: UserId,
    pub target_id: UserId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagAssignmentRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub tag_number: TagNumber,
    pub source: AssignmentSource,
    /// Idempotency key for the assignment
    pub update_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagAssignedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub tag_number: TagNumber,
    pub assignment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagAssignmentFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub tag_number: TagNumber,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagAvailabilityCheckRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub tag_number: TagNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagAvailabilityResultPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub tag_number: TagNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LeaderboardUpdatedPayloadV1 {
    /// Tag currently held by `user`
    pub fn tag_for(&self, user: &UserId) -> Option<TagNumber> {
        self.leaderboard
            .iter()
            .find(|entry| &entry.user_id == user)
            .map(|entry| entry.tag_number)
    }

    /// True when no tag and no user appears twice
    pub fn is_consistent(&self) -> bool {
        let mut tags = HashSet::new();
        let mut users = HashSet::new();
        self.leaderboard
            .iter()
            .all(|entry| tags.insert(entry.tag_number) && users.insert(&entry.user_id))
    }
}

/// Leaderboard area registry
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    let backend = Actor::backend("leaderboard");
    let discord = Actor::discord("leaderboard");

    EventRegistry::from_entries([
        (
            LEADERBOARD_UPDATE_REQUESTED_V1,
            EventInfo::new::<LeaderboardUpdateRequestedPayloadV1>(
                "Leaderboard Update Requested",
                "A processed round reorders tags by finishing position.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            LEADERBOARD_UPDATED_V1,
            EventInfo::new::<LeaderboardUpdatedPayloadV1>(
                "Leaderboard Updated",
                "Full leaderboard snapshot after a round; the bot re-renders the leaderboard embed.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            LEADERBOARD_UPDATE_FAILED_V1,
            EventInfo::new::<LeaderboardUpdateFailedPayloadV1>(
                "Leaderboard Update Failed",
                "The tag reorder was rejected.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            LEADERBOARD_GET_REQUESTED_V1,
            EventInfo::new::<GetLeaderboardRequestedPayloadV1>(
                "Get Leaderboard Requested",
                "A user asked to view the leaderboard.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            LEADERBOARD_GET_RESPONSE_V1,
            EventInfo::new::<GetLeaderboardResponsePayloadV1>(
                "Get Leaderboard Response",
                "Current leaderboard snapshot.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            LEADERBOARD_TAG_SWAP_REQUESTED_V1,
            EventInfo::new::<TagSwapRequestedPayloadV1>(
                "Tag Swap Requested",
                "Two players agreed to swap tags.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            LEADERBOARD_TAG_SWAP_PROCESSED_V1,
            EventInfo::new::<TagSwapProcessedPayloadV1>("Tag Swap Processed", "The tags were swapped.", backend)
                .consumed_by([discord]),
        ),
        (
            LEADERBOARD_TAG_SWAP_FAILED_V1,
            EventInfo::new::<TagSwapFailedPayloadV1>("Tag Swap Failed", "The swap was rejected.", backend)
                .consumed_by([discord]),
        ),
        (
            LEADERBOARD_TAG_ASSIGNMENT_REQUESTED_V1,
            EventInfo::new::<TagAssignmentRequestedPayloadV1>(
                "Tag Assignment Requested",
                "Assign a specific tag to a player.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            LEADERBOARD_TAG_ASSIGNED_V1,
            EventInfo::new::<TagAssignedPayloadV1>("Tag Assigned", "The player now holds the tag.", backend)
                .consumed_by([discord, Actor::backend("user")]),
        ),
        (
            LEADERBOARD_TAG_ASSIGNMENT_FAILED_V1,
            EventInfo::new::<TagAssignmentFailedPayloadV1>(
                "Tag Assignment Failed",
                "The tag could not be assigned.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            LEADERBOARD_TAG_AVAILABILITY_CHECK_REQUESTED_V1,
            EventInfo::new::<TagAvailabilityCheckRequestedPayloadV1>(
                "Tag Availability Check Requested",
                "Signup asks whether a claimed tag is free.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            LEADERBOARD_TAG_AVAILABLE_V1,
            EventInfo::new::<TagAvailabilityResultPayloadV1>(
                "Tag Available",
                "The claimed tag is free.",
                backend,
            )
            .consumed_by([discord, Actor::backend("user")]),
        ),
        (
            LEADERBOARD_TAG_UNAVAILABLE_V1,
            EventInfo::new::<TagAvailabilityResultPayloadV1>(
                "Tag Unavailable",
                "The claimed tag is held by another player.",
                backend,
            )
            .consumed_by([discord, Actor::backend("user")]),
        ),
    ])
}
