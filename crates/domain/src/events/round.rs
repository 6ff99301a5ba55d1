//! Round lifecycle events: creation, edits, RSVPs, scoring and finalization.

use super::{Actor, EventInfo, EventRegistry, RegistryError, PayloadSchema};
use crate::identifiers::{GuildId, RoundId, Score, TagNumber, UserId};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const ROUND_CREATION_REQUESTED_V1: &str = "round.creation.requested.v1";
pub const ROUND_CREATED_V1: &str = "round.created.v1";
pub const ROUND_CREATION_FAILED_V1: &str = "round.creation.failed.v1";
pub const ROUND_VALIDATION_FAILED_V1: &str = "round.validation.failed.v1";
pub const ROUND_UPDATE_REQUESTED_V1: &str = "round.update.requested.v1";
pub const ROUND_UPDATED_V1: &str = "round.updated.v1";
pub const ROUND_UPDATE_FAILED_V1: &str = "round.update.failed.v1";
pub const ROUND_DELETE_REQUESTED_V1: &str = "round.delete.requested.v1";
pub const ROUND_DELETED_V1: &str = "round.deleted.v1";
pub const ROUND_DELETE_FAILED_V1: &str = "round.delete.failed.v1";
pub const ROUND_PARTICIPANT_JOIN_REQUESTED_V1: &str = "round.participant.join.requested.v1";
pub const ROUND_PARTICIPANT_JOINED_V1: &str = "round.participant.joined.v1";
pub const ROUND_PARTICIPANT_REMOVED_V1: &str = "round.participant.removed.v1";
pub const ROUND_SCORE_UPDATE_REQUESTED_V1: &str = "round.participant.score.update.requested.v1";
pub const ROUND_SCORE_UPDATED_V1: &str = "round.participant.score.updated.v1";
pub const ROUND_ALL_SCORES_SUBMITTED_V1: &str = "round.all.scores.submitted.v1";
pub const ROUND_REMINDER_SENT_V1: &str = "round.reminder.sent.v1";
pub const ROUND_STARTED_V1: &str = "round.started.v1";
pub const ROUND_FINALIZED_V1: &str = "round.finalized.v1";
pub const ROUND_TRACED_V1: &str = "round.traced.v1";

/// Every round topic
pub const ALL_TOPICS: [&str; 20] = [
    ROUND_CREATION_REQUESTED_V1,
    ROUND_CREATED_V1,
    ROUND_CREATION_FAILED_V1,
    ROUND_VALIDATION_FAILED_V1,
    ROUND_UPDATE_REQUESTED_V1,
    ROUND_UPDATED_V1,
    ROUND_UPDATE_FAILED_V1,
    ROUND_DELETE_REQUESTED_V1,
    ROUND_DELETED_V1,
    ROUND_DELETE_FAILED_V1,
    ROUND_PARTICIPANT_JOIN_REQUESTED_V1,
    ROUND_PARTICIPANT_JOINED_V1,
    ROUND_PARTICIPANT_REMOVED_V1,
    ROUND_SCORE_UPDATE_REQUESTED_V1,
    ROUND_SCORE_UPDATED_V1,
    ROUND_ALL_SCORES_SUBMITTED_V1,
    ROUND_REMINDER_SENT_V1,
    ROUND_STARTED_V1,
    ROUND_FINALIZED_V1,
    ROUND_TRACED_V1,
];

/// RSVP state of a participant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    #[default]
    Accept,
    Tentative,
    Decline,
}

/// Reminder kinds sent ahead of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    OneHour,
    Start,
    ScoreSubmission,
}

/// A player attached to a round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Participant {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
    pub response: Response,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreateRoundRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form start time as typed by the user ("tomorrow 6pm")
    pub start_time: String,
    pub timezone: String,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundCreatedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundCreationFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundValidationFailedPayloadV1 {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateRoundRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_message_id: Option<String>,
}

/// Shared shape of every round-scoped failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundErrorPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundDeleteRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub requesting_user_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundDeletedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantJoinRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub user_id: UserId,
    pub response: Response,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
    /// Set when a player joins after the round has started
    #[serde(default)]
    pub joined_late: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantJoinedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub accepted_participants: Vec<Participant>,
    pub tentative_participants: Vec<Participant>,
    pub declined_participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantRemovedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub user_id: UserId,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantScoreUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub participant: UserId,
    pub score: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantScoreUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub participant: UserId,
    pub score: Score,
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AllScoresSubmittedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundReminderPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub reminder_type: ReminderType,
    pub round_title: String,
    pub user_ids: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundStartedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundFinalizedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub title: String,
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_message_id: Option<String>,
}

impl ParticipantJoinedPayloadV1 {
    /// Every participant regardless of RSVP state
    pub fn all_participants(&self) -> impl Iterator<Item = &Participant> {
        self.accepted_participants
            .iter()
            .chain(&self.tentative_participants)
            .chain(&self.declined_participants)
    }
}

/// Round area registry
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    let discord = Actor::discord("round");
    let backend = Actor::backend("round");

    EventRegistry::from_entries([
        (
            ROUND_CREATION_REQUESTED_V1,
            EventInfo::new::<CreateRoundRequestedPayloadV1>(
                "Round Creation Requested",
                "A user submitted the create-round form; the backend parses the start time and validates the input.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            ROUND_CREATED_V1,
            EventInfo::new::<RoundCreatedPayloadV1>(
                "Round Created",
                "A round was stored and scheduled; the bot posts the round embed.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_CREATION_FAILED_V1,
            EventInfo::new::<RoundCreationFailedPayloadV1>(
                "Round Creation Failed",
                "The backend could not store the round.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_VALIDATION_FAILED_V1,
            EventInfo::new::<RoundValidationFailedPayloadV1>(
                "Round Validation Failed",
                "Round input was rejected; carries every validation message for the user.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_UPDATE_REQUESTED_V1,
            EventInfo::new::<UpdateRoundRequestedPayloadV1>(
                "Round Update Requested",
                "A user edited a round; only the provided fields change.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            ROUND_UPDATED_V1,
            EventInfo::new::<RoundUpdatedPayloadV1>(
                "Round Updated",
                "Round details changed and scheduled reminders were rescheduled.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_UPDATE_FAILED_V1,
            EventInfo::new::<RoundErrorPayloadV1>("Round Update Failed", "The round edit was rejected.", backend)
                .consumed_by([discord]),
        ),
        (
            ROUND_DELETE_REQUESTED_V1,
            EventInfo::new::<RoundDeleteRequestedPayloadV1>(
                "Round Delete Requested",
                "The round owner or an editor asked to delete a round.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            ROUND_DELETED_V1,
            EventInfo::new::<RoundDeletedPayloadV1>(
                "Round Deleted",
                "The round was removed and its scheduled messages cancelled.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_DELETE_FAILED_V1,
            EventInfo::new::<RoundErrorPayloadV1>("Round Delete Failed", "The round could not be deleted.", backend)
                .consumed_by([discord]),
        ),
        (
            ROUND_PARTICIPANT_JOIN_REQUESTED_V1,
            EventInfo::new::<ParticipantJoinRequestedPayloadV1>(
                "Participant Join Requested",
                "A player reacted to the round embed with an RSVP.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            ROUND_PARTICIPANT_JOINED_V1,
            EventInfo::new::<ParticipantJoinedPayloadV1>(
                "Participant Joined",
                "Participant lists changed; carries the full RSVP snapshot for re-rendering the embed.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_PARTICIPANT_REMOVED_V1,
            EventInfo::new::<ParticipantRemovedPayloadV1>(
                "Participant Removed",
                "A player left the round.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_SCORE_UPDATE_REQUESTED_V1,
            EventInfo::new::<ParticipantScoreUpdateRequestedPayloadV1>(
                "Participant Score Update Requested",
                "A player entered their score for a started round.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            ROUND_SCORE_UPDATED_V1,
            EventInfo::new::<ParticipantScoreUpdatedPayloadV1>(
                "Participant Score Updated",
                "A participant's score was recorded.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_ALL_SCORES_SUBMITTED_V1,
            EventInfo::new::<AllScoresSubmittedPayloadV1>(
                "All Scores Submitted",
                "Every accepted participant has a score; the round can be finalized.",
                backend,
            )
            .consumed_by([backend, discord]),
        ),
        (
            ROUND_REMINDER_SENT_V1,
            EventInfo::new::<RoundReminderPayloadV1>(
                "Round Reminder",
                "A delayed reminder fired for an upcoming or running round.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_STARTED_V1,
            EventInfo::new::<RoundStartedPayloadV1>(
                "Round Started",
                "The scheduled start time passed; score entry opens.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            ROUND_FINALIZED_V1,
            EventInfo::new::<RoundFinalizedPayloadV1>(
                "Round Finalized",
                "Scores are locked; score processing and the leaderboard update follow.",
                backend,
            )
            .consumed_by([Actor::backend("score"), discord]),
        ),
        (
            ROUND_TRACED_V1,
            EventInfo::with_payload(
                PayloadSchema::opaque(),
                "Round Trace",
                "Free-form diagnostic event emitted by round handlers.",
                backend,
            ),
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
        for topic in ALL_TOPICS {
            assert!(registry.contains(topic), "{topic} missing");
        }
    }

    #[test]
    fn test_requests_flow_from_discord() {
        let registry = v1_registry().unwrap();
        for (topic, info) in registry.iter() {
            if super::super::is_request_event(topic) {
                assert_eq!(info.producer.service, super::super::Service::Discord, "{topic}");
            }
        }
    }

    #[test]
    fn test_trace_topic_is_opaque() {
        let registry = v1_registry().unwrap();
        assert!(registry.get(ROUND_TRACED_V1).unwrap().payload.is_opaque());
    }

    #[test]
    fn test_joined_payload_iterates_all_participants() {
        let participant = |id: &str, response| Participant {
            user_id: UserId::new(id),
            response,
            ..Default::default()
        };
        let payload = ParticipantJoinedPayloadV1 {
            accepted_participants: vec![participant("a", Response::Accept)],
            tentative_participants: vec![participant("b", Response::Tentative)],
            declined_participants: vec![participant("c", Response::Decline)],
            ..Default::default()
        };
        assert_eq!(payload.all_participants().count(), 3);
    }
}
