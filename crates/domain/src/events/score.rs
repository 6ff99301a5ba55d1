//! Score processing and score correction events.

use super::{Actor, EventInfo, EventRegistry, RegistryError};
use crate::identifiers::{GuildId, RoundId, Score, TagNumber, UserId};
use crate::shared::{ScoreInfo, TagMapping};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCORE_PROCESS_REQUESTED_V1: &str = "score.process.requested.v1";
pub const SCORE_PROCESSED_V1: &str = "score.processed.v1";
pub const SCORE_PROCESS_FAILED_V1: &str = "score.process.failed.v1";
pub const SCORE_UPDATE_REQUESTED_V1: &str = "score.update.requested.v1";
pub const SCORE_UPDATED_V1: &str = "score.updated.v1";
pub const SCORE_UPDATE_FAILED_V1: &str = "score.update.failed.v1";
pub const SCORE_BULK_UPDATE_REQUESTED_V1: &str = "score.bulk.update.requested.v1";
pub const SCORE_BULK_UPDATED_V1: &str = "score.bulk.updated.v1";

/// Every score topic
pub const ALL_TOPICS: [&str; 8] = [
    SCORE_PROCESS_REQUESTED_V1,
    SCORE_PROCESSED_V1,
    SCORE_PROCESS_FAILED_V1,
    SCORE_UPDATE_REQUESTED_V1,
    SCORE_UPDATED_V1,
    SCORE_UPDATE_FAILED_V1,
    SCORE_BULK_UPDATE_REQUESTED_V1,
    SCORE_BULK_UPDATED_V1,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessRoundScoresRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub scores: Vec<ScoreInfo>,
    /// Replace previously processed scores for the round
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessRoundScoresSucceededPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub tag_mappings: Vec<TagMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessRoundScoresFailedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub user_id: UserId,
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub user_id: UserId,
    pub score: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreUpdateFailedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub user_id: UserId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBulkUpdateRequestedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub updates: Vec<ScoreUpdateRequestedPayloadV1>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBulkUpdatedPayloadV1 {
    pub guild_id: GuildId,
    pub round_id: RoundId,
    pub applied_count: u32,
    pub failed_count: u32,
    pub user_ids: Vec<UserId>,
}

impl ScoreBulkUpdateRequestedPayloadV1 {
    /// True if any update targets a different round than the batch
    pub fn has_foreign_updates(&self) -> bool {
        self.updates
            .iter()
            .any(|u| u.round_id != self.round_id || u.guild_id != self.guild_id)
    }
}

/// Score area registry
pub fn v1_registry() -> Result<EventRegistry, RegistryError> {
    let backend = Actor::backend("score");
    let discord = Actor::discord("score");

    EventRegistry::from_entries([
        (
            SCORE_PROCESS_REQUESTED_V1,
            EventInfo::new::<ProcessRoundScoresRequestedPayloadV1>(
                "Process Round Scores Requested",
                "A finalized round's scores are ready for tag reassignment.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            SCORE_PROCESSED_V1,
            EventInfo::new::<ProcessRoundScoresSucceededPayloadV1>(
                "Round Scores Processed",
                "Scores were stored; carries the resulting tag order for the leaderboard.",
                backend,
            )
            .consumed_by([Actor::backend("leaderboard"), discord]),
        ),
        (
            SCORE_PROCESS_FAILED_V1,
            EventInfo::new::<ProcessRoundScoresFailedPayloadV1>(
                "Round Score Processing Failed",
                "Scores could not be processed.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            SCORE_UPDATE_REQUESTED_V1,
            EventInfo::new::<ScoreUpdateRequestedPayloadV1>(
                "Score Correction Requested",
                "An editor corrected a stored score.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            SCORE_UPDATED_V1,
            EventInfo::new::<ScoreUpdatedPayloadV1>("Score Corrected", "A stored score was corrected.", backend)
                .consumed_by([discord]),
        ),
        (
            SCORE_UPDATE_FAILED_V1,
            EventInfo::new::<ScoreUpdateFailedPayloadV1>(
                "Score Correction Failed",
                "A score correction was rejected.",
                backend,
            )
            .consumed_by([discord]),
        ),
        (
            SCORE_BULK_UPDATE_REQUESTED_V1,
            EventInfo::new::<ScoreBulkUpdateRequestedPayloadV1>(
                "Bulk Score Correction Requested",
                "Several score corrections for one round, typically from a scorecard import.",
                discord,
            )
            .consumed_by([backend]),
        ),
        (
            SCORE_BULK_UPDATED_V1,
            EventInfo::new::<ScoreBulkUpdatedPayloadV1>(
                "Bulk Score Correction Applied",
                "Summary of a bulk correction.",
                backend,
            )
            .consumed_by([discord]),
        ),
    ])
}
