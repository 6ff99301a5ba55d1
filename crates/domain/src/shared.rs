//! Small value records embedded in several event payloads.

use crate::identifiers::{Score, TagNumber, UserId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A player's score for a round, with the tag they held when playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreInfo {
    pub user_id: UserId,
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<TagNumber>,
}

/// Binding between a Discord user and a leaderboard tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TagMapping {
    pub discord_id: UserId,
    pub tag_number: TagNumber,
}

impl TagMapping {
    /// Convenience constructor
    pub fn new(discord_id: impl Into<UserId>, tag_number: impl Into<TagNumber>) -> Self {
        Self {
            discord_id: discord_id.into(),
            tag_number: tag_number.into(),
        }
    }
}

/// Sort scores best-first; ties keep the lower held tag ahead.
pub fn rank_scores(scores: &mut [ScoreInfo]) {
    scores.sort_by(|a, b| {
        a.score.cmp(&b.score).then_with(|| {
            let at = a.tag_number.map_or(i32::MAX, TagNumber::value);
            let bt = b.tag_number.map_or(i32::MAX, TagNumber::value);
            at.cmp(&bt)
        })
    });
}
