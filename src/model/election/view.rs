use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::identity::Identity;

use super::{Candidate, ElectionId, ElectionState, Tally, VotingWindow};

/// Everything public about an election, as of one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDescription {
    pub id: ElectionId,
    pub creator: Identity,
    pub title: String,
    pub description: String,
    pub candidates: Vec<Candidate>,
    pub state: ElectionState,
    pub voting_window: VotingWindow,
    pub created_at: DateTime<Utc>,
    pub restricted_electorate: bool,
    pub total_votes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<Tally>,
}

/// Current counts of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub id: ElectionId,
    pub state: ElectionState,
    pub candidates: Vec<Candidate>,
    pub total_votes: u64,
    /// Only present once the election is tallied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<Tally>,
}
