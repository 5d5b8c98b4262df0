use serde::{Deserialize, Serialize};

use super::CandidateIndex;

/// The final count of an election.
///
/// Every candidate sharing the top count is a winner; ties are reported, not
/// broken. An election nobody voted in is a tie between every candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub winners: Vec<CandidateIndex>,
    pub per_candidate_counts: Vec<u64>,
}

impl Tally {
    pub fn from_counts(per_candidate_counts: Vec<u64>) -> Self {
        let top = per_candidate_counts.iter().copied().max().unwrap_or(0);
        let winners = per_candidate_counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == top)
            .map(|(index, _)| index)
            .collect();
        Self {
            winners,
            per_candidate_counts,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.winners.len() > 1
    }

    pub fn total_votes(&self) -> u64 {
        self.per_candidate_counts.iter().sum()
    }
}
