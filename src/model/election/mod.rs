pub use election_core::{Candidate, Election, VoteRecord};
pub use electorate::Electorate;
pub use spec::ElectionSpec;
pub use state::ElectionState;
pub use tally::Tally;
pub use view::{ElectionDescription, ElectionResults};
pub use window::VotingWindow;

mod election_core;
mod electorate;
pub(crate) mod spec;
mod state;
mod tally;
mod view;
mod window;

/// Elections are numbered from 1 in creation order.
pub type ElectionId = u64;
/// Candidates are identified by their position on the ballot.
pub type CandidateIndex = usize;

#[cfg(test)]
pub use election_core::examples;
