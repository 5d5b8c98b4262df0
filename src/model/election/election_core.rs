use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::audit::{AuditDump, AuditEvent, AuditLog};
use crate::model::gate::IdentityGate;
use crate::model::identity::Identity;

use super::electorate::Electorate;
use super::view::{ElectionDescription, ElectionResults};
use super::{CandidateIndex, ElectionId, ElectionSpec, ElectionState, Tally, VotingWindow};

/// A single candidate and their running count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub index: CandidateIndex,
    pub name: String,
    pub vote_count: u64,
}

/// A vote that has been committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    pub election_id: ElectionId,
    pub voter: Identity,
    pub candidate: CandidateIndex,
    /// Position of the vote in the election's audit log.
    pub seq: u64,
    pub cast_at: DateTime<Utc>,
}

/// One independent voting contest.
///
/// Fields are private: the only way to change an election is through the
/// operations below, each of which validates everything before touching any
/// state. The stored `state` only moves when an operation commits; readers
/// see [`Election::state_at`], which also accounts for the voting window.
#[derive(Debug, Clone)]
pub struct Election {
    id: ElectionId,
    creator: Identity,
    title: String,
    description: String,
    candidates: Vec<Candidate>,
    window: VotingWindow,
    electorate: Electorate,
    created_at: DateTime<Utc>,
    state: ElectionState,
    has_voted: HashSet<Identity>,
    tally: Option<Tally>,
    audit: AuditLog,
}

impl Election {
    /// Create a new election from an already validated spec.
    pub(crate) fn new(
        id: ElectionId,
        creator: Identity,
        spec: ElectionSpec,
        now: DateTime<Utc>,
    ) -> Self {
        let mut audit = AuditLog::default();
        audit.append(
            now,
            AuditEvent::Created {
                creator: creator.clone(),
                title: spec.title.clone(),
                candidates: spec.candidates.clone(),
                window: spec.voting_window,
            },
        );

        let candidates = spec
            .candidates
            .into_iter()
            .enumerate()
            .map(|(index, name)| Candidate {
                index,
                name,
                vote_count: 0,
            })
            .collect();

        Self {
            id,
            creator,
            title: spec.title,
            description: spec.description,
            candidates,
            window: spec.voting_window,
            electorate: spec.electorate.into(),
            created_at: now,
            state: ElectionState::Created,
            has_voted: HashSet::new(),
            tally: None,
            audit,
        }
    }

    pub fn id(&self) -> ElectionId {
        self.id
    }

    pub fn creator(&self) -> &Identity {
        &self.creator
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn window(&self) -> &VotingWindow {
        &self.window
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The state last committed by an operation, ignoring the clock.
    pub fn recorded_state(&self) -> ElectionState {
        self.state
    }

    /// The state of the election at `now`: the recorded state, advanced to
    /// `Open` once the window opens and to `Closed` once it closes.
    pub fn state_at(&self, now: DateTime<Utc>) -> ElectionState {
        match self.state {
            ElectionState::Created | ElectionState::Open if self.window.has_closed(now) => {
                ElectionState::Closed
            }
            ElectionState::Created if self.window.has_opened(now) => ElectionState::Open,
            state => state,
        }
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.has_voted.contains(identity)
    }

    /// Is this identity in the electorate? Says nothing about whether they
    /// have already voted.
    pub fn is_eligible(&self, identity: &Identity) -> bool {
        self.electorate.admits(identity)
    }

    pub fn total_votes(&self) -> u64 {
        self.has_voted.len() as u64
    }

    fn counts(&self) -> Vec<u64> {
        self.candidates
            .iter()
            .map(|candidate| candidate.vote_count)
            .collect()
    }

    fn transition_error(&self, state: ElectionState, operation: &'static str) -> Error {
        Error::InvalidStateTransition {
            election: self.id,
            state,
            operation,
        }
    }

    /// Write down any transitions the clock has made since the last commit.
    /// Each is stamped with the window bound that caused it, never earlier
    /// than the election's creation.
    fn record_pending_transitions(&mut self, now: DateTime<Utc>) {
        let effective = self.state_at(now);
        if self.state == ElectionState::Created && effective >= ElectionState::Open {
            self.state = ElectionState::Open;
            let at = self.window.opens_at.max(self.created_at);
            self.audit.append(at, AuditEvent::Opened { by: None });
        }
        if self.state == ElectionState::Open && effective >= ElectionState::Closed {
            self.state = ElectionState::Closed;
            let at = self.window.closes_at.max(self.created_at);
            self.audit.append(at, AuditEvent::Closed { by: None });
        }
    }

    /// Open voting ahead of the window. Only the creator may do this, and
    /// only before the election has opened by itself.
    pub fn open_voting(&mut self, caller: &Identity, now: DateTime<Utc>) -> Result<()> {
        if *caller != self.creator {
            return Err(Error::Unauthorized(format!(
                "only the creator of election {} may open it",
                self.id
            )));
        }
        let state = self.state_at(now);
        if state != ElectionState::Created {
            return Err(self.transition_error(state, "open"));
        }

        self.state = ElectionState::Open;
        self.audit.append(
            now,
            AuditEvent::Opened {
                by: Some(caller.clone()),
            },
        );
        Ok(())
    }

    /// Record `voter`'s vote for `candidate`.
    ///
    /// Membership of the voted set and the candidate's count change together
    /// or not at all.
    pub fn cast_vote(
        &mut self,
        voter: Identity,
        candidate: CandidateIndex,
        gate: &dyn IdentityGate,
        now: DateTime<Utc>,
    ) -> Result<VoteRecord> {
        if !self.state_at(now).accepts_votes() {
            return Err(Error::VotingClosed(self.id));
        }
        gate.can_vote(&voter, self, now)
            .map_err(|denial| denial.into_error(self.id, &voter))?;
        if self.has_voted(&voter) {
            return Err(Error::AlreadyVoted {
                election: self.id,
                voter,
            });
        }
        if candidate >= self.candidates.len() {
            return Err(Error::InvalidCandidate {
                index: candidate,
                count: self.candidates.len(),
            });
        }

        self.record_pending_transitions(now);
        self.has_voted.insert(voter.clone());
        self.candidates[candidate].vote_count += 1;
        let entry = self.audit.append(
            now,
            AuditEvent::VoteCast {
                voter: voter.clone(),
                candidate,
            },
        );

        Ok(VoteRecord {
            election_id: self.id,
            voter,
            candidate,
            seq: entry.seq,
            cast_at: now,
        })
    }

    /// Stop accepting votes.
    ///
    /// While the window is still running only the creator may close early.
    /// Once it has ended anyone may record the close.
    pub fn close_voting(&mut self, caller: &Identity, now: DateTime<Utc>) -> Result<()> {
        if self.state.is_finished() {
            return Err(self.transition_error(self.state, "close"));
        }
        match self.state_at(now) {
            ElectionState::Open => {
                if *caller != self.creator {
                    return Err(Error::Unauthorized(format!(
                        "only the creator of election {} may close it early",
                        self.id
                    )));
                }
                self.record_pending_transitions(now);
                self.state = ElectionState::Closed;
                self.audit.append(
                    now,
                    AuditEvent::Closed {
                        by: Some(caller.clone()),
                    },
                );
            }
            ElectionState::Closed => self.record_pending_transitions(now),
            state => return Err(self.transition_error(state, "close")),
        }
        Ok(())
    }

    /// Fix the final counts. Winners are every candidate on the top count.
    pub fn finalize_tally(&mut self, now: DateTime<Utc>) -> Result<Tally> {
        match self.state_at(now) {
            ElectionState::Created | ElectionState::Open => Err(Error::NotClosed(self.id)),
            ElectionState::Tallied => Err(self.transition_error(ElectionState::Tallied, "tally")),
            ElectionState::Closed => {
                self.record_pending_transitions(now);
                let tally = Tally::from_counts(self.counts());
                self.state = ElectionState::Tallied;
                self.audit.append(
                    now,
                    AuditEvent::Tallied {
                        winners: tally.winners.clone(),
                        counts: tally.per_candidate_counts.clone(),
                    },
                );
                self.tally = Some(tally.clone());
                Ok(tally)
            }
        }
    }

    pub fn describe(&self, now: DateTime<Utc>) -> ElectionDescription {
        ElectionDescription {
            id: self.id,
            creator: self.creator.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            candidates: self.candidates.clone(),
            state: self.state_at(now),
            voting_window: self.window,
            created_at: self.created_at,
            restricted_electorate: self.electorate.is_restricted(),
            total_votes: self.total_votes(),
            tally: self.tally.clone(),
        }
    }

    pub fn results(&self, now: DateTime<Utc>) -> ElectionResults {
        ElectionResults {
            id: self.id,
            state: self.state_at(now),
            candidates: self.candidates.clone(),
            total_votes: self.total_votes(),
            tally: self.tally.clone(),
        }
    }

    pub fn audit_dump(&self, now: DateTime<Utc>) -> AuditDump {
        AuditDump {
            election: self.describe(now),
            entries: self.audit.entries().to_vec(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::model::election::spec::examples::{t0, t1};
    use crate::model::gate::AdminListGate;

    use super::examples::creator;

    fn voter(address: &str) -> Identity {
        Identity::new(address).unwrap()
    }

    fn assert_conserved(election: &Election) {
        let sum: u64 = election.candidates().iter().map(|c| c.vote_count).sum();
        assert_eq!(sum, election.total_votes());
    }

    #[test]
    fn effective_state_follows_the_window() {
        let election = Election::example(ElectionSpec::example());
        assert_eq!(election.state_at(t0() - Duration::seconds(1)), ElectionState::Created);
        assert_eq!(election.state_at(t0()), ElectionState::Open);
        assert_eq!(election.state_at(t1()), ElectionState::Closed);
        assert_eq!(election.recorded_state(), ElectionState::Created);
    }

    #[test]
    fn voting_scenario() {
        let gate = AdminListGate::unrestricted();
        let mut election = Election::example(ElectionSpec::example());
        let x = voter("0xX");

        assert!(matches!(
            election.cast_vote(x.clone(), 0, &gate, t0() - Duration::minutes(1)),
            Err(Error::VotingClosed(1))
        ));

        let record = election.cast_vote(x.clone(), 0, &gate, t0()).unwrap();
        assert_eq!(record.candidate, 0);
        assert_eq!(record.seq, 2);
        assert_eq!(election.candidates()[0].vote_count, 1);
        assert_eq!(election.recorded_state(), ElectionState::Open);

        assert!(matches!(
            election.cast_vote(x.clone(), 1, &gate, t0()),
            Err(Error::AlreadyVoted { .. })
        ));
        assert_eq!(election.candidates()[1].vote_count, 0);
        assert_conserved(&election);

        election.close_voting(&x, t1()).unwrap();
        let tally = election.finalize_tally(t1()).unwrap();
        assert_eq!(tally.winners, vec![0]);
        assert_eq!(tally.per_candidate_counts, vec![1, 0]);
        assert_eq!(election.recorded_state(), ElectionState::Tallied);
        assert_conserved(&election);
    }

    #[test]
    fn out_of_range_candidate_changes_nothing() {
        let gate = AdminListGate::unrestricted();
        let mut election = Election::example(ElectionSpec::example());

        assert!(matches!(
            election.cast_vote(voter("0x1"), 2, &gate, t0()),
            Err(Error::InvalidCandidate { index: 2, count: 2 })
        ));
        assert!(!election.has_voted(&voter("0x1")));
        assert_eq!(election.total_votes(), 0);
        assert_eq!(election.audit().entries().len(), 1);
    }

    #[test]
    fn early_open_is_creator_only() {
        let gate = AdminListGate::unrestricted();
        let mut election = Election::example(ElectionSpec::example());
        let early = t0() - Duration::minutes(30);

        assert!(matches!(
            election.open_voting(&voter("0x1"), early),
            Err(Error::Unauthorized(_))
        ));
        election.open_voting(&creator(), early).unwrap();
        election.cast_vote(voter("0x1"), 1, &gate, early).unwrap();

        assert!(matches!(
            election.open_voting(&creator(), early),
            Err(Error::InvalidStateTransition {
                state: ElectionState::Open,
                ..
            })
        ));
        // The window's end still applies.
        assert!(matches!(
            election.cast_vote(voter("0x2"), 1, &gate, t1()),
            Err(Error::VotingClosed(_))
        ));
    }

    #[test]
    fn open_after_window_started_is_rejected() {
        let mut election = Election::example(ElectionSpec::example());
        assert!(matches!(
            election.open_voting(&creator(), t0()),
            Err(Error::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn early_close_is_creator_only() {
        let mut election = Election::example(ElectionSpec::example());
        let during = t0() + Duration::hours(1);

        assert!(matches!(
            election.close_voting(&voter("0x1"), during),
            Err(Error::Unauthorized(_))
        ));
        election.close_voting(&creator(), during).unwrap();
        assert_eq!(election.state_at(during), ElectionState::Closed);
        assert!(matches!(
            election.close_voting(&creator(), during),
            Err(Error::InvalidStateTransition {
                state: ElectionState::Closed,
                ..
            })
        ));
    }

    #[test]
    fn lifecycle_never_skips_or_reverses() {
        let mut election = Election::example(ElectionSpec::example());
        let before = t0() - Duration::minutes(1);

        // Created -> Closed would skip Open.
        assert!(matches!(
            election.close_voting(&creator(), before),
            Err(Error::InvalidStateTransition {
                state: ElectionState::Created,
                ..
            })
        ));
        assert!(matches!(
            election.finalize_tally(before),
            Err(Error::NotClosed(1))
        ));
        assert!(matches!(
            election.finalize_tally(t0()),
            Err(Error::NotClosed(1))
        ));

        election.finalize_tally(t1()).unwrap();
        assert!(matches!(
            election.finalize_tally(t1()),
            Err(Error::InvalidStateTransition {
                state: ElectionState::Tallied,
                ..
            })
        ));
        assert!(matches!(
            election.close_voting(&creator(), t1()),
            Err(Error::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            election.open_voting(&creator(), t1()),
            Err(Error::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn ties_and_empty_elections() {
        let gate = AdminListGate::unrestricted();
        let mut tied = Election::example(ElectionSpec::three_way_example());
        tied.cast_vote(voter("0x1"), 0, &gate, t0()).unwrap();
        tied.cast_vote(voter("0x2"), 2, &gate, t0()).unwrap();
        assert_eq!(tied.finalize_tally(t1()).unwrap().winners, vec![0, 2]);

        let mut empty = Election::example(ElectionSpec::example());
        let tally = empty.finalize_tally(t1()).unwrap();
        assert_eq!(tally.winners, vec![0, 1]);
        assert_eq!(tally.per_candidate_counts, vec![0, 0]);
    }

    #[test]
    fn restricted_electorate() {
        let gate = AdminListGate::unrestricted();
        let mut election = Election::example(ElectionSpec::restricted_example(&["0x1"]));

        assert!(matches!(
            election.cast_vote(voter("0x2"), 0, &gate, t0()),
            Err(Error::Unauthorized(_))
        ));
        election.cast_vote(voter("0x1"), 0, &gate, t0()).unwrap();
        assert!(election.describe(t0()).restricted_electorate);
    }

    #[test]
    fn passive_transitions_are_audited() {
        let mut election = Election::example(ElectionSpec::example());
        // Recorded well after the window ended.
        let later = t1() + Duration::hours(5);
        election.finalize_tally(later).unwrap();

        let events: Vec<_> = election
            .audit()
            .entries()
            .iter()
            .map(|entry| &entry.event)
            .collect();
        assert!(matches!(events[0], AuditEvent::Created { .. }));
        assert_eq!(*events[1], AuditEvent::Opened { by: None });
        assert_eq!(*events[2], AuditEvent::Closed { by: None });
        assert!(matches!(events[3], AuditEvent::Tallied { .. }));

        // Passive transitions carry the time they took effect.
        let stamps: Vec<_> = election.audit().entries().iter().map(|entry| entry.at).collect();
        assert_eq!(stamps, vec![t0() - Duration::hours(1), t0(), t1(), later]);
        assert_eq!(election.audit_dump(later).verify(), Ok(()));
    }
}
