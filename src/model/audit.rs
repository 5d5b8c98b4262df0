//! Per-election audit trail.
//!
//! Every committed change to an election is appended to its log as an
//! [`AuditEntry`] whose hash covers the previous entry's hash, so the log can
//! be checked offline by anyone holding an [`AuditDump`] without trusting the
//! server that produced it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use rocket::serde::json::serde_json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::election::{CandidateIndex, ElectionDescription, Tally, VotingWindow};
use super::identity::Identity;

/// The `prev` of the first entry in every log.
pub const GENESIS: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A committed change to an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuditEvent {
    Created {
        creator: Identity,
        title: String,
        candidates: Vec<String>,
        window: VotingWindow,
    },
    /// `by` is absent when the opening time passed rather than the creator
    /// opening early.
    Opened { by: Option<Identity> },
    VoteCast {
        voter: Identity,
        candidate: CandidateIndex,
    },
    /// `by` is absent for a close recorded after the window ended.
    Closed { by: Option<Identity> },
    Tallied {
        winners: Vec<CandidateIndex>,
        counts: Vec<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: AuditEvent,
    pub prev: String,
    pub hash: String,
}

/// The hashed part of an entry.
#[derive(Serialize)]
struct Hashed<'a> {
    seq: u64,
    at: &'a DateTime<Utc>,
    event: &'a AuditEvent,
}

impl AuditEntry {
    fn digest(prev: &str, seq: u64, at: &DateTime<Utc>, event: &AuditEvent) -> String {
        let body = serde_json::to_vec(&Hashed { seq, at, event })
            .expect("Serialisation is infallible");
        let mut hasher = Sha256::new();
        hasher.update(prev.as_bytes());
        hasher.update(&body);
        HEXLOWER.encode(&hasher.finalize())
    }

    /// Recompute this entry's hash from its contents.
    pub fn recompute_hash(&self) -> String {
        Self::digest(&self.prev, self.seq, &self.at, &self.event)
    }
}

/// An append-only, hash-chained log.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn append(&mut self, at: DateTime<Utc>, event: AuditEvent) -> &AuditEntry {
        let seq = self.entries.len() as u64;
        let prev = self.head().to_string();
        let hash = AuditEntry::digest(&prev, seq, &at, &event);
        self.entries.push(AuditEntry {
            seq,
            at,
            event,
            prev,
            hash,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Hash of the latest entry.
    pub fn head(&self) -> &str {
        self.entries
            .last()
            .map(|entry| entry.hash.as_str())
            .unwrap_or(GENESIS)
    }
}

/// Everything needed to check an election's published results offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDump {
    pub election: ElectionDescription,
    pub entries: Vec<AuditEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("entry {seq} does not chain from its predecessor")]
    Chain { seq: u64 },
    #[error("expected entry {expected}, found entry {found}")]
    Sequence { expected: u64, found: u64 },
    #[error("the log does not begin with the election's creation")]
    MissingGenesis,
    #[error("entry {seq} records a second vote by {voter}")]
    DuplicateVoter { seq: u64, voter: Identity },
    #[error("entry {seq} votes for nonexistent candidate {candidate}")]
    InvalidCandidate { seq: u64, candidate: CandidateIndex },
    #[error("entry {seq} records a vote while voting was not open")]
    VoteOutsideOpen { seq: u64 },
    #[error("replayed counts {replayed:?} differ from published counts {published:?}")]
    Counts {
        replayed: Vec<u64>,
        published: Vec<u64>,
    },
    #[error("published {field} differs from the audit log")]
    Description { field: &'static str },
    #[error("published winners {published:?} differ from recomputed winners {recomputed:?}")]
    Winners {
        recomputed: Vec<CandidateIndex>,
        published: Vec<CandidateIndex>,
    },
}

impl AuditDump {
    /// Check the log's integrity, then replay it and compare the outcome with
    /// the published election.
    pub fn verify(&self) -> Result<(), VerificationError> {
        self.verify_chain()?;
        let replayed = self.replay()?;
        self.verify_description()?;

        let published: Vec<u64> = self
            .election
            .candidates
            .iter()
            .map(|candidate| candidate.vote_count)
            .collect();
        if replayed != published {
            return Err(VerificationError::Counts {
                replayed,
                published,
            });
        }

        let recomputed = Tally::from_counts(replayed.clone());
        if let Some(tally) = &self.election.tally {
            if tally.per_candidate_counts != replayed {
                return Err(VerificationError::Counts {
                    replayed,
                    published: tally.per_candidate_counts.clone(),
                });
            }
            if tally.winners != recomputed.winners {
                return Err(VerificationError::Winners {
                    recomputed: recomputed.winners,
                    published: tally.winners.clone(),
                });
            }
        }
        for entry in &self.entries {
            if let AuditEvent::Tallied { winners, counts } = &entry.event {
                if *counts != replayed {
                    return Err(VerificationError::Counts {
                        replayed,
                        published: counts.clone(),
                    });
                }
                if *winners != recomputed.winners {
                    return Err(VerificationError::Winners {
                        recomputed: recomputed.winners,
                        published: winners.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn verify_chain(&self) -> Result<(), VerificationError> {
        let mut prev = GENESIS;
        for (expected, entry) in self.entries.iter().enumerate() {
            let expected = expected as u64;
            if entry.seq != expected {
                return Err(VerificationError::Sequence {
                    expected,
                    found: entry.seq,
                });
            }
            if entry.prev != prev || entry.recompute_hash() != entry.hash {
                return Err(VerificationError::Chain { seq: entry.seq });
            }
            prev = &entry.hash;
        }
        Ok(())
    }

    /// Check the published metadata against the hashed creation entry, and
    /// that a tally is published exactly when one was recorded.
    fn verify_description(&self) -> Result<(), VerificationError> {
        let (creator, title, candidates, window) =
            match self.entries.first().map(|entry| &entry.event) {
                Some(AuditEvent::Created {
                    creator,
                    title,
                    candidates,
                    window,
                }) => (creator, title, candidates, window),
                _ => return Err(VerificationError::MissingGenesis),
            };
        let election = &self.election;

        if election.creator != *creator {
            return Err(VerificationError::Description { field: "creator" });
        }
        if election.title != *title {
            return Err(VerificationError::Description { field: "title" });
        }
        if election.voting_window != *window {
            return Err(VerificationError::Description {
                field: "voting window",
            });
        }
        let names_match = election.candidates.len() == candidates.len()
            && election
                .candidates
                .iter()
                .zip(candidates)
                .enumerate()
                .all(|(position, (candidate, name))| {
                    candidate.index == position && candidate.name == *name
                });
        if !names_match {
            return Err(VerificationError::Description {
                field: "candidates",
            });
        }

        let tallied = self
            .entries
            .iter()
            .any(|entry| matches!(entry.event, AuditEvent::Tallied { .. }));
        if tallied != election.tally.is_some() {
            return Err(VerificationError::Description { field: "tally" });
        }

        Ok(())
    }

    /// Rebuild per-candidate counts from the vote entries.
    fn replay(&self) -> Result<Vec<u64>, VerificationError> {
        let (candidates, window) = match self.entries.first().map(|entry| &entry.event) {
            Some(AuditEvent::Created {
                candidates, window, ..
            }) => (candidates.len(), window),
            _ => return Err(VerificationError::MissingGenesis),
        };

        let mut counts = vec![0; candidates];
        let mut voters = HashSet::new();
        let mut open = false;
        for entry in &self.entries[1..] {
            match &entry.event {
                AuditEvent::Created { .. } => return Err(VerificationError::Chain { seq: entry.seq }),
                AuditEvent::Opened { .. } => open = true,
                AuditEvent::Closed { .. } => open = false,
                AuditEvent::VoteCast { voter, candidate } => {
                    if !open || window.has_closed(entry.at) {
                        return Err(VerificationError::VoteOutsideOpen { seq: entry.seq });
                    }
                    if *candidate >= candidates {
                        return Err(VerificationError::InvalidCandidate {
                            seq: entry.seq,
                            candidate: *candidate,
                        });
                    }
                    if !voters.insert(voter) {
                        return Err(VerificationError::DuplicateVoter {
                            seq: entry.seq,
                            voter: voter.clone(),
                        });
                    }
                    counts[*candidate] += 1;
                }
                AuditEvent::Tallied { .. } => {}
            }
        }
        Ok(counts)
    }
}
