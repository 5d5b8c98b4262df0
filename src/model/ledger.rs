use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::Result;

use super::audit::AuditDump;
use super::clock::Clock;
use super::election::{
    CandidateIndex, ElectionDescription, ElectionId, ElectionResults, ElectionSpec, Tally,
    VoteRecord,
};
use super::factory::ElectionFactory;
use super::gate::IdentityGate;
use super::identity::Identity;

/// The single owner of all election state.
///
/// Each mutating operation runs its whole validate-then-commit sequence under
/// the write lock, so operations are applied one at a time in a single order
/// and readers only ever see the state between two of them. The time used by
/// an operation is read once the lock is held.
pub struct Ledger {
    factory: RwLock<ElectionFactory>,
    gate: Box<dyn IdentityGate>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(gate: impl IdentityGate + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            factory: RwLock::new(ElectionFactory::new()),
            gate: Box::new(gate),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // A panic can only happen before a commit, so the state behind a
    // poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, ElectionFactory> {
        self.factory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ElectionFactory> {
        self.factory.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_election(&self, creator: Identity, spec: ElectionSpec) -> Result<ElectionId> {
        let mut factory = self.write();
        let now = self.now();
        let title = spec.title.clone();
        let result = factory.create_election(creator.clone(), spec, self.gate.as_ref(), now);
        match &result {
            Ok(id) => info!("Election {id} \"{title}\" created by {creator}"),
            Err(e) => warn!("Rejected election creation by {creator}: {e}"),
        }
        result
    }

    pub fn open_voting(&self, id: ElectionId, caller: &Identity) -> Result<()> {
        let mut factory = self.write();
        let now = self.now();
        let result = factory
            .get_election_mut(id)
            .and_then(|election| election.open_voting(caller, now));
        log_outcome(&result, id, "open", caller);
        result
    }

    pub fn cast_vote(
        &self,
        id: ElectionId,
        voter: Identity,
        candidate: CandidateIndex,
    ) -> Result<VoteRecord> {
        let mut factory = self.write();
        let now = self.now();
        let result = factory
            .get_election_mut(id)
            .and_then(|election| election.cast_vote(voter.clone(), candidate, self.gate.as_ref(), now));
        log_outcome(&result, id, "cast vote in", &voter);
        result
    }

    pub fn close_voting(&self, id: ElectionId, caller: &Identity) -> Result<()> {
        let mut factory = self.write();
        let now = self.now();
        let result = factory
            .get_election_mut(id)
            .and_then(|election| election.close_voting(caller, now));
        log_outcome(&result, id, "close", caller);
        result
    }

    pub fn finalize_tally(&self, id: ElectionId, caller: &Identity) -> Result<Tally> {
        let mut factory = self.write();
        let now = self.now();
        let result = factory
            .get_election_mut(id)
            .and_then(|election| election.finalize_tally(now));
        log_outcome(&result, id, "finalize", caller);
        if let Ok(tally) = &result {
            info!("Election {id} winners: {:?}", tally.winners);
        }
        result
    }

    pub fn get_election(&self, id: ElectionId) -> Result<ElectionDescription> {
        let factory = self.read();
        let now = self.now();
        Ok(factory.get_election(id)?.describe(now))
    }

    pub fn get_results(&self, id: ElectionId) -> Result<ElectionResults> {
        let factory = self.read();
        let now = self.now();
        Ok(factory.get_election(id)?.results(now))
    }

    pub fn list_elections(&self) -> Range<ElectionId> {
        self.read().list_elections()
    }

    pub fn has_voted(&self, id: ElectionId, identity: &Identity) -> Result<bool> {
        Ok(self.read().get_election(id)?.has_voted(identity))
    }

    pub fn audit_dump(&self, id: ElectionId) -> Result<AuditDump> {
        let factory = self.read();
        let now = self.now();
        Ok(factory.get_election(id)?.audit_dump(now))
    }
}

fn log_outcome<T>(result: &Result<T>, id: ElectionId, operation: &str, caller: &Identity) {
    match result {
        Ok(_) => info!("{caller}: {operation} election {id}"),
        Err(e) => warn!("Rejected {caller}: {operation} election {id}: {e}"),
    }
}
