use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

use super::election::{Election, ElectionId, ElectionSpec};
use super::gate::IdentityGate;
use super::identity::Identity;

/// The registry of every election. Elections are only ever added; ids are
/// handed out in increasing order and never reused.
#[derive(Debug)]
pub struct ElectionFactory {
    elections: BTreeMap<ElectionId, Election>,
    next_id: ElectionId,
}

impl Default for ElectionFactory {
    fn default() -> Self {
        Self {
            elections: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl ElectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `spec` and register a new election for it.
    ///
    /// Nothing is allocated unless every check passes.
    pub fn create_election(
        &mut self,
        creator: Identity,
        spec: ElectionSpec,
        gate: &dyn IdentityGate,
        now: DateTime<Utc>,
    ) -> Result<ElectionId> {
        gate.can_create(&creator)
            .map_err(|denial| denial.into_error(self.next_id, &creator))?;
        let spec = spec.validate()?;

        let id = self.next_id;
        self.next_id += 1;
        self.elections
            .insert(id, Election::new(id, creator, spec, now));
        Ok(id)
    }

    pub fn get_election(&self, id: ElectionId) -> Result<&Election> {
        self.elections
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("Election {id}")))
    }

    pub(crate) fn get_election_mut(&mut self, id: ElectionId) -> Result<&mut Election> {
        self.elections
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Election {id}")))
    }

    /// Ids of every election, in creation order.
    ///
    /// The range is a snapshot: it can be cloned and walked again, and does
    /// not borrow the factory.
    pub fn list_elections(&self) -> Range<ElectionId> {
        1..self.next_id
    }

    pub fn len(&self) -> usize {
        self.elections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::election::spec::examples;
    use crate::model::gate::AdminListGate;

    fn identity(address: &str) -> Identity {
        Identity::new(address).unwrap()
    }

    #[test]
    fn ids_are_distinct_and_increasing() {
        let gate = AdminListGate::unrestricted();
        let mut factory = ElectionFactory::new();
        let now = examples::t0();

        let first = factory
            .create_election(identity("0x1"), ElectionSpec::example(), &gate, now)
            .unwrap();
        let second = factory
            .create_election(identity("0x2"), ElectionSpec::three_way_example(), &gate, now)
            .unwrap();

        assert_eq!(first, 1);
        assert!(second > first);
        assert_eq!(factory.list_elections().collect::<Vec<_>>(), vec![1, 2]);

        let listing = factory.list_elections();
        assert_eq!(listing.clone().count(), 2);
        assert_eq!(listing.collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(factory.get_election(second).unwrap().title(), "Treasurer");
    }

    #[test]
    fn failed_creation_allocates_nothing() {
        let gate = AdminListGate::new([identity("0xad")]);
        let mut factory = ElectionFactory::new();
        let now = examples::t0();

        assert!(matches!(
            factory.create_election(identity("0x1"), ElectionSpec::example(), &gate, now),
            Err(Error::Unauthorized(_))
        ));

        let mut single = ElectionSpec::example();
        single.candidates.truncate(1);
        assert!(matches!(
            factory.create_election(identity("0xad"), single, &gate, now),
            Err(Error::InsufficientCandidates(1))
        ));

        let mut duplicate = ElectionSpec::example();
        duplicate.candidates = vec!["A".into(), "A".into()];
        assert!(matches!(
            factory.create_election(identity("0xad"), duplicate, &gate, now),
            Err(Error::DuplicateCandidateName(_))
        ));

        assert!(factory.is_empty());
        assert_eq!(factory.list_elections().count(), 0);

        let id = factory
            .create_election(identity("0xad"), ElectionSpec::example(), &gate, now)
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn unknown_election_is_not_found() {
        let factory = ElectionFactory::new();
        assert!(matches!(factory.get_election(1), Err(Error::NotFound(_))));
    }
}
