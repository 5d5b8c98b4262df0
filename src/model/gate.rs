use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};

use crate::error::Error;

use super::election::{Election, ElectionId, ElectionState};
use super::identity::Identity;

/// Why an identity was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotAnAdmin,
    NotInElectorate,
    AlreadyVoted,
    NotOpen,
}

impl Denial {
    /// Turn this denial into the error reported for `identity` in `election`.
    pub fn into_error(self, election: ElectionId, identity: &Identity) -> Error {
        match self {
            Self::NotAnAdmin => Error::Unauthorized(format!("{identity} may not create elections")),
            Self::NotInElectorate => Error::Unauthorized(format!(
                "{identity} is not in the electorate of election {election}"
            )),
            Self::AlreadyVoted => Error::AlreadyVoted {
                election,
                voter: identity.clone(),
            },
            Self::NotOpen => Error::VotingClosed(election),
        }
    }
}

impl Display for Denial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotAnAdmin => "not an admin",
            Self::NotInElectorate => "not in the electorate",
            Self::AlreadyVoted => "already voted",
            Self::NotOpen => "voting is not open",
        })
    }
}

/// Decides who may create elections and who may vote in them.
///
/// Decisions never change anything; an election enforces its own rules
/// again after asking the gate.
pub trait IdentityGate: Send + Sync {
    fn can_create(&self, identity: &Identity) -> Result<(), Denial>;

    fn can_vote(
        &self,
        identity: &Identity,
        election: &Election,
        now: DateTime<Utc>,
    ) -> Result<(), Denial>;
}

/// Creation restricted to a fixed set of admins; an empty set lets anyone
/// create. Voting open to any identity in the election's electorate that has
/// not voted yet, while the election is open.
#[derive(Debug, Clone, Default)]
pub struct AdminListGate {
    admins: HashSet<Identity>,
}

impl AdminListGate {
    pub fn new(admins: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admins.contains(identity)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.admins.is_empty()
    }
}

impl IdentityGate for AdminListGate {
    fn can_create(&self, identity: &Identity) -> Result<(), Denial> {
        if self.is_unrestricted() || self.is_admin(identity) {
            Ok(())
        } else {
            Err(Denial::NotAnAdmin)
        }
    }

    fn can_vote(
        &self,
        identity: &Identity,
        election: &Election,
        now: DateTime<Utc>,
    ) -> Result<(), Denial> {
        if election.state_at(now) != ElectionState::Open {
            Err(Denial::NotOpen)
        } else if !election.is_eligible(identity) {
            Err(Denial::NotInElectorate)
        } else if election.has_voted(identity) {
            Err(Denial::AlreadyVoted)
        } else {
            Ok(())
        }
    }
}
