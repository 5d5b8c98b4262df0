use std::collections::HashSet;

use crate::model::identity::Identity;

/// Who may vote in an election. An open electorate admits every identity;
/// a restricted one only those on its allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Electorate {
    #[default]
    Open,
    Restricted(HashSet<Identity>),
}

impl Electorate {
    pub fn admits(&self, identity: &Identity) -> bool {
        match self {
            Self::Open => true,
            Self::Restricted(voters) => voters.contains(identity),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Restricted(_))
    }
}

impl From<Option<Vec<Identity>>> for Electorate {
    fn from(voters: Option<Vec<Identity>>) -> Self {
        match voters {
            Some(voters) => Self::Restricted(voters.into_iter().collect()),
            None => Self::Open,
        }
    }
}
