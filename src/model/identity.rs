use std::fmt::{Display, Formatter};

use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The authenticated address of a caller: the unit of voting eligibility
/// and uniqueness.
///
/// Addresses are case-insensitive, so they are held trimmed and lowercased;
/// two spellings of the same address are always the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("an identity address must not be empty")]
pub struct EmptyIdentity;

impl Identity {
    /// Normalise the given address into an identity.
    pub fn new(address: impl AsRef<str>) -> Result<Self, EmptyIdentity> {
        let address = address.as_ref().trim();
        if address.is_empty() {
            return Err(EmptyIdentity);
        }
        Ok(Self(address.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = EmptyIdentity;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        Self::new(address)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl<'a> FromParam<'a> for Identity {
    type Error = EmptyIdentity;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Self::new(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_normalised() {
        let a = Identity::new("  0xDeadBeef ").unwrap();
        let b = Identity::new("0xdeadbeef").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xdeadbeef");
    }

    #[test]
    fn empty_addresses_are_rejected() {
        assert_eq!(Identity::new("   "), Err(EmptyIdentity));
        assert!(rocket::serde::json::serde_json::from_str::<Identity>("\"\"").is_err());
    }
}
