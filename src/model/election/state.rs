use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// States in the Election lifecycle. Elections only ever move forward
/// through these, in declaration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElectionState {
    /// Candidates and window are fixed; no votes accepted yet.
    Created,
    /// Accepting votes from eligible identities.
    Open,
    /// No further votes; waiting for the tally to be finalized.
    Closed,
    /// Results are final and read-only.
    Tallied,
}

impl ElectionState {
    pub fn accepts_votes(self) -> bool {
        self == Self::Open
    }

    /// Has the election stopped taking votes for good?
    pub fn is_finished(self) -> bool {
        self >= Self::Closed
    }
}

impl Display for ElectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Tallied => "tallied",
        })
    }
}
