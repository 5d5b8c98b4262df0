use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The period during which an election accepts votes: `[opens_at, closes_at)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl VotingWindow {
    pub fn new(opens_at: DateTime<Utc>, closes_at: DateTime<Utc>) -> Self {
        Self {
            opens_at,
            closes_at,
        }
    }

    /// A window must open strictly before it closes.
    pub fn validate(&self) -> Result<()> {
        if self.opens_at < self.closes_at {
            Ok(())
        } else {
            Err(Error::InvalidWindow)
        }
    }

    pub fn has_opened(&self, now: DateTime<Utc>) -> bool {
        now >= self.opens_at
    }

    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.closes_at
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.has_opened(now) && !self.has_closed(now)
    }
}
