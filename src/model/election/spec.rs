use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::identity::Identity;

use super::window::VotingWindow;

/// What a creator asks for when creating an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Candidate names, in ballot order.
    pub candidates: Vec<String>,
    pub voting_window: VotingWindow,
    /// If present, only these identities may vote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electorate: Option<Vec<Identity>>,
}

impl ElectionSpec {
    /// Check the spec can become an election, returning it with its title and
    /// candidate names trimmed.
    ///
    /// Checks run in a fixed order (candidate count, window, blank text,
    /// duplicate names), so a spec with several problems always reports the
    /// same one.
    pub fn validate(mut self) -> Result<Self> {
        if self.candidates.len() < 2 {
            return Err(Error::InsufficientCandidates(self.candidates.len()));
        }
        self.voting_window.validate()?;

        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(Error::BadRequest("election title must not be empty".into()));
        }

        for name in &mut self.candidates {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::BadRequest("candidate names must not be empty".into()));
            }
        }

        let mut seen = HashSet::with_capacity(self.candidates.len());
        for name in &self.candidates {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateCandidateName(name.clone()));
            }
        }

        Ok(self)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_spec_is_trimmed() {
        let mut spec = ElectionSpec::example();
        spec.title = "  Club Captain ".to_string();
        spec.candidates = vec![" A".to_string(), "B  ".to_string()];

        let spec = spec.validate().unwrap();
        assert_eq!(spec.title, "Club Captain");
        assert_eq!(spec.candidates, vec!["A", "B"]);
    }

    #[test]
    fn too_few_candidates() {
        let mut spec = ElectionSpec::example();
        spec.candidates.truncate(1);
        assert!(matches!(
            spec.validate(),
            Err(Error::InsufficientCandidates(1))
        ));
    }

    #[test]
    fn inverted_window() {
        let mut spec = ElectionSpec::example();
        spec.voting_window = VotingWindow::new(examples::t1(), examples::t0());
        assert!(matches!(spec.validate(), Err(Error::InvalidWindow)));
    }

    #[test]
    fn duplicates_are_detected_after_trimming() {
        let mut spec = ElectionSpec::example();
        spec.candidates = vec!["A".to_string(), " A ".to_string()];
        assert!(matches!(
            spec.validate(),
            Err(Error::DuplicateCandidateName(name)) if name == "A"
        ));
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut spec = ElectionSpec::example();
        spec.title = "   ".to_string();
        assert!(matches!(spec.validate(), Err(Error::BadRequest(_))));

        let mut spec = ElectionSpec::example();
        spec.candidates.push(String::new());
        assert!(matches!(spec.validate(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn count_is_checked_before_window() {
        let mut spec = ElectionSpec::example();
        spec.candidates.clear();
        spec.voting_window = VotingWindow::new(examples::t1(), examples::t0());
        assert!(matches!(
            spec.validate(),
            Err(Error::InsufficientCandidates(0))
        ));
    }
}
