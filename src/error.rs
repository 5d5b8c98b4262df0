use jsonwebtoken::errors::Error as JwtError;
use log::debug;
use rocket::{http::Status, response::Responder, serde::json::Json, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    election::{ElectionId, ElectionState},
    identity::Identity,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a ledger request can be rejected.
///
/// Rejections are always raised before anything is committed, so a failed
/// call leaves the ledger exactly as it found it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid candidate: index {index} is out of range for {count} candidates")]
    InvalidCandidate { index: usize, count: usize },
    #[error("Already voted: {voter} has already voted in election {election}")]
    AlreadyVoted { election: ElectionId, voter: Identity },
    #[error("Voting closed: election {0} is not accepting votes")]
    VotingClosed(ElectionId),
    #[error("Invalid state transition: cannot {operation} election {election} while it is {state}")]
    InvalidStateTransition {
        election: ElectionId,
        state: ElectionState,
        operation: &'static str,
    },
    #[error("Invalid window: voting must open strictly before it closes")]
    InvalidWindow,
    #[error("Insufficient candidates: an election needs at least 2 candidates, got {0}")]
    InsufficientCandidates(usize),
    #[error("Duplicate candidate name: {0}")]
    DuplicateCandidateName(String),
    #[error("Not closed: election {0} must be closed before it is tallied")]
    NotClosed(ElectionId),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Token(#[from] JwtError),
}

impl Error {
    /// Create a [`Error::NotFound`] for the described resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The machine-readable name of this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "Unauthorized",
            Self::NotFound(_) => "NotFound",
            Self::InvalidCandidate { .. } => "InvalidCandidate",
            Self::AlreadyVoted { .. } => "AlreadyVoted",
            Self::VotingClosed(_) => "VotingClosed",
            Self::InvalidStateTransition { .. } => "InvalidStateTransition",
            Self::InvalidWindow => "InvalidWindow",
            Self::InsufficientCandidates(_) => "InsufficientCandidates",
            Self::DuplicateCandidateName(_) => "DuplicateCandidateName",
            Self::NotClosed(_) => "NotClosed",
            Self::BadRequest(_) => "BadRequest",
            Self::Token(_) => "Unauthorized",
        }
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Unauthorized(_) | Self::Token(_) => Status::Unauthorized,
            Self::NotFound(_) => Status::NotFound,
            Self::AlreadyVoted { .. }
            | Self::VotingClosed(_)
            | Self::InvalidStateTransition { .. }
            | Self::NotClosed(_) => Status::Conflict,
            Self::InvalidCandidate { .. }
            | Self::InvalidWindow
            | Self::InsufficientCandidates(_)
            | Self::DuplicateCandidateName(_) => Status::UnprocessableEntity,
            Self::BadRequest(_) => Status::BadRequest,
        }
    }
}

/// The JSON body of every rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
}

impl ErrorBody {
    /// A body for a request rejected by rocket itself, before any handler ran.
    pub fn for_status(status: Status) -> Self {
        let error = match status.code {
            401 => "Unauthorized",
            404 => "NotFound",
            400 | 422 => "BadRequest",
            _ => "Internal",
        };
        Self {
            error: error.to_string(),
            reason: status.reason_lossy().to_string(),
        }
    }
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            error: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        debug!("Responding {status} to rejected request: {self}");
        (status, Json(ErrorBody::from(&self))).respond_to(req)
    }
}
