use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};
use serde::{Deserialize, Serialize};

use crate::error::ErrorBody;
use crate::model::election::{CandidateIndex, ElectionId};
use crate::model::receipt::Receipt;

mod admin;
mod public;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(voter::routes());
    routes.extend(public::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Failures that never reach a handler (bad tokens, unparseable bodies,
/// unknown routes) still get the same JSON error shape.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    (status, Json(ErrorBody::for_status(status)))
}

/// The response to a successful election creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedElection {
    pub id: ElectionId,
}

/// A ballot, as submitted by a voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub candidate_index: CandidateIndex,
}

/// The response to an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAccepted {
    pub accepted: bool,
    pub receipt: Receipt,
}
