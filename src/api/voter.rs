use log::debug;
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::Result;
use crate::logging::RequestId;
use crate::model::{auth::AuthToken, election::ElectionId, ledger::Ledger, receipt::Receipt};

use super::{VoteAccepted, VoteRequest};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

#[post("/elections/<election_id>/votes", data = "<vote>", format = "json")]
async fn cast_vote(
    token: AuthToken,
    election_id: ElectionId,
    vote: Json<VoteRequest>,
    ledger: &State<Ledger>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Result<Json<VoteAccepted>> {
    let record = ledger.cast_vote(election_id, token.into_identity(), vote.candidate_index)?;
    debug!(
        "req{request_id} vote recorded at seq {} of election {election_id}",
        record.seq
    );
    let receipt = Receipt::sign(record, config.hmac_secret());
    Ok(Json(VoteAccepted {
        accepted: true,
        receipt,
    }))
}
