use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    auth::AuthToken,
    election::{ElectionId, ElectionSpec, Tally},
    ledger::Ledger,
};

use super::CreatedElection;

pub fn routes() -> Vec<Route> {
    routes![create_election, open_voting, close_voting, finalize_tally]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AuthToken,
    spec: Json<ElectionSpec>,
    ledger: &State<Ledger>,
) -> Result<Json<CreatedElection>> {
    let id = ledger.create_election(token.into_identity(), spec.into_inner())?;
    Ok(Json(CreatedElection { id }))
}

#[post("/elections/<election_id>/open")]
async fn open_voting(
    token: AuthToken,
    election_id: ElectionId,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.open_voting(election_id, token.identity())
}

#[post("/elections/<election_id>/close")]
async fn close_voting(
    token: AuthToken,
    election_id: ElectionId,
    ledger: &State<Ledger>,
) -> Result<()> {
    ledger.close_voting(election_id, token.identity())
}

#[post("/elections/<election_id>/finalize")]
async fn finalize_tally(
    token: AuthToken,
    election_id: ElectionId,
    ledger: &State<Ledger>,
) -> Result<Json<Tally>> {
    let tally = ledger.finalize_tally(election_id, token.identity())?;
    Ok(Json(tally))
}
