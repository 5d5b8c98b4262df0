use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    audit::AuditDump,
    election::{ElectionDescription, ElectionId, ElectionResults},
    identity::Identity,
    ledger::Ledger,
    receipt::Receipt,
};

pub fn routes() -> Vec<Route> {
    routes![
        list_elections,
        get_election,
        get_results,
        has_voted,
        audit_dump,
        verify_receipt,
    ]
}

#[get("/elections")]
async fn list_elections(ledger: &State<Ledger>) -> Json<Vec<ElectionId>> {
    Json(ledger.list_elections().collect())
}

#[get("/elections/<election_id>")]
async fn get_election(
    election_id: ElectionId,
    ledger: &State<Ledger>,
) -> Result<Json<ElectionDescription>> {
    Ok(Json(ledger.get_election(election_id)?))
}

#[get("/elections/<election_id>/results")]
async fn get_results(
    election_id: ElectionId,
    ledger: &State<Ledger>,
) -> Result<Json<ElectionResults>> {
    Ok(Json(ledger.get_results(election_id)?))
}

#[get("/elections/<election_id>/voters/<identity>")]
async fn has_voted(
    election_id: ElectionId,
    identity: Identity,
    ledger: &State<Ledger>,
) -> Result<Json<bool>> {
    Ok(Json(ledger.has_voted(election_id, &identity)?))
}

#[get("/elections/<election_id>/audit")]
async fn audit_dump(election_id: ElectionId, ledger: &State<Ledger>) -> Result<Json<AuditDump>> {
    Ok(Json(ledger.audit_dump(election_id)?))
}

#[post("/receipts/verify", data = "<receipt>", format = "json")]
async fn verify_receipt(receipt: Json<Receipt>, config: &State<Config>) -> Json<bool> {
    Json(receipt.verify(config.hmac_secret()))
}
