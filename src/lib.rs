#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use config::{ConfigFairing, LedgerFairing};
use logging::LoggerFairing;

/// Build the server from the default figment (`Rocket.toml` and `ROCKET_*`
/// environment variables), keeping time with the system clock.
pub fn build() -> Rocket<Build> {
    rocket_for_figment(rocket::Config::figment(), LedgerFairing::default())
}

/// Build the server from the given figment and ledger.
pub(crate) fn rocket_for_figment(figment: Figment, ledger: LedgerFairing) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(ledger)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json,
    };
    use serde::de::DeserializeOwned;

    use crate::api::{CreatedElection, VoteRequest};
    use crate::config::LedgerFairing;
    use crate::model::{
        auth::AuthToken,
        clock::ManualClock,
        election::{CandidateIndex, ElectionId, ElectionSpec},
        identity::Identity,
    };

    pub const JWT_SECRET: &str = "test jwt secret";
    pub const HMAC_SECRET: &str = "test hmac secret";
    /// The only admin of a restricted test server.
    pub const ADMIN: &str = "0xad";

    /// Where every test server's clock starts.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    /// Spin up a fresh server over an empty ledger. Unless `unrestricted`,
    /// only [`ADMIN`] may create elections.
    pub async fn setup(unrestricted: bool) -> (Client, ManualClock) {
        log4rs_test_utils::test_logging::init_logging_once_for(
            ["election_ledger", "rocket"],
            None,
            None,
        );

        let admins: Vec<&str> = if unrestricted { vec![] } else { vec![ADMIN] };
        let figment = rocket::Config::figment()
            .merge(("jwt_secret", JWT_SECRET))
            .merge(("hmac_secret", HMAC_SECRET))
            .merge(("admins", admins));

        let clock = ManualClock::new(epoch());
        let rocket =
            crate::rocket_for_figment(figment, LedgerFairing::new(Arc::new(clock.clone())));
        let client = Client::tracked(rocket).await.unwrap();
        (client, clock)
    }

    /// An `Authorization` header proving control of `address`.
    pub fn bearer(address: &str) -> Header<'static> {
        let token = AuthToken::new(Identity::new(address).unwrap())
            .encode(JWT_SECRET.as_bytes(), Duration::hours(1))
            .unwrap();
        Header::new("Authorization", format!("Bearer {token}"))
    }

    /// Read a JSON response body.
    pub async fn json<T: DeserializeOwned>(response: LocalResponse<'_>) -> T {
        let body = response.into_string().await.unwrap();
        serde_json::from_str(&body).unwrap()
    }

    /// Create an election as [`ADMIN`], expecting success.
    pub async fn create_election(client: &Client, spec: &ElectionSpec) -> ElectionId {
        let response = client
            .post("/elections")
            .header(ContentType::JSON)
            .header(bearer(ADMIN))
            .body(serde_json::to_string(spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        json::<CreatedElection>(response).await.id
    }

    /// Vote as `voter`.
    pub async fn cast_vote<'c>(
        client: &'c Client,
        election_id: ElectionId,
        voter: &str,
        candidate_index: CandidateIndex,
    ) -> LocalResponse<'c> {
        client
            .post(format!("/elections/{election_id}/votes"))
            .header(ContentType::JSON)
            .header(bearer(voter))
            .body(serde_json::to_string(&VoteRequest { candidate_index }).unwrap())
            .dispatch()
            .await
    }
}
