use std::sync::Arc;

use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    clock::{Clock, SystemClock},
    gate::AdminListGate,
    identity::Identity,
    ledger::Ledger,
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default)]
    admins: Vec<Identity>,
    // secrets
    jwt_secret: String,
    hmac_secret: String,
}

impl Config {
    /// Identities allowed to create elections. Empty means anyone may.
    pub fn admins(&self) -> &[Identity] {
        &self.admins
    }

    /// Secret key used to verify identity JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Secret key used to sign vote receipts.
    pub fn hmac_secret(&self) -> &[u8] {
        self.hmac_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that builds the one [`Ledger`] for this server and places it
/// into managed state. Must be attached after [`ConfigFairing`].
pub struct LedgerFairing {
    clock: Arc<dyn Clock>,
}

impl LedgerFairing {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for LedgerFairing {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[rocket::async_trait]
impl Fairing for LedgerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Ledger",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let gate = match rocket.state::<Config>() {
            Some(config) => AdminListGate::new(config.admins().iter().cloned()),
            None => {
                error!("Ledger cannot be built without the application config");
                return Err(rocket);
            }
        };
        if gate.is_unrestricted() {
            info!("No admins configured, anyone may create elections");
        }

        // Manage the state.
        rocket = rocket.manage(Ledger::new(gate, Arc::clone(&self.clock)));
        info!("Ledger ready");
        Ok(rocket)
    }
}
