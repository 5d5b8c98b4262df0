use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use jsonwebtoken::{errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;

use super::identity::Identity;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

const BEARER_PREFIX: &str = "Bearer ";

/// Proof that the caller controls an identity. Tokens are issued elsewhere
/// (by whatever wallet or sign-in service fronts the ledger) and only checked
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    identity: Identity,
}

impl AuthToken {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn into_identity(self) -> Identity {
        self.identity
    }

    /// Sign this token, valid for `ttl` from now.
    pub fn encode(self, secret: &[u8], ttl: Duration) -> Result<String, JwtError> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + ttl,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
    }

    /// Check a token's signature and expiry.
    pub fn decode(token: &str, secret: &[u8]) -> Result<Self, JwtError> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret),
            &Validation::default(),
        )
        .map(|data| data.claims.token)
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// The raw token, from the `Authorization` header if present, otherwise from
/// the cookie.
fn raw_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    if let Some(header) = req.headers().get_one("Authorization") {
        return header.strip_prefix(BEARER_PREFIX).map(str::trim);
    }
    req.cookies()
        .get(AUTH_TOKEN_COOKIE)
        .map(|cookie| cookie.value())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = req.guard::<&State<Config>>().await.unwrap(); // Valid as `Config` is always managed.

        let Some(raw) = raw_token(req) else {
            return Outcome::Failure((
                Status::Unauthorized,
                Error::Unauthorized("no auth token supplied".to_string()),
            ));
        };

        match Self::decode(raw, config.jwt_secret()) {
            Ok(token) => Outcome::Success(token),
            Err(e) => {
                debug!("Rejected auth token: {e}");
                Outcome::Failure((Status::Unauthorized, e.into()))
            }
        }
    }
}
