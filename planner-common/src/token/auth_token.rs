use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::token::{sign_hmac_sha256, Expiring, Token};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AuthTokenType {
    Access,
    Refresh,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthTokenClaims {
    #[serde(rename = "uid")]
    pub user_id: Uuid,
    #[serde(rename = "unm")]
    pub username: String,
    #[serde(rename = "exp")]
    pub expiration: u64,
    #[serde(rename = "typ")]
    pub token_type: AuthTokenType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAuthTokenClaims<'a> {
    #[serde(rename = "uid")]
    pub user_id: Uuid,
    #[serde(rename = "unm")]
    pub username: &'a str,
    #[serde(rename = "exp")]
    pub expiration: u64,
    #[serde(rename = "typ")]
    pub token_type: AuthTokenType,
}

impl<'a> NewAuthTokenClaims<'a> {
    pub fn expiring_in(
        user_id: Uuid,
        username: &'a str,
        lifetime: Duration,
        token_type: AuthTokenType,
    ) -> Self {
        let expiration = (SystemTime::now() + lifetime)
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            user_id,
            username,
            expiration,
            token_type,
        }
    }
}

impl Expiring for AuthTokenClaims {
    fn expiration(&self) -> u64 {
        self.expiration
    }
}

pub struct AuthToken {}

impl AuthToken {
    pub fn sign_new(claims: NewAuthTokenClaims, signing_key: &[u8]) -> String {
        sign_hmac_sha256(&claims, signing_key)
    }
}

impl Token for AuthToken {
    type Claims = AuthTokenClaims;

    fn token_name() -> &'static str {
        "AuthToken"
    }
}
