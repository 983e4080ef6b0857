pub mod auth_token;

use base64::engine::general_purpose::URL_SAFE as b64_urlsafe;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_LENGTH: usize = 32;
const MAX_TOKEN_LENGTH: usize = 8192;

#[derive(Debug)]
pub enum TokenError {
    TokenInvalid,
    TokenExpired,
    TokenMissing,
    WrongTokenType,
}

impl std::error::Error for TokenError {}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::TokenInvalid => write!(f, "TokenInvalid"),
            TokenError::TokenExpired => write!(f, "TokenExpired"),
            TokenError::TokenMissing => write!(f, "TokenMissing"),
            TokenError::WrongTokenType => write!(f, "WrongTokenType"),
        }
    }
}

pub trait Expiring {
    fn expiration(&self) -> u64;
}

/// A token whose claims were parsed but whose signature has not been checked yet.
#[derive(Debug)]
pub struct DecodedToken<C>
where
    C: Expiring + DeserializeOwned,
{
    pub json: Vec<u8>,
    pub signature: Vec<u8>,
    pub claims: C,
}

impl<C> DecodedToken<C>
where
    C: Expiring + DeserializeOwned,
{
    pub fn verify(&self, key: &[u8]) -> Result<&C, TokenError> {
        if !verify_hmac_sha256(&self.json, &self.signature, key) {
            return Err(TokenError::TokenInvalid);
        }

        let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) else {
            return Err(TokenError::TokenInvalid);
        };

        if self.claims.expiration() <= now.as_secs() {
            return Err(TokenError::TokenExpired);
        }

        Ok(&self.claims)
    }
}

/// Tokens are `base64url(json || hmac_sha256(json))`.
pub trait Token {
    type Claims: Expiring + DeserializeOwned;

    fn token_name() -> &'static str;

    fn decode(token: &str) -> Result<DecodedToken<Self::Claims>, TokenError> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(TokenError::TokenInvalid);
        }

        let decoded_token = b64_urlsafe
            .decode(token)
            .map_err(|_| TokenError::TokenInvalid)?;

        if decoded_token.len() <= SIGNATURE_LENGTH {
            return Err(TokenError::TokenInvalid);
        }

        let json_len = decoded_token.len() - SIGNATURE_LENGTH;
        let json = &decoded_token[..json_len];

        let signature = Vec::from(&decoded_token[json_len..]);
        let claims: Self::Claims =
            serde_json::from_slice(json).map_err(|_| TokenError::TokenInvalid)?;

        Ok(DecodedToken {
            json: Vec::from(json),
            signature,
            claims,
        })
    }
}

fn sign_hmac_sha256<C: Serialize>(claims: &C, signing_key: &[u8]) -> String {
    let mut token_unencoded =
        serde_json::to_vec(claims).expect("Failed to transform claims into JSON");

    let mut mac = HmacSha256::new_from_slice(signing_key).expect("HMAC accepts keys of any size");
    mac.update(&token_unencoded);
    let signature = mac.finalize();
    token_unencoded.extend_from_slice(&signature.into_bytes());

    b64_urlsafe.encode(&token_unencoded)
}

fn verify_hmac_sha256(json: &[u8], signature: &[u8], key: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };

    mac.update(json);

    // Constant-time comparison
    mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Clone, Copy, Serialize, Deserialize)]
    struct TestClaims {
        id: Uuid,
        exp: u64,
    }

    impl Expiring for TestClaims {
        fn expiration(&self) -> u64 {
            self.exp
        }
    }

    struct TestToken {}

    impl Token for TestToken {
        type Claims = TestClaims;

        fn token_name() -> &'static str {
            "TestToken"
        }
    }

    fn exp_in(secs: i64) -> u64 {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        (now as i64 + secs) as u64
    }

    fn make_signature_invalid(token: &mut String) {
        let mut decoded = b64_urlsafe.decode(&token).unwrap();

        if decoded.last().unwrap() == &b'a' {
            decoded.pop();
            decoded.push(b'b');
        } else {
            decoded.pop();
            decoded.push(b'a');
        }

        *token = b64_urlsafe.encode(decoded);
    }

    #[test]
    fn test_decode_and_verify() {
        let id = Uuid::now_v7();
        let exp = exp_in(10);
        let token = sign_hmac_sha256(&TestClaims { id, exp }, &[10; 64]);

        let t = TestToken::decode(&token).unwrap();
        assert_eq!(t.claims.id, id);
        assert_eq!(t.claims.exp, exp);

        let claims = t.verify(&[10; 64]).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_verify_rejects_bad_signature_and_key() {
        let id = Uuid::now_v7();
        let key = [2; 64];

        let mut token = sign_hmac_sha256(&TestClaims { id, exp: exp_in(10) }, &key);
        assert!(TestToken::decode(&token).unwrap().verify(&key).is_ok());
        assert!(TestToken::decode(&token).unwrap().verify(&[3; 64]).is_err());

        make_signature_invalid(&mut token);
        assert!(matches!(
            TestToken::decode(&token).unwrap().verify(&key),
            Err(TokenError::TokenInvalid)
        ));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let key = [2; 64];
        let token = sign_hmac_sha256(
            &TestClaims {
                id: Uuid::now_v7(),
                exp: exp_in(-10),
            },
            &key,
        );

        assert!(matches!(
            TestToken::decode(&token).unwrap().verify(&key),
            Err(TokenError::TokenExpired)
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(TestToken::decode("not base64!").is_err());
        assert!(TestToken::decode(&b64_urlsafe.encode([1u8; 16])).is_err());
        assert!(TestToken::decode(&"a".repeat(MAX_TOKEN_LENGTH + 1)).is_err());
    }
}
