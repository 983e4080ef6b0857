use planner_common::token::auth_token::{AuthToken, AuthTokenClaims, AuthTokenType};
use planner_common::token::{DecodedToken, Token, TokenError};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures::future;
use std::marker::PhantomData;

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::middleware::{into_actix_error_res, TokenLocation};

pub trait RequestAuthTokenType {
    fn token_name() -> &'static str;
    fn token_type() -> AuthTokenType;
}

pub struct Access {}
pub struct Refresh {}

impl RequestAuthTokenType for Access {
    fn token_name() -> &'static str {
        "AccessToken"
    }
    fn token_type() -> AuthTokenType {
        AuthTokenType::Access
    }
}

impl RequestAuthTokenType for Refresh {
    fn token_name() -> &'static str {
        "RefreshToken"
    }
    fn token_type() -> AuthTokenType {
        AuthTokenType::Refresh
    }
}

type AuthDecodedToken = DecodedToken<<AuthToken as Token>::Claims>;

/// Claims of a token whose signature, expiration and type have all been checked.
#[derive(Debug)]
pub struct VerifiedToken<T: RequestAuthTokenType, L: TokenLocation> {
    pub claims: AuthTokenClaims,
    _marker: PhantomData<(T, L)>,
}

impl<T, L> FromRequest for VerifiedToken<T, L>
where
    T: RequestAuthTokenType,
    L: TokenLocation,
{
    type Error = HttpErrorResponse;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let decoded_token = match into_actix_error_res(get_and_decode_token::<T, L>(req)) {
            Ok(t) => t,
            Err(e) => return future::err(e),
        };

        let claims = match into_actix_error_res(verify_token(&decoded_token, T::token_type())) {
            Ok(c) => c,
            Err(e) => return future::err(e),
        };

        future::ok(VerifiedToken {
            claims,
            _marker: PhantomData,
        })
    }
}

#[inline]
fn get_and_decode_token<T, L>(req: &HttpRequest) -> Result<AuthDecodedToken, TokenError>
where
    T: RequestAuthTokenType,
    L: TokenLocation,
{
    let token = match L::get_from_request(req, T::token_name()) {
        Some(t) => t,
        None => return Err(TokenError::TokenMissing),
    };

    AuthToken::decode(token)
}

#[inline]
fn verify_token(
    decoded_token: &AuthDecodedToken,
    expected_type: AuthTokenType,
) -> Result<AuthTokenClaims, TokenError> {
    let claims = decoded_token.verify(&env::CONF.token_signing_key)?;

    if claims.token_type != expected_type {
        return Err(TokenError::WrongTokenType);
    }

    Ok(claims.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::dev::Payload;
    use actix_web::test::TestRequest;
    use planner_common::token::auth_token::NewAuthTokenClaims;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    use crate::middleware::FromHeader;

    fn sign(token_type: AuthTokenType, expiration: u64) -> String {
        let claims = NewAuthTokenClaims {
            user_id: Uuid::now_v7(),
            username: "tester",
            expiration,
            token_type,
        };

        AuthToken::sign_new(claims, &env::CONF.token_signing_key)
    }

    fn future_exp() -> u64 {
        (SystemTime::now() + Duration::from_secs(10))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    async fn access_from(req: &HttpRequest) -> Result<VerifiedToken<Access, FromHeader>, HttpErrorResponse> {
        VerifiedToken::<Access, FromHeader>::from_request(req, &mut Payload::None).await
    }

    #[actix_web::test]
    async fn test_verified_from_header() {
        let token = sign(AuthTokenType::Access, future_exp());
        let req = TestRequest::default()
            .insert_header(("AccessToken", token.as_str()))
            .to_http_request();

        let verified = access_from(&req).await.unwrap();
        assert_eq!(verified.claims.username, "tester");
        assert_eq!(verified.claims.token_type, AuthTokenType::Access);

        assert!(
            VerifiedToken::<Refresh, FromHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }

    #[actix_web::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let token = sign(AuthTokenType::Refresh, future_exp());

        let req = TestRequest::default()
            .insert_header(("AccessToken", token.as_str()))
            .to_http_request();
        assert!(matches!(
            access_from(&req).await,
            Err(HttpErrorResponse::WrongTokenType(_))
        ));

        let req = TestRequest::default()
            .insert_header(("RefreshToken", token.as_str()))
            .to_http_request();
        assert!(matches!(
            access_from(&req).await,
            Err(HttpErrorResponse::TokenMissing(_))
        ));
        assert!(
            VerifiedToken::<Refresh, FromHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_ok()
        );
    }

    #[actix_web::test]
    async fn test_expired_and_tampered_tokens() {
        let past = (SystemTime::now() - Duration::from_secs(10))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let expired = sign(AuthTokenType::Access, past);
        let req = TestRequest::default()
            .insert_header(("AccessToken", expired.as_str()))
            .to_http_request();
        assert!(matches!(
            access_from(&req).await,
            Err(HttpErrorResponse::TokenExpired(_))
        ));

        let claims = NewAuthTokenClaims {
            user_id: Uuid::now_v7(),
            username: "tester",
            expiration: future_exp(),
            token_type: AuthTokenType::Access,
        };
        let forged = AuthToken::sign_new(claims, b"not the signing key");
        let req = TestRequest::default()
            .insert_header(("AccessToken", forged.as_str()))
            .to_http_request();
        assert!(matches!(
            access_from(&req).await,
            Err(HttpErrorResponse::IncorrectCredential(_))
        ));

        let req = TestRequest::default()
            .insert_header(("AccessToken", "garbage"))
            .to_http_request();
        assert!(access_from(&req).await.is_err());
    }
}
