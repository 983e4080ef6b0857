use planner_common::db::{self, DaoError, DbThreadPool};
use planner_common::models::user::User;
use planner_common::request_io::{
    CredentialPair, InputRegistration, OutputSignin, OutputUser, TokenPair,
};
use planner_common::token::auth_token::{AuthToken, AuthTokenType, NewAuthTokenClaims};
use planner_common::validators::forms;

use actix_web::{web, HttpResponse};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Refresh, VerifiedToken};
use crate::middleware::FromHeader;

const INCORRECT_CREDENTIALS_MSG: &str = "Incorrect username or password";

pub async fn register(
    db_thread_pool: web::Data<DbThreadPool>,
    registration: web::Json<InputRegistration>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_registration(&registration)?;
    let password = Zeroizing::new(fields.password.clone());

    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let hash_result = argon2_kdf::Hasher::default()
            .algorithm(argon2_kdf::Algorithm::Argon2id)
            .salt_length(env::CONF.hash_salt_length)
            .hash_length(env::CONF.hash_length)
            .iterations(env::CONF.hash_iterations)
            .memory_cost_kib(env::CONF.hash_mem_cost_kib)
            .threads(env::CONF.hash_threads)
            .secret(argon2_kdf::Secret::using_bytes(&env::CONF.hashing_key))
            .hash(password.as_bytes());

        // The receiver only goes away if the request was dropped
        let _ = sender.send(hash_result);
    });

    let password_hash = match receiver.await? {
        Ok(h) => h.to_string(),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to hash password",
            )));
        }
    };

    let fields = Arc::new(fields);
    let fields_ref = Arc::clone(&fields);

    let user = match web::block(move || {
        let user_dao = db::user::Dao::new(&db_thread_pool);
        user_dao.create_user(&fields_ref.username, &fields_ref.email, &password_hash)
    })
    .await?
    {
        Ok(u) => u,
        Err(DaoError::AlreadyExists) => {
            return Err(HttpErrorResponse::ConflictWithExisting(String::from(
                "A user with that username already exists.",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to create user",
            )));
        }
    };

    log::info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(signin_response(&user)))
}

pub async fn sign_in(
    db_thread_pool: web::Data<DbThreadPool>,
    credentials: web::Json<CredentialPair>,
) -> Result<HttpResponse, HttpErrorResponse> {
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
            "Username and password are required",
        )));
    }

    let credentials = Arc::new(credentials.into_inner());
    let credentials_ref = Arc::clone(&credentials);

    let user = match web::block(move || {
        let user_dao = db::user::Dao::new(&db_thread_pool);
        user_dao.get_user_by_username(&credentials_ref.username)
    })
    .await?
    {
        Ok(u) => u,
        Err(e) if e.is_not_found() => {
            return Err(HttpErrorResponse::IncorrectCredential(String::from(
                INCORRECT_CREDENTIALS_MSG,
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up user",
            )));
        }
    };

    let password_hash = user.password_hash.clone();
    let credentials_ref = Arc::clone(&credentials);

    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let result = argon2_kdf::Hash::from_str(&password_hash).map(|hash| {
            hash.verify_with_secret(
                credentials_ref.password.as_bytes(),
                argon2_kdf::Secret::using_bytes(&env::CONF.hashing_key),
            )
        });

        let _ = sender.send(result);
    });

    match receiver.await? {
        Ok(true) => (),
        Ok(false) => {
            return Err(HttpErrorResponse::IncorrectCredential(String::from(
                INCORRECT_CREDENTIALS_MSG,
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to validate password",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(signin_response(&user)))
}

pub async fn refresh_tokens(
    refresh_token: VerifiedToken<Refresh, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let claims = refresh_token.claims;
    Ok(HttpResponse::Ok().json(new_token_pair(claims.user_id, &claims.username)))
}

fn signin_response(user: &User) -> OutputSignin {
    OutputSignin {
        user: OutputUser::from(user),
        tokens: new_token_pair(user.id, &user.username),
    }
}

fn new_token_pair(user_id: Uuid, username: &str) -> TokenPair {
    let access_claims = NewAuthTokenClaims::expiring_in(
        user_id,
        username,
        env::CONF.access_token_lifetime,
        AuthTokenType::Access,
    );

    let refresh_claims = NewAuthTokenClaims::expiring_in(
        user_id,
        username,
        env::CONF.refresh_token_lifetime,
        AuthTokenType::Refresh,
    );

    TokenPair {
        access_token: AuthToken::sign_new(access_claims, &env::CONF.token_signing_key),
        refresh_token: AuthToken::sign_new(refresh_claims, &env::CONF.token_signing_key),
    }
}
