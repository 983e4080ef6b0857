pub mod auth;
pub mod budget_goal;
pub mod category;
pub mod contact;
pub mod dashboard;
pub mod health;
pub mod report;
pub mod transaction;

pub mod error {
    use planner_common::request_io::{ErrorType, ServerErrorResponse};
    use planner_common::token::TokenError;
    use planner_common::validators::FormErrors;

    use actix_web::http::StatusCode;
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use std::fmt;
    use tokio::sync::oneshot;

    #[derive(Debug)]
    pub enum DoesNotExistType {
        User,
        Category,
        Transaction,
        BudgetGoal,
    }

    #[derive(Debug)]
    pub enum HttpErrorResponse {
        // 400
        IncorrectlyFormed(String),
        InvalidForm(FormErrors),
        ConflictWithExisting(String),

        // 401
        IncorrectCredential(String),
        TokenExpired(String),
        TokenMissing(String),
        WrongTokenType(String),

        // 404
        DoesNotExist(String, DoesNotExistType),

        // 500
        InternalError(String),

        // 502
        ExternalServiceFailure(String),

        // 503
        ServiceNotConfigured(String),
    }

    impl std::error::Error for HttpErrorResponse {}

    impl fmt::Display for HttpErrorResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let server_error: ServerErrorResponse = self.into();
            write!(f, "{:?}", server_error)
        }
    }

    impl From<HttpErrorResponse> for ServerErrorResponse {
        fn from(resp: HttpErrorResponse) -> Self {
            (&resp).into()
        }
    }

    impl From<&HttpErrorResponse> for ServerErrorResponse {
        fn from(resp: &HttpErrorResponse) -> Self {
            let (err_type, err_message) = match resp {
                // 400
                HttpErrorResponse::IncorrectlyFormed(msg) => (
                    ErrorType::IncorrectlyFormed,
                    format!("Incorrectly formed request: {msg}"),
                ),
                HttpErrorResponse::InvalidForm(_) => (
                    ErrorType::InvalidForm,
                    String::from("Invalid form: see field errors"),
                ),
                HttpErrorResponse::ConflictWithExisting(msg) => (
                    ErrorType::ConflictWithExisting,
                    format!("Conflict with existing data: {msg}"),
                ),

                // 401
                HttpErrorResponse::IncorrectCredential(msg) => (
                    ErrorType::IncorrectCredential,
                    format!("Incorrect credential: {msg}"),
                ),
                HttpErrorResponse::TokenExpired(msg) => {
                    (ErrorType::TokenExpired, format!("Token expired: {msg}"))
                }
                HttpErrorResponse::TokenMissing(msg) => {
                    (ErrorType::TokenMissing, format!("Token missing: {msg}"))
                }
                HttpErrorResponse::WrongTokenType(msg) => {
                    (ErrorType::WrongTokenType, format!("Wrong token type: {msg}"))
                }

                // 404
                HttpErrorResponse::DoesNotExist(msg, dne_type) => (
                    match dne_type {
                        DoesNotExistType::User => ErrorType::UserDoesNotExist,
                        DoesNotExistType::Category => ErrorType::CategoryDoesNotExist,
                        DoesNotExistType::Transaction => ErrorType::TransactionDoesNotExist,
                        DoesNotExistType::BudgetGoal => ErrorType::BudgetGoalDoesNotExist,
                    },
                    format!("Does not exist: {msg}"),
                ),

                // 500
                HttpErrorResponse::InternalError(msg) => {
                    (ErrorType::InternalError, format!("Internal error: {msg}"))
                }

                // 502
                HttpErrorResponse::ExternalServiceFailure(msg) => (
                    ErrorType::ExternalServiceFailure,
                    format!("External service failure: {msg}"),
                ),

                // 503
                HttpErrorResponse::ServiceNotConfigured(msg) => (
                    ErrorType::ServiceNotConfigured,
                    format!("Service not configured: {msg}"),
                ),
            };

            let field_errors = match resp {
                HttpErrorResponse::InvalidForm(errors) => Some(errors.clone()),
                _ => None,
            };

            ServerErrorResponse {
                err_type,
                err_message,
                field_errors,
            }
        }
    }

    impl actix_web::error::ResponseError for HttpErrorResponse {
        fn error_response(&self) -> HttpResponse {
            HttpResponseBuilder::new(self.status_code()).json(ServerErrorResponse::from(self))
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                HttpErrorResponse::IncorrectlyFormed(_)
                | HttpErrorResponse::InvalidForm(_)
                | HttpErrorResponse::ConflictWithExisting(_) => StatusCode::BAD_REQUEST,
                HttpErrorResponse::IncorrectCredential(_)
                | HttpErrorResponse::TokenExpired(_)
                | HttpErrorResponse::TokenMissing(_)
                | HttpErrorResponse::WrongTokenType(_) => StatusCode::UNAUTHORIZED,
                HttpErrorResponse::DoesNotExist(_, _) => StatusCode::NOT_FOUND,
                HttpErrorResponse::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                HttpErrorResponse::ExternalServiceFailure(_) => StatusCode::BAD_GATEWAY,
                HttpErrorResponse::ServiceNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            }
        }
    }

    impl From<FormErrors> for HttpErrorResponse {
        fn from(errors: FormErrors) -> Self {
            HttpErrorResponse::InvalidForm(errors)
        }
    }

    impl From<actix_web::error::BlockingError> for HttpErrorResponse {
        fn from(_err: actix_web::error::BlockingError) -> Self {
            HttpErrorResponse::InternalError(String::from("Actix thread pool failure"))
        }
    }

    impl From<oneshot::error::RecvError> for HttpErrorResponse {
        fn from(_err: oneshot::error::RecvError) -> Self {
            HttpErrorResponse::InternalError(String::from("Rayon thread pool failure"))
        }
    }

    impl From<TokenError> for HttpErrorResponse {
        fn from(err: TokenError) -> Self {
            match err {
                TokenError::TokenInvalid => {
                    HttpErrorResponse::IncorrectCredential(String::from("Invalid token"))
                }
                TokenError::TokenExpired => {
                    HttpErrorResponse::TokenExpired(String::from("Token expired"))
                }
                TokenError::TokenMissing => {
                    HttpErrorResponse::TokenMissing(String::from("Missing token"))
                }
                TokenError::WrongTokenType => {
                    HttpErrorResponse::WrongTokenType(String::from("Wrong token type"))
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        use actix_web::body::to_bytes;
        use actix_web::ResponseError;

        #[test]
        fn test_status_codes() {
            let cases = [
                (
                    HttpErrorResponse::IncorrectlyFormed(String::new()),
                    StatusCode::BAD_REQUEST,
                ),
                (
                    HttpErrorResponse::InvalidForm(FormErrors::new()),
                    StatusCode::BAD_REQUEST,
                ),
                (
                    HttpErrorResponse::ConflictWithExisting(String::new()),
                    StatusCode::BAD_REQUEST,
                ),
                (
                    HttpErrorResponse::IncorrectCredential(String::new()),
                    StatusCode::UNAUTHORIZED,
                ),
                (
                    HttpErrorResponse::TokenExpired(String::new()),
                    StatusCode::UNAUTHORIZED,
                ),
                (
                    HttpErrorResponse::TokenMissing(String::new()),
                    StatusCode::UNAUTHORIZED,
                ),
                (
                    HttpErrorResponse::WrongTokenType(String::new()),
                    StatusCode::UNAUTHORIZED,
                ),
                (
                    HttpErrorResponse::DoesNotExist(String::new(), DoesNotExistType::Category),
                    StatusCode::NOT_FOUND,
                ),
                (
                    HttpErrorResponse::InternalError(String::new()),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ),
                (
                    HttpErrorResponse::ExternalServiceFailure(String::new()),
                    StatusCode::BAD_GATEWAY,
                ),
                (
                    HttpErrorResponse::ServiceNotConfigured(String::new()),
                    StatusCode::SERVICE_UNAVAILABLE,
                ),
            ];

            for (err, status) in cases {
                assert_eq!(err.status_code(), status, "{err}");
            }
        }

        #[actix_web::test]
        async fn test_invalid_form_body_carries_field_errors() {
            let err = HttpErrorResponse::InvalidForm(FormErrors::single("amount", "Bad amount"));
            let resp = err.error_response();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body = to_bytes(resp.into_body()).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

            assert_eq!(json["err_type"], "InvalidForm");
            assert_eq!(json["field_errors"]["amount"][0], "Bad amount");
        }

        #[actix_web::test]
        async fn test_other_errors_omit_field_errors() {
            let err = HttpErrorResponse::DoesNotExist(
                String::from("Transaction not found"),
                DoesNotExistType::Transaction,
            );
            let body = to_bytes(err.error_response().into_body()).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

            assert_eq!(json["err_type"], "TransactionDoesNotExist");
            assert!(json.get("field_errors").is_none());
        }

        #[test]
        fn test_token_errors_map_to_unauthorized() {
            for err in [
                TokenError::TokenInvalid,
                TokenError::TokenExpired,
                TokenError::TokenMissing,
                TokenError::WrongTokenType,
            ] {
                let resp: HttpErrorResponse = err.into();
                assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
            }
        }
    }
}
