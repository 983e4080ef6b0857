use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::web::*;
use actix_web::HttpRequest;

use crate::handlers::error::HttpErrorResponse;

mod auth;
mod budget_goal;
mod category;
mod contact;
mod dashboard;
mod health;
mod report;
mod transaction;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/api")
            .app_data(JsonConfig::default().error_handler(json_error_handler))
            .app_data(QueryConfig::default().error_handler(query_error_handler))
            .configure(dashboard::configure)
            .configure(auth::configure)
            .configure(transaction::configure)
            .configure(category::configure)
            .configure(budget_goal::configure)
            .configure(report::configure)
            .configure(contact::configure)
            .configure(health::configure),
    );
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    HttpErrorResponse::IncorrectlyFormed(err.to_string()).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    HttpErrorResponse::IncorrectlyFormed(err.to_string()).into()
}
