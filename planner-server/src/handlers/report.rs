use planner_common::db::{self, DbThreadPool};
use planner_common::period::{MonthPeriod, MAX_YEAR, MIN_YEAR};
use planner_common::request_io::InputReportYear;
use planner_common::validators::FormErrors;

use actix_web::{web, HttpResponse};

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn get(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    query: web::Query<InputReportYear>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let current_year = MonthPeriod::current().year();
    let year = query.year.unwrap_or(current_year);

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(HttpErrorResponse::InvalidForm(FormErrors::single(
            "year",
            format!("Ensure this value is between {MIN_YEAR} and {MAX_YEAR}."),
        )));
    }

    let user_id = user_access_token.claims.user_id;

    let report = match web::block(move || {
        let report_dao = db::report::Dao::new(&db_thread_pool);
        report_dao.yearly_report(user_id, year, current_year)
    })
    .await?
    {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to build report",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(report))
}
