use planner_common::db::{self, DbThreadPool};
use planner_common::period;

use actix_web::{web, HttpResponse};

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn get(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_id = user_access_token.claims.user_id;
    let today = period::today();

    let dashboard = match web::block(move || {
        let report_dao = db::report::Dao::new(&db_thread_pool);
        report_dao.dashboard(user_id, today)
    })
    .await?
    {
        Ok(d) => d,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to build dashboard",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(dashboard))
}
