use actix_web::web::*;

use crate::handlers::dashboard;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.route("", get().to(dashboard::get))
        .route("/", get().to(dashboard::get));
}
