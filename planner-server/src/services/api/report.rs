use actix_web::web::*;

use crate::handlers::report;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.route("/reports", get().to(report::get));
}
