use actix_web::web::*;

use crate::handlers::auth;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.route("/register", post().to(auth::register))
        .route("/login", post().to(auth::sign_in))
        .route("/token/refresh", post().to(auth::refresh_tokens));
}
