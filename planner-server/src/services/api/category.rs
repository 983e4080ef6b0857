use actix_web::web::*;

use crate::handlers::category;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/categories")
            .route("", get().to(category::list))
            .route("/choices", get().to(category::choices))
            .route("/add", post().to(category::create))
            .route("/{category_id}/edit", post().to(category::edit))
            .route("/{category_id}/delete", post().to(category::delete)),
    );
}
