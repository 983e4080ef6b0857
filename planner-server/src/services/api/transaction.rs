use actix_web::web::*;

use crate::handlers::transaction;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/transactions")
            .route("", get().to(transaction::list))
            .route("/add", post().to(transaction::create))
            .route("/{transaction_id}/edit", post().to(transaction::edit))
            .route("/{transaction_id}/delete", post().to(transaction::delete)),
    );
}
