use actix_web::web::*;

use crate::handlers::contact;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.route("/contact", post().to(contact::send_message));
}
