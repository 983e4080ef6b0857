use actix_web::web::*;

use crate::handlers::budget_goal;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/budget-goals")
            .route("", get().to(budget_goal::list))
            .route("/add", post().to(budget_goal::create))
            .route("/{goal_id}/edit", post().to(budget_goal::edit))
            .route("/{goal_id}/delete", post().to(budget_goal::delete)),
    );
}
