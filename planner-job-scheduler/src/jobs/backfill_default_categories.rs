use planner_common::db::user::Dao as UserDao;
use planner_common::db::DbThreadPool;

use async_trait::async_trait;

use crate::jobs::{Job, JobError};

/// Gives accounts that have no categories the default set.
pub struct BackfillDefaultCategoriesJob {
    db_thread_pool: DbThreadPool,
    is_running: bool,
}

impl BackfillDefaultCategoriesJob {
    pub fn new(db_thread_pool: DbThreadPool) -> Self {
        Self {
            db_thread_pool,
            is_running: false,
        }
    }
}

#[async_trait]
impl Job for BackfillDefaultCategoriesJob {
    fn name(&self) -> &'static str {
        "Backfill Default Categories"
    }

    fn is_ready(&self) -> bool {
        !self.is_running
    }

    async fn execute(&mut self) -> Result<(), JobError> {
        self.is_running = true;

        let dao = UserDao::new(&self.db_thread_pool);
        let result = tokio::task::spawn_blocking(move || dao.backfill_default_categories()).await;

        self.is_running = false;

        let summary = result??;

        if summary.users_seeded == 0 {
            log::info!("All users already have categories");
        } else {
            log::info!(
                "Created {} default categories across {} users",
                summary.categories_created,
                summary.users_seeded,
            );
        }

        Ok(())
    }
}
