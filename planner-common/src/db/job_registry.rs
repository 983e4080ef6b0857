use diesel::{dsl, Connection, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use std::time::SystemTime;

use crate::db::{DaoError, DbThreadPool};
use crate::models::job_registry_item::{JobRegistryItem, NewJobRegistryItem};
use crate::schema::job_registry as job_registry_fields;
use crate::schema::job_registry::dsl::job_registry;

/// Run history for the job scheduler, keyed by each job's display name.
pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    /// Most recently run jobs first.
    pub fn get_all_job_runs(&self) -> Result<Vec<JobRegistryItem>, DaoError> {
        Ok(job_registry
            .order((
                job_registry_fields::last_run_timestamp.desc(),
                job_registry_fields::job_name.asc(),
            ))
            .load::<JobRegistryItem>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_last_run(&self, job_name: &str) -> Result<Option<SystemTime>, DaoError> {
        Ok(job_registry
            .select(job_registry_fields::last_run_timestamp)
            .find(job_name)
            .get_result::<SystemTime>(&mut self.db_thread_pool.get()?)
            .optional()?)
    }

    /// Stores `ran_at` as the job's last run unless a later run is already on record.
    /// Returns whether the stored time changed.
    pub fn record_run(&self, job_name: &str, ran_at: SystemTime) -> Result<bool, DaoError> {
        let mut conn = self.db_thread_pool.get()?;

        conn.transaction::<_, DaoError, _>(|conn| {
            let recorded = job_registry
                .select(job_registry_fields::last_run_timestamp)
                .find(job_name)
                .for_update()
                .get_result::<SystemTime>(conn)
                .optional()?;

            match recorded {
                Some(last_run) if last_run >= ran_at => Ok(false),
                Some(_) => {
                    dsl::update(job_registry.find(job_name))
                        .set(job_registry_fields::last_run_timestamp.eq(ran_at))
                        .execute(conn)?;
                    Ok(true)
                }
                None => {
                    dsl::insert_into(job_registry)
                        .values(&NewJobRegistryItem {
                            job_name,
                            last_run_timestamp: ran_at,
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)?;
                    Ok(true)
                }
            }
        })
    }
}
