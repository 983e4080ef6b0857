use planner_common::db::job_registry::Dao as JobRegistryDao;
use planner_common::db::DbThreadPool;

use futures::future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::time;

use crate::jobs::Job;

struct JobContainer {
    job: Box<dyn Job>,
    run_frequency: Duration,
    last_run_time: SystemTime,
}

impl JobContainer {
    fn is_due(&self, now: SystemTime) -> bool {
        let time_elapsed_since_last_run = now
            .duration_since(self.last_run_time)
            .unwrap_or(Duration::from_nanos(0));

        time_elapsed_since_last_run >= self.run_frequency
    }
}

pub struct JobRunner {
    jobs: Vec<JobContainer>,
    update_frequency: Duration,
    db_thread_pool: DbThreadPool,
}

impl JobRunner {
    pub fn new(update_frequency: Duration, db_thread_pool: DbThreadPool) -> Self {
        Self {
            jobs: Vec::new(),
            update_frequency,
            db_thread_pool,
        }
    }

    /// A job with no recorded run is due immediately.
    pub async fn register(&mut self, job: Box<dyn Job>, run_frequency: Duration) {
        let job_name = job.name();

        log::info!(
            "Registered job \"{}\" to run every {} seconds",
            job_name,
            run_frequency.as_secs()
        );

        let dao = JobRegistryDao::new(&self.db_thread_pool);
        let last_run_time = tokio::task::spawn_blocking(move || {
            dao.get_last_run(job_name).unwrap_or_else(|e| {
                log::error!("Failed to get last run timestamp for job \"{job_name}\": {e}");
                None
            })
        })
        .await
        .unwrap_or_else(|e| {
            log::error!("Failed to join Tokio task: {e}");
            None
        });

        self.jobs.push(JobContainer {
            job,
            run_frequency,
            last_run_time: last_run_time.unwrap_or(UNIX_EPOCH),
        });
    }

    /// Runs every ready job whose frequency has elapsed. Returns how many jobs ran.
    pub async fn run_pending(&mut self) -> usize {
        self.run_jobs(false).await
    }

    /// Runs every ready job regardless of when it last ran. Returns how many jobs ran.
    pub async fn run_once(&mut self) -> usize {
        self.run_jobs(true).await
    }

    pub async fn start(&mut self) -> ! {
        loop {
            let before = Instant::now();

            self.run_pending().await;

            let delta = before.elapsed();
            if delta < self.update_frequency {
                time::sleep(self.update_frequency - delta).await;
            }
        }
    }

    async fn run_jobs(&mut self, force: bool) -> usize {
        let now = SystemTime::now();

        let mut job_names = Vec::with_capacity(self.jobs.len());
        let mut job_futures = Vec::with_capacity(self.jobs.len());
        let mut record_job_run_futures = Vec::with_capacity(self.jobs.len());

        for job_container in self.jobs.iter_mut() {
            if !(force || job_container.is_due(now)) || !job_container.job.is_ready() {
                continue;
            }

            job_container.last_run_time = now;

            let job_name = job_container.job.name();
            log::info!("Executing job \"{job_name}\"");

            job_names.push(job_name);
            job_futures.push(job_container.job.execute());

            let dao = JobRegistryDao::new(&self.db_thread_pool);
            record_job_run_futures.push(tokio::task::spawn_blocking(move || {
                dao.record_run(job_name, now)
            }));
        }

        let (job_results, recording_results) = future::join(
            future::join_all(job_futures),
            future::join_all(record_job_run_futures),
        )
        .await;

        for (job_name, result) in job_names.iter().zip(job_results) {
            match result {
                Ok(()) => log::info!("Job \"{job_name}\" finished successfully"),
                Err(e) => log::error!("Job \"{job_name}\" failed: {e}"),
            }
        }

        for (job_name, result) in job_names.iter().zip(recording_results) {
            match result {
                Ok(Ok(true)) => (),
                Ok(Ok(false)) => {
                    log::warn!("A later run of job \"{job_name}\" was already recorded")
                }
                Ok(Err(e)) => log::error!("Error recording run of job \"{job_name}\": {e}"),
                Err(e) => log::error!("Failed to join Tokio task: {e}"),
            }
        }

        job_names.len()
    }
}
