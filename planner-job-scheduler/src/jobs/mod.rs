mod backfill_default_categories;

pub use backfill_default_categories::BackfillDefaultCategoriesJob;

use planner_common::db::DaoError;

use async_trait::async_trait;
use std::fmt;
use tokio::task::JoinError;

#[derive(Debug)]
pub enum JobError {
    DaoFailure(DaoError),
    ConcurrencyError(JoinError),
}

impl std::error::Error for JobError {}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::DaoFailure(e) => write!(f, "JobError: {e}"),
            JobError::ConcurrencyError(e) => {
                write!(f, "JobError: ConcurrencyError: {e}")
            }
        }
    }
}

impl From<DaoError> for JobError {
    fn from(e: DaoError) -> Self {
        JobError::DaoFailure(e)
    }
}

impl From<JoinError> for JobError {
    fn from(e: JoinError) -> Self {
        JobError::ConcurrencyError(e)
    }
}

#[async_trait]
pub trait Job: Send {
    fn name(&self) -> &'static str;
    fn is_ready(&self) -> bool;
    async fn execute(&mut self) -> Result<(), JobError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    pub struct MockJob {
        pub name: &'static str,
        pub runs: Arc<Mutex<usize>>,
        pub fail: bool,
        pub ready: bool,
    }

    impl MockJob {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                runs: Arc::new(Mutex::new(0)),
                fail: false,
                ready: true,
            }
        }

        pub fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(name)
            }
        }
    }

    #[async_trait]
    impl Job for MockJob {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn execute(&mut self) -> Result<(), JobError> {
            *self.runs.lock().unwrap() += 1;

            if self.fail {
                return Err(JobError::DaoFailure(DaoError::InvalidReference));
            }

            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mock_job_counts_runs() {
        let mut job = MockJob::new("Mock");
        let runs = Arc::clone(&job.runs);

        job.execute().await.unwrap();
        job.execute().await.unwrap();
        assert_eq!(*runs.lock().unwrap(), 2);

        let mut failing = MockJob::failing("Failing Mock");
        let err = failing.execute().await.unwrap_err();
        assert!(err.to_string().starts_with("JobError: DaoError"));
    }
}
