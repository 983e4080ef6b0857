use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::DatabaseErrorKind;
use std::fmt;
use std::time::Duration;

pub mod budget_goal;
pub mod category;
pub mod job_registry;
pub mod report;
pub mod transaction;
pub mod user;

pub type DbThreadPool = diesel::r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn create_db_thread_pool(
    database_uri: &str,
    max_db_connections: u32,
    idle_timeout: Duration,
) -> Result<DbThreadPool, r2d2::Error> {
    let manager = ConnectionManager::<PgConnection>::new(database_uri);
    diesel::r2d2::Pool::builder()
        .max_size(max_db_connections)
        .idle_timeout(Some(idle_timeout))
        .build(manager)
}

#[derive(Debug)]
pub enum DaoError {
    DbThreadPoolFailure(r2d2::Error),
    QueryFailure(diesel::result::Error),
    AlreadyExists,
    InvalidReference,
    StillReferenced,
}

impl DaoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DaoError::QueryFailure(diesel::result::Error::NotFound))
    }
}

impl std::error::Error for DaoError {}

impl fmt::Display for DaoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoError::DbThreadPoolFailure(e) => {
                write!(f, "DaoError: Failed to obtain DB connection: {e}")
            }
            DaoError::QueryFailure(e) => {
                write!(f, "DaoError: Query failed: {e}")
            }
            DaoError::AlreadyExists => {
                write!(f, "DaoError: A conflicting row already exists")
            }
            DaoError::InvalidReference => {
                write!(f, "DaoError: Referenced row is missing or not owned by user")
            }
            DaoError::StillReferenced => {
                write!(f, "DaoError: Change would break rows that reference this one")
            }
        }
    }
}

impl From<r2d2::Error> for DaoError {
    fn from(error: r2d2::Error) -> Self {
        DaoError::DbThreadPoolFailure(error)
    }
}

impl From<diesel::result::Error> for DaoError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                DaoError::AlreadyExists
            }
            e => DaoError::QueryFailure(e),
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use once_cell::sync::Lazy;
    use std::time::Duration;
    use uuid::Uuid;

    use super::user;
    use crate::db::{create_db_thread_pool, DbThreadPool};

    const DB_USERNAME_VAR: &str = "PLANNER_DB_USERNAME";
    const DB_PASSWORD_VAR: &str = "PLANNER_DB_PASSWORD";
    const DB_HOSTNAME_VAR: &str = "PLANNER_DB_HOSTNAME";
    const DB_PORT_VAR: &str = "PLANNER_DB_PORT";
    const DB_NAME_VAR: &str = "PLANNER_DB_NAME";
    const DB_MAX_CONNECTIONS_VAR: &str = "PLANNER_DB_MAX_CONNECTIONS";

    pub static DB_THREAD_POOL: Lazy<DbThreadPool> = Lazy::new(|| {
        let username = env_or(DB_USERNAME_VAR, String::from("postgres"));
        let password = env_or(DB_PASSWORD_VAR, String::from("postgres"));
        let hostname = env_or(DB_HOSTNAME_VAR, String::from("localhost"));
        let port = env_or(DB_PORT_VAR, 5432u16);
        let db_name = env_or(DB_NAME_VAR, String::from("budget_planner_test"));

        let max_connections = env_or(DB_MAX_CONNECTIONS_VAR, 16u32);

        let db_uri = format!("postgres://{username}:{password}@{hostname}:{port}/{db_name}");

        create_db_thread_pool(&db_uri, max_connections, Duration::from_secs(30))
            .expect("Failed to create DB thread pool for tests")
    });

    pub fn db_pool() -> &'static DbThreadPool {
        &DB_THREAD_POOL
    }

    pub fn unique_username() -> String {
        format!("db-test-{}", Uuid::now_v7().simple())
    }

    /// Inserts a user with the default categories and returns its id.
    pub fn create_user() -> Uuid {
        let username = unique_username();
        let email = format!("{username}@planner.test");

        user::Dao::new(db_pool())
            .create_user(&username, &email, "not-a-real-hash")
            .expect("Failed to create test user")
            .id
    }

    pub fn delete_user(user_id: Uuid) {
        let _ = user::Dao::new(db_pool()).delete_user(user_id);
    }

    fn env_or<T>(key: &str, default: T) -> T
    where
        T: std::str::FromStr,
    {
        std::env::var(key)
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(default)
    }
}
