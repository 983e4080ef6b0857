use once_cell::sync::Lazy;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use zeroize::Zeroize;

pub static CONF: Lazy<Config> = Lazy::new(|| {
    if cfg!(test) {
        Config::for_tests()
    } else {
        Config::from_env().expect("Failed to load config")
    }
});

const DB_USERNAME_VAR: &str = "PLANNER_DB_USERNAME";
const DB_PASSWORD_VAR: &str = "PLANNER_DB_PASSWORD";
const DB_HOSTNAME_VAR: &str = "PLANNER_DB_HOSTNAME";
const DB_PORT_VAR: &str = "PLANNER_DB_PORT";
const DB_NAME_VAR: &str = "PLANNER_DB_NAME";
const DB_MAX_CONNECTIONS_VAR: &str = "PLANNER_DB_MAX_CONNECTIONS";
const DB_IDLE_TIMEOUT_SECS_VAR: &str = "PLANNER_DB_IDLE_TIMEOUT_SECS";

const UPDATE_FREQUENCY_SECS_VAR: &str = "PLANNER_JOBS_UPDATE_FREQUENCY_SECS";
const WORKER_THREADS_VAR: &str = "PLANNER_JOBS_WORKER_THREADS";
const MAX_BLOCKING_THREADS_VAR: &str = "PLANNER_JOBS_MAX_BLOCKING_THREADS";

const BACKFILL_DEFAULT_CATEGORIES_JOB_FREQUENCY_SECS_VAR: &str =
    "PLANNER_BACKFILL_DEFAULT_CATEGORIES_JOB_FREQUENCY_SECS";

const LOG_LEVEL_VAR: &str = "PLANNER_LOG_LEVEL";

#[derive(Zeroize)]
pub struct ConfigInner {
    pub db_username: String,
    pub db_password: String,
    pub db_hostname: String,
    pub db_port: u16,
    pub db_name: String,
    #[zeroize(skip)]
    pub db_max_connections: u32,
    #[zeroize(skip)]
    pub db_idle_timeout: Duration,

    #[zeroize(skip)]
    pub update_frequency: Duration,
    #[zeroize(skip)]
    pub worker_threads: usize,
    #[zeroize(skip)]
    pub max_blocking_threads: usize,

    #[zeroize(skip)]
    pub backfill_default_categories_job_frequency: Duration,

    #[zeroize(skip)]
    pub log_level: String,
}

impl ConfigInner {
    pub fn database_uri(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_username, self.db_password, self.db_hostname, self.db_port, self.db_name,
        )
    }
}

pub struct Config {
    inner: UnsafeCell<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        // Safe as long as `unsafe Config::zeroize()` hasn't been called
        unsafe { &*self.inner.get() }
    }
}

// Safe to be shared across threads as long as `unsafe Config::zeroize()` hasn't been called
unsafe impl Sync for Config {}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let cpu_count = num_cpus::get();

        let inner = ConfigInner {
            db_username: env_var(DB_USERNAME_VAR)?,
            db_password: env_var(DB_PASSWORD_VAR)?,
            db_hostname: env_var(DB_HOSTNAME_VAR)?,
            db_port: env_var(DB_PORT_VAR)?,
            db_name: env_var(DB_NAME_VAR)?,
            db_max_connections: env_var_or(DB_MAX_CONNECTIONS_VAR, 8),
            db_idle_timeout: Duration::from_secs(env_var_or(DB_IDLE_TIMEOUT_SECS_VAR, 30)),

            update_frequency: Duration::from_secs(env_var_or(UPDATE_FREQUENCY_SECS_VAR, 60)),
            worker_threads: env_var_or(WORKER_THREADS_VAR, cpu_count),
            max_blocking_threads: env_var_or(MAX_BLOCKING_THREADS_VAR, cpu_count * 4),

            backfill_default_categories_job_frequency: Duration::from_secs(env_var_or(
                BACKFILL_DEFAULT_CATEGORIES_JOB_FREQUENCY_SECS_VAR,
                86400,
            )),

            log_level: env_var_or(LOG_LEVEL_VAR, String::from("info")),
        };

        Ok(Config {
            inner: UnsafeCell::new(inner),
        })
    }

    fn for_tests() -> Config {
        let inner = ConfigInner {
            db_username: env_var_or(DB_USERNAME_VAR, String::from("postgres")),
            db_password: env_var_or(DB_PASSWORD_VAR, String::from("postgres")),
            db_hostname: env_var_or(DB_HOSTNAME_VAR, String::from("localhost")),
            db_port: env_var_or(DB_PORT_VAR, 5432),
            db_name: env_var_or(DB_NAME_VAR, String::from("budget_planner_test")),
            db_max_connections: env_var_or(DB_MAX_CONNECTIONS_VAR, 8),
            db_idle_timeout: Duration::from_secs(30),

            update_frequency: Duration::from_millis(10),
            worker_threads: 1,
            max_blocking_threads: 4,

            backfill_default_categories_job_frequency: Duration::from_secs(86400),

            log_level: String::from("info"),
        };

        Config {
            inner: UnsafeCell::new(inner),
        }
    }

    /// # Safety
    ///
    /// Safe only if the Config isn't being used by other threads or across an async
    /// boundary. Generally, this should only be used at the end of the main function once
    /// all threads have been joined.
    pub unsafe fn zeroize(&self) {
        unsafe {
            (*self.inner.get()).zeroize();
        }
    }
}

fn env_var<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let var = std::env::var(key).map_err(|_| ConfigError::MissingVar(key))?;
    var.parse().map_err(|_| ConfigError::InvalidVar(key))
}

fn env_var_or<T: FromStr>(key: &'static str, default: T) -> T {
    let Ok(var) = std::env::var(key) else {
        return default;
    };

    var.parse().unwrap_or(default)
}

#[derive(Clone, Copy, Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar(&'static str),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "Missing environment variable '{}'", key),
            Self::InvalidVar(key) => write!(f, "Environment variable '{}' is invalid", key),
        }
    }
}
