use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use lettre::message::Mailbox;
use once_cell::sync::Lazy;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, Zeroizing};

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

const HASHING_KEY_VAR: &str = "PLANNER_HASHING_KEY_B64";
const TOKEN_SIGNING_KEY_VAR: &str = "PLANNER_TOKEN_SIGNING_KEY_B64";

const HASH_LENGTH_VAR: &str = "PLANNER_HASH_LENGTH";
const HASH_ITERATIONS_VAR: &str = "PLANNER_HASH_ITERATIONS";
const HASH_MEM_COST_KIB_VAR: &str = "PLANNER_HASH_MEM_COST_KIB";
const HASH_THREADS_VAR: &str = "PLANNER_HASH_THREADS";
const HASH_SALT_LENGTH_VAR: &str = "PLANNER_HASH_SALT_LENGTH";

const EMAIL_ENABLED_VAR: &str = "PLANNER_EMAIL_ENABLED";
const EMAIL_FROM_ADDR_VAR: &str = "PLANNER_EMAIL_FROM_ADDR";
const EMAIL_REPLY_TO_ADDR_VAR: &str = "PLANNER_EMAIL_REPLY_TO_ADDR";
const CONTACT_RECIPIENT_ADDR_VAR: &str = "PLANNER_CONTACT_RECIPIENT_ADDR";
const SMTP_ADDRESS_VAR: &str = "PLANNER_SMTP_ADDRESS";
const SMTP_USERNAME_VAR: &str = "PLANNER_SMTP_USERNAME";
const SMTP_PASSWORD_VAR: &str = "PLANNER_SMTP_PASSWORD";
const MAX_SMTP_CONNECTIONS_VAR: &str = "PLANNER_MAX_SMTP_CONNECTIONS";
const SMTP_IDLE_TIMEOUT_SECS_VAR: &str = "PLANNER_SMTP_IDLE_TIMEOUT_SECS";

const ACCESS_TOKEN_LIFETIME_MINS_VAR: &str = "PLANNER_ACCESS_TOKEN_LIFETIME_MINS";
const REFRESH_TOKEN_LIFETIME_DAYS_VAR: &str = "PLANNER_REFRESH_TOKEN_LIFETIME_DAYS";

const ACTIX_WORKER_COUNT_VAR: &str = "PLANNER_ACTIX_WORKER_COUNT";

const LOG_LEVEL_VAR: &str = "PLANNER_LOG_LEVEL";

const HASHING_KEY_SIZE: usize = 32;
const TOKEN_SIGNING_KEY_SIZE: usize = 64;

/// Value shipped in sample configs. Treated the same as a missing password.
pub const PLACEHOLDER_SMTP_PASSWORD: &str = "your-app-password-here";

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

    pub hashing_key: [u8; HASHING_KEY_SIZE],
    pub token_signing_key: [u8; TOKEN_SIGNING_KEY_SIZE],

    pub hash_length: u32,
    pub hash_iterations: u32,
    pub hash_mem_cost_kib: u32,
    pub hash_threads: u32,
    pub hash_salt_length: u32,

    pub email_enabled: bool,
    #[zeroize(skip)]
    pub email_from_address: Mailbox,
    #[zeroize(skip)]
    pub email_reply_to_address: Mailbox,
    #[zeroize(skip)]
    pub contact_recipient_address: Mailbox,
    pub smtp_address: String,
    pub smtp_username: String,
    pub smtp_password: String,
    #[zeroize(skip)]
    pub max_smtp_connections: u32,
    #[zeroize(skip)]
    pub smtp_idle_timeout: Duration,

    #[zeroize(skip)]
    pub access_token_lifetime: Duration,
    #[zeroize(skip)]
    pub refresh_token_lifetime: Duration,

    #[zeroize(skip)]
    pub actix_worker_count: usize,

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

    /// Whether a contact message can actually reach the relay. A disabled mailer counts
    /// as configured since messages go to the mock sender.
    pub fn is_email_configured(&self) -> bool {
        !self.email_enabled || is_usable_smtp_password(&self.smtp_password)
    }
}

pub fn is_usable_smtp_password(password: &str) -> bool {
    let password = password.trim();
    !password.is_empty() && password != PLACEHOLDER_SMTP_PASSWORD
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
        let hashing_key = decode_key::<HASHING_KEY_SIZE>(HASHING_KEY_VAR)?;
        let token_signing_key = decode_key::<TOKEN_SIGNING_KEY_SIZE>(TOKEN_SIGNING_KEY_VAR)?;

        let email_enabled: bool = env_var_or(EMAIL_ENABLED_VAR, false);

        let inner = ConfigInner {
            db_username: env_var(DB_USERNAME_VAR)?,
            db_password: env_var(DB_PASSWORD_VAR)?,
            db_hostname: env_var(DB_HOSTNAME_VAR)?,
            db_port: env_var(DB_PORT_VAR)?,
            db_name: env_var(DB_NAME_VAR)?,
            db_max_connections: env_var_or(DB_MAX_CONNECTIONS_VAR, 48),
            db_idle_timeout: Duration::from_secs(env_var_or(DB_IDLE_TIMEOUT_SECS_VAR, 30)),

            hashing_key,
            token_signing_key,

            hash_length: env_var_or(HASH_LENGTH_VAR, 32),
            hash_iterations: env_var_or(HASH_ITERATIONS_VAR, 2),
            hash_mem_cost_kib: env_var_or(HASH_MEM_COST_KIB_VAR, 65536),
            hash_threads: env_var_or(HASH_THREADS_VAR, 1),
            hash_salt_length: env_var_or(HASH_SALT_LENGTH_VAR, 16),

            email_enabled,
            email_from_address: mailbox_var(EMAIL_FROM_ADDR_VAR, "noreply@localhost.localdomain")?,
            email_reply_to_address: mailbox_var(
                EMAIL_REPLY_TO_ADDR_VAR,
                "support@localhost.localdomain",
            )?,
            contact_recipient_address: mailbox_var(
                CONTACT_RECIPIENT_ADDR_VAR,
                "contact@localhost.localdomain",
            )?,
            smtp_address: if email_enabled {
                env_var(SMTP_ADDRESS_VAR)?
            } else {
                env_var_or(SMTP_ADDRESS_VAR, String::new())
            },
            smtp_username: env_var_or(SMTP_USERNAME_VAR, String::new()),
            smtp_password: env_var_or(SMTP_PASSWORD_VAR, String::new()),
            max_smtp_connections: env_var_or(MAX_SMTP_CONNECTIONS_VAR, 8),
            smtp_idle_timeout: Duration::from_secs(env_var_or(SMTP_IDLE_TIMEOUT_SECS_VAR, 60)),

            access_token_lifetime: Duration::from_secs(
                env_var_or(ACCESS_TOKEN_LIFETIME_MINS_VAR, 15) * 60,
            ),
            refresh_token_lifetime: Duration::from_secs(
                env_var_or(REFRESH_TOKEN_LIFETIME_DAYS_VAR, 14) * 86400,
            ),

            actix_worker_count: env_var_or(ACTIX_WORKER_COUNT_VAR, num_cpus::get()),

            log_level: env_var_or(LOG_LEVEL_VAR, String::from("info")),
        };

        Ok(Config {
            inner: UnsafeCell::new(inner),
        })
    }

    /// Fixed keys and cheap hashing parameters. Database settings still honor the
    /// environment so tests can be pointed at any PostgreSQL server.
    fn for_tests() -> Config {
        let inner = ConfigInner {
            db_username: env_var_or(DB_USERNAME_VAR, String::from("postgres")),
            db_password: env_var_or(DB_PASSWORD_VAR, String::from("postgres")),
            db_hostname: env_var_or(DB_HOSTNAME_VAR, String::from("localhost")),
            db_port: env_var_or(DB_PORT_VAR, 5432),
            db_name: env_var_or(DB_NAME_VAR, String::from("budget_planner_test")),
            db_max_connections: env_var_or(DB_MAX_CONNECTIONS_VAR, 16),
            db_idle_timeout: Duration::from_secs(30),

            hashing_key: [7; HASHING_KEY_SIZE],
            token_signing_key: [42; TOKEN_SIGNING_KEY_SIZE],

            hash_length: 16,
            hash_iterations: 1,
            hash_mem_cost_kib: 128,
            hash_threads: 1,
            hash_salt_length: 16,

            email_enabled: false,
            email_from_address: test_mailbox("noreply"),
            email_reply_to_address: test_mailbox("support"),
            contact_recipient_address: test_mailbox("contact"),
            smtp_address: String::new(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            max_smtp_connections: 1,
            smtp_idle_timeout: Duration::from_secs(60),

            access_token_lifetime: Duration::from_secs(15 * 60),
            refresh_token_lifetime: Duration::from_secs(14 * 86400),

            actix_worker_count: 1,

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

fn test_mailbox(user: &str) -> Mailbox {
    format!("{user}@planner.test")
        .parse()
        .expect("Test mailbox should be valid")
}

fn decode_key<const N: usize>(key: &'static str) -> Result<[u8; N], ConfigError> {
    let decoded = Zeroizing::new(
        b64.decode(env_var::<String>(key)?.as_bytes())
            .map_err(|_| ConfigError::invalid(key))?,
    );

    if decoded.len() < N {
        return Err(ConfigError::invalid(key));
    }

    decoded[..N].try_into().map_err(|_| ConfigError::invalid(key))
}

fn mailbox_var(key: &'static str, default: &str) -> Result<Mailbox, ConfigError> {
    env_var_or(key, String::from(default))
        .parse()
        .map_err(|_| ConfigError::invalid(key))
}

fn env_var<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let var = std::env::var(key).map_err(|_| ConfigError::missing(key))?;
    let var: T = var.parse().map_err(|_| ConfigError::invalid(key))?;
    Ok(var)
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

impl ConfigError {
    fn missing(var_name: &'static str) -> Self {
        Self::MissingVar(var_name)
    }

    fn invalid(var_name: &'static str) -> Self {
        Self::InvalidVar(var_name)
    }
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


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_password_placeholder() {
        assert!(is_usable_smtp_password("hunter2hunter2"));
        assert!(!is_usable_smtp_password(""));
        assert!(!is_usable_smtp_password("   "));
        assert!(!is_usable_smtp_password(PLACEHOLDER_SMTP_PASSWORD));
    }

    #[test]
    fn test_test_config_has_mock_email() {
        assert!(!CONF.email_enabled);
        assert!(CONF.is_email_configured());
        assert_eq!(CONF.token_signing_key.len(), TOKEN_SIGNING_KEY_SIZE);
    }
}
