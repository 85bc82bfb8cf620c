#![forbid(unsafe_code)]

//! Process configuration from the environment. Unparseable values are startup errors.

use am_storage::{DEFAULT_MAX_IDLE, DEFAULT_MAX_LIFETIME, DEFAULT_MAX_OPEN, PoolConfig};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error as ThisError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_NAME: &str = "activity_monitor";
const SSL_MODES: [&str; 6] = ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

fn invalid(name: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    }
}

/// CORS allow-list; `*` admits every origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| origin.trim_end_matches('/').to_string())
            .collect();
        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            return Self::Any;
        }
        Self::List(origins)
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|allowed| allowed == origin),
        }
    }
}

/// Database settings. Host, port, user and password are accepted for deployment parity; the
/// embedded store only uses the name and data directory.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: String,
    pub sslmode: String,
    pub data_dir: PathBuf,
}

impl DbConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.name))
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("sslmode", &self.sslmode)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub db: DbConfig,
    pub max_open_conns: usize,
    pub max_idle_conns: usize,
    pub conn_max_lifetime: Duration,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
    pub reports_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let sslmode = var("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());
        if !SSL_MODES.contains(&sslmode.as_str()) {
            return Err(invalid("DB_SSLMODE", "a PostgreSQL sslmode", &sslmode));
        }

        let db = DbConfig {
            host: var("DB_HOST"),
            port: parse_opt(var("DB_PORT"), "DB_PORT", "a port number")?,
            user: var("DB_USER"),
            password: lookup("DB_PASSWORD").filter(|value| !value.is_empty()),
            name: var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            sslmode,
            data_dir: var("DB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
        };
        if db.name.contains(['/', '\\']) || db.name.contains("..") {
            return Err(invalid("DB_NAME", "a plain database name", &db.name));
        }

        let max_open_conns =
            parse_opt(var("DB_MAX_OPEN_CONNS"), "DB_MAX_OPEN_CONNS", "a positive integer")?
                .unwrap_or(DEFAULT_MAX_OPEN);
        if max_open_conns == 0 {
            return Err(invalid("DB_MAX_OPEN_CONNS", "a positive integer", "0"));
        }
        let max_idle_conns = parse_opt(var("DB_MAX_IDLE_CONNS"), "DB_MAX_IDLE_CONNS", "an integer")?
            .unwrap_or(DEFAULT_MAX_IDLE)
            .min(max_open_conns);
        let conn_max_lifetime = parse_opt(
            var("DB_CONN_MAX_LIFETIME_SECS"),
            "DB_CONN_MAX_LIFETIME_SECS",
            "a number of seconds",
        )?
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_MAX_LIFETIME);

        Ok(Self {
            db,
            max_open_conns,
            max_idle_conns,
            conn_max_lifetime,
            port: parse_opt(var("PORT"), "PORT", "a port number")?.unwrap_or(DEFAULT_PORT),
            allowed_origins: AllowedOrigins::parse(&var("ALLOWED_ORIGINS").unwrap_or_default()),
            reports_dir: var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./reports")),
        })
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            db_path: self.db.db_path(),
            max_open: self.max_open_conns,
            max_idle: self.max_idle_conns,
            max_lifetime: self.conn_max_lifetime,
        }
    }
}

fn parse_opt<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| raw.parse::<T>().map_err(|_| invalid(name, expected, &raw)))
        .transpose()
}

/// `1/true/yes` and `0/false/no`, case-insensitive; anything else is `default`.
pub fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
