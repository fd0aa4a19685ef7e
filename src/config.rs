use std::env;
use std::fmt;
use std::str::FromStr;

use sqlx::postgres::PgSslMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub store_backend: StoreBackend,
    pub database: DatabaseConfig,
    pub cors_allowed_origins: String,
    pub history_max_limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    /// Session time zone; defines the calendar day used by "today" queries.
    pub timezone: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("timezone", &self.timezone)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    /// `user@host:port/name`, safe to log.
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".into(),
            None => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.into());

        Ok(Self {
            host: string_or("HOST", "0.0.0.0"),
            port: parse_or(&get, "PORT", 8080)?,
            env: string_or("ENV", "development"),
            store_backend: parse_or(&get, "STORE_BACKEND", StoreBackend::Postgres)?,
            database: DatabaseConfig {
                url: get("DATABASE_URL"),
                host: string_or("DB_HOST", "localhost"),
                port: parse_or(&get, "DB_PORT", 5432)?,
                user: string_or("DB_USER", "postgres"),
                password: get("DB_PASSWORD").unwrap_or_default(),
                name: string_or("DB_NAME", "ogenkidesuka"),
                ssl_mode: parse_or(&get, "DB_SSL_MODE", PgSslMode::Disable)?,
                timezone: string_or("DB_TIMEZONE", "UTC"),
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 25)?,
                min_connections: parse_or(&get, "DB_MIN_CONNECTIONS", 0)?,
                idle_timeout_secs: parse_or(&get, "DB_IDLE_TIMEOUT_SECS", 300)?,
                acquire_timeout_secs: parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            },
            cors_allowed_origins: string_or("CORS_ALLOWED_ORIGINS", "*"),
            history_max_limit: parse_or(&get, "HISTORY_MAX_LIMIT", 1000)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
