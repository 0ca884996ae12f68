//! Service configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ledger_store::PoolSettings;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection. `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,

    /// Connection pool size (default: 25).
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection (default: 5).
    pub db_acquire_timeout_seconds: u64,

    /// Apply schema migrations on startup (default: true).
    pub run_migrations: bool,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Maximum in-flight requests on the API routes.
    pub max_concurrent_requests: usize,
}

/// Where to find PostgreSQL.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// A full `postgres://` URL.
    Url(String),
    /// Individual connection parameters.
    Parts {
        /// Host name.
        host: String,
        /// Port.
        port: u16,
        /// User name.
        user: String,
        /// Password, if any.
        password: Option<String>,
        /// Database name.
        database: String,
        /// libpq-style SSL mode (`disable`, `prefer`, `require`, ...).
        ssl_mode: String,
    },
}

impl DatabaseConfig {
    /// Build `sqlx` connection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or SSL mode is malformed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            Self::Url(url) => PgConnectOptions::from_str(url),
            Self::Parts {
                host,
                port,
                user,
                password,
                database,
                ssl_mode,
            } => {
                let mut options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .database(database)
                    .ssl_mode(PgSslMode::from_str(ssl_mode)?);
                if let Some(password) = password {
                    options = options.password(password);
                }
                Ok(options)
            }
        }
    }
}

// Never print credentials.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(_) => f.write_str("Url(<redacted>)"),
            Self::Parts {
                host,
                port,
                user,
                database,
                ssl_mode,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"<redacted>")
                .field("database", database)
                .field("ssl_mode", ssl_mode)
                .finish(),
        }
    }
}

/// Database secrets file structure. Every field is optional; environment
/// variables take precedence.
#[derive(Debug, Default, Deserialize)]
struct DatabaseSecrets {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    sslmode: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_sources(|key| std::env::var(key).ok(), load_database_secrets())
    }

    fn from_sources(env: impl Fn(&str) -> Option<String>, secrets: DatabaseSecrets) -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: env("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database: resolve_database(&env, secrets),
            db_max_connections: parsed::<u32>(&env, "DB_MAX_CONNECTIONS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.db_max_connections),
            db_acquire_timeout_seconds: parsed(&env, "DB_ACQUIRE_TIMEOUT_SECONDS")
                .unwrap_or(defaults.db_acquire_timeout_seconds),
            run_migrations: env("RUN_MIGRATIONS")
                .map_or(defaults.run_migrations, |v| parse_bool(&v)),
            cors_origins: env("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_body_bytes: parsed(&env, "MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: parsed(&env, "REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            max_concurrent_requests: parsed::<usize>(&env, "MAX_CONCURRENT_REQUESTS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_requests),
        }
    }

    /// Connection pool settings derived from this configuration.
    #[must_use]
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_seconds),
        }
    }
}

/// `DATABASE_URL` wins, then a URL from the secrets file, then individual
/// parameters when a host is known.
fn resolve_database(
    env: &impl Fn(&str) -> Option<String>,
    secrets: DatabaseSecrets,
) -> Option<DatabaseConfig> {
    if let Some(url) = env("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
        return Some(DatabaseConfig::Url(url));
    }
    if let Some(url) = secrets.url {
        return Some(DatabaseConfig::Url(url));
    }

    let host = env("DB_HOST").or(secrets.host)?;
    Some(DatabaseConfig::Parts {
        host,
        port: env("DB_PORT")
            .and_then(|p| p.parse().ok())
            .or(secrets.port)
            .unwrap_or(5432),
        user: env("DB_USER")
            .or(secrets.user)
            .unwrap_or_else(|| "postgres".into()),
        password: env("DB_PASSWORD").or(secrets.password),
        database: env("DB_NAME")
            .or(secrets.database)
            .unwrap_or_else(|| "ledger".into()),
        ssl_mode: env("DB_SSLMODE")
            .or(secrets.sslmode)
            .unwrap_or_else(|| "disable".into()),
    })
}

fn parsed<T: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    env(key).and_then(|s| s.trim().parse().ok())
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Load database secrets from file, if present.
fn load_database_secrets() -> DatabaseSecrets {
    let secret_paths = [".secrets/database.json", "../.secrets/database.json"];

    for path in &secret_paths {
        match load_secrets_file::<DatabaseSecrets>(path) {
            Ok(secrets) => {
                tracing::info!(path = %path, "Loaded database secrets from file");
                return secrets;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path, error = %e, "Ignoring unreadable secrets file"),
        }
    }

    tracing::debug!("Database secrets file not found, using environment variables");
    DatabaseSecrets::default()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database: None,
            db_max_connections: 25,
            db_acquire_timeout_seconds: 5,
            run_migrations: true,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            max_concurrent_requests: 50,
        }
    }
}
