//! Process configuration loaded via OrthoConfig.
//!
//! One settings struct per concern, each read from prefixed environment
//! variables (or a matching config file). Each group declares at least one
//! field with an OrthoConfig default so the group loads even when none of its
//! variables are set; the remaining optional fields get their defaults from
//! accessor methods.

use std::ffi::OsString;
use std::time::Duration;

use color_eyre::eyre::{self, WrapErr};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::domain::DEFAULT_DIAGNOSTIC_QUEUE_CAPACITY;
use crate::outbound::persistence::PoolConfig;

/// Message served by `GET /mensagem` when none is configured.
pub const DEFAULT_MESSAGE: &str = "Mensagem padrão";

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_PG_HOST: &str = "localhost";
const DEFAULT_PG_USER: &str = "postgres";
const DEFAULT_PG_DB: &str = "postgres";

/// Errors raised while turning settings into runtime values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The Postgres settings do not form a valid connection URL.
    #[error("invalid database settings: {message}")]
    Database {
        /// Failure description; never contains the password.
        message: String,
    },
    /// The log sink URL could not be parsed.
    #[error("invalid log sink url: {message}")]
    LogSinkUrl {
        /// Parser failure description.
        message: String,
    },
}

/// Deployment environment selecting log format and startup messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Human-readable logs and local URLs announced at startup.
    Development,
    /// JSON logs.
    Production,
}

/// HTTP server settings (`APP_*`).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "APP")]
pub struct AppSettings {
    /// Listening port.
    #[ortho_config(default = 5200)]
    pub port: u16,
    /// Body of `GET /mensagem`.
    pub message: Option<String>,
    /// `development` or `production`.
    pub env: Option<String>,
    /// Interface to bind.
    pub bind_host: Option<String>,
}

impl AppSettings {
    /// Return the configured message, falling back to [`DEFAULT_MESSAGE`].
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_MESSAGE)
    }

    /// Anything other than `development` (case-insensitive) is production.
    #[must_use]
    pub fn environment(&self) -> Environment {
        match self.env.as_deref() {
            Some(env) if env.trim().eq_ignore_ascii_case("development") => {
                Environment::Development
            }
            _ => Environment::Production,
        }
    }

    /// Return the bind interface, falling back to all interfaces.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        self.bind_host.as_deref().unwrap_or(DEFAULT_BIND_HOST)
    }
}

/// PostgreSQL connection and pool settings (`POSTGRES_*`).
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "POSTGRES")]
pub struct PostgresSettings {
    /// Database host.
    pub host: Option<String>,
    /// Database port.
    #[ortho_config(default = 5432)]
    pub port: u16,
    /// Login role.
    pub user: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Database name.
    pub db: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: Option<u32>,
    /// Idle connections kept warm.
    pub pool_min_idle: Option<u32>,
    /// Seconds to wait for a connection before failing a request.
    pub pool_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("db", &self.db)
            .field("pool_max_size", &self.pool_max_size)
            .field("pool_min_idle", &self.pool_min_idle)
            .field("pool_timeout_secs", &self.pool_timeout_secs)
            .finish()
    }
}

impl PostgresSettings {
    /// Return the host, falling back to `localhost`.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_PG_HOST)
    }

    /// Return the role, falling back to `postgres`.
    #[must_use]
    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_PG_USER)
    }

    /// Return the database name, falling back to `postgres`.
    #[must_use]
    pub fn db(&self) -> &str {
        self.db.as_deref().unwrap_or(DEFAULT_PG_DB)
    }

    /// Build a `postgres://` URL with credentials percent-encoded.
    ///
    /// # Errors
    /// Returns [`SettingsError::Database`] when the host is not a valid URL
    /// host.
    pub fn database_url(&self) -> Result<String, SettingsError> {
        let invalid = |message: &str| SettingsError::Database {
            message: message.to_owned(),
        };
        let mut url = Url::parse(&format!("postgres://{}", self.host()))
            .map_err(|err| invalid(&format!("host {:?}: {err}", self.host())))?;
        url.set_port(Some(self.port))
            .map_err(|()| invalid("port cannot be set"))?;
        url.set_username(self.user())
            .map_err(|()| invalid("user cannot be set"))?;
        url.set_password(self.password.as_deref())
            .map_err(|()| invalid("password cannot be set"))?;
        url.set_path(self.db());
        Ok(url.into())
    }

    /// Build the pool configuration, applying defaults for unset limits.
    ///
    /// # Errors
    /// Propagates [`PostgresSettings::database_url`] failures.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let mut config = PoolConfig::new(self.database_url()?);
        if let Some(max) = self.pool_max_size {
            config = config.with_max_size(max);
        }
        if let Some(min) = self.pool_min_idle {
            config = config.with_min_idle(Some(min));
        }
        if let Some(secs) = self.pool_timeout_secs {
            config = config.with_connection_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Remote log shipping settings (`LOGTAIL_*`).
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOGTAIL")]
pub struct LogSinkSettings {
    /// Bearer token for the ingest endpoint.
    pub token: Option<String>,
    /// Ingest endpoint URL.
    pub url: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 5)]
    pub timeout_secs: u64,
    /// Events buffered before new ones are dropped.
    pub queue_capacity: Option<usize>,
}

impl std::fmt::Debug for LogSinkSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSinkSettings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("url", &self.url)
            .field("timeout_secs", &self.timeout_secs)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Parsed endpoint and token for an enabled log sink.
#[derive(Clone)]
pub struct LogSinkTarget {
    /// Ingest endpoint.
    pub endpoint: Url,
    /// Bearer token.
    pub token: String,
}

impl LogSinkSettings {
    /// Return the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Return the queue capacity, falling back to
    /// [`DEFAULT_DIAGNOSTIC_QUEUE_CAPACITY`].
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(DEFAULT_DIAGNOSTIC_QUEUE_CAPACITY)
    }

    fn credentials(&self) -> (Option<&str>, Option<&str>) {
        (
            non_blank(self.token.as_deref()),
            non_blank(self.url.as_deref()),
        )
    }

    /// Whether exactly one of token and URL is set, which leaves shipping off.
    #[must_use]
    pub fn is_partially_configured(&self) -> bool {
        let (token, url) = self.credentials();
        token.is_some() != url.is_some()
    }

    /// Return the shipping target when both token and URL are set.
    ///
    /// Blank values count as unset. A token without a URL, or a URL without a
    /// token, disables shipping and logs a warning.
    ///
    /// # Errors
    /// Returns [`SettingsError::LogSinkUrl`] when the URL does not parse.
    pub fn target(&self) -> Result<Option<LogSinkTarget>, SettingsError> {
        let (token, url) = match self.credentials() {
            (Some(token), Some(url)) => (token, url),
            (None, None) => return Ok(None),
            (token, url) => {
                warn!(
                    token_set = token.is_some(),
                    url_set = url.is_some(),
                    "log shipping needs both LOGTAIL_TOKEN and LOGTAIL_URL; shipping disabled"
                );
                return Ok(None);
            }
        };
        let endpoint = Url::parse(url).map_err(|err| SettingsError::LogSinkUrl {
            message: err.to_string(),
        })?;
        Ok(Some(LogSinkTarget {
            endpoint,
            token: token.to_owned(),
        }))
    }
}

/// All settings needed to start the service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP server settings.
    pub app: AppSettings,
    /// Database settings.
    pub postgres: PostgresSettings,
    /// Log shipping settings.
    pub log_sink: LogSinkSettings,
}

impl Settings {
    /// Load every settings group from the environment and config files.
    ///
    /// Command-line arguments are not consulted.
    ///
    /// # Errors
    /// Returns the first OrthoConfig loading failure, naming the group.
    pub fn load(program: &str) -> eyre::Result<Self> {
        let args = || [OsString::from(program)];
        Ok(Self {
            app: AppSettings::load_from_iter(args()).wrap_err("failed to load APP_* settings")?,
            postgres: PostgresSettings::load_from_iter(args())
                .wrap_err("failed to load POSTGRES_* settings")?,
            log_sink: LogSinkSettings::load_from_iter(args())
                .wrap_err("failed to load LOGTAIL_* settings")?,
        })
    }
}
