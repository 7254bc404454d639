use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlAntipathyError;
use crate::session::Session;
use crate::types::DialectKind;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const REDACTED: &str = "***";

/// Everything needed to reach one database server.
///
/// Deserializes from a JSON configuration document:
/// ```rust
/// use sql_antipathy::prelude::*;
///
/// let creds = Credentials::from_json_str(
///     r#"{"dialect": "mssql", "host": "db01", "user": "etl", "password": "s3cret",
///         "driver": "odbc17"}"#,
/// )?;
/// assert_eq!(creds.timeout_secs, 10);
/// assert!(!format!("{creds:?}").contains("s3cret"));
/// # Ok::<(), SqlAntipathyError>(())
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub dialect: DialectKind,
    /// Server host name; for `SQLite` the database path.
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// ODBC driver name or alias (SQL Server only).
    #[serde(default)]
    pub driver: Option<String>,
    /// Windows integrated authentication; excludes user/password.
    #[serde(default)]
    pub trusted_connection: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub autocommit: bool,
    #[serde(default = "default_true")]
    pub datetime_converter: bool,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("database", &self.database)
            .field("driver", &self.driver)
            .field("trusted_connection", &self.trusted_connection)
            .field("timeout_secs", &self.timeout_secs)
            .field("autocommit", &self.autocommit)
            .field("datetime_converter", &self.datetime_converter)
            .finish()
    }
}

impl Credentials {
    #[must_use]
    pub fn new(dialect: DialectKind, host: impl Into<String>) -> Self {
        Self {
            dialect,
            host: host.into(),
            port: None,
            user: None,
            password: None,
            database: None,
            driver: None,
            trusted_connection: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            autocommit: false,
            datetime_converter: true,
        }
    }

    #[must_use]
    pub fn builder(dialect: DialectKind, host: impl Into<String>) -> CredentialsBuilder {
        CredentialsBuilder::new(dialect, host)
    }

    /// Parse credentials from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if the document does not describe credentials.
    pub fn from_json_str(json: &str) -> Result<Self, SqlAntipathyError> {
        serde_json::from_str(json)
            .map_err(|e| SqlAntipathyError::ConfigError(format!("invalid credentials: {e}")))
    }

    /// Read credentials from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::Io` if the file cannot be read, or `ConfigError` if it
    /// cannot be parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlAntipathyError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check invariants that hold for every dialect.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` when a trusted connection is combined with a
    /// user or password.
    pub fn validate(&self) -> Result<(), SqlAntipathyError> {
        if self.trusted_connection && (self.user.is_some() || self.password.is_some()) {
            tracing::warn!("trusted_connection and user/password are mutually exclusive");
            return Err(SqlAntipathyError::ConfigError(
                "specify only one between trusted_connection and user/password".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Copy with the password masked, safe to render into logs.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.password.is_some() {
            copy.password = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Fluent builder for [`Credentials`].
#[derive(Debug, Clone)]
pub struct CredentialsBuilder {
    creds: Credentials,
}

impl CredentialsBuilder {
    #[must_use]
    pub fn new(dialect: DialectKind, host: impl Into<String>) -> Self {
        Self {
            creds: Credentials::new(dialect, host),
        }
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.creds.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.creds.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.creds.port = port;
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.creds.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.creds.driver = Some(driver.into());
        self
    }

    #[must_use]
    pub fn trusted_connection(mut self, trusted: bool) -> Self {
        self.creds.trusted_connection = trusted;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.creds.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.creds.autocommit = autocommit;
        self
    }

    #[must_use]
    pub fn datetime_converter(mut self, enabled: bool) -> Self {
        self.creds.datetime_converter = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> Credentials {
        self.creds
    }

    /// Open a [`Session`] with the built credentials.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError` if the credentials are rejected or the connection fails.
    pub async fn connect(self) -> Result<Session, SqlAntipathyError> {
        Session::connect(&self.finish()).await
    }
}
