use std::fmt;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};

use super::query::build_result_set;
use crate::connection::DatabaseConnection;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;

/// MySQL connection over one sqlx connection.
///
/// With autocommit off the server keeps a transaction open from the first write until
/// `COMMIT`; closing without committing discards it.
pub struct MysqlConnection {
    conn: Option<MySqlConnection>,
}

/// Connection options equivalent to the dialect's connection URL.
#[must_use]
pub fn connect_options(credentials: &Credentials) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new().host(&credentials.host);
    if let Some(port) = credentials.port {
        options = options.port(port);
    }
    if let Some(user) = &credentials.user {
        options = options.username(user);
    }
    if let Some(password) = &credentials.password {
        options = options.password(password);
    }
    if let Some(database) = &credentials.database {
        options = options.database(database);
    }
    options
}

impl MysqlConnection {
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConnectionError` if the server is unreachable, the login
    /// is rejected, or the login timeout elapses.
    pub async fn connect(credentials: &Credentials) -> Result<Self, SqlAntipathyError> {
        let options = connect_options(credentials);
        let mut conn = tokio::time::timeout(credentials.timeout(), options.connect())
            .await
            .map_err(|_| {
                SqlAntipathyError::ConnectionError(format!(
                    "MySQL login timed out after {}s",
                    credentials.timeout_secs
                ))
            })?
            .map_err(|e| SqlAntipathyError::ConnectionError(format!("MySQL connection error: {e}")))?;

        if !credentials.autocommit {
            (&mut conn).execute("SET autocommit = 0").await?;
        }
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection, SqlAntipathyError> {
        self.conn
            .as_mut()
            .ok_or_else(|| SqlAntipathyError::ConnectionError("MySQL connection closed".into()))
    }
}

impl fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("open", &self.conn.is_some())
            .finish()
    }
}

#[async_trait]
impl DatabaseConnection for MysqlConnection {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAntipathyError> {
        self.conn()?.execute(sql).await?;
        Ok(())
    }

    async fn execute_dml(&mut self, sql: &str) -> Result<usize, SqlAntipathyError> {
        let result = self.conn()?.execute(sql).await?;
        usize::try_from(result.rows_affected()).map_err(|e| {
            SqlAntipathyError::ExecutionError(format!("mysql affected rows conversion error: {e}"))
        })
    }

    async fn execute_select(&mut self, sql: &str) -> Result<ResultSet, SqlAntipathyError> {
        build_result_set(self.conn()?, sql).await
    }

    async fn commit(&mut self) -> Result<(), SqlAntipathyError> {
        self.conn()?.execute("COMMIT").await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlAntipathyError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DialectKind;

    #[test]
    fn options_carry_credentials() {
        let creds = Credentials::builder(DialectKind::Mysql, "db01")
            .user("etl")
            .password("pw")
            .port(Some(3307))
            .database("staging")
            .finish();
        let options = connect_options(&creds);
        assert_eq!(options.get_host(), "db01");
        assert_eq!(options.get_port(), 3307);
        assert_eq!(options.get_database(), Some("staging"));
    }
}
