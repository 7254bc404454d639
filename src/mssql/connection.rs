use std::fmt;

use async_trait::async_trait;

use super::client::{MssqlClient, create_mssql_client};
use super::query::build_result_set;
use crate::connection::DatabaseConnection;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;

const COMMIT_IF_OPEN: &str = "IF @@TRANCOUNT > 0 COMMIT TRANSACTION";

/// SQL Server connection over a single Tiberius client.
///
/// With autocommit off the session runs with `IMPLICIT_TRANSACTIONS ON`, so the first
/// write opens a transaction that stays open until commit. Dropping or closing the
/// connection lets the server roll it back.
pub struct MssqlConnection {
    client: Option<MssqlClient>,
    datetime_converter: bool,
}

impl MssqlConnection {
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConnectionError` if login fails or times out, or
    /// `ConfigError` for unusable credentials.
    pub async fn connect(credentials: &Credentials) -> Result<Self, SqlAntipathyError> {
        let mut client = create_mssql_client(credentials).await?;
        if !credentials.autocommit {
            client
                .simple_query("SET IMPLICIT_TRANSACTIONS ON")
                .await?
                .into_results()
                .await?;
        }
        Ok(Self::from_client(client, credentials.datetime_converter))
    }

    #[must_use]
    pub fn from_client(client: MssqlClient, datetime_converter: bool) -> Self {
        Self {
            client: Some(client),
            datetime_converter,
        }
    }

    fn client(&mut self) -> Result<&mut MssqlClient, SqlAntipathyError> {
        self.client
            .as_mut()
            .ok_or_else(|| SqlAntipathyError::ConnectionError("SQL Server connection closed".into()))
    }
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("open", &self.client.is_some())
            .field("datetime_converter", &self.datetime_converter)
            .finish()
    }
}

#[async_trait]
impl DatabaseConnection for MssqlConnection {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAntipathyError> {
        self.client()?.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    async fn execute_dml(&mut self, sql: &str) -> Result<usize, SqlAntipathyError> {
        let result = self.client()?.execute(sql, &[]).await?;
        usize::try_from(result.total()).map_err(|e| {
            SqlAntipathyError::ExecutionError(format!("mssql affected rows conversion error: {e}"))
        })
    }

    async fn execute_select(&mut self, sql: &str) -> Result<ResultSet, SqlAntipathyError> {
        let datetime_converter = self.datetime_converter;
        build_result_set(self.client()?, sql, datetime_converter).await
    }

    async fn commit(&mut self) -> Result<(), SqlAntipathyError> {
        self.execute_batch(COMMIT_IF_OPEN).await
    }

    async fn close(&mut self) -> Result<(), SqlAntipathyError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }
}
