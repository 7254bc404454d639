use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use crate::connection::DatabaseConnection;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;

pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// `SQLite` connection driven from async code through blocking tasks.
///
/// With autocommit off a transaction is opened lazily before the first write and kept
/// open until [`DatabaseConnection::commit`]; closing drops it uncommitted.
pub struct SqliteConnection {
    conn: Option<SharedSqliteConnection>,
    autocommit: bool,
    in_transaction: bool,
}

impl SqliteConnection {
    /// Open the database file named by `credentials.host` (`:memory:` works too).
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConnectionError` if the file cannot be opened.
    pub async fn connect(credentials: &Credentials) -> Result<Self, SqlAntipathyError> {
        let path = credentials.host.clone();
        let busy_timeout = credentials.timeout();
        let conn = spawn_blocking(move || -> Result<rusqlite::Connection, rusqlite::Error> {
            let conn = rusqlite::Connection::open(&path)?;
            conn.busy_timeout(busy_timeout)?;
            Ok(conn)
        })
        .await
        .map_err(|e| {
            SqlAntipathyError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
        })?
        .map_err(|e| SqlAntipathyError::ConnectionError(format!("sqlite open failed: {e}")))?;

        Ok(Self::from_connection(conn, credentials.autocommit))
    }

    /// Wrap an already open `rusqlite` connection.
    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection, autocommit: bool) -> Self {
        Self {
            conn: Some(Arc::new(Mutex::new(conn))),
            autocommit,
            in_transaction: false,
        }
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn conn_handle(&self) -> Result<SharedSqliteConnection, SqlAntipathyError> {
        self.conn
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| SqlAntipathyError::ConnectionError("sqlite connection closed".into()))
    }

    async fn ensure_transaction(&mut self) -> Result<(), SqlAntipathyError> {
        if self.autocommit || self.in_transaction {
            return Ok(());
        }
        run_blocking(self.conn_handle()?, |guard| {
            guard
                .execute_batch("BEGIN")
                .map_err(SqlAntipathyError::SqliteError)
        })
        .await?;
        self.in_transaction = true;
        Ok(())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("open", &self.conn.is_some())
            .field("autocommit", &self.autocommit)
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

#[async_trait]
impl DatabaseConnection for SqliteConnection {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAntipathyError> {
        self.ensure_transaction().await?;
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle()?, move |guard| {
            guard
                .execute_batch(&sql_owned)
                .map_err(SqlAntipathyError::SqliteError)
        })
        .await
    }

    async fn execute_dml(&mut self, sql: &str) -> Result<usize, SqlAntipathyError> {
        self.ensure_transaction().await?;
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle()?, move |guard| {
            guard
                .execute(&sql_owned, [])
                .map_err(SqlAntipathyError::SqliteError)
        })
        .await
    }

    async fn execute_select(&mut self, sql: &str) -> Result<ResultSet, SqlAntipathyError> {
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle()?, move |guard| {
            let mut stmt = guard
                .prepare(&sql_owned)
                .map_err(SqlAntipathyError::SqliteError)?;
            super::query::build_result_set(&mut stmt)
        })
        .await
    }

    async fn commit(&mut self) -> Result<(), SqlAntipathyError> {
        if !self.in_transaction {
            return Ok(());
        }
        run_blocking(self.conn_handle()?, |guard| {
            guard
                .execute_batch("COMMIT")
                .map_err(SqlAntipathyError::SqliteError)
        })
        .await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlAntipathyError> {
        let Some(handle) = self.conn.take() else {
            return Ok(());
        };
        if self.in_transaction {
            tracing::debug!("Discarding uncommitted sqlite transaction on close");
            self.in_transaction = false;
            run_blocking(handle, |guard| {
                guard
                    .execute_batch("ROLLBACK")
                    .map_err(SqlAntipathyError::SqliteError)
            })
            .await?;
        }
        Ok(())
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, SqlAntipathyError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlAntipathyError> + Send + 'static,
    R: Send + 'static,
{
    spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlAntipathyError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlValue;

    fn memory(autocommit: bool) -> SqliteConnection {
        SqliteConnection::from_connection(rusqlite::Connection::open_in_memory().unwrap(), autocommit)
    }

    #[tokio::test]
    async fn writes_open_a_transaction_until_commit() {
        let mut conn = memory(false);
        conn.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
        assert!(conn.in_transaction());
        assert_eq!(conn.execute_dml("INSERT INTO t VALUES (1), (2)").await.unwrap(), 2);
        conn.commit().await.unwrap();
        assert!(!conn.in_transaction());

        let rs = conn.execute_select("SELECT id FROM t ORDER BY id").await.unwrap();
        assert_eq!(rs.first_column(), vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[tokio::test]
    async fn autocommit_never_opens_a_transaction() {
        let mut conn = memory(true);
        conn.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
        conn.execute_dml("INSERT INTO t VALUES (1)").await.unwrap();
        assert!(!conn.in_transaction());
        conn.commit().await.unwrap();
    }

    #[tokio::test]
    async fn closed_connection_rejects_statements() {
        let mut conn = memory(false);
        conn.close().await.unwrap();
        let err = conn.execute_dml("SELECT 1").await.unwrap_err();
        assert!(matches!(err, SqlAntipathyError::ConnectionError(_)));
    }
}
