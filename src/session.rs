use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use crate::catalog::{self, ColumnInfo};
use crate::connection::DatabaseConnection;
use crate::credentials::Credentials;
use crate::dialect::{Dialect, dialect_for};
use crate::error::SqlAntipathyError;
use crate::export;
use crate::loader::{self, BulkInsertOptions, InsertManyOptions, LoadReport};
use crate::record::Record;
use crate::results::ResultSet;
use crate::types::DialectKind;

/// One open connection plus the dialect that shapes its statements.
///
/// A session has a single owner and serves one caller at a time; statements run in the
/// order they are awaited.
pub struct Session {
    conn: Box<dyn DatabaseConnection>,
    dialect: Box<dyn Dialect>,
    current_database: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect.kind())
            .field("current_database", &self.current_database)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wrap an already open connection, for example one from an external driver.
    #[must_use]
    pub fn new(conn: Box<dyn DatabaseConnection>, dialect: Box<dyn Dialect>) -> Self {
        Self {
            conn,
            dialect,
            current_database: None,
        }
    }

    /// Open a connection with the backend compiled in for `credentials.dialect`.
    ///
    /// The connection string is built (and validated) by the dialect first. Connection
    /// failures are logged and returned, never swallowed.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if the credentials are invalid or no backend
    /// is available for the dialect, and `SqlAntipathyError::ConnectionError` if the driver
    /// cannot connect.
    pub async fn connect(credentials: &Credentials) -> Result<Self, SqlAntipathyError> {
        let dialect = dialect_for(credentials.dialect);
        let logged = dialect.connection_string(&credentials.redacted())?;
        tracing::debug!("Connection string: {logged}");
        tracing::debug!("Trying to connect");

        let conn = match open_backend(credentials).await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::error!("COULD NOT PERFORM CONNECTION TO DB: {err}");
                return Err(match err {
                    SqlAntipathyError::ConfigError(_) | SqlAntipathyError::ConnectionError(_) => {
                        err
                    }
                    other => SqlAntipathyError::ConnectionError(other.to_string()),
                });
            }
        };

        let mut session = Self::new(conn, dialect);
        if let Some(database) = &credentials.database {
            session.current_database = Some(database.clone());
        }
        Ok(session)
    }

    /// Release the connection. Nothing is committed implicitly.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the driver fails to close cleanly.
    pub async fn close(mut self) -> Result<(), SqlAntipathyError> {
        tracing::debug!("Closing connection");
        self.conn.close().await
    }

    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    #[must_use]
    pub fn current_database(&self) -> Option<&str> {
        self.current_database.as_deref()
    }

    /// Direct access to the connection for statements the helpers do not cover.
    pub fn connection_mut(&mut self) -> &mut dyn DatabaseConnection {
        self.conn.as_mut()
    }

    /// Switch the namespace subsequent statements run against.
    ///
    /// Engines without such a statement log and keep the current namespace.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the statement fails.
    pub async fn use_database(&mut self, name: &str) -> Result<(), SqlAntipathyError> {
        match self.dialect.use_database_statement(name) {
            Some(statement) => {
                self.conn.execute_batch(&statement).await?;
                self.current_database = Some(name.to_string());
            }
            None => tracing::debug!(
                "{} has no database switch; staying on the current database",
                self.dialect.kind()
            ),
        }
        Ok(())
    }

    async fn maybe_use(&mut self, dbname: Option<&str>) -> Result<(), SqlAntipathyError> {
        match dbname {
            Some(name) => self.use_database(name).await,
            None => Ok(()),
        }
    }

    /// Run a statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the statement fails.
    pub async fn execute(&mut self, sql: &str) -> Result<usize, SqlAntipathyError> {
        self.conn.execute_dml(sql).await
    }

    /// # Errors
    ///
    /// Returns the backend error if the commit fails.
    pub async fn commit(&mut self) -> Result<(), SqlAntipathyError> {
        self.conn.commit().await
    }

    /// Run a query and collect all rows, optionally switching database first.
    ///
    /// # Errors
    ///
    /// Returns the backend error if switching database or running the query fails.
    pub async fn retrieve(
        &mut self,
        dbname: Option<&str>,
        qry: &str,
    ) -> Result<ResultSet, SqlAntipathyError> {
        self.maybe_use(dbname).await?;
        tracing::debug!("Running query");
        self.conn.execute_select(qry).await
    }

    /// Run a query and return one [`Record`] per row, decoding `json_fields`.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the query fails, or `SqlAntipathyError::ParseError` if
    /// a designated JSON column holds invalid JSON.
    pub async fn retrieve_table(
        &mut self,
        dbname: Option<&str>,
        qry: &str,
        json_fields: &HashSet<String>,
    ) -> Result<Vec<Record>, SqlAntipathyError> {
        let result = self.retrieve(dbname, qry).await?;
        tracing::debug!("Parsing data");
        let records = result.into_records(json_fields)?;
        tracing::debug!("Data parsed");
        Ok(records)
    }

    /// # Errors
    ///
    /// Returns the backend error if the catalog query fails.
    pub async fn show_databases(&mut self) -> Result<Vec<String>, SqlAntipathyError> {
        catalog::show_databases(self.conn.as_mut(), self.dialect.as_ref()).await
    }

    /// # Errors
    ///
    /// Returns the backend error if switching database or the catalog query fails.
    pub async fn show_tables(
        &mut self,
        dbname: Option<&str>,
    ) -> Result<Vec<String>, SqlAntipathyError> {
        self.maybe_use(dbname).await?;
        catalog::show_tables(self.conn.as_mut(), self.dialect.as_ref()).await
    }

    /// # Errors
    ///
    /// Returns the backend error if switching database or the catalog query fails.
    pub async fn show_columns(
        &mut self,
        dbname: Option<&str>,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, SqlAntipathyError> {
        self.maybe_use(dbname).await?;
        catalog::show_columns(self.conn.as_mut(), self.dialect.as_ref(), table).await
    }

    /// Insert a single record; see [`loader::insert_one`].
    ///
    /// # Errors
    ///
    /// Returns the backend error if switching database fails, or
    /// `SqlAntipathyError::StatementFailure` if the insert is rejected.
    pub async fn insert_one(
        &mut self,
        table: &str,
        record: &Record,
        dbname: Option<&str>,
    ) -> Result<usize, SqlAntipathyError> {
        tracing::debug!("insert_one {:?}.{table}", dbname);
        self.maybe_use(dbname).await?;
        loader::insert_one(self.conn.as_mut(), self.dialect.as_ref(), table, record).await
    }

    /// Row-by-row load; see [`loader::insert_many`].
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::TooManyFailures` once the failure policy gives up, or
    /// the backend error if switching database or committing fails.
    pub async fn insert_many(
        &mut self,
        records: &[Record],
        dbname: Option<&str>,
        table: &str,
        options: &InsertManyOptions,
    ) -> Result<LoadReport, SqlAntipathyError> {
        tracing::debug!("insert_many {:?}.{table}", dbname);
        self.maybe_use(dbname).await?;
        loader::insert_many(
            self.conn.as_mut(),
            self.dialect.as_ref(),
            table,
            records,
            options,
        )
        .await
    }

    /// Batched multi-row load; see [`loader::BatchLoader`].
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::StatementFailure` when a flush fails under the default
    /// policy, `ConfigError` for invalid options, or the backend error if switching
    /// database or committing fails.
    pub async fn bulk_insertion<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        records: &[Record],
        dbname: Option<&str>,
        table: &str,
        options: &BulkInsertOptions,
    ) -> Result<LoadReport, SqlAntipathyError> {
        self.maybe_use(dbname).await?;
        loader::bulk_insert(
            self.conn.as_mut(),
            self.dialect.as_ref(),
            table,
            columns,
            records,
            options,
        )
        .await
    }

    /// Run `qry` and write its rows as CSV to `writer`.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the query fails, or a CSV/I/O error if writing fails.
    pub async fn export_csv<W: Write>(
        &mut self,
        qry: &str,
        writer: W,
    ) -> Result<usize, SqlAntipathyError> {
        export::export_csv(self.conn.as_mut(), qry, writer).await
    }
}

async fn open_backend(
    credentials: &Credentials,
) -> Result<Box<dyn DatabaseConnection>, SqlAntipathyError> {
    match credentials.dialect {
        #[cfg(feature = "sqlite")]
        DialectKind::Sqlite => Ok(Box::new(
            crate::sqlite::SqliteConnection::connect(credentials).await?,
        )),
        #[cfg(feature = "mssql")]
        DialectKind::Mssql => Ok(Box::new(
            crate::mssql::MssqlConnection::connect(credentials).await?,
        )),
        #[cfg(feature = "mysql")]
        DialectKind::Mysql => Ok(Box::new(
            crate::mysql::MysqlConnection::connect(credentials).await?,
        )),
        #[allow(unreachable_patterns)]
        other => Err(SqlAntipathyError::ConfigError(format!(
            "no built-in driver for {other}; open the connection yourself and use Session::new"
        ))),
    }
}
