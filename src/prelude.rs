//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::catalog::ColumnInfo;
pub use crate::codec::{make_list_of_values, scalar_to_sql_literal};
pub use crate::connection::DatabaseConnection;
pub use crate::credentials::{Credentials, CredentialsBuilder};
pub use crate::dialect::{
    Dialect, MssqlDialect, MysqlDialect, OracleDialect, SqlTemplates, SqliteDialect, dialect_for,
};
pub use crate::error::{ErrorKind, SqlAntipathyError};
pub use crate::export::write_csv;
pub use crate::loader::{
    BatchLoader, BulkInsertOptions, FailurePolicy, InsertManyOptions, LoadReport, RowFailure,
};
pub use crate::record::{Record, row_to_record};
pub use crate::results::{ResultRow, ResultSet};
pub use crate::session::Session;
pub use crate::types::{DialectKind, SqlValue};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlClient, MssqlConnection, create_mssql_client};

#[cfg(feature = "mysql")]
pub use crate::mysql::MysqlConnection;
