//! Thin, uniform wrappers over SQL Server, MySQL, Oracle and `SQLite` drivers.
//!
//! A [`Session`] pairs one open [`DatabaseConnection`] with a [`Dialect`]. On top of it sit
//! row retrieval into [`Record`]s, single and row-by-row inserts, a windowed
//! [`loader::BatchLoader`] for bulk loads, catalog introspection and CSV export.
//!
//! ```rust,no_run
//! use sql_antipathy::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlAntipathyError> {
//! let mut session = Credentials::builder(DialectKind::Sqlite, "people.db")
//!     .autocommit(false)
//!     .connect()
//!     .await?;
//! session.execute("CREATE TABLE IF NOT EXISTS people (id INTEGER, name TEXT)").await?;
//!
//! let rows: Vec<Record> = (1..=3)
//!     .map(|id| Record::new().with("id", id).with("name", format!("person {id}")))
//!     .collect();
//! let report = session
//!     .bulk_insertion(&["id", "name"], &rows, None, "people", &BulkInsertOptions::default())
//!     .await?;
//! assert_eq!(report.rows, 3);
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod codec;
pub mod connection;
pub mod credentials;
pub mod dialect;
pub mod error;
pub mod export;
pub mod loader;
pub mod prelude;
pub mod record;
pub mod results;
pub mod session;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use catalog::ColumnInfo;
pub use connection::DatabaseConnection;
pub use credentials::{Credentials, CredentialsBuilder};
pub use dialect::{Dialect, dialect_for};
pub use error::{ErrorKind, SqlAntipathyError, status_code};
pub use record::Record;
pub use results::{ResultRow, ResultSet};
pub use session::Session;
pub use types::{DialectKind, SqlValue};
