// Loader module - statement-by-statement data loading
//
// - options: validated knobs for both loaders
// - policy: named tolerances for failed statements
// - report: what a finished load did
// - bulk: multi-row INSERT windows with a commit cadence
// - rows: single-row inserts and the row-by-row loop

mod bulk;
mod options;
mod policy;
mod report;
mod rows;

pub use bulk::{BatchLoader, LoaderState};
pub use options::{BulkInsertOptions, BulkInsertOptionsBuilder, InsertManyOptions};
pub use policy::FailurePolicy;
pub use report::{LoadReport, RowFailure};
pub use rows::{insert_many, insert_one};

use crate::connection::DatabaseConnection;
use crate::dialect::Dialect;
use crate::error::SqlAntipathyError;
use crate::record::Record;

/// Load `records` into `table` through multi-row INSERT statements.
///
/// Convenience wrapper around [`BatchLoader`].
///
/// # Errors
///
/// Returns `SqlAntipathyError::ConfigError` for invalid options, or
/// `SqlAntipathyError::StatementFailure` when a flush fails and the policy gives up.
pub async fn bulk_insert<S: AsRef<str>>(
    conn: &mut dyn DatabaseConnection,
    dialect: &dyn Dialect,
    table: &str,
    columns: &[S],
    records: &[Record],
    options: &BulkInsertOptions,
) -> Result<LoadReport, SqlAntipathyError> {
    let mut loader = BatchLoader::new(conn, dialect, table, columns, options.clone())?;
    loader.run(records).await
}
