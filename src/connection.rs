use async_trait::async_trait;

use crate::error::SqlAntipathyError;
use crate::results::ResultSet;

/// One open driver connection and its cursor state.
///
/// Statements run strictly one at a time; every call completes before the next starts.
/// Implementations exist for the compiled-in backends, and external drivers (Oracle, for
/// example) implement this trait to be driven by [`crate::Session`] and the loaders.
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Run session or state statements (`USE`, `SET`, DDL) as a plain batch so their
    /// effect persists for the rest of the connection.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAntipathyError>;

    /// Run one INSERT/UPDATE/DELETE and return the rows affected.
    async fn execute_dml(&mut self, sql: &str) -> Result<usize, SqlAntipathyError>;

    /// Run one query and collect every row.
    async fn execute_select(&mut self, sql: &str) -> Result<ResultSet, SqlAntipathyError>;

    /// Commit the open transaction, if any.
    async fn commit(&mut self) -> Result<(), SqlAntipathyError>;

    /// Release the connection. Uncommitted work is discarded, never committed.
    async fn close(&mut self) -> Result<(), SqlAntipathyError>;
}
