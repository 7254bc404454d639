// SQLite backend - rusqlite behind a blocking-task wrapper
//
// - connection: the `DatabaseConnection` implementation and transaction state
// - query: result extraction into `ResultSet`

pub mod connection;
pub mod query;

pub use connection::{SharedSqliteConnection, SqliteConnection};
pub use query::build_result_set;
