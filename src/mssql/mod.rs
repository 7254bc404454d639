// MSSQL module - SQL Server support via Tiberius
//
// - client: tiberius configuration and raw client creation
// - query: result extraction and building
// - connection: the `DatabaseConnection` implementation

pub mod client;
pub mod connection;
pub mod query;

pub use client::{MssqlClient, build_tiberius_config, create_mssql_client};
pub use connection::MssqlConnection;
pub use query::build_result_set;
