// MySQL backend - a single sqlx connection driven over the text protocol
//
// - connection: the `DatabaseConnection` implementation
// - query: result extraction into `ResultSet`

pub mod connection;
pub mod query;

pub use connection::MysqlConnection;
pub use query::build_result_set;
