// Dialect module - per-engine statement shapes and connection strings
//
// - mssql: SQL Server (ODBC connection strings, `sys.databases` catalog)
// - mysql: MySQL / MariaDB (URL connection strings, `SHOW` catalog)
// - oracle: Oracle (EZConnect strings, `INSERT ALL` multi-row inserts)
// - sqlite: SQLite (file path, `sqlite_master` catalog)

mod mssql;
mod mysql;
mod oracle;
mod sqlite;

use std::fmt;

pub use mssql::{MssqlDialect, resolve_driver};
pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use sqlite::SqliteDialect;

use crate::codec;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::types::{DialectKind, SqlValue};

/// Statement templates for one engine.
///
/// Placeholders: `{db}` in `use_database`; `{table}`, `{columns}` and `{values}` in
/// `insert`; `{table}`, `{columns}` and `{tuples}` in `bulk_insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplates {
    /// Switches the session namespace. `None` when the engine has no such statement.
    pub use_database: Option<String>,
    pub insert: String,
    pub bulk_insert: String,
}

impl SqlTemplates {
    /// Templates shared by engines that speak `USE` and multi-row `VALUES`.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            use_database: Some("USE {db}".to_string()),
            insert: "INSERT INTO {table} ({columns}) VALUES ({values})".to_string(),
            bulk_insert: "INSERT INTO {table} ({columns}) VALUES {tuples}".to_string(),
        }
    }
}

/// Fixed read-only catalog queries.
///
/// `columns` takes a `{table}` placeholder, substituted with an escaped literal, and must
/// return name, data type and nullability in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQueries {
    pub databases: String,
    pub tables: String,
    pub columns: String,
}

/// Capabilities that differ between database engines.
///
/// Loaders and the session are written once against this trait; each backend supplies
/// an implementation instead of subclassing a shared base.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn kind(&self) -> DialectKind;

    /// Render the driver connection string for `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if the credentials cannot be expressed for
    /// this engine.
    fn connection_string(&self, credentials: &Credentials) -> Result<String, SqlAntipathyError>;

    fn templates(&self) -> &SqlTemplates;

    fn catalog(&self) -> &CatalogQueries;

    fn escape_literal(&self, value: &SqlValue) -> String {
        codec::scalar_to_sql_literal(value)
    }

    fn use_database_statement(&self, name: &str) -> Option<String> {
        self.templates()
            .use_database
            .as_ref()
            .map(|tpl| tpl.replace("{db}", name))
    }

    /// Single-row insert; `values` is an already escaped, comma separated list.
    fn insert_statement(&self, table: &str, columns: &str, values: &str) -> String {
        render(
            &self.templates().insert,
            &[("{table}", table), ("{columns}", columns), ("{values}", values)],
        )
    }

    /// Multi-row insert; every tuple is an already escaped, parenthesised value list.
    fn multi_insert_statement(&self, table: &str, columns: &str, tuples: &[String]) -> String {
        render(
            &self.templates().bulk_insert,
            &[
                ("{table}", table),
                ("{columns}", columns),
                ("{tuples}", &tuples.join(", ")),
            ],
        )
    }

    fn show_columns_query(&self, table: &str) -> String {
        self.catalog()
            .columns
            .replace("{table}", &self.escape_literal(&SqlValue::from(table)))
    }
}

/// Substitute placeholders in one pass so substituted text is never re-scanned.
pub(crate) fn render(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    'scan: while !rest.is_empty() {
        if rest.starts_with('{') {
            for (key, value) in pairs {
                if let Some(after) = rest.strip_prefix(key) {
                    out.push_str(value);
                    rest = after;
                    continue 'scan;
                }
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// The built-in dialect for `kind`.
#[must_use]
pub fn dialect_for(kind: DialectKind) -> Box<dyn Dialect> {
    match kind {
        DialectKind::Mssql => Box::new(MssqlDialect::default()),
        DialectKind::Mysql => Box::new(MysqlDialect::default()),
        DialectKind::Oracle => Box::new(OracleDialect::default()),
        DialectKind::Sqlite => Box::new(SqliteDialect::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_does_not_rescan_values() {
        let out = render(
            "INSERT INTO {table} ({columns}) VALUES ({values})",
            &[("{table}", "t"), ("{columns}", "a"), ("{values}", "'{table}'")],
        );
        assert_eq!(out, "INSERT INTO t (a) VALUES ('{table}')");
    }

    #[test]
    fn dialect_for_matches_kind() {
        for kind in [
            DialectKind::Mssql,
            DialectKind::Mysql,
            DialectKind::Oracle,
            DialectKind::Sqlite,
        ] {
            assert_eq!(dialect_for(kind).kind(), kind);
        }
    }

    #[test]
    fn standard_multi_insert_joins_tuples() {
        let dialect = MssqlDialect::default();
        let stmt = dialect.multi_insert_statement(
            "t",
            "a, b",
            &["('1', '2')".to_string(), ("('3', NULL)").to_string()],
        );
        assert_eq!(stmt, "INSERT INTO t (a, b) VALUES ('1', '2'), ('3', NULL)");
    }
}
