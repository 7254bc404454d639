use super::{CatalogQueries, Dialect, SqlTemplates, render};
use crate::codec;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::types::{DialectKind, SqlValue, hex};

/// Oracle.
///
/// No driver ships with this crate; plug one in through
/// [`crate::DatabaseConnection`] and [`crate::Session::new`].
#[derive(Debug, Clone)]
pub struct OracleDialect {
    templates: SqlTemplates,
    catalog: CatalogQueries,
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self {
            templates: SqlTemplates {
                use_database: Some("ALTER SESSION SET CURRENT_SCHEMA = {db}".to_string()),
                insert: "INSERT INTO {table} ({columns}) VALUES ({values})".to_string(),
                // One `INTO` clause per row; Oracle has no multi-row VALUES list.
                bulk_insert: "INSERT ALL {tuples} SELECT 1 FROM DUAL".to_string(),
            },
            catalog: CatalogQueries {
                databases: "SELECT username FROM all_users ORDER BY username".to_string(),
                tables: "SELECT table_name FROM user_tables ORDER BY table_name".to_string(),
                columns: "SELECT column_name, data_type, nullable FROM user_tab_columns \
                          WHERE table_name = {table} ORDER BY column_id"
                    .to_string(),
            },
        }
    }
}

impl OracleDialect {
    #[must_use]
    pub fn with_templates(mut self, templates: SqlTemplates) -> Self {
        self.templates = templates;
        self
    }
}

impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn connection_string(&self, credentials: &Credentials) -> Result<String, SqlAntipathyError> {
        credentials.validate()?;
        if credentials.trusted_connection {
            return Err(SqlAntipathyError::ConfigError(
                "Oracle connections need a user and password".to_string(),
            ));
        }
        let user = credentials.user.as_deref().unwrap_or_default();
        let password = credentials.password.as_deref().unwrap_or_default();

        let mut conn_str = format!("{user}/{password}@{}", credentials.host);
        if let Some(port) = credentials.port {
            conn_str.push_str(&format!(":{port}"));
        }
        if let Some(service) = &credentials.database {
            conn_str.push('/');
            conn_str.push_str(service);
        }
        Ok(conn_str)
    }

    fn templates(&self) -> &SqlTemplates {
        &self.templates
    }

    fn catalog(&self) -> &CatalogQueries {
        &self.catalog
    }

    fn escape_literal(&self, value: &SqlValue) -> String {
        match value {
            // Caller-built date expressions go in as-is.
            SqlValue::Text(s) if s.contains("to_date") => s.clone(),
            SqlValue::Float(f) if f.is_finite() => f.to_string(),
            v if codec::is_null_like(v) => codec::NULL_LITERAL.to_string(),
            SqlValue::Text(s) => codec::quote(&codec::clean_text(s).replace('&', "AND")),
            SqlValue::Blob(bytes) => format!("HEXTORAW('{}')", hex(bytes)),
            other => codec::scalar_to_sql_literal(other),
        }
    }

    fn multi_insert_statement(&self, table: &str, columns: &str, tuples: &[String]) -> String {
        let clauses: Vec<String> = tuples
            .iter()
            .map(|tuple| format!("INTO {table} ({columns}) VALUES {tuple}"))
            .collect();
        render(
            &self.templates.bulk_insert,
            &[
                ("{table}", table),
                ("{columns}", columns),
                ("{tuples}", &clauses.join(" ")),
            ],
        )
    }
}
