use super::{CatalogQueries, Dialect, SqlTemplates};
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::types::DialectKind;

/// `SQLite`. The credential host is the database path; there is no namespace switch.
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    templates: SqlTemplates,
    catalog: CatalogQueries,
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self {
            templates: SqlTemplates {
                use_database: None,
                ..SqlTemplates::standard()
            },
            catalog: CatalogQueries {
                databases: "SELECT name FROM pragma_database_list ORDER BY seq".to_string(),
                tables: "SELECT name FROM sqlite_master \
                         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
                    .to_string(),
                columns: "SELECT name, type, \
                          CASE WHEN \"notnull\" = 0 THEN 'YES' ELSE 'NO' END \
                          FROM pragma_table_info({table}) ORDER BY cid"
                    .to_string(),
            },
        }
    }
}

impl SqliteDialect {
    #[must_use]
    pub fn with_templates(mut self, templates: SqlTemplates) -> Self {
        self.templates = templates;
        self
    }
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn connection_string(&self, credentials: &Credentials) -> Result<String, SqlAntipathyError> {
        credentials.validate()?;
        if credentials.host.is_empty() {
            return Err(SqlAntipathyError::ConfigError(
                "SQLite needs a database path in host".to_string(),
            ));
        }
        Ok(credentials.host.clone())
    }

    fn templates(&self) -> &SqlTemplates {
        &self.templates
    }

    fn catalog(&self) -> &CatalogQueries {
        &self.catalog
    }
}
