use super::{CatalogQueries, Dialect, SqlTemplates};
use crate::codec;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::types::{DialectKind, SqlValue, hex};

const DRIVER_ALIASES: &[(&str, &str)] = &[
    ("redhat", "/opt/microsoft/msodbcsql17/lib64/libmsodbcsql-17.2.so.0.1"),
    ("windows", "SQL Server"),
    ("odbc17", "ODBC Driver 17 for SQL Server"),
];

/// Resolve a driver alias to the driver name or library path the ODBC manager expects.
///
/// # Errors
///
/// Returns `SqlAntipathyError::ConfigError` if no driver was given.
pub fn resolve_driver(driver: Option<&str>) -> Result<String, SqlAntipathyError> {
    let Some(driver) = driver else {
        return Err(SqlAntipathyError::ConfigError(
            "driver parameter cannot be empty for SQL Server".to_string(),
        ));
    };
    let resolved = DRIVER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == driver)
        .map_or(driver, |(_, name)| *name);
    tracing::debug!("Using driver {resolved}");
    Ok(resolved.to_string())
}

/// SQL Server.
#[derive(Debug, Clone)]
pub struct MssqlDialect {
    templates: SqlTemplates,
    catalog: CatalogQueries,
}

impl Default for MssqlDialect {
    fn default() -> Self {
        Self {
            templates: SqlTemplates::standard(),
            catalog: CatalogQueries {
                databases: "SELECT name FROM sys.databases \
                            WHERE name NOT IN ('master', 'tempdb', 'model', 'msdb')"
                    .to_string(),
                tables: "SELECT DISTINCT TABLE_NAME FROM information_schema.TABLES".to_string(),
                columns: "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE \
                          FROM information_schema.COLUMNS WHERE TABLE_NAME = {table} \
                          ORDER BY ORDINAL_POSITION"
                    .to_string(),
            },
        }
    }
}

impl MssqlDialect {
    #[must_use]
    pub fn with_templates(mut self, templates: SqlTemplates) -> Self {
        self.templates = templates;
        self
    }
}

impl Dialect for MssqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn connection_string(&self, credentials: &Credentials) -> Result<String, SqlAntipathyError> {
        credentials.validate()?;
        let driver = resolve_driver(credentials.driver.as_deref())?;

        let mut conn_str = format!("DRIVER={{{driver}}};SERVER={}", credentials.host);
        if let Some(port) = credentials.port {
            conn_str.push_str(&format!(",{port}"));
        }
        if credentials.trusted_connection {
            conn_str.push_str(";Trusted_Connection=yes");
        }
        if let Some(user) = &credentials.user {
            conn_str.push_str(&format!(";UID={user}"));
        }
        if let Some(password) = &credentials.password {
            conn_str.push_str(&format!(";PWD={password}"));
        }
        if let Some(database) = &credentials.database {
            conn_str.push_str(&format!(";DATABASE={database}"));
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
            SqlValue::Blob(bytes) => format!("0x{}", hex(bytes)),
            other => codec::scalar_to_sql_literal(other),
        }
    }
}
