use super::{CatalogQueries, Dialect, SqlTemplates};
use crate::codec;
use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;
use crate::types::{DialectKind, SqlValue};

/// MySQL and MariaDB.
#[derive(Debug, Clone)]
pub struct MysqlDialect {
    templates: SqlTemplates,
    catalog: CatalogQueries,
}

impl Default for MysqlDialect {
    fn default() -> Self {
        Self {
            templates: SqlTemplates::standard(),
            catalog: CatalogQueries {
                databases: "SHOW DATABASES".to_string(),
                tables: "SHOW TABLES".to_string(),
                columns: "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE \
                          FROM information_schema.COLUMNS \
                          WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = {table} \
                          ORDER BY ORDINAL_POSITION"
                    .to_string(),
            },
        }
    }
}

impl MysqlDialect {
    #[must_use]
    pub fn with_templates(mut self, templates: SqlTemplates) -> Self {
        self.templates = templates;
        self
    }
}

impl Dialect for MysqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn connection_string(&self, credentials: &Credentials) -> Result<String, SqlAntipathyError> {
        credentials.validate()?;
        if credentials.trusted_connection {
            return Err(SqlAntipathyError::ConfigError(
                "MySQL does not support trusted connections".to_string(),
            ));
        }

        let mut url = String::from("mysql://");
        if let Some(user) = &credentials.user {
            url.push_str(user);
            if let Some(password) = &credentials.password {
                url.push(':');
                url.push_str(password);
            }
            url.push('@');
        }
        url.push_str(&credentials.host);
        if let Some(port) = credentials.port {
            url.push_str(&format!(":{port}"));
        }
        if let Some(database) = &credentials.database {
            url.push('/');
            url.push_str(database);
        }
        Ok(url)
    }

    fn templates(&self) -> &SqlTemplates {
        &self.templates
    }

    fn catalog(&self) -> &CatalogQueries {
        &self.catalog
    }

    // Backslash is an escape character in MySQL string literals unless
    // NO_BACKSLASH_ESCAPES is set. Cleaned text has none left; JSON keeps its own.
    fn escape_literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Json(json) => {
                codec::quote(&json.to_string().replace('\\', "\\\\").replace('\'', "''"))
            }
            other => codec::scalar_to_sql_literal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_connection_string() {
        let c = Credentials::builder(DialectKind::Mysql, "db01")
            .user("etl")
            .password("pw")
            .port(Some(3307))
            .database("stage")
            .finish();
        assert_eq!(
            MysqlDialect::default().connection_string(&c).unwrap(),
            "mysql://etl:pw@db01:3307/stage"
        );
    }

    #[test]
    fn trusted_is_rejected() {
        let c = Credentials::builder(DialectKind::Mysql, "db01")
            .trusted_connection(true)
            .finish();
        assert!(MysqlDialect::default().connection_string(&c).is_err());
    }

    #[test]
    fn json_backslash_escapes_are_doubled() {
        let d = MysqlDialect::default();
        let value = SqlValue::Json(serde_json::json!({"q": "say \"hi\"\nit's"}));
        assert_eq!(
            d.escape_literal(&value),
            r#"'{"q":"say \\"hi\\"\\nit''s"}'"#
        );
        assert_eq!(d.escape_literal(&SqlValue::from(r"C:\tmp")), "'Ctmp'");
    }

    #[test]
    fn use_statement() {
        assert_eq!(
            MysqlDialect::default().use_database_statement("stage").as_deref(),
            Some("USE stage")
        );
    }
}
