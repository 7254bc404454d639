use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlAntipathyError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MysqlError(#[from] sqlx::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Parse error in column {column}: {message}")]
    ParseError { column: String, message: String },

    /// A statement issued by a loader failed and the active policy gave up.
    #[error("statement {statement_number} failed at row {row_index}: {source}")]
    StatementFailure {
        row_index: usize,
        statement_number: usize,
        statement: String,
        #[source]
        source: Box<SqlAntipathyError>,
    },

    /// A row-by-row load exceeded the failures its policy tolerates.
    #[error("load aborted after {failures} failed rows, last at row {row_index}: {source}")]
    TooManyFailures {
        failures: usize,
        row_index: usize,
        statement: String,
        #[source]
        source: Box<SqlAntipathyError>,
    },
}

/// Coarse error taxonomy shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Opening or using the connection itself failed. Always propagated.
    Connection,
    /// A single statement failed; loaders decide whether to continue.
    Statement,
    /// A value designated as JSON could not be decoded.
    Parse,
    /// Credentials or options were rejected before touching the database.
    Config,
    /// Local I/O, for example while writing an export.
    Io,
}

impl SqlAntipathyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "sqlite")]
            Self::SqliteError(_) => ErrorKind::Statement,
            #[cfg(feature = "mssql")]
            Self::MssqlError(_) => ErrorKind::Statement,
            #[cfg(feature = "mysql")]
            Self::MysqlError(_) => ErrorKind::Statement,
            Self::Csv(_) | Self::Io(_) => ErrorKind::Io,
            Self::ConfigError(_) => ErrorKind::Config,
            Self::ConnectionError(_) => ErrorKind::Connection,
            Self::ExecutionError(_)
            | Self::StatementFailure { .. }
            | Self::TooManyFailures { .. } => ErrorKind::Statement,
            Self::ParseError { .. } => ErrorKind::Parse,
        }
    }

    /// Legacy integer status for callers that only distinguish success from failure.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        1
    }

    /// Statement text attached to loader failures, if any.
    #[must_use]
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::StatementFailure { statement, .. } | Self::TooManyFailures { statement, .. } => {
                Some(statement)
            }
            _ => None,
        }
    }

    /// Zero-based input row the failure is attributed to, if any.
    #[must_use]
    pub fn row_index(&self) -> Option<usize> {
        match self {
            Self::StatementFailure { row_index, .. } | Self::TooManyFailures { row_index, .. } => {
                Some(*row_index)
            }
            _ => None,
        }
    }
}

/// Collapse a result into the `0 = success, 1 = failure` convention.
pub fn status_code<T>(result: &Result<T, SqlAntipathyError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.status_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_failures_carry_context() {
        let err = SqlAntipathyError::StatementFailure {
            row_index: 6,
            statement_number: 3,
            statement: "INSERT INTO t (a) VALUES ('x')".into(),
            source: Box::new(SqlAntipathyError::ExecutionError("boom".into())),
        };
        assert_eq!(err.kind(), ErrorKind::Statement);
        assert_eq!(err.row_index(), Some(6));
        assert_eq!(err.statement(), Some("INSERT INTO t (a) VALUES ('x')"));
        assert!(err.to_string().contains("statement 3 failed at row 6"));
        assert_eq!(status_code::<()>(&Err(err)), 1);
        assert_eq!(status_code(&Ok::<_, SqlAntipathyError>(())), 0);
    }

    #[test]
    fn taxonomy_matches_variants() {
        assert_eq!(
            SqlAntipathyError::ConnectionError("x".into()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            SqlAntipathyError::ConfigError("x".into()).kind(),
            ErrorKind::Config
        );
        let parse = SqlAntipathyError::ParseError {
            column: "payload".into(),
            message: "expected value".into(),
        };
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert!(parse.to_string().contains("payload"));
    }
}
