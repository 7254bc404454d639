use super::options::InsertManyOptions;
use super::policy::FailureTracker;
use super::report::{LoadReport, RowFailure};
use crate::codec::make_list_of_values;
use crate::connection::DatabaseConnection;
use crate::dialect::Dialect;
use crate::error::SqlAntipathyError;
use crate::record::Record;
use crate::types::SqlValue;

fn single_insert(dialect: &dyn Dialect, table: &str, record: &Record) -> String {
    let (columns, values) = make_list_of_values::<&str>(dialect, record, None, &SqlValue::Null);
    dialect.insert_statement(table, &columns, &values)
}

/// Insert one record using its own columns. Nothing is committed here.
///
/// A failure is logged with the statement text and returned as a `StatementFailure`.
///
/// # Errors
///
/// Returns `SqlAntipathyError::StatementFailure` if the driver rejects the statement.
pub async fn insert_one(
    conn: &mut dyn DatabaseConnection,
    dialect: &dyn Dialect,
    table: &str,
    record: &Record,
) -> Result<usize, SqlAntipathyError> {
    let statement = single_insert(dialect, table, record);
    match conn.execute_dml(&statement).await {
        Ok(affected) => Ok(affected),
        Err(err) => {
            tracing::error!("insert_one failed: {err}");
            tracing::error!("insert_one statement: {statement}");
            Err(SqlAntipathyError::StatementFailure {
                row_index: 0,
                statement_number: 1,
                statement,
                source: Box::new(err),
            })
        }
    }
}

/// Insert records one statement at a time.
///
/// Every `step` rows progress is logged and the transaction committed; a final commit
/// follows the last row. Failed rows are logged and skipped while the failure policy
/// allows it (by default up to five in a row).
///
/// # Errors
///
/// Returns `SqlAntipathyError::ConfigError` for a zero step,
/// `SqlAntipathyError::TooManyFailures` once the policy gives up, or the backend error when
/// a commit fails.
pub async fn insert_many(
    conn: &mut dyn DatabaseConnection,
    dialect: &dyn Dialect,
    table: &str,
    records: &[Record],
    options: &InsertManyOptions,
) -> Result<LoadReport, SqlAntipathyError> {
    options.validate()?;
    let total = records.len();
    let mut tracker = FailureTracker::new(options.failure_policy);
    let mut report = LoadReport::default();

    for (idx, record) in records.iter().enumerate() {
        if idx > 0 && idx % options.step == 0 {
            tracing::info!("Reached {idx}/{total}");
            conn.commit().await?;
            report.commits += 1;
        }

        let statement = single_insert(dialect, table, record);
        report.rows += 1;
        match conn.execute_dml(&statement).await {
            Ok(_) => {
                report.statements += 1;
                tracker.record_success();
            }
            Err(err) => {
                tracing::error!("insert_many failed at row {idx}: {err}");
                tracing::error!("Statement {statement}");
                if !tracker.record_failure() {
                    return Err(SqlAntipathyError::TooManyFailures {
                        failures: tracker.total(),
                        row_index: idx,
                        statement,
                        source: Box::new(err),
                    });
                }
                report.failures.push(RowFailure {
                    row_index: idx,
                    rows: 1,
                    statement,
                    message: err.to_string(),
                });
            }
        }
    }

    conn.commit().await?;
    report.commits += 1;
    Ok(report)
}
