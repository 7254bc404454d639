use std::fmt;

use super::options::BulkInsertOptions;
use super::policy::FailureTracker;
use super::report::{LoadReport, RowFailure};
use crate::codec::make_list_of_values;
use crate::connection::DatabaseConnection;
use crate::dialect::Dialect;
use crate::error::SqlAntipathyError;
use crate::record::Record;

/// Where a [`BatchLoader`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Buffering escaped row tuples.
    Accumulating,
    /// Executing one multi-row INSERT.
    Flushing,
    /// Committing the transaction.
    Committing,
    /// Every row processed and committed.
    Done,
    /// Stopped on an error; nothing after the failing statement was executed.
    Failed,
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoaderState::Accumulating => "accumulating",
            LoaderState::Flushing => "flushing",
            LoaderState::Committing => "committing",
            LoaderState::Done => "done",
            LoaderState::Failed => "failed",
        })
    }
}

/// Batched bulk insertion into one table.
///
/// Rows are escaped into tuples in the given column order and buffered; every
/// `record_each_statement` rows (and at end of input) the buffer is flushed as one
/// multi-row INSERT. Independently, every `commit_every` rows (and at end of input) the
/// transaction is committed. Input order is kept in the emitted statements.
///
/// ```rust,no_run
/// # async fn demo(session: &mut sql_antipathy::Session, rows: Vec<sql_antipathy::Record>)
/// # -> Result<(), sql_antipathy::SqlAntipathyError> {
/// use sql_antipathy::prelude::*;
///
/// let options = BulkInsertOptions::builder()
///     .record_each_statement(500)
///     .commit_every(10_000)
///     .build()?;
/// let report = session
///     .bulk_insertion(&["id", "name"], &rows, Some("staging"), "people", &options)
///     .await?;
/// println!("{} statements, {} commits", report.statements, report.commits);
/// # Ok(())
/// # }
/// ```
pub struct BatchLoader<'a> {
    conn: &'a mut dyn DatabaseConnection,
    dialect: &'a dyn Dialect,
    table: &'a str,
    columns: Vec<String>,
    column_list: String,
    options: BulkInsertOptions,
    pending: Vec<String>,
    rows_since_commit: usize,
    statements_attempted: usize,
    tracker: FailureTracker,
    state: LoaderState,
    report: LoadReport,
}

impl fmt::Debug for BatchLoader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchLoader")
            .field("dialect", &self.dialect.kind())
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<'a> BatchLoader<'a> {
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if the options are invalid or no column
    /// was given.
    pub fn new<S: AsRef<str>>(
        conn: &'a mut dyn DatabaseConnection,
        dialect: &'a dyn Dialect,
        table: &'a str,
        columns: &[S],
        options: BulkInsertOptions,
    ) -> Result<Self, SqlAntipathyError> {
        options.validate()?;
        if columns.is_empty() {
            return Err(SqlAntipathyError::ConfigError(
                "bulk insertion needs at least one column".to_string(),
            ));
        }
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let column_list = columns.join(", ");
        let tracker = FailureTracker::new(options.failure_policy);
        Ok(Self {
            conn,
            dialect,
            table,
            columns,
            column_list,
            pending: Vec::with_capacity(options.record_each_statement),
            options,
            rows_since_commit: 0,
            statements_attempted: 0,
            tracker,
            state: LoaderState::Accumulating,
            report: LoadReport::default(),
        })
    }

    #[must_use]
    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Progress so far; after a failure this shows what was done before it.
    #[must_use]
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Load every record.
    ///
    /// An empty input succeeds with no statements and a single no-op commit.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::StatementFailure` when a flush fails and the policy gives
    /// up, or the backend error when a commit fails. Either way the loader is left in
    /// [`LoaderState::Failed`] and no later row is touched.
    pub async fn run(&mut self, records: &[Record]) -> Result<LoadReport, SqlAntipathyError> {
        let total = records.len();
        tracing::debug!(
            "bulk_insertion {} ({} rows, {} per statement, commit every {})",
            self.table,
            total,
            self.options.record_each_statement,
            self.options.commit_every
        );

        for (idx, record) in records.iter().enumerate() {
            let last = idx + 1 == total;
            let (_, values) = make_list_of_values(
                self.dialect,
                record,
                Some(&self.columns[..]),
                &self.options.missing_value,
            );
            self.pending.push(format!("({values})"));
            self.rows_since_commit += 1;
            self.report.rows += 1;

            if self.pending.len() == self.options.record_each_statement || last {
                self.flush(idx).await?;
            }
            if self.rows_since_commit == self.options.commit_every || last {
                tracing::info!(
                    "Reached {}/{} ({} executions)",
                    idx + 1,
                    total,
                    self.report.statements
                );
                self.commit().await?;
            }
        }

        if total == 0 {
            self.commit().await?;
        }
        self.transition(LoaderState::Done);
        Ok(self.report.clone())
    }

    async fn flush(&mut self, idx: usize) -> Result<(), SqlAntipathyError> {
        self.transition(LoaderState::Flushing);
        let window = self.pending.len();
        let statement =
            self.dialect
                .multi_insert_statement(self.table, &self.column_list, &self.pending);
        self.pending.clear();
        self.statements_attempted += 1;

        match self.conn.execute_dml(&statement).await {
            Ok(_) => {
                self.report.statements += 1;
                self.tracker.record_success();
            }
            Err(err) => {
                tracing::error!(
                    "bulk insertion failed at row {} (statement {}): {err}",
                    idx,
                    self.statements_attempted
                );
                tracing::error!("Statement {statement}");
                if !self.tracker.record_failure() {
                    self.transition(LoaderState::Failed);
                    return Err(SqlAntipathyError::StatementFailure {
                        row_index: idx,
                        statement_number: self.statements_attempted,
                        statement,
                        source: Box::new(err),
                    });
                }
                self.report.failures.push(RowFailure {
                    row_index: idx,
                    rows: window,
                    statement,
                    message: err.to_string(),
                });
            }
        }
        self.transition(LoaderState::Accumulating);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SqlAntipathyError> {
        self.transition(LoaderState::Committing);
        if let Err(err) = self.conn.commit().await {
            tracing::error!("commit failed during bulk insertion into {}: {err}", self.table);
            self.transition(LoaderState::Failed);
            return Err(err);
        }
        self.report.commits += 1;
        self.rows_since_commit = 0;
        self.transition(LoaderState::Accumulating);
        Ok(())
    }

    fn transition(&mut self, next: LoaderState) {
        tracing::trace!("bulk loader {} -> {}", self.state, next);
        self.state = next;
    }
}
