use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::connection::DatabaseConnection;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;

/// One call observed by a [`RecordingConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Batch(String),
    Dml(String),
    Select(String),
    Commit,
    Close,
}

/// Shared view of everything a [`RecordingConnection`] was asked to do, in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: Event) {
        self.lock().push(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Every DML statement attempted, including rejected ones.
    #[must_use]
    pub fn dml_statements(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Event::Dml(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, Event::Commit))
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[derive(Debug, Clone)]
enum FailRule {
    /// 1-based position among DML statements.
    DmlNumber(usize),
    Contains(String),
}

/// A `DatabaseConnection` that records statements instead of running them.
///
/// DML statements can be made to fail by position or by content, and queries answered
/// with canned result sets matched by substring.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    log: EventLog,
    fail_rules: Vec<FailRule>,
    selects: Vec<(String, ResultSet)>,
    dml_count: usize,
    fail_commit: bool,
}

impl RecordingConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// Reject the `n`th DML statement (1-based).
    #[must_use]
    pub fn fail_dml_number(mut self, n: usize) -> Self {
        self.fail_rules.push(FailRule::DmlNumber(n));
        self
    }

    /// Reject every DML statement containing `needle`.
    #[must_use]
    pub fn fail_when_contains(mut self, needle: impl Into<String>) -> Self {
        self.fail_rules.push(FailRule::Contains(needle.into()));
        self
    }

    #[must_use]
    pub fn fail_commits(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Answer queries containing `needle` with `result`.
    #[must_use]
    pub fn with_select(mut self, needle: impl Into<String>, result: ResultSet) -> Self {
        self.selects.push((needle.into(), result));
        self
    }

    fn should_fail(&self, sql: &str) -> bool {
        self.fail_rules.iter().any(|rule| match rule {
            FailRule::DmlNumber(n) => *n == self.dml_count,
            FailRule::Contains(needle) => sql.contains(needle.as_str()),
        })
    }
}

#[async_trait]
impl DatabaseConnection for RecordingConnection {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAntipathyError> {
        self.log.push(Event::Batch(sql.to_string()));
        Ok(())
    }

    async fn execute_dml(&mut self, sql: &str) -> Result<usize, SqlAntipathyError> {
        self.dml_count += 1;
        self.log.push(Event::Dml(sql.to_string()));
        if self.should_fail(sql) {
            return Err(SqlAntipathyError::ExecutionError(format!(
                "injected failure on statement {}",
                self.dml_count
            )));
        }
        Ok(1)
    }

    async fn execute_select(&mut self, sql: &str) -> Result<ResultSet, SqlAntipathyError> {
        self.log.push(Event::Select(sql.to_string()));
        let canned = self
            .selects
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, result)| result.clone());
        Ok(canned.unwrap_or_else(|| {
            let mut empty = ResultSet::with_capacity(0);
            empty.set_column_names(Arc::new(Vec::new()));
            empty
        }))
    }

    async fn commit(&mut self) -> Result<(), SqlAntipathyError> {
        if self.fail_commit {
            return Err(SqlAntipathyError::ConnectionError(
                "injected commit failure".to_string(),
            ));
        }
        self.log.push(Event::Commit);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlAntipathyError> {
        self.log.push(Event::Close);
        Ok(())
    }
}
