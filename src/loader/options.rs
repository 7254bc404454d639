use super::policy::FailurePolicy;
use crate::error::SqlAntipathyError;
use crate::types::SqlValue;

/// Options for [`super::BatchLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct BulkInsertOptions {
    /// Rows carried by each multi-row INSERT.
    pub record_each_statement: usize,
    /// Rows between transaction commits.
    pub commit_every: usize,
    pub failure_policy: FailurePolicy,
    /// Rendered for columns a record does not have.
    pub missing_value: SqlValue,
}

impl Default for BulkInsertOptions {
    fn default() -> Self {
        Self {
            record_each_statement: 200,
            commit_every: 5000,
            failure_policy: FailurePolicy::BULK_DEFAULT,
            missing_value: SqlValue::Null,
        }
    }
}

impl BulkInsertOptions {
    #[must_use]
    pub fn new(record_each_statement: usize, commit_every: usize) -> Self {
        Self {
            record_each_statement,
            commit_every,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder() -> BulkInsertOptionsBuilder {
        BulkInsertOptionsBuilder::default()
    }

    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if either window size is zero.
    pub fn validate(&self) -> Result<(), SqlAntipathyError> {
        if self.record_each_statement == 0 {
            return Err(SqlAntipathyError::ConfigError(
                "record_each_statement must be at least 1".to_string(),
            ));
        }
        if self.commit_every == 0 {
            return Err(SqlAntipathyError::ConfigError(
                "commit_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`BulkInsertOptions`].
#[derive(Debug, Clone, Default)]
pub struct BulkInsertOptionsBuilder {
    opts: BulkInsertOptions,
}

impl BulkInsertOptionsBuilder {
    #[must_use]
    pub fn record_each_statement(mut self, rows: usize) -> Self {
        self.opts.record_each_statement = rows;
        self
    }

    #[must_use]
    pub fn commit_every(mut self, rows: usize) -> Self {
        self.opts.commit_every = rows;
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.opts.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn missing_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.opts.missing_value = value.into();
        self
    }

    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if either window size is zero.
    pub fn build(self) -> Result<BulkInsertOptions, SqlAntipathyError> {
        self.opts.validate()?;
        Ok(self.opts)
    }
}

/// Options for [`super::insert_many`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertManyOptions {
    /// Rows between progress logs and commits.
    pub step: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for InsertManyOptions {
    fn default() -> Self {
        Self {
            step: 5000,
            failure_policy: FailurePolicy::ROW_BY_ROW_DEFAULT,
        }
    }
}

impl InsertManyOptions {
    #[must_use]
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ConfigError` if `step` is zero.
    pub fn validate(&self) -> Result<(), SqlAntipathyError> {
        if self.step == 0 {
            return Err(SqlAntipathyError::ConfigError(
                "step must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_loader_contracts() {
        let bulk = BulkInsertOptions::default();
        assert_eq!(bulk.record_each_statement, 200);
        assert_eq!(bulk.commit_every, 5000);
        assert_eq!(bulk.failure_policy, FailurePolicy::AbortOnFirst);

        let many = InsertManyOptions::default();
        assert_eq!(many.failure_policy, FailurePolicy::TolerateConsecutive(5));
    }

    #[test]
    fn zero_windows_are_rejected() {
        assert!(BulkInsertOptions::builder().commit_every(0).build().is_err());
        assert!(BulkInsertOptions::new(0, 10).validate().is_err());
        assert!(InsertManyOptions::default().with_step(0).validate().is_err());
    }
}
