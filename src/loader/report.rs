/// A statement that failed without ending the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Zero-based index of the last input row the statement carried.
    pub row_index: usize,
    /// Number of input rows the statement carried.
    pub rows: usize,
    pub statement: String,
    pub message: String,
}

/// What a completed load did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Input rows processed.
    pub rows: usize,
    /// Statements that executed successfully.
    pub statements: usize,
    /// Commits issued.
    pub commits: usize,
    /// Failures the policy tolerated.
    pub failures: Vec<RowFailure>,
}

impl LoadReport {
    /// Legacy integer status: a report only exists for a load that succeeded.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        0
    }

    /// Rows that reached the database, assuming every successful statement inserted all
    /// of its rows.
    #[must_use]
    pub fn rows_loaded(&self) -> usize {
        self.rows
            .saturating_sub(self.failures.iter().map(|f| f.rows).sum::<usize>())
    }
}
