/// How many failed statements a load absorbs before it gives up.
///
/// Bulk insertion aborts on the first failed flush by default; the row-by-row loop rides
/// out a short streak of bad rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The first failed statement fails the load.
    AbortOnFirst,
    /// Continue while at most `n` statements in a row have failed.
    TolerateConsecutive(usize),
    /// Continue while at most `n` statements have failed overall.
    TolerateTotal(usize),
}

impl FailurePolicy {
    /// Default for [`crate::loader::BatchLoader`].
    pub const BULK_DEFAULT: FailurePolicy = FailurePolicy::AbortOnFirst;
    /// Default for [`crate::loader::insert_many`].
    pub const ROW_BY_ROW_DEFAULT: FailurePolicy = FailurePolicy::TolerateConsecutive(5);
}

#[derive(Debug)]
pub(crate) struct FailureTracker {
    policy: FailurePolicy,
    consecutive: usize,
    total: usize,
}

impl FailureTracker {
    pub(crate) fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            consecutive: 0,
            total: 0,
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Count a failure; `true` while the load may continue.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.total += 1;
        match self.policy {
            FailurePolicy::AbortOnFirst => false,
            FailurePolicy::TolerateConsecutive(max) => self.consecutive <= max,
            FailurePolicy::TolerateTotal(max) => self.total <= max,
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_on_first_never_continues() {
        let mut t = FailureTracker::new(FailurePolicy::AbortOnFirst);
        assert!(!t.record_failure());
    }

    #[test]
    fn consecutive_streak_resets_on_success() {
        let mut t = FailureTracker::new(FailurePolicy::TolerateConsecutive(2));
        assert!(t.record_failure());
        assert!(t.record_failure());
        t.record_success();
        assert!(t.record_failure());
        assert!(t.record_failure());
        assert!(!t.record_failure());
        assert_eq!(t.total(), 5);
    }

    #[test]
    fn total_budget_ignores_successes() {
        let mut t = FailureTracker::new(FailurePolicy::TolerateTotal(2));
        assert!(t.record_failure());
        t.record_success();
        assert!(t.record_failure());
        t.record_success();
        assert!(!t.record_failure());
    }
}
