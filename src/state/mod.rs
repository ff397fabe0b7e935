// State module - test results and running counters

pub mod result;
pub mod suite;

pub use result::{Expectation, Failure, RequestInfo, TestResult, Trace};
pub use suite::{Case, Suite};

/// Running counters for reported cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    total: usize,
    failed: usize,
    skipped: usize,
}

impl Totals {
    /// Create empty totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a result. Skipped wins over failed so each case lands in
    /// exactly one bucket.
    pub fn add(&mut self, result: &TestResult) {
        self.total += 1;
        if result.skipped {
            self.skipped += 1;
        } else if result.has_failure() {
            self.failed += 1;
        }
    }

    /// Get total cases
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get passed cases
    pub fn passed(&self) -> usize {
        self.total - self.failed - self.skipped
    }

    /// Get failed cases
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Get skipped cases
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Check if nothing failed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
