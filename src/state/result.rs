// Test result structures

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::state::{Case, Suite};
use crate::time::TimeFrame;

/// Why a case failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    /// Supplementary context such as the response body
    pub details: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

/// Request issued by a traced call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

/// Outcome of one expectation checked against a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub description: String,
    pub passed: bool,
}

/// Sub-operation of a case, usually one network call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub exec_frame: TimeFrame,
    pub request: Option<RequestInfo>,
    /// Expectations in evaluation order
    pub expectations: Vec<Expectation>,
}

impl Trace {
    pub fn new(exec_frame: TimeFrame) -> Self {
        Self {
            exec_frame,
            request: None,
            expectations: Vec::new(),
        }
    }

    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    pub fn expect(mut self, description: impl Into<String>, passed: bool) -> Self {
        self.expectations.push(Expectation {
            description: description.into(),
            passed,
        });
        self
    }
}

/// Outcome of a single case
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub suite: Arc<Suite>,
    pub case: Case,
    pub exec_frame: TimeFrame,
    pub failure: Option<Failure>,
    pub skipped: bool,
    pub skipped_msg: Option<String>,
    pub traces: Vec<Trace>,
}

impl TestResult {
    /// Create a pass result
    pub fn pass(suite: Arc<Suite>, case: Case, exec_frame: TimeFrame) -> Self {
        Self {
            suite,
            case,
            exec_frame,
            failure: None,
            skipped: false,
            skipped_msg: None,
            traces: Vec::new(),
        }
    }

    /// Create a fail result
    pub fn fail(suite: Arc<Suite>, case: Case, exec_frame: TimeFrame, failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::pass(suite, case, exec_frame)
        }
    }

    /// Create a skip result
    pub fn skip(
        suite: Arc<Suite>,
        case: Case,
        exec_frame: TimeFrame,
        reason: Option<String>,
    ) -> Self {
        Self {
            skipped: true,
            skipped_msg: reason,
            ..Self::pass(suite, case, exec_frame)
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.exec_frame.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite() -> Arc<Suite> {
        Arc::new(Suite::new("Users", "tests/users.yaml"))
    }

    #[test]
    fn test_test_result_pass() {
        let result = TestResult::pass(suite(), Case::new("create"), TimeFrame::start_now());
        assert_eq!(result.case.name, "create");
        assert!(!result.has_failure());
        assert!(!result.skipped);
        assert!(result.traces.is_empty());
    }

    #[test]
    fn test_test_result_fail() {
        let failure = Failure::new("expected 200 got 404").with_details("{\"error\":\"nope\"}");
        let result = TestResult::fail(suite(), Case::new("get"), TimeFrame::start_now(), failure);
        assert!(result.has_failure());
        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.to_string(), "expected 200 got 404");
        assert_eq!(failure.details.as_deref(), Some("{\"error\":\"nope\"}"));
    }

    #[test]
    fn test_test_result_skip() {
        let result = TestResult::skip(
            suite(),
            Case::new("delete"),
            TimeFrame::start_now(),
            Some("flag disabled".to_string()),
        );
        assert!(result.skipped);
        assert!(!result.has_failure());
        assert_eq!(result.skipped_msg.as_deref(), Some("flag disabled"));
    }

    #[test]
    fn test_trace_builder_keeps_expectation_order() {
        let trace = Trace::new(TimeFrame::start_now())
            .with_request(RequestInfo::new("GET", "http://localhost/users"))
            .expect("status is 200", true)
            .expect("body has id", false);

        let descriptions: Vec<_> = trace
            .expectations
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(descriptions, ["status is 200", "body has id"]);
        assert!(!trace.expectations[1].passed);
    }

    #[test]
    fn test_results_share_suite() {
        let suite = suite();
        let a = TestResult::pass(suite.clone(), Case::new("a"), TimeFrame::start_now());
        let b = TestResult::pass(suite.clone(), Case::new("b"), TimeFrame::start_now());
        assert!(Arc::ptr_eq(&a.suite, &b.suite));
    }
}
