// Report module - console, JUnit and broadcast reporters

pub mod console;
pub mod junit;
pub mod multi;
pub mod status;

use crate::state::TestResult;
use anyhow::Result;
pub use console::{ConsoleOptions, ConsoleReporter, RunSummary};
pub use junit::JunitReporter;
pub use multi::MultiReporter;
pub use status::{OutputMode, Status};

/// Reporter trait
///
/// The harness calls [`Reporter::init`] once, [`Reporter::report`] once per
/// finished suite and [`Reporter::flush`] once at the end. `report` may be
/// called from several threads at the same time.
pub trait Reporter: Send + Sync {
    /// Called before any suite is reported
    fn init(&self) -> Result<()>;

    /// Called with the ordered results of one suite.
    ///
    /// All results are expected to share a suite; the first result's suite
    /// is used when they do not.
    fn report(&self, results: &[TestResult]) -> Result<()>;

    /// Called after the last suite was reported
    fn flush(&self) -> Result<()>;
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn init(&self) -> Result<()> {
        (**self).init()
    }

    fn report(&self, results: &[TestResult]) -> Result<()> {
        (**self).report(results)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<R: Reporter + ?Sized> Reporter for std::sync::Arc<R> {
    fn init(&self) -> Result<()> {
        (**self).init()
    }

    fn report(&self, results: &[TestResult]) -> Result<()> {
        (**self).report(results)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}
