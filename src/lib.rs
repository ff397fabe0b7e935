pub mod config;
pub mod logging;
pub mod report;
pub mod state;
pub mod time;

pub use report::{ConsoleReporter, JunitReporter, MultiReporter, Reporter};
pub use state::{Case, Failure, Suite, TestResult, Trace};
pub use time::TimeFrame;
