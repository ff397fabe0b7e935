// Multi reporter - broadcasts every call to a list of reporters

use super::Reporter;
use crate::state::TestResult;
use anyhow::Result;

/// Forwards each call to its members in order.
///
/// The first member error is returned right away; members after it are not
/// called for that invocation.
#[derive(Default)]
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for MultiReporter {
    fn init(&self) -> Result<()> {
        for reporter in &self.reporters {
            reporter.init()?;
        }
        Ok(())
    }

    fn report(&self, results: &[TestResult]) -> Result<()> {
        for reporter in &self.reporters {
            reporter.report(results)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        for reporter in &self.reporters {
            reporter.flush()?;
        }
        Ok(())
    }
}
