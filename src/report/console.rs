// Console reporter - indented tree output per suite

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::Local;
use console::Style;
use tracing::debug;

use super::Reporter;
use super::status::{self, CARET_ICON, OutputMode, Status};
use crate::state::{TestResult, Totals};
use crate::time::{self, TimeFrame};

/// Default indentation unit in spaces
pub const DEFAULT_INDENT_SIZE: usize = 4;

const OVERALL_LABEL: &str = "Overall result:";

/// Console rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    pub indent_size: usize,
    /// Emit ANSI styling. Not detected from the terminal.
    pub color: bool,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            indent_size: DEFAULT_INDENT_SIZE,
            color: true,
        }
    }
}

/// Snapshot of the run as seen by the console reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub totals: Totals,
    pub overall: Status,
    pub frame: Option<TimeFrame>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.overall == Status::Passed
    }
}

struct ConsoleState {
    out: Box<dyn Write + Send>,
    options: ConsoleOptions,
    indent: usize,
    totals: Totals,
    exec_frame: Option<TimeFrame>,
}

/// Console reporter
///
/// Every write sequence of one `report` or `flush` call runs under a single
/// lock, so suites reported from parallel workers never interleave.
pub struct ConsoleReporter {
    state: Mutex<ConsoleState>,
}

impl ConsoleReporter {
    /// Create console reporter writing to stdout
    pub fn new(options: ConsoleOptions) -> Self {
        Self::with_writer(io::stdout(), options)
    }

    /// Create console reporter writing to an arbitrary sink
    pub fn with_writer(out: impl Write + Send + 'static, options: ConsoleOptions) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                out: Box::new(out),
                options,
                indent: 0,
                totals: Totals::new(),
                exec_frame: None,
            }),
        }
    }

    /// Current totals and overall result
    pub fn summary(&self) -> RunSummary {
        self.lock().summary()
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        // Indentation is reset per batch, so a poisoned state is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(ConsoleOptions::default())
    }
}

impl ConsoleState {
    fn summary(&self) -> RunSummary {
        RunSummary {
            totals: self.totals,
            overall: if self.totals.all_passed() {
                Status::Passed
            } else {
                Status::Failed
            },
            frame: self.exec_frame,
        }
    }

    fn push_indent(&mut self) {
        self.indent += self.options.indent_size;
    }

    fn pop_indent(&mut self) {
        self.indent = self.indent.saturating_sub(self.options.indent_size);
    }

    fn start_line(&mut self) -> io::Result<()> {
        write!(self.out, "{:width$}", "", width = self.indent)
    }

    fn end_line(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    fn write(&mut self, content: impl std::fmt::Display) -> io::Result<()> {
        write!(self.out, "{}", content)
    }

    fn write_styled(&mut self, content: &str, style: Style) -> io::Result<()> {
        let style = style.force_styling(self.options.color);
        write!(self.out, "{}", style.apply_to(content))
    }

    fn write_status(&mut self, status: Status, mode: OutputMode) -> io::Result<()> {
        let (text, style) = status::render(status, mode);
        self.write_styled(text, style)
    }

    fn render_batch(&mut self, results: &[TestResult]) -> io::Result<()> {
        let Some(first) = results.first() else {
            return Ok(());
        };

        self.indent = 0;
        self.start_line()?;
        self.write(first.suite.full_name())?;
        self.end_line()?;

        for result in results {
            self.totals.add(result);
            self.render_case(result)?;
        }

        self.end_line()?;
        self.out.flush()
    }

    fn render_case(&mut self, result: &TestResult) -> io::Result<()> {
        self.push_indent();
        self.start_line()?;
        self.write(CARET_ICON)?;
        self.write(" ")?;

        let status = Status::of(result);
        self.write_status(status, OutputMode::Label)?;
        self.write(" ")?;
        self.write(&result.case.name)?;

        if status == Status::Skipped {
            if let Some(reason) = &result.skipped_msg {
                self.write(format_args!(" ({})", reason))?;
            }
            self.end_line()?;
            self.pop_indent();
            return Ok(());
        }

        self.write(format_args!(" [{}]", time::format_millis(result.duration())))?;
        self.end_line()?;

        for trace in &result.traces {
            let Some(request) = &trace.request else {
                continue;
            };

            self.push_indent();
            self.start_line()?;
            self.write(format_args!(
                "{} {} [{}]",
                request.method,
                request.url,
                time::format_millis(trace.exec_frame.duration())
            ))?;
            self.end_line()?;

            for expectation in &trace.expectations {
                self.push_indent();
                self.start_line()?;
                let status = Status::of_expectation(expectation);
                self.write_status(status, OutputMode::Icon)?;
                self.write(" ")?;
                self.write_styled(&expectation.description, status::dimmed())?;
                self.end_line()?;
                self.pop_indent();
            }

            self.pop_indent();
        }

        self.pop_indent();
        Ok(())
    }

    fn render_summary(&mut self) -> io::Result<()> {
        let frame = self.exec_frame.get_or_insert_with(TimeFrame::start_now);
        frame.close();
        let frame = *frame;
        let summary = self.summary();
        let totals = summary.totals;

        let rows = [
            ("Test count:", totals.total().to_string()),
            ("Passed:", totals.passed().to_string()),
            ("Failed:", totals.failed().to_string()),
            ("Skipped:", totals.skipped().to_string()),
            ("Start time:", format_local(&frame.start)),
            ("End time:", format_local(&frame.end)),
            ("Duration:", time::format_micros(frame.duration())),
        ];
        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .chain(std::iter::once(OVERALL_LABEL.len()))
            .max()
            .unwrap_or(0);

        self.end_line()?;
        self.write("Test Run Summary")?;
        self.end_line()?;
        self.write("-------------------------------")?;
        self.end_line()?;

        self.write(format_args!("{:>width$} ", OVERALL_LABEL, width = width))?;
        self.write_status(summary.overall, OutputMode::Label)?;
        self.end_line()?;

        for (label, value) in rows {
            self.write(format_args!("{:>width$} {}", label, value, width = width))?;
            self.end_line()?;
        }

        self.end_line()?;
        self.out.flush()
    }
}

fn format_local(instant: &chrono::DateTime<chrono::Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S%.3f %:z")
        .to_string()
}

impl Reporter for ConsoleReporter {
    fn init(&self) -> Result<()> {
        self.lock().exec_frame = Some(TimeFrame::start_now());
        Ok(())
    }

    fn report(&self, results: &[TestResult]) -> Result<()> {
        let Some(first) = results.first() else {
            debug!("Skipping console report for empty batch");
            return Ok(());
        };
        let suite = first.suite.full_name();

        let mut state = self.lock();
        state
            .render_batch(results)
            .with_context(|| format!("Failed to write console report for suite {}", suite))
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.lock();
        state
            .render_summary()
            .context("Failed to write console run summary")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Case, Failure, RequestInfo, Suite, Trace};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn plain() -> ConsoleOptions {
        ConsoleOptions {
            indent_size: 4,
            color: false,
        }
    }

    fn frame(start_ms: i64, len_ms: u64) -> TimeFrame {
        let start = Utc.timestamp_millis_opt(1_700_000_000_000 + start_ms).unwrap();
        TimeFrame::with_duration(start, Duration::from_millis(len_ms))
    }

    #[test]
    fn test_passed_case_without_traces_is_one_line() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());
        let suite = Arc::new(Suite::new("Users", "api/users.yaml"));

        reporter
            .report(&[TestResult::pass(suite, Case::new("create user"), frame(0, 100))])
            .unwrap();

        let text = buf.text();
        let lines: Vec<_> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines, ["api.Users", "    └ PASSED create user [100ms]"]);
    }

    #[test]
    fn test_traces_and_expectations_are_nested() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());
        let suite = Arc::new(Suite::new("Users", "api/users.yaml"));
        let result = TestResult::fail(
            suite,
            Case::new("get user"),
            frame(0, 50),
            Failure::new("expected 200 got 404"),
        )
        .with_trace(
            Trace::new(frame(0, 20))
                .with_request(RequestInfo::new("GET", "http://localhost/users/1"))
                .expect("status is 200", false),
        )
        .with_trace(Trace::new(frame(20, 5)));

        reporter.report(&[result]).unwrap();

        let text = buf.text();
        assert!(text.contains("    └ FAILED get user [50ms]\n"));
        assert!(text.contains("        GET http://localhost/users/1 [20ms]\n"));
        assert!(text.contains("            × status is 200\n"));
        assert_eq!(reporter.summary().totals.failed(), 1);
    }

    #[test]
    fn test_skipped_case_with_and_without_reason() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());
        let suite = Arc::new(Suite::new("Flags", "flags.yaml"));

        reporter
            .report(&[
                TestResult::skip(
                    suite.clone(),
                    Case::new("beta"),
                    frame(0, 0),
                    Some("flag disabled".to_string()),
                ),
                TestResult::skip(suite, Case::new("gamma"), frame(0, 0), None),
            ])
            .unwrap();

        let text = buf.text();
        assert!(text.contains("└ SKIPPED beta (flag disabled)\n"));
        assert!(text.contains("└ SKIPPED gamma\n"));

        let summary = reporter.summary();
        assert_eq!(summary.totals.skipped(), 2);
        assert_eq!(summary.totals.total(), 2);
        assert!(summary.is_success());
    }

    #[test]
    fn test_skipped_case_with_failure_renders_as_skipped() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());
        let suite = Arc::new(Suite::new("Flags", "flags.yaml"));
        let mut result = TestResult::fail(suite, Case::new("beta"), frame(0, 5), Failure::new("boom"));
        result.skipped = true;

        reporter.report(&[result]).unwrap();

        let text = buf.text();
        assert!(text.contains("    └ SKIPPED beta\n"));
        assert!(!text.contains("FAILED"));
        let totals = reporter.summary().totals;
        assert_eq!((totals.skipped(), totals.failed()), (1, 0));
    }

    #[test]
    fn test_indent_size_option() {
        let buf = SharedBuf::default();
        let options = ConsoleOptions {
            indent_size: 2,
            color: false,
        };
        let reporter = ConsoleReporter::with_writer(buf.clone(), options);
        let suite = Arc::new(Suite::new("S", "s.yaml"));

        reporter
            .report(&[TestResult::pass(suite, Case::new("a"), frame(0, 1))])
            .unwrap();

        assert!(buf.text().contains("\n  └ PASSED a [1ms]\n"));
    }

    #[test]
    fn test_color_option_emits_ansi() {
        let buf = SharedBuf::default();
        let options = ConsoleOptions {
            indent_size: 4,
            color: true,
        };
        let reporter = ConsoleReporter::with_writer(buf.clone(), options);
        let suite = Arc::new(Suite::new("S", "s.yaml"));

        reporter
            .report(&[TestResult::pass(suite, Case::new("a"), frame(0, 1))])
            .unwrap();

        assert!(buf.text().contains("\u{1b}["));
    }

    #[test]
    fn test_flush_prints_summary() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());
        let suite = Arc::new(Suite::new("S", "s.yaml"));

        reporter.init().unwrap();
        reporter
            .report(&[
                TestResult::pass(suite.clone(), Case::new("a"), frame(0, 1)),
                TestResult::fail(suite, Case::new("b"), frame(0, 1), Failure::new("x")),
            ])
            .unwrap();
        reporter.flush().unwrap();

        let text = buf.text();
        assert!(text.contains("Test Run Summary"));
        assert!(text.contains("Overall result: FAILED\n"));
        assert!(text.contains("    Test count: 2\n"));
        assert!(text.contains("        Passed: 1\n"));
        assert!(text.contains("        Failed: 1\n"));
        assert!(text.contains("       Skipped: 0\n"));
        assert!(text.contains("      Duration: "));

        let summary = reporter.summary();
        assert_eq!(summary.overall, Status::Failed);
        let frame = summary.frame.unwrap();
        assert!(frame.end >= frame.start);
    }

    #[test]
    fn test_flush_without_reports_passes() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());

        reporter.init().unwrap();
        reporter.flush().unwrap();

        assert!(buf.text().contains("Overall result: PASSED\n"));
        assert!(reporter.summary().is_success());
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone(), plain());

        reporter.report(&[]).unwrap();

        assert!(buf.text().is_empty());
        assert_eq!(reporter.summary().totals.total(), 0);
    }
}
