// JUnit reporter - one XML document per suite

use super::Reporter;
use crate::state::TestResult;
use crate::time::{self, TimeFrame};
use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// `type` attribute of every failure element
pub const FAILURE_TYPE: &str = "FailedExpectation";

/// Host label written when none is configured
pub const DEFAULT_HOSTNAME: &str = "localhost";

type XmlResult<T> = std::result::Result<T, quick_xml::Error>;

/// `<testsuite>` element
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteDocument {
    pub id: usize,
    pub name: String,
    pub package: String,
    pub timestamp: String,
    /// Seconds covered by the union of all case frames
    pub time: f64,
    pub hostname: String,
    pub tests: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub cases: Vec<CaseRecord>,
    pub full_name: String,
    frame: TimeFrame,
}

/// `<testcase>` element
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub name: String,
    pub classname: String,
    pub time: f64,
    pub failure: Option<FailureRecord>,
    pub skipped: Option<SkippedRecord>,
}

/// `<failure>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub kind: String,
    pub message: String,
    pub details: String,
}

/// `<skipped>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub message: Option<String>,
}

impl SuiteDocument {
    /// Aggregate a batch into a suite document. `None` for an empty batch.
    pub fn from_results(id: usize, hostname: &str, results: &[TestResult]) -> Option<Self> {
        let first = results.first()?;
        let suite = &first.suite;

        let mut doc = Self {
            id,
            name: xml_text(&suite.name),
            package: xml_text(&suite.package_name()),
            timestamp: time::iso8601_millis(first.exec_frame.start),
            time: 0.0,
            hostname: xml_text(hostname),
            tests: 0,
            failures: 0,
            errors: 0,
            skipped: 0,
            cases: Vec::with_capacity(results.len()),
            full_name: xml_text(&suite.full_name()),
            frame: first.exec_frame,
        };

        for result in results {
            doc.push(result);
        }

        Some(doc)
    }

    fn push(&mut self, result: &TestResult) {
        let mut record = CaseRecord {
            name: xml_text(&result.case.name),
            classname: self.full_name.clone(),
            time: result.duration().as_secs_f64(),
            failure: None,
            skipped: None,
        };

        if result.skipped {
            record.skipped = Some(SkippedRecord {
                message: result.skipped_msg.as_deref().map(xml_text),
            });
            self.skipped += 1;
        } else if let Some(failure) = &result.failure {
            let message = xml_text(&failure.message);
            let details = match &failure.details {
                Some(details) => format!("{}\n\n{}", message, xml_text(details)),
                None => message.clone(),
            };
            record.failure = Some(FailureRecord {
                kind: FAILURE_TYPE.to_string(),
                message,
                details,
            });
            self.failures += 1;
        }

        self.tests += 1;
        self.cases.push(record);

        self.frame.extend(&result.exec_frame);
        self.time = self.frame.duration().as_secs_f64();
    }

    /// Serialize as a standalone JUnit XML document
    pub fn to_xml(&self) -> XmlResult<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut suite_tag = BytesStart::new("testsuite");
        suite_tag.extend_attributes([
            ("id", self.id.to_string().as_str()),
            ("name", self.name.as_str()),
            ("package", self.package.as_str()),
            ("timestamp", self.timestamp.as_str()),
        ]);
        serialize_time(&mut suite_tag, self.time);
        suite_tag.extend_attributes([
            ("hostname", self.hostname.as_str()),
            ("tests", self.tests.to_string().as_str()),
            ("failures", self.failures.to_string().as_str()),
            ("errors", self.errors.to_string().as_str()),
            ("skipped", self.skipped.to_string().as_str()),
        ]);
        writer.write_event(Event::Start(suite_tag))?;

        writer.write_event(Event::Empty(BytesStart::new("properties")))?;
        for case in &self.cases {
            case.serialize(&mut writer)?;
        }
        writer.write_event(Event::Empty(BytesStart::new("system-out")))?;
        writer.write_event(Event::Empty(BytesStart::new("system-err")))?;

        serialize_end_event("testsuite", &mut writer)?;
        Ok(writer.into_inner())
    }
}

impl CaseRecord {
    fn serialize(&self, writer: &mut Writer<impl std::io::Write>) -> XmlResult<()> {
        let mut case_tag = BytesStart::new("testcase");
        case_tag.extend_attributes([
            ("name", self.name.as_str()),
            ("classname", self.classname.as_str()),
        ]);
        serialize_time(&mut case_tag, self.time);

        if self.failure.is_none() && self.skipped.is_none() {
            return writer.write_event(Event::Empty(case_tag));
        }

        writer.write_event(Event::Start(case_tag))?;

        if let Some(failure) = &self.failure {
            let mut failure_tag = BytesStart::new("failure");
            failure_tag.extend_attributes([
                ("type", failure.kind.as_str()),
                ("message", failure.message.as_str()),
            ]);
            writer.write_event(Event::Start(failure_tag))?;
            writer.write_event(Event::Text(BytesText::new(&failure.details)))?;
            serialize_end_event("failure", writer)?;
        }

        if let Some(skipped) = &self.skipped {
            let mut skipped_tag = BytesStart::new("skipped");
            if let Some(message) = &skipped.message {
                skipped_tag.push_attribute(("message", message.as_str()));
            }
            writer.write_event(Event::Empty(skipped_tag))?;
        }

        serialize_end_event("testcase", writer)
    }
}

/// Drop ANSI escape sequences and any character outside the XML 1.0 `Char`
/// production. quick-xml escapes markup only.
fn xml_text(text: &str) -> String {
    console::strip_ansi_codes(text)
        .chars()
        .filter(|&c| is_xml_char(c))
        .collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// File stem for a suite: path separators and `..` cannot leave the output
/// directory.
fn file_stem(full_name: &str) -> String {
    let stem: String = full_name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_");

    if stem.is_empty() { String::from("_") } else { stem }
}

fn serialize_time(tag: &mut BytesStart<'_>, time: f64) {
    tag.push_attribute(("time", format!("{:.3}", time).as_str()))
}

fn serialize_end_event(title: &str, writer: &mut Writer<impl std::io::Write>) -> XmlResult<()> {
    writer.write_event(Event::End(BytesEnd::new(title)))
}

/// JUnit reporter
///
/// Writes `<output_dir>/<suite full name>.xml` for every reported batch. A
/// suite reported again during the same run gets a numbered file
/// (`<name>.2.xml`, ...) instead of replacing the earlier one. No file name is
/// handed out twice, even when a numbered name matches another suite.
pub struct JunitReporter {
    output_dir: PathBuf,
    hostname: String,
    next_id: AtomicUsize,
    file_names: Mutex<HashSet<String>>,
}

impl JunitReporter {
    /// Create new JUnit reporter
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            next_id: AtomicUsize::new(0),
            file_names: Mutex::new(HashSet::new()),
        }
    }

    /// Override the host label
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn file_name(&self, full_name: &str) -> String {
        let stem = file_stem(full_name);
        let mut taken = self
            .file_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut name = format!("{}.xml", stem);
        let mut n = 1;
        while taken.contains(&name) {
            n += 1;
            name = format!("{}.{}.xml", stem, n);
        }
        taken.insert(name.clone());
        name
    }

    fn flush_suite(&self, suite: &SuiteDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create JUnit report directory: {}",
                self.output_dir.display()
            )
        })?;

        let data = suite
            .to_xml()
            .with_context(|| format!("Failed to serialize JUnit XML for {}", suite.full_name))?;

        let path = self.output_dir.join(self.file_name(&suite.full_name));
        fs::write(&path, data)
            .with_context(|| format!("Failed to write JUnit report file: {}", path.display()))?;

        Ok(path)
    }
}

impl Reporter for JunitReporter {
    fn init(&self) -> Result<()> {
        // No-op for JUnit file reporter
        Ok(())
    }

    fn report(&self, results: &[TestResult]) -> Result<()> {
        let Some(mut suite) = SuiteDocument::from_results(0, &self.hostname, results) else {
            debug!("Skipping JUnit report for empty batch");
            return Ok(());
        };
        // Ids are only consumed by persisted documents
        suite.id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let path = self.flush_suite(&suite)?;
        info!(
            "JUnit report for {} written to {}",
            suite.full_name,
            path.display()
        );
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Every suite is persisted as soon as it is reported
        Ok(())
    }
}
