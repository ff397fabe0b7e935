// Outcome kinds and their console styling

use console::{Color, Style};

use crate::state::{Expectation, TestResult};

/// Branch glyph leading every case line
pub const CARET_ICON: &str = "\u{2514}"; // └

/// Outcome of a case, or of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

/// How a status is rendered at a given call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Label,
    Icon,
}

impl Status {
    pub fn of(result: &TestResult) -> Self {
        if result.skipped {
            Status::Skipped
        } else if result.has_failure() {
            Status::Failed
        } else {
            Status::Passed
        }
    }

    pub fn of_expectation(expectation: &Expectation) -> Self {
        if expectation.passed {
            Status::Passed
        } else {
            Status::Failed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Passed => "PASSED",
            Status::Failed => "FAILED",
            Status::Skipped => "SKIPPED",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Status::Passed => "\u{221A}", // √
            Status::Failed => "\u{00D7}", // ×
            Status::Skipped => "",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Status::Passed => Color::Green,
            Status::Failed => Color::Red,
            Status::Skipped => Color::Yellow,
        }
    }
}

/// Text and style for a status. Pure; the caller applies both in one write.
pub fn render(status: Status, mode: OutputMode) -> (&'static str, Style) {
    let text = match mode {
        OutputMode::Label => status.label(),
        OutputMode::Icon => status.icon(),
    };
    (text, Style::new().fg(status.color()).bold())
}

/// Style for secondary text such as expectation descriptions
pub fn dimmed() -> Style {
    Style::new().black().bright()
}
