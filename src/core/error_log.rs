//! Parser for `getactiveerrors` output.
//!
//! The log is a sequence of four-line records:
//!
//! ```text
//! Module ID     = Server-1
//! Severity      = NonCritical
//! Message       = The system board battery is low.
//!
//! ```
//!
//! Blank lines ahead of a data line do not take up a slot. The fourth line is
//! a separator whatever it contains.

use crate::domain::model::{ErrorIndex, ErrorRecord, Severity};
use crate::utils::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingModule,
    AwaitingSeverity,
    AwaitingMessage,
    AwaitingSeparator,
}

/// Best-effort parse result: every well-formed record plus the groups that
/// had to be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLogParse {
    pub index: ErrorIndex,
    pub issues: Vec<ParseError>,
}

impl ErrorLogParse {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Default)]
struct Group {
    start_line: usize,
    values: Vec<String>,
    fault: Option<String>,
}

impl Group {
    fn begin(&mut self, line_no: usize) {
        self.start_line = line_no;
        self.values.clear();
        self.fault = None;
    }

    fn push_line(&mut self, line: &str, line_no: usize) {
        match line.split_once('=') {
            Some((_, value)) => self.values.push(value.trim().to_string()),
            None => {
                if self.fault.is_none() {
                    self.fault = Some(format!("line {} has no '=' separator", line_no));
                }
                self.values.push(String::new());
            }
        }
    }

    fn finish(&mut self) -> Result<ErrorRecord, ParseError> {
        let line = self.start_line;
        let malformed = |reason: String| ParseError::MalformedErrorBlock { line, reason };

        if let Some(reason) = self.fault.take() {
            return Err(malformed(reason));
        }

        match self.values.as_slice() {
            [module, severity, message] => Ok(ErrorRecord {
                module_name: module.clone(),
                severity: Severity::from_token(severity),
                message: message.clone(),
            }),
            values => Err(malformed(format!(
                "input ended after {} of 3 data lines",
                values.len()
            ))),
        }
    }
}

fn flush(group: &mut Group, result: &mut ErrorLogParse) {
    match group.finish() {
        Ok(record) => {
            if record.severity == Severity::Unknown {
                tracing::debug!(
                    module = %record.module_name,
                    "Keeping error record with unrecognised severity"
                );
            }
            result.index.insert(record);
        }
        Err(issue) => {
            tracing::warn!("Dropping error log group: {}", issue);
            result.issues.push(issue);
        }
    }
}

/// A lone line without `=` is a status banner ("No active errors"), not a
/// truncated record.
fn banner_only(text: &str) -> Option<&str> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    match (lines.next(), lines.next()) {
        (Some(line), None) if !line.contains('=') => Some(line),
        _ => None,
    }
}

pub fn parse_error_log(text: &str) -> ErrorLogParse {
    let mut result = ErrorLogParse::default();
    if let Some(banner) = banner_only(text) {
        tracing::debug!("Error log holds no records: '{}'", banner);
        return result;
    }

    let mut state = State::AwaitingModule;
    let mut group = Group::default();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let blank = line.trim().is_empty();

        state = match state {
            State::AwaitingSeparator => {
                flush(&mut group, &mut result);
                State::AwaitingModule
            }
            _ if blank => state,
            State::AwaitingModule => {
                group.begin(line_no);
                group.push_line(line, line_no);
                State::AwaitingSeverity
            }
            State::AwaitingSeverity => {
                group.push_line(line, line_no);
                State::AwaitingMessage
            }
            State::AwaitingMessage => {
                group.push_line(line, line_no);
                State::AwaitingSeparator
            }
        };
    }

    // A complete record without a trailing separator still counts; anything
    // shorter is a truncated group.
    if state != State::AwaitingModule {
        flush(&mut group, &mut result);
    }

    tracing::debug!(
        "Parsed {} error records for {} modules ({} groups dropped)",
        result.index.record_count(),
        result.index.len(),
        result.issues.len()
    );
    result
}
