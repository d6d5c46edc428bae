use serde::Serialize;
use std::io::{self, BufRead, BufReader, Read};
use utoipa::ToSchema;

/// Number of error lines echoed back in a summary.
pub const MAX_SAMPLED_ERRORS: usize = 10;

/// Longest sampled line, in bytes.
pub const MAX_SAMPLE_LEN: usize = 512;

const ERROR_MARKERS: &[&str] = &["error", "fatal", "critical"];
const WARNING_MARKERS: &[&str] = &["warn"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LogSummary {
    pub lines: u64,
    pub errors: u64,
    pub warnings: u64,
    /// First error lines, trimmed and truncated
    pub first_errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
    Other,
}

fn classify(line: &str) -> Severity {
    let lower = line.to_lowercase();
    if ERROR_MARKERS.iter().any(|m| lower.contains(m)) {
        Severity::Error
    } else if WARNING_MARKERS.iter().any(|m| lower.contains(m)) {
        Severity::Warning
    } else {
        Severity::Other
    }
}

fn truncate(line: &str, max: usize) -> String {
    if line.len() <= max {
        return line.to_string();
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    line[..end].to_string()
}

impl LogSummary {
    /// Scans a log from the reader's current position to EOF.
    ///
    /// Lines are split on `\n`; invalid UTF-8 is decoded lossily so binary
    /// noise does not abort the scan.
    pub fn scan<R: Read>(reader: R) -> io::Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut summary = LogSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            summary.lines += 1;

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            match classify(line) {
                Severity::Error => {
                    summary.errors += 1;
                    if summary.first_errors.len() < MAX_SAMPLED_ERRORS {
                        summary.first_errors.push(truncate(line, MAX_SAMPLE_LEN));
                    }
                }
                Severity::Warning => summary.warnings += 1,
                Severity::Other => {}
            }
        }

        Ok(summary)
    }
}
