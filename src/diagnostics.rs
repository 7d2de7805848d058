//! Human-readable trace of one resolution
//!
//! The resolver appends a line for every decision it makes (cache hit or
//! bypass, each endpoint tried, the final count, the cache write). Callers can
//! dump the trace to a file; nothing in the crate reads it back.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Append-only list of diagnostic lines
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line and mirrors it to the debug log
    pub fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!("{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Writes the trace to `path`, one newline-terminated line per event
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        fs::write(path, out)
    }
}
