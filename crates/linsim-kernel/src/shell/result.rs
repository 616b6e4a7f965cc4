//! Command results.

use linsim_types::OperationError;

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Exit status. 0 means success.
    pub code: i32,
    /// Standard output, newlines included.
    pub out: String,
    /// Diagnostics, one message per line, no trailing newline.
    pub err: String,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
        }
    }

    /// Create a failed result with an error message.
    pub fn failure(code: i32, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
        }
    }

    /// Create a result with everything specified.
    pub fn from_parts(code: i32, out: impl Into<String>, err: impl Into<String>) -> Self {
        Self {
            code,
            out: out.into(),
            err: err.into(),
        }
    }

    /// Failure with the usual `cmd: message` rendering of an error.
    pub fn from_error(cmd: &str, err: &OperationError) -> Self {
        Self::failure(1, format!("{cmd}: {err}"))
    }

    /// True if the exit status is 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }

    /// Append a diagnostic line.
    pub fn push_err(&mut self, line: impl AsRef<str>) {
        if !self.err.is_empty() {
            self.err.push('\n');
        }
        self.err.push_str(line.as_ref());
    }
}
