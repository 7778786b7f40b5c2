use std::fmt;

use juggle_pattern::PatternError;

/// Process exit status of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Bad command line.
    Usage = 1,
    /// The pattern file is unreadable or malformed, or the pattern it
    /// describes cannot be laid out.
    Pattern = 2,
    /// The engine failed on a pattern it accepted, or output could not be
    /// written.
    Internal = 3,
}

#[derive(Debug)]
pub struct CliError {
    pub status: ExitStatus,
    pub message: String,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Usage,
            message: message.into(),
        }
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Pattern,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Internal,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<PatternError> for CliError {
    fn from(e: PatternError) -> Self {
        if e.is_user() {
            CliError::pattern(e.to_string())
        } else {
            CliError::internal(e.to_string())
        }
    }
}
