//! Error handling for laxml conversions
//!
//! This module provides a unified error type and result type for all
//! conversion operations, plus the warning and diagnostic types collected
//! while a conversion runs.

use std::fmt;
use std::path::PathBuf;

/// Conversion error type
#[derive(Debug, Clone)]
pub enum ConversionError {
    /// Lexical error - an unterminated construct reached end of input
    LexError {
        /// The construct that was left open ("brace group", "math span", ...)
        construct: String,
        line: usize,
        column: usize,
    },
    /// Parse error - input could not be turned into a tree
    ParseError {
        message: String,
        line: Option<usize>,
    },
    /// A referenced resource (import, bibliography) is missing or unreadable
    ResourceError { path: PathBuf, message: String },
    /// IO error (for file operations)
    IoError { message: String },
    /// The conversion worker exceeded its time budget
    Timeout { seconds: u64 },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::LexError {
                construct,
                line,
                column,
            } => {
                write!(
                    f,
                    "Unterminated {} at line {}, column {}",
                    construct, line, column
                )
            }
            ConversionError::ParseError { message, line } => {
                if let Some(l) = line {
                    write!(f, "Parse error at line {}: {}", l, message)
                } else {
                    write!(f, "Parse error: {}", message)
                }
            }
            ConversionError::ResourceError { path, message } => {
                write!(f, "Cannot read '{}': {}", path.display(), message)
            }
            ConversionError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
            ConversionError::Timeout { seconds } => {
                write!(f, "Conversion timed out after {}s", seconds)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Conversion warnings (non-fatal issues)
///
/// Missing command arguments, unknown constructs and skipped resources are
/// reported this way and additionally surface as XML comments in the
/// rendered output; they never abort the conversion.
#[derive(Debug, Clone)]
pub struct ConversionWarning {
    pub message: String,
    pub line: Option<usize>,
    pub severity: DiagnosticSeverity,
}

impl ConversionWarning {
    pub fn new(message: impl Into<String>) -> Self {
        ConversionWarning {
            message: message.into(),
            line: None,
            severity: DiagnosticSeverity::Warning,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        ConversionWarning {
            message: message.into(),
            line: None,
            severity: DiagnosticSeverity::Info,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(l) = self.line {
            write!(f, "Warning at line {}: {}", l, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

/// Severity level for CLI diagnostics (determines coloring and behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Critical errors (red) - conversion aborted
    Error,
    /// Warnings (yellow) - e.g., missing arguments, unknown commands
    Warning,
    /// Informational (cyan) - e.g., skipped resources, fallback behavior
    Info,
}

impl DiagnosticSeverity {
    /// ANSI color prefix used by the CLI when color output is enabled
    pub fn color_code(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "\x1b[31m",
            DiagnosticSeverity::Warning => "\x1b[33m",
            DiagnosticSeverity::Info => "\x1b[36m",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_names_construct_and_position() {
        let err = ConversionError::LexError {
            construct: "math span".into(),
            line: 3,
            column: 17,
        };
        assert_eq!(err.to_string(), "Unterminated math span at line 3, column 17");
    }

    #[test]
    fn warning_carries_line() {
        let w = ConversionWarning::new("unknown command '\\frobnicate'").at_line(12);
        assert_eq!(
            w.to_string(),
            "Warning at line 12: unknown command '\\frobnicate'"
        );
    }
}
