//! Per-parse diagnostics log
//!
//! Every recoverable problem found while parsing lands here as an ordered
//! entry tagged with the line it was found on. The rendered log is the
//! diagnostics string handed back to the caller after a parse.

use super::codes::Code;
use super::events::{LogEvent, LogLevel};
use crate::config::compile_time::logging::MAX_DIAGNOSTICS;
use crate::utils::Span;
use std::fmt;

// ============================================================================
// DIAGNOSTIC
// ============================================================================

/// One warning or error recorded during a parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: LogLevel,
    pub code: Code,
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    /// Convert into a log event carrying the line as its span
    pub fn to_event(&self) -> LogEvent {
        let event = match self.level {
            LogLevel::Error => LogEvent::error(self.code, &self.message),
            LogLevel::Warning => LogEvent::warning_with_code(self.code, &self.message),
            LogLevel::Info => LogEvent::info_with_code(self.code, &self.message),
            LogLevel::Debug => LogEvent::debug(&self.message),
        };
        event.with_span(Span::line(self.line))
    }

    fn prefix(&self) -> &'static str {
        match self.level {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} at line {}", self.prefix(), self.message, self.line)
    }
}

// ============================================================================
// DIAGNOSTICS LOG
// ============================================================================

/// Ordered, bounded collection of diagnostics for one parse
#[derive(Debug, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    limit: usize,
    truncated: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_limit(MAX_DIAGNOSTICS)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
            truncated: 0,
        }
    }

    /// Record a diagnostic and mirror it to the global logger
    pub fn push(&mut self, level: LogLevel, code: Code, line: u32, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            level,
            code,
            line,
            message: message.into(),
        };

        if let Some(logger) = super::try_get_global_logger() {
            logger.log_event(super::attach_file_context(diagnostic.to_event()));
        }

        if self.entries.len() < self.limit {
            self.entries.push(diagnostic);
        } else {
            self.truncated += 1;
        }
    }

    pub fn error(&mut self, code: Code, line: u32, message: impl Into<String>) {
        self.push(LogLevel::Error, code, line, message);
    }

    pub fn warning(&mut self, code: Code, line: u32, message: impl Into<String>) {
        self.push(LogLevel::Warning, code, line, message);
    }

    pub fn info(&mut self, code: Code, line: u32, message: impl Into<String>) {
        self.push(LogLevel::Info, code, line, message);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics dropped after the limit was reached
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_warning())
    }

    pub fn with_code(&self, code: Code) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter().filter(move |d| d.code == code)
    }

    /// Render the log as newline-separated lines
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        if self.truncated > 0 {
            if !self.entries.is_empty() {
                writeln!(f)?;
            }
            write!(
                f,
                "INFO - {} further diagnostics suppressed (limit: {})",
                self.truncated, self.limit
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_render_format() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning(
            codes::syntax::DUPLICATE_CATEGORY,
            5,
            "Duplicate category name a in TEST",
        );
        diagnostics.error(
            codes::syntax::VALUE_COUNT_MISMATCH,
            9,
            "Number of data values is not exact multiples of the number of data names",
        );

        assert_eq!(
            diagnostics.render(),
            "Warning - Duplicate category name a in TEST at line 5\n\
             ERROR - Number of data values is not exact multiples of the number of data names at line 9"
        );
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(diagnostics.with_code(codes::syntax::DUPLICATE_CATEGORY).count(), 1);
    }

    #[test]
    fn test_limit_truncates() {
        let mut diagnostics = Diagnostics::with_limit(2);
        for line in 1..=5 {
            diagnostics.warning(codes::syntax::DUPLICATE_ITEM, line, "dup");
        }

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.truncated(), 3);
        assert!(diagnostics.render().ends_with("3 further diagnostics suppressed (limit: 2)"));
    }

    #[test]
    fn test_empty_renders_empty() {
        let diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());
        assert_eq!(diagnostics.render(), "");
    }
}
