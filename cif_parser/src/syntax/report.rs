//! Outcome of one parse call

use crate::lexical::LexicalMetrics;
use crate::logging::Diagnostics;
use serde::Serialize;

/// How a parse ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStatus {
    /// Input consumed to the end
    Completed,
    /// A read definition was satisfied before the end of input
    Stopped,
    /// End of input reached inside a `;` text field
    UnterminatedText,
}

impl ParseStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, ParseStatus::UnterminatedText)
    }

    /// Process exit code for this status
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseStatus::Completed | ParseStatus::Stopped => 0,
            ParseStatus::UnterminatedText => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Completed => "completed",
            ParseStatus::Stopped => "stopped",
            ParseStatus::UnterminatedText => "unterminated_text",
        }
    }
}

/// Status, diagnostics and token statistics of a finished parse
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub status: ParseStatus,
    pub diagnostics: Diagnostics,
    pub metrics: LexicalMetrics,
}

impl ParseReport {
    /// Rendered diagnostics, one `"<Level> - <message> at line <N>"` per line
    pub fn diagnostics_text(&self) -> String {
        self.diagnostics.render()
    }

    /// Completed without a single diagnostic
    pub fn is_clean(&self) -> bool {
        self.status == ParseStatus::Completed && self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(ParseStatus::Completed.exit_code(), 0);
        assert_eq!(ParseStatus::Stopped.exit_code(), 0);
        assert_eq!(ParseStatus::UnterminatedText.exit_code(), 1);
        assert!(!ParseStatus::UnterminatedText.is_success());
    }
}
