//! CIF token vocabulary
//!
//! Payloads borrow from the lexer that produced them and are only valid
//! until the next token is requested. Callers copy out what they keep.

use crate::utils::Span;
use std::fmt;

/// A single lexical unit of CIF text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    // === STRUCTURAL KEYWORDS ===
    /// `data_<name>`; the payload is `<name>`, possibly empty
    DataBlockName(&'a str),
    /// `save_<name>` with a non-empty name
    SaveBegin(&'a str),
    /// Bare `save_`
    SaveEnd,
    /// `loop_`
    Loop,
    /// `stop_`
    Stop,
    /// `global_`
    Global,

    // === NAMES AND VALUES ===
    /// `_category.item`, payload includes the leading underscore
    ItemName(&'a str),
    /// Unquoted or quoted value with the quotes removed
    ItemValue(&'a str),
    /// `;` at line start; the payload is the rest of that line
    MultilineTextBegin(&'a str),
    /// One full line inside a text field
    MultilineTextContinue(&'a str),
    /// Closing `;` at line start
    MultilineTextEnd,
    /// Unquoted `?`
    Unknown,
    /// Unquoted `.`
    Inapplicable,

    // === TRIVIA ===
    /// `#` to end of line, payload excludes the `#`
    Comment(&'a str),
    Whitespace,
    Eof,
}

/// Coarse grouping used by metrics and tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Structural,
    Name,
    Value,
    Trivia,
    End,
}

impl<'a> Token<'a> {
    pub fn class(&self) -> TokenClass {
        match self {
            Token::DataBlockName(_)
            | Token::SaveBegin(_)
            | Token::SaveEnd
            | Token::Loop
            | Token::Stop
            | Token::Global => TokenClass::Structural,
            Token::ItemName(_) => TokenClass::Name,
            Token::ItemValue(_)
            | Token::MultilineTextBegin(_)
            | Token::MultilineTextContinue(_)
            | Token::MultilineTextEnd
            | Token::Unknown
            | Token::Inapplicable => TokenClass::Value,
            Token::Comment(_) | Token::Whitespace => TokenClass::Trivia,
            Token::Eof => TokenClass::End,
        }
    }

    pub fn is_trivia(&self) -> bool {
        self.class() == TokenClass::Trivia
    }

    /// Short name for diagnostics and debug traces
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::DataBlockName(_) => "data block name",
            Token::SaveBegin(_) => "save frame begin",
            Token::SaveEnd => "save frame end",
            Token::Loop => "loop_",
            Token::Stop => "stop_",
            Token::Global => "global_",
            Token::ItemName(_) => "item name",
            Token::ItemValue(_) => "item value",
            Token::MultilineTextBegin(_) => "text field begin",
            Token::MultilineTextContinue(_) => "text field line",
            Token::MultilineTextEnd => "text field end",
            Token::Unknown => "?",
            Token::Inapplicable => ".",
            Token::Comment(_) => "comment",
            Token::Whitespace => "whitespace",
            Token::Eof => "end of file",
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::DataBlockName(name) => write!(f, "data_{}", name),
            Token::SaveBegin(name) => write!(f, "save_{}", name),
            Token::SaveEnd => f.write_str("save_"),
            Token::ItemName(name) | Token::ItemValue(name) => f.write_str(name),
            Token::MultilineTextBegin(text) => write!(f, ";{}", text),
            Token::MultilineTextContinue(text) => f.write_str(text),
            Token::MultilineTextEnd => f.write_str(";"),
            Token::Comment(text) => write!(f, "#{}", text),
            other => f.write_str(other.kind_name()),
        }
    }
}

/// Token plus its location in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpannedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }

    /// Line the token starts on
    pub fn line(&self) -> u32 {
        self.span.start.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(Token::Loop.class(), TokenClass::Structural);
        assert_eq!(Token::ItemName("_a.b").class(), TokenClass::Name);
        assert_eq!(Token::Unknown.class(), TokenClass::Value);
        assert!(Token::Comment(" note").is_trivia());
        assert_eq!(Token::Eof.class(), TokenClass::End);
    }

    #[test]
    fn test_display_round_trips_keywords() {
        assert_eq!(Token::DataBlockName("test").to_string(), "data_test");
        assert_eq!(Token::SaveBegin("_atom_site.id").to_string(), "save__atom_site.id");
        assert_eq!(Token::SaveEnd.to_string(), "save_");
        assert_eq!(Token::Inapplicable.to_string(), ".");
    }
}
