//! Pull-based CIF tokenizer
//!
//! Produces one token per call. Problems the lexer can recover from
//! (unterminated quotes, oversized tokens) are queued as [`LexerError`]s
//! for the caller to drain; the token stream itself never fails.

use crate::config::constants::compile_time::lexical::{MAX_TOKEN_LENGTH, QUOTE_TERMINATORS};
use crate::logging::codes;
use crate::tokens::{SpannedToken, Token};
use crate::utils::{Position, Span};

/// Recoverable lexical problems
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Unterminated quoted value, using the rest of the line")]
    UnterminatedQuote { line: u32 },

    #[error("Token too long: {length} characters (max {MAX_TOKEN_LENGTH})")]
    TokenTooLong { line: u32, length: usize },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::UnterminatedQuote { .. } => codes::lexical::UNTERMINATED_QUOTE,
            LexerError::TokenTooLong { .. } => codes::lexical::TOKEN_TOO_LONG,
        }
    }

    /// Line the problem was found on
    pub fn line(&self) -> u32 {
        match self {
            LexerError::UnterminatedQuote { line } | LexerError::TokenTooLong { line, .. } => *line,
        }
    }
}

/// Per-parse token statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub item_names: usize,
    pub values: usize,
    pub comments: usize,
    pub text_fields: usize,
    pub max_token_length: usize,
    pub lines: usize,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token<'_>) {
        match token {
            Token::Whitespace | Token::Eof => return,
            Token::ItemName(name) => {
                self.item_names += 1;
                self.max_token_length = self.max_token_length.max(name.len());
            }
            Token::ItemValue(text) => {
                self.values += 1;
                self.max_token_length = self.max_token_length.max(text.len());
            }
            Token::Unknown | Token::Inapplicable => self.values += 1,
            Token::MultilineTextBegin(_) => {
                self.values += 1;
                self.text_fields += 1;
            }
            Token::Comment(_) => self.comments += 1,
            _ => {}
        }
        self.total_tokens += 1;
    }
}

/// Tokenizer over an in-memory CIF source
pub struct CifLexer<'src> {
    source: &'src str,
    pos: Position,
    in_text_field: bool,
    issues: Vec<LexerError>,
    metrics: LexicalMetrics,
}

impl<'src> CifLexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: Position::start(),
            in_text_field: false,
            issues: Vec::new(),
            metrics: LexicalMetrics::default(),
        }
    }

    /// Line of the next unread character
    pub fn line(&self) -> u32 {
        self.pos.line
    }

    /// Whether a `;` text field has been opened and not yet closed
    pub fn in_text_field(&self) -> bool {
        self.in_text_field
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    /// Drain the recoverable problems found since the last call
    pub fn take_issues(&mut self) -> Vec<LexerError> {
        std::mem::take(&mut self.issues)
    }

    /// Produce the next token.
    ///
    /// The payload borrows `self`, so it must be copied before the next call.
    /// Once the input is exhausted every call returns [`Token::Eof`].
    pub fn next_token(&mut self) -> SpannedToken<'_> {
        let start = self.pos;
        let token = self.scan();
        self.metrics.record_token(&token);
        if token == Token::Eof {
            self.metrics.lines = self.source.lines().count();
        }
        SpannedToken::new(token, Span::new(start, self.pos))
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos.offset..]
    }

    fn at_line_start(&self) -> bool {
        self.pos.column == 1
    }

    fn consume(&mut self, len: usize) -> &'src str {
        let start = self.pos.offset;
        let text = &self.source[start..start + len];
        self.pos = self.pos.advance_str(text);
        text
    }

    fn consume_newline(&mut self) {
        if self.rest().starts_with('\n') {
            self.consume(1);
        }
    }

    fn scan(&mut self) -> Token<'src> {
        if self.in_text_field {
            return self.scan_text_line();
        }

        let rest = self.rest();
        let Some(first) = rest.chars().next() else {
            return Token::Eof;
        };

        match first {
            c if is_whitespace(c) => {
                let len = rest.find(|c| !is_whitespace(c)).unwrap_or(rest.len());
                self.consume(len);
                Token::Whitespace
            }
            ';' if self.at_line_start() => self.begin_text_field(),
            '#' => {
                let text = self.consume(line_len(rest));
                Token::Comment(text[1..].trim_end_matches('\r'))
            }
            '\'' | '"' => self.scan_quoted(first),
            _ => self.scan_word(),
        }
    }

    fn begin_text_field(&mut self) -> Token<'src> {
        let text = self.consume(line_len(self.rest()));
        self.consume_newline();
        self.in_text_field = true;
        Token::MultilineTextBegin(text[1..].trim_end_matches('\r'))
    }

    // Always entered at the start of a line
    fn scan_text_line(&mut self) -> Token<'src> {
        let rest = self.rest();
        if rest.is_empty() {
            return Token::Eof;
        }
        if rest.starts_with(';') {
            self.consume(1);
            self.in_text_field = false;
            return Token::MultilineTextEnd;
        }
        let text = self.consume(line_len(rest));
        self.consume_newline();
        Token::MultilineTextContinue(text.trim_end_matches('\r'))
    }

    fn scan_quoted(&mut self, quote: char) -> Token<'src> {
        let line = self.pos.line;
        let rest = self.rest();
        let body = &rest[1..line_len(rest)];

        let close = body.char_indices().find_map(|(i, c)| {
            if c != quote {
                return None;
            }
            match body[i + 1..].chars().next() {
                None => Some(i),
                Some(next) if QUOTE_TERMINATORS.contains(&next) => Some(i),
                Some(_) => None,
            }
        });

        match close {
            Some(end) => {
                let text = self.consume(end + 2);
                self.check_length(line, end);
                Token::ItemValue(&text[1..end + 1])
            }
            None => {
                self.issues.push(LexerError::UnterminatedQuote { line });
                let text = self.consume(body.len() + 1);
                self.check_length(line, body.len());
                Token::ItemValue(text[1..].trim_end_matches('\r'))
            }
        }
    }

    fn scan_word(&mut self) -> Token<'src> {
        let line = self.pos.line;
        let rest = self.rest();
        let len = rest.find(is_whitespace).unwrap_or(rest.len());
        let word = self.consume(len);
        self.check_length(line, word.len());
        classify_word(word)
    }

    fn check_length(&mut self, line: u32, length: usize) {
        if length > MAX_TOKEN_LENGTH {
            self.issues.push(LexerError::TokenTooLong { line, length });
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

// Length of the current line, excluding the newline
fn line_len(text: &str) -> usize {
    text.find('\n').unwrap_or(text.len())
}

fn strip_keyword<'a>(word: &'a str, keyword: &str) -> Option<&'a str> {
    let head = word.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        Some(&word[keyword.len()..])
    } else {
        None
    }
}

/// Classify an unquoted word. Keywords are case-insensitive.
pub fn classify_word(word: &str) -> Token<'_> {
    if word.starts_with('_') {
        return Token::ItemName(word);
    }
    match word {
        "?" => return Token::Unknown,
        "." => return Token::Inapplicable,
        _ => {}
    }
    if let Some(name) = strip_keyword(word, "data_") {
        return Token::DataBlockName(name);
    }
    if let Some(name) = strip_keyword(word, "save_") {
        return if name.is_empty() {
            Token::SaveEnd
        } else {
            Token::SaveBegin(name)
        };
    }
    if word.eq_ignore_ascii_case("loop_") {
        Token::Loop
    } else if word.eq_ignore_ascii_case("stop_") {
        Token::Stop
    } else if word.eq_ignore_ascii_case("global_") {
        Token::Global
    } else {
        Token::ItemValue(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Owned rendering of the significant tokens, for comparison
    fn significant(source: &str) -> Vec<String> {
        let mut lexer = CifLexer::new(source);
        let mut out = Vec::new();
        loop {
            let spanned = lexer.next_token();
            match spanned.token {
                Token::Eof => break,
                Token::Whitespace | Token::Comment(_) => {}
                Token::ItemValue(v) => out.push(format!("V:{}", v)),
                other => out.push(other.to_string()),
            }
        }
        out
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            significant("DATA_test Loop_ _a.x STOP_ save_frame SAVE_ global_"),
            vec!["data_test", "loop_", "_a.x", "stop_", "save_frame", "save_", "global_"]
        );
    }

    #[test]
    fn test_sentinels_only_when_unquoted() {
        assert_eq!(significant("? . '?' \".\""), vec!["?", ".", "V:?", "V:."]);
    }

    #[test]
    fn test_quote_closes_only_before_whitespace() {
        assert_eq!(
            significant("'it's here' \"a\"b\" c"),
            vec!["V:it's here", "V:a\"b", "V:c"]
        );
    }

    #[test]
    fn test_unterminated_quote_takes_rest_of_line() {
        let mut lexer = CifLexer::new("_a.x 'open value\n_a.y 1\n");
        let mut values = Vec::new();
        loop {
            let spanned = lexer.next_token();
            match spanned.token {
                Token::Eof => break,
                Token::ItemValue(v) => values.push(v.to_string()),
                _ => {}
            }
        }
        assert_eq!(values, vec!["open value", "1"]);
        assert_eq!(lexer.take_issues(), vec![LexerError::UnterminatedQuote { line: 1 }]);
        assert!(lexer.take_issues().is_empty());
    }

    #[test]
    fn test_text_field_lines() {
        let mut lexer = CifLexer::new("_a.x\n;line one\nline two\n;\n_a.y 2");
        let mut seen = Vec::new();
        loop {
            let spanned = lexer.next_token();
            let line = spanned.line();
            match spanned.token {
                Token::Eof => break,
                Token::Whitespace => {}
                other => seen.push((other.to_string(), line)),
            }
        }
        assert_eq!(
            seen,
            vec![
                ("_a.x".to_string(), 1),
                (";line one".to_string(), 2),
                ("line two".to_string(), 3),
                (";".to_string(), 4),
                ("_a.y".to_string(), 5),
                ("2".to_string(), 5),
            ]
        );
        assert_eq!(lexer.metrics().text_fields, 1);
    }

    #[test]
    fn test_semicolon_inside_line_is_plain_value() {
        assert_eq!(significant("_a.x a;b ;c"), vec!["_a.x", "V:a;b", "V:;c"]);
    }

    #[test]
    fn test_open_text_field_at_eof() {
        let mut lexer = CifLexer::new(";never closed\nmore");
        while lexer.next_token().token != Token::Eof {}
        assert!(lexer.in_text_field());
        assert_eq!(lexer.next_token().token, Token::Eof);
    }

    #[test]
    fn test_comments_and_metrics() {
        let mut lexer = CifLexer::new("# header\ndata_x\n_a.b 1 # trailing\n");
        while lexer.next_token().token != Token::Eof {}
        let metrics = lexer.metrics();
        assert_eq!(metrics.comments, 2);
        assert_eq!(metrics.item_names, 1);
        assert_eq!(metrics.values, 1);
        assert_eq!(metrics.lines, 3);
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(
            significant("data_x\r\n_a.b 'q'\r\n;t\r\n;\r\n"),
            vec!["data_x", "_a.b", "V:q", ";t", ";"]
        );
    }
}
