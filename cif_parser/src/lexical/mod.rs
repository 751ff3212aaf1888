//! Lexical analysis for CIF text
//!
//! [`CifLexer`] turns source text into tokens on demand and
//! [`ValueBuffer`] stitches text-field lines back into one value.

pub mod analyzer;
pub mod value_buffer;

use crate::config::constants::compile_time::lexical::{MAX_TOKEN_LENGTH, QUOTE_TERMINATORS};

pub use analyzer::{classify_word, CifLexer, LexerError, LexicalMetrics};
pub use value_buffer::ValueBuffer;

/// Create a lexer over in-memory source text
pub fn create_lexer(source: &str) -> CifLexer<'_> {
    CifLexer::new(source)
}

/// Validate lexical error codes and limits (for system startup)
pub fn init_lexical_analysis_logging() -> Result<(), String> {
    let test_codes = [
        crate::logging::codes::lexical::UNTERMINATED_QUOTE,
        crate::logging::codes::lexical::UNTERMINATED_TEXT_FIELD,
        crate::logging::codes::lexical::TOKEN_TOO_LONG,
        crate::logging::codes::lexical::UNSUPPORTED_KEYWORD,
    ];

    for code in &test_codes {
        if crate::logging::codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    if MAX_TOKEN_LENGTH == 0 {
        return Err("MAX_TOKEN_LENGTH cannot be zero".to_string());
    }
    if !QUOTE_TERMINATORS.contains(&'\n') {
        return Err("QUOTE_TERMINATORS must include newline".to_string());
    }

    crate::log_debug!("Lexical limits initialized",
        "max_token_length" => MAX_TOKEN_LENGTH
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Token;

    #[test]
    fn test_init_lexical_logging() {
        assert!(init_lexical_analysis_logging().is_ok());
    }

    #[test]
    fn test_create_lexer() {
        let mut lexer = create_lexer("loop_");
        assert_eq!(lexer.next_token().token, Token::Loop);
        assert_eq!(lexer.next_token().token, Token::Eof);
    }
}
