//! Shared primitive types used by the lexer, the data model and the parsers

pub mod case;
pub mod span;

pub use case::CaseSensitivity;
pub use span::{Position, Span};
