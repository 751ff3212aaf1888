//! Token vocabulary shared by the lexer and the grammar driver
//!
//! The lexer hands out one [`SpannedToken`] at a time. Its payload slices
//! are tied to the lexer borrow, so the compiler rejects any attempt to
//! hold a payload across the next `next_token` call.

pub mod token;

pub use token::{SpannedToken, Token, TokenClass};

pub use crate::utils::{Position, Span};
