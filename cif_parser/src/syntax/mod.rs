//! Syntax analysis module - CIF grammar to tables
//!
//! The [`GrammarDriver`] walks the token stream and reports each grammar
//! event to a [`ParserActions`] implementation. [`TableBuilder`] turns those
//! events into category tables and hands finished tables to a
//! [`TableSink`], which decides where they are stored. [`CifParser`] is the
//! plain CIF implementation; the dictionary parser reuses the same pieces.

pub mod builder;
pub mod cursor;
pub mod driver;
mod error;
mod parser;
pub mod read_def;
mod report;

pub use builder::{split_item_name, OpenPolicy, PairPolicy, TableBuilder, TableSink};
pub use cursor::{LoopCursor, WorkingTable};
pub use driver::{Flow, GrammarDriver, ParserActions};
pub use error::{ParserError, ParserResult};
pub use parser::{parse_cif_string, CifParser};
pub use read_def::{ReadDefinition, Selection};
pub use report::{ParseReport, ParseStatus};

use crate::logging::codes;

/// Initialize syntax analysis logging validation (for system startup)
pub fn init_syntax_logging() -> Result<(), String> {
    let syntax_codes = [
        codes::syntax::INVALID_ITEM_NAME,
        codes::syntax::EMPTY_BLOCK_NAME,
        codes::syntax::DUPLICATE_BLOCK,
        codes::syntax::DUPLICATE_CATEGORY,
        codes::syntax::DUPLICATE_ITEM,
        codes::syntax::CATEGORY_MISMATCH,
        codes::syntax::VALUE_COUNT_MISMATCH,
        codes::syntax::UNEXPECTED_VALUE,
        codes::syntax::MISSING_VALUE,
        codes::syntax::UNEXPECTED_SAVE_FRAME,
        codes::syntax::DATA_OUTSIDE_BLOCK,
    ];

    for code in &syntax_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Syntax error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}
