//! Fatal parser errors
//!
//! Everything recoverable goes to the diagnostics log instead; these stop
//! a parse before it starts.

use crate::file_processor::FileProcessorError;
use crate::logging::{codes, Code};
use crate::model::TableError;

pub type ParserResult<T> = Result<T, ParserError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParserError {
    #[error("Cannot open input: {path} not found")]
    NotFound { path: String },

    #[error(transparent)]
    File(#[from] FileProcessorError),

    #[error("DDL container has no data block")]
    MissingDdlBlock,

    #[error("DDL data block has no '{table}' table")]
    MissingDdlTable { table: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl ParserError {
    pub fn error_code(&self) -> Code {
        match self {
            ParserError::NotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            ParserError::File(e) => e.error_code(),
            ParserError::MissingDdlBlock | ParserError::MissingDdlTable { .. } => {
                codes::dictionary::MISSING_DDL_TABLE
            }
            ParserError::Table(e) => e.error_code(),
        }
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

/// Map file processor failures, surfacing a missing file as `NotFound`
impl ParserError {
    pub(crate) fn from_file_error(error: FileProcessorError) -> Self {
        match error {
            FileProcessorError::FileNotFound { path } => ParserError::NotFound { path },
            other => ParserError::File(other),
        }
    }
}
