// Internal modules
pub mod config;
pub mod dictionary;
pub mod file_processor;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use dictionary::{DdlSchema, DicFile, DicParser};
pub use logging::{Diagnostic, Diagnostics};
pub use model::{Block, CifFile, Table, TableError, Value};
pub use pipeline::{PipelineError, PipelineOutput, PipelineResult};
pub use syntax::{CifParser, ParseReport, ParseStatus, ParserError, ReadDefinition, Selection};
