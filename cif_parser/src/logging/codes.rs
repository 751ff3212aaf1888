//! Consolidated error codes and classification system
//!
//! Single source of truth for all diagnostic codes, their metadata, and
//! classification functions.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// File processing error codes
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
}

/// Lexical analysis codes
pub mod lexical {
    use super::Code;

    pub const UNTERMINATED_QUOTE: Code = Code::new("E021");
    pub const UNTERMINATED_TEXT_FIELD: Code = Code::new("E022");
    pub const TOKEN_TOO_LONG: Code = Code::new("E023");
    pub const UNSUPPORTED_KEYWORD: Code = Code::new("E024");
}

/// Structural (grammar and table building) codes
pub mod syntax {
    use super::Code;

    pub const INVALID_ITEM_NAME: Code = Code::new("E040");
    pub const EMPTY_BLOCK_NAME: Code = Code::new("E041");
    pub const DUPLICATE_BLOCK: Code = Code::new("E042");
    pub const DUPLICATE_CATEGORY: Code = Code::new("E043");
    pub const DUPLICATE_ITEM: Code = Code::new("E044");
    pub const CATEGORY_MISMATCH: Code = Code::new("E045");
    pub const VALUE_COUNT_MISMATCH: Code = Code::new("E046");
    pub const UNEXPECTED_VALUE: Code = Code::new("E047");
    pub const MISSING_VALUE: Code = Code::new("E048");
    pub const UNEXPECTED_SAVE_FRAME: Code = Code::new("E049");
    pub const DATA_OUTSIDE_BLOCK: Code = Code::new("E050");
}

/// Dictionary (DDL) codes
pub mod dictionary {
    use super::Code;

    pub const UNDEFINED_CATEGORY: Code = Code::new("E060");
    pub const UNDEFINED_ITEM: Code = Code::new("E061");
    pub const DUPLICATE_SAVE_FRAME: Code = Code::new("E062");
    pub const SAVE_FRAME_NAME_MISMATCH: Code = Code::new("E063");
    pub const MISSING_DDL_TABLE: Code = Code::new("E064");
    pub const UNBALANCED_SAVE_FRAME: Code = Code::new("E065");
    pub const DUPLICATE_FRAME_CATEGORY: Code = Code::new("E066");
}

/// Success and informational codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const PARSE_COMPLETED: Code = Code::new("I010");
    pub const DICTIONARY_PARSE_COMPLETED: Code = Code::new("I011");
    pub const IMPLICIT_ORDINALS_ASSIGNED: Code = Code::new("I012");
    pub const PIPELINE_COMPLETED: Code = Code::new("I020");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

/// Error metadata registry using OnceLock for thread safety
static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

/// Initialize and get the error registry
fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System errors
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal system error",
                "File a bug report with the input that triggered it",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "System initialization failure",
                "Check logging configuration and environment variables",
            ),
            ErrorMetadata::new(
                "ERR003",
                "System",
                Severity::High,
                false,
                true,
                "Runtime configuration could not be loaded",
                "Fix the TOML configuration file",
            ),
            // File processing errors
            ErrorMetadata::new(
                "E005",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Input file not found",
                "Verify the file path and that the file exists",
            ),
            ErrorMetadata::new(
                "E006",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "Input file does not carry a CIF extension",
                "Rename the file or disable the extension requirement",
            ),
            ErrorMetadata::new(
                "E007",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Input file exceeds the maximum size",
                "Split the file or raise the compile-time limit",
            ),
            ErrorMetadata::new(
                "E009",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Permission denied while reading the input",
                "Check file permissions",
            ),
            ErrorMetadata::new(
                "E010",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Input is not valid UTF-8",
                "Convert the file to ASCII or UTF-8",
            ),
            ErrorMetadata::new(
                "E011",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "I/O error while reading the input",
                "Check the storage device and retry",
            ),
            ErrorMetadata::new(
                "E012",
                "FileProcessing",
                Severity::High,
                false,
                true,
                "Invalid input path",
                "Provide a path to a regular file",
            ),
            // Lexical
            ErrorMetadata::new(
                "E021",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Quoted value is not closed on its line",
                "Add the closing quote followed by whitespace",
            ),
            ErrorMetadata::new(
                "E022",
                "Lexical",
                Severity::High,
                true,
                false,
                "Semicolon text field not closed before end of input",
                "Add a line starting with ';' after the text",
            ),
            ErrorMetadata::new(
                "E023",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Token exceeds the maximum token length",
                "Use a semicolon text field for long values",
            ),
            ErrorMetadata::new(
                "E024",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Reserved CIF keyword is not supported",
                "Remove the keyword from the input",
            ),
            // Syntax
            ErrorMetadata::new(
                "E040",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Item name is not of the form _category.item",
                "Correct the item name",
            ),
            ErrorMetadata::new(
                "E041",
                "Syntax",
                Severity::Low,
                true,
                false,
                "Data block header carries no name",
                "Name the data block",
            ),
            ErrorMetadata::new(
                "E042",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Data block name already used in this file",
                "Rename one of the data blocks",
            ),
            ErrorMetadata::new(
                "E043",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Category already present in this data block",
                "Merge the category into a single loop",
            ),
            ErrorMetadata::new(
                "E044",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Item already present in this category",
                "Remove the duplicate item",
            ),
            ErrorMetadata::new(
                "E045",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Loop mixes items of different categories",
                "Split the loop per category",
            ),
            ErrorMetadata::new(
                "E046",
                "Syntax",
                Severity::High,
                true,
                false,
                "Number of loop values is not a multiple of the number of items",
                "Check the loop for missing or extra values",
            ),
            ErrorMetadata::new(
                "E047",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Value without a preceding item name",
                "Add the item name or remove the value",
            ),
            ErrorMetadata::new(
                "E048",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Item name without a value",
                "Supply a value, '?' or '.'",
            ),
            ErrorMetadata::new(
                "E049",
                "Syntax",
                Severity::Low,
                true,
                false,
                "Save frame outside dictionary mode",
                "Parse the file as a dictionary",
            ),
            ErrorMetadata::new(
                "E050",
                "Syntax",
                Severity::Low,
                true,
                false,
                "Data found before the first data block header",
                "Add a data_ header at the top of the file",
            ),
            // Dictionary
            ErrorMetadata::new(
                "E060",
                "Dictionary",
                Severity::Medium,
                true,
                false,
                "Category is not defined in the DDL",
                "Define the category or correct its name",
            ),
            ErrorMetadata::new(
                "E061",
                "Dictionary",
                Severity::Medium,
                true,
                false,
                "Item is not defined in the DDL",
                "Define the item or correct its name",
            ),
            ErrorMetadata::new(
                "E062",
                "Dictionary",
                Severity::Low,
                true,
                false,
                "Save frame name used more than once",
                "Rename or merge the save frames",
            ),
            ErrorMetadata::new(
                "E063",
                "Dictionary",
                Severity::Medium,
                true,
                false,
                "Save frame name differs from the identifier declared inside it",
                "Make the frame name and the declared identifier agree",
            ),
            ErrorMetadata::new(
                "E064",
                "Dictionary",
                Severity::Critical,
                false,
                true,
                "DDL is missing a required table",
                "Load a complete DDL dictionary",
            ),
            ErrorMetadata::new(
                "E065",
                "Dictionary",
                Severity::Medium,
                true,
                false,
                "Save frame opened or closed out of order",
                "Close every save frame with a bare save_",
            ),
            ErrorMetadata::new(
                "E066",
                "Dictionary",
                Severity::Low,
                true,
                false,
                "Category appears twice in one save frame",
                "Merge the category within the frame",
            ),
            // Success codes
            ErrorMetadata::new(
                "I001",
                "Success",
                Severity::Low,
                true,
                false,
                "Logging system initialized",
                "No action required",
            ),
            ErrorMetadata::new(
                "I006",
                "Success",
                Severity::Low,
                true,
                false,
                "Input file read successfully",
                "No action required",
            ),
            ErrorMetadata::new(
                "I010",
                "Success",
                Severity::Low,
                true,
                false,
                "CIF parse completed",
                "Review diagnostics for warnings",
            ),
            ErrorMetadata::new(
                "I011",
                "Success",
                Severity::Low,
                true,
                false,
                "Dictionary parse completed",
                "Review diagnostics for warnings",
            ),
            ErrorMetadata::new(
                "I012",
                "Success",
                Severity::Low,
                true,
                false,
                "Implicit ordinal items numbered",
                "No action required",
            ),
            ErrorMetadata::new(
                "I020",
                "Success",
                Severity::Low,
                true,
                false,
                "Pipeline completed",
                "No action required",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get error metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get error category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
