//! File processor module with compile-time limits and global logging integration

mod processor;

use crate::config::constants::compile_time::file_processing::{
    CIF_EXTENSIONS, LARGE_FILE_THRESHOLD, MAX_FILE_SIZE,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes;
use crate::log_debug;
pub use processor::{
    has_cif_extension, FileMetadata, FileProcessingResult, FileProcessor, FileProcessorError,
};

/// Read a file with default settings
pub fn process_file(file_path: &str) -> Result<FileProcessingResult, FileProcessorError> {
    FileProcessor::new().process_file(file_path)
}

/// Create a file processor from runtime preferences
pub fn create_processor_from_preferences(prefs: &FileProcessorPreferences) -> FileProcessor {
    FileProcessor::from_preferences(prefs)
}

/// Initialize file processor logging validation (for system startup)
pub fn init_file_processor_logging() -> Result<(), String> {
    let test_codes = [
        codes::file_processing::FILE_NOT_FOUND,
        codes::file_processing::INVALID_EXTENSION,
        codes::file_processing::FILE_TOO_LARGE,
        codes::file_processing::PERMISSION_DENIED,
        codes::file_processing::INVALID_ENCODING,
        codes::file_processing::IO_ERROR,
        codes::file_processing::INVALID_PATH,
    ];

    for code in &test_codes {
        if codes::get_description(code.as_str()) == "Unknown error" {
            return Err(format!(
                "File processor error code {} has no description",
                code.as_str()
            ));
        }
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "File processor error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    if LARGE_FILE_THRESHOLD > MAX_FILE_SIZE {
        return Err("LARGE_FILE_THRESHOLD exceeds MAX_FILE_SIZE".to_string());
    }

    log_debug!("File processor compile-time configuration loaded",
        "max_file_size" => MAX_FILE_SIZE,
        "large_file_threshold" => LARGE_FILE_THRESHOLD,
        "extensions" => CIF_EXTENSIONS.join(",")
    );

    Ok(())
}
