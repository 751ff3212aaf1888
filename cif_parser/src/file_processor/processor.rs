//! Reads CIF and dictionary files into memory under compile-time limits

use crate::config::constants::compile_time::file_processing::{
    CIF_EXTENSIONS, LARGE_FILE_THRESHOLD, MAX_FILE_SIZE,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// File processor specific errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file extension: expected one of {expected}, found {extension:?}")]
    InvalidExtension {
        extension: Option<String>,
        expected: String,
    },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },
}

impl FileProcessorError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            FileProcessorError::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            FileProcessorError::InvalidExtension { .. } => {
                codes::file_processing::INVALID_EXTENSION
            }
            FileProcessorError::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            FileProcessorError::PermissionDenied { .. } => {
                codes::file_processing::PERMISSION_DENIED
            }
            FileProcessorError::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            FileProcessorError::IoError { .. } => codes::file_processing::IO_ERROR,
            FileProcessorError::InvalidPath { .. } => codes::file_processing::INVALID_PATH,
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

    fn from_io(error: std::io::Error, path: &Path) -> Self {
        match error.kind() {
            ErrorKind::NotFound => FileProcessorError::FileNotFound {
                path: path.display().to_string(),
            },
            ErrorKind::PermissionDenied => FileProcessorError::PermissionDenied {
                path: path.display().to_string(),
            },
            ErrorKind::InvalidData => FileProcessorError::InvalidEncoding {
                path: path.display().to_string(),
            },
            _ => FileProcessorError::IoError {
                message: format!("'{}': {}", path.display(), error),
            },
        }
    }
}

/// Metadata collected while reading an input file
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Canonical file path
    pub path: PathBuf,
    pub size: u64,
    /// Lowercased extension, if any
    pub extension: Option<String>,
    pub line_count: usize,
    pub is_cif_file: bool,
}

impl FileMetadata {
    /// File size in human-readable units
    pub fn human_readable_size(&self) -> String {
        human_size(self.size)
    }

    pub fn is_large_file(&self) -> bool {
        self.size > LARGE_FILE_THRESHOLD
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Source text plus what was learned while reading it
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: Duration,
}

/// Whether a file name carries a recognized CIF extension
pub fn has_cif_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CIF_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Loads input files, enforcing the size limit and optional extension check
#[derive(Debug, Clone)]
pub struct FileProcessor {
    pub require_cif_extension: bool,
    pub enable_performance_logging: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self {
            require_cif_extension: false,
            enable_performance_logging: false,
        }
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            require_cif_extension: prefs.require_cif_extension,
            enable_performance_logging: prefs.enable_performance_logging,
        }
    }

    pub fn with_cif_extension_required(mut self, required: bool) -> Self {
        self.require_cif_extension = required;
        self
    }

    pub fn with_performance_logging(mut self, enabled: bool) -> Self {
        self.enable_performance_logging = enabled;
        self
    }

    /// Compile-time maximum input size
    pub fn max_file_size() -> u64 {
        MAX_FILE_SIZE
    }

    /// Read a file and return its contents with metadata.
    ///
    /// An empty file is accepted; it parses to a container with no blocks.
    pub fn process_file(&self, file_path: &str) -> Result<FileProcessingResult, FileProcessorError> {
        let start = Instant::now();
        log_debug!("Starting file processing", "file" => file_path);

        let path = self.validate_path(file_path)?;
        let mut metadata = self.get_metadata(&path)?;
        self.validate_file(&metadata, file_path)?;

        let source = fs::read_to_string(&path).map_err(|e| {
            let error = FileProcessorError::from_io(e, &path);
            log_error!(error.error_code(), "Failed to read file",
                "file" => file_path,
                "error" => error
            );
            error
        })?;
        metadata.line_count = source.lines().count();

        let result = FileProcessingResult {
            source,
            metadata,
            processing_duration: start.elapsed(),
        };
        self.log_processing_success(&result, file_path);
        Ok(result)
    }

    fn log_processing_success(&self, result: &FileProcessingResult, file_path: &str) {
        let duration_ms = format!("{:.2}", result.processing_duration.as_secs_f64() * 1000.0);

        if self.enable_performance_logging || result.metadata.is_large_file() {
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File read with performance metrics",
                "file" => file_path,
                "size_bytes" => result.metadata.size,
                "size_human" => result.metadata.human_readable_size(),
                "lines" => result.metadata.line_count,
                "duration_ms" => duration_ms,
                "is_large_file" => result.metadata.is_large_file()
            );
        } else {
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File read",
                "file" => file_path,
                "size_bytes" => result.metadata.size,
                "lines" => result.metadata.line_count
            );
        }
    }

    fn validate_path(&self, file_path: &str) -> Result<PathBuf, FileProcessorError> {
        if file_path.is_empty() {
            let error = FileProcessorError::InvalidPath {
                path: file_path.to_string(),
            };
            log_error!(error.error_code(), "Empty file path provided");
            return Err(error);
        }

        let path = Path::new(file_path);
        if !path.exists() {
            let error = FileProcessorError::FileNotFound {
                path: file_path.to_string(),
            };
            log_error!(error.error_code(), "File not found", "path" => file_path);
            return Err(error);
        }
        if !path.is_file() {
            let error = FileProcessorError::InvalidPath {
                path: file_path.to_string(),
            };
            log_error!(error.error_code(), "Path is not a file", "path" => file_path);
            return Err(error);
        }

        path.canonicalize().map_err(|e| {
            let error = FileProcessorError::from_io(e, path);
            log_error!(error.error_code(), "Failed to canonicalize path",
                "path" => file_path,
                "error" => error
            );
            error
        })
    }

    fn get_metadata(&self, path: &Path) -> Result<FileMetadata, FileProcessorError> {
        let meta = fs::metadata(path).map_err(|e| {
            let error = FileProcessorError::from_io(e, path);
            log_error!(error.error_code(), "Failed to read file metadata",
                "path" => path.display(),
                "error" => error
            );
            error
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let metadata = FileMetadata {
            path: path.to_path_buf(),
            size: meta.len(),
            extension,
            line_count: 0,
            is_cif_file: has_cif_extension(path),
        };

        log_debug!("File metadata collected",
            "size_human" => metadata.human_readable_size(),
            "extension" => metadata.extension.as_deref().unwrap_or("none"),
            "is_cif" => metadata.is_cif_file
        );
        Ok(metadata)
    }

    fn validate_file(&self, metadata: &FileMetadata, file_path: &str) -> Result<(), FileProcessorError> {
        if metadata.size > MAX_FILE_SIZE {
            let error = FileProcessorError::FileTooLarge {
                size: metadata.size,
                max_size: MAX_FILE_SIZE,
            };
            log_error!(error.error_code(), "File exceeds compile-time maximum size limit",
                "file" => file_path,
                "size_human" => metadata.human_readable_size(),
                "limit_human" => human_size(MAX_FILE_SIZE)
            );
            return Err(error);
        }

        if self.require_cif_extension && !metadata.is_cif_file {
            let error = FileProcessorError::InvalidExtension {
                extension: metadata.extension.clone(),
                expected: CIF_EXTENSIONS.join(", "),
            };
            log_error!(error.error_code(), "File does not have a CIF extension",
                "file" => file_path,
                "extension" => metadata.extension.as_deref().unwrap_or("none")
            );
            return Err(error);
        }

        Ok(())
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_reads_cif_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry.cif");
        fs::write(&path, "data_x\n_a.b 1\n").unwrap();

        let result = FileProcessor::new().process_file(path.to_str().unwrap()).unwrap();
        assert_eq!(result.source, "data_x\n_a.b 1\n");
        assert_eq!(result.metadata.line_count, 2);
        assert_eq!(result.metadata.extension.as_deref(), Some("cif"));
        assert!(result.metadata.is_cif_file);
    }

    #[test]
    fn test_empty_file_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.cif");
        fs::write(&path, "").unwrap();

        let result = FileProcessor::new().process_file(path.to_str().unwrap()).unwrap();
        assert!(result.source.is_empty());
        assert_eq!(result.metadata.line_count, 0);
    }

    #[test]
    fn test_missing_file_and_directory() {
        let dir = tempdir().unwrap();
        let processor = FileProcessor::new();

        let missing = dir.path().join("nope.cif");
        assert_matches!(
            processor.process_file(missing.to_str().unwrap()),
            Err(FileProcessorError::FileNotFound { .. })
        );
        assert_matches!(
            processor.process_file(dir.path().to_str().unwrap()),
            Err(FileProcessorError::InvalidPath { .. })
        );
        assert_matches!(
            processor.process_file(""),
            Err(FileProcessorError::InvalidPath { .. })
        );
    }

    #[test]
    fn test_extension_requirement() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "data_x\n").unwrap();

        let lenient = FileProcessor::new();
        assert!(lenient.process_file(path.to_str().unwrap()).is_ok());

        let strict = FileProcessor::new().with_cif_extension_required(true);
        let error = strict.process_file(path.to_str().unwrap()).unwrap_err();
        assert_matches!(error, FileProcessorError::InvalidExtension { ref extension, .. }
            if extension.as_deref() == Some("txt"));
        assert_eq!(error.error_code(), codes::file_processing::INVALID_EXTENSION);
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.cif");
        fs::write(&path, [0x64, 0x61, 0xff, 0xfe]).unwrap();

        assert_matches!(
            FileProcessor::new().process_file(path.to_str().unwrap()),
            Err(FileProcessorError::InvalidEncoding { .. })
        );
    }

    #[test]
    fn test_has_cif_extension() {
        assert!(has_cif_extension(Path::new("a.cif")));
        assert!(has_cif_extension(Path::new("mmcif_ddl.DIC")));
        assert!(!has_cif_extension(Path::new("a.json")));
        assert!(!has_cif_extension(Path::new("README")));
    }

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.00 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.00 MB");
    }
}
