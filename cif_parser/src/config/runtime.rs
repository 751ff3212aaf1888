// RUNTIME PREFERENCES (User Experience)

use crate::utils::CaseSensitivity;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to require a recognized CIF extension (.cif, .mmcif, .dic, .ddl)
    pub require_cif_extension: bool,

    /// Whether to enable detailed performance logging
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_cif_extension: env::var(env_vars::REQUIRE_CIF_EXTENSION)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_performance_logging: env::var(env_vars::ENABLE_PERFORMANCE_LOGGING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserPreferences {
    /// Emit a debug trace for every parser callback
    pub verbose: bool,

    /// Case rule applied to category and column names of new tables
    pub case_sensitivity: CaseSensitivity,
}

impl Default for ParserPreferences {
    fn default() -> Self {
        Self {
            verbose: env::var(env_vars::PARSER_VERBOSE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            case_sensitivity: env::var(env_vars::PARSER_CASE_INSENSITIVE)
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .map(|insensitive| {
                    if insensitive {
                        CaseSensitivity::Insensitive
                    } else {
                        CaseSensitivity::Sensitive
                    }
                })
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryPreferences {
    /// Validate every written table against the DDL schema
    pub check_ddl: bool,

    /// Number implicit-ordinal items after the parse completes
    pub insert_implicit_ordinals: bool,

    /// Report columns missing from the DDL item table
    pub warn_undefined_items: bool,
}

impl Default for DictionaryPreferences {
    fn default() -> Self {
        Self {
            check_ddl: env::var(env_vars::DICTIONARY_CHECK_DDL)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            insert_implicit_ordinals: env::var(env_vars::DICTIONARY_IMPLICIT_ORDINALS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            warn_undefined_items: env::var(env_vars::DICTIONARY_WARN_UNDEFINED_ITEMS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level forwarded to the configured sink
    pub min_log_level: LogLevel,

    /// Whether to include file context in log messages
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
            include_file_context: env::var(env_vars::LOGGING_INCLUDE_FILE_CONTEXT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Errors raised while loading a runtime configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub parser: ParserPreferences,
    pub dictionary: DictionaryPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a configuration from TOML text. Missing sections keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const REQUIRE_CIF_EXTENSION: &str = "CIF_REQUIRE_CIF_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "CIF_ENABLE_PERFORMANCE_LOGGING";

    // Parser
    pub const PARSER_VERBOSE: &str = "CIF_PARSER_VERBOSE";
    pub const PARSER_CASE_INSENSITIVE: &str = "CIF_PARSER_CASE_INSENSITIVE";

    // Dictionary
    pub const DICTIONARY_CHECK_DDL: &str = "CIF_DICTIONARY_CHECK_DDL";
    pub const DICTIONARY_IMPLICIT_ORDINALS: &str = "CIF_DICTIONARY_IMPLICIT_ORDINALS";
    pub const DICTIONARY_WARN_UNDEFINED_ITEMS: &str = "CIF_DICTIONARY_WARN_UNDEFINED_ITEMS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "CIF_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "CIF_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "CIF_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "CIF_LOGGING_INCLUDE_FILE_CONTEXT";
}
