use crate::config::runtime::ConfigError;
use crate::logging::{codes, Code};
use crate::syntax::ParserError;

/// Pipeline processing errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Parsing failed: {0}")]
    Parsing(#[from] ParserError),

    #[error("DDL {path} could not be loaded: {source}")]
    DdlLoading {
        path: String,
        #[source]
        source: ParserError,
    },

    #[error("Configuration failed: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },
}

impl PipelineError {
    pub fn pipeline_error(message: &str) -> Self {
        Self::Pipeline {
            message: message.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            PipelineError::Parsing(e) => e.error_code(),
            PipelineError::DdlLoading { source, .. } => source.error_code(),
            PipelineError::Configuration(_) => codes::system::CONFIGURATION_ERROR,
            PipelineError::Pipeline { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    /// Short stage label used in command line summaries
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Parsing(_) => "parsing",
            PipelineError::DdlLoading { .. } => "DDL loading",
            PipelineError::Configuration(_) => "configuration",
            PipelineError::Pipeline { .. } => "pipeline",
        }
    }
}
