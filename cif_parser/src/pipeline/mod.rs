//! File-level orchestration used by the command line binary
//!
//! A plain CIF file goes through [`CifParser`]. A dictionary is read in two
//! steps: its DDL is parsed as a plain CIF file first, then the dictionary
//! itself goes through [`DicParser`] against that DDL.

mod error;
pub mod output;
mod result;
mod validation;

pub use error::PipelineError;
pub use output::PipelineOutput;
pub use result::{ParsedInput, PipelineResult};
pub use validation::validate_pipeline;

use crate::config::runtime::RuntimeConfig;
use crate::dictionary::{DicFile, DicParser};
use crate::model::CifFile;
use crate::syntax::{CifParser, ReadDefinition, Selection};
use crate::utils::CaseSensitivity;
use crate::{log_info, log_warning};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Per-run choices layered over the runtime configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// DDL to check the input against; when set the input is a dictionary
    pub ddl: Option<PathBuf>,
    /// Only store these categories (plain CIF input only)
    pub categories: Vec<String>,
    pub case_insensitive: bool,
    pub verbose: bool,
}

impl PipelineOptions {
    fn apply(&self, config: &RuntimeConfig) -> RuntimeConfig {
        let mut config = config.clone();
        if self.case_insensitive {
            config.parser.case_sensitivity = CaseSensitivity::Insensitive;
        }
        if self.verbose {
            config.parser.verbose = true;
        }
        config
    }

    fn read_definition(&self) -> ReadDefinition {
        if self.categories.is_empty() {
            ReadDefinition::all()
        } else {
            ReadDefinition::all().with_categories(Selection::only(&self.categories))
        }
    }
}

/// Process a file with the runtime preferences read from the environment
pub fn process_file(file_path: impl AsRef<Path>) -> Result<PipelineResult, PipelineError> {
    process_file_with_options(file_path, &RuntimeConfig::default(), &PipelineOptions::default())
}

/// Process a file with explicit configuration and options
pub fn process_file_with_options(
    file_path: impl AsRef<Path>,
    config: &RuntimeConfig,
    options: &PipelineOptions,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();
    let path = file_path.as_ref().to_path_buf();
    let config = options.apply(config);

    log_info!("Starting CIF processing pipeline",
        "file" => path.display(),
        "dictionary" => options.ddl.is_some(),
        "case" => format!("{:?}", config.parser.case_sensitivity)
    );

    let (input, report, ddl_report) = match &options.ddl {
        Some(ddl_path) => {
            let (ddl, ddl_report) = load_ddl(ddl_path, &config)?;
            if !options.categories.is_empty() {
                log_warning!("Category selection is ignored for dictionaries",
                    "categories" => options.categories.len()
                );
            }

            let mut dic = DicFile::with_case(config.parser.case_sensitivity);
            let report = {
                let mut parser = DicParser::with_preferences(
                    &mut dic,
                    &ddl,
                    config.parser.clone(),
                    config.dictionary.clone(),
                )
                .map_err(|source| PipelineError::DdlLoading {
                    path: ddl_path.display().to_string(),
                    source,
                })?
                .with_file_preferences(config.file_processor.clone());
                parser.parse_file(&path)?
            };
            (ParsedInput::Dictionary(dic), report, Some(ddl_report))
        }
        None => {
            let mut file = CifFile::with_case(config.parser.case_sensitivity);
            let report = CifParser::with_preferences(&mut file, config.parser.clone())
                .with_read_definition(options.read_definition())
                .with_file_preferences(config.file_processor.clone())
                .parse_file(&path)?;
            (ParsedInput::Cif(file), report, None)
        }
    };

    let result = PipelineResult {
        path,
        input,
        report,
        ddl_report,
        processing_duration: start_time.elapsed(),
    };
    result.log_success();
    Ok(result)
}

fn load_ddl(
    ddl_path: &Path,
    config: &RuntimeConfig,
) -> Result<(CifFile, crate::syntax::ParseReport), PipelineError> {
    let mut ddl = CifFile::with_case(config.parser.case_sensitivity);
    let report = CifParser::with_preferences(&mut ddl, config.parser.clone())
        .with_file_preferences(config.file_processor.clone())
        .parse_file(ddl_path)
        .map_err(|source| PipelineError::DdlLoading {
            path: ddl_path.display().to_string(),
            source,
        })?;
    Ok((ddl, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ParseStatus, ParserError};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const DDL: &str = "\
data_tiny_ddl
loop_
_category.id
category
item
loop_
_item.name
_item.category_id
_item.mandatory_code
'_category.id'          category implicit
'_item.name'            item     implicit
'_item.category_id'     item     implicit
";

    const DIC: &str = "\
data_tiny_dic
save_thing
_category.id thing
save_
save__thing.id
_item.mandatory_code yes
save_
";

    #[test]
    fn test_validate_pipeline() {
        assert!(validate_pipeline().is_ok());
    }

    #[test]
    fn test_pipeline_error_creation() {
        let error = PipelineError::pipeline_error("Test error");
        assert_matches!(error, PipelineError::Pipeline { ref message } if message == "Test error");
        assert_eq!(error.stage(), "pipeline");
    }

    #[test]
    fn test_process_cif_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.cif");
        fs::write(&path, "data_x\n_a.b 1\n_a.c 2\nloop_\n_d.e\n1\n2\n").unwrap();

        let result = process_file(&path).unwrap();
        assert_eq!(result.input.kind(), "cif");
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.total_tables(), 2);
        assert!(result.ddl_report.is_none());

        let output = PipelineOutput::new(&result);
        assert_eq!(output.blocks.len(), 1);
        assert_eq!(output.blocks[0].name, "x");
        assert_eq!(output.blocks[0].tables[1].rows, 2);
        let json = output.to_json().unwrap();
        assert!(json.contains("\"kind\": \"cif\""));
    }

    #[test]
    fn test_category_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.cif");
        fs::write(&path, "data_x\n_a.b 1\nloop_\n_d.e\n1\n2\n").unwrap();

        let options = PipelineOptions {
            categories: vec!["D".to_string()],
            ..PipelineOptions::default()
        };
        let result = process_file_with_options(&path, &RuntimeConfig::default(), &options).unwrap();
        let block = result.input.file().first_block().unwrap();
        assert!(block.table("d").is_some());
        assert!(block.table("a").is_none());
    }

    #[test]
    fn test_unterminated_text_sets_exit_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.cif");
        fs::write(&path, "data_x\n_a.b\n;never closed\n").unwrap();

        let result = process_file(&path).unwrap();
        assert_eq!(result.status(), ParseStatus::UnterminatedText);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_process_dictionary() {
        let dir = tempdir().unwrap();
        let ddl_path = dir.path().join("tiny.ddl");
        let dic_path = dir.path().join("tiny.dic");
        fs::write(&ddl_path, DDL).unwrap();
        fs::write(&dic_path, DIC).unwrap();

        let options = PipelineOptions {
            ddl: Some(ddl_path),
            ..PipelineOptions::default()
        };
        let result =
            process_file_with_options(&dic_path, &RuntimeConfig::default(), &options).unwrap();

        assert_eq!(result.input.kind(), "dictionary");
        assert!(result.ddl_report.as_ref().is_some_and(|r| r.is_clean()));
        let block = result.input.file().block("tiny_dic").unwrap();
        assert!(block.table("category").is_some());
        assert_eq!(
            block.table("item").unwrap().cell(0, "name").and_then(|v| v.as_str()),
            Some("_thing.id")
        );

        let output = PipelineOutput::new(&result);
        assert!(output.format_entries.is_some_and(|n| n >= 2));
    }

    #[test]
    fn test_missing_input_and_ddl() {
        let dir = tempdir().unwrap();
        assert_matches!(
            process_file(dir.path().join("absent.cif")),
            Err(PipelineError::Parsing(ParserError::NotFound { .. }))
        );

        let dic_path = dir.path().join("tiny.dic");
        fs::write(&dic_path, DIC).unwrap();
        let options = PipelineOptions {
            ddl: Some(dir.path().join("absent.ddl")),
            ..PipelineOptions::default()
        };
        let error =
            process_file_with_options(&dic_path, &RuntimeConfig::default(), &options).unwrap_err();
        assert_matches!(error, PipelineError::DdlLoading { .. });
        assert_eq!(error.stage(), "DDL loading");
    }

    #[test]
    fn test_ddl_without_item_table() {
        let dir = tempdir().unwrap();
        let ddl_path = dir.path().join("bad.ddl");
        let dic_path = dir.path().join("tiny.dic");
        fs::write(&ddl_path, "data_bad\n_category.id x\n").unwrap();
        fs::write(&dic_path, DIC).unwrap();

        let options = PipelineOptions {
            ddl: Some(ddl_path),
            ..PipelineOptions::default()
        };
        assert_matches!(
            process_file_with_options(&dic_path, &RuntimeConfig::default(), &options),
            Err(PipelineError::DdlLoading {
                source: ParserError::MissingDdlTable { .. },
                ..
            })
        );
    }
}
