use crate::dictionary::DicFile;
use crate::model::CifFile;
use crate::syntax::{ParseReport, ParseStatus};
use std::path::PathBuf;
use std::time::Duration;

/// What was parsed
#[derive(Debug)]
pub enum ParsedInput {
    Cif(CifFile),
    Dictionary(DicFile),
}

impl ParsedInput {
    pub fn file(&self) -> &CifFile {
        match self {
            ParsedInput::Cif(file) => file,
            ParsedInput::Dictionary(dic) => dic.file(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParsedInput::Cif(_) => "cif",
            ParsedInput::Dictionary(_) => "dictionary",
        }
    }
}

/// Parsed container plus the reports of every parse that produced it
#[derive(Debug)]
pub struct PipelineResult {
    pub path: PathBuf,
    pub input: ParsedInput,
    pub report: ParseReport,
    /// Report of the DDL parse when a dictionary was processed
    pub ddl_report: Option<ParseReport>,
    pub processing_duration: Duration,
}

impl PipelineResult {
    pub fn status(&self) -> ParseStatus {
        self.report.status
    }

    /// Process exit code: non-zero when any parse ended in an unterminated text field
    pub fn exit_code(&self) -> i32 {
        let ddl = self.ddl_report.as_ref().map_or(0, |r| r.status.exit_code());
        self.report.status.exit_code().max(ddl)
    }

    pub fn total_tables(&self) -> usize {
        self.input.file().blocks().map(|b| b.table_count()).sum()
    }

    pub fn log_success(&self) {
        crate::log_success!(
            crate::logging::codes::success::PIPELINE_COMPLETED,
            "CIF processing pipeline finished",
            "file" => self.path.display(),
            "kind" => self.input.kind(),
            "status" => self.report.status.as_str(),
            "blocks" => self.input.file().block_count(),
            "tables" => self.total_tables(),
            "diagnostics" => self.report.diagnostics.len(),
            "duration_ms" => format!("{:.2}", self.processing_duration.as_secs_f64() * 1000.0)
        );
    }
}
