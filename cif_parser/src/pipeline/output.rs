use super::result::{ParsedInput, PipelineResult};
use crate::logging::Diagnostic;
use crate::model::{Block, Table};
use crate::syntax::ParseReport;
use serde::Serialize;

/// Serializable summary of a pipeline run, printed by `--json`
#[derive(Debug, Serialize)]
pub struct PipelineOutput {
    pub file: String,
    pub kind: &'static str,
    pub status: &'static str,
    pub blocks: Vec<BlockSummary>,
    pub diagnostics: Vec<DiagnosticEntry>,
    pub metrics: MetricsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ddl_diagnostics: Option<Vec<DiagnosticEntry>>,
}

#[derive(Debug, Serialize)]
pub struct BlockSummary {
    pub name: String,
    pub tables: Vec<TableSummary>,
}

#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticEntry {
    pub level: &'static str,
    pub code: &'static str,
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub tokens: usize,
    pub lines: usize,
    pub comments: usize,
    pub text_fields: usize,
}

impl PipelineOutput {
    pub fn new(result: &PipelineResult) -> Self {
        let format_entries = match &result.input {
            ParsedInput::Dictionary(dic) => Some(dic.format().len()),
            ParsedInput::Cif(_) => None,
        };

        Self {
            file: result.path.display().to_string(),
            kind: result.input.kind(),
            status: result.report.status.as_str(),
            blocks: result.input.file().blocks().map(BlockSummary::from).collect(),
            diagnostics: diagnostic_entries(&result.report),
            metrics: MetricsSummary {
                tokens: result.report.metrics.total_tokens,
                lines: result.report.metrics.lines,
                comments: result.report.metrics.comments,
                text_fields: result.report.metrics.text_fields,
            },
            format_entries,
            ddl_diagnostics: result.ddl_report.as_ref().map(diagnostic_entries),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            name: block.name().to_string(),
            tables: block.tables().map(TableSummary::from).collect(),
        }
    }
}

impl From<&Table> for TableSummary {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name().to_string(),
            columns: table.columns().to_vec(),
            rows: table.row_count(),
        }
    }
}

impl From<&Diagnostic> for DiagnosticEntry {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            level: diagnostic.level.as_str(),
            code: diagnostic.code.as_str(),
            line: diagnostic.line,
            message: diagnostic.message.clone(),
        }
    }
}

fn diagnostic_entries(report: &ParseReport) -> Vec<DiagnosticEntry> {
    report
        .diagnostics
        .entries()
        .iter()
        .map(DiagnosticEntry::from)
        .collect()
}
