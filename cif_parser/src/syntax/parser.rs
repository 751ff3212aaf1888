//! CIF parser: drives a [`TableBuilder`] into a [`CifFile`]

use super::builder::{OpenPolicy, TableBuilder, TableSink};
use super::cursor::WorkingTable;
use super::driver::{Flow, GrammarDriver, ParserActions};
use super::error::{ParserError, ParserResult};
use super::read_def::ReadDefinition;
use super::report::ParseReport;
use crate::config::compile_time::container::UNNAMED_BLOCK_NAME;
use crate::config::runtime::{FileProcessorPreferences, ParserPreferences};
use crate::file_processor::FileProcessor;
use crate::logging::{codes, with_file_context, Diagnostics};
use crate::model::{CifFile, Table, Value};
use crate::utils::CaseSensitivity;
use crate::{log_debug, log_success};
use std::collections::HashSet;
use std::path::Path;

/// Parser state that lives outside the working table
struct CifStore<'f> {
    file: &'f mut CifFile,
    read_def: ReadDefinition,
    diagnostics: Diagnostics,
    /// Assigned name of the block receiving data
    block: Option<String>,
    block_wanted: bool,
    categories_read: HashSet<String>,
}

impl CifStore<'_> {
    fn ensure_block(&mut self, line: u32) {
        if self.block.is_some() {
            return;
        }
        if !self.read_def.wants_block(UNNAMED_BLOCK_NAME) {
            self.block = Some(UNNAMED_BLOCK_NAME.to_string());
            self.block_wanted = false;
            return;
        }
        let assigned = self.file.add_block("");
        self.diagnostics.warning(
            codes::syntax::DATA_OUTSIDE_BLOCK,
            line,
            format!("Data found before the first data_ header, stored in block {}", assigned),
        );
        self.block_wanted = true;
        self.block = Some(assigned);
    }
}

impl TableSink for CifStore<'_> {
    fn block_name(&self) -> &str {
        self.block.as_deref().unwrap_or_default()
    }

    fn case(&self) -> CaseSensitivity {
        self.file.case_sensitivity()
    }

    fn keeps(&self, category: &str) -> bool {
        self.block_wanted && self.read_def.wants_category(category)
    }

    fn detach(&mut self, block: &str, category: &str) -> Option<(usize, Table)> {
        self.file.block_mut(block)?.detach_table(category)
    }

    fn commit(&mut self, working: WorkingTable, _line: u32) -> Flow {
        if !working.keep {
            return Flow::Continue;
        }
        let Some(block) = self.file.block_mut(&working.block) else {
            return Flow::Continue;
        };

        self.categories_read
            .insert(working.category().to_ascii_lowercase());
        match working.slot {
            Some(slot) => block.write_table_at(slot, working.table),
            None => block.write_table(working.table),
        }

        if self.read_def.is_satisfied(&self.categories_read) {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

/// Parser for CIF data files.
///
/// Holds the target container mutably for its whole lifetime, so only one
/// parser can write into a given container at a time. Repeated parse calls
/// keep adding blocks to the same container.
pub struct CifParser<'f> {
    builder: TableBuilder,
    store: CifStore<'f>,
    preferences: ParserPreferences,
    file_preferences: FileProcessorPreferences,
}

impl<'f> CifParser<'f> {
    pub fn new(file: &'f mut CifFile) -> Self {
        Self::with_preferences(file, ParserPreferences::default())
    }

    pub fn with_preferences(file: &'f mut CifFile, preferences: ParserPreferences) -> Self {
        Self {
            builder: TableBuilder::new(OpenPolicy::Reopen),
            store: CifStore {
                file,
                read_def: ReadDefinition::all(),
                diagnostics: Diagnostics::new(),
                block: None,
                block_wanted: true,
                categories_read: HashSet::new(),
            },
            preferences,
            file_preferences: FileProcessorPreferences::default(),
        }
    }

    pub fn with_read_definition(mut self, read_def: ReadDefinition) -> Self {
        self.store.read_def = read_def;
        self
    }

    pub fn with_file_preferences(mut self, preferences: FileProcessorPreferences) -> Self {
        self.file_preferences = preferences;
        self
    }

    /// Parse CIF text into the target container
    pub fn parse_string(&mut self, text: &str) -> ParseReport {
        self.builder = TableBuilder::new(OpenPolicy::Reopen);
        self.store.block = None;
        self.store.block_wanted = true;
        self.store.categories_read.clear();

        let (status, metrics) = GrammarDriver::new().run(text, self);

        log_success!(
            codes::success::PARSE_COMPLETED,
            "CIF parse finished",
            "status" => status.as_str(),
            "blocks" => self.store.file.block_count(),
            "diagnostics" => self.store.diagnostics.len()
        );

        ParseReport {
            status,
            diagnostics: std::mem::take(&mut self.store.diagnostics),
            metrics,
        }
    }

    /// Read and parse a CIF file
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> ParserResult<ParseReport> {
        let path = path.as_ref();
        let processed = FileProcessor::from_preferences(&self.file_preferences)
            .process_file(&path.to_string_lossy())
            .map_err(ParserError::from_file_error)?;

        let report = with_file_context(processed.metadata.path.clone(), || {
            self.parse_string(&processed.source)
        });
        Ok(report)
    }

    fn trace(&self, callback: &str, detail: &str, line: u32) {
        if self.preferences.verbose {
            log_debug!("Parser callback",
                "callback" => callback,
                "detail" => detail,
                "line" => line
            );
        }
    }
}

impl ParserActions for CifParser<'_> {
    fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.store.diagnostics
    }

    fn process_data_block_name(&mut self, name: &str, line: u32) -> Flow {
        self.trace("data_block_name", name, line);
        if self.builder.flush(&mut self.store, line).is_stop() {
            return Flow::Stop;
        }

        if name.is_empty() {
            self.store.diagnostics.warning(
                codes::syntax::EMPTY_BLOCK_NAME,
                line,
                "Data block header without a name",
            );
        }

        if self.store.read_def.wants_block(name) {
            let assigned = self.store.file.add_block(name);
            if !name.is_empty() && assigned != name {
                self.store.diagnostics.warning(
                    codes::syntax::DUPLICATE_BLOCK,
                    line,
                    format!("Duplicate datablock name {} replaced with {}", name, assigned),
                );
            }
            self.store.block = Some(assigned);
            self.store.block_wanted = true;
        } else {
            self.store.block = Some(name.to_string());
            self.store.block_wanted = false;
        }
        Flow::Continue
    }

    fn process_loop(&mut self, line: u32) -> Flow {
        self.trace("loop", "", line);
        self.store.ensure_block(line);
        self.builder.begin_loop();
        Flow::Continue
    }

    fn process_loop_declaration(&mut self, item: &str, line: u32) -> Flow {
        self.trace("loop_declaration", item, line);
        self.builder.loop_item(item, &mut self.store, line)
    }

    fn process_item_name_list(&mut self, item: &str, line: u32) -> Flow {
        self.trace("item_name_list", item, line);
        self.builder.loop_item(item, &mut self.store, line)
    }

    fn process_value_list(&mut self, value: Value, line: u32) -> Flow {
        if self.preferences.verbose {
            self.trace("value_list", &value.to_string(), line);
        }
        self.builder.loop_value(value, &mut self.store, line)
    }

    fn process_loop_end(&mut self, line: u32) -> Flow {
        self.trace("loop_end", "", line);
        self.builder.end_loop(&mut self.store, line)
    }

    fn process_item_value_pair(&mut self, item: &str, value: Value, line: u32) -> Flow {
        self.trace("item_value_pair", item, line);
        self.store.ensure_block(line);
        self.builder.pair(item, value, &mut self.store, line)
    }

    fn process_save_begin(&mut self, name: &str, line: u32) -> Flow {
        self.trace("save_begin", name, line);
        self.store.diagnostics.warning(
            codes::syntax::UNEXPECTED_SAVE_FRAME,
            line,
            format!("Save frame save_{} outside a dictionary, frame markers ignored", name),
        );
        Flow::Continue
    }

    fn process_save_end(&mut self, line: u32) -> Flow {
        self.trace("save_end", "", line);
        Flow::Continue
    }

    fn finish(&mut self, line: u32) {
        self.trace("finish", "", line);
        self.builder.finish(&mut self.store, line);
    }
}

/// Parse CIF text into a new container
pub fn parse_cif_string(text: &str) -> (CifFile, ParseReport) {
    let mut file = CifFile::new();
    let report = CifParser::new(&mut file).parse_string(text);
    (file, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::read_def::Selection;
    use crate::syntax::report::ParseStatus;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn test_end_to_end_loop() {
        let (file, report) = parse_cif_string("data_test\nloop_\n_a.x\n_a.y\n1 2\n3 4\n");

        assert!(report.is_clean());
        assert_eq!(file.block_names().collect::<Vec<_>>(), vec!["test"]);
        let table = file.block("TEST").unwrap().table("a").unwrap();
        assert_eq!(table.columns(), &["x", "y"]);
        assert_eq!(table.row(0).unwrap(), &[text("1"), text("2")]);
        assert_eq!(table.row(1).unwrap(), &[text("3"), text("4")]);
    }

    #[test]
    fn test_sentinels_survive_parsing() {
        let (file, _) = parse_cif_string("data_s\nloop_ _a.v ? . '?' \".\"\n");
        let table = file.block("s").unwrap().table("a").unwrap();
        let values = table.column_values("v").unwrap();
        assert_eq!(
            values,
            vec![&Value::Unknown, &Value::Inapplicable, &text("?"), &text(".")]
        );
        assert_ne!(values[0], values[1]);
    }

    #[test]
    fn test_multiline_value() {
        let (file, _) = parse_cif_string("data_m\n_a.text\n;line one\nline two\n;\n");
        let table = file.block("m").unwrap().table("a").unwrap();
        assert_eq!(table.cell(0, "text"), Some(&text("line one\nline two")));
    }

    #[test]
    fn test_unterminated_text_status() {
        let (file, report) = parse_cif_string("data_m\n_a.text\n;never closed\n");
        assert_eq!(report.status, ParseStatus::UnterminatedText);
        assert!(report.diagnostics_text().contains("string not finished"));
        let table = file.block("m").unwrap().table("a").unwrap();
        assert_eq!(table.cell(0, "text"), Some(&text("never closed")));
    }

    #[test]
    fn test_pair_after_loop_amends_category() {
        let (file, report) = parse_cif_string(
            "data_d\n_cat.x 1\nloop_\n_cat.y\n_cat.z\na b\nc d\n_cat.w 2\n",
        );
        let table = file.block("d").unwrap().table("cat").unwrap();
        assert_eq!(table.columns(), &["x", "y", "z", "w"]);
        assert!(table.rows().all(|row| row[3] == text("2")));
        assert!(!report.diagnostics.has_errors());
    }

    #[test]
    fn test_duplicate_category_keeps_first_rows() {
        let (file, report) =
            parse_cif_string("data_d\nloop_ _a.x 1 2\n_b.y 0\nloop_ _a.x 3\n");
        let block = file.block("d").unwrap();
        let table = block.table("a").unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(0, "x"), Some(&text("1")));
        assert_eq!(block.table_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            report.diagnostics_text(),
            "Warning - Duplicate category name a in d at line 4"
        );
    }

    #[test]
    fn test_late_flush_goes_to_previous_block() {
        let (file, _) = parse_cif_string("data_one\n_a.x 1\ndata_two\n_b.y 2\n");
        assert!(file.block("one").unwrap().contains_table("a"));
        assert!(!file.block("two").unwrap().contains_table("a"));
        assert!(file.block("two").unwrap().contains_table("b"));
    }

    #[test]
    fn test_duplicate_and_empty_block_names() {
        let (file, report) = parse_cif_string("data_x _a.b 1 data_X _a.b 2 data_ _a.b 3");
        assert_eq!(
            file.block_names().collect::<Vec<_>>(),
            vec!["x", "X#1", "UNNAMED"]
        );
        let found: Vec<_> = report.diagnostics.entries().iter().map(|d| d.code).collect();
        assert_eq!(
            found,
            vec![codes::syntax::DUPLICATE_BLOCK, codes::syntax::EMPTY_BLOCK_NAME]
        );
    }

    #[test]
    fn test_data_before_first_block() {
        let (file, report) = parse_cif_string("_a.x 1\ndata_real\n_a.x 2\n");
        assert_eq!(file.block_names().collect::<Vec<_>>(), vec!["UNNAMED", "real"]);
        assert_eq!(
            report.diagnostics.entries()[0].code,
            codes::syntax::DATA_OUTSIDE_BLOCK
        );
    }

    #[test]
    fn test_count_mismatch_is_logged_not_fatal() {
        let (file, report) = parse_cif_string("data_d\nloop_ _a.x _a.y\n1 2 3\n_b.z 4\n");
        assert!(report.diagnostics.has_errors());
        assert_eq!(report.status, ParseStatus::Completed);
        assert_eq!(file.block("d").unwrap().table("a").unwrap().row_count(), 2);
        assert!(file.block("d").unwrap().contains_table("b"));
    }

    #[test]
    fn test_read_definition_filters_and_stops() {
        let mut file = CifFile::new();
        let report = CifParser::new(&mut file)
            .with_read_definition(
                ReadDefinition::all().with_categories(Selection::only(["cell"])),
            )
            .parse_string("data_d\n_entry.id x\n_cell.a 1\n_cell.b 2\n_symmetry.s P1\n_other.o 3\n");

        assert_eq!(report.status, ParseStatus::Stopped);
        let block = file.block("d").unwrap();
        assert_eq!(block.table_names().collect::<Vec<_>>(), vec!["cell"]);
        assert_eq!(block.table("cell").unwrap().columns(), &["a", "b"]);
    }

    #[test]
    fn test_excluded_block_is_not_stored() {
        let mut file = CifFile::new();
        CifParser::new(&mut file)
            .with_read_definition(ReadDefinition::all().with_blocks(Selection::except(["skip"])))
            .parse_string("data_skip _a.x 1 data_keep _a.x 2");
        assert_eq!(file.block_names().collect::<Vec<_>>(), vec!["keep"]);
    }

    #[test]
    fn test_excluded_unnamed_block_is_not_created() {
        let mut file = CifFile::new();
        let report = CifParser::new(&mut file)
            .with_read_definition(ReadDefinition::all().with_blocks(Selection::only(["keep"])))
            .parse_string("_a.x 1\ndata_keep _b.y 2");
        assert_eq!(file.block_names().collect::<Vec<_>>(), vec!["keep"]);
        assert!(file.block("keep").unwrap().table("b").is_some());
        assert!(report.is_clean());
    }

    #[test]
    fn test_case_insensitive_container() {
        let mut file = CifFile::with_case(CaseSensitivity::Insensitive);
        CifParser::new(&mut file).parse_string("data_d _Atom.X 1 _atom.x 2");
        let table = file.block("d").unwrap().table("ATOM").unwrap();
        assert_eq!(table.columns(), &["X"]);
        assert_eq!(table.cell(0, "x"), Some(&text("2")));
    }

    #[test]
    fn test_save_frame_in_cif_mode_warns() {
        let (file, report) = parse_cif_string("data_d save_f _a.x 1 save_");
        assert!(file.block("d").unwrap().contains_table("a"));
        assert_eq!(
            report.diagnostics.entries()[0].code,
            codes::syntax::UNEXPECTED_SAVE_FRAME
        );
    }

    #[test]
    fn test_parse_file_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.cif");
        fs::write(&path, "data_f\n_a.x 1\n").unwrap();

        let mut file = CifFile::new();
        let mut parser = CifParser::new(&mut file);
        let report = parser.parse_file(&path).unwrap();
        assert!(report.is_clean());

        let missing = parser.parse_file(dir.path().join("absent.cif"));
        assert_matches!(missing, Err(ParserError::NotFound { .. }));
        drop(parser);
        assert!(file.block("f").is_some());
    }
}
