//! Dictionary parser: CIF grammar plus save frames and DDL checks

use super::check::{check_ddl, check_frame_name, CheckContext, TableSnapshot};
use super::ddl::DdlSchema;
use super::implicit::insert_implicit_ordinal_items;
use super::{DicFile, Frame, FrameScope};
use crate::config::compile_time::dictionary::{DEFAULT_BLOCK_NAME, UNNAMED_BLOCK_PREFIX};
use crate::config::runtime::{DictionaryPreferences, FileProcessorPreferences, ParserPreferences};
use crate::file_processor::FileProcessor;
use crate::logging::{codes, with_file_context, Diagnostics};
use crate::model::{CifFile, Table, Value};
use crate::syntax::{
    Flow, GrammarDriver, OpenPolicy, PairPolicy, ParseReport, ParserActions, ParserError, ParserResult,
    TableBuilder, TableSink, WorkingTable,
};
use crate::utils::CaseSensitivity;
use crate::{log_debug, log_success};
use std::collections::HashSet;
use std::path::Path;

/// Everything the dictionary parser keeps outside its working tables
struct DicSink<'d> {
    dic: &'d mut DicFile,
    schema: DdlSchema,
    preferences: DictionaryPreferences,
    diagnostics: Diagnostics,
    block: Option<String>,
    /// `data_` headers seen so far, for naming unnamed blocks
    data_blocks: usize,
    frame: Option<Frame>,
    seen_frames: HashSet<String>,
    /// Taken when a table is opened, consumed by the check on commit
    snapshot: TableSnapshot,
}

impl DicSink<'_> {
    fn ensure_block(&mut self, line: u32) {
        if self.block.is_some() {
            return;
        }
        let assigned = self.dic.file.add_block(DEFAULT_BLOCK_NAME);
        self.diagnostics.warning(
            codes::syntax::DATA_OUTSIDE_BLOCK,
            line,
            format!("Data found before the first data_ header, stored in block {}", assigned),
        );
        self.block = Some(assigned);
    }

    fn scope(&self) -> FrameScope {
        self.frame.as_ref().map_or(FrameScope::Data, Frame::scope)
    }
}

impl TableSink for DicSink<'_> {
    fn block_name(&self) -> &str {
        self.block.as_deref().unwrap_or(DEFAULT_BLOCK_NAME)
    }

    fn case(&self) -> CaseSensitivity {
        self.dic.file.case_sensitivity()
    }

    fn keeps(&self, _category: &str) -> bool {
        true
    }

    fn detach(&mut self, block: &str, category: &str) -> Option<(usize, Table)> {
        self.dic.file.block_mut(block)?.detach_table(category)
    }

    fn opened(&mut self, working: &WorkingTable, line: u32) {
        self.snapshot = match self.frame {
            Some(_) => TableSnapshot::empty(),
            None => TableSnapshot::of(&working.table),
        };

        if let Some(frame) = self.frame.as_mut() {
            if !frame.enter_category(working.category()) {
                self.diagnostics.warning(
                    codes::dictionary::DUPLICATE_FRAME_CATEGORY,
                    line,
                    format!(
                        "Duplicate category {} in save frame {}",
                        working.category(),
                        frame.name()
                    ),
                );
            }
        }
    }

    fn commit(&mut self, working: WorkingTable, line: u32) -> Flow {
        let WorkingTable {
            mut table,
            block,
            slot,
            ..
        } = working;
        let category = table.name().to_string();

        if self.preferences.check_ddl {
            if let Some(frame) = &self.frame {
                check_frame_name(&table, frame, line, &mut self.diagnostics);
            }
            let ctx = CheckContext {
                block: &block,
                frame: self.frame.as_ref(),
                line,
                warn_undefined_items: self.preferences.warn_undefined_items,
            };
            check_ddl(&mut table, &self.snapshot, &self.schema, &ctx, &mut self.diagnostics);
        }

        let scope = self.scope();
        self.dic.format.record(&block, scope, &category);

        let Some(target) = self.dic.file.block_mut(&block) else {
            return Flow::Continue;
        };
        if scope == FrameScope::Data {
            match slot {
                Some(slot) => target.write_table_at(slot, table),
                None => target.write_table(table),
            }
        } else {
            // Frame tables accumulate into the block's table of the same category
            match target.detach_table(&category) {
                Some((slot, mut persisted)) => {
                    persisted.append_table(&table);
                    target.write_table_at(slot, persisted);
                }
                None => target.write_table(table),
            }
        }
        Flow::Continue
    }

    fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

/// Data-scope pairs on a category the save frames already filled get a
/// row of their own rather than overwriting every frame's row
fn main_builder() -> TableBuilder {
    TableBuilder::new(OpenPolicy::Reopen).with_pair_policy(PairPolicy::NewRow)
}

/// Parser for DDL dictionaries.
///
/// Data-block items are built on one track and save-frame items on a
/// second, each with its own builder. Every table written is checked
/// against the DDL given at construction when
/// [`DictionaryPreferences::check_ddl`] is set.
pub struct DicParser<'d> {
    main: TableBuilder,
    save: TableBuilder,
    sink: DicSink<'d>,
    preferences: ParserPreferences,
    file_preferences: FileProcessorPreferences,
}

impl<'d> DicParser<'d> {
    pub fn new(dic: &'d mut DicFile, ddl: &CifFile) -> ParserResult<Self> {
        Self::with_preferences(
            dic,
            ddl,
            ParserPreferences::default(),
            DictionaryPreferences::default(),
        )
    }

    pub fn with_preferences(
        dic: &'d mut DicFile,
        ddl: &CifFile,
        preferences: ParserPreferences,
        dictionary_preferences: DictionaryPreferences,
    ) -> ParserResult<Self> {
        let schema = DdlSchema::from_ddl(ddl)?;
        Ok(Self {
            main: main_builder(),
            save: TableBuilder::new(OpenPolicy::Fresh),
            sink: DicSink {
                dic,
                schema,
                preferences: dictionary_preferences,
                diagnostics: Diagnostics::new(),
                block: None,
                data_blocks: 0,
                frame: None,
                seen_frames: HashSet::new(),
                snapshot: TableSnapshot::empty(),
            },
            preferences,
            file_preferences: FileProcessorPreferences::default(),
        })
    }

    pub fn with_file_preferences(mut self, preferences: FileProcessorPreferences) -> Self {
        self.file_preferences = preferences;
        self
    }

    pub fn schema(&self) -> &DdlSchema {
        &self.sink.schema
    }

    /// Parse dictionary text, then number implicit ordinals if configured
    pub fn parse_string(&mut self, text: &str) -> ParseReport {
        self.main = main_builder();
        self.save = TableBuilder::new(OpenPolicy::Fresh);
        self.sink.block = None;
        self.sink.data_blocks = 0;
        self.sink.frame = None;
        self.sink.seen_frames.clear();
        self.sink.snapshot = TableSnapshot::empty();

        let (status, metrics) = GrammarDriver::new().run(text, self);

        if self.sink.preferences.insert_implicit_ordinals {
            insert_implicit_ordinal_items(self.sink.dic, &self.sink.schema);
        }

        log_success!(
            codes::success::DICTIONARY_PARSE_COMPLETED,
            "Dictionary parse finished",
            "status" => status.as_str(),
            "frames" => self.sink.seen_frames.len(),
            "formats" => self.sink.dic.format.len(),
            "diagnostics" => self.sink.diagnostics.len()
        );

        ParseReport {
            status,
            diagnostics: std::mem::take(&mut self.sink.diagnostics),
            metrics,
        }
    }

    /// Read and parse a dictionary file
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

    /// The builder for the current scope, with the sink it writes to
    fn split(&mut self) -> (&mut TableBuilder, &mut DicSink<'d>) {
        let builder = if self.sink.frame.is_some() {
            &mut self.save
        } else {
            &mut self.main
        };
        (builder, &mut self.sink)
    }

    fn close_frame(&mut self, line: u32) -> Flow {
        let flow = self.save.flush(&mut self.sink, line);
        self.sink.frame = None;
        self.sink.snapshot = TableSnapshot::empty();
        flow
    }

    /// Close a frame that was never terminated with `save_`
    fn close_unbalanced_frame(&mut self, line: u32, at: &str) -> Flow {
        let Some(frame) = &self.sink.frame else {
            return Flow::Continue;
        };
        let message = format!(
            "Save frame save_{} (opened at line {}) not closed before {}",
            frame.name(),
            frame.line(),
            at
        );
        self.sink
            .diagnostics
            .warning(codes::dictionary::UNBALANCED_SAVE_FRAME, line, message);
        self.close_frame(line)
    }

    fn trace(&self, callback: &str, detail: &str, line: u32) {
        if self.preferences.verbose {
            log_debug!("Dictionary parser callback",
                "callback" => callback,
                "detail" => detail,
                "scope" => self.sink.scope().as_str(),
                "line" => line
            );
        }
    }
}

impl ParserActions for DicParser<'_> {
    fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.sink.diagnostics
    }

    fn process_data_block_name(&mut self, name: &str, line: u32) -> Flow {
        self.trace("data_block_name", name, line);
        let flow = self
            .close_unbalanced_frame(line, &format!("data_{}", name))
            .and(self.main.flush(&mut self.sink, line));

        self.sink.data_blocks += 1;
        let requested = if name.is_empty() {
            self.sink.diagnostics.warning(
                codes::syntax::EMPTY_BLOCK_NAME,
                line,
                "Data block header without a name",
            );
            format!("{}-{}", UNNAMED_BLOCK_PREFIX, self.sink.data_blocks)
        } else {
            name.to_string()
        };

        let assigned = self.sink.dic.file.add_block(&requested);
        if assigned != requested {
            self.sink.diagnostics.warning(
                codes::syntax::DUPLICATE_BLOCK,
                line,
                format!("Duplicate datablock name {} replaced with {}", requested, assigned),
            );
        }
        self.sink.block = Some(assigned);
        flow
    }

    fn process_loop(&mut self, line: u32) -> Flow {
        self.trace("loop", "", line);
        self.sink.ensure_block(line);
        let (builder, _) = self.split();
        builder.begin_loop();
        Flow::Continue
    }

    fn process_loop_declaration(&mut self, item: &str, line: u32) -> Flow {
        self.trace("loop_declaration", item, line);
        let (builder, sink) = self.split();
        builder.loop_item(item, sink, line)
    }

    fn process_item_name_list(&mut self, item: &str, line: u32) -> Flow {
        self.trace("item_name_list", item, line);
        let (builder, sink) = self.split();
        builder.loop_item(item, sink, line)
    }

    fn process_value_list(&mut self, value: Value, line: u32) -> Flow {
        if self.preferences.verbose {
            self.trace("value_list", &value.to_string(), line);
        }
        let (builder, sink) = self.split();
        builder.loop_value(value, sink, line)
    }

    fn process_loop_end(&mut self, line: u32) -> Flow {
        self.trace("loop_end", "", line);
        let (builder, sink) = self.split();
        builder.end_loop(sink, line)
    }

    fn process_item_value_pair(&mut self, item: &str, value: Value, line: u32) -> Flow {
        self.trace("item_value_pair", item, line);
        self.sink.ensure_block(line);
        let (builder, sink) = self.split();
        builder.pair(item, value, sink, line)
    }

    fn process_save_begin(&mut self, name: &str, line: u32) -> Flow {
        self.trace("save_begin", name, line);
        self.sink.ensure_block(line);
        let flow = self
            .close_unbalanced_frame(line, &format!("save_{}", name))
            .and(self.main.flush(&mut self.sink, line));

        if !self.sink.seen_frames.insert(name.to_string()) {
            self.sink.diagnostics.info(
                codes::dictionary::DUPLICATE_SAVE_FRAME,
                line,
                format!("Duplicate save frame \"{}\"", name),
            );
        }

        self.save = TableBuilder::new(OpenPolicy::Fresh);
        self.sink.frame = Some(Frame::new(name, line));
        self.sink.snapshot = TableSnapshot::empty();
        flow
    }

    fn process_save_end(&mut self, line: u32) -> Flow {
        self.trace("save_end", "", line);
        if self.sink.frame.is_none() {
            self.sink.diagnostics.warning(
                codes::dictionary::UNBALANCED_SAVE_FRAME,
                line,
                "save_ terminator without an open save frame",
            );
            return Flow::Continue;
        }
        self.close_frame(line)
    }

    fn finish(&mut self, line: u32) {
        self.trace("finish", "", line);
        self.close_unbalanced_frame(line, "end of input");
        self.main.finish(&mut self.sink, line);
    }
}

/// Parse dictionary text against a DDL into a new container
pub fn parse_dictionary_string(text: &str, ddl: &CifFile) -> ParserResult<(DicFile, ParseReport)> {
    let mut dic = DicFile::new();
    let report = DicParser::new(&mut dic, ddl)?.parse_string(text);
    Ok((dic, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::ddl::tests::MINI_DDL;
    use crate::syntax::{parse_cif_string, ParseStatus};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const MINI_DIC: &str = "\
data_mini_dic
_dictionary.version 1.0

save_entity
_category.mandatory_code no
_category.description 'Things in the model'
save_

save_entity_poly
_category.description 'Polymer entities'
save_

save__entity.id
_item.mandatory_code yes
save_

save__entity.type
loop_
_item.name
_item.category_id
_item.mandatory_code
'_entity.type' entity no
save_

loop_
_entity_poly.entity_id
A
B
";

    fn ddl() -> CifFile {
        parse_cif_string(MINI_DDL).0
    }

    fn parse(text: &str) -> (DicFile, ParseReport) {
        parse_dictionary_string(text, &ddl()).unwrap()
    }

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn test_dictionary_end_to_end() {
        let (dic, report) = parse(MINI_DIC);
        assert!(report.is_clean(), "{}", report.diagnostics_text());
        assert_eq!(report.status, ParseStatus::Completed);

        let block = dic.first_block().unwrap();
        assert_eq!(block.name(), "mini_dic");
        assert_eq!(
            block.table_names().collect::<Vec<_>>(),
            vec!["dictionary", "category", "item", "entity_poly"]
        );

        let dictionary = block.table("dictionary").unwrap();
        assert_eq!(dictionary.cell(0, "title"), Some(&text("mini_dic")));
    }

    #[test]
    fn test_category_frames_backfill_implicit_id_only() {
        let (dic, _) = parse(MINI_DIC);
        let category = dic.first_block().unwrap().table("category").unwrap();

        assert_eq!(category.row_count(), 2);
        assert_eq!(category.cell(0, "id"), Some(&text("entity")));
        assert_eq!(category.cell(1, "id"), Some(&text("entity_poly")));
        // mandatory_code is not implicit, so the second frame leaves it unset
        assert_eq!(category.cell(1, "mandatory_code"), Some(&Value::Unknown));
    }

    #[test]
    fn test_item_frames_fill_name_and_category() {
        let (dic, _) = parse(MINI_DIC);
        let item = dic.first_block().unwrap().table("item").unwrap();

        assert_eq!(item.row_count(), 2);
        assert_eq!(item.cell(0, "name"), Some(&text("_entity.id")));
        assert_eq!(item.cell(0, "category_id"), Some(&text("entity")));
        assert_eq!(item.cell(0, "mandatory_code"), Some(&text("yes")));
        assert_eq!(item.cell(1, "name"), Some(&text("_entity.type")));
        assert_eq!(item.cell(1, "mandatory_code"), Some(&text("no")));
    }

    #[test]
    fn test_implicit_ordinals_after_parse() {
        let (dic, _) = parse(MINI_DIC);
        let poly = dic.first_block().unwrap().table("entity_poly").unwrap();
        assert_eq!(poly.cell(0, "ordinal"), Some(&text("1")));
        assert_eq!(poly.cell(1, "ordinal"), Some(&text("2")));
    }

    #[test]
    fn test_ordinals_skipped_when_disabled() {
        let ddl = ddl();
        let mut dic = DicFile::new();
        let prefs = DictionaryPreferences {
            check_ddl: true,
            insert_implicit_ordinals: false,
            warn_undefined_items: true,
        };
        DicParser::with_preferences(&mut dic, &ddl, ParserPreferences::default(), prefs)
            .unwrap()
            .parse_string(MINI_DIC);

        let poly = dic.first_block().unwrap().table("entity_poly").unwrap();
        assert!(!poly.has_column("ordinal"));
    }

    #[test]
    fn test_format_registry() {
        let (dic, _) = parse(MINI_DIC);
        let format = dic.format();
        assert_eq!(format.len(), 4);
        assert!(format.contains("mini_dic", FrameScope::Data, "dictionary"));
        assert!(format.contains("mini_dic", FrameScope::Category, "category"));
        assert!(format.contains("mini_dic", FrameScope::Item, "item"));
        assert!(format.contains("mini_dic", FrameScope::Data, "entity_poly"));
    }

    #[test]
    fn test_undefined_category_and_item() {
        let (dic, report) = parse(
            "data_d\nsave_bogus\n_bogus.x 1\nsave_\nsave_entity\n_category.colour red\nsave_\n",
        );
        let found: Vec<_> = report.diagnostics.entries().iter().map(|d| d.code).collect();
        assert_eq!(
            found,
            vec![
                codes::dictionary::UNDEFINED_CATEGORY,
                codes::dictionary::UNDEFINED_ITEM
            ]
        );
        assert!(report.diagnostics_text().contains("Category bogus isn't defined"));
        assert!(dic.first_block().unwrap().contains_table("bogus"));
    }

    #[test]
    fn test_duplicate_save_frame_is_info() {
        let (_, report) = parse(
            "data_d\nsave_entity\n_category.description a\nsave_\nsave_entity\n_category.description b\nsave_\n",
        );
        let entries = report.diagnostics.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, codes::dictionary::DUPLICATE_SAVE_FRAME);
        assert_eq!(
            report.diagnostics_text(),
            "INFO - Duplicate save frame \"entity\" at line 5"
        );
    }

    #[test]
    fn test_unbalanced_frames() {
        let (dic, report) = parse(
            "data_one\nsave_entity\n_category.description a\ndata_two\nsave_\n_dictionary.version 2\nsave_entity_poly",
        );
        let unbalanced: Vec<u32> = report
            .diagnostics
            .with_code(codes::dictionary::UNBALANCED_SAVE_FRAME)
            .map(|d| d.line)
            .collect();
        assert_eq!(unbalanced, vec![4, 5, 7]);

        let one = dic.file().block("one").unwrap();
        assert_eq!(one.table("category").unwrap().cell(0, "id"), Some(&text("entity")));
        assert!(dic.file().block("two").unwrap().contains_table("dictionary"));
    }

    #[test]
    fn test_duplicate_category_in_frame() {
        let (dic, report) = parse(
            "data_d\nsave_entity\n_category.description a\n_item.name '_entity.id'\n_category.mandatory_code no\nsave_\n",
        );
        assert_eq!(
            report
                .diagnostics
                .with_code(codes::dictionary::DUPLICATE_FRAME_CATEGORY)
                .count(),
            1
        );
        // The re-entry after the item category is kept as a row of its own
        let category = dic.first_block().unwrap().table("category").unwrap();
        assert_eq!(category.row_count(), 2);
        assert_eq!(category.cell(0, "description"), Some(&text("a")));
        assert_eq!(category.cell(1, "mandatory_code"), Some(&text("no")));
    }

    #[test]
    fn test_data_pair_after_frames_adds_row() {
        let (dic, report) = parse(
            "data_d
save_a
_category.description x
save_
save_b
_category.description y
save_
_category.description z
",
        );
        let category = dic.first_block().unwrap().table("category").unwrap();
        assert_eq!(category.row_count(), 3);
        assert_eq!(
            category.column_values("description").unwrap(),
            vec![&text("x"), &text("y"), &text("z")]
        );
        assert_eq!(category.cell(0, "id"), Some(&text("a")));
        assert_eq!(category.cell(1, "id"), Some(&text("b")));
        assert_eq!(
            report
                .diagnostics
                .with_code(codes::syntax::DUPLICATE_CATEGORY)
                .count(),
            1
        );
    }

    #[test]
    fn test_frame_name_mismatch_reported() {
        let (_, report) = parse("data_d\nsave__entity.id\n_item.name '_entity.type'\nsave_\n");
        assert_eq!(
            report.diagnostics.entries()[0].code,
            codes::dictionary::SAVE_FRAME_NAME_MISMATCH
        );
    }

    #[test]
    fn test_block_naming() {
        let (dic, report) = parse("_dictionary.version 0\ndata_\n_dictionary.version 1\ndata_x\ndata_X\n");
        assert_eq!(
            dic.file().block_names().collect::<Vec<_>>(),
            vec!["MISSING_DIC", "UNNAMED-1", "x", "X#1"]
        );
        let found: Vec<_> = report.diagnostics.entries().iter().map(|d| d.code).collect();
        assert_eq!(
            found,
            vec![
                codes::syntax::DATA_OUTSIDE_BLOCK,
                codes::syntax::EMPTY_BLOCK_NAME,
                codes::syntax::DUPLICATE_BLOCK
            ]
        );
    }

    #[test]
    fn test_missing_ddl_tables() {
        let (ddl, _) = parse_cif_string("data_ddl\n_category.id x\n");
        let mut dic = DicFile::new();
        assert_matches!(
            DicParser::new(&mut dic, &ddl).err(),
            Some(ParserError::MissingDdlTable { .. })
        );
    }

    #[test]
    fn test_parse_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.dic");
        fs::write(&path, MINI_DIC).unwrap();

        let ddl = ddl();
        let mut dic = DicFile::new();
        let mut parser = DicParser::new(&mut dic, &ddl).unwrap();
        let report = parser.parse_file(&path).unwrap();
        assert!(report.is_clean());
        assert_matches!(
            parser.parse_file(dir.path().join("absent.dic")),
            Err(ParserError::NotFound { .. })
        );
    }
}
