//! Table building shared by the CIF and dictionary parsers
//!
//! A [`TableBuilder`] owns one working table and the loop cursor that
//! feeds it. Everything outside that table (the container, the current
//! block, the diagnostics log) is reached through a [`TableSink`].

use super::cursor::{LoopCursor, WorkingTable};
use super::driver::Flow;
use crate::logging::{codes, Diagnostics};
use crate::model::{Table, Value};
use crate::utils::CaseSensitivity;

/// Split `_category.item` at the first `.`.
///
/// Returns `None` when either part would be empty.
pub fn split_item_name(name: &str) -> Option<(&str, &str)> {
    let body = name.strip_prefix('_').unwrap_or(name);
    let (category, item) = body.split_once('.')?;
    if category.is_empty() || item.is_empty() {
        None
    } else {
        Some((category, item))
    }
}

/// What a builder needs from its owning parser
pub trait TableSink {
    /// Block that newly opened tables belong to
    fn block_name(&self) -> &str;

    fn case(&self) -> CaseSensitivity;

    /// Whether tables of `category` are stored at all
    fn keeps(&self, category: &str) -> bool;

    /// Take a persisted table out of its block for further appending
    fn detach(&mut self, block: &str, category: &str) -> Option<(usize, Table)>;

    /// Called right after a working table is opened
    fn opened(&mut self, _working: &WorkingTable, _line: u32) {}

    /// Hand a finished working table back for storage
    fn commit(&mut self, working: WorkingTable, line: u32) -> Flow;

    fn diagnostics(&mut self) -> &mut Diagnostics;
}

/// How a builder opens a category that may already be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenPolicy {
    /// Detach the stored table and append to it, with a duplicate warning
    Reopen,
    /// Always start an empty table; the sink merges it on commit
    Fresh,
}

/// Where a bare pair writes when it reopens a stored table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPolicy {
    /// Into every existing row of the column
    Broadcast,
    /// Into one new row appended for this run of pairs
    NewRow,
}

#[derive(Debug)]
pub struct TableBuilder {
    policy: OpenPolicy,
    pair_policy: PairPolicy,
    /// Row that pairs write to after a [`PairPolicy::NewRow`] reopen
    pair_row: Option<usize>,
    working: Option<WorkingTable>,
    cursor: LoopCursor,
    /// A table is bound to the loop header being read
    loop_bound: bool,
    /// The working table was last filled by a loop that has ended
    from_loop: bool,
}

impl TableBuilder {
    pub fn new(policy: OpenPolicy) -> Self {
        Self {
            policy,
            pair_policy: PairPolicy::Broadcast,
            pair_row: None,
            working: None,
            cursor: LoopCursor::new(),
            loop_bound: false,
            from_loop: false,
        }
    }

    pub fn with_pair_policy(mut self, pair_policy: PairPolicy) -> Self {
        self.pair_policy = pair_policy;
        self
    }

    pub fn working(&self) -> Option<&WorkingTable> {
        self.working.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.working.is_some()
    }

    /// Commit the working table, if any
    pub fn flush<S: TableSink>(&mut self, sink: &mut S, line: u32) -> Flow {
        self.from_loop = false;
        self.loop_bound = false;
        self.pair_row = None;
        match self.working.take() {
            Some(working) => sink.commit(working, line),
            None => Flow::Continue,
        }
    }

    fn open<S: TableSink>(&mut self, category: &str, sink: &mut S, line: u32) -> Flow {
        let flow = self.flush(sink, line);

        let block = sink.block_name().to_string();
        let keep = sink.keeps(category);
        let existing = match self.policy {
            OpenPolicy::Reopen => sink.detach(&block, category),
            OpenPolicy::Fresh => None,
        };

        let working = match existing {
            Some((slot, table)) => {
                sink.diagnostics().warning(
                    codes::syntax::DUPLICATE_CATEGORY,
                    line,
                    format!("Duplicate category name {} in {}", category, block),
                );
                WorkingTable::reopened(table, block, slot, keep)
            }
            None => WorkingTable::new(Table::with_case(category, sink.case()), block, keep),
        };

        sink.opened(&working, line);
        self.working = Some(working);
        flow
    }

    // ========================================================================
    // LOOPS
    // ========================================================================

    pub fn begin_loop(&mut self) {
        self.pair_row = None;
        self.cursor.reset();
        self.loop_bound = false;
    }

    /// One item name of a loop header. The first valid name opens the
    /// loop's table; later names must share its category.
    pub fn loop_item<S: TableSink>(&mut self, item: &str, sink: &mut S, line: u32) -> Flow {
        let Some((category, column)) = split_item_name(item) else {
            sink.diagnostics().warning(
                codes::syntax::INVALID_ITEM_NAME,
                line,
                format!("Invalid item name {}", item),
            );
            self.cursor.push_field(None);
            return Flow::Continue;
        };

        let mut flow = Flow::Continue;
        if !self.loop_bound {
            flow = self.open(category, sink, line);
            self.loop_bound = true;
        }

        let Some(working) = self.working.as_mut() else {
            return flow;
        };

        if !sink.case().matches(working.category(), category) {
            sink.diagnostics().warning(
                codes::syntax::CATEGORY_MISMATCH,
                line,
                format!(
                    "Item name {} does not belong to loop category {}",
                    item,
                    working.category()
                ),
            );
            self.cursor.push_field(None);
            return flow;
        }

        let col = working.table.ensure_column(column);
        if self.cursor.has_column(col) {
            sink.diagnostics().warning(
                codes::syntax::DUPLICATE_ITEM,
                line,
                format!("Duplicate item name {} in loop", item),
            );
            self.cursor.push_field(None);
        } else {
            self.cursor.push_field(Some(col));
        }
        flow
    }

    pub fn loop_value<S: TableSink>(&mut self, value: Value, sink: &mut S, line: u32) -> Flow {
        if !self.loop_bound {
            return Flow::Continue;
        }
        if let Some(working) = self.working.as_mut() {
            if let Err(e) = self.cursor.place(&mut working.table, value) {
                sink.diagnostics().error(e.error_code(), line, e.to_string());
            }
        }
        Flow::Continue
    }

    pub fn end_loop<S: TableSink>(&mut self, sink: &mut S, line: u32) -> Flow {
        if self.loop_bound && self.cursor.value_no() != 0 {
            sink.diagnostics().error(
                codes::syntax::VALUE_COUNT_MISMATCH,
                line,
                format!(
                    "Number of data values is not exact multiples of the number of data names (look above line {})",
                    line
                ),
            );
        }
        self.from_loop = self.loop_bound;
        self.loop_bound = false;
        Flow::Continue
    }

    // ========================================================================
    // ITEM/VALUE PAIRS
    // ========================================================================

    /// A bare `_category.item value` pair.
    ///
    /// A new category flushes the working table first. The value goes to
    /// every existing row of the column, or to a fresh row when the table
    /// has none. Under [`PairPolicy::NewRow`] a pair that reopens a stored
    /// table appends one row instead, and the pairs that follow write
    /// only there.
    pub fn pair<S: TableSink>(&mut self, item: &str, value: Value, sink: &mut S, line: u32) -> Flow {
        let Some((category, column)) = split_item_name(item) else {
            sink.diagnostics().warning(
                codes::syntax::INVALID_ITEM_NAME,
                line,
                format!("Invalid item name {}", item),
            );
            return Flow::Continue;
        };

        let case = sink.case();
        let same = self
            .working
            .as_ref()
            .is_some_and(|w| case.matches(w.category(), category));

        let mut flow = Flow::Continue;
        if !same {
            flow = self.open(category, sink, line);
            if self.pair_policy == PairPolicy::NewRow {
                self.pair_row = self
                    .working
                    .as_mut()
                    .filter(|w| w.slot.is_some() && !w.table.is_empty())
                    .map(|w| w.table.add_row());
            }
        } else if self.from_loop {
            let block = self.working.as_ref().map(|w| w.block.clone()).unwrap_or_default();
            sink.diagnostics().warning(
                codes::syntax::DUPLICATE_CATEGORY,
                line,
                format!("Duplicate category name {} in {}", category, block),
            );
            self.from_loop = false;
        }

        let Some(working) = self.working.as_mut() else {
            return flow;
        };
        let table = &mut working.table;

        let existing = table.column_index(column);
        let duplicate = match (existing, self.pair_row) {
            (Some(col), Some(row)) => table.cell_at(row, col).is_some_and(|v| !v.is_unknown()),
            (existing, _) => existing.is_some(),
        };
        if duplicate {
            sink.diagnostics().warning(
                codes::syntax::DUPLICATE_ITEM,
                line,
                format!("Duplicate item name {}", item),
            );
        }
        let col = existing.unwrap_or_else(|| table.ensure_column(column));

        let written = match self.pair_row {
            Some(row) => table.set_cell(row, col, value),
            None => {
                if table.is_empty() {
                    table.add_row();
                }
                table.fill_column(col, &value)
            }
        };
        if let Err(e) = written {
            sink.diagnostics().error(e.error_code(), line, e.to_string());
        }
        flow
    }

    /// Flush at end of input
    pub fn finish<S: TableSink>(&mut self, sink: &mut S, line: u32) -> Flow {
        self.flush(sink, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    /// Minimal sink writing into one block
    struct BlockSink {
        block: Block,
        diagnostics: Diagnostics,
        commits: usize,
    }

    impl BlockSink {
        fn new() -> Self {
            Self {
                block: Block::new("TEST"),
                diagnostics: Diagnostics::new(),
                commits: 0,
            }
        }
    }

    impl TableSink for BlockSink {
        fn block_name(&self) -> &str {
            "TEST"
        }
        fn case(&self) -> CaseSensitivity {
            CaseSensitivity::Sensitive
        }
        fn keeps(&self, _category: &str) -> bool {
            true
        }
        fn detach(&mut self, _block: &str, category: &str) -> Option<(usize, Table)> {
            self.block.detach_table(category)
        }
        fn commit(&mut self, working: WorkingTable, _line: u32) -> Flow {
            self.commits += 1;
            match working.slot {
                Some(slot) => self.block.write_table_at(slot, working.table),
                None => self.block.write_table(working.table),
            }
            Flow::Continue
        }
        fn diagnostics(&mut self) -> &mut Diagnostics {
            &mut self.diagnostics
        }
    }

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn test_split_item_name() {
        assert_eq!(split_item_name("_atom_site.id"), Some(("atom_site", "id")));
        assert_eq!(split_item_name("_a.b.c"), Some(("a", "b.c")));
        assert_eq!(split_item_name("_nodot"), None);
        assert_eq!(split_item_name("_.x"), None);
        assert_eq!(split_item_name("_a."), None);
    }

    #[test]
    fn test_loop_fills_rows() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Reopen);
        builder.begin_loop();
        builder.loop_item("_a.x", &mut sink, 2);
        builder.loop_item("_a.y", &mut sink, 3);
        for v in ["1", "2", "3", "4"] {
            builder.loop_value(text(v), &mut sink, 4);
        }
        builder.end_loop(&mut sink, 5);
        builder.finish(&mut sink, 5);

        let table = sink.block.table("a").unwrap();
        assert_eq!(table.columns(), &["x", "y"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(1, "x"), Some(&text("3")));
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_partial_row_is_an_error_but_kept() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Reopen);
        builder.begin_loop();
        builder.loop_item("_a.x", &mut sink, 1);
        builder.loop_item("_a.y", &mut sink, 1);
        for v in ["1", "2", "3"] {
            builder.loop_value(text(v), &mut sink, 2);
        }
        builder.end_loop(&mut sink, 3);
        builder.finish(&mut sink, 3);

        assert_eq!(
            sink.diagnostics.render(),
            "ERROR - Number of data values is not exact multiples of the number of data names (look above line 3) at line 3"
        );
        assert_eq!(sink.block.table("a").unwrap().row_count(), 2);
    }

    #[test]
    fn test_loop_header_problems_are_warnings() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Reopen);
        builder.begin_loop();
        builder.loop_item("_bad", &mut sink, 1);
        builder.loop_item("_a.x", &mut sink, 2);
        builder.loop_item("_b.y", &mut sink, 3);
        builder.loop_item("_a.x", &mut sink, 4);
        for v in ["skip", "1", "skip", "skip"] {
            builder.loop_value(text(v), &mut sink, 5);
        }
        builder.end_loop(&mut sink, 6);
        builder.finish(&mut sink, 6);

        let codes: Vec<_> = sink.diagnostics.entries().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                codes::syntax::INVALID_ITEM_NAME,
                codes::syntax::CATEGORY_MISMATCH,
                codes::syntax::DUPLICATE_ITEM,
            ]
        );
        let table = sink.block.table("a").unwrap();
        assert_eq!(table.columns(), &["x"]);
        assert_eq!(table.row(0).unwrap(), &[text("1")]);
    }

    #[test]
    fn test_pair_after_loop_broadcasts() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Reopen);
        builder.pair("_cat.x", text("1"), &mut sink, 1);
        builder.begin_loop();
        builder.loop_item("_cat.y", &mut sink, 2);
        builder.loop_item("_cat.z", &mut sink, 3);
        for v in ["a", "b", "c", "d"] {
            builder.loop_value(text(v), &mut sink, 4);
        }
        builder.end_loop(&mut sink, 5);
        builder.pair("_cat.w", text("2"), &mut sink, 5);
        builder.finish(&mut sink, 6);

        let table = sink.block.table("cat").unwrap();
        assert_eq!(table.columns(), &["x", "y", "z", "w"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(0, "x"), Some(&text("1")));
        assert!(table.cell(1, "x").unwrap().is_unknown());
        assert!(table.rows().all(|row| row[3] == text("2")));
        assert_eq!(
            sink.diagnostics
                .with_code(codes::syntax::DUPLICATE_CATEGORY)
                .count(),
            2
        );
    }

    #[test]
    fn test_duplicate_loop_category_appends() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Reopen);
        for (first, second) in [("1", "2"), ("3", "4")] {
            builder.begin_loop();
            builder.loop_item("_a.x", &mut sink, 1);
            builder.loop_value(text(first), &mut sink, 2);
            builder.loop_value(text(second), &mut sink, 2);
            builder.end_loop(&mut sink, 3);
        }
        builder.finish(&mut sink, 4);

        let table = sink.block.table("a").unwrap();
        assert_eq!(
            table.column_values("x").unwrap(),
            vec![&text("1"), &text("2"), &text("3"), &text("4")]
        );
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.block.table_count(), 1);
    }

    #[test]
    fn test_duplicate_pair_overwrites() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Reopen);
        builder.pair("_a.x", text("1"), &mut sink, 1);
        builder.pair("_a.x", text("2"), &mut sink, 2);
        builder.finish(&mut sink, 3);

        let table = sink.block.table("a").unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "x"), Some(&text("2")));
        assert_eq!(sink.diagnostics.entries()[0].code, codes::syntax::DUPLICATE_ITEM);
    }

    #[test]
    fn test_fresh_policy_never_detaches() {
        let mut sink = BlockSink::new();
        let mut builder = TableBuilder::new(OpenPolicy::Fresh);
        builder.pair("_a.x", text("1"), &mut sink, 1);
        builder.pair("_b.x", text("2"), &mut sink, 2);
        builder.pair("_a.y", text("3"), &mut sink, 3);
        builder.finish(&mut sink, 4);

        assert_eq!(sink.commits, 3);
        assert!(sink.diagnostics.is_empty());
        assert_eq!(sink.block.table("a").unwrap().columns(), &["y"]);
    }

    #[test]
    fn test_new_row_policy_keeps_stored_rows() {
        let mut sink = BlockSink::new();
        let mut stored = Table::new("cat");
        stored.ensure_column("x");
        stored.add_row_values(vec![text("1")]).unwrap();
        stored.add_row_values(vec![text("2")]).unwrap();
        sink.block.write_table(stored);

        let mut builder = TableBuilder::new(OpenPolicy::Reopen).with_pair_policy(PairPolicy::NewRow);
        builder.pair("_cat.x", text("3"), &mut sink, 1);
        builder.pair("_cat.y", text("4"), &mut sink, 2);
        builder.finish(&mut sink, 3);

        let table = sink.block.table("cat").unwrap();
        assert_eq!(
            table.column_values("x").unwrap(),
            vec![&text("1"), &text("2"), &text("3")]
        );
        assert!(table.cell(0, "y").unwrap().is_unknown());
        assert_eq!(table.cell(2, "y"), Some(&text("4")));

        let found: Vec<_> = sink.diagnostics.entries().iter().map(|d| d.code).collect();
        assert_eq!(found, vec![codes::syntax::DUPLICATE_CATEGORY]);
    }
}
