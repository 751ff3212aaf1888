//! Schema enforcement for tables written by the dictionary parser

use super::ddl::DdlSchema;
use super::{Frame, FrameScope};
use crate::config::compile_time::dictionary::{BLOCK_SCOPED_CATEGORIES, ITEM_TABLE, PDBX_ITEM_TABLE};
use crate::logging::{codes, Diagnostics};
use crate::model::{Table, Value};
use crate::syntax::split_item_name;

/// Column set and row count of a table before new values were written.
///
/// A value copy, taken when the table is opened. Columns and rows present
/// here were checked on an earlier write and are not checked again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    columns: Vec<String>,
    rows: usize,
}

impl TableSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(table: &Table) -> Self {
        Self {
            columns: table.columns().to_vec(),
            rows: table.row_count(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn has_column(&self, table: &Table, name: &str) -> bool {
        let case = table.case_sensitivity();
        self.columns.iter().any(|c| case.matches(c, name))
    }
}

/// Where a checked table was written
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub block: &'a str,
    pub frame: Option<&'a Frame>,
    pub line: u32,
    pub warn_undefined_items: bool,
}

impl CheckContext<'_> {
    /// Value given to an unsupplied implicit item of `category`
    fn implicit_value(&self, category: &str) -> &str {
        let block_scoped = BLOCK_SCOPED_CATEGORIES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category));
        match self.frame {
            Some(frame) if !block_scoped => frame.name(),
            _ => self.block,
        }
    }
}

/// Check a just-written table against the DDL and backfill implicit items.
///
/// Columns absent from `before` are looked up in the DDL item tables. Rows
/// past `before.rows()` then receive values for every implicit item of the
/// category that no column supplies. An undefined category is reported and
/// the table is left as written.
pub fn check_ddl(
    table: &mut Table,
    before: &TableSnapshot,
    schema: &DdlSchema,
    ctx: &CheckContext<'_>,
    diagnostics: &mut Diagnostics,
) {
    let category = table.name().to_string();
    if !schema.has_category(&category) {
        diagnostics.warning(
            codes::dictionary::UNDEFINED_CATEGORY,
            ctx.line,
            format!("Category {} isn't defined", category),
        );
        return;
    }

    if ctx.warn_undefined_items {
        for column in table.columns() {
            if before.has_column(table, column) {
                continue;
            }
            let item_name = format!("_{}.{}", category, column);
            if !schema.item(&item_name).is_defined() {
                diagnostics.warning(
                    codes::dictionary::UNDEFINED_ITEM,
                    ctx.line,
                    format!("Item {} isn't defined", item_name),
                );
            }
        }
    }

    let new_rows = before.rows()..table.row_count();
    if new_rows.is_empty() {
        return;
    }

    let fills: Vec<(String, String)> = if is_item_table(&category) {
        item_frame_fills(table, ctx)
    } else {
        let value = ctx.implicit_value(&category);
        schema
            .implicit_items(&category)
            .into_iter()
            .filter(|column| !table.has_column(column))
            .map(|column| (column, value.to_string()))
            .collect()
    };

    for (column, value) in fills {
        let col = table.ensure_column(&column);
        for row in new_rows.clone() {
            if let Err(e) = table.set_cell(row, col, Value::text(value.as_str())) {
                diagnostics.error(e.error_code(), ctx.line, e.to_string());
            }
        }
    }
}

fn is_item_table(category: &str) -> bool {
    category.eq_ignore_ascii_case(ITEM_TABLE) || category.eq_ignore_ascii_case(PDBX_ITEM_TABLE)
}

// Inside an item frame `name` and `category_id` default to the frame's item
fn item_frame_fills(table: &Table, ctx: &CheckContext<'_>) -> Vec<(String, String)> {
    let Some(frame) = ctx.frame.filter(|f| f.scope() == FrameScope::Item) else {
        return Vec::new();
    };

    let mut fills = Vec::new();
    if !table.has_column("name") {
        fills.push(("name".to_string(), frame.name().to_string()));
    }
    if !table.has_column("category_id") {
        if let Some((category, _)) = split_item_name(frame.name()) {
            fills.push(("category_id".to_string(), category.to_string()));
        }
    }
    fills
}

/// Report a frame whose defining value names something else.
///
/// In an item frame some `_item.name` row must equal the frame name; in a
/// category frame `_category.id` must.
pub fn check_frame_name(table: &Table, frame: &Frame, line: u32, diagnostics: &mut Diagnostics) {
    let column = match frame.scope() {
        FrameScope::Item if table.name().eq_ignore_ascii_case(ITEM_TABLE) => "name",
        FrameScope::Category if table.name().eq_ignore_ascii_case("category") => "id",
        _ => return,
    };
    let Some(values) = table.column_values(column) else {
        return;
    };

    let named: Vec<&str> = values.iter().filter_map(|v| v.as_str()).collect();
    if named.is_empty() || named.iter().any(|v| v.eq_ignore_ascii_case(frame.name())) {
        return;
    }
    diagnostics.warning(
        codes::dictionary::SAVE_FRAME_NAME_MISMATCH,
        line,
        format!(
            "_{}.{} {} does not match save frame {}",
            table.name(),
            column,
            named[0],
            frame.name()
        ),
    );
}
