//! Dictionary (DDL) parsing
//!
//! A dictionary is a CIF file whose data block is split into save frames,
//! one per category or item definition. [`DicParser`] reads it with the
//! same table machinery as the plain CIF parser, checks every written table
//! against a [`DdlSchema`] and fills in the items the DDL marks implicit.

mod check;
mod ddl;
mod implicit;
mod parser;

pub use check::{check_ddl, CheckContext, TableSnapshot};
pub use ddl::{DdlSchema, ItemDefinition};
pub use implicit::insert_implicit_ordinal_items;
pub use parser::{parse_dictionary_string, DicParser};

use crate::config::compile_time::dictionary::{
    FORMAT_BLOCK_COLUMN, FORMAT_CATEGORY_COLUMN, FORMAT_TABLE, FORMAT_TYPE_COLUMN,
};
use crate::logging::codes;
use crate::model::{Block, CifFile, Table, Value};
use crate::utils::CaseSensitivity;
use serde::Serialize;
use std::collections::HashSet;

const FORMAT_INDEX: &str = "by_triple";

// ============================================================================
// SCOPES AND FRAMES
// ============================================================================

/// Where a table's values were written from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameScope {
    Data,
    Category,
    Item,
}

impl FrameScope {
    /// Frames named `_category.item` define items; all others define categories
    pub fn of_frame(name: &str) -> Self {
        if name.starts_with('_') {
            FrameScope::Item
        } else {
            FrameScope::Category
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameScope::Data => "data",
            FrameScope::Category => "category",
            FrameScope::Item => "item",
        }
    }
}

/// An open `save_<name>` frame
#[derive(Debug, Clone)]
pub struct Frame {
    name: String,
    scope: FrameScope,
    line: u32,
    categories: HashSet<String>,
}

impl Frame {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        let name = name.into();
        Self {
            scope: FrameScope::of_frame(&name),
            name,
            line,
            categories: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> FrameScope {
        self.scope
    }

    /// Line of the `save_<name>` header
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Note that a category was opened in this frame. Returns `false` when
    /// the frame had already opened it.
    pub(crate) fn enter_category(&mut self, category: &str) -> bool {
        self.categories.insert(category.to_ascii_lowercase())
    }
}

// ============================================================================
// FORMAT REGISTRY
// ============================================================================

/// Which categories were written in which block and scope.
///
/// Stored as a `format` table with `dbName`, `type` and `catName` columns,
/// one row per distinct triple in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRegistry {
    table: Table,
}

impl FormatRegistry {
    pub fn new() -> Self {
        let mut table = Table::with_case(FORMAT_TABLE, CaseSensitivity::Insensitive);
        let columns = [FORMAT_BLOCK_COLUMN, FORMAT_TYPE_COLUMN, FORMAT_CATEGORY_COLUMN];
        for column in columns {
            table.ensure_column(column);
        }
        if let Err(e) = table.create_index(FORMAT_INDEX, &columns) {
            crate::log_error!(codes::system::INTERNAL_ERROR, "Format registry index failed",
                "error" => e
            );
        }
        Self { table }
    }

    /// Record a triple. Returns `true` when it was not seen before.
    pub fn record(&mut self, block: &str, scope: FrameScope, category: &str) -> bool {
        if self.contains(block, scope, category) {
            return false;
        }
        let row = vec![
            Value::text(block),
            Value::text(scope.as_str()),
            Value::text(category),
        ];
        self.table.add_row_values(row).is_ok()
    }

    pub fn contains(&self, block: &str, scope: FrameScope, category: &str) -> bool {
        self.table
            .find_first(
                &[block, scope.as_str(), category],
                &[FORMAT_BLOCK_COLUMN, FORMAT_TYPE_COLUMN, FORMAT_CATEGORY_COLUMN],
            )
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DICTIONARY CONTAINER
// ============================================================================

/// A parsed dictionary: its blocks plus the format registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DicFile {
    file: CifFile,
    format: FormatRegistry,
}

impl DicFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case(case: CaseSensitivity) -> Self {
        Self {
            file: CifFile::with_case(case),
            format: FormatRegistry::new(),
        }
    }

    pub fn file(&self) -> &CifFile {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut CifFile {
        &mut self.file
    }

    pub fn format(&self) -> &FormatRegistry {
        &self.format
    }

    pub fn first_block(&self) -> Option<&Block> {
        self.file.first_block()
    }

    pub fn into_file(self) -> CifFile {
        self.file
    }
}

/// Initialize dictionary logging validation (for system startup)
pub fn init_dictionary_logging() -> Result<(), String> {
    let dictionary_codes = [
        codes::dictionary::UNDEFINED_CATEGORY,
        codes::dictionary::UNDEFINED_ITEM,
        codes::dictionary::DUPLICATE_SAVE_FRAME,
        codes::dictionary::SAVE_FRAME_NAME_MISMATCH,
        codes::dictionary::MISSING_DDL_TABLE,
        codes::dictionary::UNBALANCED_SAVE_FRAME,
        codes::dictionary::DUPLICATE_FRAME_CATEGORY,
    ];

    for code in &dictionary_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Dictionary error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_scope_from_name() {
        assert_eq!(FrameScope::of_frame("atom_site"), FrameScope::Category);
        assert_eq!(FrameScope::of_frame("_atom_site.id"), FrameScope::Item);
        assert_eq!(FrameScope::Item.as_str(), "item");
    }

    #[test]
    fn test_frame_tracks_categories() {
        let mut frame = Frame::new("_entity.id", 12);
        assert_eq!(frame.scope(), FrameScope::Item);
        assert!(frame.enter_category("item"));
        assert!(!frame.enter_category("ITEM"));
        assert!(frame.enter_category("item_type"));
    }

    #[test]
    fn test_format_registry_deduplicates() {
        let mut registry = FormatRegistry::new();
        assert!(registry.record("mmcif_pdbx", FrameScope::Data, "dictionary"));
        assert!(registry.record("mmcif_pdbx", FrameScope::Item, "item"));
        assert!(!registry.record("MMCIF_PDBX", FrameScope::Item, "ITEM"));
        assert!(registry.record("mmcif_pdbx", FrameScope::Category, "item"));

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("mmcif_pdbx", FrameScope::Category, "item"));
        assert!(!registry.contains("other", FrameScope::Data, "dictionary"));
        assert_eq!(
            registry.table().columns(),
            &["dbName", "type", "catName"]
        );
    }

    #[test]
    fn test_init_dictionary_logging() {
        assert!(init_dictionary_logging().is_ok());
    }
}
