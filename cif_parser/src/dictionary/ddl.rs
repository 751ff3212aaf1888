//! DDL schema lookups used while parsing a dictionary
//!
//! The schema is a case-insensitive copy of the DDL's `category`, `item`
//! and (when present) `pdbx_item` tables, indexed for the lookups
//! [`check_ddl`](super::check_ddl) and the implicit-item passes make for
//! every written table.

use crate::config::compile_time::dictionary::{
    CATEGORY_TABLE, IMPLICIT, IMPLICIT_ORDINAL, ITEM_TABLE, PDBX_ITEM_TABLE,
};
use crate::model::{CifFile, Table, Value};
use crate::syntax::{split_item_name as split_item, ParserError, ParserResult};
use crate::utils::CaseSensitivity;

const BY_ID: &str = "by_id";
const BY_NAME: &str = "by_name";
const BY_CATEGORY_CODE: &str = "by_category_code";

/// What the DDL says about one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDefinition {
    Undefined,
    Defined { implicit: bool },
}

impl ItemDefinition {
    pub fn is_defined(&self) -> bool {
        matches!(self, ItemDefinition::Defined { .. })
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, ItemDefinition::Defined { implicit: true })
    }
}

/// Indexed view of the DDL tables a dictionary is checked against
#[derive(Debug, Clone)]
pub struct DdlSchema {
    categories: Table,
    items: Table,
    pdbx_items: Option<Table>,
}

impl DdlSchema {
    /// Build from the first block of a parsed DDL.
    ///
    /// Fails when the DDL has no block or its block lacks the `category`
    /// or `item` table.
    pub fn from_ddl(ddl: &CifFile) -> ParserResult<Self> {
        let block = ddl.first_block().ok_or(ParserError::MissingDdlBlock)?;
        let required = |name: &str| {
            block
                .table(name)
                .cloned()
                .ok_or_else(|| ParserError::MissingDdlTable {
                    table: name.to_string(),
                })
        };

        let mut categories = required(CATEGORY_TABLE)?;
        categories.set_case_sensitivity(CaseSensitivity::Insensitive);
        categories.ensure_column("id");
        categories.create_index(BY_ID, &["id"])?;

        let items = Self::prepare_items(required(ITEM_TABLE)?)?;
        let pdbx_items = block
            .table(PDBX_ITEM_TABLE)
            .cloned()
            .map(Self::prepare_items)
            .transpose()?;

        Ok(Self {
            categories,
            items,
            pdbx_items,
        })
    }

    fn prepare_items(mut table: Table) -> ParserResult<Table> {
        table.set_case_sensitivity(CaseSensitivity::Insensitive);
        let name_col = table.ensure_column("name");
        let category_col = table.ensure_column("category_id");
        table.ensure_column("mandatory_code");

        // Item definitions inherited from a parent often omit category_id
        for row in 0..table.row_count() {
            let missing = table
                .cell_at(row, category_col)
                .is_some_and(Value::is_sentinel);
            let derived = table
                .cell_at(row, name_col)
                .and_then(Value::as_str)
                .and_then(split_item)
                .map(|(category, _)| category.to_string());
            if let (true, Some(category)) = (missing, derived) {
                table.set_cell(row, category_col, Value::text(category))?;
            }
        }

        table.create_index(BY_NAME, &["name"])?;
        table.create_index(BY_CATEGORY_CODE, &["category_id", "mandatory_code"])?;
        Ok(table)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.find_first(&[category], &["id"]).is_some()
    }

    pub fn has_pdbx_items(&self) -> bool {
        self.pdbx_items.is_some()
    }

    /// Look `_category.item` up in `item`, then in `pdbx_item`
    pub fn item(&self, item_name: &str) -> ItemDefinition {
        self.item_tables()
            .filter_map(|table| {
                let row = table.find_first(&[item_name], &["name"])?;
                let implicit = table
                    .cell(row, "mandatory_code")
                    .and_then(Value::as_str)
                    .is_some_and(|code| code.eq_ignore_ascii_case(IMPLICIT));
                Some(implicit)
            })
            .reduce(|a, b| a || b)
            .map_or(ItemDefinition::Undefined, |implicit| ItemDefinition::Defined {
                implicit,
            })
    }

    /// Column names of the `implicit` items declared for a category
    pub fn implicit_items(&self, category: &str) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for table in self.item_tables() {
            for row in table.search(&[category, IMPLICIT], &["category_id", "mandatory_code"]) {
                let Some((_, column)) = table
                    .cell(row, "name")
                    .and_then(Value::as_str)
                    .and_then(split_item)
                else {
                    continue;
                };
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                    columns.push(column.to_string());
                }
            }
        }
        columns
    }

    /// `(category, column)` of every `implicit-ordinal` item in `item`
    pub fn implicit_ordinal_items(&self) -> Vec<(String, String)> {
        self.items
            .search(&[IMPLICIT_ORDINAL], &["mandatory_code"])
            .into_iter()
            .filter_map(|row| {
                let category = self.items.cell(row, "category_id")?.as_str()?;
                let (_, column) = split_item(self.items.cell(row, "name")?.as_str()?)?;
                Some((category.to_string(), column.to_string()))
            })
            .collect()
    }

    fn item_tables(&self) -> impl Iterator<Item = &Table> {
        std::iter::once(&self.items).chain(self.pdbx_items.as_ref())
    }
}
