//! Category table: ordered columns, ordered rows, optional lookup indexes

use super::value::Value;
use crate::logging::{codes, Code};
use crate::utils::CaseSensitivity;
use std::collections::HashMap;

/// Table manipulation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Row {row} is out of range for table '{table}' ({rows} rows)")]
    RowOutOfRange {
        table: String,
        row: usize,
        rows: usize,
    },

    #[error("Row has {found} values but table '{table}' has {expected} columns")]
    RowWidth {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("Index '{index}' already exists on table '{table}'")]
    DuplicateIndex { table: String, index: String },

    #[error("Index '{index}' does not exist on table '{table}'")]
    UnknownIndex { table: String, index: String },
}

impl TableError {
    /// Table errors only surface from caller misuse, never from input text
    pub fn error_code(&self) -> Code {
        codes::system::INTERNAL_ERROR
    }
}

/// Key of one row under an index. Sentinels are `None` and never match a target.
type IndexKey = Vec<Option<String>>;

#[derive(Debug, Clone)]
struct TableIndex {
    columns: Vec<usize>,
    entries: HashMap<IndexKey, Vec<usize>>,
}

impl TableIndex {
    fn build(columns: Vec<usize>, rows: &[Vec<Value>], case: CaseSensitivity) -> Self {
        let mut index = Self {
            columns,
            entries: HashMap::new(),
        };
        for (row_no, row) in rows.iter().enumerate() {
            let key = index.key_of(row, case);
            index.entries.entry(key).or_default().push(row_no);
        }
        index
    }

    fn key_of(&self, row: &[Value], case: CaseSensitivity) -> IndexKey {
        self.columns
            .iter()
            .map(|&col| {
                row.get(col)
                    .and_then(Value::as_str)
                    .map(|s| case.key(s).into_owned())
            })
            .collect()
    }

    fn insert(&mut self, key: IndexKey, row: usize) {
        let rows = self.entries.entry(key).or_default();
        if let Err(pos) = rows.binary_search(&row) {
            rows.insert(pos, row);
        }
    }

    fn remove(&mut self, key: &IndexKey, row: usize) {
        if let Some(rows) = self.entries.get_mut(key) {
            if let Ok(pos) = rows.binary_search(&row) {
                rows.remove(pos);
            }
            if rows.is_empty() {
                self.entries.remove(key);
            }
        }
    }
}

/// A named CIF category: ordered columns and rows of [`Value`] cells.
///
/// Every row always holds exactly one cell per column; columns added after
/// rows exist are backfilled with [`Value::Unknown`]. Indexes are kept up to
/// date by every mutation.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    case: CaseSensitivity,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    indexes: HashMap<String, TableIndex>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_case(name, CaseSensitivity::Sensitive)
    }

    pub fn with_case(name: impl Into<String>, case: CaseSensitivity) -> Self {
        Self {
            name: name.into(),
            case,
            columns: Vec::new(),
            rows: Vec::new(),
            indexes: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Change the comparison rule; existing indexes are rebuilt under it.
    pub fn set_case_sensitivity(&mut self, case: CaseSensitivity) {
        self.case = case;
        self.rebuild_indexes();
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| self.case.matches(c, name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a column. Existing rows receive [`Value::Unknown`].
    pub fn add_column(&mut self, name: &str) -> Result<usize, TableError> {
        if self.has_column(name) {
            return Err(TableError::DuplicateColumn {
                table: self.name.clone(),
                column: name.to_string(),
            });
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Unknown);
        }
        Ok(self.columns.len() - 1)
    }

    /// Position of `name`, adding the column first if it is absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        match self.column_index(name) {
            Some(col) => col,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Value::Unknown);
                }
                self.columns.len() - 1
            }
        }
    }

    /// Append a row with every cell set to [`Value::Unknown`]
    pub fn add_row(&mut self) -> usize {
        let row = vec![Value::Unknown; self.columns.len()];
        self.push_row(row)
    }

    /// Append a row with explicit values in column order
    pub fn add_row_values(&mut self, values: Vec<Value>) -> Result<usize, TableError> {
        if values.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                table: self.name.clone(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        Ok(self.push_row(values))
    }

    fn push_row(&mut self, row: Vec<Value>) -> usize {
        let row_no = self.rows.len();
        for index in self.indexes.values_mut() {
            let key = index.key_of(&row, self.case);
            index.insert(key, row_no);
        }
        self.rows.push(row);
        row_no
    }

    pub fn row(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.cell_at(row, col)
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cells of one column in row order
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Set one cell addressed by column name
    pub fn update_cell(&mut self, row: usize, column: &str, value: Value) -> Result<(), TableError> {
        let col = self
            .column_index(column)
            .ok_or_else(|| TableError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })?;
        self.set_cell(row, col, value)
    }

    /// Set one cell addressed by column position
    pub fn set_cell(&mut self, row: usize, col: usize, value: Value) -> Result<(), TableError> {
        if row >= self.rows.len() {
            return Err(TableError::RowOutOfRange {
                table: self.name.clone(),
                row,
                rows: self.rows.len(),
            });
        }
        if col >= self.columns.len() {
            return Err(TableError::UnknownColumn {
                table: self.name.clone(),
                column: format!("#{}", col),
            });
        }

        let indexed = self.indexes.values().any(|i| i.columns.contains(&col));
        if indexed {
            let case = self.case;
            let old_keys: Vec<(String, IndexKey)> = self
                .indexes
                .iter()
                .filter(|(_, i)| i.columns.contains(&col))
                .map(|(name, i)| (name.clone(), i.key_of(&self.rows[row], case)))
                .collect();
            self.rows[row][col] = value;
            for (name, old_key) in old_keys {
                if let Some(index) = self.indexes.get_mut(&name) {
                    index.remove(&old_key, row);
                    let new_key = index.key_of(&self.rows[row], case);
                    index.insert(new_key, row);
                }
            }
        } else {
            self.rows[row][col] = value;
        }
        Ok(())
    }

    /// Set the same value in every existing row of a column
    pub fn fill_column(&mut self, col: usize, value: &Value) -> Result<(), TableError> {
        for row in 0..self.rows.len() {
            self.set_cell(row, col, value.clone())?;
        }
        Ok(())
    }

    /// Append every row of `other`, matching columns by name. Columns only
    /// `other` has are added first; cells `other` lacks stay Unknown.
    pub fn append_table(&mut self, other: &Table) -> usize {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.ensure_column(name))
            .collect();
        for source in &other.rows {
            let mut row = vec![Value::Unknown; self.columns.len()];
            for (value, &col) in source.iter().zip(&mapping) {
                row[col] = value.clone();
            }
            self.push_row(row);
        }
        other.rows.len()
    }

    // ========================================================================
    // INDEXES AND LOOKUP
    // ========================================================================

    /// Create a named index over an ordered list of columns
    pub fn create_index(&mut self, name: &str, columns: &[&str]) -> Result<(), TableError> {
        if self.indexes.contains_key(name) {
            return Err(TableError::DuplicateIndex {
                table: self.name.clone(),
                index: name.to_string(),
            });
        }
        let positions = self.resolve_columns(columns)?;
        let index = TableIndex::build(positions, &self.rows, self.case);
        self.indexes.insert(name.to_string(), index);
        Ok(())
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn drop_index(&mut self, name: &str) -> Result<(), TableError> {
        self.indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| TableError::UnknownIndex {
                table: self.name.clone(),
                index: name.to_string(),
            })
    }

    /// Recompute every index from the current rows
    pub fn rebuild_indexes(&mut self) {
        let case = self.case;
        for index in self.indexes.values_mut() {
            *index = TableIndex::build(std::mem::take(&mut index.columns), &self.rows, case);
        }
    }

    fn resolve_columns(&self, columns: &[&str]) -> Result<Vec<usize>, TableError> {
        columns
            .iter()
            .map(|c| {
                self.column_index(c).ok_or_else(|| TableError::UnknownColumn {
                    table: self.name.clone(),
                    column: c.to_string(),
                })
            })
            .collect()
    }

    fn target_key(&self, target: &[&str]) -> IndexKey {
        target
            .iter()
            .map(|t| Some(self.case.key(t).into_owned()))
            .collect()
    }

    fn row_matches(&self, row: &[Value], positions: &[usize], target: &[&str]) -> bool {
        positions.iter().zip(target).all(|(&col, t)| match &row[col] {
            Value::Text(s) => self.case.matches(s, t),
            _ => false,
        })
    }

    /// First row whose cells at `columns` equal `target` under the table's
    /// case rule. Uses a matching index when one exists.
    pub fn find_first(&self, target: &[&str], columns: &[&str]) -> Option<usize> {
        if target.len() != columns.len() {
            return None;
        }
        let positions = self.resolve_columns(columns).ok()?;

        if let Some(index) = self.indexes.values().find(|i| i.columns == positions) {
            return index
                .entries
                .get(&self.target_key(target))
                .and_then(|rows| rows.first().copied());
        }

        self.rows
            .iter()
            .position(|row| self.row_matches(row, &positions, target))
    }

    /// Every row whose cells at `columns` equal `target`, in row order
    pub fn search(&self, target: &[&str], columns: &[&str]) -> Vec<usize> {
        if target.len() != columns.len() {
            return Vec::new();
        }
        let Ok(positions) = self.resolve_columns(columns) else {
            return Vec::new();
        };

        if let Some(index) = self.indexes.values().find(|i| i.columns == positions) {
            return index
                .entries
                .get(&self.target_key(target))
                .cloned()
                .unwrap_or_default();
        }

        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.row_matches(row, &positions, target))
            .map(|(i, _)| i)
            .collect()
    }

    /// Lookup through a named index
    pub fn find_first_indexed(&self, index: &str, target: &[&str]) -> Result<Option<usize>, TableError> {
        let idx = self
            .indexes
            .get(index)
            .ok_or_else(|| TableError::UnknownIndex {
                table: self.name.clone(),
                index: index.to_string(),
            })?;
        Ok(idx
            .entries
            .get(&self.target_key(target))
            .and_then(|rows| rows.first().copied()))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.columns == other.columns && self.rows == other.rows
    }
}
