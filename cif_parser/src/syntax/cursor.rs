//! Loop cursor and the table under construction

use crate::model::{Table, TableError, Value};

/// Maps the positional value slots of a loop to table columns and tracks
/// where the next value lands.
#[derive(Debug, Default, Clone)]
pub struct LoopCursor {
    /// One entry per declared item; `None` for items that were rejected
    fields: Vec<Option<usize>>,
    value_no: usize,
    row: usize,
}

impl LoopCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.fields.clear();
        self.value_no = 0;
        self.row = 0;
    }

    pub fn push_field(&mut self, column: Option<usize>) {
        self.fields.push(column);
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether `column` is already bound to a slot of this loop
    pub fn has_column(&self, column: usize) -> bool {
        self.fields.contains(&Some(column))
    }

    /// Position of the next value within its row
    pub fn value_no(&self) -> usize {
        self.value_no
    }

    /// Store one loop value. The first value of a row allocates the row.
    pub fn place(&mut self, table: &mut Table, value: Value) -> Result<(), TableError> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let has_columns = self.fields.iter().any(Option::is_some);
        if self.value_no == 0 && has_columns {
            self.row = table.add_row();
        }
        if let Some(col) = self.fields[self.value_no] {
            table.set_cell(self.row, col, value)?;
        }
        self.value_no = (self.value_no + 1) % self.fields.len();
        Ok(())
    }
}

/// A table being filled by the parser, with the block it belongs to.
///
/// `block` is fixed when the table is opened, so a table flushed after the
/// next `data_` header still lands in the block its values came from.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    pub table: Table,
    pub block: String,
    /// Position the table was detached from, when it was reopened
    pub slot: Option<usize>,
    /// `false` when a read definition excludes this table
    pub keep: bool,
}

impl WorkingTable {
    pub fn new(table: Table, block: impl Into<String>, keep: bool) -> Self {
        Self {
            table,
            block: block.into(),
            slot: None,
            keep,
        }
    }

    pub fn reopened(table: Table, block: impl Into<String>, slot: usize, keep: bool) -> Self {
        Self {
            table,
            block: block.into(),
            slot: Some(slot),
            keep,
        }
    }

    pub fn category(&self) -> &str {
        self.table.name()
    }
}
