//! Data block: an ordered set of category tables

use super::table::Table;
use crate::utils::CaseSensitivity;
use indexmap::IndexMap;

/// A `data_` block. Tables keep the order in which they were first written.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    case: CaseSensitivity,
    tables: IndexMap<String, Table>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_case(name, CaseSensitivity::Sensitive)
    }

    pub fn with_case(name: impl Into<String>, case: CaseSensitivity) -> Self {
        Self {
            name: name.into(),
            case,
            tables: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(&self, name: &str) -> String {
        self.case.key(name).into_owned()
    }

    /// Store a table, replacing any table of the same name in place
    pub fn write_table(&mut self, table: Table) {
        let key = self.key(table.name());
        self.tables.insert(key, table);
    }

    /// Store a table at a given position. Used to return a detached table
    /// to the slot it came from.
    pub fn write_table_at(&mut self, slot: usize, table: Table) {
        let key = self.key(table.name());
        let slot = slot.min(self.tables.len());
        self.tables.shift_insert(slot, key, table);
    }

    /// Remove a table and report the position it occupied
    pub fn detach_table(&mut self, name: &str) -> Option<(usize, Table)> {
        let key = self.key(name);
        self.tables
            .shift_remove_full(&key)
            .map(|(slot, _, table)| (slot, table))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(self.case.key(name).as_ref())
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let key = self.key(name);
        self.tables.get_mut(&key)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(self.case.key(name).as_ref())
    }

    /// Table names in write order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.values().map(Table::name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
