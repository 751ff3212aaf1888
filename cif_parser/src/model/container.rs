//! Whole-file container: ordered data blocks

use super::block::Block;
use crate::config::compile_time::container::{DUPLICATE_BLOCK_SEPARATOR, UNNAMED_BLOCK_NAME};
use crate::utils::CaseSensitivity;
use indexmap::IndexMap;

/// Parsed content of one CIF file.
///
/// Block names are unique within a file. [`CifFile::add_block`] renames
/// clashes rather than merging them, and always reports the name it used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CifFile {
    case: CaseSensitivity,
    blocks: IndexMap<String, Block>,
}

impl CifFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// `case` governs the tables created by a parser writing into this file
    pub fn with_case(case: CaseSensitivity) -> Self {
        Self {
            case,
            blocks: IndexMap::new(),
        }
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Add an empty block and return the name actually assigned.
    ///
    /// An empty name becomes `UNNAMED`; a name already present gets a
    /// `#n` suffix with the smallest free `n`.
    pub fn add_block(&mut self, name: &str) -> String {
        let base = if name.is_empty() { UNNAMED_BLOCK_NAME } else { name };

        let mut assigned = base.to_string();
        let mut n = 1;
        while self.blocks.contains_key(&Self::key(&assigned)) {
            assigned = format!("{}{}{}", base, DUPLICATE_BLOCK_SEPARATOR, n);
            n += 1;
        }

        self.blocks
            .insert(Self::key(&assigned), Block::with_case(assigned.clone(), self.case));
        assigned
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(&Self::key(name))
    }

    pub fn block_mut(&mut self, name: &str) -> Option<&mut Block> {
        self.blocks.get_mut(&Self::key(name))
    }

    pub fn first_block(&self) -> Option<&Block> {
        self.blocks.values().next()
    }

    pub fn first_block_mut(&mut self) -> Option<&mut Block> {
        self.blocks.values_mut().next()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.values().map(Block::name)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_block_deduplicates() {
        let mut file = CifFile::new();
        assert_eq!(file.add_block("TEST"), "TEST");
        assert_eq!(file.add_block("TEST"), "TEST#1");
        assert_eq!(file.add_block("test"), "test#2");
        assert_eq!(file.block_count(), 3);
        assert_eq!(
            file.block_names().collect::<Vec<_>>(),
            vec!["TEST", "TEST#1", "test#2"]
        );
    }

    #[test]
    fn test_empty_name_is_unnamed() {
        let mut file = CifFile::new();
        assert_eq!(file.add_block(""), "UNNAMED");
        assert_eq!(file.add_block(""), "UNNAMED#1");
        assert!(file.block("unnamed").is_some());
    }

    #[test]
    fn test_blocks_inherit_case() {
        let mut file = CifFile::with_case(CaseSensitivity::Insensitive);
        file.add_block("b");
        let block = file.first_block_mut().unwrap();
        block.write_table(crate::model::Table::new("Cat"));
        assert!(file.first_block().unwrap().contains_table("CAT"));
    }
}
