//! Selective reading of categories and data blocks

use std::collections::{BTreeSet, HashSet};

/// A name filter, compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selection::Only(lowered(names))
    }

    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selection::Except(lowered(names))
    }

    pub fn includes(&self, name: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(&name.to_ascii_lowercase()),
            Selection::Except(set) => !set.contains(&name.to_ascii_lowercase()),
        }
    }
}

fn lowered<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().to_ascii_lowercase())
        .collect()
}

/// Which categories and blocks a parse stores.
///
/// Data outside the selection is still parsed, but never written to the
/// container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadDefinition {
    categories: Selection,
    blocks: Selection,
}

impl ReadDefinition {
    /// Store everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, selection: Selection) -> Self {
        self.categories = selection;
        self
    }

    pub fn with_blocks(mut self, selection: Selection) -> Self {
        self.blocks = selection;
        self
    }

    pub fn categories(&self) -> &Selection {
        &self.categories
    }

    pub fn blocks(&self) -> &Selection {
        &self.blocks
    }

    pub fn wants_category(&self, name: &str) -> bool {
        self.categories.includes(name)
    }

    pub fn wants_block(&self, name: &str) -> bool {
        self.blocks.includes(name)
    }

    /// True once every category of an `Only` selection is in `read`
    /// (lower-cased names). Other selections are never satisfied early.
    pub fn is_satisfied(&self, read: &HashSet<String>) -> bool {
        match &self.categories {
            Selection::Only(set) => !set.is_empty() && set.iter().all(|c| read.contains(c)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_is_case_insensitive() {
        let only = Selection::only(["Atom_Site"]);
        assert!(only.includes("ATOM_SITE"));
        assert!(!only.includes("cell"));

        let except = Selection::except(["cell"]);
        assert!(except.includes("atom_site"));
        assert!(!except.includes("Cell"));
        assert!(Selection::All.includes("anything"));
    }

    #[test]
    fn test_satisfied_only_for_only_selections() {
        let read: HashSet<String> = ["cell".to_string(), "atom_site".to_string()].into();
        let def = ReadDefinition::all().with_categories(Selection::only(["cell", "ATOM_SITE"]));
        assert!(def.is_satisfied(&read));

        let missing = ReadDefinition::all().with_categories(Selection::only(["symmetry"]));
        assert!(!missing.is_satisfied(&read));
        assert!(!ReadDefinition::all().is_satisfied(&read));
    }
}
