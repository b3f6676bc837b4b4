//! Files whose script sections have been emitted

use crate::modification::Variant;
use std::collections::{BTreeMap, BTreeSet};

/// Written filenames per variant, compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenSections {
    marked: BTreeMap<Variant, BTreeSet<String>>,
}

impl WrittenSections {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a file written. Returns `false` if it already was.
    pub fn mark(&mut self, variant: Variant, filename: &str) -> bool {
        self.marked
            .entry(variant)
            .or_default()
            .insert(filename.to_ascii_lowercase())
    }

    /// Remove the mark while an in-place patch runs
    pub fn unmark(&mut self, variant: Variant, filename: &str) -> bool {
        self.marked
            .get_mut(&variant)
            .is_some_and(|set| set.remove(&filename.to_ascii_lowercase()))
    }

    /// True if the file is marked
    pub fn contains(&self, variant: Variant, filename: &str) -> bool {
        self.marked
            .get(&variant)
            .is_some_and(|set| set.contains(&filename.to_ascii_lowercase()))
    }

    /// Number of marked files of one variant
    pub fn len(&self, variant: Variant) -> usize {
        self.marked.get(&variant).map_or(0, BTreeSet::len)
    }

    /// Number of marked files across variants
    pub fn total(&self) -> usize {
        self.marked.values().map(BTreeSet::len).sum()
    }

    /// True when nothing is marked
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
