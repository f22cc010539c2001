//! String interning for archive property names and string values.

use std::collections::HashMap;

use crate::error::{ArchiveError, ArchiveResult};
use crate::ids::AtomId;

/// Append-only string table with value-based deduplication.
///
/// Equal strings always map to the same [`AtomId`]; ids are assigned in
/// first-seen order. This is deliberately the opposite discipline from
/// [`NodeStore`](crate::NodeStore), which deduplicates by instance identity.
#[derive(Clone, Debug, Default)]
pub struct AtomTable {
    atoms: Vec<String>,
    index: HashMap<String, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from atoms in id order (as read from a stream).
    ///
    /// If the list contains duplicates, lookups resolve to the first one.
    pub fn from_atoms(atoms: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(atoms.len());
        for (i, atom) in atoms.iter().enumerate() {
            index.entry(atom.clone()).or_insert(AtomId::from_index(i));
        }
        Self { atoms, index }
    }

    /// Intern `s`, returning the id of an existing equal string if present.
    pub fn atomize(&mut self, s: &str) -> AtomId {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = AtomId::from_index(self.atoms.len());
        self.atoms.push(s.to_owned());
        self.index.insert(s.to_owned(), id);
        id
    }

    /// Find the id of `s` without interning it.
    pub fn lookup(&self, s: &str) -> Option<AtomId> {
        self.index.get(s).copied()
    }

    /// Resolve an id back to its string.
    pub fn unatomize(&self, id: AtomId) -> ArchiveResult<&str> {
        self.atoms
            .get(id.index())
            .map(String::as_str)
            .ok_or(ArchiveError::AtomOutOfRange {
                id: id.into(),
                len: self.atoms.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Atoms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &str)> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, s)| (AtomId::from_index(i), s.as_str()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.atoms
    }

    pub fn clear(&mut self) {
        self.atoms.clear();
        self.index.clear();
    }
}
