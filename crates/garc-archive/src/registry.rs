//! Type-tag driven reconstruction.
//!
//! A [`Registry`] maps the `class` tag stored on each node to the factory that
//! rebuilds the expression. Registries are plain values passed to each
//! unarchive call through an [`UnarchiveContext`], so independent registries
//! (say, one with stub types for tests) can coexist.

use std::collections::HashMap;
use std::fmt;

use crate::error::ArchiveResult;
use crate::reader::NodeReader;

/// Reconstruction factory for one class tag.
pub type UnarchiveFn<E> = Box<dyn Fn(&NodeReader<'_, E>) -> ArchiveResult<E>>;

/// Table of class tag -> reconstruction factory.
pub struct Registry<E> {
    factories: HashMap<String, UnarchiveFn<E>>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<E: 'static> Registry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `tag`, replacing any previous one.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&NodeReader<'_, E>) -> ArchiveResult<E> + 'static,
    {
        self.factories.insert(tag.into(), Box::new(factory));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, tag: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&NodeReader<'_, E>) -> ArchiveResult<E> + 'static,
    {
        self.register(tag, factory);
        self
    }
}

impl<E> Registry<E> {
    pub fn get(&self, tag: &str) -> Option<&UnarchiveFn<E>> {
        self.factories.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl<E> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Everything an unarchive call needs besides the archive itself.
pub struct UnarchiveContext<'a, E> {
    registry: &'a Registry<E>,
    symbols: &'a [E],
}

impl<'a, E> UnarchiveContext<'a, E> {
    pub fn new(registry: &'a Registry<E>) -> Self {
        Self {
            registry,
            symbols: &[],
        }
    }

    /// Symbols that archived symbols with matching names should resolve to.
    pub fn with_symbols(mut self, symbols: &'a [E]) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn registry(&self) -> &'a Registry<E> {
        self.registry
    }

    pub fn symbols(&self) -> &'a [E] {
        self.symbols
    }
}

impl<E> Clone for UnarchiveContext<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for UnarchiveContext<'_, E> {}
