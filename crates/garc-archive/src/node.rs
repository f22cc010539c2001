//! Archive nodes and their typed properties.
//!
//! A [`Node`] is the recorded state of one archived expression instance: an
//! ordered list of [`Property`] values plus a write-once cell holding the
//! in-memory expression the node stands for. While archiving, that cell holds
//! the source instance (and drives identity deduplication); while
//! unarchiving, it memoizes the reconstructed expression so every reference to
//! the node yields the same instance.

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::AtomId;

/// Name of the string property carrying a node's type tag.
pub const CLASS_PROPERTY: &str = "class";

/// Wire type of a property. The discriminant is the 3-bit code stored in the
/// low bits of each property key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Bool = 0,
    Unsigned = 1,
    /// Value is an atom id.
    String = 2,
    /// Value is a node id.
    Node = 3,
}

impl PropertyType {
    /// Number of low key bits holding the type code.
    pub const BITS: u32 = 3;

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Bool),
            1 => Some(Self::Unsigned),
            2 => Some(Self::String),
            3 => Some(Self::Node),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Unsigned => "unsigned",
            Self::String => "string",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single named, typed value on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: AtomId,
    pub kind: PropertyType,
    pub value: u64,
}

impl Property {
    pub fn new(name: AtomId, kind: PropertyType, value: u64) -> Self {
        Self { name, kind, value }
    }

    /// Combined wire key: type code in the low bits, name atom above.
    pub fn key(&self) -> u64 {
        u64::from(self.kind.code()) | (u64::from(self.name) << PropertyType::BITS)
    }
}

/// Recorded state of one archived expression instance.
#[derive(Clone, Debug)]
pub struct Node<E> {
    props: Vec<Property>,
    cache: OnceCell<E>,
}

impl<E> Default for Node<E> {
    fn default() -> Self {
        Self {
            props: Vec::new(),
            cache: OnceCell::new(),
        }
    }
}

impl<E> Node<E> {
    /// Node with the given properties and an empty cache.
    pub fn from_properties(props: Vec<Property>) -> Self {
        Self {
            props,
            cache: OnceCell::new(),
        }
    }

    /// Node built from `source`, which is recorded in the cache.
    pub fn with_source(props: Vec<Property>, source: E) -> Self {
        Self {
            props,
            cache: OnceCell::from(source),
        }
    }

    pub fn properties(&self) -> &[Property] {
        &self.props
    }

    /// The cached expression, if this node has been archived from or
    /// unarchived to one.
    pub fn cached(&self) -> Option<&E> {
        self.cache.get()
    }

    pub fn has_expression(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Store `expr` unless another value got there first; returns the value
    /// that ends up cached.
    pub(crate) fn cache_or_init(&self, expr: E) -> &E {
        self.cache.get_or_init(|| expr)
    }

    /// Drop the cached expression. Structural data is untouched.
    pub fn forget(&mut self) {
        self.cache.take();
    }

    /// First property with this name and type.
    pub fn find(&self, name: AtomId, kind: PropertyType) -> Option<&Property> {
        self.find_nth(name, kind, 0)
    }

    /// The `index`-th (0-based) property with this name and type.
    pub fn find_nth(&self, name: AtomId, kind: PropertyType, index: usize) -> Option<&Property> {
        self.matching(name, kind).nth(index)
    }

    /// All properties with this name and type, in insertion order.
    pub fn matching(&self, name: AtomId, kind: PropertyType) -> impl Iterator<Item = &Property> {
        self.props
            .iter()
            .filter(move |p| p.name == name && p.kind == kind)
    }
}
