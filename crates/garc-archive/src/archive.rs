//! The top-level archive: atom table, node store, and named roots.
//!
//! # Invariants
//!
//! - Atom and node ids are dense and never renumbered until [`Archive::clear`].
//! - Archiving inserts children before their parent, so every node
//!   reference points to a smaller node id.
//! - Node caches populate lazily during unarchiving and are reused for every
//!   reference to the same node id.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::atom::AtomTable;
use crate::error::{ArchiveError, ArchiveResult};
use crate::expression::Expression;
use crate::ids::{AtomId, NodeId};
use crate::node::{Node, PropertyType, CLASS_PROPERTY};
use crate::reader::NodeReader;
use crate::registry::UnarchiveContext;
use crate::store::NodeStore;
use crate::stream::ARCHIVE_VERSION;
use crate::writer::NodeWriter;

/// A named entry point into the node graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    pub name: AtomId,
    pub root: NodeId,
}

/// Container for archived expressions.
///
/// Archiving is `&mut self`; unarchiving is `&self` and only fills node
/// caches, which are write-once cells. The cells make the type `!Sync`, so
/// an archive can only be used from one thread at a time.
#[derive(Clone, Debug)]
pub struct Archive<E> {
    pub(crate) version: u32,
    pub(crate) atoms: AtomTable,
    pub(crate) nodes: NodeStore<E>,
    pub(crate) roots: Vec<Root>,
}

impl<E> Default for Archive<E> {
    fn default() -> Self {
        Self {
            version: ARCHIVE_VERSION,
            atoms: AtomTable::new(),
            nodes: NodeStore::new(),
            roots: Vec::new(),
        }
    }
}

impl<E> Archive<E> {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        version: u32,
        atoms: AtomTable,
        nodes: NodeStore<E>,
        roots: Vec<Root>,
    ) -> Self {
        Self {
            version,
            atoms,
            nodes,
            roots,
        }
    }

    /// Format version this archive was read with, or [`ARCHIVE_VERSION`]
    /// for archives built in memory. Writing always emits `ARCHIVE_VERSION`.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn nodes(&self) -> &NodeStore<E> {
        &self.nodes
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    /// Number of archived (named) expressions.
    pub fn num_expressions(&self) -> usize {
        self.roots.len()
    }

    /// Intern a string in this archive's atom table.
    pub fn atomize(&mut self, s: &str) -> AtomId {
        self.atoms.atomize(s)
    }

    pub fn unatomize(&self, id: AtomId) -> ArchiveResult<&str> {
        self.atoms.unatomize(id)
    }

    pub fn get_node(&self, id: NodeId) -> ArchiveResult<&Node<E>> {
        self.nodes.get_node(id)
    }

    /// Name of the root at `index`.
    pub fn expression_name(&self, index: usize) -> ArchiveResult<&str> {
        let root = self.root_at(index)?;
        self.atoms.unatomize(root.name)
    }

    /// Empty all tables so the archive can be reused.
    pub fn clear(&mut self) {
        self.version = ARCHIVE_VERSION;
        self.atoms.clear();
        self.nodes.clear();
        self.roots.clear();
    }

    /// Drop every node's cached expression, forcing the next unarchive to
    /// rebuild from the stored properties.
    pub fn forget(&mut self) {
        self.nodes.forget();
    }

    fn root_at(&self, index: usize) -> ArchiveResult<Root> {
        self.roots
            .get(index)
            .copied()
            .ok_or(ArchiveError::IndexOutOfRange {
                index,
                len: self.roots.len(),
            })
    }

    fn root_named(&self, name: &str) -> ArchiveResult<Root> {
        self.atoms
            .lookup(name)
            .and_then(|atom| self.roots.iter().find(|r| r.name == atom).copied())
            .ok_or_else(|| ArchiveError::ExpressionNotFound(name.to_owned()))
    }
}

impl<E: Expression> Archive<E> {
    /// Archive `expr` and register it as a root called `name`.
    ///
    /// Sub-expressions that are the same instance as something already in
    /// the archive (from this or an earlier call) reuse the existing node.
    /// Returns the root node id.
    pub fn archive_ex(&mut self, expr: &E, name: &str) -> NodeId {
        self.nodes.reindex();
        let nodes_before = self.nodes.len();
        let root = self.archive_node(expr);
        let name = self.atoms.atomize(name);
        self.roots.push(Root { name, root });
        debug!(
            root = %root,
            new_nodes = self.nodes.len() - nodes_before,
            total_nodes = self.nodes.len(),
            "archived expression"
        );
        root
    }

    /// Archive one expression instance, returning its node id.
    pub(crate) fn archive_node(&mut self, expr: &E) -> NodeId {
        if let Some(id) = self.nodes.find_instance(expr.instance_key()) {
            return id;
        }
        let mut writer = NodeWriter::new(self);
        writer.add_string(CLASS_PROPERTY, expr.class_name());
        expr.write(&mut writer);
        let props = writer.into_properties();
        self.nodes.add_node(Node::with_source(props, expr.clone()))
    }

    /// Unarchive the first root called `name`.
    pub fn unarchive_ex(&self, ctx: UnarchiveContext<'_, E>, name: &str) -> ArchiveResult<E> {
        let root = self.root_named(name)?;
        debug!(name, root = %root.root, "unarchiving expression");
        self.unarchive_node(ctx, root.root)
    }

    /// Unarchive the root at position `index`.
    pub fn unarchive_ex_by_index(
        &self,
        ctx: UnarchiveContext<'_, E>,
        index: usize,
    ) -> ArchiveResult<E> {
        let root = self.root_at(index)?;
        debug!(index, root = %root.root, "unarchiving expression");
        self.unarchive_node(ctx, root.root)
    }

    /// Unarchive the root at position `index`, also returning its name.
    pub fn unarchive_ex_with_name(
        &self,
        ctx: UnarchiveContext<'_, E>,
        index: usize,
    ) -> ArchiveResult<(String, E)> {
        let name = self.expression_name(index)?.to_owned();
        let expr = self.unarchive_ex_by_index(ctx, index)?;
        Ok((name, expr))
    }

    /// Materialize node `id`, reusing its cached expression if present.
    pub fn unarchive_node(&self, ctx: UnarchiveContext<'_, E>, id: NodeId) -> ArchiveResult<E> {
        let node = self.nodes.get_node(id)?;
        if let Some(expr) = node.cached() {
            return Ok(expr.clone());
        }

        let class = self.class_of(id, node)?;
        let factory = ctx
            .registry()
            .get(class)
            .ok_or_else(|| ArchiveError::UnknownClass(class.to_owned()))?;
        let expr = factory(&NodeReader::new(self, ctx, id, node))?;
        trace!(node = %id, class, "materialized node");
        Ok(node.cache_or_init(expr).clone())
    }

    fn class_of(&self, id: NodeId, node: &Node<E>) -> ArchiveResult<&str> {
        let prop = self
            .atoms
            .lookup(CLASS_PROPERTY)
            .and_then(|atom| node.find(atom, PropertyType::String))
            .ok_or(ArchiveError::MissingClass { node: id })?;
        self.atoms.unatomize(AtomId::from_value(prop.value)?)
    }
}
