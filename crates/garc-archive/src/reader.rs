use crate::archive::Archive;
use crate::error::{ArchiveError, ArchiveResult};
use crate::expression::Expression;
use crate::ids::{AtomId, NodeId};
use crate::node::{Node, PropertyType, CLASS_PROPERTY};
use crate::registry::UnarchiveContext;

/// Read-only view of one node, handed to registry factories.
///
/// Lookups never intern: a property name that was never atomized simply is
/// not found. Nested expressions are unarchived through the same archive and
/// context, so shared nodes resolve to their cached instance.
pub struct NodeReader<'a, E> {
    archive: &'a Archive<E>,
    ctx: UnarchiveContext<'a, E>,
    id: NodeId,
    node: &'a Node<E>,
}

impl<'a, E: Expression> NodeReader<'a, E> {
    pub(crate) fn new(
        archive: &'a Archive<E>,
        ctx: UnarchiveContext<'a, E>,
        id: NodeId,
        node: &'a Node<E>,
    ) -> Self {
        Self {
            archive,
            ctx,
            id,
            node,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node<E> {
        self.node
    }

    pub fn archive(&self) -> &'a Archive<E> {
        self.archive
    }

    /// Caller-supplied symbols for name reconciliation.
    pub fn symbols(&self) -> &'a [E] {
        self.ctx.symbols()
    }

    pub fn context(&self) -> UnarchiveContext<'a, E> {
        self.ctx
    }

    /// The node's type tag.
    pub fn class(&self) -> Option<&'a str> {
        self.find_string(CLASS_PROPERTY)
    }

    pub fn find_bool(&self, name: &str) -> Option<bool> {
        self.find_value(name, PropertyType::Bool).map(|v| v != 0)
    }

    pub fn find_unsigned(&self, name: &str) -> Option<u64> {
        self.find_value(name, PropertyType::Unsigned)
    }

    pub fn find_string(&self, name: &str) -> Option<&'a str> {
        let value = self.find_value(name, PropertyType::String)?;
        let atom = AtomId::from_value(value).ok()?;
        self.archive.unatomize(atom).ok()
    }

    /// Unarchive the `index`-th (0-based) expression property named `name`.
    ///
    /// Returns `Ok(None)` if there is no such property; errors only come from
    /// reconstructing the referenced node.
    pub fn find_ex(&self, name: &str, index: usize) -> ArchiveResult<Option<E>> {
        let Some(atom) = self.archive.atoms().lookup(name) else {
            return Ok(None);
        };
        match self.node.find_nth(atom, PropertyType::Node, index) {
            Some(prop) => {
                let id = NodeId::from_value(prop.value)?;
                self.archive.unarchive_node(self.ctx, id).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Number of expression properties named `name`.
    pub fn count_ex(&self, name: &str) -> usize {
        self.archive
            .atoms()
            .lookup(name)
            .map_or(0, |atom| self.node.matching(atom, PropertyType::Node).count())
    }

    /// Unarchive every expression property named `name`, in order.
    pub fn find_all_ex(&self, name: &str) -> ArchiveResult<Vec<E>> {
        let Some(atom) = self.archive.atoms().lookup(name) else {
            return Ok(Vec::new());
        };
        self.node
            .matching(atom, PropertyType::Node)
            .map(|prop| {
                let id = NodeId::from_value(prop.value)?;
                self.archive.unarchive_node(self.ctx, id)
            })
            .collect()
    }

    /// Like [`find_ex`](Self::find_ex) but a missing property is an error.
    pub fn require_ex(&self, name: &str, index: usize) -> ArchiveResult<E> {
        self.find_ex(name, index)?
            .ok_or_else(|| self.missing(name))
    }

    /// Error for a required property this node lacks.
    pub fn missing(&self, property: &str) -> ArchiveError {
        ArchiveError::MissingProperty {
            class: self.class().unwrap_or("<unknown>").to_owned(),
            property: property.to_owned(),
        }
    }

    fn find_value(&self, name: &str, kind: PropertyType) -> Option<u64> {
        let atom = self.archive.atoms().lookup(name)?;
        self.node.find(atom, kind).map(|p| p.value)
    }
}
