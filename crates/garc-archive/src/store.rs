//! Node storage with identity-based deduplication.

use std::collections::HashMap;

use crate::error::{ArchiveError, ArchiveResult};
use crate::expression::Expression;
use crate::ids::{InstanceKey, NodeId};
use crate::node::Node;

/// Ordered collection of archive nodes.
///
/// Nodes are addressed by dense [`NodeId`]s. Insertion deduplicates on the
/// identity of the expression instance cached in the candidate node, never
/// on property values: two value-equal instances produce two nodes.
#[derive(Clone, Debug)]
pub struct NodeStore<E> {
    nodes: Vec<Node<E>>,
    /// Instance key -> lowest node caching that instance.
    instances: HashMap<InstanceKey, NodeId>,
}

impl<E> Default for NodeStore<E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            instances: HashMap::new(),
        }
    }
}

impl<E> NodeStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store built from nodes in id order, without any identity index.
    pub(crate) fn from_nodes(nodes: Vec<Node<E>>) -> Self {
        Self {
            nodes,
            instances: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Retrieve a node by id.
    pub fn get_node(&self, id: NodeId) -> ArchiveResult<&Node<E>> {
        self.nodes
            .get(id.index())
            .ok_or(ArchiveError::NodeOutOfRange {
                id: id.into(),
                len: self.nodes.len(),
            })
    }

    /// Nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<E>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_index(i), n))
    }

    /// Drop every cached expression, keeping structure.
    pub fn forget(&mut self) {
        for node in &mut self.nodes {
            node.forget();
        }
        self.instances.clear();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.instances.clear();
    }
}

impl<E: Expression> NodeStore<E> {
    /// Insert `candidate` unless a node already caches the same instance.
    ///
    /// Returns the id of the existing node or of the newly appended one.
    pub fn add_node(&mut self, candidate: Node<E>) -> NodeId {
        let key = candidate.cached().map(E::instance_key);
        if let Some(id) = key.and_then(|k| self.instances.get(&k).copied()) {
            return id;
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(candidate);
        if let Some(key) = key {
            self.instances.insert(key, id);
        }
        id
    }

    /// Node that caches the instance with this key, if any.
    pub fn find_instance(&self, key: InstanceKey) -> Option<NodeId> {
        self.instances.get(&key).copied()
    }

    /// Rebuild the identity index from node caches.
    ///
    /// Caches filled during unarchiving bypass [`add_node`](Self::add_node),
    /// so the index is refreshed before each archiving pass. When several
    /// nodes cache one instance, the lowest id wins.
    pub(crate) fn reindex(&mut self) {
        self.instances.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(expr) = node.cached() {
                self.instances
                    .entry(expr.instance_key())
                    .or_insert(NodeId::from_index(i));
            }
        }
    }
}
