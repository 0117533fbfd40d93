//! Nodes — one immutable snapshot of the whole graph.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use hashbrown::{Equivalent, HashMap, HashSet};
use serde::{Deserialize, Serialize};

use super::{KnowNode, NodeId};
use crate::{Error, Result};

/// Mapping from node id to node.
///
/// Node bodies are shared between snapshots: cloning a `Nodes` copies
/// pointers, and an operation only allocates the entries it rewrites.
/// Equality compares node values, not pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nodes {
    map: HashMap<NodeId, Arc<KnowNode>>,
}

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get<Q>(&self, id: &Q) -> Option<&KnowNode>
    where
        Q: ?Sized + Hash + Equivalent<NodeId>,
    {
        self.map.get(id).map(Arc::as_ref)
    }

    /// Like [`Nodes::get`] but a missing id is an error.
    pub fn node<Q>(&self, id: &Q) -> Result<&KnowNode>
    where
        Q: ?Sized + Hash + Equivalent<NodeId> + Display,
    {
        self.get(id).ok_or_else(|| Error::NotFound(format!("Node {id}")))
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<NodeId>,
    {
        self.map.contains_key(id)
    }

    /// Insert or replace a node in place. Used while building a new
    /// snapshot; the snapshot handed out by an operation is never touched
    /// again.
    pub fn insert(&mut self, node: KnowNode) -> Option<Arc<KnowNode>> {
        self.map.insert(node.id.clone(), Arc::new(node))
    }

    pub fn remove<Q>(&mut self, id: &Q) -> Option<Arc<KnowNode>>
    where
        Q: ?Sized + Hash + Equivalent<NodeId>,
    {
        self.map.remove(id)
    }

    /// New snapshot with `node` set.
    pub fn with(&self, node: KnowNode) -> Self {
        let mut next = self.clone();
        next.insert(node);
        next
    }

    /// New snapshot with every entry of `other` set over `self`.
    pub fn merge(&self, other: &Nodes) -> Self {
        let mut next = self.clone();
        next.map
            .extend(other.map.iter().map(|(id, node)| (id.clone(), Arc::clone(node))));
        next
    }

    /// New snapshot without the given ids.
    pub fn remove_all<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> Self {
        let mut next = self.clone();
        for id in ids {
            next.map.remove(id);
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowNode> {
        self.map.values().map(Arc::as_ref)
    }

    /// Map keys paired with the nodes stored under them.
    pub fn entries(&self) -> impl Iterator<Item = (&NodeId, &KnowNode)> {
        self.map.iter().map(|(id, node)| (id, node.as_ref()))
    }

    pub fn ids(&self) -> HashSet<NodeId> {
        self.map.keys().cloned().collect()
    }

    /// Whether `id` refers to the very same node allocation in both
    /// snapshots, i.e. the entry was not rewritten between them.
    pub fn shares_entry<Q>(&self, other: &Nodes, id: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<NodeId>,
    {
        match (self.map.get(id), other.map.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FromIterator<KnowNode> for Nodes {
    fn from_iter<I: IntoIterator<Item = KnowNode>>(iter: I) -> Self {
        let mut nodes = Nodes::new();
        for node in iter {
            nodes.insert(node);
        }
        nodes
    }
}

impl Extend<KnowNode> for Nodes {
    fn extend<I: IntoIterator<Item = KnowNode>>(&mut self, iter: I) {
        for node in iter {
            self.insert(node);
        }
    }
}
