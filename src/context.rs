//! Mutation context — chain graph edits without touching the original.
//!
//! ```rust
//! use know_graph::{MutationContext, Nodes, NodeType};
//!
//! # fn main() -> know_graph::Result<()> {
//! let ctx = MutationContext::new(Nodes::new()).add_new_node("Rust", NodeType::Topic);
//! let topic = ctx.last_added().cloned().unwrap();
//! let ctx = ctx.add_new_node("ownership notes", NodeType::Note);
//! let note = ctx.last_added().cloned().unwrap();
//! let ctx = ctx.connect_relevant(&note, &topic)?;
//! assert_eq!(ctx.nodes().len(), 2);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::connect::{connect_containing_nodes, connect_relevant_nodes, Placement};
use crate::model::*;
use crate::Result;

/// A snapshot plus the id generator used for new nodes.
///
/// Every step returns a new context; the one it was called on keeps its
/// snapshot. Persist only the snapshot of the last context in a chain.
#[derive(Clone)]
pub struct MutationContext {
    nodes: Nodes,
    ids: Arc<dyn IdGenerator>,
    last_added: Option<NodeId>,
}

impl MutationContext {
    /// Context over `nodes` that creates nodes with random UUIDs.
    pub fn new(nodes: Nodes) -> Self {
        Self::with_ids(nodes, Arc::new(UuidGenerator))
    }

    pub fn with_ids(nodes: Nodes, ids: Arc<dyn IdGenerator>) -> Self {
        Self { nodes, ids, last_added: None }
    }

    fn next(&self, nodes: Nodes) -> Self {
        Self { nodes, ids: Arc::clone(&self.ids), last_added: self.last_added.clone() }
    }

    pub fn nodes(&self) -> &Nodes {
        &self.nodes
    }

    pub fn into_nodes(self) -> Nodes {
        self.nodes
    }

    /// Id of the node created by the most recent [`add_new_node`] in this
    /// chain.
    ///
    /// [`add_new_node`]: MutationContext::add_new_node
    pub fn last_added(&self) -> Option<&NodeId> {
        self.last_added.as_ref()
    }

    /// Insert or replace `node`.
    pub fn set(&self, node: KnowNode) -> Self {
        self.next(self.nodes.with(node))
    }

    /// Create an unconnected node with a fresh id and insert it.
    pub fn add_new_node(&self, text: impl Into<String>, node_type: NodeType) -> Self {
        let node = new_node_with(self.ids.as_ref(), text, node_type);
        let id = node.id.clone();
        Self { last_added: Some(id), ..self.set(node) }
    }

    pub fn connect_relevant(&self, subject_id: &NodeId, object_id: &NodeId) -> Result<Self> {
        let nodes =
            connect_relevant_nodes(subject_id, object_id, &self.nodes, Placement::append())?;
        Ok(self.next(nodes))
    }

    pub fn connect_contains(&self, subject_id: &NodeId, object_id: &NodeId) -> Result<Self> {
        let nodes =
            connect_containing_nodes(subject_id, object_id, &self.nodes, Placement::append())?;
        Ok(self.next(nodes))
    }
}

impl fmt::Debug for MutationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationContext")
            .field("nodes", &self.nodes.len())
            .field("last_added", &self.last_added)
            .finish_non_exhaustive()
    }
}

impl From<Nodes> for MutationContext {
    fn from(nodes: Nodes) -> Self {
        Self::new(nodes)
    }
}
