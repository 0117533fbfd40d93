//! Deletion planner — work out what goes when a node is deleted.
//!
//! Planning is separate from applying so that a caller that persists the
//! result can write `to_update` and delete `to_remove` as one change.

use hashbrown::HashSet;
use tracing::debug;

use crate::disconnect::disconnect_node;
use crate::model::*;
use crate::Result;

/// Outcome of [`plan_node_deletion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Snapshot with the node disconnected from all its neighbours.
    pub to_update: Nodes,
    /// The node itself plus every dependent that would be left orphaned.
    pub to_remove: HashSet<NodeId>,
}

impl DeletionPlan {
    /// `to_update` without the `to_remove` entries.
    pub fn apply(&self) -> Nodes {
        self.to_update.remove_all(&self.to_remove)
    }
}

/// Plan the deletion of `node`.
///
/// A dependent object (see [`NodeType::is_dependent`]) reached through
/// CONTAINS is removed along with `node` when that relation is its only
/// subject relation and it has no objects of its own.
pub fn plan_node_deletion(nodes: &Nodes, node: &KnowNode) -> Result<DeletionPlan> {
    let dependent_types: Vec<NodeType> =
        NodeType::ALL.into_iter().filter(|t| t.is_dependent()).collect();

    let orphans: Vec<NodeId> =
        get_objects(nodes, node, &dependent_types, &[RelationType::Contains])?
            .into_iter()
            .filter(|dep| {
                dep.relations_to_subjects.len() == 1 && dep.relations_to_objects.is_empty()
            })
            .map(|dep| dep.id.clone())
            .collect();

    let to_update = disconnect_node(nodes, &node.id)?;

    let mut to_remove = HashSet::with_capacity(orphans.len() + 1);
    to_remove.insert(node.id.clone());
    to_remove.extend(orphans);

    debug!(node = %node.id, cascade = to_remove.len() - 1, "planned node deletion");
    Ok(DeletionPlan { to_update, to_remove })
}

/// Plan and apply the deletion of `node_id` in one step.
pub fn delete_node(nodes: &Nodes, node_id: &NodeId) -> Result<Nodes> {
    let node = nodes.node(node_id)?;
    Ok(plan_node_deletion(nodes, node)?.apply())
}
