//! Read-only neighbour lookups.

use super::{KnowNode, Nodes, NodeType, Relation, RelationType};
use crate::{Error, Result};

/// Objects of `node` in `relations_to_objects` order, keeping those whose
/// relation type is in `relation_types` and whose node type is in
/// `node_types`. An empty filter accepts everything.
pub fn get_objects<'n>(
    nodes: &'n Nodes,
    node: &KnowNode,
    node_types: &[NodeType],
    relation_types: &[RelationType],
) -> Result<Vec<&'n KnowNode>> {
    neighbours(nodes, node, &node.relations_to_objects, |r| &r.b, node_types, relation_types)
}

/// Subjects of `node` in `relations_to_subjects` order, filtered as in
/// [`get_objects`].
pub fn get_subjects<'n>(
    nodes: &'n Nodes,
    node: &KnowNode,
    node_types: &[NodeType],
    relation_types: &[RelationType],
) -> Result<Vec<&'n KnowNode>> {
    neighbours(nodes, node, &node.relations_to_subjects, |r| &r.a, node_types, relation_types)
}

fn neighbours<'n>(
    nodes: &'n Nodes,
    node: &KnowNode,
    relations: &[Relation],
    end: impl Fn(&Relation) -> &super::NodeId,
    node_types: &[NodeType],
    relation_types: &[RelationType],
) -> Result<Vec<&'n KnowNode>> {
    let mut found = Vec::new();
    for relation in relations {
        if !relation_types.is_empty() && !relation_types.contains(&relation.relation_type) {
            continue;
        }
        let id = end(relation);
        let neighbour = nodes.get(id).ok_or_else(|| {
            tracing::warn!(
                node = %node.id,
                relation = %relation,
                "relation points at missing node"
            );
            Error::InvariantViolation(format!(
                "{relation} on {} refers to missing node {id}",
                node.id
            ))
        })?;
        if node_types.is_empty() || node_types.contains(&neighbour.node_type) {
            found.push(neighbour);
        }
    }
    Ok(found)
}
