//! Node disconnector — cut every relation touching one node.

use tracing::{debug, warn};

use crate::model::*;
use crate::{Error, Result};

/// Remove every relation that has `node_id` as subject or object from the
/// lists of the node's neighbours.
///
/// The node itself stays in the returned snapshot with its old lists;
/// taking it out of the map is up to the caller (see
/// [`crate::deletion::plan_node_deletion`]). Disconnecting twice gives the
/// same snapshot as disconnecting once.
pub fn disconnect_node(nodes: &Nodes, node_id: &NodeId) -> Result<Nodes> {
    let node = nodes.node(node_id)?;
    let mut updated = nodes.clone();
    let mut rewritten = 0usize;

    for relation in node.relations() {
        let Some(other_id) = relation.other_end(node_id) else {
            warn!(node = %node_id, %relation, "relation does not name its holder");
            return Err(Error::InvariantViolation(format!(
                "{relation} is listed by {node_id} but does not touch it"
            )));
        };
        if other_id == node_id {
            continue;
        }
        let Some(neighbour) = nodes.get(other_id) else {
            warn!(node = %node_id, %relation, "relation points at missing node");
            return Err(Error::InvariantViolation(format!(
                "{relation} on {node_id} refers to missing node {other_id}"
            )));
        };
        updated.insert(KnowNode {
            id: neighbour.id.clone(),
            text: neighbour.text.clone(),
            node_type: neighbour.node_type,
            relations_to_objects: untouched_by(&neighbour.relations_to_objects, node_id),
            relations_to_subjects: untouched_by(&neighbour.relations_to_subjects, node_id),
        });
        rewritten += 1;
    }

    debug!(node = %node_id, rewritten, "disconnected node");
    Ok(updated)
}

fn untouched_by(relations: &Relations, node_id: &NodeId) -> Relations {
    relations.iter().filter(|r| !r.touches(node_id)).cloned().collect()
}
