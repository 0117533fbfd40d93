//! Dual-index integrity checks and explicit repair.
//!
//! The connector and disconnector never produce these states. They show
//! up when snapshots are edited by hand, merged from diverging copies, or
//! loaded from a damaged document.

use std::fmt;

use hashbrown::HashSet;
use tracing::{info, warn};

use crate::model::*;
use crate::{Error, Result};

/// One way a snapshot can break the dual-index invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Stored under a key other than its own id.
    Miskeyed { key: NodeId, id: NodeId },
    /// Listed by a node that is not the endpoint the list is for.
    Misplaced { holder: NodeId, relation: Relation },
    /// The other endpoint is not in the snapshot.
    Dangling { holder: NodeId, relation: Relation, missing: NodeId },
    /// The other endpoint does not list the relation back.
    Unmirrored { holder: NodeId, relation: Relation },
    /// Listed more than once by the same node.
    Duplicate { holder: NodeId, relation: Relation },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Miskeyed { key, id } => {
                write!(f, "node {id} is stored under key {key}")
            }
            Violation::Misplaced { holder, relation } => {
                write!(f, "{relation} is listed by {holder}, which is not its endpoint")
            }
            Violation::Dangling { holder, relation, missing } => {
                write!(f, "{relation} on {holder} refers to missing node {missing}")
            }
            Violation::Unmirrored { holder, relation } => {
                write!(f, "{relation} on {holder} is not mirrored by the other endpoint")
            }
            Violation::Duplicate { holder, relation } => {
                write!(f, "{relation} is listed more than once by {holder}")
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Objects,
    Subjects,
}

impl Side {
    /// (endpoint that must hold it, endpoint that must mirror it)
    fn ends(self, relation: &Relation) -> (&NodeId, &NodeId) {
        match self {
            Side::Objects => (&relation.a, &relation.b),
            Side::Subjects => (&relation.b, &relation.a),
        }
    }

    fn list(self, node: &KnowNode) -> &Relations {
        match self {
            Side::Objects => &node.relations_to_objects,
            Side::Subjects => &node.relations_to_subjects,
        }
    }

    fn mirror(self) -> Side {
        match self {
            Side::Objects => Side::Subjects,
            Side::Subjects => Side::Objects,
        }
    }
}

fn check_entry(
    nodes: &Nodes,
    holder: &KnowNode,
    side: Side,
    relation: &Relation,
) -> Option<Violation> {
    let (own, other) = side.ends(relation);
    if *own != holder.id {
        return Some(Violation::Misplaced {
            holder: holder.id.clone(),
            relation: relation.clone(),
        });
    }
    let Some(other_node) = nodes.get(other) else {
        return Some(Violation::Dangling {
            holder: holder.id.clone(),
            relation: relation.clone(),
            missing: other.clone(),
        });
    };
    if !side.mirror().list(other_node).contains(relation) {
        return Some(Violation::Unmirrored {
            holder: holder.id.clone(),
            relation: relation.clone(),
        });
    }
    None
}

/// Every violation in `nodes`, grouped by map key in key order.
pub fn find_violations(nodes: &Nodes) -> Vec<Violation> {
    let mut holders: Vec<(&NodeId, &KnowNode)> = nodes.entries().collect();
    holders.sort_by(|x, y| x.0.cmp(y.0));

    let mut found = Vec::new();
    for (key, holder) in holders {
        if *key != holder.id {
            found.push(Violation::Miskeyed { key: key.clone(), id: holder.id.clone() });
        }
        for side in [Side::Objects, Side::Subjects] {
            let mut seen = HashSet::new();
            for relation in side.list(holder) {
                if !seen.insert(relation) {
                    found.push(Violation::Duplicate {
                        holder: holder.id.clone(),
                        relation: relation.clone(),
                    });
                    continue;
                }
                found.extend(check_entry(nodes, holder, side, relation));
            }
        }
    }
    found
}

/// Fail with the first violation found.
pub fn check_integrity(nodes: &Nodes) -> Result<()> {
    match find_violations(nodes).into_iter().next() {
        None => Ok(()),
        Some(violation) => {
            warn!(%violation, "snapshot violates dual-index invariant");
            Err(Error::InvariantViolation(violation.to_string()))
        }
    }
}

/// Move miskeyed nodes under their own id. A node whose id is already
/// taken by a correctly keyed entry is dropped.
fn rekey(nodes: &Nodes) -> (Nodes, usize) {
    let mut miskeyed: Vec<(&NodeId, &KnowNode)> =
        nodes.entries().filter(|(key, node)| **key != node.id).collect();
    if miskeyed.is_empty() {
        return (nodes.clone(), 0);
    }
    miskeyed.sort_by(|x, y| x.0.cmp(y.0));

    let mut rekeyed = nodes.clone();
    for (key, _) in &miskeyed {
        rekeyed.remove(*key);
    }
    for (_, node) in &miskeyed {
        if !rekeyed.contains(&node.id) {
            rekeyed.insert((*node).clone());
        }
    }
    (rekeyed, miskeyed.len())
}

/// Drop every misplaced, dangling, unmirrored or duplicate entry, after
/// moving miskeyed nodes back under their own id.
///
/// Only call this deliberately: it discards relations instead of
/// reporting them.
pub fn repair(nodes: &Nodes) -> Nodes {
    let (rekeyed, miskeyed) = rekey(nodes);
    let mut repaired = rekeyed.clone();
    let mut dropped = 0usize;

    for holder in rekeyed.iter() {
        let mut keep = |side: Side| -> Relations {
            let mut seen = HashSet::new();
            side.list(holder)
                .iter()
                .filter(|relation| {
                    let ok = seen.insert(*relation)
                        && check_entry(&rekeyed, holder, side, relation).is_none();
                    if !ok {
                        dropped += 1;
                    }
                    ok
                })
                .cloned()
                .collect()
        };
        let to_objects = keep(Side::Objects);
        let to_subjects = keep(Side::Subjects);
        if to_objects != holder.relations_to_objects
            || to_subjects != holder.relations_to_subjects
        {
            repaired.insert(KnowNode {
                id: holder.id.clone(),
                text: holder.text.clone(),
                node_type: holder.node_type,
                relations_to_objects: to_objects,
                relations_to_subjects: to_subjects,
            });
        }
    }

    if dropped > 0 || miskeyed > 0 {
        info!(dropped, miskeyed, "repaired snapshot");
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::{
        connect_containing_nodes, connect_relevant_nodes, remove_relation_to_subject, Placement,
    };
    use pretty_assertions::assert_eq;

    fn healthy() -> Nodes {
        let nodes: Nodes = ["a", "b", "c"]
            .into_iter()
            .map(|s| KnowNode::new(s.into(), s, NodeType::Note))
            .collect();
        let nodes =
            connect_relevant_nodes(&"a".into(), &"b".into(), &nodes, Placement::append()).unwrap();
        connect_containing_nodes(&"b".into(), &"c".into(), &nodes, Placement::append()).unwrap()
    }

    #[test]
    fn test_healthy_graph_passes() {
        let nodes = healthy();
        assert!(find_violations(&nodes).is_empty());
        check_integrity(&nodes).unwrap();
        assert_eq!(repair(&nodes), nodes);
    }

    #[test]
    fn test_detects_unmirrored() {
        let nodes = healthy();
        let b = remove_relation_to_subject(
            nodes.get("b").unwrap(),
            &"a".into(),
            RelationType::Relevant,
        );
        let broken = nodes.with(b);

        let violations = find_violations(&broken);
        assert_eq!(
            violations,
            vec![Violation::Unmirrored {
                holder: "a".into(),
                relation: Relation::new(RelationType::Relevant, "a".into(), "b".into()),
            }]
        );
        assert!(matches!(check_integrity(&broken), Err(Error::InvariantViolation(_))));

        let fixed = repair(&broken);
        assert!(find_violations(&fixed).is_empty());
        assert!(fixed.get("a").unwrap().relations_to_objects.is_empty());
    }

    #[test]
    fn test_detects_dangling_and_duplicate() {
        let nodes = healthy();
        let broken = nodes.remove_all([&NodeId::from("c")]);
        let b = broken.get("b").unwrap();
        let mut doubled = b.relations_to_subjects.clone();
        doubled.push(doubled[0].clone());
        let broken = broken.with(b.with_relations_to_subjects(doubled));

        let violations = find_violations(&broken);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| {
            matches!(v, Violation::Dangling { missing, .. } if missing.as_str() == "c")
        }));
        assert!(violations.iter().any(|v| {
            matches!(v, Violation::Duplicate { holder, .. } if holder.as_str() == "b")
        }));

        let fixed = repair(&broken);
        assert!(find_violations(&fixed).is_empty());
        assert_eq!(fixed.get("b").unwrap().relations_to_subjects.len(), 1);
    }

    #[test]
    fn test_detects_misplaced() {
        let nodes = healthy();
        let c = nodes.get("c").unwrap();
        let stray = Relation::new(RelationType::Relevant, "a".into(), "b".into());
        let mut list = c.relations_to_objects.clone();
        list.push(stray.clone());
        let broken = nodes.with(c.with_relations_to_objects(list));

        assert_eq!(
            find_violations(&broken),
            vec![Violation::Misplaced { holder: "c".into(), relation: stray }]
        );
    }

    #[test]
    fn test_detects_miskeyed_node() {
        let broken: Nodes = serde_json::from_str(
            r#"{
                "x": {"id": "y", "text": "moved", "nodeType": "NOTE"},
                "o": {"id": "o", "text": "other", "nodeType": "NOTE"}
            }"#,
        )
        .unwrap();

        assert_eq!(
            find_violations(&broken),
            vec![Violation::Miskeyed { key: "x".into(), id: "y".into() }]
        );
        assert!(matches!(check_integrity(&broken), Err(Error::InvariantViolation(_))));

        let fixed = repair(&broken);
        assert!(find_violations(&fixed).is_empty());
        assert_eq!(fixed.ids(), [NodeId::from("o"), NodeId::from("y")].into_iter().collect());

        // connecting through the repaired snapshot keeps it consistent
        let linked =
            connect_relevant_nodes(&"y".into(), &"o".into(), &fixed, Placement::append()).unwrap();
        assert_eq!(linked.len(), 2);
        check_integrity(&linked).unwrap();
    }

    #[test]
    fn test_miskeyed_node_with_taken_id_is_dropped() {
        let broken: Nodes = serde_json::from_str(
            r#"{
                "x": {"id": "o", "text": "copy", "nodeType": "NOTE"},
                "o": {"id": "o", "text": "original", "nodeType": "NOTE"}
            }"#,
        )
        .unwrap();

        let fixed = repair(&broken);
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed.get("o").unwrap().text, "original");
    }
}
