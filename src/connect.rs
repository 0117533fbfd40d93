//! Relation connector — create, update and reorder typed relations.
//!
//! Every relation lives twice: in the subject's `relations_to_objects` and
//! in the object's `relations_to_subjects`. All functions here keep both
//! copies in step and return a new snapshot; the input snapshot is never
//! touched, and nothing is returned unless the whole change succeeded.
//!
//! ## Positions
//!
//! Target positions are *logical*: slot `k` among the node's relations of
//! the same type, not the raw index in the mixed-type list. That lets a
//! view reorder its RELEVANT items without disturbing interleaved
//! CONTAINS items.

use tracing::{debug, warn};

use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Placement
// ============================================================================

/// Where a connect should put the relation in each endpoint's list.
///
/// `None` means append on insert and leave the list alone on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    /// Logical slot in the object's `relations_to_subjects`.
    pub to_subjects: Option<usize>,
    /// Logical slot in the subject's `relations_to_objects`.
    pub to_objects: Option<usize>,
}

impl Placement {
    pub fn new(to_subjects: Option<usize>, to_objects: Option<usize>) -> Self {
        Self { to_subjects, to_objects }
    }

    pub fn append() -> Self {
        Self::default()
    }
}

/// Translate a logical slot among relations of `relation_type` into a raw
/// index of `relations`.
///
/// Returns the raw index of the relation currently holding that slot, or
/// `relations.len()` when the slot is past the last relation of the type.
pub fn map_index(
    relations: &[Relation],
    relation_type: RelationType,
    index: Option<usize>,
) -> Option<usize> {
    let index = index?;
    Some(
        relations
            .iter()
            .enumerate()
            .filter(|(_, rel)| rel.relation_type == relation_type)
            .map(|(raw, _)| raw)
            .nth(index)
            .unwrap_or(relations.len()),
    )
}

// ============================================================================
// Connect
// ============================================================================

/// Connect `subject_id -[relation_type]-> object_id`.
///
/// Inserts the relation into both endpoints, or, if it already exists,
/// moves it to the requested slots. Fails with [`Error::NotFound`] if an
/// endpoint is missing and with [`Error::InvariantViolation`] if the
/// relation is present on one side only.
pub fn connect_nodes(
    relation_type: RelationType,
    subject_id: &NodeId,
    object_id: &NodeId,
    nodes: &Nodes,
    placement: Placement,
) -> Result<Nodes> {
    let subject = nodes.node(subject_id)?;
    let object = nodes.node(object_id)?;
    let relation = Relation::new(relation_type, subject_id.clone(), object_id.clone());

    let existing_to_subject = object.relations_to_subjects.iter().position(|r| *r == relation);
    let existing_to_object = subject.relations_to_objects.iter().position(|r| *r == relation);

    let at_object = map_index(&object.relations_to_subjects, relation_type, placement.to_subjects);
    let at_subject = map_index(&subject.relations_to_objects, relation_type, placement.to_objects);

    let (to_subjects, to_objects) = match (existing_to_subject, existing_to_object) {
        (Some(in_object), Some(in_subject)) => {
            debug!(%relation, ?at_object, ?at_subject, "reordering existing relation");
            (
                reinsert(&object.relations_to_subjects, in_object, at_object),
                reinsert(&subject.relations_to_objects, in_subject, at_subject),
            )
        }
        (None, None) => {
            debug!(%relation, ?at_object, ?at_subject, "inserting relation");
            (
                insert(&object.relations_to_subjects, at_object, relation.clone()),
                insert(&subject.relations_to_objects, at_subject, relation),
            )
        }
        (in_object, in_subject) => {
            warn!(
                %relation,
                in_object = in_object.is_some(),
                in_subject = in_subject.is_some(),
                "relation mirrored on one side only"
            );
            return Err(Error::InvariantViolation(format!(
                "{relation} is listed by {} but not by {}",
                if in_subject.is_some() { subject_id } else { object_id },
                if in_subject.is_some() { object_id } else { subject_id },
            )));
        }
    };

    let mut updated = nodes.clone();
    if subject_id == object_id {
        let node = subject.with_relations_to_objects(to_objects);
        updated.insert(node.with_relations_to_subjects(to_subjects));
    } else {
        updated.insert(object.with_relations_to_subjects(to_subjects));
        updated.insert(subject.with_relations_to_objects(to_objects));
    }
    Ok(updated)
}

fn insert(relations: &Relations, at: Option<usize>, relation: Relation) -> Relations {
    let mut next = relations.clone();
    match at {
        Some(at) => next.insert(at.min(next.len()), relation),
        None => next.push(relation),
    }
    next
}

/// Move the entry at `from` to raw index `to` (as mapped against the list
/// before removal). No target leaves the list as it is.
fn reinsert(relations: &Relations, from: usize, to: Option<usize>) -> Relations {
    let mut next = relations.clone();
    if let Some(to) = to {
        let relation = next.remove(from);
        next.insert(to.min(next.len()), relation);
    }
    next
}

pub fn connect_relevant_nodes(
    subject_id: &NodeId,
    object_id: &NodeId,
    nodes: &Nodes,
    placement: Placement,
) -> Result<Nodes> {
    connect_nodes(RelationType::Relevant, subject_id, object_id, nodes, placement)
}

pub fn connect_containing_nodes(
    subject_id: &NodeId,
    object_id: &NodeId,
    nodes: &Nodes,
    placement: Placement,
) -> Result<Nodes> {
    connect_nodes(RelationType::Contains, subject_id, object_id, nodes, placement)
}

/// Make every subject in `subject_ids` RELEVANT to `object_id`, in input
/// order, appending on both sides.
pub fn bulk_connect_relevant_nodes(
    subject_ids: &[NodeId],
    object_id: &NodeId,
    nodes: &Nodes,
) -> Result<Nodes> {
    subject_ids.iter().try_fold(nodes.clone(), |acc, subject_id| {
        connect_relevant_nodes(subject_id, object_id, &acc, Placement::append())
    })
}

// ============================================================================
// Removal
// ============================================================================

fn without_relation(relations: &Relations, relation: &Relation) -> Relations {
    relations.iter().filter(|r| *r != relation).cloned().collect()
}

/// Drop `node -[relation_type]-> object_id` from the node's own
/// `relations_to_objects`. The object's mirror entry is not touched.
pub fn remove_relation_to_object(
    node: &KnowNode,
    object_id: &NodeId,
    relation_type: RelationType,
) -> KnowNode {
    let relation = Relation::new(relation_type, node.id.clone(), object_id.clone());
    node.with_relations_to_objects(without_relation(&node.relations_to_objects, &relation))
}

/// Drop `subject_id -[relation_type]-> node` from the node's own
/// `relations_to_subjects`. The subject's mirror entry is not touched.
pub fn remove_relation_to_subject(
    node: &KnowNode,
    subject_id: &NodeId,
    relation_type: RelationType,
) -> KnowNode {
    let relation = Relation::new(relation_type, subject_id.clone(), node.id.clone());
    node.with_relations_to_subjects(without_relation(&node.relations_to_subjects, &relation))
}

/// Remove one relation from both of its endpoints.
///
/// Removing a relation that does not exist returns an equal snapshot.
pub fn disconnect_relation(
    relation_type: RelationType,
    subject_id: &NodeId,
    object_id: &NodeId,
    nodes: &Nodes,
) -> Result<Nodes> {
    let subject = nodes.node(subject_id)?;
    let object = nodes.node(object_id)?;
    let relation = Relation::new(relation_type, subject_id.clone(), object_id.clone());

    let in_subject = subject.relations_to_objects.contains(&relation);
    let in_object = object.relations_to_subjects.contains(&relation);
    if in_subject != in_object {
        warn!(%relation, in_subject, in_object, "relation mirrored on one side only");
        return Err(Error::InvariantViolation(format!(
            "{relation} is not listed by both endpoints"
        )));
    }
    if !in_subject {
        return Ok(nodes.clone());
    }

    debug!(%relation, "removing relation");
    let mut updated = nodes.clone();
    if subject_id == object_id {
        let node = remove_relation_to_object(subject, object_id, relation_type);
        updated.insert(remove_relation_to_subject(&node, subject_id, relation_type));
    } else {
        updated.insert(remove_relation_to_object(subject, object_id, relation_type));
        updated.insert(remove_relation_to_subject(object, subject_id, relation_type));
    }
    Ok(updated)
}

// ============================================================================
// Display reordering
// ============================================================================

/// Reorder a node's `relations_to_subjects` after the user dragged item
/// `old_index` onto item `new_index` of `displayed`, the subject ids in
/// on-screen order.
///
/// The dragged relation is removed and reinserted at the raw index the
/// target subject's relation held before the move.
pub fn move_relations(
    displayed: &[NodeId],
    relations: &Relations,
    old_index: usize,
    new_index: usize,
) -> Result<Relations> {
    let shown = |index: usize| {
        displayed
            .get(index)
            .ok_or(Error::InvalidIndex { index, len: displayed.len() })
    };
    let raw_index = |subject: &NodeId| {
        relations
            .iter()
            .position(|rel| rel.a == *subject)
            .ok_or_else(|| Error::NotFound(format!("Relation from {subject}")))
    };

    let old_raw = raw_index(shown(old_index)?)?;
    let new_raw = raw_index(shown(new_index)?)?;

    let mut next = relations.clone();
    let relation = next.remove(old_raw);
    next.insert(new_raw.min(next.len()), relation);
    Ok(next)
}

// ============================================================================
// Tests
// ============================================================================
