//! Node identity: id generation and node construction.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use super::{KnowNode, NodeId, NodeType};

/// Source of fresh, globally unique node ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> NodeId;
}

/// Random (v4) UUIDs. The default generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> NodeId {
        NodeId::from(Uuid::new_v4().to_string())
    }
}

/// Deterministic `prefix-1`, `prefix-2`, ... ids. Unique per generator
/// only, so keep one generator per graph.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: AtomicU64::new(1) }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> NodeId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        NodeId::from(format!("{}-{n}", self.prefix))
    }
}

/// Fresh node with a random id and no relations.
pub fn new_node(text: impl Into<String>, node_type: NodeType) -> KnowNode {
    new_node_with(&UuidGenerator, text, node_type)
}

pub fn new_node_with(
    ids: &dyn IdGenerator,
    text: impl Into<String>,
    node_type: NodeType,
) -> KnowNode {
    KnowNode::new(ids.next_id(), text, node_type)
}
