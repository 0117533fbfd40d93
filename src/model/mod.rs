//! # Knowledge Graph Model
//!
//! Plain values shared by every operation: nodes, relations and the
//! `Nodes` snapshot map, plus id generation and read-only lookups.
//!
//! Design rule: no storage types here. This module does no I/O and no
//! async; id generators are the only shared state.

pub mod node;
pub mod relation;
pub mod nodes;
pub mod id;
pub mod query;

pub use node::{KnowNode, NodeId, NodeType};
pub use relation::{Relation, RelationType, Relations};
pub use nodes::Nodes;
pub use id::{new_node, new_node_with, IdGenerator, SequentialIds, UuidGenerator};
pub use query::{get_objects, get_subjects};
