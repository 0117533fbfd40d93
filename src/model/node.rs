//! Node in the knowledge graph.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Relation, Relations};

/// Opaque node identifier.
///
/// Backed by a shared string so relations, id sets and map keys can copy
/// it without reallocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// Kind of content a node carries. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Heading that groups other content
    Title,
    /// Link to an external resource
    Url,
    /// Saved arrangement of other nodes
    View,
    /// Excerpt taken from another node
    Quote,
    /// Free-form note
    Note,
    /// Subject area that notes are relevant to
    Topic,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Title,
        NodeType::Url,
        NodeType::View,
        NodeType::Quote,
        NodeType::Note,
        NodeType::Topic,
    ];

    /// Dependent nodes only exist to annotate the node that contains them
    /// and are removed together with it once nothing else refers to them.
    pub fn is_dependent(self) -> bool {
        match self {
            NodeType::Quote => true,
            NodeType::Title
            | NodeType::Url
            | NodeType::View
            | NodeType::Note
            | NodeType::Topic => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Title => "TITLE",
            NodeType::Url => "URL",
            NodeType::View => "VIEW",
            NodeType::Quote => "QUOTE",
            NodeType::Note => "NOTE",
            NodeType::Topic => "TOPIC",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown node type: {s}"))
    }
}

/// A node in the knowledge graph.
///
/// Both adjacency lists are ordered; the order drives how connected items
/// are displayed. Nodes are never edited in place inside a snapshot, every
/// change produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowNode {
    pub id: NodeId,
    pub text: String,
    pub node_type: NodeType,
    /// Relations where this node is the subject (`a`).
    #[serde(default)]
    pub relations_to_objects: Relations,
    /// Relations where this node is the object (`b`).
    #[serde(default)]
    pub relations_to_subjects: Relations,
}

impl KnowNode {
    pub fn new(id: NodeId, text: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id,
            text: text.into(),
            node_type,
            relations_to_objects: Relations::new(),
            relations_to_subjects: Relations::new(),
        }
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self { text: text.into(), ..self.clone() }
    }

    pub fn with_relations_to_objects(&self, relations: Relations) -> Self {
        Self {
            id: self.id.clone(),
            text: self.text.clone(),
            node_type: self.node_type,
            relations_to_objects: relations,
            relations_to_subjects: self.relations_to_subjects.clone(),
        }
    }

    pub fn with_relations_to_subjects(&self, relations: Relations) -> Self {
        Self {
            id: self.id.clone(),
            text: self.text.clone(),
            node_type: self.node_type,
            relations_to_objects: self.relations_to_objects.clone(),
            relations_to_subjects: relations,
        }
    }

    /// Every relation this node takes part in, objects first.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations_to_objects.iter().chain(self.relations_to_subjects.iter())
    }

    pub fn has_relations(&self) -> bool {
        !self.relations_to_objects.is_empty() || !self.relations_to_subjects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_roundtrip_str() {
        for t in NodeType::ALL {
            assert_eq!(t.as_str().parse::<NodeType>().unwrap(), t);
        }
        assert_eq!("quote".parse::<NodeType>().unwrap(), NodeType::Quote);
        assert!("PARAGRAPH".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_only_quotes_are_dependent() {
        let dependent: Vec<_> = NodeType::ALL.into_iter().filter(|t| t.is_dependent()).collect();
        assert_eq!(dependent, vec![NodeType::Quote]);
    }

    #[test]
    fn test_node_serializes_camel_case() {
        let node = KnowNode::new(NodeId::from("n1"), "hello", NodeType::Url);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["nodeType"], "URL");
        assert_eq!(json["id"], "n1");
        assert!(json["relationsToObjects"].as_array().unwrap().is_empty());
        assert!(json["relationsToSubjects"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_node_id_borrows_as_str() {
        let mut set = hashbrown::HashSet::new();
        set.insert(NodeId::from("abc"));
        assert!(set.contains("abc"));
    }
}
