//! Which connections a node shows by default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{KnowNode, NodeId, NodeType, RelationType};

/// A view over one node's relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayConnections {
    /// Nodes this node CONTAINS
    ContainsObjects,
    /// Nodes this node is RELEVANT to
    RelevantObjects,
    /// Nodes that are RELEVANT to this node
    RelevantSubjects,
}

impl DisplayConnections {
    pub const ALL: [DisplayConnections; 3] = [
        DisplayConnections::ContainsObjects,
        DisplayConnections::RelevantObjects,
        DisplayConnections::RelevantSubjects,
    ];

    pub fn relation_type(self) -> RelationType {
        match self {
            DisplayConnections::ContainsObjects => RelationType::Contains,
            DisplayConnections::RelevantObjects | DisplayConnections::RelevantSubjects => {
                RelationType::Relevant
            }
        }
    }

    /// Ids shown by this view, in display order.
    pub fn connected(self, node: &KnowNode) -> Vec<NodeId> {
        let relation_type = self.relation_type();
        match self {
            DisplayConnections::ContainsObjects | DisplayConnections::RelevantObjects => node
                .relations_to_objects
                .iter()
                .filter(|r| r.relation_type == relation_type)
                .map(|r| r.b.clone())
                .collect(),
            DisplayConnections::RelevantSubjects => node
                .relations_to_subjects
                .iter()
                .filter(|r| r.relation_type == relation_type)
                .map(|r| r.a.clone())
                .collect(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayConnections::ContainsObjects => "CONTAINS_OBJECTS",
            DisplayConnections::RelevantObjects => "RELEVANT_OBJECTS",
            DisplayConnections::RelevantSubjects => "RELEVANT_SUBJECTS",
        }
    }
}

impl fmt::Display for DisplayConnections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisplayConnections {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayConnections::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown display connections: {s}"))
    }
}

/// Containers open on their contents, quotes on what they are relevant
/// to, everything else on what is relevant to it.
pub fn default_display_connection(node_type: NodeType) -> DisplayConnections {
    match node_type {
        NodeType::Title | NodeType::Url | NodeType::View => DisplayConnections::ContainsObjects,
        NodeType::Quote => DisplayConnections::RelevantObjects,
        NodeType::Note | NodeType::Topic => DisplayConnections::RelevantSubjects,
    }
}
