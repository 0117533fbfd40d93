//! Relation (directed, typed edge) between two nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::NodeId;

/// Kind of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// Subject is relevant to the object
    Relevant,
    /// Subject contains the object
    Contains,
    /// Subject is a summary of the object
    Summarizes,
}

impl RelationType {
    pub const ALL: [RelationType; 3] = [
        RelationType::Relevant,
        RelationType::Contains,
        RelationType::Summarizes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Relevant => "RELEVANT",
            RelationType::Contains => "CONTAINS",
            RelationType::Summarizes => "SUMMARIZES",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown relation type: {s}"))
    }
}

/// A directed relation `a -[relation_type]-> b`.
///
/// Identity is the whole triple: two relations are the same relation iff
/// type, subject and object all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub relation_type: RelationType,
    /// Subject.
    pub a: NodeId,
    /// Object.
    pub b: NodeId,
}

/// Ordered adjacency list of one node.
pub type Relations = SmallVec<[Relation; 4]>;

impl Relation {
    pub fn new(relation_type: RelationType, a: NodeId, b: NodeId) -> Self {
        Self { relation_type, a, b }
    }

    /// The "other" end of the relation from the given node.
    pub fn other_end(&self, from: &NodeId) -> Option<&NodeId> {
        if *from == self.a {
            Some(&self.b)
        } else if *from == self.b {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        self.a == *id || self.b == *id
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[:{}]->({})", self.a, self.relation_type, self.b)
    }
}
