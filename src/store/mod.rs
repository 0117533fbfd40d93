//! # Data Store Trait
//!
//! The contract between the graph handle and whatever keeps the graph
//! document durable. A store only moves opaque documents around; encoding
//! and decoding the snapshot happens here, on this side of the trait.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-process documents for tests/embedding |

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::Nodes;
use crate::Result;

pub use memory::MemoryStore;

// ============================================================================
// Configuration
// ============================================================================

/// How the graph handle reads and writes its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the document is stored under.
    pub document_key: String,
    /// Pretty-print the JSON document.
    pub pretty: bool,
    /// Refuse to open a document that breaks the dual-index invariant.
    pub verify_on_load: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            document_key: "know-graph.json".to_string(),
            pretty: false,
            verify_on_load: true,
        }
    }
}

// ============================================================================
// Document codec
// ============================================================================

#[derive(Serialize)]
struct DocumentRef<'a> {
    nodes: &'a Nodes,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    nodes: Nodes,
}

/// Encode a snapshot as `{"nodes": {...}}`.
pub fn encode_document(nodes: &Nodes, pretty: bool) -> Result<String> {
    let doc = DocumentRef { nodes };
    let text = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    Ok(text)
}

pub fn decode_document(text: &str) -> Result<Nodes> {
    let doc: Document = serde_json::from_str(text)?;
    Ok(doc.nodes)
}

// ============================================================================
// DataStore Trait
// ============================================================================

/// Durable home of graph documents.
///
/// Implementations must make a successful `save` visible to every later
/// `load` of the same key. A failed `save` must leave the previous
/// document in place.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// The document stored under `key`, or `None` if nothing was saved yet.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document stored under `key`.
    async fn save(&self, key: &str, document: String) -> Result<()>;
}
