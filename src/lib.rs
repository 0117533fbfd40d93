//! # know-graph — In-Memory Knowledge Graph
//!
//! Typed notes connected by directed, typed relations. Every relation is
//! stored twice, once on each endpoint, and every edit keeps both copies
//! in step.
//!
//! ## Design Principles
//!
//! 1. **Snapshots, not mutation**: every operation takes a `Nodes` snapshot
//!    and returns a new one; the input is never modified
//! 2. **All or nothing**: an operation either returns a fully consistent
//!    snapshot or an error, never a half-applied change
//! 3. **Type-scoped order**: positions are slots among relations of one
//!    type, so reordering one kind never disturbs another
//! 4. **Store behind a trait**: `DataStore` is the only place I/O happens
//!
//! ## Quick Start
//!
//! ```rust
//! use know_graph::{Graph, NodeType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> know_graph::Result<()> {
//! let graph = Graph::open_memory().await?;
//!
//! let ctx = graph.context().add_new_node("Reading list", NodeType::View);
//! let view = ctx.last_added().cloned().unwrap();
//! let ctx = ctx.add_new_node("\"Simplicity is prerequisite for reliability\"", NodeType::Quote);
//! let quote = ctx.last_added().cloned().unwrap();
//! graph.commit(ctx.connect_contains(&view, &quote)?).await?;
//!
//! // Deleting the view takes the quote with it: nothing else refers to it.
//! let removed = graph.delete_node(&view).await?;
//! assert_eq!(removed.len(), 2);
//! assert!(graph.nodes().is_empty());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod connect;
pub mod disconnect;
pub mod deletion;
pub mod context;
pub mod display;
pub mod integrity;
pub mod store;

use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    KnowNode, Nodes, NodeId, NodeType, Relation, RelationType, Relations,
    IdGenerator, UuidGenerator, SequentialIds, new_node, new_node_with,
    get_objects, get_subjects,
};

// ============================================================================
// Re-exports: Operations
// ============================================================================

pub use connect::{
    Placement, map_index, connect_nodes, connect_relevant_nodes, connect_containing_nodes,
    bulk_connect_relevant_nodes, remove_relation_to_object, remove_relation_to_subject,
    disconnect_relation, move_relations,
};
pub use disconnect::disconnect_node;
pub use deletion::{DeletionPlan, plan_node_deletion, delete_node};
pub use context::MutationContext;
pub use display::{DisplayConnections, default_display_connection};
pub use integrity::{Violation, find_violations, check_integrity, repair};

// ============================================================================
// Re-exports: Store
// ============================================================================

pub use store::{DataStore, MemoryStore, StoreConfig, encode_document, decode_document};

// ============================================================================
// Top-level Graph handle
// ============================================================================

/// The primary entry point. A `Graph` owns the current snapshot and writes
/// every change through to a [`DataStore`].
///
/// Writes are applied optimistically: the new snapshot is visible from
/// [`Graph::nodes`] as soon as the write starts, and is replaced by the
/// previous snapshot again if the store rejects it. Only one write is in
/// flight at a time; later writes wait and build on the result.
pub struct Graph<S: DataStore> {
    store: S,
    config: StoreConfig,
    snapshot: RwLock<Nodes>,
    writer: tokio::sync::Mutex<()>,
    ids: Arc<dyn IdGenerator>,
}

impl<S: DataStore> Graph<S> {
    /// Load the document named by `config` from `store`, or start empty if
    /// there is none.
    pub async fn open(store: S, config: StoreConfig) -> Result<Self> {
        let nodes = match store.load(&config.document_key).await? {
            Some(text) => store::decode_document(&text)?,
            None => Nodes::new(),
        };
        if config.verify_on_load {
            integrity::check_integrity(&nodes)?;
        }
        info!(key = %config.document_key, nodes = nodes.len(), "opened graph");

        Ok(Self {
            store,
            config,
            snapshot: RwLock::new(nodes),
            writer: tokio::sync::Mutex::new(()),
            ids: Arc::new(UuidGenerator),
        })
    }

    /// Use `ids` for nodes created through [`Graph::context`].
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// The current snapshot.
    pub fn nodes(&self) -> Nodes {
        self.snapshot.read().clone()
    }

    /// A mutation context over the current snapshot.
    pub fn context(&self) -> MutationContext {
        MutationContext::with_ids(self.nodes(), Arc::clone(&self.ids))
    }

    /// Set every node of `nodes` over the current snapshot.
    pub async fn upsert_nodes(&self, nodes: &Nodes) -> Result<()> {
        self.write("upsert", |current| Ok((current.merge(nodes), ()))).await
    }

    /// Persist the snapshot a chain of edits ended with.
    pub async fn commit(&self, ctx: MutationContext) -> Result<()> {
        self.upsert_nodes(ctx.nodes()).await
    }

    /// Set `to_update` over the current snapshot, then drop `to_remove`.
    pub async fn delete_nodes(&self, to_remove: &HashSet<NodeId>, to_update: &Nodes) -> Result<()> {
        self.write("delete", |current| Ok((current.merge(to_update).remove_all(to_remove), ())))
            .await
    }

    /// Delete `node_id` and its orphaned dependents. Returns the removed ids.
    pub async fn delete_node(&self, node_id: &NodeId) -> Result<HashSet<NodeId>> {
        self.write("delete", |current| {
            let plan = deletion::plan_node_deletion(current, current.node(node_id)?)?;
            Ok((plan.apply(), plan.to_remove))
        })
        .await
    }

    async fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Nodes) -> Result<(Nodes, T)>,
    ) -> Result<T> {
        let _in_flight = self.writer.lock().await;

        let previous = self.nodes();
        let (next, out) = f(&previous)?;
        let document = store::encode_document(&next, self.config.pretty)?;
        let count = next.len();

        // Restores `previous` unless the save below lands, including when
        // this future is dropped mid-save.
        let rollback = Rollback { op, snapshot: &self.snapshot, previous: Some(previous) };
        *self.snapshot.write() = next;

        match self.store.save(&self.config.document_key, document).await {
            Ok(()) => {
                rollback.disarm();
                debug!(op, nodes = count, "saved snapshot");
                Ok(out)
            }
            Err(err) => {
                warn!(op, error = %err, "save failed");
                Err(err)
            }
        }
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

/// Puts the pre-write snapshot back when dropped while still armed.
struct Rollback<'a> {
    op: &'static str,
    snapshot: &'a RwLock<Nodes>,
    previous: Option<Nodes>,
}

impl Rollback<'_> {
    fn disarm(mut self) {
        self.previous = None;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            warn!(op = self.op, "write did not land, restoring previous snapshot");
            *self.snapshot.write() = previous;
        }
    }
}

/// In-memory graph for testing and embedding.
impl Graph<MemoryStore> {
    pub async fn open_memory() -> Result<Self> {
        Self::open(MemoryStore::new(), StoreConfig::default()).await
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid index {index}: only {len} items displayed")]
    InvalidIndex { index: usize, len: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
