//! End-to-end tests for the graph handle over a `MemoryStore`.
//!
//! Covers load/save, optimistic writes with rollback, and deletion
//! through the handle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use know_graph::{
    decode_document, encode_document, DataStore, Error, Graph, KnowNode, MemoryStore, NodeId,
    NodeType, Nodes, SequentialIds, StoreConfig,
};

async fn open(store: &MemoryStore) -> Graph<MemoryStore> {
    Graph::open(store.clone(), StoreConfig::default())
        .await
        .unwrap()
        .with_ids(Arc::new(SequentialIds::new("n")))
}

// ============================================================================
// 1. Commit, then reopen from the same store
// ============================================================================

#[tokio::test]
async fn test_commit_and_reload() {
    let store = MemoryStore::new();
    let graph = open(&store).await;

    let ctx = graph
        .context()
        .add_new_node("Rust", NodeType::Topic)
        .add_new_node("borrowck notes", NodeType::Note)
        .connect_relevant(&"n-2".into(), &"n-1".into())
        .unwrap();
    graph.commit(ctx).await.unwrap();
    assert_eq!(store.write_count(), 1);

    let reopened = open(&store).await;
    assert_eq!(reopened.nodes(), graph.nodes());
    let topic = reopened.nodes().get("n-1").unwrap().clone();
    assert_eq!(topic.relations_to_subjects.len(), 1);
}

#[tokio::test]
async fn test_open_empty_store() {
    let graph = Graph::open_memory().await.unwrap();
    assert!(graph.nodes().is_empty());
    assert_eq!(graph.config().document_key, "know-graph.json");
}

// ============================================================================
// 2. A failed save rolls the snapshot back
// ============================================================================

#[tokio::test]
async fn test_failed_write_rolls_back() {
    let store = MemoryStore::new();
    let graph = open(&store).await;
    graph.commit(graph.context().add_new_node("kept", NodeType::Note)).await.unwrap();
    let before = graph.nodes();

    store.fail_next_writes(1);
    let result = graph.commit(graph.context().add_new_node("lost", NodeType::Note)).await;
    assert!(matches!(result, Err(Error::Storage(_))));
    assert_eq!(graph.nodes(), before);
    assert_eq!(decode_document(&store.document("know-graph.json").unwrap()).unwrap(), before);

    // the next write goes through
    graph.commit(graph.context().add_new_node("retried", NodeType::Note)).await.unwrap();
    assert_eq!(graph.nodes().len(), 2);
}

// ============================================================================
// 3. Deletion through the handle
// ============================================================================

#[tokio::test]
async fn test_delete_node_cascades_and_persists() {
    let store = MemoryStore::new();
    let graph = open(&store).await;
    let ctx = graph
        .context()
        .add_new_node("Reading list", NodeType::View)
        .add_new_node("a quote", NodeType::Quote)
        .add_new_node("a topic", NodeType::Topic)
        .connect_contains(&"n-1".into(), &"n-2".into())
        .unwrap()
        .connect_relevant(&"n-1".into(), &"n-3".into())
        .unwrap();
    graph.commit(ctx).await.unwrap();

    let removed = graph.delete_node(&"n-1".into()).await.unwrap();
    assert_eq!(removed.len(), 2);
    assert!(removed.contains("n-1") && removed.contains("n-2"));

    let reopened = open(&store).await;
    let nodes = reopened.nodes();
    assert_eq!(nodes.len(), 1);
    assert!(!nodes.get("n-3").unwrap().has_relations());
}

#[tokio::test]
async fn test_delete_missing_node_does_not_write() {
    let store = MemoryStore::new();
    let graph = open(&store).await;
    let result = graph.delete_node(&"ghost".into()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_delete_nodes_with_plan() {
    let graph = Graph::open_memory().await.unwrap();
    let ctx = graph.context().add_new_node("a", NodeType::Note);
    let a = ctx.last_added().cloned().unwrap();
    graph.commit(ctx).await.unwrap();

    let nodes = graph.nodes();
    let plan = know_graph::plan_node_deletion(&nodes, nodes.get(&a).unwrap()).unwrap();
    graph.delete_nodes(&plan.to_remove, &plan.to_update).await.unwrap();
    assert!(graph.nodes().is_empty());
}

// ============================================================================
// 4. Loading a damaged document
// ============================================================================

#[tokio::test]
async fn test_open_rejects_broken_document() {
    let mut source = KnowNode::new(NodeId::from("a"), "a", NodeType::Note);
    source.relations_to_objects.push(know_graph::Relation::new(
        know_graph::RelationType::Relevant,
        "a".into(),
        "missing".into(),
    ));
    let broken: Nodes = [source].into_iter().collect();
    let document = encode_document(&broken, true).unwrap();

    let store = MemoryStore::with_document("know-graph.json", document);
    let result = Graph::open(store.clone(), StoreConfig::default()).await;
    assert!(matches!(result, Err(Error::InvariantViolation(_))));

    let lenient = StoreConfig { verify_on_load: false, ..StoreConfig::default() };
    let graph = Graph::open(store, lenient).await.unwrap();
    assert_eq!(graph.nodes(), broken);
}

#[tokio::test]
async fn test_open_rejects_node_under_foreign_key() {
    let document = r#"{"nodes": {
        "x": {"id": "y", "text": "moved", "nodeType": "NOTE"},
        "o": {"id": "o", "text": "other", "nodeType": "NOTE"}
    }}"#;
    let store = MemoryStore::with_document("know-graph.json", document);
    let result = Graph::open(store, StoreConfig::default()).await;
    assert!(matches!(result, Err(Error::InvariantViolation(_))));
}

// ============================================================================
// 5. Concurrent writers are serialized
// ============================================================================

#[tokio::test]
async fn test_concurrent_commits_both_land() {
    let store = MemoryStore::new();
    let graph = open(&store).await;

    let first = graph.context().add_new_node("one", NodeType::Note);
    let second = graph.context().add_new_node("two", NodeType::Note);
    let (a, b) = tokio::join!(graph.commit(first), graph.commit(second));
    a.unwrap();
    b.unwrap();

    assert_eq!(graph.nodes().len(), 2);
    assert_eq!(store.write_count(), 2);
    let saved = decode_document(&store.document("know-graph.json").unwrap()).unwrap();
    assert_eq!(saved, graph.nodes());
}

// ============================================================================
// 6. A write that never lands is rolled back
// ============================================================================

/// Store whose saves never complete.
struct HangingStore;

#[async_trait]
impl DataStore for HangingStore {
    async fn load(&self, _key: &str) -> know_graph::Result<Option<String>> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _document: String) -> know_graph::Result<()> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_cancelled_write_restores_snapshot() {
    let graph = Graph::open(HangingStore, StoreConfig::default()).await.unwrap();

    let ctx = graph.context().add_new_node("never saved", NodeType::Note);
    let result = tokio::time::timeout(Duration::from_millis(50), graph.commit(ctx)).await;
    assert!(result.is_err());
    assert!(graph.nodes().is_empty());

    // the writer lock was released with the dropped future
    let ctx = graph.context().add_new_node("also never saved", NodeType::Note);
    let result = tokio::time::timeout(Duration::from_millis(50), graph.commit(ctx)).await;
    assert!(result.is_err());
    assert!(graph.nodes().is_empty());
}
