//! End-to-end coverage of the indexing → retrieval → merge → sync pipeline
//! against a small in-memory spec tree, exercising the filesystem adapters
//! the CLI wires together.

use std::fs;
use std::path::Path;

use kdd_ai::LocalEmbeddingModel;
use kdd_core::{ArtifactStore, IndexLevel};
use kdd_extract::create_default_registry;
use kdd_index::{merge_index, sync_pull, sync_push, ConflictStrategy, FilesystemArtifactStore, FilesystemTransport, IndexDocumentOptions};
use kdd_query::queries::{governance_coverage, graph_traversal, impact_analysis};
use kdd_query::IndexLoader;
use tempfile::tempdir;

const ORDER_MD: &str = r#"---
kind: entity
id: Order
---

# Order

## Description
A customer's order.
"#;

const ORDER_TOTAL_MD: &str = r#"---
kind: business-rule
id: OrderTotal
---

# Order Total

## Declaration
The total of an [[Order]] must equal the sum of its line items.
"#;

fn write_fixture_tree(specs_root: &Path) {
    let entities_dir = specs_root.join("01-domain/entities");
    let rules_dir = specs_root.join("01-domain/business-rules");
    fs::create_dir_all(&entities_dir).unwrap();
    fs::create_dir_all(&rules_dir).unwrap();
    fs::write(entities_dir.join("Order.md"), ORDER_MD).unwrap();
    fs::write(rules_dir.join("OrderTotal.md"), ORDER_TOTAL_MD).unwrap();
}

async fn index_fixture_tree(specs_root: &Path, index_path: &Path) {
    let registry = create_default_registry();
    let store = FilesystemArtifactStore::new(index_path.to_path_buf());
    let embedder = LocalEmbeddingModel::new();

    let mut options = IndexDocumentOptions::new(specs_root, &registry, &store, IndexLevel::L2);
    options.embedding_model = Some(&embedder);

    let order = index_document(&specs_root.join("01-domain/entities/Order.md"), &options).await;
    assert!(order.success, "{:?}", order.skipped_reason);
    assert_eq!(order.node_id.as_deref(), Some("Entity:Order"));

    let rule = index_document(&specs_root.join("01-domain/business-rules/OrderTotal.md"), &options).await;
    assert!(rule.success, "{:?}", rule.skipped_reason);
    assert_eq!(rule.node_id.as_deref(), Some("BR:OrderTotal"));

    store
        .write_manifest(&kdd_core::IndexManifest {
            version: "1.0.0".to_string(),
            kdd_version: "1.0.0".to_string(),
            embedding_model: Some(embedder.model_name().to_string()),
            embedding_dimensions: Some(embedder.dimensions()),
            indexed_at: chrono::Utc::now(),
            indexed_by: "integration-test".to_string(),
            structure: "single-domain".to_string(),
            index_level: IndexLevel::L2,
            stats: kdd_core::IndexStats { nodes: 2, edges: rule.edge_count, embeddings: order.embedding_count + rule.embedding_count, enrichments: 0 },
            domains: Vec::new(),
            git_commit: None,
        })
        .unwrap();
}

use kdd_core::EmbeddingModel;
use kdd_index::index_document;

#[tokio::test]
async fn graph_traversal_reaches_the_business_rule_from_the_entity() {
    let specs = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_fixture_tree(specs.path());
    index_fixture_tree(specs.path(), index.path()).await;

    let mut loader = IndexLoader::new(FilesystemArtifactStore::new(index.path().to_path_buf()));
    loader.ensure_loaded().unwrap();

    let query = kdd_core::RetrievalQuery {
        id: uuid::Uuid::new_v4(),
        strategy: kdd_core::RetrievalStrategy::Graph,
        query_text: None,
        root_node: Some("Entity:Order".to_string()),
        depth: 2,
        edge_types: Vec::new(),
        include_kinds: Vec::new(),
        include_layers: Vec::new(),
        respect_layers: true,
        expand_graph: true,
        min_score: 0.0,
        limit: 10,
        max_tokens: 8000,
        status: kdd_core::QueryStatus::Received,
        received_at: chrono::Utc::now(),
        completed_at: None,
        duration_ms: None,
        caller: None,
    };

    let result = graph_traversal(loader.graph_store(), &query).unwrap();
    let ids: Vec<&str> = result.results.iter().map(|n| n.node_id.as_str()).collect();
    assert!(ids.contains(&"Entity:Order"));
    assert!(ids.contains(&"BR:OrderTotal"));
}

#[tokio::test]
async fn impact_analysis_reports_the_business_rule_as_a_direct_dependent() {
    let specs = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_fixture_tree(specs.path());
    index_fixture_tree(specs.path(), index.path()).await;

    let mut loader = IndexLoader::new(FilesystemArtifactStore::new(index.path().to_path_buf()));
    loader.ensure_loaded().unwrap();

    let analysis = impact_analysis(loader.graph_store(), "Entity:Order", 2, None).unwrap();
    assert!(analysis.direct.iter().any(|d| d.node_id == "BR:OrderTotal"));
}

#[tokio::test]
async fn governance_coverage_flags_business_rules_as_covered_and_events_as_missing() {
    let specs = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_fixture_tree(specs.path());
    index_fixture_tree(specs.path(), index.path()).await;

    let mut loader = IndexLoader::new(FilesystemArtifactStore::new(index.path().to_path_buf()));
    loader.ensure_loaded().unwrap();

    let coverage = governance_coverage(loader.graph_store(), "Entity:Order").unwrap();
    let rules_category = coverage.categories.iter().find(|c| c.category == "business_rules").unwrap();
    assert_eq!(rules_category.status, "covered");
    let events_category = coverage.categories.iter().find(|c| c.category == "events").unwrap();
    assert_eq!(events_category.status, "missing");
}

#[tokio::test]
async fn merging_two_indices_combines_their_nodes() {
    let specs = tempdir().unwrap();
    write_fixture_tree(specs.path());

    let index_a = tempdir().unwrap();
    let index_b = tempdir().unwrap();
    let merged = tempdir().unwrap();

    // Index the entity into one store, the business rule into the other.
    let registry = create_default_registry();
    let embedder = LocalEmbeddingModel::new();

    let store_a = FilesystemArtifactStore::new(index_a.path().to_path_buf());
    let mut options_a = IndexDocumentOptions::new(specs.path(), &registry, &store_a, IndexLevel::L1);
    options_a.embedding_model = Some(&embedder);
    index_document(&specs.path().join("01-domain/entities/Order.md"), &options_a).await;
    store_a
        .write_manifest(&kdd_core::IndexManifest {
            version: "1.0.0".to_string(),
            kdd_version: "1.0.0".to_string(),
            embedding_model: None,
            embedding_dimensions: None,
            indexed_at: chrono::Utc::now(),
            indexed_by: "a".to_string(),
            structure: "single-domain".to_string(),
            index_level: IndexLevel::L1,
            stats: kdd_core::IndexStats::default(),
            domains: Vec::new(),
            git_commit: None,
        })
        .unwrap();

    let store_b = FilesystemArtifactStore::new(index_b.path().to_path_buf());
    let mut options_b = IndexDocumentOptions::new(specs.path(), &registry, &store_b, IndexLevel::L1);
    options_b.embedding_model = Some(&embedder);
    index_document(&specs.path().join("01-domain/business-rules/OrderTotal.md"), &options_b).await;
    store_b
        .write_manifest(&kdd_core::IndexManifest {
            version: "1.0.0".to_string(),
            kdd_version: "1.0.0".to_string(),
            embedding_model: None,
            embedding_dimensions: None,
            indexed_at: chrono::Utc::now(),
            indexed_by: "b".to_string(),
            structure: "single-domain".to_string(),
            index_level: IndexLevel::L1,
            stats: kdd_core::IndexStats::default(),
            domains: Vec::new(),
            git_commit: None,
        })
        .unwrap();

    let result = merge_index(
        &[index_a.path().to_path_buf(), index_b.path().to_path_buf()],
        merged.path(),
        ConflictStrategy::LastWriteWins,
    );

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.total_nodes, 2);
}

#[tokio::test]
async fn deleting_by_source_path_cascades_node_edges_and_embeddings() {
    // Regression: incremental indexing calls `delete_document_artifacts` with
    // the document's repo-relative source path, not its bare node-id stem —
    // the filesystem adapter must resolve that path back to the right node.
    let specs = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_fixture_tree(specs.path());
    index_fixture_tree(specs.path(), index.path()).await;

    let store = FilesystemArtifactStore::new(index.path().to_path_buf());
    assert!(store.read_node("Entity:Order").is_ok());
    assert!(!store.read_embeddings("Order").unwrap().is_empty());

    store.delete_document_artifacts("01-domain/entities/Order.md").unwrap();

    assert!(store.read_node("Entity:Order").is_err());
    assert!(store.read_embeddings("Order").unwrap().is_empty());
    let edges = store.read_edges().unwrap();
    assert!(edges.iter().all(|e| e.from_node != "Entity:Order" && e.to_node != "Entity:Order"));
    // The sibling business-rule node survives untouched.
    assert!(store.read_node("BR:OrderTotal").is_ok());
}

#[tokio::test]
async fn push_then_pull_round_trips_an_index_through_a_filesystem_remote() {
    let specs = tempdir().unwrap();
    let index = tempdir().unwrap();
    let remote = tempdir().unwrap();
    write_fixture_tree(specs.path());
    index_fixture_tree(specs.path(), index.path()).await;

    let local_store = FilesystemArtifactStore::new(index.path().to_path_buf());
    let transport = FilesystemTransport::new(remote.path().to_path_buf());

    let push_result = sync_push(&local_store, &transport).await;
    assert!(push_result.success, "{:?}", push_result.error);

    let other_index = tempdir().unwrap();
    let other_store = FilesystemArtifactStore::new(other_index.path().to_path_buf());
    let pull_result = sync_pull(&other_store, &transport).await;
    assert!(pull_result.success, "{:?}", pull_result.error);

    let nodes = other_store.read_all_nodes().unwrap();
    assert_eq!(nodes.len(), 2);
}
