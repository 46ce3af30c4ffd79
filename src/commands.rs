//! Command implementations: each wires its own composition of adapters
//! (artifact store, embedding/agent clients, transport) from [`Config`] and
//! drives the corresponding `kdd-index`/`kdd-query`/`kdd-ai` entry point.

use std::path::{Path, PathBuf};

use kdd_ai::{AnthropicAgentClient, LocalEmbeddingModel, OpenAiEmbeddingModel};
use kdd_core::{detect_index_level, AgentClient, EmbeddingModel, KDDKind, KDDLayer, QueryStatus, RetrievalQuery, RetrievalStrategy};
use kdd_index::{enrich_with_agent, index_document, index_incremental as run_index_incremental, merge_index, sync_pull, sync_push};
use kdd_index::{ConflictStrategy, FilesystemArtifactStore, FilesystemTransport, IndexDocumentOptions, IndexIncrementalOptions};
use kdd_query::queries::{governance_coverage, graph_traversal, hybrid_search, impact_analysis, layer_violations, semantic_search};
use kdd_query::IndexLoader;

use crate::config::{AgentProvider, Config, EmbeddingProvider};
use crate::{QueryCommand, SyncCommand};

fn embedding_model(config: &Config) -> Option<Box<dyn EmbeddingModel>> {
    match config.embedding_provider {
        EmbeddingProvider::None => None,
        EmbeddingProvider::Local => Some(Box::new(LocalEmbeddingModel::new())),
        EmbeddingProvider::OpenAi => Some(Box::new(OpenAiEmbeddingModel::new(config.openai_api_key.clone()))),
    }
}

fn agent_client(config: &Config) -> Option<Box<dyn AgentClient>> {
    match config.agent_provider {
        AgentProvider::None => None,
        AgentProvider::Anthropic => Some(Box::new(AnthropicAgentClient::new(config.anthropic_api_key.clone()))),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn index(config: &Config, file: &Path) -> anyhow::Result<()> {
    let store = FilesystemArtifactStore::new(config.index_path.clone());
    let registry = kdd_extract::create_default_registry();
    let embedder = embedding_model(config);
    let index_level = detect_index_level(embedder.is_some(), agent_client(config).is_some());

    let mut options = IndexDocumentOptions::new(&config.specs_root, &registry, &store, index_level);
    options.embedding_model = embedder.as_deref();
    options.domain = config.domain.clone();
    options.max_chunk_chars = config.max_chunk_chars;
    options.overlap_chars = config.overlap_chars;

    let result = index_document(file, &options).await;
    if !result.success {
        anyhow::bail!(result.skipped_reason.unwrap_or_else(|| "indexing failed".to_string()));
    }
    print_json(&result)
}

pub async fn index_incremental(config: &Config, full: bool) -> anyhow::Result<()> {
    if full {
        let manifest_path = config.index_path.join("manifest.json");
        if manifest_path.exists() {
            std::fs::remove_file(&manifest_path)?;
        }
    }

    let store = FilesystemArtifactStore::new(config.index_path.clone());
    let registry = kdd_extract::create_default_registry();
    let embedder = embedding_model(config);
    let index_level = detect_index_level(embedder.is_some(), agent_client(config).is_some());
    let repo_root = repo_root_for(&config.specs_root);

    let options = IndexIncrementalOptions {
        repo_root: &repo_root,
        specs_root: &config.specs_root,
        registry: &registry,
        artifact_store: &store,
        event_bus: None,
        embedding_model: embedder.as_deref(),
        index_level,
        include_patterns: config.include_patterns.clone(),
        domain: config.domain.clone(),
        max_chunk_chars: config.max_chunk_chars,
        overlap_chars: config.overlap_chars,
    };

    let result = run_index_incremental(&options).await;
    tracing::info!(indexed = result.indexed, deleted = result.deleted, skipped = result.skipped, errors = result.errors, "incremental indexing complete");
    print_json(&(result.indexed, result.deleted, result.skipped, result.errors))
}

fn repo_root_for(specs_root: &Path) -> PathBuf {
    specs_root.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}

fn loader(config: &Config) -> anyhow::Result<IndexLoader<FilesystemArtifactStore>> {
    let store = FilesystemArtifactStore::new(config.index_path.clone());
    let mut loader = IndexLoader::new(store);
    loader.ensure_loaded()?;
    Ok(loader)
}

fn base_query(strategy: RetrievalStrategy) -> RetrievalQuery {
    RetrievalQuery {
        id: uuid::Uuid::new_v4(),
        strategy,
        query_text: None,
        root_node: None,
        depth: 2,
        edge_types: Vec::new(),
        include_kinds: Vec::new(),
        include_layers: Vec::new(),
        respect_layers: true,
        expand_graph: true,
        min_score: 0.7,
        limit: 10,
        max_tokens: 8000,
        status: QueryStatus::Received,
        received_at: chrono::Utc::now(),
        completed_at: None,
        duration_ms: None,
        caller: Some("kdd-cli".to_string()),
    }
}

pub async fn query(config: &Config, command: QueryCommand) -> anyhow::Result<()> {
    let loader = loader(config)?;

    match command {
        QueryCommand::Graph { root, depth, edge_types, ignore_layers } => {
            let mut q = base_query(RetrievalStrategy::Graph);
            q.root_node = Some(root);
            q.depth = depth;
            q.edge_types = edge_types;
            q.respect_layers = !ignore_layers;
            let result = graph_traversal(loader.graph_store(), &q)?;
            print_json(&result)
        }
        QueryCommand::Semantic { text, limit, min_score } => {
            let embedder = embedding_model(config).ok_or_else(|| anyhow::anyhow!("no embedding provider configured"))?;
            let mut q = base_query(RetrievalStrategy::Semantic);
            q.query_text = Some(text);
            q.limit = limit;
            q.min_score = min_score;
            let result = semantic_search(loader.graph_store(), loader.vector_store(), embedder.as_ref(), &q).await?;
            print_json(&result)
        }
        QueryCommand::Hybrid { text, limit, no_expand_graph } => {
            let embedder = embedding_model(config);
            let mut q = base_query(RetrievalStrategy::Hybrid);
            q.query_text = Some(text);
            q.limit = limit;
            q.expand_graph = !no_expand_graph;
            let has_embeddings = !loader.vector_store().is_empty();
            let (result, warnings) = hybrid_search(loader.graph_store(), loader.vector_store(), has_embeddings, embedder.as_deref(), &q).await?;
            for warning in &warnings {
                tracing::warn!(%warning, "hybrid search warning");
            }
            print_json(&result)
        }
        QueryCommand::Impact { node_id, depth, change_type } => {
            let result = impact_analysis(loader.graph_store(), &node_id, depth, change_type.as_deref())?;
            print_json(&result)
        }
        QueryCommand::Coverage { node_id } => {
            let result = governance_coverage(loader.graph_store(), &node_id)?;
            print_json(&result)
        }
        QueryCommand::Violations { kinds } => {
            let kind_filter: Vec<KDDKind> = kinds.iter().filter_map(|k| KDDKind::from_str_loose(k)).collect();
            let layer_filter: Vec<KDDLayer> = Vec::new();
            let result = layer_violations(loader.graph_store(), &kind_filter, &layer_filter)?;
            print_json(&result)
        }
    }
}

pub fn merge(sources: &[PathBuf], output: &Path, strategy: &str) -> anyhow::Result<()> {
    let strategy = match strategy {
        "fail-on-conflict" => ConflictStrategy::FailOnConflict,
        _ => ConflictStrategy::LastWriteWins,
    };
    let result = merge_index(sources, output, strategy);
    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "merge failed".to_string()));
    }
    print_json(&result)
}

pub async fn enrich(config: &Config, node_id: &str) -> anyhow::Result<()> {
    let store = FilesystemArtifactStore::new(config.index_path.clone());
    let agent = agent_client(config).ok_or_else(|| anyhow::anyhow!("no agent provider configured"))?;

    let result = enrich_with_agent(node_id, &store, agent.as_ref(), &config.specs_root).await;
    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "enrichment failed".to_string()));
    }
    print_json(&result)
}

pub async fn sync(config: &Config, direction: SyncCommand) -> anyhow::Result<()> {
    let store = FilesystemArtifactStore::new(config.index_path.clone());

    let result = match direction {
        SyncCommand::Push { remote } => {
            let transport = FilesystemTransport::new(remote);
            sync_push(&store, &transport).await
        }
        SyncCommand::Pull { remote } => {
            let transport = FilesystemTransport::new(remote);
            sync_pull(&store, &transport).await
        }
    };

    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "sync failed".to_string()));
    }
    tracing::info!("sync complete");
    Ok(())
}
