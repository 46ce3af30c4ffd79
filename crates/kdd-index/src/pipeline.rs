//! The single-document and incremental indexing pipelines (CMD-001/CMD-002):
//! read → route → extract → validate layers → optionally chunk + embed →
//! write artifacts → emit events.

use std::path::{Path, PathBuf};

use chrono::Utc;
use kdd_core::{
    ArtifactStore, Document, DocumentDetected, DocumentIndexed, DocumentParsed, EmbeddingModel,
    Embedding, IndexLevel, IndexManifest, IndexStats, InMemoryEventBus, KDDLayer, compute_content_hash,
    extract_frontmatter, extract_wiki_link_targets, parse_markdown_sections, route_document,
};
use kdd_extract::{chunk_document_with, ExtractorRegistry, DEFAULT_MAX_CHUNK_CHARS, DEFAULT_OVERLAP_CHARS};

use crate::git;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexResult {
    pub success: bool,
    pub node_id: Option<String>,
    pub edge_count: usize,
    pub embedding_count: usize,
    pub skipped_reason: Option<String>,
    pub warning: Option<String>,
}

impl IndexResult {
    fn skipped(reason: impl Into<String>) -> Self {
        Self { skipped_reason: Some(reason.into()), ..Default::default() }
    }
}

pub struct IndexDocumentOptions<'a> {
    pub specs_root: &'a Path,
    /// Base `source_path` / `source_file` is made relative to. Defaults to
    /// `specs_root` for one-off single-file indexing; incremental indexing
    /// sets this to the repo root so stored paths line up with the
    /// repo-relative paths `git diff` reports (§3 "source_path (repo-relative)").
    pub path_root: &'a Path,
    pub registry: &'a ExtractorRegistry,
    pub artifact_store: &'a dyn ArtifactStore,
    pub event_bus: Option<&'a InMemoryEventBus>,
    pub embedding_model: Option<&'a dyn EmbeddingModel>,
    pub index_level: IndexLevel,
    pub domain: Option<String>,
    pub max_chunk_chars: usize,
    pub overlap_chars: usize,
}

impl<'a> IndexDocumentOptions<'a> {
    pub fn new(specs_root: &'a Path, registry: &'a ExtractorRegistry, artifact_store: &'a dyn ArtifactStore, index_level: IndexLevel) -> Self {
        Self {
            specs_root,
            path_root: specs_root,
            registry,
            artifact_store,
            event_bus: None,
            embedding_model: None,
            index_level,
            domain: None,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
        }
    }
}

/// Index a single KDD spec file (CMD-001).
pub async fn index_document(file_path: &Path, options: &IndexDocumentOptions<'_>) -> IndexResult {
    let start = Utc::now();

    let content = match std::fs::read_to_string(file_path) {
        Ok(c) => c,
        Err(e) => return IndexResult::skipped(format!("File error: {e}")),
    };

    let (front_matter, body) = extract_frontmatter(&content);
    let relative_path = match file_path.strip_prefix(options.path_root) {
        Ok(p) => p.to_string_lossy().to_string(),
        Err(_) => file_path.to_string_lossy().to_string(),
    };
    let route = route_document(&front_matter, &relative_path);

    let Some(kind) = route.kind else {
        return IndexResult::skipped("No valid kind in front-matter");
    };

    let Some(extractor) = options.registry.get(kind) else {
        return IndexResult::skipped(format!("No extractor registered for kind '{}'", kind.as_str()));
    };

    let sections = parse_markdown_sections(&body);
    let wiki_links = extract_wiki_link_targets(&body);
    let layer = KDDLayer::detect_from_path(&relative_path).unwrap_or(KDDLayer::Domain);
    let doc_id = front_matter
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| file_stem(file_path));
    let source_hash = compute_content_hash(&content);

    if let Some(bus) = options.event_bus {
        bus.publish(&DocumentDetected {
            source_path: relative_path.clone(),
            source_hash: source_hash.clone(),
            kind,
            layer,
            detected_at: start,
        });
    }

    let document = Document {
        id: doc_id.clone(),
        kind,
        source_path: relative_path.clone(),
        source_hash,
        layer,
        front_matter: front_matter.clone(),
        sections,
        wiki_links,
        status: Default::default(),
        indexed_at: None,
        domain: options.domain.clone(),
    };

    if let Some(bus) = options.event_bus {
        bus.publish(&DocumentParsed {
            document_id: doc_id.clone(),
            source_path: relative_path.clone(),
            kind,
            front_matter,
            section_count: document.sections.len(),
            wiki_link_count: document.wiki_links.len(),
            parsed_at: Utc::now(),
        });
    }

    let node = extractor.extract_node(&document);
    let edges = extractor.extract_edges(&document);

    if let Err(e) = options.artifact_store.write_node(&node) {
        return IndexResult::skipped(format!("Artifact write error: {e}"));
    }
    if !edges.is_empty() {
        if let Err(e) = options.artifact_store.append_edges(&edges) {
            return IndexResult::skipped(format!("Artifact write error: {e}"));
        }
    }

    let mut embeddings: Vec<Embedding> = Vec::new();
    if matches!(options.index_level, IndexLevel::L2 | IndexLevel::L3) {
        if let Some(model) = options.embedding_model {
            let chunks = chunk_document_with(&document, options.max_chunk_chars, options.overlap_chars);
            if !chunks.is_empty() {
                let texts: Vec<String> = chunks.iter().map(|c| c.context_text.clone()).collect();
                match model.encode(&texts).await {
                    Ok(vectors) => {
                        let now = Utc::now();
                        for (i, (chunk, vector)) in chunks.into_iter().zip(vectors).enumerate() {
                            embeddings.push(Embedding {
                                id: chunk.chunk_id,
                                document_id: doc_id.clone(),
                                document_kind: kind,
                                section_path: chunk.section_heading,
                                chunk_index: i,
                                raw_text: chunk.content.clone(),
                                context_text: chunk.context_text,
                                vector,
                                model: model.model_name().to_string(),
                                dimensions: model.dimensions(),
                                text_hash: compute_content_hash(&chunk.content),
                                generated_at: now,
                            });
                        }
                        if let Err(e) = options.artifact_store.write_embeddings(&doc_id, &embeddings) {
                            return IndexResult::skipped(format!("Artifact write error: {e}"));
                        }
                    }
                    Err(e) => return IndexResult::skipped(format!("Embedding error: {e}")),
                }
            }
        }
    }

    let duration_ms = (Utc::now() - start).num_milliseconds().max(0) as u64;
    if let Some(bus) = options.event_bus {
        bus.publish(&DocumentIndexed {
            document_id: doc_id,
            source_path: relative_path,
            kind,
            node_id: node.id.clone(),
            edge_count: edges.len(),
            embedding_count: embeddings.len(),
            index_level: options.index_level.to_string(),
            duration_ms,
            indexed_at: Utc::now(),
        });
    }

    IndexResult {
        success: true,
        node_id: Some(node.id),
        edge_count: edges.len(),
        embedding_count: embeddings.len(),
        skipped_reason: None,
        warning: route.warning,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct IncrementalResult {
    pub indexed: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub errors: usize,
    pub results: Vec<IndexResult>,
    pub is_full_reindex: bool,
}

pub struct IndexIncrementalOptions<'a> {
    pub repo_root: &'a Path,
    pub specs_root: &'a Path,
    pub registry: &'a ExtractorRegistry,
    pub artifact_store: &'a dyn ArtifactStore,
    pub event_bus: Option<&'a InMemoryEventBus>,
    pub embedding_model: Option<&'a dyn EmbeddingModel>,
    pub index_level: IndexLevel,
    pub include_patterns: Vec<String>,
    pub domain: Option<String>,
    pub max_chunk_chars: usize,
    pub overlap_chars: usize,
}

fn doc_options<'a>(opts: &'a IndexIncrementalOptions<'a>) -> IndexDocumentOptions<'a> {
    IndexDocumentOptions {
        specs_root: opts.specs_root,
        path_root: opts.repo_root,
        registry: opts.registry,
        artifact_store: opts.artifact_store,
        event_bus: opts.event_bus,
        embedding_model: opts.embedding_model,
        index_level: opts.index_level,
        domain: opts.domain.clone(),
        max_chunk_chars: opts.max_chunk_chars,
        overlap_chars: opts.overlap_chars,
    }
}

async fn index_relative(rel_path: &str, repo_root: &Path, doc_opts: &IndexDocumentOptions<'_>) -> IndexResult {
    let file_path: PathBuf = repo_root.join(rel_path);
    index_document(&file_path, doc_opts).await
}

fn tally(result: &IndexResult, incremental: &mut IncrementalResult) {
    if result.success {
        incremental.indexed += 1;
    } else if result.skipped_reason.is_some() {
        incremental.skipped += 1;
    } else {
        incremental.errors += 1;
    }
}

/// Run incremental indexing based on git diff (CMD-002). Falls back to a full
/// reindex of every tracked file when no previous manifest exists.
pub async fn index_incremental(options: &IndexIncrementalOptions<'_>) -> IncrementalResult {
    let mut incremental = IncrementalResult::default();
    let doc_opts = doc_options(options);

    let manifest = options.artifact_store.read_manifest().ok();
    let current_commit = git::get_current_commit(options.repo_root);

    match manifest.as_ref().and_then(|m| m.git_commit.clone()) {
        None => {
            incremental.is_full_reindex = true;
            let all_files = git::scan_files(options.repo_root, &options.include_patterns);
            for rel_path in all_files {
                let result = index_relative(&rel_path, options.repo_root, &doc_opts).await;
                tally(&result, &mut incremental);
                incremental.results.push(result);
            }
        }
        Some(previous_commit) => {
            let diff = git::get_diff(options.repo_root, &previous_commit, &options.include_patterns);

            for rel_path in &diff.added {
                let result = index_relative(rel_path, options.repo_root, &doc_opts).await;
                tally(&result, &mut incremental);
                incremental.results.push(result);
            }

            for rel_path in &diff.modified {
                let _ = options.artifact_store.delete_document_artifacts(rel_path);
                let result = index_relative(rel_path, options.repo_root, &doc_opts).await;
                tally(&result, &mut incremental);
                incremental.results.push(result);
            }

            for rel_path in &diff.deleted {
                let _ = options.artifact_store.delete_document_artifacts(rel_path);
                incremental.deleted += 1;
            }
        }
    }

    let total_nodes = incremental.results.iter().filter(|r| r.success).count();
    let total_edges: usize = incremental.results.iter().filter(|r| r.success).map(|r| r.edge_count).sum();
    let total_embeddings: usize = incremental.results.iter().filter(|r| r.success).map(|r| r.embedding_count).sum();

    let new_manifest = IndexManifest {
        version: "1.0.0".to_string(),
        kdd_version: "1.0.0".to_string(),
        embedding_model: options.embedding_model.map(|m| m.model_name().to_string()),
        embedding_dimensions: options.embedding_model.map(|m| m.dimensions()),
        indexed_at: Utc::now(),
        indexed_by: "kdd-cli".to_string(),
        structure: "single-domain".to_string(),
        index_level: options.index_level,
        stats: IndexStats { nodes: total_nodes, edges: total_edges, embeddings: total_embeddings, enrichments: 0 },
        domains: options.domain.clone().into_iter().collect(),
        git_commit: current_commit,
    };
    let _ = options.artifact_store.write_manifest(&new_manifest);

    incremental
}
