//! The `Extractor` trait and the shared helpers every kind module builds on:
//! node-ID construction, section lookup, wiki-link-to-node-ID resolution, and
//! the WIKI_LINK edge builder.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use indexmap::IndexMap;
use kdd_core::{
    Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, KDDLayer, Section,
    StructuralEdgeType, WikiLink, extract_wiki_links, is_layer_violation,
};
use serde_json::Value;

/// Implemented once per [`KDDKind`]: parses a document's sections into a
/// node's `indexed_fields` and derives the document's outgoing edges.
pub trait Extractor: Send + Sync {
    fn kind(&self) -> KDDKind;
    fn extract_node(&self, document: &Document) -> GraphNode;
    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge>;
}

/// Build the composite `{Prefix}:{document_id}` node ID for `kind`.
pub fn make_node_id(kind: KDDKind, document_id: &str) -> String {
    format!("{}:{}", kind.node_prefix(), document_id)
}

/// The fields every extractor stamps onto its [`GraphNode`], read straight
/// from front-matter.
pub fn common_node(kind: KDDKind, document: &Document, fields: HashMap<String, Value>) -> GraphNode {
    let status = document
        .front_matter
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("draft")
        .to_string();
    let aliases = document
        .front_matter
        .get("aliases")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    GraphNode {
        id: make_node_id(kind, &document.id),
        kind,
        source_file: document.source_path.clone(),
        source_hash: document.source_hash.clone(),
        layer: document.layer,
        status,
        aliases,
        domain: document.domain.clone(),
        indexed_fields: fields,
        indexed_at: Some(Utc::now()),
    }
}

/// First section whose heading case-insensitively matches any of `names`.
pub fn find_section<'a>(sections: &'a [Section], names: &[&str]) -> Option<&'a Section> {
    let targets: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
    sections.iter().find(|s| targets.contains(&s.heading.to_lowercase()))
}

/// All sections whose heading case-insensitively matches any of `names`.
#[allow(dead_code)]
pub fn find_sections<'a>(sections: &'a [Section], names: &[&str]) -> Vec<&'a Section> {
    let targets: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
    sections.iter().filter(|s| targets.contains(&s.heading.to_lowercase())).collect()
}

/// Locate the named heading, then concatenate its own content with every
/// subsequent section at a deeper level (stopping at the next section whose
/// level is equal or shallower), each prefixed with `### {heading}`.
pub fn find_section_with_children(sections: &[Section], names: &[&str]) -> Option<String> {
    let targets: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let parent_idx = sections.iter().position(|s| targets.contains(&s.heading.to_lowercase()))?;
    let parent = &sections[parent_idx];

    let mut parts = Vec::new();
    if !parent.content.trim().is_empty() {
        parts.push(parent.content.clone());
    }
    for section in &sections[parent_idx + 1..] {
        if section.level <= parent.level {
            break;
        }
        parts.push(format!("### {}\n\n{}", section.heading, section.content));
    }

    if parts.is_empty() { None } else { Some(parts.join("\n\n")) }
}

/// Parse a Markdown table's content into a list of header→cell maps,
/// dropping the `---` separator row. Column order is preserved (an
/// [`IndexMap`] rather than a [`HashMap`]) so callers that pick "the first
/// column" get a deterministic answer across runs.
pub fn parse_table_rows(content: &str) -> Vec<IndexMap<String, String>> {
    let lines: Vec<&str> = content
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = lines[0]
        .trim_matches('|')
        .split('|')
        .map(|h| h.trim().trim_matches('`').to_string())
        .collect();

    lines[2..]
        .iter()
        .filter_map(|line| {
            let cells: Vec<String> = line.trim_matches('|').split('|').map(|c| c.trim().to_string()).collect();
            if cells.len() < headers.len() {
                return None;
            }
            Some(headers.iter().cloned().zip(cells).collect())
        })
        .collect()
}

/// Extract `- item` / `* item` bullet lines from Markdown content.
pub fn parse_list_items(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")))
        .map(|item| item.trim().to_string())
        .collect()
}

/// Known wiki-link-target prefixes, in the order checked by
/// [`resolve_wiki_link_to_node_id`] and shared by every kind module that
/// needs to recognize a "known-prefixed" target.
pub const KNOWN_TARGET_PREFIXES: &[&str] = &[
    "EVT-", "BR-", "BP-", "XP-", "CMD-", "QRY-", "UC-", "PROC-", "REQ-", "OBJ-", "ADR-", "PRD-", "UI-",
];

/// Resolve a wiki-link target string to a node ID via the fixed prefix
/// heuristic; unprefixed (typically PascalCase) targets default to `Entity:`.
pub fn resolve_wiki_link_to_node_id(link: &WikiLink) -> String {
    let t = &link.target;
    let prefix_map: &[(&str, &str)] = &[
        ("EVT-", "Event"),
        ("BR-", "BR"),
        ("BP-", "BP"),
        ("XP-", "XP"),
        ("CMD-", "CMD"),
        ("QRY-", "QRY"),
        ("UC-", "UC"),
        ("PROC-", "PROC"),
        ("REQ-", "REQ"),
        ("OBJ-", "OBJ"),
        ("ADR-", "ADR"),
        ("PRD-", "PRD"),
        ("UI-", "UIView"),
    ];
    for (prefix, node_prefix) in prefix_map {
        if t.starts_with(prefix) {
            return format!("{node_prefix}:{t}");
        }
    }
    format!("Entity:{t}")
}

/// Guess a node's layer from its ID prefix, used to flag `layer_violation`
/// on mechanically-extracted edges whose destination node may not yet exist
/// in the store.
pub fn guess_layer_from_node_id(node_id: &str) -> Option<KDDLayer> {
    let prefix = node_id.split(':').next().unwrap_or("");
    match prefix {
        "Entity" | "Event" | "BR" => Some(KDDLayer::Domain),
        "BP" | "XP" | "CMD" | "QRY" | "PROC" | "UC" => Some(KDDLayer::Behavior),
        "UIView" | "UIComp" => Some(KDDLayer::Experience),
        "REQ" => Some(KDDLayer::Verification),
        "OBJ" | "PRD" | "ADR" => Some(KDDLayer::Requirements),
        _ => None,
    }
}

/// Extract WIKI_LINK edges from every wiki-link across a document's section
/// bodies, deduplicated by `(from, to)`, with `layer_violation` computed
/// against the guessed destination layer.
pub fn build_wiki_link_edges(document: &Document, from_node_id: &str, from_layer: KDDLayer) -> Vec<GraphEdge> {
    let full_content = document
        .sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let links = extract_wiki_links(&full_content);

    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for link in links {
        let to_node_id = resolve_wiki_link_to_node_id(&link);
        let key = (from_node_id.to_string(), to_node_id.clone());
        if !seen.insert(key) {
            continue;
        }

        let violation = guess_layer_from_node_id(&to_node_id)
            .map(|dest_layer| is_layer_violation(from_layer, dest_layer))
            .unwrap_or(false);

        let mut metadata = HashMap::new();
        if let Some(domain) = &link.domain {
            metadata.insert("domain".to_string(), Value::String(domain.clone()));
        }
        if let Some(alias) = &link.alias {
            metadata.insert("display_alias".to_string(), Value::String(alias.clone()));
        }

        edges.push(GraphEdge {
            from_node: from_node_id.to_string(),
            to_node: to_node_id,
            edge_type: EdgeType::Structural(StructuralEdgeType::WikiLink),
            source_file: document.source_path.clone(),
            extraction_method: ExtractionMethod::WikiLink,
            metadata,
            layer_violation: violation,
            bidirectional: true,
        });
    }

    edges
}

/// Remove edges sharing `(from_node, to_node, edge_type)`, keeping the first occurrence.
pub fn deduplicate_edges(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut seen = HashSet::new();
    edges.into_iter().filter(|e| seen.insert(e.identity())).collect()
}

/// True if `target` starts with none of the known prefixed-kind markers —
/// i.e. it looks like a bare entity name rather than a spec reference.
pub fn is_unprefixed_target(target: &str) -> bool {
    !KNOWN_TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}
