//! Domain model: the immutable types that flow through indexing and retrieval.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the 15 tags classifying a spec document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KDDKind {
    Entity,
    Event,
    BusinessRule,
    BusinessPolicy,
    CrossPolicy,
    Command,
    Query,
    Process,
    UseCase,
    UiView,
    UiComponent,
    Requirement,
    Objective,
    Prd,
    Adr,
}

impl KDDKind {
    /// Every recognized front-matter `kind:` value, case/whitespace-insensitively matched.
    pub fn from_str_loose(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "entity" => Some(KDDKind::Entity),
            "event" => Some(KDDKind::Event),
            "business-rule" => Some(KDDKind::BusinessRule),
            "business-policy" => Some(KDDKind::BusinessPolicy),
            "cross-policy" => Some(KDDKind::CrossPolicy),
            "command" => Some(KDDKind::Command),
            "query" => Some(KDDKind::Query),
            "process" => Some(KDDKind::Process),
            "use-case" => Some(KDDKind::UseCase),
            "ui-view" => Some(KDDKind::UiView),
            "ui-component" => Some(KDDKind::UiComponent),
            "requirement" => Some(KDDKind::Requirement),
            "objective" => Some(KDDKind::Objective),
            "prd" => Some(KDDKind::Prd),
            "adr" => Some(KDDKind::Adr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KDDKind::Entity => "entity",
            KDDKind::Event => "event",
            KDDKind::BusinessRule => "business-rule",
            KDDKind::BusinessPolicy => "business-policy",
            KDDKind::CrossPolicy => "cross-policy",
            KDDKind::Command => "command",
            KDDKind::Query => "query",
            KDDKind::Process => "process",
            KDDKind::UseCase => "use-case",
            KDDKind::UiView => "ui-view",
            KDDKind::UiComponent => "ui-component",
            KDDKind::Requirement => "requirement",
            KDDKind::Objective => "objective",
            KDDKind::Prd => "prd",
            KDDKind::Adr => "adr",
        }
    }

    /// Fixed node-ID prefix per kind (e.g. `Entity`, `BR`, `UIView`).
    pub fn node_prefix(&self) -> &'static str {
        match self {
            KDDKind::Entity => "Entity",
            KDDKind::Event => "Event",
            KDDKind::BusinessRule => "BR",
            KDDKind::BusinessPolicy => "BP",
            KDDKind::CrossPolicy => "XP",
            KDDKind::Command => "CMD",
            KDDKind::Query => "QRY",
            KDDKind::Process => "PROC",
            KDDKind::UseCase => "UC",
            KDDKind::UiView => "UIView",
            KDDKind::UiComponent => "UIComp",
            KDDKind::Requirement => "REQ",
            KDDKind::Objective => "OBJ",
            KDDKind::Prd => "PRD",
            KDDKind::Adr => "ADR",
        }
    }

    /// The repo-relative folder prefix a document of this kind is expected to live under.
    pub fn expected_path_prefix(&self) -> &'static str {
        match self {
            KDDKind::Entity => "01-domain/entities/",
            KDDKind::Event => "01-domain/events/",
            KDDKind::BusinessRule => "01-domain/business-rules/",
            KDDKind::BusinessPolicy => "02-behavior/business-policies/",
            KDDKind::CrossPolicy => "02-behavior/cross-policies/",
            KDDKind::Command => "02-behavior/commands/",
            KDDKind::Query => "02-behavior/queries/",
            KDDKind::Process => "02-behavior/processes/",
            KDDKind::UseCase => "02-behavior/use-cases/",
            KDDKind::UiView => "03-experience/views/",
            KDDKind::UiComponent => "03-experience/components/",
            KDDKind::Requirement => "04-verification/requirements/",
            KDDKind::Objective => "00-requirements/objectives/",
            KDDKind::Prd => "00-requirements/prd/",
            KDDKind::Adr => "00-requirements/adr/",
        }
    }
}

impl std::fmt::Display for KDDKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the 5 strata a document or edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KDDLayer {
    #[serde(rename = "00-requirements")]
    Requirements,
    #[serde(rename = "01-domain")]
    Domain,
    #[serde(rename = "02-behavior")]
    Behavior,
    #[serde(rename = "03-experience")]
    Experience,
    #[serde(rename = "04-verification")]
    Verification,
}

impl KDDLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            KDDLayer::Requirements => "00-requirements",
            KDDLayer::Domain => "01-domain",
            KDDLayer::Behavior => "02-behavior",
            KDDLayer::Experience => "03-experience",
            KDDLayer::Verification => "04-verification",
        }
    }

    /// The leading two characters of the layer's path prefix, parsed as an int (0..4).
    pub fn numeric(&self) -> u8 {
        match self {
            KDDLayer::Requirements => 0,
            KDDLayer::Domain => 1,
            KDDLayer::Behavior => 2,
            KDDLayer::Experience => 3,
            KDDLayer::Verification => 4,
        }
    }

    /// Detect a layer from a substring match against the 5 known path prefixes.
    pub fn detect_from_path(path: &str) -> Option<Self> {
        if path.contains("00-requirements") {
            Some(KDDLayer::Requirements)
        } else if path.contains("01-domain") {
            Some(KDDLayer::Domain)
        } else if path.contains("02-behavior") {
            Some(KDDLayer::Behavior)
        } else if path.contains("03-experience") {
            Some(KDDLayer::Experience)
        } else if path.contains("04-verification") {
            Some(KDDLayer::Verification)
        } else {
            None
        }
    }
}

impl std::fmt::Display for KDDLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Detected,
    Parsing,
    Indexed,
    Stale,
    Deleted,
}

/// Lifecycle state of a retrieval query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    #[default]
    Received,
    Resolving,
    Completed,
    Failed,
}

/// The closed set of structural edge types, plus an escape hatch for
/// free-form business edges authored verbatim by spec writers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeType {
    Structural(StructuralEdgeType),
    Business(String),
}

impl EdgeType {
    pub fn as_str(&self) -> &str {
        match self {
            EdgeType::Structural(s) => s.as_str(),
            EdgeType::Business(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuralEdgeType {
    #[serde(rename = "WIKI_LINK")]
    WikiLink,
    #[serde(rename = "DOMAIN_RELATION")]
    DomainRelation,
    #[serde(rename = "ENTITY_RULE")]
    EntityRule,
    #[serde(rename = "ENTITY_POLICY")]
    EntityPolicy,
    #[serde(rename = "EMITS")]
    Emits,
    #[serde(rename = "CONSUMES")]
    Consumes,
    #[serde(rename = "UC_APPLIES_RULE")]
    UcAppliesRule,
    #[serde(rename = "UC_EXECUTES_CMD")]
    UcExecutesCmd,
    #[serde(rename = "UC_STORY")]
    UcStory,
    #[serde(rename = "VIEW_TRIGGERS_UC")]
    ViewTriggersUc,
    #[serde(rename = "VIEW_USES_COMPONENT")]
    ViewUsesComponent,
    #[serde(rename = "COMPONENT_USES_ENTITY")]
    ComponentUsesEntity,
    #[serde(rename = "REQ_TRACES_TO")]
    ReqTracesTo,
    #[serde(rename = "VALIDATES")]
    Validates,
    #[serde(rename = "DECIDES_FOR")]
    DecidesFor,
    #[serde(rename = "CROSS_DOMAIN_REF")]
    CrossDomainRef,
}

impl StructuralEdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralEdgeType::WikiLink => "WIKI_LINK",
            StructuralEdgeType::DomainRelation => "DOMAIN_RELATION",
            StructuralEdgeType::EntityRule => "ENTITY_RULE",
            StructuralEdgeType::EntityPolicy => "ENTITY_POLICY",
            StructuralEdgeType::Emits => "EMITS",
            StructuralEdgeType::Consumes => "CONSUMES",
            StructuralEdgeType::UcAppliesRule => "UC_APPLIES_RULE",
            StructuralEdgeType::UcExecutesCmd => "UC_EXECUTES_CMD",
            StructuralEdgeType::UcStory => "UC_STORY",
            StructuralEdgeType::ViewTriggersUc => "VIEW_TRIGGERS_UC",
            StructuralEdgeType::ViewUsesComponent => "VIEW_USES_COMPONENT",
            StructuralEdgeType::ComponentUsesEntity => "COMPONENT_USES_ENTITY",
            StructuralEdgeType::ReqTracesTo => "REQ_TRACES_TO",
            StructuralEdgeType::Validates => "VALIDATES",
            StructuralEdgeType::DecidesFor => "DECIDES_FOR",
            StructuralEdgeType::CrossDomainRef => "CROSS_DOMAIN_REF",
        }
    }
}

/// Availability of the optional embedding/agent adapters, used to derive [`IndexLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexLevel {
    L1,
    L2,
    L3,
}

impl std::fmt::Display for IndexLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IndexLevel::L1 => "L1",
            IndexLevel::L2 => "L2",
            IndexLevel::L3 => "L3",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    Graph,
    Semantic,
    Hybrid,
    Impact,
}

/// A heading plus the raw text under it, until the next heading of equal or lower level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub level: u8,
    pub content: String,
    #[serde(default)]
    pub path: String,
}

/// A parsed spec file. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub kind: KDDKind,
    pub source_path: String,
    pub source_hash: String,
    pub layer: KDDLayer,
    pub front_matter: HashMap<String, serde_json::Value>,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub wiki_links: Vec<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    pub indexed_at: Option<DateTime<Utc>>,
    pub domain: Option<String>,
}

/// An entry in the knowledge graph. `id` is always `{KindPrefix}:{document_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: KDDKind,
    pub source_file: String,
    pub source_hash: String,
    pub layer: KDDLayer,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub domain: Option<String>,
    #[serde(default)]
    pub indexed_fields: HashMap<String, serde_json::Value>,
    pub indexed_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    "draft".to_string()
}

/// How an edge's endpoints were discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    WikiLink,
    SectionContent,
    Implicit,
}

/// A directed, typed relationship between two [`GraphNode`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_node: String,
    pub to_node: String,
    pub edge_type: EdgeType,
    pub source_file: String,
    pub extraction_method: ExtractionMethod,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub layer_violation: bool,
    #[serde(default)]
    pub bidirectional: bool,
}

impl GraphEdge {
    /// Deduplication identity: `(from_node, to_node, edge_type)`.
    pub fn identity(&self) -> (String, String, String) {
        (
            self.from_node.clone(),
            self.to_node.clone(),
            self.edge_type.as_str().to_string(),
        )
    }
}

/// A semantic vector for one chunk of an embeddable section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: String,
    pub document_id: String,
    pub document_kind: KDDKind,
    pub section_path: String,
    pub chunk_index: usize,
    pub raw_text: String,
    pub context_text: String,
    pub vector: Vec<f32>,
    pub model: String,
    pub dimensions: usize,
    pub text_hash: String,
    pub generated_at: DateTime<Utc>,
}

/// Aggregate counts carried by an [`IndexManifest`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndexStats {
    #[serde(default)]
    pub nodes: usize,
    #[serde(default)]
    pub edges: usize,
    #[serde(default)]
    pub embeddings: usize,
    #[serde(default)]
    pub enrichments: usize,
}

/// One per `.kdd-index/` directory: describes the state of an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: String,
    pub kdd_version: String,
    pub embedding_model: Option<String>,
    pub embedding_dimensions: Option<usize>,
    pub indexed_at: DateTime<Utc>,
    pub indexed_by: String,
    #[serde(default = "default_structure")]
    pub structure: String,
    pub index_level: IndexLevel,
    #[serde(default)]
    pub stats: IndexStats,
    #[serde(default)]
    pub domains: Vec<String>,
    pub git_commit: Option<String>,
}

fn default_structure() -> String {
    "single-domain".to_string()
}

impl IndexManifest {
    /// The major version component (e.g. `1` in `1.0.0`), used for merge compatibility checks.
    pub fn major_version(&self) -> Option<&str> {
        self.version.split('.').next()
    }
}

/// A single scored hit returned by a retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node_id: String,
    pub score: f32,
    pub snippet: Option<String>,
    pub match_source: String,
}

/// A detected layer-dependency violation between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerViolation {
    pub from_node: String,
    pub to_node: String,
    pub from_layer: KDDLayer,
    pub to_layer: KDDLayer,
    pub edge_type: EdgeType,
}

/// The envelope around an inbound retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub id: Uuid,
    pub strategy: RetrievalStrategy,
    pub query_text: Option<String>,
    pub root_node: Option<String>,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default)]
    pub edge_types: Vec<String>,
    #[serde(default)]
    pub include_kinds: Vec<KDDKind>,
    #[serde(default)]
    pub include_layers: Vec<KDDLayer>,
    #[serde(default = "default_true")]
    pub respect_layers: bool,
    /// QRY-003 only: whether the hybrid fusion query runs its graph
    /// expansion phase. Ignored by every other strategy.
    #[serde(default = "default_true")]
    pub expand_graph: bool,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default)]
    pub status: QueryStatus,
    pub received_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub caller: Option<String>,
}

fn default_depth() -> u32 {
    2
}
fn default_true() -> bool {
    true
}
fn default_min_score() -> f32 {
    0.7
}
fn default_limit() -> usize {
    10
}
fn default_max_tokens() -> usize {
    8000
}

/// The outcome of a retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query_id: Uuid,
    pub strategy: RetrievalStrategy,
    pub results: Vec<ScoredNode>,
    #[serde(default)]
    pub graph_expansion: Vec<GraphEdge>,
    pub total_nodes: usize,
    pub total_tokens: Option<usize>,
    #[serde(default)]
    pub layer_violations: Vec<LayerViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_loose_parsing() {
        for kind in [
            KDDKind::Entity,
            KDDKind::Event,
            KDDKind::BusinessRule,
            KDDKind::UseCase,
            KDDKind::UiView,
            KDDKind::Adr,
        ] {
            assert_eq!(KDDKind::from_str_loose(kind.as_str()), Some(kind));
            assert_eq!(KDDKind::from_str_loose(&format!("  {}  ", kind.as_str().to_uppercase())), Some(kind));
        }
        assert_eq!(KDDKind::from_str_loose("not-a-kind"), None);
    }

    #[test]
    fn layer_numeric_ordering_is_monotonic() {
        assert!(KDDLayer::Requirements.numeric() < KDDLayer::Domain.numeric());
        assert!(KDDLayer::Domain.numeric() < KDDLayer::Behavior.numeric());
        assert!(KDDLayer::Behavior.numeric() < KDDLayer::Experience.numeric());
        assert!(KDDLayer::Experience.numeric() < KDDLayer::Verification.numeric());
    }

    #[test]
    fn layer_detects_from_path_substring() {
        assert_eq!(
            KDDLayer::detect_from_path("specs/01-domain/entities/Order.md"),
            Some(KDDLayer::Domain)
        );
        assert_eq!(KDDLayer::detect_from_path("README.md"), None);
    }

    #[test]
    fn edge_identity_ignores_metadata() {
        let a = GraphEdge {
            from_node: "Entity:Order".into(),
            to_node: "Event:OrderPlaced".into(),
            edge_type: EdgeType::Structural(StructuralEdgeType::Emits),
            source_file: "a.md".into(),
            extraction_method: ExtractionMethod::SectionContent,
            metadata: HashMap::new(),
            layer_violation: false,
            bidirectional: false,
        };
        let mut b = a.clone();
        b.source_file = "different.md".into();
        assert_eq!(a.identity(), b.identity());
    }
}
