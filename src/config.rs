//! Layered configuration: built-in defaults → `kdd.toml` → `KDD_*`
//! environment variables → CLI flags, in increasing precedence.

use std::path::{Path, PathBuf};

use kdd_extract::{DEFAULT_MAX_CHUNK_CHARS, DEFAULT_OVERLAP_CHARS};
use serde::Deserialize;

/// Resolved configuration used by every CLI command.
#[derive(Debug, Clone)]
pub struct Config {
    pub specs_root: PathBuf,
    pub index_path: PathBuf,
    pub log_level: String,
    pub max_chunk_chars: usize,
    pub overlap_chars: usize,
    pub include_patterns: Vec<String>,
    pub domain: Option<String>,
    pub embedding_provider: EmbeddingProvider,
    pub openai_api_key: Option<String>,
    pub agent_provider: AgentProvider,
    pub anthropic_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    None,
    Local,
    OpenAi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentProvider {
    None,
    Anthropic,
}

/// The subset of fields a user may set in `kdd.toml`; every field optional so
/// a partial file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    specs_root: Option<String>,
    index_path: Option<String>,
    log_level: Option<String>,
    max_chunk_chars: Option<usize>,
    overlap_chars: Option<usize>,
    include_patterns: Option<Vec<String>>,
    domain: Option<String>,
    embedding_provider: Option<String>,
    agent_provider: Option<String>,
}

/// CLI-flag overrides, applied last. `None` means "not passed on the command line".
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub specs_root: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

fn default_specs_root() -> PathBuf {
    PathBuf::from("specs")
}

fn default_index_path() -> PathBuf {
    PathBuf::from(".kdd-index")
}

fn parse_embedding_provider(raw: &str) -> EmbeddingProvider {
    match raw.trim().to_lowercase().as_str() {
        "openai" => EmbeddingProvider::OpenAi,
        "none" => EmbeddingProvider::None,
        _ => EmbeddingProvider::Local,
    }
}

fn parse_agent_provider(raw: &str) -> AgentProvider {
    match raw.trim().to_lowercase().as_str() {
        "anthropic" => AgentProvider::Anthropic,
        _ => AgentProvider::None,
    }
}

impl Config {
    /// Resolve the full layered configuration. `explicit_config_path` is the
    /// `--config` flag; absent, `kdd.toml` is tried in the current directory.
    pub fn load(explicit_config_path: Option<&Path>, overrides: CliOverrides) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let file_config = read_file_config(explicit_config_path)?;

        let mut config = Config {
            specs_root: default_specs_root(),
            index_path: default_index_path(),
            log_level: "info".to_string(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
            include_patterns: vec!["**/*.md".to_string()],
            domain: None,
            embedding_provider: EmbeddingProvider::Local,
            openai_api_key: None,
            agent_provider: AgentProvider::None,
            anthropic_api_key: None,
        };

        if let Some(v) = file_config.specs_root {
            config.specs_root = PathBuf::from(v);
        }
        if let Some(v) = file_config.index_path {
            config.index_path = PathBuf::from(v);
        }
        if let Some(v) = file_config.log_level {
            config.log_level = v;
        }
        if let Some(v) = file_config.max_chunk_chars {
            config.max_chunk_chars = v;
        }
        if let Some(v) = file_config.overlap_chars {
            config.overlap_chars = v;
        }
        if let Some(v) = file_config.include_patterns {
            config.include_patterns = v;
        }
        if let Some(v) = file_config.domain {
            config.domain = Some(v);
        }
        if let Some(v) = file_config.embedding_provider {
            config.embedding_provider = parse_embedding_provider(&v);
        }
        if let Some(v) = file_config.agent_provider {
            config.agent_provider = parse_agent_provider(&v);
        }

        if let Ok(v) = std::env::var("KDD_SPECS_ROOT") {
            config.specs_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("KDD_INDEX_PATH") {
            config.index_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("KDD_LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("KDD_MAX_CHUNK_CHARS") {
            if let Ok(parsed) = v.parse() {
                config.max_chunk_chars = parsed;
            }
        }
        if let Ok(v) = std::env::var("KDD_OVERLAP_CHARS") {
            if let Ok(parsed) = v.parse() {
                config.overlap_chars = parsed;
            }
        }
        if let Ok(v) = std::env::var("KDD_DOMAIN") {
            config.domain = Some(v);
        }
        if let Ok(v) = std::env::var("KDD_EMBEDDING_MODEL") {
            config.embedding_provider = parse_embedding_provider(&v);
        }
        if let Ok(v) = std::env::var("KDD_AGENT_MODEL") {
            config.agent_provider = parse_agent_provider(&v);
        }
        if let Ok(v) = std::env::var("KDD_OPENAI_API_KEY") {
            config.openai_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("KDD_ANTHROPIC_API_KEY") {
            config.anthropic_api_key = Some(v);
        }

        if let Some(v) = overrides.specs_root {
            config.specs_root = v;
        }
        if let Some(v) = overrides.index_path {
            config.index_path = v;
        }
        if let Some(v) = overrides.log_level {
            config.log_level = v;
        }

        Ok(config)
    }
}

fn read_file_config(explicit_path: Option<&Path>) -> anyhow::Result<FileConfig> {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from("kdd.toml"),
    };

    if !path.exists() {
        if explicit_path.is_some() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_no_file_or_env_present() {
        let config = Config::load(None, CliOverrides::default()).unwrap();
        assert_eq!(config.specs_root, PathBuf::from("specs"));
        assert_eq!(config.max_chunk_chars, DEFAULT_MAX_CHUNK_CHARS);
    }

    #[test]
    fn cli_overrides_win_over_defaults() {
        let config = Config::load(
            None,
            CliOverrides { specs_root: Some(PathBuf::from("/tmp/custom-specs")), index_path: None, log_level: None },
        )
        .unwrap();
        assert_eq!(config.specs_root, PathBuf::from("/tmp/custom-specs"));
    }

    #[test]
    fn embedding_provider_parses_known_names() {
        assert!(matches!(parse_embedding_provider("openai"), EmbeddingProvider::OpenAi));
        assert!(matches!(parse_embedding_provider("none"), EmbeddingProvider::None));
        assert!(matches!(parse_embedding_provider("local"), EmbeddingProvider::Local));
        assert!(matches!(parse_embedding_provider("garbage"), EmbeddingProvider::Local));
    }
}
