//! `kdd` CLI entry point: argument parsing, logging init, and config
//! resolution. Command bodies live in [`commands`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::{CliOverrides, Config};

#[derive(Parser)]
#[command(name = "kdd")]
#[command(about = "Index, query, merge, enrich, and sync a KDD spec graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory containing the 5-layer spec tree (default: `specs`)
    #[arg(long, global = true)]
    specs_root: Option<PathBuf>,

    /// Path to the `.kdd-index/` artifact directory (default: `.kdd-index`)
    #[arg(long, global = true)]
    index_path: Option<PathBuf>,

    /// Log verbosity: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Path to a `kdd.toml` config file (default: `./kdd.toml` if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a single spec file (CMD-001)
    Index {
        file: PathBuf,
    },
    /// Run incremental indexing based on the git diff since the last index (CMD-002)
    IndexIncremental {
        /// Force a full reindex of every tracked file
        #[arg(long)]
        full: bool,
    },
    /// Run one of the six retrieval strategies against the loaded index
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },
    /// Merge two or more `.kdd-index/` directories (CMD-004)
    Merge {
        sources: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value = "last-write-wins")]
        strategy: String,
    },
    /// Enrich a node's graph entry via the configured AI agent (CMD-003)
    Enrich {
        node_id: String,
    },
    /// Push or pull derived index artifacts to/from a remote (CMD-005)
    Sync {
        #[command(subcommand)]
        direction: SyncCommand,
    },
}

#[derive(Subcommand)]
enum QueryCommand {
    /// QRY-001: bounded BFS from a root node
    Graph {
        root: String,
        #[arg(long, default_value_t = 2)]
        depth: u32,
        #[arg(long, value_delimiter = ',')]
        edge_types: Vec<String>,
        /// Follow edges that cross from a deeper layer into a shallower one
        #[arg(long)]
        ignore_layers: bool,
    },
    /// QRY-002: embedding similarity search
    Semantic {
        text: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0.7)]
        min_score: f32,
    },
    /// QRY-003: fused semantic + graph + lexical search
    Hybrid {
        text: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Skip the graph-expansion phase, scoring on semantic + lexical signals only
        #[arg(long)]
        no_expand_graph: bool,
    },
    /// QRY-004: direct and transitive dependents of a node
    Impact {
        node_id: String,
        #[arg(long, default_value_t = 3)]
        depth: u32,
        #[arg(long)]
        change_type: Option<String>,
    },
    /// QRY-005: governance coverage for a node
    Coverage {
        node_id: String,
    },
    /// QRY-006: cross-layer dependency violations
    Violations {
        #[arg(long, value_delimiter = ',')]
        kinds: Vec<String>,
    },
}

#[derive(Subcommand)]
enum SyncCommand {
    Push {
        #[arg(long)]
        remote: PathBuf,
    },
    Pull {
        #[arg(long)]
        remote: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(
        cli.config.as_deref(),
        CliOverrides { specs_root: cli.specs_root.clone(), index_path: cli.index_path.clone(), log_level: cli.log_level.clone() },
    )?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("kdd={}", config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("kdd v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Index { file } => commands::index(&config, &file).await,
        Commands::IndexIncremental { full } => commands::index_incremental(&config, full).await,
        Commands::Query { query } => commands::query(&config, query).await,
        Commands::Merge { sources, output, strategy } => commands::merge(&sources, &output, &strategy),
        Commands::Enrich { node_id } => commands::enrich(&config, &node_id).await,
        Commands::Sync { direction } => commands::sync(&config, direction).await,
    }
}
