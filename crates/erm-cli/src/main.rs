//! ERM CLI - Command line interface for the entity/relationship model

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{completions, edge, entity, graph, schema};
use config::Config;
use erm_core::validation::parse_id;
use erm_core::{DomainEvent, Erm, EventSink, WorkspaceId};
use erm_storage::{GraphStore, RedbStorage};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "erm")]
#[command(author, version, about = "Workspace-scoped entity and relationship manager")]
pub struct Cli {
    /// Workspace id (UUID)
    #[arg(short, long, env = "ERM_WORKSPACE", global = true)]
    pub workspace: Option<String>,

    /// Data directory
    #[arg(short, long, env = "ERM_DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Data directory: flag or env, then config file, then the platform default
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(config::default_data_dir)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the workspace schema
    Schema(schema::SchemaArgs),
    /// Manage entities
    Entity(entity::EntityArgs),
    /// Manage edges
    Edge(edge::EdgeArgs),
    /// Query the graph
    Graph(graph::GraphArgs),
    /// Manage CLI configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Domain events go to the log
struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: DomainEvent) {
        tracing::info!(
            "{} {} in workspace {}",
            event.event_type(),
            event.aggregate_id(),
            event.workspace_id()
        );
    }
}

/// Application context with the wired-up use cases
pub struct AppContext {
    pub erm: Erm,
    workspace: Option<String>,
}

impl AppContext {
    pub async fn new(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let data_dir = cli.data_dir(config);
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let db_path = data_dir.join("erm.redb");
        tracing::debug!("Using database at: {:?}", db_path);

        let storage = RedbStorage::open(&db_path)?;
        let erm = GraphStore::new(storage)
            .into_erm()
            .with_event_sink(Arc::new(LogEventSink));

        Ok(Self {
            erm,
            workspace: cli
                .workspace
                .clone()
                .or_else(|| config.default_workspace.clone()),
        })
    }

    /// The workspace every command runs against
    pub fn workspace(&self) -> anyhow::Result<WorkspaceId> {
        let raw = self.workspace.as_deref().context(
            "No workspace set: pass --workspace, set ERM_WORKSPACE, or set default_workspace in the config",
        )?;
        Ok(parse_id::<WorkspaceId>("workspace", raw)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting erm CLI");

    // Commands that never touch storage
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let config = Config::load();
    let ctx = AppContext::new(&cli, &config).await?;

    match &cli.command {
        Commands::Schema(args) => schema::run(args, &cli, &ctx).await?,
        Commands::Entity(args) => entity::run(args, &cli, &ctx).await?,
        Commands::Edge(args) => edge::run(args, &cli, &ctx).await?,
        Commands::Graph(args) => graph::run(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
