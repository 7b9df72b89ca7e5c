//! Graph query commands

use clap::{Args, Subcommand};
use erm_core::{Entity, NeighborParams, PathParams, TraverseParams};

use crate::output::{format_json, print_list, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct GraphArgs {
    #[command(subcommand)]
    pub command: GraphCommands,
}

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Entities one edge away
    Neighbors {
        /// Entity id
        id: String,
        /// in, out, or both
        #[arg(long)]
        direction: Option<String>,
        /// Only neighbors of this entity type
        #[arg(long)]
        entity_type: Option<String>,
        /// Only follow edges of this type
        #[arg(long)]
        edge_type: Option<String>,
    },
    /// Entities reachable from a start entity
    Traverse {
        /// Start entity id
        id: String,
        /// Maximum hops (1-50)
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<i64>,
        /// in, out, or both
        #[arg(long)]
        direction: Option<String>,
        /// Stop after this many entities
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Simple paths between two entities, shortest first
    Paths {
        /// Source entity id
        source: String,
        /// Target entity id
        target: String,
        /// Maximum path length in edges (1-10)
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<i64>,
        /// in, out, or both (default out)
        #[arg(long)]
        direction: Option<String>,
        /// Maximum number of paths
        #[arg(long, allow_negative_numbers = true)]
        max_paths: Option<i64>,
    },
}

pub async fn run(args: &GraphArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let ws = ctx.workspace()?;
    let format = cli.output_format();

    match &args.command {
        GraphCommands::Neighbors {
            id,
            direction,
            entity_type,
            edge_type,
        } => {
            let params = NeighborParams {
                direction: direction.clone(),
                entity_type: entity_type.clone(),
                edge_type: edge_type.clone(),
            };
            let neighbors = ctx.erm.queries().get_neighbors(&ws, id, params).await?;
            print_list(&neighbors, format);
        }
        GraphCommands::Traverse {
            id,
            depth,
            direction,
            limit,
        } => {
            let params = TraverseParams {
                max_depth: *depth,
                direction: direction.clone(),
                limit: *limit,
            };
            let reached = ctx.erm.queries().traverse(&ws, id, params).await?;
            tracing::info!("Reached {} entities from {}", reached.len(), id);
            print_list(&reached, format);
        }
        GraphCommands::Paths {
            source,
            target,
            depth,
            direction,
            max_paths,
        } => {
            let params = PathParams {
                max_depth: *depth,
                direction: direction.clone(),
                max_paths: *max_paths,
            };
            let paths = ctx
                .erm
                .queries()
                .find_paths(&ws, source, target, params)
                .await?;
            print_paths(&paths, format);
        }
    }

    Ok(())
}

fn print_paths(paths: &[Vec<Entity>], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", format_json(&paths)),
        OutputFormat::Table if paths.is_empty() => println!("No paths found"),
        OutputFormat::Table => {
            for (i, path) in paths.iter().enumerate() {
                let chain: Vec<String> = path
                    .iter()
                    .map(|e| format!("{} ({})", e.id, e.entity_type))
                    .collect();
                println!("{}. [{} hops] {}", i + 1, path.len().saturating_sub(1), chain.join(" -> "));
            }
        }
    }
}
