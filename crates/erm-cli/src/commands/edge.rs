//! Edge commands

use std::path::PathBuf;

use clap::{Args, Subcommand};
use erm_core::{ListParams, NewEdge};

use super::{parse_mode, parse_props, print_bulk, read_json, report_rejected};
use crate::output::{print_list, print_one, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct EdgeArgs {
    #[command(subcommand)]
    pub command: EdgeCommands,
}

#[derive(Subcommand)]
pub enum EdgeCommands {
    /// Create an edge between two entities
    Create {
        /// Source entity id
        source: String,
        /// Target entity id
        target: String,
        /// Edge type, as declared in the schema
        #[arg(short = 't', long)]
        r#type: String,
        /// Properties as a JSON object
        #[arg(short, long)]
        props: Option<String>,
    },
    /// Get edge details
    Get {
        /// Edge id
        id: String,
    },
    /// Replace an edge's properties
    Update {
        /// Edge id
        id: String,
        /// New properties as a JSON object
        #[arg(short, long)]
        props: String,
    },
    /// Soft-delete an edge
    Delete {
        /// Edge id
        id: String,
    },
    /// List edges
    List {
        /// Filter by type
        #[arg(short = 't', long)]
        r#type: Option<String>,
        /// Limit results
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Skip this many results
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },
    /// Create edges from a JSON array of `{type, source_id, target_id, properties}`
    Import {
        file: PathBuf,
        /// atomic or partial
        #[arg(long, default_value = "atomic")]
        mode: String,
    },
}

pub async fn run(args: &EdgeArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let ws = ctx.workspace()?;
    let format = cli.output_format();
    tracing::debug!("Running edge command for workspace: {}", ws);

    match &args.command {
        EdgeCommands::Create {
            source,
            target,
            r#type,
            props,
        } => {
            let input = NewEdge::new(r#type.as_str(), source, target)
                .with_properties(parse_props(props.as_deref())?);
            let edge = ctx.erm.edges().create(&ws, input).await?;
            print_one(&edge, format);
        }
        EdgeCommands::Get { id } => {
            let edge = ctx.erm.edges().get(&ws, id).await?;
            print_one(&edge, format);
        }
        EdgeCommands::Update { id, props } => {
            let edge = ctx.erm.edges().update(&ws, id, parse_props(Some(props))?).await?;
            print_one(&edge, format);
        }
        EdgeCommands::Delete { id } => {
            let edge = ctx.erm.edges().delete(&ws, id).await?;
            match format {
                OutputFormat::Json => print_one(&edge, format),
                OutputFormat::Table => println!("Deleted edge {}", edge.id),
            }
        }
        EdgeCommands::List {
            r#type,
            limit,
            offset,
        } => {
            let params = ListParams {
                type_name: r#type.clone(),
                limit: *limit,
                offset: *offset,
            };
            let edges = ctx.erm.queries().list_edges(&ws, params).await?;
            tracing::info!("Found {} edges", edges.len());
            print_list(&edges, format);
        }
        EdgeCommands::Import { file, mode } => {
            let mode = parse_mode(mode)?;
            let items: Vec<NewEdge> = read_json(file)?;
            let outcome = report_rejected(ctx.erm.bulk().create_edges(&ws, items, mode).await, format)?;
            print_bulk(&outcome, format);
        }
    }

    Ok(())
}
