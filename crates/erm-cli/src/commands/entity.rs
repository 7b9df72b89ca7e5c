//! Entity commands

use std::path::PathBuf;

use clap::{Args, Subcommand};
use erm_core::{EntityUpdateInput, GetOptions, ListParams, NewEntity};

use super::{parse_mode, parse_props, print_bulk, print_rejected, read_json, report_rejected};
use crate::output::{format_json, print_list, print_one, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommands,
}

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Create an entity
    Create {
        /// Entity type, as declared in the schema
        #[arg(short = 't', long)]
        r#type: String,
        /// Properties as a JSON object
        #[arg(short, long)]
        props: Option<String>,
    },
    /// Get entity details
    Get {
        /// Entity id
        id: String,
        /// Return the entity even if it was deleted
        #[arg(long)]
        include_deleted: bool,
    },
    /// Replace an entity's properties
    Update {
        /// Entity id
        id: String,
        /// New properties as a JSON object
        #[arg(short, long)]
        props: String,
    },
    /// Soft-delete an entity and its edges
    Delete {
        /// Entity id
        id: String,
    },
    /// List entities
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
    /// Create entities from a JSON array of `{type, properties}` (`-` for stdin)
    Import {
        file: PathBuf,
        /// atomic or partial
        #[arg(long, default_value = "atomic")]
        mode: String,
    },
    /// Update entities from a JSON array of `{id, properties}` (`-` for stdin)
    BulkUpdate {
        file: PathBuf,
        /// atomic or partial
        #[arg(long, default_value = "atomic")]
        mode: String,
    },
    /// Soft-delete several entities
    BulkDelete {
        /// Entity ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// atomic or partial
        #[arg(long, default_value = "atomic")]
        mode: String,
    },
}

pub async fn run(args: &EntityArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let ws = ctx.workspace()?;
    let format = cli.output_format();
    tracing::debug!("Running entity command for workspace: {}", ws);

    match &args.command {
        EntityCommands::Create { r#type, props } => {
            let input = NewEntity::new(r#type.as_str()).with_properties(parse_props(props.as_deref())?);
            let entity = ctx.erm.entities().create(&ws, input).await?;
            print_one(&entity, format);
        }
        EntityCommands::Get {
            id,
            include_deleted,
        } => {
            let opts = GetOptions {
                include_deleted: *include_deleted,
            };
            let entity = ctx.erm.entities().get(&ws, id, opts).await?;
            print_one(&entity, format);
        }
        EntityCommands::Update { id, props } => {
            let entity = ctx
                .erm
                .entities()
                .update(&ws, id, parse_props(Some(props))?)
                .await?;
            print_one(&entity, format);
        }
        EntityCommands::Delete { id } => {
            let (entity, cascaded) = ctx.erm.entities().delete(&ws, id).await?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    format_json(&serde_json::json!({
                        "entity": entity,
                        "cascaded_edge_count": cascaded,
                    }))
                ),
                OutputFormat::Table => {
                    println!("Deleted entity {} ({} edges cascaded)", entity.id, cascaded)
                }
            }
        }
        EntityCommands::List {
            r#type,
            limit,
            offset,
        } => {
            let params = ListParams {
                type_name: r#type.clone(),
                limit: *limit,
                offset: *offset,
            };
            let entities = ctx.erm.queries().list_entities(&ws, params).await?;
            tracing::info!("Found {} entities", entities.len());
            print_list(&entities, format);
        }
        EntityCommands::Import { file, mode } => {
            let mode = parse_mode(mode)?;
            let items: Vec<NewEntity> = read_json(file)?;
            let outcome = report_rejected(ctx.erm.bulk().create_entities(&ws, items, mode).await, format)?;
            print_bulk(&outcome, format);
        }
        EntityCommands::BulkUpdate { file, mode } => {
            let mode = parse_mode(mode)?;
            let items: Vec<EntityUpdateInput> = read_json(file)?;
            let outcome = report_rejected(ctx.erm.bulk().update_entities(&ws, items, mode).await, format)?;
            print_bulk(&outcome, format);
        }
        EntityCommands::BulkDelete { ids, mode } => {
            let mode = parse_mode(mode)?;
            let outcome =
                report_rejected(ctx.erm.bulk().delete_entities(&ws, ids.clone(), mode).await, format)?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&outcome)),
                OutputFormat::Table => {
                    println!("Deleted {} entities", outcome.results());
                    print_rejected(outcome.errors());
                }
            }
        }
    }

    Ok(())
}
