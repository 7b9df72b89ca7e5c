//! Schema commands

use std::path::PathBuf;

use clap::{Args, Subcommand};
use erm_core::{SchemaInput, WorkspaceSchema};

use super::read_json;
use crate::output::{format_json, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaCommands,
}

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Show the current schema
    Show,
    /// Create or replace the schema from a JSON file (`-` for stdin)
    Apply {
        /// Schema document with `entity_types` and `edge_types`
        file: PathBuf,
        /// Expected current version; rejected if the stored one differs
        #[arg(long = "expect-version")]
        expect_version: Option<u64>,
    },
}

pub async fn run(args: &SchemaArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let ws = ctx.workspace()?;
    tracing::debug!("Running schema command for workspace: {}", ws);

    match &args.command {
        SchemaCommands::Show => {
            let schema = ctx.erm.schemas().get(&ws).await?;
            print_schema(&schema, cli.output_format());
        }
        SchemaCommands::Apply {
            file,
            expect_version,
        } => {
            let mut input: SchemaInput = read_json(file)?;
            if let Some(version) = expect_version {
                input.version = Some(*version);
            }

            let schema = ctx.erm.schemas().upsert(&ws, input).await?;
            match cli.output_format() {
                OutputFormat::Json => println!("{}", format_json(&schema)),
                OutputFormat::Table => {
                    if !cli.quiet {
                        println!("Schema v{} stored for workspace {}", schema.version, ws);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_schema(schema: &WorkspaceSchema, format: OutputFormat) {
    if format == OutputFormat::Json {
        println!("{}", format_json(schema));
        return;
    }

    println!("Schema v{} (updated {})", schema.version, schema.updated_at);
    let sections = [
        ("Entity types", schema.entity_types.iter().map(|t| (&t.name, &t.properties)).collect::<Vec<_>>()),
        ("Edge types", schema.edge_types.iter().map(|t| (&t.name, &t.properties)).collect::<Vec<_>>()),
    ];
    for (title, types) in sections {
        println!("{}:", title);
        if types.is_empty() {
            println!("  (none)");
        }
        for (name, properties) in types {
            println!("  {}", name);
            for p in properties {
                let required = if p.required { " (required)" } else { "" };
                println!("    - {}: {}{}", p.name, p.property_type.as_str(), required);
            }
        }
    }
}
