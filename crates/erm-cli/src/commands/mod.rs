//! CLI command implementations

pub mod completions;
pub mod config;
pub mod edge;
pub mod entity;
pub mod graph;
pub mod schema;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use erm_core::{BatchItemError, BatchMode, BulkOutcome, Error, Properties};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::output::{format_json, print_list, OutputFormat, Tabular};

/// Read a JSON document from a file, or stdin when the path is `-`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Parse a `--props` JSON object; absent means empty
pub fn parse_props(raw: Option<&str>) -> anyhow::Result<Properties> {
    match raw {
        None => Ok(Properties::new()),
        Some(text) => serde_json::from_str(text).context("--props must be a JSON object"),
    }
}

pub fn parse_mode(raw: &str) -> anyhow::Result<BatchMode> {
    Ok(raw.parse::<BatchMode>()?)
}

/// Print a bulk outcome: results, then any rejected items
pub fn print_bulk<T: Tabular + Serialize>(outcome: &BulkOutcome<Vec<T>>, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", format_json(outcome)),
        OutputFormat::Table => {
            print_list(outcome.results(), format);
            print_rejected(outcome.errors());
        }
    }
}

pub fn print_rejected(errors: &[BatchItemError]) {
    if !errors.is_empty() {
        println!();
        println!("{} item(s) rejected:", errors.len());
        print_list(errors, OutputFormat::Table);
    }
}

/// Pass a bulk result through, listing the offending items when an atomic batch was refused
pub fn report_rejected<T>(result: erm_core::Result<T>, format: OutputFormat) -> anyhow::Result<T> {
    match result {
        Err(Error::BatchValidation(errors)) => {
            match format {
                OutputFormat::Json => println!("{}", format_json(&errors)),
                OutputFormat::Table => print_rejected(&errors),
            }
            Err(Error::BatchValidation(errors).into())
        }
        other => Ok(other?),
    }
}
