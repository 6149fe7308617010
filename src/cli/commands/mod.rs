//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Loads the graph or history it needs
//! 3. Formats and displays output (text, or JSON with `--json`)
//!
//! Handlers never write to the store.

mod find;
mod hierarchy;
mod history;

pub use find::find;
pub use hierarchy::{parents, siblings, tree};
pub use history::{drift, history};

use std::collections::BTreeMap;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::types::Region;
use crate::graph::{Resource, TripleGraph, Value};
use crate::sync::load_local_graph;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Find {
            region,
            kinds,
            properties,
            ignore_case,
            contains,
        } => find::find(ctx, &region, &kinds, &properties, ignore_case, contains),
        Command::Tree { region, kind, id } => hierarchy::tree(ctx, &region, &kind, &id),
        Command::Parents { region, kind, id } => hierarchy::parents(ctx, &region, &kind, &id),
        Command::Siblings { region, kind, id } => hierarchy::siblings(ctx, &region, &kind, &id),
        Command::History { limit } => history::history(ctx, limit),
        Command::Drift {
            region,
            service,
            from,
            to,
        } => history::drift(ctx, &region, &service, &from, &to),
    }
}

/// Merge the local graph files of `region`.
fn load_region(ctx: &Context, region: &str) -> Result<(Region, TripleGraph)> {
    let region = Region::new(region)?;
    let paths = ctx.paths()?;
    let graph = load_local_graph(&paths, &region)
        .with_context(|| format!("Failed to load graph of region {region}"))?;
    Ok((region, graph))
}

/// Parse a `NAME=VALUE` filter.
///
/// Integers and booleans become typed values so they compare equal to
/// typed properties; everything else is a string.
fn parse_property(raw: &str) -> Result<(String, Value)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("Invalid property filter '{raw}': expected NAME=VALUE");
    };
    if name.is_empty() {
        bail!("Invalid property filter '{raw}': empty name");
    }

    let value = if let Ok(i) = value.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(b) = value.parse::<bool>() {
        Value::Bool(b)
    } else {
        Value::from(value)
    };
    Ok((name.to_string(), value))
}

/// JSON shape of a resource.
#[derive(Debug, Serialize)]
struct ResourceView<'a> {
    kind: &'a str,
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
    properties: &'a BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    meta: &'a BTreeMap<String, Value>,
}

impl<'a> ResourceView<'a> {
    fn new(resource: &'a Resource, position: Option<usize>) -> Self {
        Self {
            kind: resource.kind(),
            id: resource.id(),
            position,
            properties: resource.properties(),
            meta: resource.metas(),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line text form: `kind[id] Name=... State=...`.
fn describe(resource: &Resource) -> String {
    let mut line = resource.to_string();
    for (name, value) in resource.properties() {
        if name == crate::graph::vocab::ID {
            continue;
        }
        line.push_str(&format!(" {name}={value}"));
    }
    line
}
