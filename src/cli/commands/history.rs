//! history and drift commands - Read the sync history of the store

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::print_json;
use crate::cli::Context;
use crate::core::types::{Region, ServiceName};
use crate::graph::codec::encode_triple;
use crate::sync::History;

/// List revisions, newest first.
pub fn history(ctx: &Context, limit: usize) -> Result<()> {
    let paths = ctx.paths()?;
    let history = History::open(&paths)
        .with_context(|| format!("No sync history at {}", paths.repo_dir().display()))?;
    let revisions = history.revisions(limit)?;

    if ctx.json {
        return print_json(&revisions);
    }

    for rev in &revisions {
        println!(
            "{}  {}  {}",
            rev.oid.short(7),
            rev.time.format("%Y-%m-%d %H:%M:%S"),
            rev.summary
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct DriftView {
    from: String,
    to: String,
    added: Vec<String>,
    removed: Vec<String>,
}

/// Show triples added and removed in one source between two revisions.
pub fn drift(ctx: &Context, region: &str, service: &str, from: &str, to: &str) -> Result<()> {
    let region = Region::new(region)?;
    let service = ServiceName::new(service)?;
    let paths = ctx.paths()?;
    let history = History::open(&paths)
        .with_context(|| format!("No sync history at {}", paths.repo_dir().display()))?;

    let from = history
        .resolve(from)
        .with_context(|| format!("Unknown revision '{from}'"))?;
    let to = history
        .resolve(to)
        .with_context(|| format!("Unknown revision '{to}'"))?;
    let drift = history.drift(&from, &to, &region, &service)?;

    if ctx.json {
        return print_json(&DriftView {
            from: from.to_string(),
            to: to.to_string(),
            added: drift.added.iter().map(encode_triple).collect(),
            removed: drift.removed.iter().map(encode_triple).collect(),
        });
    }

    if drift.is_empty() {
        println!(
            "No drift in {region}/{service} between {} and {}",
            from.short(7),
            to.short(7)
        );
        return Ok(());
    }
    for triple in &drift.removed {
        println!("- {}", encode_triple(triple));
    }
    for triple in &drift.added {
        println!("+ {}", encode_triple(triple));
    }
    Ok(())
}
