//! find command - Query the local graph of a region

use anyhow::Result;

use super::{describe, load_region, parse_property, print_json, ResourceView};
use crate::cli::Context;
use crate::graph::{Graph, Query};

/// Print every resource of `region` matching the filters.
pub fn find(
    ctx: &Context,
    region: &str,
    kinds: &[String],
    properties: &[String],
    ignore_case: bool,
    contains: bool,
) -> Result<()> {
    let (_, graph) = load_region(ctx, region)?;

    let mut query = Query::new(kinds.iter().cloned());
    for raw in properties {
        let (name, value) = parse_property(raw)?;
        query = query.property(name, value);
    }
    if ignore_case {
        query = query.ignore_case();
    }
    if contains {
        query = query.match_string();
    }

    let found = graph.find(&query)?;

    if ctx.json {
        let views: Vec<ResourceView<'_>> =
            found.iter().map(|r| ResourceView::new(r, None)).collect();
        return print_json(&views);
    }

    if found.is_empty() {
        eprintln!("No resource matches {query}");
        return Ok(());
    }
    for resource in &found {
        println!("{}", describe(resource));
    }
    Ok(())
}
