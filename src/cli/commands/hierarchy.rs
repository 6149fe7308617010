//! tree, parents and siblings commands - Hierarchy walks from one resource

use anyhow::{Context as _, Result};

use super::{describe, load_region, print_json, ResourceView};
use crate::cli::Context;
use crate::graph::{
    ChildrenVisitor, Graph, GraphError, ParentsVisitor, Query, Resource, SiblingsVisitor,
    TripleGraph, Visitor,
};

#[derive(Clone, Copy)]
enum Walk {
    Children,
    Parents,
    Siblings,
}

/// Print the hierarchy below a resource, indented by depth.
pub fn tree(ctx: &Context, region: &str, kind: &str, id: &str) -> Result<()> {
    show(ctx, region, kind, id, Walk::Children)
}

/// Print the ancestors of a resource, nearest first.
pub fn parents(ctx: &Context, region: &str, kind: &str, id: &str) -> Result<()> {
    show(ctx, region, kind, id, Walk::Parents)
}

/// Print the same-kind siblings of a resource.
pub fn siblings(ctx: &Context, region: &str, kind: &str, id: &str) -> Result<()> {
    show(ctx, region, kind, id, Walk::Siblings)
}

fn show(ctx: &Context, region: &str, kind: &str, id: &str, walk: Walk) -> Result<()> {
    let (region, graph) = load_region(ctx, region)?;
    let start = find_start(&graph, kind, id)
        .with_context(|| format!("No {kind} '{id}' in region {region}"))?;

    let visited = walk_from(&graph, start, walk)?;

    if ctx.json {
        let views: Vec<ResourceView<'_>> = visited
            .iter()
            .map(|(r, position)| ResourceView::new(r, Some(*position)))
            .collect();
        return print_json(&views);
    }

    for (resource, position) in &visited {
        match walk {
            Walk::Children => println!("{}{}", "  ".repeat(*position), describe(resource)),
            Walk::Parents | Walk::Siblings => println!("{}", describe(resource)),
        }
    }
    Ok(())
}

fn find_start(graph: &TripleGraph, kind: &str, id: &str) -> Result<Resource> {
    Ok(graph.find_one(&Query::new([kind]).property("ID", id))?)
}

fn walk_from(graph: &TripleGraph, start: Resource, walk: Walk) -> Result<Vec<(Resource, usize)>> {
    let mut visited = Vec::new();
    let each = |resource: &Resource, position: usize| -> Result<(), GraphError> {
        visited.push((resource.clone(), position));
        Ok(())
    };

    // the start resource is shown as the tree root only
    let mut visitor: Box<dyn Visitor + '_> = match walk {
        Walk::Children => Box::new(ChildrenVisitor::new(start, true, each)),
        Walk::Parents => Box::new(ParentsVisitor::new(start, false, each)),
        Walk::Siblings => Box::new(SiblingsVisitor::new(start, false, each)),
    };
    graph.accept(visitor.as_mut())?;
    drop(visitor);

    Ok(visited)
}
