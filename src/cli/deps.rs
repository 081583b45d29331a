//! `deps` command: query the dependency graph recorded by the last build.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::fmt::Write;

use crate::{
    cache::BuildState,
    config::SiteConfig,
    deps::DependencyGraph,
    site::Identifier,
};

/// Print what `identifier` imports and what imports it, or every recorded
/// entry when no identifier is given.
pub fn show_deps(config: &SiteConfig, identifier: Option<&str>) -> Result<()> {
    let graph = BuildState::restore(&config.root)?.graph();

    let report = match identifier {
        Some(raw) => describe_item(&graph, &Identifier::new(raw)),
        None => describe_all(&graph),
    };
    print!("{report}");
    Ok(())
}

fn sorted<'a>(ids: impl IntoIterator<Item = &'a Identifier>) -> Vec<&'a Identifier> {
    let mut ids: Vec<_> = ids.into_iter().collect();
    ids.sort();
    ids
}

fn describe_item(graph: &DependencyGraph, id: &Identifier) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", id.bold());

    let sections = [
        ("uses", graph.uses(id)),
        ("used by", graph.used_by(id)),
    ];
    for (label, set) in sections {
        let ids = sorted(set.into_iter().flatten());
        if ids.is_empty() {
            let _ = writeln!(out, "  {}: {}", label, "none".dimmed());
            continue;
        }
        let _ = writeln!(out, "  {label}:");
        for dep in ids {
            let _ = writeln!(out, "    {dep}");
        }
    }

    let affected_set = graph.affected_by([id]);
    let affected = sorted(&affected_set);
    if !affected.is_empty() {
        let list: Vec<&str> = affected.iter().map(|id| id.as_str()).collect();
        let _ = writeln!(out, "  rebuilt on change: {}", list.join(", "));
    }
    out
}

fn describe_all(graph: &DependencyGraph) -> String {
    if graph.is_empty() {
        return format!("{}\n", "no dependencies recorded; run `sitesass build` first".dimmed());
    }

    let mut out = String::new();
    for (source, targets) in graph.entries() {
        if targets.is_empty() {
            let _ = writeln!(out, "{source}");
            continue;
        }
        let list: Vec<&str> = targets.iter().map(Identifier::as_str).collect();
        let _ = writeln!(out, "{source} -> {}", list.join(", "));
    }
    out
}
