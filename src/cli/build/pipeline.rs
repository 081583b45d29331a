//! Build phases: init, plan, compile, finalize.

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    cache::{BuildState, clear_cache_dir},
    config::SiteConfig,
    deps::{DependencyCollector, DependencyGraph},
    freshness::{ContentHash, compute_file_hash},
    log,
    sass::{FilterContext, SassError, compile_item},
    site::{ContentItem, Identifier, Item},
};

/// Clean output and cache when requested, then make sure the output exists.
pub(super) fn init_build(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;

    if config.build.clean {
        if output.exists() {
            fs::remove_dir_all(output)
                .with_context(|| format!("Failed to clean output directory {}", output.display()))?;
        }
        clear_cache_dir(&config.root)?;
        crate::debug!("build"; "cleaned {}", config.root_relative(output).display());
    }

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))
}

/// Restore the previous build state, starting over when it is unreadable.
pub(super) fn restore_state(config: &SiteConfig) -> BuildState {
    match BuildState::restore(&config.root) {
        Ok(state) => state,
        Err(e) => {
            log!("cache"; "{}, starting fresh", e);
            BuildState::new()
        }
    }
}

/// Hash every item's file.
pub(super) fn hash_items(items: &[Item]) -> FxHashMap<Identifier, ContentHash> {
    items
        .par_iter()
        .filter_map(|item| {
            let path = item.filename()?;
            Some((item.identifier().clone(), compute_file_hash(path)))
        })
        .collect()
}

/// What differs from the previous build.
pub(super) struct Changes {
    /// Items whose content changed, items that disappeared, and entries
    /// that failed last time.
    pub changed: FxHashSet<Identifier>,
    pub removed: Vec<Identifier>,
    /// New importable files. Any of them may shadow a file an existing
    /// import resolved to last time, which the graph cannot see.
    pub added: Vec<Identifier>,
    /// Some file under a load path was added, removed or edited.
    pub load_paths_changed: bool,
}

impl Changes {
    /// Whether every entry has to be recompiled.
    pub fn invalidates_all(&self) -> bool {
        self.load_paths_changed || !self.added.is_empty()
    }
}

pub(super) fn detect_changes(
    state: &BuildState,
    hashes: &FxHashMap<Identifier, ContentHash>,
    load_paths_hash: ContentHash,
) -> Changes {
    let mut changed: FxHashSet<Identifier> = hashes
        .iter()
        .filter(|(id, hash)| state.hash(id) != Some(**hash))
        .map(|(id, _)| id.clone())
        .collect();

    let mut added: Vec<Identifier> = changed
        .iter()
        .filter(|id| id.is_importable() && state.hash(id).is_none())
        .cloned()
        .collect();
    added.sort();

    let removed: Vec<Identifier> = state
        .hashed()
        .filter(|id| !hashes.contains_key(*id))
        .cloned()
        .collect();
    changed.extend(removed.iter().cloned());
    changed.extend(state.failed().cloned());

    Changes {
        changed,
        removed,
        added,
        load_paths_changed: state.load_paths_hash() != Some(load_paths_hash),
    }
}

/// Output path of an entry: the identifier with a `.css` extension, under
/// the output directory.
pub(super) fn output_path(config: &SiteConfig, id: &Identifier) -> PathBuf {
    config.build.output.join(id.with_ext("css").to_relative_path())
}

/// Select the entries that need compiling.
///
/// An entry is outdated when it changed or failed last time, when anything
/// it depends on (transitively) changed, or when its output is missing.
/// Every entry is outdated when the build is forced, when a new importable
/// file appeared, or when a load path changed.
pub(super) fn plan<'a>(
    config: &SiteConfig,
    items: &'a [Item],
    graph: &DependencyGraph,
    changes: &Changes,
) -> (Vec<&'a Item>, usize) {
    let force = config.build.force || config.build.clean || changes.invalidates_all();
    let affected = graph.affected_by(changes.changed.iter());

    let mut outdated = Vec::new();
    let mut fresh = 0;
    for item in items.iter().filter(|item| config.build.is_entry(item.identifier())) {
        let id = item.identifier();
        if force
            || changes.changed.contains(id)
            || affected.contains(id)
            || !output_path(config, id).exists()
        {
            outdated.push(item);
        } else {
            fresh += 1;
        }
    }

    crate::debug!("build"; "{} changed, {} added, {} affected, {} outdated",
        changes.changed.len(), changes.added.len(), affected.len(), outdated.len());
    if changes.load_paths_changed {
        crate::debug!("build"; "load paths changed, recompiling every entry");
    }
    (outdated, fresh)
}

/// One compiled entry with the items it imported.
pub(super) struct Compiled {
    pub id: Identifier,
    pub result: Result<String, SassError>,
    pub imports: Vec<Identifier>,
}

/// Compile entries in parallel, each with its own dependency collector.
pub(super) fn compile_all(config: &SiteConfig, items: &[Item], outdated: &[&Item]) -> Vec<Compiled> {
    let options = config.sass.filter_options();

    outdated
        .par_iter()
        .map(|item| {
            let sink = DependencyCollector::new();
            let ctx = FilterContext::new(*item, items, &sink);
            let result = compile_item(&ctx, &options);
            crate::debug!("compile"; "{} ({} imports)", item.identifier(), sink.edge_count());
            Compiled {
                id: item.identifier().clone(),
                result,
                imports: sink.into_targets(),
            }
        })
        .collect()
}

/// Write `content` to `path` unless the file already holds it.
///
/// Returns whether the file was written.
pub(super) fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Remove outputs and graph entries of items that no longer exist.
pub(super) fn prune_removed(
    config: &SiteConfig,
    removed: &[Identifier],
    state: &mut BuildState,
    graph: &mut DependencyGraph,
) {
    for id in removed {
        state.remove_hash(id);
        graph.remove(id);

        if !id.is_stylesheet() {
            continue;
        }
        let output = output_path(config, id);
        if output.is_file() {
            match fs::remove_file(&output) {
                Ok(()) => crate::debug!("build"; "removed {}", config.root_relative(&output).display()),
                Err(e) => log!("build"; "failed to remove {}: {}", output.display(), e),
            }
        }
    }
}
