//! Rebuild on change.
//!
//! The watcher starts before the initial build so edits made while it runs
//! are not lost. Events are debounced, then a single incremental build
//! handles the whole batch.

use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, RecvTimeoutError},
    time::Duration,
};

use super::build::build_site;
use crate::{config::SiteConfig, log, logger::WatchStatus, utils::path::normalize_path};

/// Quiet period after the last event before rebuilding.
const DEBOUNCE: Duration = Duration::from_millis(150);

/// Editor swap files, backups and hidden files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "swp" | "swo" | "tmp") || name.ends_with('~') || name.starts_with('.')
}

/// Whether an event should trigger a rebuild.
fn is_relevant(event: &notify::Event, ignored: &[PathBuf]) -> bool {
    let kind_matches = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(modify) => !matches!(modify, notify::event::ModifyKind::Metadata(_)),
        _ => false,
    };

    kind_matches
        && event.paths.iter().any(|path| {
            !is_temp_file(path) && !ignored.iter().any(|dir| path.starts_with(dir))
        })
}

/// Directories to watch: content and every load path.
fn watch_paths(config: &SiteConfig) -> Vec<PathBuf> {
    std::iter::once(&config.build.content)
        .chain(&config.sass.load_paths)
        .filter(|path| path.exists())
        .map(|path| normalize_path(path))
        .collect()
}

/// Build once, then rebuild whenever a watched file changes.
pub fn watch_site(config: &SiteConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("Failed to create file watcher")?;

    let paths = watch_paths(config);
    for path in &paths {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
    }
    let ignored = vec![
        normalize_path(&config.build.output),
        normalize_path(&config.root.join(crate::cache::CACHE_DIR)),
    ];

    let mut status = WatchStatus::new();
    rebuild(config, &mut status);

    // Later builds never clean.
    let mut config = config.clone();
    config.build.clean = false;
    config.build.force = false;

    log!("watch"; "watching {}", display_paths(&paths, &config));

    let mut pending = false;
    loop {
        match rx.recv_timeout(DEBOUNCE) {
            Ok(Ok(event)) => {
                if is_relevant(&event, &ignored) {
                    crate::debug!("watch"; "{:?} {:?}", event.kind, event.paths);
                    pending = true;
                }
            }
            Ok(Err(e)) => log!("watch"; "notify error: {}", e),
            Err(RecvTimeoutError::Timeout) => {
                if pending {
                    pending = false;
                    rebuild(&config, &mut status);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

fn rebuild(config: &SiteConfig, status: &mut WatchStatus) {
    match build_site(config) {
        Ok(report) if report.is_ok() => {
            if report.compiled.is_empty() {
                status.unchanged(&report.summary());
            } else {
                status.success(&report.summary());
            }
        }
        Ok(report) => {
            let detail: Vec<String> = report
                .errors
                .iter()
                .map(|(id, e)| format!("{id}: {e}"))
                .collect();
            status.error(&report.summary(), &detail.join("\n"));
        }
        Err(e) => status.error("build failed", &format!("{e:#}")),
    }
}

fn display_paths(paths: &[PathBuf], config: &SiteConfig) -> String {
    paths
        .iter()
        .map(|p| config.root_relative(p).display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
