//! Content hashes and the dependency graph, persisted as JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CACHE_DIR;
use crate::deps::DependencyGraph;
use crate::freshness::ContentHash;
use crate::site::Identifier;

/// State file name
const STATE_FILE: &str = "state.json";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("corrupt build state `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// What the previous build saw: per-item content hashes and the
/// dependency edges recorded while compiling.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BuildState {
    #[serde(default)]
    hashes: BTreeMap<Identifier, String>,
    #[serde(default)]
    dependencies: BTreeMap<Identifier, Vec<Identifier>>,
    /// Entries whose last compilation failed.
    #[serde(default)]
    failed: BTreeSet<Identifier>,
    /// Hash of every file under the configured load paths.
    #[serde(default)]
    load_paths: Option<String>,
}

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash recorded for `id` by the previous build.
    pub fn hash(&self, id: &Identifier) -> Option<ContentHash> {
        self.hashes.get(id).and_then(|hex| ContentHash::from_hex(hex))
    }

    pub fn set_hash(&mut self, id: Identifier, hash: ContentHash) {
        self.hashes.insert(id, hash.to_hex());
    }

    pub fn remove_hash(&mut self, id: &Identifier) {
        self.hashes.remove(id);
        self.failed.remove(id);
    }

    pub fn set_failed(&mut self, id: Identifier, failed: bool) {
        if failed {
            self.failed.insert(id);
        } else {
            self.failed.remove(&id);
        }
    }

    /// Entries that failed last time, retried by the next build.
    pub fn failed(&self) -> impl Iterator<Item = &Identifier> {
        self.failed.iter()
    }

    pub fn load_paths_hash(&self) -> Option<ContentHash> {
        self.load_paths.as_deref().and_then(ContentHash::from_hex)
    }

    pub fn set_load_paths_hash(&mut self, hash: ContentHash) {
        self.load_paths = Some(hash.to_hex());
    }

    /// Identifiers with a recorded hash.
    pub fn hashed(&self) -> impl Iterator<Item = &Identifier> {
        self.hashes.keys()
    }

    /// Rebuild the dependency graph from the persisted edges.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_entries(
            self.dependencies
                .iter()
                .map(|(source, targets)| (source.clone(), targets.iter().cloned())),
        )
    }

    pub fn set_graph(&mut self, graph: &DependencyGraph) {
        self.dependencies = graph.entries().into_iter().collect();
    }

    /// Load state from `root`; a missing file yields an empty state.
    pub fn restore(root: &Path) -> Result<Self, StateError> {
        let path = state_path(root);
        if !path.exists() {
            return Ok(Self::new());
        }

        let json = fs::read_to_string(&path).map_err(|e| StateError::Io(path.clone(), e))?;
        let state: Self = serde_json::from_str(&json).map_err(|e| StateError::Json(path, e))?;

        crate::debug!("persist"; "restored {} hashes, {} dependency entries",
            state.hashes.len(), state.dependencies.len());
        Ok(state)
    }

    /// Write state under `root`, skipping the write when unchanged.
    pub fn persist(&self, root: &Path) -> Result<(), StateError> {
        let cache_dir = root.join(CACHE_DIR);
        let path = cache_dir.join(STATE_FILE);

        fs::create_dir_all(&cache_dir).map_err(|e| StateError::Io(cache_dir.clone(), e))?;
        let json =
            serde_json::to_string_pretty(self).map_err(|e| StateError::Json(path.clone(), e))?;

        if fs::read_to_string(&path).is_ok_and(|existing| existing == json) {
            crate::debug!("persist"; "state unchanged, skipping write");
            return Ok(());
        }

        fs::write(&path, &json).map_err(|e| StateError::Io(path.clone(), e))?;
        crate::debug!("persist"; "saved {} hashes, {} dependency entries",
            self.hashes.len(), self.dependencies.len());
        Ok(())
    }
}

fn state_path(root: &Path) -> PathBuf {
    root.join(CACHE_DIR).join(STATE_FILE)
}

/// Remove the cache directory under `root`.
pub fn clear_cache_dir(root: &Path) -> Result<(), StateError> {
    let dir = root.join(CACHE_DIR);
    match fs::remove_dir_all(&dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StateError::Io(dir, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(s: &str) -> Identifier {
        Identifier::new(s)
    }

    #[test]
    fn test_restore_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = BuildState::restore(dir.path()).unwrap();
        assert_eq!(state.hashed().count(), 0);
        assert!(state.graph().is_empty());
    }

    #[test]
    fn test_persist_and_restore() {
        let dir = TempDir::new().unwrap();
        let hash = ContentHash::new([7; 32]);
        let mut graph = DependencyGraph::new();
        graph.record(&id("/a.scss"), &[id("/_b.scss")]);

        let mut state = BuildState::new();
        state.set_hash(id("/a.scss"), hash);
        state.set_graph(&graph);
        state.persist(dir.path()).unwrap();

        let restored = BuildState::restore(dir.path()).unwrap();
        assert_eq!(restored.hash(&id("/a.scss")), Some(hash));
        assert!(
            restored
                .graph()
                .used_by(&id("/_b.scss"))
                .unwrap()
                .contains(&id("/a.scss"))
        );
    }

    #[test]
    fn test_failed_and_load_paths_persist() {
        let dir = TempDir::new().unwrap();
        let mut state = BuildState::new();
        state.set_failed(id("/a.scss"), true);
        state.set_failed(id("/b.scss"), true);
        state.set_failed(id("/b.scss"), false);
        state.set_load_paths_hash(ContentHash::new([3; 32]));
        state.persist(dir.path()).unwrap();

        let restored = BuildState::restore(dir.path()).unwrap();
        assert_eq!(restored.failed().collect::<Vec<_>>(), vec![&id("/a.scss")]);
        assert_eq!(restored.load_paths_hash(), Some(ContentHash::new([3; 32])));
    }

    #[test]
    fn test_old_state_without_new_fields() {
        let state: BuildState = serde_json::from_str(r#"{"hashes": {}}"#).unwrap();
        assert_eq!(state.failed().count(), 0);
        assert!(state.load_paths_hash().is_none());
    }

    #[test]
    fn test_remove_hash() {
        let mut state = BuildState::new();
        state.set_hash(id("/a.scss"), ContentHash::new([1; 32]));
        state.remove_hash(&id("/a.scss"));
        assert!(state.hash(&id("/a.scss")).is_none());
    }

    #[test]
    fn test_corrupt_state_is_error() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(CACHE_DIR);
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join(STATE_FILE), "{not json").unwrap();

        let err = BuildState::restore(dir.path()).unwrap_err();
        assert!(matches!(err, StateError::Json(..)));
    }

    #[test]
    fn test_clear_cache_dir() {
        let dir = TempDir::new().unwrap();
        BuildState::new().persist(dir.path()).unwrap();
        assert!(state_path(dir.path()).exists());

        clear_cache_dir(dir.path()).unwrap();
        assert!(!state_path(dir.path()).exists());
        // Clearing twice is fine
        clear_cache_dir(dir.path()).unwrap();
    }
}
