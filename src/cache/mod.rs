//! Build state persistence between runs.

mod state;

/// Cache directory name (inside project root)
pub(crate) const CACHE_DIR: &str = ".sitesass/cache";

pub use state::{BuildState, clear_cache_dir};
