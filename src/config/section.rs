//! Configuration sections: `[build]` and `[sass]`.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"
//! output = "output"
//! entries = ["/css/main.scss"]
//!
//! [sass]
//! style = "compressed"
//! load_paths = ["vendor/scss"]
//! quiet = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ConfigDiagnostics;
use crate::sass::{FilterOptions, SassStyle};
use crate::site::Identifier;
use crate::utils::path::resolve_path;

// ============================================================================
// [build]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Content directory, relative to the project root.
    pub content: PathBuf,
    /// Output directory, relative to the project root.
    pub output: PathBuf,
    /// Stylesheets written to the output. Empty means every non-partial one.
    pub entries: Vec<Identifier>,

    /// Remove output and cache before building (CLI only).
    #[serde(skip)]
    pub clean: bool,
    /// Recompile every entry regardless of freshness (CLI only).
    #[serde(skip)]
    pub force: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content: "content".into(),
            output: "output".into(),
            entries: Vec::new(),
            clean: false,
            force: false,
        }
    }
}

impl BuildConfig {
    pub(super) fn normalize_paths(&mut self, root: &Path) {
        self.content = resolve_path(&self.content, root);
        self.output = resolve_path(&self.output, root);
    }

    /// Validate build configuration.
    ///
    /// # Checks
    /// - `content` must be an existing directory
    /// - `output` must not be the content directory
    /// - every entry must name a `.scss`/`.sass` file
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.content.is_dir() {
            diag.error_with_hint(
                "build.content",
                format!("content directory not found: {}", self.content.display()),
                "create it or point build.content at your stylesheets",
            );
        }

        if self.output == self.content {
            diag.error("build.output", "output directory must differ from build.content");
        }

        for entry in &self.entries {
            if !entry.is_stylesheet() {
                diag.error(
                    "build.entries",
                    format!("`{entry}` is not a .scss or .sass identifier"),
                );
            }
        }
    }

    /// Whether `id` is written to the output.
    pub fn is_entry(&self, id: &Identifier) -> bool {
        if self.entries.is_empty() {
            id.is_stylesheet() && !id.is_partial()
        } else {
            self.entries.contains(id)
        }
    }
}

// ============================================================================
// [sass]
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SassConfig {
    /// Output style (`expanded` or `compressed`).
    pub style: SassStyle,
    /// Extra import search directories, relative to the project root.
    pub load_paths: Vec<PathBuf>,
    /// Silence `@warn` and `@debug`.
    pub quiet: bool,
}

impl SassConfig {
    pub(super) fn normalize_paths(&mut self, root: &Path) {
        for path in &mut self.load_paths {
            *path = resolve_path(path, root);
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for path in &self.load_paths {
            if !path.is_dir() {
                diag.error(
                    "sass.load_paths",
                    format!("not a directory: {}", path.display()),
                );
            }
        }
    }

    /// Filter options for compiling one item.
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            style: self.style,
            load_paths: self.load_paths.clone(),
            quiet: self.quiet,
            ..Default::default()
        }
    }
}
