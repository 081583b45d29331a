//! Dependency tracking for incremental builds.
//!
//! - [`DependencySink`]: where the import resolver reports edges
//! - [`DependencyCollector`]: per-compilation sink, no dedup
//! - [`DependencyGraph`]: deduplicated forward/reverse graph persisted between builds
//!
//! ```text
//! compile /main.scss
//! ├── @import "vars"   → edge /main.scss → /_vars.scss
//! └── @import "theme"  → edge /main.scss → /theme/_index.scss
//!
//! On /_vars.scss change:
//! 1. graph.used_by(/_vars.scss) → {/main.scss}
//! 2. recompile only /main.scss
//! ```

mod collector;
mod graph;

pub use collector::DependencyCollector;
pub use graph::DependencyGraph;

use crate::site::Identifier;

/// Receiver of dependency edges emitted while compiling one item.
///
/// Implementations own deduplication and persistence; callers may report the
/// same edge more than once.
pub trait DependencySink: Send + Sync {
    /// Record that `source` depends on every item in `targets`.
    fn record_dependency(&self, source: &Identifier, targets: &[&Identifier]);
}
