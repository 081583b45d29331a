use parking_lot::Mutex;

use super::DependencySink;
use crate::site::Identifier;

/// Collects the edges of a single compilation.
///
/// Every reported edge is kept, duplicates included, so callers can see how
/// often an import resolved. Edges are merged into the [`DependencyGraph`]
/// once compilation finishes.
///
/// [`DependencyGraph`]: super::DependencyGraph
#[derive(Debug, Default)]
pub struct DependencyCollector {
    edges: Mutex<Vec<(Identifier, Identifier)>>,
}

impl DependencyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of edges reported so far.
    pub fn edge_count(&self) -> usize {
        self.edges.lock().len()
    }

    /// Snapshot of the reported edges, in order.
    #[cfg(test)]
    pub fn edges(&self) -> Vec<(Identifier, Identifier)> {
        self.edges.lock().clone()
    }

    /// Consume the collector, returning the reported targets in order.
    pub fn into_targets(self) -> Vec<Identifier> {
        self.edges
            .into_inner()
            .into_iter()
            .map(|(_, target)| target)
            .collect()
    }
}

impl DependencySink for DependencyCollector {
    fn record_dependency(&self, source: &Identifier, targets: &[&Identifier]) {
        let mut edges = self.edges.lock();
        for target in targets {
            edges.push((source.clone(), (*target).clone()));
        }
    }
}
