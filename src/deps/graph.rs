use rustc_hash::{FxHashMap, FxHashSet};

use crate::site::Identifier;

type IdSet = FxHashSet<Identifier>;
type IdSetMap = FxHashMap<Identifier, IdSet>;

/// Bidirectional dependency graph between content items.
///
/// Maintains both forward (item → imports) and reverse (import → items)
/// mappings for lookups in either direction.
///
/// # Invariants
/// - Forward and reverse mappings are always consistent
/// - Edges are deduplicated
/// - Self-references are excluded
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Forward: compiled item → items it imported
    forward: IdSetMap,
    /// Reverse: imported item → items that imported it
    reverse: IdSetMap,
}

impl DependencyGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted `(source, targets)` entries.
    pub fn from_entries<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Identifier, T)>,
        T: IntoIterator<Item = Identifier>,
    {
        let mut graph = Self::new();
        for (source, targets) in entries {
            let targets: Vec<_> = targets.into_iter().collect();
            graph.record(&source, &targets);
        }
        graph
    }

    /// Record the dependencies of `source` after compiling it.
    ///
    /// Replaces any existing dependencies for this item.
    pub fn record(&mut self, source: &Identifier, targets: &[Identifier]) {
        // Remove old mappings first (maintains invariant)
        self.remove(source);

        let deps: IdSet = targets.iter().filter(|t| *t != source).cloned().collect();

        for dep in &deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(source.clone());
        }

        self.forward.insert(source.clone(), deps);
    }

    /// Items that imported `target`.
    #[inline]
    pub fn used_by(&self, target: &Identifier) -> Option<&IdSet> {
        self.reverse.get(target)
    }

    /// Items imported by `source`.
    #[inline]
    pub fn uses(&self, source: &Identifier) -> Option<&IdSet> {
        self.forward.get(source)
    }

    /// Every item that directly or transitively imports one of `changed`.
    ///
    /// The changed items themselves are not included unless they import
    /// another changed item.
    pub fn affected_by<'a>(&self, changed: impl IntoIterator<Item = &'a Identifier>) -> IdSet {
        let mut affected = IdSet::default();
        let mut stack: Vec<&Identifier> = changed.into_iter().collect();

        while let Some(current) = stack.pop() {
            let Some(users) = self.reverse.get(current) else {
                continue;
            };
            for user in users {
                if affected.insert(user.clone()) {
                    stack.push(user);
                }
            }
        }

        affected
    }

    /// Drop `source` and clean up its reverse mappings.
    pub fn remove(&mut self, source: &Identifier) {
        let Some(old_deps) = self.forward.remove(source) else {
            return;
        };

        for dep in old_deps {
            if let Some(dependents) = self.reverse.get_mut(&dep) {
                dependents.remove(source);
                if dependents.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }

    /// Number of items with recorded dependencies.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Forward entries with sorted targets, sorted by source.
    pub fn entries(&self) -> Vec<(Identifier, Vec<Identifier>)> {
        let mut entries: Vec<_> = self
            .forward
            .iter()
            .map(|(source, deps)| {
                let mut deps: Vec<_> = deps.iter().cloned().collect();
                deps.sort();
                (source.clone(), deps)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::new(s)
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.used_by(&id("/any.scss")).is_none());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_basic_recording() {
        let mut graph = DependencyGraph::new();
        let main = id("/main.scss");
        let vars = id("/_vars.scss");

        graph.record(&main, std::slice::from_ref(&vars));

        assert!(graph.used_by(&vars).unwrap().contains(&main));
        assert!(graph.uses(&main).unwrap().contains(&vars));
    }

    #[test]
    fn test_duplicates_are_merged() {
        let mut graph = DependencyGraph::new();
        let main = id("/main.scss");
        let vars = id("/_vars.scss");

        graph.record(&main, &[vars.clone(), vars.clone()]);

        assert_eq!(graph.uses(&main).unwrap().len(), 1);
    }

    #[test]
    fn test_self_reference_excluded() {
        let mut graph = DependencyGraph::new();
        let main = id("/main.scss");
        let vars = id("/_vars.scss");

        graph.record(&main, &[main.clone(), vars.clone()]);

        assert!(graph.used_by(&main).is_none());
        assert!(graph.used_by(&vars).unwrap().contains(&main));
    }

    #[test]
    fn test_update_replaces_old_dependencies() {
        let mut graph = DependencyGraph::new();
        let main = id("/main.scss");
        let old = id("/_old.scss");
        let new = id("/_new.scss");

        graph.record(&main, std::slice::from_ref(&old));
        graph.record(&main, std::slice::from_ref(&new));

        assert!(graph.used_by(&old).is_none());
        assert!(graph.used_by(&new).unwrap().contains(&main));
    }

    #[test]
    fn test_shared_dependency() {
        let mut graph = DependencyGraph::new();
        let a = id("/a.scss");
        let b = id("/b.scss");
        let shared = id("/_shared.scss");

        graph.record(&a, std::slice::from_ref(&shared));
        graph.record(&b, std::slice::from_ref(&shared));

        let users = graph.used_by(&shared).unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&a) && users.contains(&b));
    }

    #[test]
    fn test_affected_is_transitive() {
        let mut graph = DependencyGraph::new();
        let site = id("/site.scss");
        let theme = id("/_theme.scss");
        let colors = id("/_colors.scss");
        let other = id("/other.scss");

        graph.record(&site, std::slice::from_ref(&theme));
        graph.record(&theme, std::slice::from_ref(&colors));
        graph.record(&other, &[]);

        let affected = graph.affected_by([&colors]);
        assert!(affected.contains(&theme));
        assert!(affected.contains(&site));
        assert!(!affected.contains(&other));
        assert!(!affected.contains(&colors));
    }

    #[test]
    fn test_affected_handles_cycles() {
        let mut graph = DependencyGraph::new();
        let a = id("/_a.scss");
        let b = id("/_b.scss");

        graph.record(&a, std::slice::from_ref(&b));
        graph.record(&b, std::slice::from_ref(&a));

        let affected = graph.affected_by([&a]);
        assert_eq!(affected.len(), 2);
    }

    #[test]
    fn test_remove_cleans_reverse() {
        let mut graph = DependencyGraph::new();
        let main = id("/main.scss");
        let vars = id("/_vars.scss");

        graph.record(&main, std::slice::from_ref(&vars));
        graph.remove(&main);

        assert!(graph.uses(&main).is_none());
        assert!(graph.used_by(&vars).is_none());
    }

    #[test]
    fn test_entries_roundtrip() {
        let mut graph = DependencyGraph::new();
        graph.record(&id("/b.scss"), &[id("/_z.scss"), id("/_y.scss")]);
        graph.record(&id("/a.scss"), &[]);

        let entries = graph.entries();
        assert_eq!(entries[0].0, id("/a.scss"));
        assert_eq!(entries[1].1, vec![id("/_y.scss"), id("/_z.scss")]);

        let restored = DependencyGraph::from_entries(entries);
        assert_eq!(restored.len(), 2);
        assert!(restored.used_by(&id("/_z.scss")).unwrap().contains(&id("/b.scss")));
    }
}
