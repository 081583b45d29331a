//! Two-tier item lookup for import resolution.
//!
//! Items living next to (or below) the stylesheet being compiled are checked
//! first; everything else is the fallback. Which tier matches never changes
//! the result, only how quickly it is found.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::site::ContentItem;
use crate::utils::path::normalize_path;

/// Lookup tier an item was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Same directory subtree as the compiling file.
    Scoped,
    /// Anywhere else on the site.
    Rest,
}

/// Per-compilation partition of the site's items.
///
/// # Invariants
/// - Every item with a filename is in exactly one of `scoped`/`rest`
/// - Items without a filename are in neither
/// - Both tiers keep the input item order
#[derive(Debug)]
pub struct SearchScope<'a, I> {
    scoped: Vec<&'a I>,
    rest: Vec<&'a I>,
}

impl<'a, I: ContentItem> SearchScope<'a, I> {
    /// Partition `items` around `current_dir`, the directory of the file
    /// being compiled.
    ///
    /// `current_dir` is resolved through symlinks; an item is scoped when
    /// its filename lies anywhere below that real directory (`<dir>/**`).
    /// Without a directory (virtual items) everything lands in `rest`.
    pub fn partition(items: &'a [I], current_dir: Option<&Path>) -> Self {
        let root = current_dir.map(normalize_path);
        let mut scoped = Vec::new();
        let mut rest = Vec::new();
        let mut seen: FxHashMap<&Path, &I> = FxHashMap::default();

        for item in items {
            let Some(filename) = item.filename() else {
                continue;
            };

            if let Some(first) = seen.get(filename) {
                crate::log!("sass"; "{} and {} share filename {}, imports resolve to {}",
                    first.identifier(), item.identifier(), filename.display(), first.identifier());
            } else {
                seen.insert(filename, item);
            }

            match &root {
                Some(root) if filename.starts_with(root) => scoped.push(item),
                _ => rest.push(item),
            }
        }

        crate::debug!("sass"; "scope: {} scoped, {} rest", scoped.len(), rest.len());
        Self { scoped, rest }
    }

    /// Items under the compiling file's directory.
    #[cfg(test)]
    pub fn scoped(&self) -> &[&'a I] {
        &self.scoped
    }

    /// All other items with a filename.
    #[cfg(test)]
    pub fn rest(&self) -> &[&'a I] {
        &self.rest
    }

    /// Find the item backed by `filename`.
    ///
    /// `filename` must already be absolute; comparison is exact. Scoped items
    /// are searched before the rest, and the first match wins.
    pub fn find(&self, filename: &Path) -> Option<(&'a I, Tier)> {
        let matches = |item: &&&'a I| item.filename() == Some(filename);

        if let Some(item) = self.scoped.iter().find(matches) {
            return Some((*item, Tier::Scoped));
        }
        self.rest
            .iter()
            .find(matches)
            .map(|item| (*item, Tier::Rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Identifier, Item};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ids<'a>(items: &[&'a Item]) -> Vec<&'a str> {
        items.iter().map(|i| i.identifier().as_str()).collect()
    }

    /// Real temp dir so `canonicalize` agrees with the item filenames.
    fn site() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("content/css/nested")).unwrap();
        fs::create_dir_all(root.join("content/other")).unwrap();
        (dir, root)
    }

    #[test]
    fn test_partition_splits_by_subtree() {
        let (_dir, root) = site();
        let content = root.join("content");
        let items = vec![
            Item::file("/css/a.scss", content.join("css/a.scss")),
            Item::file("/css/nested/_b.scss", content.join("css/nested/_b.scss")),
            Item::file("/other/c.scss", content.join("other/c.scss")),
            Item::generated("/virtual.scss"),
        ];

        let scope = SearchScope::partition(&items, Some(&content.join("css")));

        assert_eq!(ids(scope.scoped()), vec!["/css/a.scss", "/css/nested/_b.scss"]);
        assert_eq!(ids(scope.rest()), vec!["/other/c.scss"]);
    }

    #[test]
    fn test_every_filename_in_exactly_one_tier() {
        let (_dir, root) = site();
        let content = root.join("content");
        let items = vec![
            Item::file("/css/a.scss", content.join("css/a.scss")),
            Item::generated("/gen.scss"),
            Item::file("/other/c.scss", content.join("other/c.scss")),
            Item::file("/outside.scss", "/elsewhere/outside.scss"),
            Item::generated("/gen2.scss"),
        ];

        let scope = SearchScope::partition(&items, Some(&content.join("css")));

        for item in &items {
            let in_scoped = scope.scoped().iter().any(|i| std::ptr::eq(*i, item));
            let in_rest = scope.rest().iter().any(|i| std::ptr::eq(*i, item));
            if item.filename().is_some() {
                assert!(in_scoped ^ in_rest, "{}", item.identifier());
            } else {
                assert!(!in_scoped && !in_rest, "{}", item.identifier());
            }
        }
    }

    #[test]
    fn test_sibling_prefix_is_not_scoped() {
        let (_dir, root) = site();
        let items = vec![Item::file("/x.scss", root.join("content-old/x.scss"))];

        let scope = SearchScope::partition(&items, Some(&root.join("content")));

        assert!(scope.scoped().is_empty());
        assert_eq!(scope.rest().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dir_resolves_to_real_path() {
        let (_dir, root) = site();
        let content = root.join("content");
        std::os::unix::fs::symlink(content.join("css"), root.join("link")).unwrap();
        let items = vec![Item::file("/css/a.scss", content.join("css/a.scss"))];

        let scope = SearchScope::partition(&items, Some(&root.join("link")));

        assert_eq!(ids(scope.scoped()), vec!["/css/a.scss"]);
    }

    #[test]
    fn test_no_current_dir_puts_everything_in_rest() {
        let items = vec![
            Item::file("/a.scss", "/site/content/a.scss"),
            Item::generated("/gen.scss"),
        ];

        let scope = SearchScope::partition(&items, None);

        assert!(scope.scoped().is_empty());
        assert_eq!(ids(scope.rest()), vec!["/a.scss"]);
    }

    #[test]
    fn test_find_prefers_scoped_then_rest() {
        let (_dir, root) = site();
        let content = root.join("content");
        let a = content.join("css/a.scss");
        let c = content.join("other/c.scss");
        let items = vec![
            Item::file("/other/c.scss", &c),
            Item::file("/css/a.scss", &a),
        ];

        let scope = SearchScope::partition(&items, Some(&content.join("css")));

        let (found, tier) = scope.find(&a).unwrap();
        assert_eq!(found.identifier(), &Identifier::new("/css/a.scss"));
        assert_eq!(tier, Tier::Scoped);

        let (found, tier) = scope.find(&c).unwrap();
        assert_eq!(found.identifier(), &Identifier::new("/other/c.scss"));
        assert_eq!(tier, Tier::Rest);

        assert!(scope.find(&content.join("missing.scss")).is_none());
    }

    #[test]
    fn test_duplicate_filename_first_wins() {
        let items = vec![
            Item::file("/first.scss", "/site/content/shared.scss"),
            Item::file("/second.scss", "/site/content/shared.scss"),
        ];

        let scope = SearchScope::partition(&items, None);

        let (found, _) = scope.find(Path::new("/site/content/shared.scss")).unwrap();
        assert_eq!(found.identifier().as_str(), "/first.scss");
    }
}
