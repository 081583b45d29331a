//! Content directory scanning.

use std::path::Path;

use jwalk::WalkDir;

use super::{ContentItem, Identifier, Item};
use crate::utils::path::normalize_path;

/// Load every file under `content_dir` as a content item.
///
/// Hidden files and directories are skipped. Filenames are absolute and
/// rooted at the real content directory, so they compare equal to the
/// paths the Sass compiler builds from an item's own filename.
/// Items are sorted by identifier.
pub fn load_items(content_dir: &Path) -> Vec<Item> {
    let root = normalize_path(content_dir);
    if !root.is_dir() {
        crate::debug!("site"; "content dir {} not found", root.display());
        return Vec::new();
    }

    let mut items: Vec<Item> = WalkDir::new(&root)
        .skip_hidden(true)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.path();
            let rel = path.strip_prefix(&root).ok()?;
            let identifier = Identifier::from_relative(rel);
            let extension = identifier.extension().unwrap_or_default().to_string();
            Some(Item::file(identifier, path).with_attribute("extension", extension))
        })
        .collect();

    items.sort_by(|a, b| a.identifier().cmp(b.identifier()));
    crate::debug!("site"; "loaded {} items from {}", items.len(), root.display());
    items
}
