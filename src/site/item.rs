//! Content items and their logical identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Stylesheet extensions handled by the Sass filter.
pub const STYLESHEET_EXTENSIONS: [&str; 2] = ["scss", "sass"];

// ============================================================================
// Identifier
// ============================================================================

/// Logical site-relative path of a content item (e.g. `/css/main.scss`).
///
/// Invariants:
/// - Always starts with `/`
/// - Uses `/` as separator on every platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Create an identifier, adding the leading slash if missing.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let normalized = trimmed.replace('\\', "/");
        if normalized.starts_with('/') {
            Self(Arc::from(normalized))
        } else {
            Self(Arc::from(format!("/{normalized}")))
        }
    }

    /// Build an identifier from a path relative to the content directory.
    pub fn from_relative(rel: &Path) -> Self {
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Self::new(&parts.join("/"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (`/css/_b.scss` -> `_b.scss`).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Extension of the last segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(i) => Some(&name[i + 1..]),
        }
    }

    /// Replace (or add) the extension: `/a.scss` -> `/a.css`.
    pub fn with_ext(&self, ext: &str) -> Self {
        let stem_len = match self.extension() {
            Some(current) => self.0.len() - current.len() - 1,
            None => self.0.len(),
        };
        Self(Arc::from(format!("{}.{ext}", &self.0[..stem_len])))
    }

    /// Partials are meant only for inclusion (`_name.scss`).
    pub fn is_partial(&self) -> bool {
        self.file_name().starts_with('_')
    }

    /// Whether the Sass filter handles this identifier.
    pub fn is_stylesheet(&self) -> bool {
        self.extension()
            .is_some_and(|ext| STYLESHEET_EXTENSIONS.contains(&ext))
    }

    /// Whether an `@import` can resolve to this identifier's file.
    pub fn is_importable(&self) -> bool {
        self.is_stylesheet() || self.extension().is_some_and(|ext| ext == "css")
    }

    /// Relative filesystem path (leading slash stripped).
    pub fn to_relative_path(&self) -> PathBuf {
        self.0.trim_start_matches('/').split('/').collect()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

// ============================================================================
// ContentItem
// ============================================================================

/// Read-only view of a content item needed for import resolution.
pub trait ContentItem: Send + Sync {
    /// Logical site path, stable across renames of the backing file.
    fn identifier(&self) -> &Identifier;

    /// Absolute path of the backing file. `None` for generated items.
    fn filename(&self) -> Option<&Path>;
}

/// A content item loaded from the content directory (or generated).
#[derive(Debug, Clone)]
pub struct Item {
    identifier: Identifier,
    filename: Option<PathBuf>,
    attributes: Map<String, Value>,
}

impl Item {
    /// Item backed by a file on disk.
    pub fn file(identifier: impl Into<Identifier>, filename: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            filename: Some(filename.into()),
            attributes: Map::new(),
        }
    }

    /// Item with no backing file.
    pub fn generated(identifier: impl Into<Identifier>) -> Self {
        Self {
            identifier: identifier.into(),
            filename: None,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[cfg(test)]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl ContentItem for Item {
    #[inline]
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    #[inline]
    fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }
}
