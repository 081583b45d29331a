//! Import resolution against site content items.
//!
//! [`ImportResolver`] decorates a [`grass::Fs`]. The compiler keeps its own
//! candidate search (`_name.scss`, `name.sass`, `name/_index.scss`, load
//! paths, ...) and talks to the filesystem only through this hook:
//!
//! ```text
//! @import "b"
//!   ├── is_file(dir/_b.scss)  → inner.is_file && readable
//!   ├── is_file(dir/b.scss)   → ...
//!   └── read(dir/_b.scss)     → contents
//!                               + item lookup (scoped, then rest)
//!                               + edge current → item
//! ```

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use super::scope::{SearchScope, Tier};
use crate::deps::DependencySink;
use crate::site::ContentItem;
use crate::utils::path::absolute_path;

/// Style-sheet dialect, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Scss,
    /// Indented syntax.
    Sass,
    Css,
}

impl Syntax {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("sass") => Self::Sass,
            Some(ext) if ext.eq_ignore_ascii_case("css") => Self::Css,
            _ => Self::Scss,
        }
    }

    pub fn input_syntax(self) -> grass::InputSyntax {
        match self {
            Self::Scss => grass::InputSyntax::Scss,
            Self::Sass => grass::InputSyntax::Sass,
            Self::Css => grass::InputSyntax::Css,
        }
    }
}

/// Outcome of one resolved import.
#[derive(Debug)]
pub struct ImportRecord<'a, I> {
    /// Absolute path of the imported file.
    pub path: PathBuf,
    pub syntax: Syntax,
    /// Content item backed by `path`, and the tier it was found in.
    pub item: Option<(&'a I, Tier)>,
}

/// In-memory source of the document being compiled.
///
/// Filter input may differ from what is on disk, so the compiler's read of
/// the entry file is served from here.
#[derive(Debug, Clone, Copy)]
pub struct MainDocument<'a> {
    pub path: &'a Path,
    pub content: &'a str,
}

/// `grass::Fs` decorator mapping imported files to content items.
///
/// Built fresh for every compilation; holds no state shared with other
/// compilations.
pub struct ImportResolver<'a, I> {
    inner: &'a dyn grass::Fs,
    scope: &'a SearchScope<'a, I>,
    current: &'a I,
    sink: &'a dyn DependencySink,
    main: Option<MainDocument<'a>>,
    /// Bytes read while checking readability, reused by the following `read`.
    checked: RefCell<Option<(PathBuf, Vec<u8>)>>,
}

impl<'a, I: ContentItem> ImportResolver<'a, I> {
    pub fn new(
        inner: &'a dyn grass::Fs,
        scope: &'a SearchScope<'a, I>,
        current: &'a I,
        sink: &'a dyn DependencySink,
    ) -> Self {
        Self {
            inner,
            scope,
            current,
            sink,
            main: None,
            checked: RefCell::new(None),
        }
    }

    /// Serve `main` from memory instead of the inner filesystem.
    pub fn with_main(mut self, main: MainDocument<'a>) -> Self {
        self.main = Some(main);
        self
    }

    /// Read a file the compiler selected and map it back to a content item.
    ///
    /// Emits one dependency edge when the file backs a known item other than
    /// the one being compiled. Read errors are returned unchanged.
    pub fn resolve_import(&self, path: &Path) -> io::Result<(Vec<u8>, ImportRecord<'a, I>)> {
        let bytes = match self.take_checked(path) {
            Some(bytes) => bytes,
            None => self.inner.read(path)?,
        };

        let absolute = absolute_path(path);
        let item = self.scope.find(&absolute);

        if let Some((target, _)) = item {
            let source = self.current.identifier();
            if target.identifier() != source {
                self.sink.record_dependency(source, &[target.identifier()]);
            }
        }

        let record = ImportRecord {
            syntax: Syntax::for_path(&absolute),
            path: absolute,
            item,
        };
        Ok((bytes, record))
    }

    fn is_main(&self, path: &Path) -> Option<&'a str> {
        let main = self.main?;
        (main.path == path || absolute_path(path) == absolute_path(main.path)).then_some(main.content)
    }

    fn take_checked(&self, path: &Path) -> Option<Vec<u8>> {
        let mut checked = self.checked.borrow_mut();
        match checked.take() {
            Some((checked_path, bytes)) if checked_path == path => Some(bytes),
            // Stale read of another candidate
            _ => None,
        }
    }
}

impl<I> fmt::Debug for ImportResolver<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportResolver")
            .field("inner", &self.inner)
            .field("main", &self.main.map(|m| m.path))
            .finish_non_exhaustive()
    }
}

impl<I: ContentItem> grass::Fs for ImportResolver<'_, I> {
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    /// Existing but unreadable files count as missing, so the compiler moves
    /// on to its next candidate.
    fn is_file(&self, path: &Path) -> bool {
        if self.is_main(path).is_some() {
            return true;
        }
        if !self.inner.is_file(path) {
            return false;
        }

        match self.inner.read(path) {
            Ok(bytes) => {
                *self.checked.borrow_mut() = Some((path.to_path_buf(), bytes));
                true
            }
            Err(err) => {
                crate::debug!("sass"; "skipping unreadable {}: {}", path.display(), err);
                false
            }
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if let Some(content) = self.is_main(path) {
            return Ok(content.as_bytes().to_vec());
        }
        let (bytes, record) = self.resolve_import(path)?;
        match record.item {
            Some((target, tier)) => crate::debug!("sass"; "{} imports {} ({:?}, {:?})",
                self.current.identifier(), target.identifier(), record.syntax, tier),
            None => crate::debug!("sass"; "{} imports {} ({:?}, no item)",
                self.current.identifier(), record.path.display(), record.syntax),
        }
        Ok(bytes)
    }
}
