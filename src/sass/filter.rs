//! The Sass filter: compile one content item to CSS.
//!
//! Every call builds its own [`SearchScope`] and [`ImportResolver`], so
//! items can be filtered concurrently without sharing state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::SassError;
use super::resolver::{ImportResolver, MainDocument, Syntax};
use super::scope::SearchScope;
use crate::deps::DependencySink;
use crate::site::ContentItem;
use crate::utils::path::absolute_path;

/// CSS output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    #[default]
    Expanded,
    Compressed,
}

impl From<SassStyle> for grass::OutputStyle {
    fn from(style: SassStyle) -> Self {
        match style {
            SassStyle::Expanded => Self::Expanded,
            SassStyle::Compressed => Self::Compressed,
        }
    }
}

/// Options passed through to the compiler.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub style: SassStyle,
    /// Extra directories searched for imports, after the item's own directory.
    pub load_paths: Vec<PathBuf>,
    /// Silence `@warn` and `@debug` output.
    pub quiet: bool,
    /// Overrides the item's filename as the compiled document's path.
    pub filename: Option<PathBuf>,
    /// Overrides syntax detection from the extension.
    pub syntax: Option<Syntax>,
}

/// Per-compilation context: what is compiled, against which items, and
/// where dependency edges go.
pub struct FilterContext<'a, I> {
    pub item: &'a I,
    pub items: &'a [I],
    pub sink: &'a dyn DependencySink,
}

impl<'a, I: ContentItem> FilterContext<'a, I> {
    pub fn new(item: &'a I, items: &'a [I], sink: &'a dyn DependencySink) -> Self {
        Self { item, items, sink }
    }
}

/// Compile `content` as the item in `ctx`.
///
/// Imports resolve relative to the item's file first, then through
/// `options.load_paths`. Each import that maps to a site item reports an
/// edge to `ctx.sink`.
pub fn run<I: ContentItem>(
    content: &str,
    ctx: &FilterContext<'_, I>,
    options: &FilterOptions,
) -> Result<String, SassError> {
    let filename = options
        .filename
        .as_deref()
        .or_else(|| ctx.item.filename())
        .map(absolute_path);
    let dir = filename.as_deref().and_then(Path::parent);

    let scope = SearchScope::partition(ctx.items, dir);
    let resolver = ImportResolver::new(&grass::StdFs, &scope, ctx.item, ctx.sink);

    let result = match &filename {
        Some(path) => {
            let resolver = resolver.with_main(MainDocument { path, content });
            let mut grass_options = grass_options(options).fs(&resolver);
            if let Some(syntax) = options.syntax {
                grass_options = grass_options.input_syntax(syntax.input_syntax());
            }
            grass::from_path(path, &grass_options)
        }
        None => {
            let syntax = options.syntax.unwrap_or_else(|| {
                Syntax::for_path(Path::new(ctx.item.identifier().as_str()))
            });
            let grass_options = grass_options(options)
                .fs(&resolver)
                .input_syntax(syntax.input_syntax());
            grass::from_string(content.to_owned(), &grass_options)
        }
    };

    result.map_err(|err| SassError::Compile {
        identifier: ctx.item.identifier().clone(),
        message: err.to_string(),
    })
}

/// Read the item's file and compile it.
pub fn compile_item<I: ContentItem>(
    ctx: &FilterContext<'_, I>,
    options: &FilterOptions,
) -> Result<String, SassError> {
    let Some(path) = ctx.item.filename() else {
        return Err(SassError::NoContent(ctx.item.identifier().clone()));
    };
    let content =
        std::fs::read_to_string(path).map_err(|err| SassError::Read(path.to_path_buf(), err))?;
    run(&content, ctx, options)
}

fn grass_options(options: &FilterOptions) -> grass::Options<'_> {
    grass::Options::default()
        .style(options.style.into())
        .quiet(options.quiet)
        .load_paths(&options.load_paths)
}
