//! Error types for Sass compilation.

use std::path::PathBuf;

use thiserror::Error;

use crate::site::Identifier;

/// Errors raised while filtering one item.
#[derive(Debug, Error)]
pub enum SassError {
    /// The compiler rejected the document. `message` is the compiler's own
    /// report (with line and column), passed through untouched.
    #[error("{message}")]
    Compile {
        identifier: Identifier,
        message: String,
    },

    #[error("failed to read `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("item {0} has no file and no content was given")]
    NoContent(Identifier),
}
