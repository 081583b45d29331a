//! Sass compilation with site-aware import resolution.
//!
//! - [`scope`]: two-tier partition of the site's items
//! - [`resolver`]: `grass::Fs` decorator mapping imports to items
//! - [`filter`]: entry point compiling one item

pub mod error;
pub mod filter;
pub mod resolver;
pub mod scope;

pub use error::SassError;
pub use filter::{FilterContext, FilterOptions, SassStyle, compile_item};
