//! Path utilities.
//!
//! Pure functions for path manipulation.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `absolute_path`, `resolve_path`)

pub mod fs;

pub use fs::{absolute_path, normalize_path, resolve_path};
