//! Site content model: items, identifiers and content directory loading.

mod item;
mod loader;

pub use item::{ContentItem, Identifier, Item};
pub use loader::load_items;
