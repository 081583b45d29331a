//! Freshness detection: content hashes (blake3) for source items.

mod hash;

pub use hash::{ContentHash, compute_dirs_hash, compute_file_hash};
