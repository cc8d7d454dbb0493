//! Freshness detection: blake3 content hashes for source images, memoized
//! by file metadata so unchanged images are not re-read on every rebuild.

mod cache;
mod hash;

pub use cache::FreshnessCache;
pub use hash::{ContentHash, Fingerprint, hash_file};
