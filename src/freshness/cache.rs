//! Memoized content hashes for source images.

use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{ContentHash, hash_file};

/// Metadata snapshot used to decide whether a memoized hash is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> io::Result<Self> {
        let meta = path.metadata()?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Hash cache keyed by path, invalidated by (mtime, size).
///
/// Shared by the packer's rayon workers, hence the concurrent map.
pub struct FreshnessCache {
    hashes: DashMap<PathBuf, (FileStamp, ContentHash)>,
}

impl FreshnessCache {
    pub fn new() -> Self {
        Self {
            hashes: DashMap::new(),
        }
    }

    /// Hash `path`, reusing the memoized value if its metadata is unchanged.
    pub fn hash(&self, path: &Path) -> io::Result<ContentHash> {
        let stamp = FileStamp::read(path)?;
        if let Some(entry) = self.hashes.get(path)
            && entry.0 == stamp
            && stamp.modified.is_some()
        {
            return Ok(entry.1);
        }

        let hash = hash_file(path)?;
        self.hashes.insert(path.to_path_buf(), (stamp, hash));
        Ok(hash)
    }

    /// Drop entries for files that are no longer part of the source set.
    pub fn retain_paths(&self, keep: &[PathBuf]) {
        self.hashes.retain(|path, _| keep.contains(path));
    }

    pub fn invalidate(&self, path: &Path) {
        self.hashes.remove(path);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}

impl Default for FreshnessCache {
    fn default() -> Self {
        Self::new()
    }
}
