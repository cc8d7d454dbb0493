//! Atlas packer: turns a directory of images into an atlas artifact.
//!
//! The cache only depends on the [`Packer`] trait; [`ShelfPacker`] is the
//! bundled implementation.
//!
//! ```text
//! source dir --scan--> SourceImage[] --fingerprint--> up to date? --no--> decode
//!     --> shelf_layout --> compose page --> write page/index --> write stamp
//! ```

mod error;
mod layout;
mod scan;
mod shelf;
mod write;

use std::path::Path;

pub use error::PackError;
pub use shelf::ShelfPacker;
pub use write::{ArtifactPaths, write_artifact, write_stamp};

/// Produces or refreshes the on-disk atlas artifact.
///
/// Called from a background worker, never from the cache owner.
pub trait Packer: Send + Sync {
    /// Repack `source_dir` into `out_dir/<name>.*` if any input changed since
    /// the last successful run.
    ///
    /// Returns `Ok(true)` when a new artifact was written and `Ok(false)` when
    /// the existing one is already up to date.
    fn process_if_modified(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        name: &str,
    ) -> Result<bool, PackError>;
}

/// Settings that shape the packed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSettings {
    /// Transparent pixels around every image and the page border.
    pub padding: u32,
    pub max_width: u32,
    /// Lowercase image extensions to pick up.
    pub extensions: Vec<String>,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            padding: 2,
            max_width: 2048,
            extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
        }
    }
}
