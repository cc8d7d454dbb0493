//! Artifact files and crash-safe writes.
//!
//! Write order is page -> index -> stamp, each through a temp file renamed
//! into place. A crash between steps leaves either the old index (still
//! pointing at a page of the same name) or a stale stamp, which only forces
//! a repack next time.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use super::PackError;
use crate::atlas::AtlasFile;
use crate::freshness::ContentHash;

/// Paths of the files making up one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// JSON index, the file `Atlas::load` opens.
    pub index: PathBuf,
    pub page: PathBuf,
    /// Source fingerprint of the last successful pack.
    pub stamp: PathBuf,
}

impl ArtifactPaths {
    pub fn new(out_dir: &Path, name: &str) -> Self {
        Self {
            index: out_dir.join(format!("{name}.atlas")),
            page: out_dir.join(format!("{name}.png")),
            stamp: out_dir.join(format!("{name}.stamp")),
        }
    }

    /// File name of the page, as referenced from the index.
    pub fn page_file_name(&self) -> String {
        self.page
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.index.is_file() && self.page.is_file()
    }

    /// Fingerprint recorded by the last successful pack.
    pub fn read_stamp(&self) -> Option<ContentHash> {
        let text = fs::read_to_string(&self.stamp).ok()?;
        ContentHash::from_hex(&text)
    }

    /// Artifact exists and was produced from inputs with this fingerprint.
    pub fn is_current(&self, fingerprint: &ContentHash) -> bool {
        self.exists() && self.read_stamp().as_ref() == Some(fingerprint)
    }

    /// Forget the recorded fingerprint so the next pack always rewrites.
    pub fn invalidate(&self) -> Result<(), PackError> {
        match fs::remove_file(&self.stamp) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PackError::Io(self.stamp.clone(), e)),
        }
    }
}

/// Write page and index, both atomically, page first.
pub fn write_artifact(
    paths: &ArtifactPaths,
    page: &RgbaImage,
    index: &AtlasFile,
) -> Result<(), PackError> {
    if let Some(dir) = paths.index.parent() {
        fs::create_dir_all(dir).map_err(|e| PackError::Io(dir.to_path_buf(), e))?;
    }

    let page_tmp = temp_path(&paths.page);
    page.save_with_format(&page_tmp, ImageFormat::Png)
        .map_err(|e| PackError::Encode(page_tmp.clone(), e))?;
    rename(&page_tmp, &paths.page)?;

    let json = serde_json::to_vec_pretty(index)?;
    write_atomic(&paths.index, &json)
}

pub fn write_stamp(paths: &ArtifactPaths, fingerprint: &ContentHash) -> Result<(), PackError> {
    write_atomic(&paths.stamp, fingerprint.to_hex().as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PackError> {
    let tmp = temp_path(path);
    fs::write(&tmp, bytes).map_err(|e| PackError::Io(tmp.clone(), e))?;
    rename(&tmp, path)
}

fn rename(from: &Path, to: &Path) -> Result<(), PackError> {
    fs::rename(from, to).map_err(|e| {
        let _ = fs::remove_file(from);
        PackError::Io(to.to_path_buf(), e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
