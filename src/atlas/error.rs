//! Atlas loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to open an atlas artifact. The cache treats every variant the same
/// way (keep the previous atlas), the variants exist for log messages.
#[derive(Debug, Error)]
pub enum AtlasLoadError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed atlas index `{0}`")]
    Index(PathBuf, #[source] serde_json::Error),

    #[error("cannot decode atlas page `{0}`")]
    Image(PathBuf, #[source] image::ImageError),

    #[error("atlas page `{path}` is {actual_w}x{actual_h}, index says {width}x{height}")]
    SizeMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("region `{name}` lies outside the {width}x{height} atlas page")]
    RegionOutOfBounds {
        name: String,
        width: u32,
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_atlas_load_error_display() {
        let err = AtlasLoadError::Io(
            PathBuf::from("cache.atlas"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("cache.atlas"));

        let err = AtlasLoadError::RegionOutOfBounds {
            name: "player".into(),
            width: 8,
            height: 8,
        };
        assert!(format!("{err}").contains("player"));
    }
}
