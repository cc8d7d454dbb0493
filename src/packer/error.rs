//! Packing errors.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons the packer could not produce an artifact. The previous artifact
/// (if any) is left in place for every variant.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("cannot walk source directory `{0}`")]
    Walk(PathBuf, #[source] jwalk::Error),

    #[error("cannot decode source image `{0}`")]
    Decode(PathBuf, #[source] image::ImageError),

    #[error("cannot encode atlas page `{0}`")]
    Encode(PathBuf, #[source] image::ImageError),

    #[error("cannot serialize atlas index")]
    Index(#[from] serde_json::Error),

    #[error("no images found in `{0}`")]
    NoInputs(PathBuf),

    #[error("`{first}` and `{second}` both map to region `{name}`")]
    DuplicateRegion {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("image `{name}` is {width}px wide, page limit is {max_width}px")]
    TooWide {
        name: String,
        width: u32,
        max_width: u32,
    },

    #[error("packer worker panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_error_display() {
        let err = PackError::NoInputs(PathBuf::from("assets/gfx"));
        assert_eq!(format!("{err}"), "no images found in `assets/gfx`");

        let err = PackError::TooWide {
            name: "sky".into(),
            width: 4096,
            max_width: 2048,
        };
        let display = format!("{err}");
        assert!(display.contains("sky"));
        assert!(display.contains("2048"));
    }
}
