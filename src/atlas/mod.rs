//! Loaded texture atlas: one decoded RGBA page plus its region index.
//!
//! The artifact on disk is a pair written by the packer:
//!
//! ```text
//! .textureCache/
//! ├── cache.atlas   # JSON index (see `file`)
//! └── cache.png     # page image
//! ```

mod error;
mod file;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use rustc_hash::FxHashMap;

pub use error::AtlasLoadError;
pub use file::{AtlasFile, Rect};

/// A named sub-image of an atlas page.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasRegion {
    pub name: Arc<str>,
    pub rect: Rect,
    /// Normalized `[u0, v0, u1, v1]` texture coordinates.
    pub uv: [f32; 4],
}

/// An atlas opened from disk.
///
/// `generation` is 0 until the cache installs the atlas, then it carries the
/// generation it was installed as.
pub struct Atlas {
    index_path: PathBuf,
    page: RgbaImage,
    regions: FxHashMap<Arc<str>, AtlasRegion>,
    generation: u64,
}

impl Atlas {
    /// Open an atlas index and decode its page.
    pub fn load(index_path: &Path) -> Result<Self, AtlasLoadError> {
        let bytes =
            fs::read(index_path).map_err(|e| AtlasLoadError::Io(index_path.to_path_buf(), e))?;
        let file: AtlasFile = serde_json::from_slice(&bytes)
            .map_err(|e| AtlasLoadError::Index(index_path.to_path_buf(), e))?;

        let image_path = index_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&file.image);
        let page = image::open(&image_path)
            .map_err(|e| AtlasLoadError::Image(image_path.clone(), e))?
            .into_rgba8();

        if page.dimensions() != (file.width, file.height) {
            return Err(AtlasLoadError::SizeMismatch {
                path: image_path,
                width: file.width,
                height: file.height,
                actual_w: page.width(),
                actual_h: page.height(),
            });
        }

        let atlas = Self::from_parts(index_path.to_path_buf(), file, page)?;
        crate::debug!("cache"; "loaded atlas {} ({} regions)", index_path.display(), atlas.len());
        Ok(atlas)
    }

    /// Build an atlas from an already decoded page, validating every region.
    pub fn from_parts(
        index_path: PathBuf,
        file: AtlasFile,
        page: RgbaImage,
    ) -> Result<Self, AtlasLoadError> {
        let (width, height) = page.dimensions();
        let mut regions = FxHashMap::default();
        regions.reserve(file.regions.len());

        for (name, rect) in file.regions {
            if !rect.fits_within(width, height) {
                return Err(AtlasLoadError::RegionOutOfBounds {
                    name,
                    width,
                    height,
                });
            }
            let name: Arc<str> = Arc::from(name);
            let uv = uv_of(&rect, width, height);
            regions.insert(Arc::clone(&name), AtlasRegion { name, rect, uv });
        }

        Ok(Self {
            index_path,
            page,
            regions,
            generation: 0,
        })
    }

    pub fn find_region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.get(name)
    }

    /// Region names in sorted order.
    pub fn region_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regions.keys().map(|k| k.as_ref()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn page(&self) -> &RgbaImage {
        &self.page
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Free the page. Consumes the atlas so it cannot be released twice.
    pub fn release(self) {
        crate::debug!(
            "cache";
            "released atlas generation {} ({}x{}, {} regions)",
            self.generation,
            self.page.width(),
            self.page.height(),
            self.regions.len()
        );
    }
}

impl fmt::Debug for Atlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atlas")
            .field("index_path", &self.index_path)
            .field("size", &self.page.dimensions())
            .field("regions", &self.regions.len())
            .field("generation", &self.generation)
            .finish()
    }
}

#[allow(clippy::cast_precision_loss)]
fn uv_of(rect: &Rect, width: u32, height: u32) -> [f32; 4] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    [
        rect.x as f32 / w,
        rect.y as f32 / h,
        (rect.x + rect.w) as f32 / w,
        (rect.y + rect.h) as f32 / h,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn index(regions: &[(&str, Rect)], width: u32, height: u32) -> AtlasFile {
        AtlasFile {
            image: "cache.png".into(),
            width,
            height,
            regions: regions
                .iter()
                .map(|(name, rect)| (name.to_string(), *rect))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn write_artifact(dir: &Path, file: &AtlasFile, page: &RgbaImage) -> PathBuf {
        page.save_with_format(dir.join(&file.image), ImageFormat::Png)
            .unwrap();
        let path = dir.join("cache.atlas");
        fs::write(&path, serde_json::to_vec(file).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_roundtrip_and_find_region() {
        let dir = TempDir::new().unwrap();
        let page = RgbaImage::from_pixel(8, 4, Rgba([255, 0, 0, 255]));
        let file = index(
            &[("player", Rect::new(0, 0, 4, 4)), ("ui/button", Rect::new(4, 0, 4, 2))],
            8,
            4,
        );
        let path = write_artifact(dir.path(), &file, &page);

        let atlas = Atlas::load(&path).unwrap();
        assert_eq!(atlas.len(), 2);
        assert_eq!(atlas.generation(), 0);
        assert_eq!(atlas.region_names(), vec!["player", "ui/button"]);

        let button = atlas.find_region("ui/button").unwrap();
        assert_eq!(button.rect, Rect::new(4, 0, 4, 2));
        assert_eq!(button.uv, [0.5, 0.0, 1.0, 0.5]);
        assert!(atlas.find_region("enemy").is_none());
        atlas.release();
    }

    #[test]
    fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = Atlas::load(&dir.path().join("cache.atlas")).unwrap_err();
        assert!(matches!(err, AtlasLoadError::Io(..)));
    }

    #[test]
    fn test_load_corrupt_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.atlas");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(Atlas::load(&path).unwrap_err(), AtlasLoadError::Index(..)));
    }

    #[test]
    fn test_load_missing_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.atlas");
        fs::write(&path, serde_json::to_vec(&index(&[], 4, 4)).unwrap()).unwrap();
        assert!(matches!(Atlas::load(&path).unwrap_err(), AtlasLoadError::Image(..)));
    }

    #[test]
    fn test_load_size_mismatch() {
        let dir = TempDir::new().unwrap();
        let page = RgbaImage::new(4, 4);
        let mut file = index(&[], 4, 4);
        let path = write_artifact(dir.path(), &file, &page);
        file.width = 16;
        fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        assert!(matches!(
            Atlas::load(&path).unwrap_err(),
            AtlasLoadError::SizeMismatch { width: 16, actual_w: 4, .. }
        ));
    }

    #[test]
    fn test_region_out_of_bounds_rejected() {
        let file = index(&[("big", Rect::new(2, 2, 4, 4))], 4, 4);
        let err = Atlas::from_parts(PathBuf::from("x.atlas"), file, RgbaImage::new(4, 4))
            .unwrap_err();
        assert!(matches!(err, AtlasLoadError::RegionOutOfBounds { ref name, .. } if name == "big"));
    }
}
