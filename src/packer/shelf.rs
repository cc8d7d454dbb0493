use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use super::layout::shelf_layout;
use super::scan::{SourceImage, collect_sources};
use super::write::{ArtifactPaths, write_artifact, write_stamp};
use super::{PackError, PackSettings, Packer};
use crate::atlas::AtlasFile;
use crate::freshness::{ContentHash, Fingerprint, FreshnessCache};

/// Shelf packer with content-hash change detection.
pub struct ShelfPacker {
    settings: PackSettings,
    hashes: FreshnessCache,
}

impl ShelfPacker {
    pub fn new(settings: PackSettings) -> Self {
        Self {
            settings,
            hashes: FreshnessCache::new(),
        }
    }

    pub fn settings(&self) -> &PackSettings {
        &self.settings
    }

    /// Fingerprint of the inputs plus every setting that changes the output.
    fn fingerprint(&self, sources: &[SourceImage]) -> Result<ContentHash, PackError> {
        let hashes = sources
            .par_iter()
            .map(|s| {
                self.hashes
                    .hash(&s.path)
                    .map_err(|e| PackError::Io(s.path.clone(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let live: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
        self.hashes.retain_paths(&live);

        let mut fingerprint = Fingerprint::new();
        fingerprint
            .setting("padding", u64::from(self.settings.padding))
            .setting("max_width", u64::from(self.settings.max_width));
        for (source, hash) in sources.iter().zip(&hashes) {
            fingerprint.entry(&source.name, hash);
        }
        Ok(fingerprint.finish())
    }

    fn pack(&self, sources: &[SourceImage], paths: &ArtifactPaths) -> Result<AtlasFile, PackError> {
        let images = sources
            .par_iter()
            .map(|s| {
                image::open(&s.path)
                    .map(|img| img.into_rgba8())
                    .map_err(|e| PackError::Decode(s.path.clone(), e))
            })
            .collect::<Result<Vec<RgbaImage>, _>>()?;

        let sizes: Vec<(&str, u32, u32)> = sources
            .iter()
            .zip(&images)
            .map(|(s, img)| (s.name.as_str(), img.width(), img.height()))
            .collect();
        let layout = shelf_layout(&sizes, self.settings.padding, self.settings.max_width)?;

        let mut page = RgbaImage::new(layout.width, layout.height);
        let mut regions = BTreeMap::new();
        for ((source, img), rect) in sources.iter().zip(&images).zip(&layout.placements) {
            imageops::replace(&mut page, img, i64::from(rect.x), i64::from(rect.y));
            regions.insert(source.name.clone(), *rect);
        }

        let index = AtlasFile {
            image: paths.page_file_name(),
            width: layout.width,
            height: layout.height,
            regions,
        };
        write_artifact(paths, &page, &index)?;
        Ok(index)
    }
}

impl Packer for ShelfPacker {
    fn process_if_modified(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        name: &str,
    ) -> Result<bool, PackError> {
        let sources = collect_sources(source_dir, &self.settings.extensions)?;
        if sources.is_empty() {
            return Err(PackError::NoInputs(source_dir.to_path_buf()));
        }

        let paths = ArtifactPaths::new(out_dir, name);
        let fingerprint = self.fingerprint(&sources)?;
        if paths.is_current(&fingerprint) {
            crate::debug!("pack"; "{} up to date ({})", name, fingerprint);
            return Ok(false);
        }

        let index = self.pack(&sources, &paths)?;
        write_stamp(&paths, &fingerprint)?;

        crate::log!(
            "pack";
            "packed {} image{} into {} ({}x{})",
            index.regions.len(),
            if index.regions.len() == 1 { "" } else { "s" },
            paths.index.display(),
            index.width,
            index.height
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{Atlas, Rect};
    use image::Rgba;
    use std::fs;
    use tempfile::TempDir;

    fn write_png(path: &Path, w: u32, h: u32, color: [u8; 4]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        RgbaImage::from_pixel(w, h, Rgba(color)).save(path).unwrap();
    }

    fn packer() -> ShelfPacker {
        ShelfPacker::new(PackSettings {
            padding: 1,
            max_width: 64,
            extensions: vec!["png".into()],
        })
    }

    #[test]
    fn test_pack_then_unchanged() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_png(&src.path().join("player.png"), 8, 8, [255, 0, 0, 255]);
        write_png(&src.path().join("ui/button.png"), 4, 2, [0, 255, 0, 255]);

        let packer = packer();
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());
        assert!(!packer.process_if_modified(src.path(), out.path(), "cache").unwrap());

        let atlas = Atlas::load(&out.path().join("cache.atlas")).unwrap();
        assert_eq!(atlas.region_names(), vec!["player", "ui/button"]);

        let player = atlas.find_region("player").unwrap();
        assert_eq!(player.rect, Rect::new(1, 1, 8, 8));
        assert_eq!(atlas.page().get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        // Padding stays transparent
        assert_eq!(atlas.page().get_pixel(0, 0), &Rgba([0, 0, 0, 0]));

        let button = atlas.find_region("ui/button").unwrap();
        let (x, y) = (button.rect.x, button.rect.y);
        assert_eq!(atlas.page().get_pixel(x, y), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_repack_after_change_and_removal() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_png(&src.path().join("a.png"), 4, 4, [1, 1, 1, 255]);
        write_png(&src.path().join("b.png"), 4, 4, [2, 2, 2, 255]);

        let packer = packer();
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());

        write_png(&src.path().join("a.png"), 6, 6, [3, 3, 3, 255]);
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());
        let atlas = Atlas::load(&out.path().join("cache.atlas")).unwrap();
        assert_eq!(atlas.find_region("a").unwrap().rect.w, 6);

        fs::remove_file(src.path().join("b.png")).unwrap();
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());
        let atlas = Atlas::load(&out.path().join("cache.atlas")).unwrap();
        assert!(atlas.find_region("b").is_none());
    }

    #[test]
    fn test_fresh_packer_reuses_stamp() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_png(&src.path().join("a.png"), 4, 4, [1, 1, 1, 255]);

        assert!(packer().process_if_modified(src.path(), out.path(), "cache").unwrap());
        // A new process (empty hash memo) still sees the artifact as current
        assert!(!packer().process_if_modified(src.path(), out.path(), "cache").unwrap());
    }

    #[test]
    fn test_settings_change_forces_repack() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_png(&src.path().join("a.png"), 4, 4, [1, 1, 1, 255]);

        assert!(packer().process_if_modified(src.path(), out.path(), "cache").unwrap());

        let wider = ShelfPacker::new(PackSettings {
            padding: 3,
            ..packer().settings().clone()
        });
        assert!(wider.process_if_modified(src.path(), out.path(), "cache").unwrap());
    }

    #[test]
    fn test_invalidate_forces_repack() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_png(&src.path().join("a.png"), 4, 4, [1, 1, 1, 255]);

        let packer = packer();
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());
        ArtifactPaths::new(out.path(), "cache").invalidate().unwrap();
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());
    }

    #[test]
    fn test_no_inputs_keeps_previous_artifact() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_png(&src.path().join("a.png"), 4, 4, [1, 1, 1, 255]);

        let packer = packer();
        assert!(packer.process_if_modified(src.path(), out.path(), "cache").unwrap());

        fs::remove_file(src.path().join("a.png")).unwrap();
        let err = packer.process_if_modified(src.path(), out.path(), "cache").unwrap_err();
        assert!(matches!(err, PackError::NoInputs(_)));
        assert!(ArtifactPaths::new(out.path(), "cache").exists());
    }

    #[test]
    fn test_corrupt_image_fails_without_stamp() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(src.path().join("broken.png"), b"not a png").unwrap();

        let err = packer().process_if_modified(src.path(), out.path(), "cache").unwrap_err();
        assert!(matches!(err, PackError::Decode(..)));

        let paths = ArtifactPaths::new(out.path(), "cache");
        assert!(!paths.exists());
        assert_eq!(paths.read_stamp(), None);
    }
}
