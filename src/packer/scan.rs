//! Source image discovery.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashMap;

use super::PackError;
use crate::core::{AssetPath, has_image_extension};

/// One image that will become one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SourceImage {
    pub(super) path: PathBuf,
    /// Source-relative path without extension, `/`-separated.
    pub(super) name: String,
}

/// Collect every image below `source_dir`, sorted by region name.
///
/// Sub-directories are combined into the same page; their path becomes part
/// of the region name (`ui/button.png` -> `ui/button`).
pub(super) fn collect_sources(
    source_dir: &Path,
    extensions: &[String],
) -> Result<Vec<SourceImage>, PackError> {
    if !source_dir.is_dir() {
        return Err(PackError::NoInputs(source_dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(source_dir).skip_hidden(true).sort(true) {
        let entry = entry.map_err(|e| PackError::Walk(source_dir.to_path_buf(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_image_extension(&path, extensions) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(source_dir) else {
            continue;
        };
        let name = AssetPath::from_path(relative).region_name("").to_string();
        sources.push(SourceImage { path, name });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    check_duplicates(&sources)?;
    Ok(sources)
}

/// `hero.png` and `hero.jpg` would silently shadow each other in the index.
fn check_duplicates(sources: &[SourceImage]) -> Result<(), PackError> {
    let mut seen: FxHashMap<&str, &Path> = FxHashMap::default();
    for source in sources {
        if let Some(first) = seen.insert(&source.name, &source.path) {
            return Err(PackError::DuplicateRegion {
                name: source.name.clone(),
                first: first.to_path_buf(),
                second: source.path.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["png".into(), "jpg".into()]
    }

    #[test]
    fn test_collect_sources_names_and_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ui")).unwrap();
        fs::write(dir.path().join("player.png"), b"").unwrap();
        fs::write(dir.path().join("ui/button.PNG"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join(".hidden.png"), b"").unwrap();

        let sources = collect_sources(dir.path(), &exts()).unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["player", "ui/button"]);
    }

    #[test]
    fn test_collect_sources_duplicate_region() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hero.png"), b"").unwrap();
        fs::write(dir.path().join("hero.jpg"), b"").unwrap();

        let err = collect_sources(dir.path(), &exts()).unwrap_err();
        assert!(matches!(err, PackError::DuplicateRegion { ref name, .. } if name == "hero"));
    }

    #[test]
    fn test_collect_sources_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = collect_sources(&dir.path().join("nope"), &exts()).unwrap_err();
        assert!(matches!(err, PackError::NoInputs(_)));
    }
}
