//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// An absolute `config_name` is returned as-is if it exists.
///
/// # Example
/// ```text
/// /home/user/game/assets/gfx/   ← start
/// /home/user/game/texcache.toml ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Join `path` onto `root` unless it is already absolute.
pub fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_file_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("assets/gfx/ui");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("texcache.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("texcache.toml")).unwrap();
        assert_eq!(found, dir.path().join("texcache.toml"));
    }

    #[test]
    fn test_find_config_file_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("texcache.toml")).unwrap();
        let found = find_config_file(dir.path(), Path::new("texcache.toml"));
        assert_ne!(found, Some(dir.path().join("texcache.toml")));
    }

    #[test]
    fn test_find_config_file_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_file(Path::new("/"), &path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(Path::new("/"), &path), Some(path));
    }

    #[test]
    fn test_resolve_against() {
        let root = Path::new("/project");
        assert_eq!(resolve_against(root, Path::new("assets")), PathBuf::from("/project/assets"));
        assert_eq!(resolve_against(root, Path::new("/abs")), PathBuf::from("/abs"));
    }
}
