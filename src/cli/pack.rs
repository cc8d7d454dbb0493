//! `texcache pack`

use anyhow::{Context, Result};

use crate::config::TexCacheConfig;
use crate::log;
use crate::packer::{ArtifactPaths, Packer, ShelfPacker};

/// Run the packer once. `force` drops the stamp first so it always writes.
pub fn run_pack(config: &TexCacheConfig, force: bool) -> Result<()> {
    let out_dir = &config.output.dir;
    let name = &config.output.name;
    let paths = ArtifactPaths::new(out_dir, name);

    if force {
        paths
            .invalidate()
            .with_context(|| format!("cannot reset {}", paths.stamp.display()))?;
    }

    let packer = ShelfPacker::new(config.pack_settings());
    let written = packer
        .process_if_modified(&config.source.dir, out_dir, name)
        .with_context(|| format!("failed to pack {}", config.source.dir.display()))?;

    if !written {
        log!("pack"; "{} is up to date", paths.index.display());
    }
    Ok(())
}
