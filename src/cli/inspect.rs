//! `texcache inspect`

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::atlas::{Atlas, Rect};
use crate::cache::{Binding, RegionIndex};
use crate::config::TexCacheConfig;
use crate::core::AssetPath;
use crate::log;
use crate::packer::ArtifactPaths;

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct Row {
    #[serde(skip_serializing_if = "Option::is_none")]
    asset: Option<String>,
    region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rect: Option<Rect>,
}

pub fn run_inspect(config: &TexCacheConfig, assets: &[String], json: bool) -> Result<()> {
    let paths = ArtifactPaths::new(&config.output.dir, &config.output.name);
    let atlas = Atlas::load(&paths.index).with_context(|| {
        format!(
            "no usable atlas at {} (run `texcache pack` first)",
            paths.index.display()
        )
    })?;

    let rows = if assets.is_empty() {
        list_regions(&atlas)
    } else {
        resolve_assets(&atlas, &config.source.prefix, assets)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let (w, h) = atlas.page().dimensions();
    log!("inspect"; "{} ({}x{}, {} regions)", paths.index.display(), w, h, atlas.len());
    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn list_regions(atlas: &Atlas) -> Vec<Row> {
    atlas
        .region_names()
        .into_iter()
        .filter_map(|name| atlas.find_region(name))
        .map(|region| Row {
            asset: None,
            region: region.name.to_string(),
            rect: Some(region.rect),
        })
        .collect()
}

/// Resolve through a `RegionIndex`, exactly as the cache does.
fn resolve_assets(atlas: &Atlas, prefix: &str, assets: &[String]) -> Vec<Row> {
    let mut index = RegionIndex::new(prefix);
    assets
        .iter()
        .map(|asset| {
            let path = AssetPath::new(asset);
            let handle = index.get(&path, Some(atlas));
            Row {
                asset: Some(path.to_string()),
                region: path.region_name(prefix).to_string(),
                rect: match handle.binding() {
                    Binding::Region { region, .. } => Some(region.rect),
                    Binding::Loading | Binding::Missing => None,
                },
            }
        })
        .collect()
}

fn format_row(row: &Row) -> String {
    let rect = match row.rect {
        Some(r) => format!("{}x{} at ({}, {})", r.w, r.h, r.x, r.y),
        None => "missing".red().to_string(),
    };
    match &row.asset {
        Some(asset) => format!("  {} {} {}  {}", asset, "→".dimmed(), row.region.cyan(), rect),
        None => format!("  {}  {}", row.region.cyan(), rect),
    }
}
