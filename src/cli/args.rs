//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Texture atlas cache: pack an image folder and hot-reload it on change
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: texcache.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "texcache.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Pack the source images into the atlas once
    #[command(visible_alias = "p")]
    Pack {
        /// Repack even if no source image changed
        #[arg(short, long)]
        force: bool,
    },

    /// Watch the source directory and rebuild the atlas on change
    #[command(visible_alias = "w")]
    Watch {
        /// Debounce delay in milliseconds (overrides [timing.debounce_ms])
        #[arg(short, long, value_name = "MS")]
        debounce: Option<u64>,
    },

    /// List atlas regions, or resolve asset paths to regions
    #[command(visible_alias = "i")]
    Inspect {
        /// Asset paths such as `gfx/ui/button.png`. If omitted, lists all regions.
        #[arg(value_name = "ASSET")]
        assets: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}
