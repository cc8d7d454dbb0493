//! Core types - pure abstractions shared across the codebase.

mod asset_path;
mod state;

pub use asset_path::{AssetPath, has_image_extension};
pub use state::{is_shutdown, set_watching, setup_shutdown_handler};
