//! On-disk atlas index (`<name>.atlas`, JSON).
//!
//! ```json
//! {
//!   "image": "cache.png",
//!   "width": 256,
//!   "height": 128,
//!   "regions": { "player": { "x": 2, "y": 2, "w": 32, "h": 48 } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pixel rectangle inside the atlas page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the rectangle lies entirely inside a `width` x `height` page.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.w) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.h) <= u64::from(height)
    }
}

/// Serialized form of an atlas index. Regions are kept sorted so repacking
/// identical inputs produces byte-identical files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasFile {
    /// Page image file name, relative to the index file.
    pub image: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub regions: BTreeMap<String, Rect>,
}
