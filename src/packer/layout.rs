//! Shelf placement.
//!
//! Images are sorted tallest-first and laid out left to right in rows
//! ("shelves"); a new shelf starts when the next image would exceed the page
//! width. Good enough for editor-sized sprite sets, not an optimal packer.

use super::PackError;
use crate::atlas::Rect;

/// Result of placing a set of images on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Layout {
    pub(super) width: u32,
    pub(super) height: u32,
    /// One rectangle per input, in input order.
    pub(super) placements: Vec<Rect>,
}

/// Place `sizes` (named for error messages) on a page at most `max_width` wide.
pub(super) fn shelf_layout(
    sizes: &[(&str, u32, u32)],
    padding: u32,
    max_width: u32,
) -> Result<Layout, PackError> {
    for &(name, w, _) in sizes {
        if u64::from(w) + 2 * u64::from(padding) > u64::from(max_width) {
            return Err(PackError::TooWide {
                name: name.to_string(),
                width: w,
                max_width,
            });
        }
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // Tallest first; ties keep input (name) order for deterministic output
    order.sort_by(|&a, &b| sizes[b].2.cmp(&sizes[a].2).then(a.cmp(&b)));

    let mut placements = vec![Rect::new(0, 0, 0, 0); sizes.len()];
    let (mut x, mut y) = (padding, padding);
    let mut shelf_height = 0;
    let mut used_width = 0;

    for index in order {
        let (_, w, h) = sizes[index];
        if x > padding && x + w + padding > max_width {
            y += shelf_height + padding;
            x = padding;
            shelf_height = 0;
        }
        placements[index] = Rect::new(x, y, w, h);
        x += w + padding;
        shelf_height = shelf_height.max(h);
        used_width = used_width.max(x);
    }

    Ok(Layout {
        width: used_width.max(1),
        height: (y + shelf_height + padding).max(1),
        placements,
    })
}
