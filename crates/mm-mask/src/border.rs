use mm_core::{Connectivity, ImageViewMut, neighbor};

/// Value written into border cells by [`highlight_mask_border`].
pub const BORDER_VALUE: u8 = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorderStats {
    /// Foreground cells.
    pub area: usize,
    /// Foreground cells with at least one background 8-neighbor.
    pub border_len: usize,
}

/// Marks the border of a mask in place and counts area and border cells.
///
/// A foreground cell is a border cell when one of its in-grid 8-neighbors is
/// background. The grid edge does not count as background, so a mask that
/// fills the whole grid has no border.
pub fn highlight_mask_border(mask: &mut ImageViewMut<'_, u8>) -> BorderStats {
    let (width, height) = mask.dims();
    let mut stats = BorderStats::default();

    for y in 0..height {
        for x in 0..width {
            if mask.row(y)[x] == 0 {
                continue;
            }
            stats.area += 1;

            // Marked cells stay nonzero, so later cells still see them as
            // foreground.
            let on_border = Connectivity::C8.offsets().iter().any(|&(dx, dy)| {
                neighbor(x, y, dx, dy, width, height)
                    .is_some_and(|(nx, ny)| mask.row(ny)[nx] == 0)
            });
            if on_border {
                mask.row_mut(y)[x] = BORDER_VALUE;
                stats.border_len += 1;
            }
        }
    }

    stats
}
