//! Single-pass mask transforms.
//!
//! Masks follow the `mm-core` convention: `0` is background, nonzero is
//! foreground. Neither transform iterates: each visits every pixel once.

mod border;
mod resize;

pub use border::{BORDER_VALUE, BorderStats, highlight_mask_border};
pub use resize::resize_mask_nearest;
