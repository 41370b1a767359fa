//! Foundational primitives for labeled-mask morphometry.
//!
//! ## Images and Stride
//! Images are row-major. `stride` is the distance, in elements, between
//! adjacent row starts and may be greater than `width`, which allows borrowed
//! views over padded buffers.
//!
//! ## Masks
//! A mask is an `u8` image where `0` is background and any nonzero value is a
//! foreground label. Operations treat every nonzero label alike for
//! connectivity and carry the label value along when they copy it.
//!
//! ## Connectivity
//! [`Connectivity::C8`] includes diagonal neighbors, [`Connectivity::C4`]
//! only axis-aligned ones. Neighbor lookups are clipped to the grid and never
//! wrap from one row to the next.

mod connectivity;
mod error;
mod image;

pub use connectivity::{Connectivity, neighbor};
pub use error::Error;
pub use image::{Image, ImageView, ImageViewMut};
