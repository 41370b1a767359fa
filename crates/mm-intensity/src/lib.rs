//! Intensity transforms for 8-bit microscopy images.
//!
//! Every transform precomputes a 256-entry [`Lut256`] once and then remaps
//! pixels in place. RGB images are `Image<[u8; 3]>` in red, green, blue
//! order.

mod fluor;
mod lut;

pub use fluor::{ChannelFilter, FluorescenceConfig, PseudoColor, fluorescence_composite};
pub use lut::{Lut256, contrast_stretch_rgb, gamma_correct_rgb, gamma_correct_u8};
