//! Morphological separation between labeled masks.
//!
//! [`DilationDistance`] dilates a growing mask one ring per round until it
//! touches a fixed target mask and reports the round count. Under
//! [`Connectivity::C8`](mm_core::Connectivity::C8) this is a chessboard-like
//! separation, not a Euclidean or geodesic distance:
//! - masks that overlap or neighbor each other are at distance 0,
//! - two single pixels at chessboard distance `d >= 2` are at distance `d`.
//!
//! Rounds are synchronous. Growth that the raster scan would otherwise see
//! again in the same round is held in a pending buffer and committed at the
//! end of the round, so round `k` is exactly the `k`-fold dilation of the
//! seed, whatever the scan order.
//!
//! [`dilate_binary_u8`] is the single-step binary dilation the rounds are
//! equivalent to.

mod dilate;
mod distance;

pub use dilate::dilate_binary_u8;
pub use distance::{
    DilationDistance, DistanceConfig, DistanceReport, Termination, distance_by_dilation,
};
