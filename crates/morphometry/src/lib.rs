//! Umbrella crate for the `morphometry` workspace.
//!
//! Re-exports the mask, morphology and intensity crates so a front end can
//! depend on a single crate.

pub use mm_core::*;
pub use mm_intensity::*;
pub use mm_mask::*;
pub use mm_morph::*;
