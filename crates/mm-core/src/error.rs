use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Two images that must share a grid have different dimensions.
    #[error(
        "dimension mismatch: expected {}x{}, got {}x{}",
        expected.0,
        expected.1,
        actual.0,
        actual.1
    )]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("image has zero width or height")]
    EmptyDimensions,

    #[error("out of bounds")]
    OutOfBounds,

    #[error("invalid stride")]
    InvalidStride,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}
