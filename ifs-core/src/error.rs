//! Error types for the IFS core.

use thiserror::Error;

/// Errors produced by block, image, and codec arithmetic.
///
/// Every variant carries enough context (sizes, indices) to diagnose the
/// failure without re-running the operation under a debugger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Image data length is not a multiple of the claimed width.
    #[error("malformed image: {len} pixels is not a multiple of width {width}")]
    MalformedImage { width: usize, len: usize },

    /// Range size does not divide the image evenly, or exceeds it.
    #[error(
        "bad range size {range_size}: must divide both width {width} and height {height}, and be no larger than either"
    )]
    BadRangeSize {
        range_size: usize,
        width: usize,
        height: usize,
    },

    /// Domain size exceeds the image, or is smaller than the range size.
    #[error(
        "bad domain size {domain_size}: must be at least range size {range_size} and no larger than {width}x{height}"
    )]
    BadDomainSize {
        domain_size: usize,
        range_size: usize,
        width: usize,
        height: usize,
    },

    /// A square submatrix extraction or insertion fell outside the image.
    #[error(
        "square of size {size} at ({x}, {y}) is out of bounds for a {width}x{height} image"
    )]
    OutOfArray {
        x: i64,
        y: i64,
        size: usize,
        width: usize,
        height: usize,
    },

    /// An index into the range or domain table was out of its valid span.
    #[error("index {index} is out of range (0..{bound})")]
    IndexOutOfBounds { index: usize, bound: usize },

    /// A pixel position had no defined value (should be unreachable).
    #[error("encountered an undefined pixel value")]
    NullValue,

    /// Block construction was given a non-square or size-mismatched buffer.
    #[error("malformed block: expected {expected} pixels for a {side}x{side} block, got {actual}")]
    MalformedBlock {
        side: usize,
        expected: usize,
        actual: usize,
    },

    /// Two blocks of different shape were compared or combined.
    #[error("cannot compare blocks of size {a}x{a} and {b}x{b}")]
    BadComparison { a: usize, b: usize },

    /// A resize was requested between sizes with no supported ratio.
    #[error("cannot resize a block of size {old} to size {new}: unsupported ratio")]
    InvalidSize { old: usize, new: usize },

    /// A transform table did not have one record per range.
    #[error("transform table has {actual} records, expected {expected} (one per range)")]
    BadTransformTable { expected: usize, actual: usize },
}

/// Convenience alias for fallible IFS core operations.
pub type Result<T> = std::result::Result<T, Error>;
