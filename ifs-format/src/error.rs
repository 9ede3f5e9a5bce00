//! Error types for the boundary file formats.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while reading or writing PGM or `.ifs` files.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// A file did not match its expected header, field count, or record
    /// count.
    #[error("invalid file format: {0}")]
    InvalidFileFormat(String),

    /// A geometry or construction error surfaced from `ifs-core`.
    #[error(transparent)]
    Core(#[from] ifs_core::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

/// Convenience alias for fallible file-format operations.
pub type Result<T> = std::result::Result<T, Error>;
