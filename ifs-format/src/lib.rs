//! Boundary file formats for the IFS image compressor: PGM (P2) images and
//! the `.ifs`/`.ifs.part` transform-table codec.

pub mod error;
pub mod ifs_file;
pub mod pgm;

pub use error::{Error, Result};
pub use ifs_file::{finalize_part, parse_ifs, read_ifs, render_ifs, write_ifs, IfsFile};
pub use pgm::{parse_pgm, read_pgm, render_pgm, write_pgm, PgmImage};
