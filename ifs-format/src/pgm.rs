//! PGM (P2, plain ASCII greyscale) reader and writer.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A decoded PGM image: dimensions, the white value, and row-major pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmImage {
    pub width: usize,
    pub height: usize,
    pub whiteval: i64,
    pub data: Vec<i64>,
}

/// Parse PGM (P2) data from a string.
///
/// Line 1 must be the literal `P2`. Line 2 is a comment and is ignored.
/// Line 3 holds `width height`. Line 4 holds `whiteval`. Every remaining
/// whitespace-separated token (regardless of how it's split across lines)
/// is one pixel value, in row-major order; there must be exactly
/// `width * height` of them.
pub fn parse_pgm(contents: &str) -> Result<PgmImage> {
    let mut lines = contents.lines();

    let magic = lines
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("empty PGM file".into()))?
        .trim();
    if magic != "P2" {
        return Err(Error::InvalidFileFormat(format!(
            "expected magic number P2, found {magic:?}"
        )));
    }

    let _comment = lines
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing PGM comment line".into()))?;

    let dims_line = lines
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing PGM dimensions line".into()))?;
    let mut dims = dims_line.split_whitespace();
    let width: usize = dims
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing PGM width".into()))?
        .parse()
        .map_err(|_| Error::InvalidFileFormat("PGM width is not an integer".into()))?;
    let height: usize = dims
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing PGM height".into()))?
        .parse()
        .map_err(|_| Error::InvalidFileFormat("PGM height is not an integer".into()))?;

    let whiteval_line = lines
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing PGM whiteval line".into()))?;
    let whiteval: i64 = whiteval_line
        .trim()
        .parse()
        .map_err(|_| Error::InvalidFileFormat("PGM whiteval is not an integer".into()))?;

    let rest: String = lines.collect::<Vec<_>>().join(" ");
    let data: Vec<i64> = rest
        .split_whitespace()
        .map(|tok| {
            tok.parse()
                .map_err(|_| Error::InvalidFileFormat(format!("PGM pixel {tok:?} is not an integer")))
        })
        .collect::<Result<_>>()?;

    let expected = width * height;
    if data.len() != expected {
        return Err(Error::InvalidFileFormat(format!(
            "expected {expected} pixels ({width}x{height}), found {}",
            data.len()
        )));
    }

    Ok(PgmImage {
        width,
        height,
        whiteval,
        data,
    })
}

/// Read and parse a PGM file.
pub fn read_pgm(path: impl AsRef<Path>) -> Result<PgmImage> {
    let contents = fs::read_to_string(path)?;
    parse_pgm(&contents)
}

/// Render a PGM image to its textual representation, clipping pixels to
/// `[0, whiteval]` as required on write (intermediate values may stray
/// outside that range; only emission clips them).
pub fn render_pgm(image: &PgmImage) -> String {
    let mut out = String::new();
    out.push_str("P2\n");
    out.push_str("# ifs compressor\n");
    out.push_str(&format!("{} {}\n", image.width, image.height));
    out.push_str(&format!("{}\n", image.whiteval));
    for &v in &image.data {
        let clipped = v.clamp(0, image.whiteval);
        out.push_str(&format!("{clipped}\n"));
    }
    out
}

/// Write a PGM file, clipping pixel values on the way out.
pub fn write_pgm(path: impl AsRef<Path>, image: &PgmImage) -> Result<()> {
    fs::write(path, render_pgm(image))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_pgm() {
        let text = "P2\n# a comment\n2 2\n255\n1 2\n3 4\n";
        let img = parse_pgm(text).unwrap();
        assert_eq!(img.width, 2);
        assert_eq!(img.height, 2);
        assert_eq!(img.whiteval, 255);
        assert_eq!(img.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_wrong_magic() {
        let text = "P5\n# a comment\n2 2\n255\n1 2 3 4\n";
        assert!(parse_pgm(text).is_err());
    }

    #[test]
    fn rejects_pixel_count_mismatch() {
        let text = "P2\n# a comment\n2 2\n255\n1 2 3\n";
        assert!(parse_pgm(text).is_err());
    }

    #[test]
    fn write_clips_out_of_range_values() {
        let img = PgmImage {
            width: 2,
            height: 1,
            whiteval: 255,
            data: vec![-5, 300],
        };
        let text = render_pgm(&img);
        assert_eq!(text, "P2\n# ifs compressor\n2 1\n255\n0\n255\n");
    }

    #[test]
    fn round_trips_through_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.pgm");
        let img = PgmImage {
            width: 2,
            height: 2,
            whiteval: 255,
            data: vec![0, 64, 128, 255],
        };
        write_pgm(&path, &img).unwrap();
        let read_back = read_pgm(&path).unwrap();
        assert_eq!(read_back, img);
    }
}
