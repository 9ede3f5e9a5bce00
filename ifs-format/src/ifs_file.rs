//! `.ifs` (and `.ifs.part` checkpoint) text codec.

use std::fs;
use std::path::Path;

use ifs_core::{Geometry, Transform};

use crate::error::{Error, Result};

/// A parsed `.ifs` (or `.ifs.part`) file: header plus the transform table.
///
/// `.ifs.part` is the exact same format, just permitted to hold fewer than
/// `num_ranges` records; on successful completion of an encode the part
/// file is atomically renamed to the final `.ifs` name rather than
/// rewritten, so a reader never observes a half-written final file.
#[derive(Debug, Clone, PartialEq)]
pub struct IfsFile {
    pub width: usize,
    pub height: usize,
    pub range_size: usize,
    pub domain_size: usize,
    pub whiteval: i64,
    pub table: Vec<Transform>,
}

impl IfsFile {
    /// Recompute geometry from the header and check the table length
    /// matches `num_ranges` exactly — the contract for a *complete* `.ifs`
    /// file, not a `.part` checkpoint.
    pub fn validate_complete(&self) -> Result<()> {
        let geometry = Geometry::new(self.width, self.height, self.range_size, self.domain_size)?;
        if self.table.len() != geometry.num_ranges {
            return Err(Error::InvalidFileFormat(format!(
                "expected {} transform records, found {}",
                geometry.num_ranges,
                self.table.len()
            )));
        }
        Ok(())
    }
}

/// Parse `.ifs`/`.ifs.part` text.
pub fn parse_ifs(contents: &str) -> Result<IfsFile> {
    let mut lines = contents.lines();

    let magic = lines
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("empty .ifs file".into()))?
        .trim();
    if magic != "#IFS" {
        return Err(Error::InvalidFileFormat(format!(
            "expected magic number #IFS, found {magic:?}"
        )));
    }

    let header = lines
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing .ifs header line".into()))?;
    let mut fields = header.split_whitespace();
    let mut next_usize = |name: &str| -> Result<usize> {
        fields
            .next()
            .ok_or_else(|| Error::InvalidFileFormat(format!("missing .ifs header field {name}")))?
            .parse()
            .map_err(|_| Error::InvalidFileFormat(format!("header field {name} is not an integer")))
    };
    let width = next_usize("width")?;
    let height = next_usize("height")?;
    let range_size = next_usize("range_size")?;
    let domain_size = next_usize("domain_size")?;
    let whiteval: i64 = fields
        .next()
        .ok_or_else(|| Error::InvalidFileFormat("missing .ifs header field whiteval".into()))?
        .parse()
        .map_err(|_| Error::InvalidFileFormat("header field whiteval is not an integer".into()))?;

    let mut table = Vec::new();
    for (lineno, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let domain_index: usize = fields
            .next()
            .ok_or_else(|| record_error(lineno, "domain_index"))?
            .parse()
            .map_err(|_| record_error(lineno, "domain_index"))?;
        let isometry: u8 = fields
            .next()
            .ok_or_else(|| record_error(lineno, "isometry"))?
            .parse()
            .map_err(|_| record_error(lineno, "isometry"))?;
        let contrast: f64 = fields
            .next()
            .ok_or_else(|| record_error(lineno, "contrast"))?
            .parse()
            .map_err(|_| record_error(lineno, "contrast"))?;
        let brightness: f64 = fields
            .next()
            .ok_or_else(|| record_error(lineno, "brightness"))?
            .parse()
            .map_err(|_| record_error(lineno, "brightness"))?;
        table.push(Transform {
            domain_index,
            isometry,
            contrast,
            brightness,
        });
    }

    Ok(IfsFile {
        width,
        height,
        range_size,
        domain_size,
        whiteval,
        table,
    })
}

fn record_error(lineno: usize, field: &str) -> Error {
    Error::InvalidFileFormat(format!(
        "malformed transform record on line {} (field {field})",
        lineno + 3
    ))
}

/// Read and parse an `.ifs`/`.ifs.part` file.
pub fn read_ifs(path: impl AsRef<Path>) -> Result<IfsFile> {
    let contents = fs::read_to_string(path)?;
    parse_ifs(&contents)
}

/// Render an `.ifs`/`.ifs.part` file to text, one record per range in
/// range-index order.
pub fn render_ifs(file: &IfsFile) -> String {
    let mut out = String::new();
    out.push_str("#IFS\n");
    out.push_str(&format!(
        "{} {} {} {} {}\n",
        file.width, file.height, file.range_size, file.domain_size, file.whiteval
    ));
    for record in &file.table {
        out.push_str(&format!(
            "{} {} {} {}\n",
            record.domain_index, record.isometry, record.contrast, record.brightness
        ));
    }
    out
}

/// Write an `.ifs`/`.ifs.part` file.
pub fn write_ifs(path: impl AsRef<Path>, file: &IfsFile) -> Result<()> {
    fs::write(path, render_ifs(file))?;
    Ok(())
}

/// Write a checkpoint, then atomically rename it to `final_path`, so a
/// reader never sees a half-written final `.ifs` file.
pub fn finalize_part(part_path: impl AsRef<Path>, final_path: impl AsRef<Path>) -> Result<()> {
    fs::rename(part_path, final_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IfsFile {
        IfsFile {
            width: 4,
            height: 4,
            range_size: 2,
            domain_size: 4,
            whiteval: 255,
            table: vec![
                Transform {
                    domain_index: 0,
                    isometry: 0,
                    contrast: 1.0,
                    brightness: 0.0,
                },
                Transform {
                    domain_index: 0,
                    isometry: 3,
                    contrast: 0.5,
                    brightness: 12.25,
                },
            ],
        }
    }

    #[test]
    fn round_trips_through_text() {
        let file = sample();
        let text = render_ifs(&file);
        let parsed = parse_ifs(&text).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn part_file_may_have_fewer_records_than_num_ranges() {
        let mut file = sample();
        file.table.truncate(1);
        assert!(file.validate_complete().is_err());
        // but parsing itself succeeds, since .part is allowed to be short.
        let text = render_ifs(&file);
        assert!(parse_ifs(&text).is_ok());
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(parse_ifs("#NOT-IFS\n4 4 2 4 255\n").is_err());
    }

    #[test]
    fn finalize_renames_part_to_final() {
        let dir = tempfile::tempdir().unwrap();
        let part = dir.path().join("x.ifs.part");
        let final_path = dir.path().join("x.ifs");
        write_ifs(&part, &sample()).unwrap();
        finalize_part(&part, &final_path).unwrap();
        assert!(!part.exists());
        assert!(final_path.exists());
        let reread = read_ifs(&final_path).unwrap();
        assert_eq!(reread, sample());
    }
}
