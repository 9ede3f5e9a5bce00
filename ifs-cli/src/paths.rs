use std::path::{Path, PathBuf};

use crate::cli::Opt;

/// All filesystem paths derived from the CLI arguments, per the naming
/// rules in the file-format boundary contract.
pub struct Paths {
    /// Where the source PGM is read from (`input/<file>`).
    pub input: PathBuf,
    /// Where the final `.ifs` transform table lives.
    pub encoded: PathBuf,
    /// The in-progress checkpoint, renamed to `encoded` on completion.
    pub part: PathBuf,
    /// Where the decoded PGM is written.
    pub output: PathBuf,
    /// Directory intermediate frames are dumped into, when requested.
    pub frames_dir: PathBuf,
}

fn stem_of(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string_lossy().into_owned())
}

pub fn derive(opt: &Opt) -> Paths {
    let stem = stem_of(&opt.file);
    let suffix = format!("_r{}_d{}", opt.rangesize, opt.domainsize);

    let input = Path::new("input").join(&opt.file);
    let encoded = Path::new("encoded_files").join(format!("{stem}{suffix}.ifs"));
    let part = Path::new("encoded_files").join(format!("{stem}{suffix}.ifs.part"));

    let zoom_suffix = if opt.zoom != 1 {
        format!("_z{}", opt.zoom)
    } else {
        String::new()
    };
    let output_name = format!("{stem}{suffix}{zoom_suffix}.pgm");
    let output = Path::new("output").join(&output_name);
    let frames_dir = Path::new("output").join(format!("{stem}{suffix}{zoom_suffix}"));

    Paths {
        input,
        encoded,
        part,
        output,
        frames_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(file: &str, r: usize, d: usize, zoom: usize) -> Opt {
        Opt {
            file: PathBuf::from(file),
            rangesize: r,
            domainsize: d,
            iterations: None,
            print_intervals: 0,
            zoom,
            verbose: 0,
        }
    }

    #[test]
    fn derives_expected_paths_without_zoom() {
        let o = opt("lenna.pgm", 4, 8, 1);
        let p = derive(&o);
        assert_eq!(p.input, PathBuf::from("input/lenna.pgm"));
        assert_eq!(p.encoded, PathBuf::from("encoded_files/lenna_r4_d8.ifs"));
        assert_eq!(p.output, PathBuf::from("output/lenna_r4_d8.pgm"));
    }

    #[test]
    fn zoom_adds_a_suffix_to_the_output_name_only() {
        let o = opt("lenna.pgm", 4, 8, 2);
        let p = derive(&o);
        assert_eq!(p.encoded, PathBuf::from("encoded_files/lenna_r4_d8.ifs"));
        assert_eq!(p.output, PathBuf::from("output/lenna_r4_d8_z2.pgm"));
    }
}
