use std::path::PathBuf;

use clap::Parser;

/// Fractal (IFS) image compressor/decompressor: encode a PGM into an
/// `.ifs` transform table, then decode it back into a PGM.
#[derive(Debug, Parser)]
#[command(name = "ifs", about = "Fractal image compressor built on partitioned block matching.")]
pub struct Opt {
    /// PGM (P2) file to encode, resolved under `input/`.
    #[arg(short, long, value_parser)]
    pub file: PathBuf,

    /// Range block side length; ranges tile the image without overlap.
    #[arg(short, long, default_value_t = 4)]
    pub rangesize: usize,

    /// Domain block side length; domains slide densely and overlap.
    #[arg(short, long, default_value_t = 8)]
    pub domainsize: usize,

    /// Number of random `apply_ifs` steps during decoding. Defaults to
    /// `64 * (width / rangesize)^2` when omitted.
    #[arg(short, long, value_parser)]
    pub iterations: Option<usize>,

    /// Dump an intermediate PGM every K apply-IFS steps during decoding.
    /// `0` disables intermediate dumps.
    #[arg(short = 'p', long = "print-intervals", default_value_t = 0)]
    pub print_intervals: usize,

    /// Zoom factor for decoding; scales width, height, and block sizes.
    #[arg(short, long, default_value_t = 1)]
    pub zoom: usize,

    /// Verbosity: 0 = warnings/errors only, 1 = info, 2 = debug.
    #[arg(short, long, default_value_t = 0)]
    pub verbose: u8,
}

impl Opt {
    pub fn log_filter(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
