//! Command-line driver: read a PGM, encode it to an `.ifs` transform table
//! (or reuse/resume an existing one), then decode the table back into a
//! PGM, optionally dumping intermediate frames along the way.

mod cli;
mod paths;

use std::fs;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use cli::Opt;
use ifs_core::{decode, encode, DecodeOptions, EncodeOutcome, Transform};
use ifs_format::{finalize_part, read_ifs, read_pgm, write_ifs, write_pgm, IfsFile, PgmImage};
use paths::Paths;

fn main() -> ExitCode {
    let opt = Opt::parse();
    env_logger::Builder::new().filter_level(opt.log_filter()).init();

    match run(&opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(opt: &Opt) -> ifs_format::Result<()> {
    let paths = paths::derive(opt);
    let source = read_pgm(&paths.input)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        log::warn!("interrupt received, finishing the current range and checkpointing");
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        log::warn!("failed to install interrupt handler: {err}");
    }

    let table = if let Some(existing) = load_complete(&paths)? {
        log::info!("reusing existing transform table at {}", paths.encoded.display());
        existing.table
    } else {
        match encode_with_checkpoints(opt, &paths, &source, &interrupted)? {
            Some(table) => table,
            None => return Ok(()),
        }
    };

    decode_and_write(opt, &paths, &source, table)?;
    Ok(())
}

/// `.ifs` exists and is complete: nothing to encode.
fn load_complete(paths: &Paths) -> ifs_format::Result<Option<IfsFile>> {
    if !paths.encoded.exists() {
        return Ok(None);
    }
    let file = read_ifs(&paths.encoded)?;
    file.validate_complete()?;
    Ok(Some(file))
}

/// Resume from a `.ifs.part` checkpoint if one exists, otherwise start
/// fresh; write the checkpoint back to disk after every completed range,
/// and finalize it to the real `.ifs` name once the table is complete.
///
/// Returns `None` if interrupted before finishing, since there is then no
/// complete table to decode — the checkpoint is already on disk for a
/// later resume.
fn encode_with_checkpoints(
    opt: &Opt,
    paths: &Paths,
    source: &PgmImage,
    interrupted: &Arc<AtomicBool>,
) -> ifs_format::Result<Option<Vec<Transform>>> {
    let resume_table = if paths.part.exists() {
        let part = read_ifs(&paths.part)?;
        log::info!("resuming encode from checkpoint: {} ranges already done", part.table.len());
        part.table
    } else {
        Vec::new()
    };

    let mut image = ifs_core::Image::new(
        source.width,
        source.whiteval,
        opt.rangesize,
        opt.domainsize,
        source.data.clone(),
    )?;

    if let Some(dir) = paths.part.parent() {
        fs::create_dir_all(dir)?;
    }

    let header = IfsFile {
        width: source.width,
        height: source.height,
        range_size: opt.rangesize,
        domain_size: opt.domainsize,
        whiteval: source.whiteval,
        table: Vec::new(),
    };

    let outcome = encode(&mut image, resume_table, Some(interrupted.as_ref()), |table| {
        let mut checkpoint = header.clone();
        checkpoint.table = table.to_vec();
        if let Err(err) = write_ifs(&paths.part, &checkpoint) {
            log::warn!("failed to write checkpoint: {err}");
        }
    })?;

    let table = match outcome {
        EncodeOutcome::Complete(table) => table,
        EncodeOutcome::Cancelled { resume_from, .. } => {
            log::warn!("encoding stopped after range {resume_from}; checkpoint left at {}", paths.part.display());
            return Ok(None);
        }
    };

    let mut final_file = header;
    final_file.table = table.clone();
    write_ifs(&paths.part, &final_file)?;
    if let Some(dir) = paths.encoded.parent() {
        fs::create_dir_all(dir)?;
    }
    finalize_part(&paths.part, &paths.encoded)?;
    Ok(Some(table))
}

fn decode_and_write(opt: &Opt, paths: &Paths, source: &PgmImage, table: Vec<Transform>) -> ifs_format::Result<()> {
    if opt.print_intervals > 0 {
        fs::create_dir_all(&paths.frames_dir)?;
    }

    let options = DecodeOptions {
        iterations: opt.iterations,
        zoom: opt.zoom,
    };

    let frames_dir = paths.frames_dir.clone();
    let print_intervals = opt.print_intervals;
    let whiteval = source.whiteval;
    let decoded = decode(
        source.width,
        source.height,
        source.whiteval,
        opt.rangesize,
        opt.domainsize,
        &table,
        options,
        |i, image| {
            if print_intervals == 0 || i % print_intervals != 0 {
                return;
            }
            let frame = PgmImage {
                width: image.width(),
                height: image.height(),
                whiteval,
                data: image.data().to_vec(),
            };
            let frame_path = frames_dir.join(format!("frame_{i:06}.pgm"));
            if let Err(err) = write_pgm(&frame_path, &frame) {
                log::warn!("failed to write intermediate frame {i}: {err}");
            }
        },
    )?;

    let result = PgmImage {
        width: decoded.width(),
        height: decoded.height(),
        whiteval,
        data: decoded.data().to_vec(),
    };
    if let Some(dir) = paths.output.parent() {
        fs::create_dir_all(dir)?;
    }
    write_pgm(&paths.output, &result)?;
    log::info!("wrote decoded image to {}", paths.output.display());
    Ok(())
}
