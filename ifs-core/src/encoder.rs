//! For every range, search all domains for the best-fit transform.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::block::Block;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::solver::find_best_transform;

/// One stored transform: which domain, which isometry, and the affine
/// grey-level parameters that best approximate a range from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub domain_index: usize,
    pub isometry: u8,
    pub contrast: f64,
    pub brightness: f64,
}

/// The outcome of an encoding pass: either the completed transform table,
/// or a partial table plus the index of the first unencoded range, left
/// behind because the caller's cancellation flag was observed between
/// ranges.
pub enum EncodeOutcome {
    Complete(Vec<Transform>),
    Cancelled { table: Vec<Transform>, resume_from: usize },
}

/// Encode every range of `image`, resuming from `resume_table` if given.
///
/// Each domain is shrunk to range size at most once and the shrunk form is
/// reused across every range (the dominant cost in the whole pipeline).
/// Domain iteration within a range stops early at the first exact match
/// (`fit <= 0`); ties between domains are broken by the lowest domain
/// index, since the running best is only replaced on strict improvement.
///
/// `cancel` is polled once per range; if set, the partial table and resume
/// point are returned instead of panicking or discarding work, so a caller
/// can checkpoint and later resume from exactly where it left off.
///
/// `on_range_done(table)` runs after every range is appended to the table,
/// letting a caller write a `.ifs.part` checkpoint at whatever cadence it
/// likes without this module knowing anything about files.
pub fn encode(
    image: &mut Image,
    resume_table: Vec<Transform>,
    cancel: Option<&AtomicBool>,
    mut on_range_done: impl FnMut(&[Transform]),
) -> Result<EncodeOutcome> {
    let geometry = image.geometry();
    let resume_from = resume_table.len();
    if resume_from > geometry.num_ranges {
        return Err(Error::BadTransformTable {
            expected: geometry.num_ranges,
            actual: resume_from,
        });
    }

    let mut table = resume_table;
    let mut resized_domains: Vec<Option<Block>> = vec![None; geometry.num_domains];

    for r in resume_from..geometry.num_ranges {
        if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
            return Ok(EncodeOutcome::Cancelled {
                table,
                resume_from: r,
            });
        }

        let range = image.get_range_by_index(r)?;
        let mut best: Option<(usize, crate::solver::Fit)> = None;

        for d in 0..geometry.num_domains {
            if resized_domains[d].is_none() {
                let domain = image.get_domain_by_index(d, false)?;
                resized_domains[d] = Some(domain.resize(geometry.range_size)?);
            }
            let shrunk = resized_domains[d].as_ref().expect("just populated above");
            let fit = find_best_transform(&range, shrunk)?;

            let improves = best.map_or(true, |(_, b)| fit.error < b.error);
            if improves {
                best = Some((d, fit));
            }
            if fit.error <= 0 {
                break;
            }
        }

        let (domain_index, fit) = best.expect("num_domains is always >= 1 for a valid geometry");
        table.push(Transform {
            domain_index,
            isometry: fit.isometry,
            contrast: fit.contrast,
            brightness: fit.brightness,
        });

        log::trace!(
            "range {r}: domain={domain_index} isometry={} contrast={:.6} brightness={:.6} error={}",
            fit.isometry,
            fit.contrast,
            fit.brightness,
            fit.error
        );

        let completed = r + 1 - resume_from;
        let total = geometry.num_ranges - resume_from;
        if total > 0 && completed * 20 / total != (completed - 1) * 20 / total {
            log::info!(
                "encoding: {}/{} ranges ({}%)",
                completed,
                total,
                completed * 100 / total
            );
        }

        on_range_done(&table);
    }

    Ok(EncodeOutcome::Complete(table))
}
