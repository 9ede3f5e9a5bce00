//! Iterated decoding: apply stored transforms until the image reaches a
//! fixed point of the collage operator.

use rand::Rng;

use crate::encoder::Transform;
use crate::error::{Error, Result};
use crate::image::Image;

/// Mid-grey seed value used to start decoding before any transform has run.
pub const SEED_GREY: i64 = 128;

/// Scale a transform table and the geometry it was built from by a zoom
/// factor `z > 1`. Isometry, contrast, and brightness are left unchanged;
/// only positions and sizes scale, exploiting the resolution independence
/// of the IFS.
fn zoomed(width: usize, height: usize, range_size: usize, domain_size: usize, table: &[Transform], z: usize) -> (usize, usize, usize, usize, Vec<Transform>) {
    let scaled_table = table
        .iter()
        .map(|t| Transform {
            domain_index: t.domain_index * z,
            ..*t
        })
        .collect();
    (width * z, height * z, range_size * z, domain_size * z, scaled_table)
}

/// Build the flat mid-grey seed image for the given dimensions/geometry.
pub fn seed_image(width: usize, height: usize, whiteval: i64, range_size: usize, domain_size: usize) -> Result<Image> {
    let data = vec![SEED_GREY; width * height];
    Image::new(width, whiteval, range_size, domain_size, data)
}

/// Apply one stored transform: extract the domain fresh (bypassing the
/// cache), shrink it to range size, apply the isometry, then the affine
/// grey-level adjustment, then write it at the range's position.
///
/// Order matters: contrast and brightness are applied after resize and
/// isometry, since each adjustment rounds independently and swapping the
/// order changes the rounding error per pixel.
pub fn apply_ifs(image: &mut Image, range_index: usize, transform: &Transform) -> Result<()> {
    let geometry = image.geometry();
    let domain = image.get_domain_by_index(transform.domain_index, true)?;
    let shrunk = domain.resize(geometry.range_size)?;
    let transformed = shrunk.isometry(transform.isometry);
    let adjusted = transformed
        .adjust_contrast(transform.contrast)
        .adjust_brightness(transform.brightness);
    image.put_range(&adjusted, range_index)
}

/// Run every range's transform once, in index order.
fn full_sweep(image: &mut Image, table: &[Transform]) -> Result<()> {
    for (r, transform) in table.iter().enumerate() {
        apply_ifs(image, r, transform)?;
    }
    Ok(())
}

/// Optional decoding parameters.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Total random `apply_ifs` applications to attempt; defaults to
    /// `64 * num_ranges` when `None`.
    pub iterations: Option<usize>,
    /// Zoom factor; `1` decodes at native resolution.
    pub zoom: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            iterations: None,
            zoom: 1,
        }
    }
}

/// Decode a transform table back into a pixel grid.
///
/// Starting from a flat mid-grey seed, ranges are applied in random order
/// with periodic full sweeps to guarantee every range is eventually
/// touched, and periodic snapshot comparisons to detect convergence: once
/// two snapshots straddling a verification sweep are byte-identical, the
/// image has reached (or is indistinguishable from) the IFS's fixed point.
///
/// `on_apply(i, image)` is called after every individual `apply_ifs`
/// (random or swept), letting a caller dump intermediate frames without
/// this module knowing anything about file formats.
pub fn decode(
    width: usize,
    height: usize,
    whiteval: i64,
    range_size: usize,
    domain_size: usize,
    table: &[Transform],
    options: DecodeOptions,
    mut on_apply: impl FnMut(usize, &Image),
) -> Result<Image> {
    let (width, height, range_size, domain_size, table) = if options.zoom > 1 {
        zoomed(width, height, range_size, domain_size, table, options.zoom)
    } else {
        (width, height, range_size, domain_size, table.to_vec())
    };

    let mut image = seed_image(width, height, whiteval, range_size, domain_size)?;
    let geometry = image.geometry();
    if table.len() != geometry.num_ranges {
        return Err(Error::BadTransformTable {
            expected: geometry.num_ranges,
            actual: table.len(),
        });
    }

    let target_iters = options.iterations.unwrap_or_else(|| {
        let ranges_across = (width / range_size).max(1);
        64 * ranges_across * ranges_across
    });
    let test_interval = (geometry.num_ranges / 4).max(1);
    let full_sweep_interval = geometry.num_ranges.max(1);

    let mut prev_snapshot = image.data().to_vec();
    let mut applied: usize = 0;
    let mut rng = rand::thread_rng();

    for i in 0..target_iters {
        let r = rng.gen_range(0..table.len());
        apply_ifs(&mut image, r, &table[r])?;
        on_apply(applied, &image);
        applied += 1;

        if i > 0 && i % full_sweep_interval == 0 {
            for (r2, transform) in table.iter().enumerate() {
                apply_ifs(&mut image, r2, transform)?;
                on_apply(applied, &image);
                applied += 1;
            }
        }

        if (applied + 1) % test_interval == 0 {
            if image.data() == prev_snapshot.as_slice() {
                full_sweep(&mut image, &table)?;
                applied += table.len();
                if image.data() == prev_snapshot.as_slice() {
                    return Ok(image);
                }
            }
            prev_snapshot = image.data().to_vec();
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncodeOutcome};

    #[test]
    fn checkerboard_round_trips_byte_identical() {
        // 8x8 checkerboard of {0, 255} in 2x2 squares, R=2, D=4. Every range
        // is a uniform 2x2 square, so the closed-form fit is exact from any
        // domain (contrast 0, brightness = the square's value); this checks
        // encode/decode round-trip on a non-gradient image, not isometry
        // selection — every range here fits domain 0 under isometry 0.
        let mut data = vec![0i64; 64];
        for y in 0..8 {
            for x in 0..8 {
                data[y * 8 + x] = if (x / 2 + y / 2) % 2 == 0 { 0 } else { 255 };
            }
        }
        let mut image = Image::new(8, 255, 2, 4, data.clone()).unwrap();
        let table = match encode(&mut image, Vec::new(), None, |_| {}).unwrap() {
            EncodeOutcome::Complete(t) => t,
            EncodeOutcome::Cancelled { .. } => panic!("encoding should not cancel"),
        };

        let decoded = decode(8, 8, 255, 2, 4, &table, DecodeOptions::default(), |_, _| {}).unwrap();
        assert_eq!(decoded.data(), data.as_slice());
    }

    fn identity_table(num_ranges: usize, domain_index: usize) -> Vec<Transform> {
        vec![
            Transform {
                domain_index,
                isometry: 0,
                contrast: 1.0,
                brightness: 0.0,
            };
            num_ranges
        ]
    }

    #[test]
    fn constant_ifs_converges_to_constant_image() {
        // every range copies domain 0 unchanged, contrast=1, brightness=0 —
        // a 4x4, R=2, D=4 table of 4 identical transforms whose domain
        // happens to hold the seed value, so the image is already a fixed
        // point from iteration zero.
        let table = identity_table(4, 0);
        let image = decode(4, 4, 255, 2, 4, &table, DecodeOptions::default(), |_, _| {}).unwrap();
        assert!(image.data().iter().all(|&p| p == SEED_GREY));
    }

    #[test]
    fn decoder_rejects_mismatched_table_length() {
        let table = identity_table(3, 0);
        let result = decode(4, 4, 255, 2, 4, &table, DecodeOptions::default(), |_, _| {});
        assert!(result.is_err());
    }

    #[test]
    fn zoom_scales_dimensions_and_domain_index() {
        let table = identity_table(4, 0);
        let options = DecodeOptions {
            iterations: Some(4),
            zoom: 2,
        };
        let image = decode(4, 4, 255, 2, 4, &table, options, |_, _| {}).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 8);
    }

    #[test]
    fn on_apply_callback_runs_once_per_application() {
        let table = identity_table(4, 0);
        let mut calls = 0usize;
        let options = DecodeOptions {
            iterations: Some(10),
            zoom: 1,
        };
        decode(4, 4, 255, 2, 4, &table, options, |_, _| calls += 1).unwrap();
        assert!(calls >= 10);
    }
}
