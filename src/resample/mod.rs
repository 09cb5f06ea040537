//! Per-tile ID matte resampling
//!
//! For every destination pixel the resampler scans the sub-pixel samples under
//! the filter footprint, weights each one with the windowed Gaussian from
//! [`crate::kernel`], and accumulates coverage per identifier. Only samples in
//! the pixel's opacity window contribute coverage; the wider scan range only
//! feeds the Gaussian norm.
//!
//! # Output encodings
//! - **rank 0**: `[0, random_a, random_b, coverage]` per pixel, where the random
//!   pair is the identifier's stable random colour. Accumulated weights are
//!   written as-is, without dividing by the Gaussian norm.
//! - **rank N > 0**: ranked `(identifier, coverage / norm)` pairs starting at the
//!   Nth strongest identifier, one pair per two channels. Slots with no
//!   remaining identifier are left untouched, so callers pre-zero the buffer.

mod accumulator;

#[cfg(test)]
mod tests_basic;
#[cfg(test)]
mod tests_scenarios;

pub use accumulator::{CoverageAccumulator, RankedEntry};

use log::{debug, warn};

use crate::buffer::{SampleBuffer, TileGeometry};
use crate::error::FilterError;
use crate::hash::random_color_pair;
use crate::kernel::{gaussian_filter, KERNEL_SCALE};
use crate::options::HashSource;
use crate::params::{Axis, FilterParameters, SpecialChannel};
use crate::pixel::Pixel4;

/// Gaussian norms at or below this are treated as degenerate (no division)
pub const MIN_GAUSSIAN_NORM: f32 = 1e-8;

/// Minimum channels per sample: the identifier slots live at offsets 1 and 2
pub const MIN_VECTOR_SIZE: usize = 4;

/// Summary of one resampled tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStats {
    /// Destination pixels written
    pub pixels: usize,
    /// Pixels whose Gaussian norm was too small to normalize by
    pub degenerate_pixels: usize,
}

impl TileStats {
    pub fn merge(self, other: TileStats) -> TileStats {
        TileStats {
            pixels: self.pixels + other.pixels,
            degenerate_pixels: self.degenerate_pixels + other.degenerate_pixels,
        }
    }
}

/// Where each sample's identifier is read from
enum IdSource<'a> {
    /// Channel offset inside the sample vector
    Channel { data: &'a [f32], vector_size: usize, offset: usize },
    /// Parallel per-sample array from the host
    Special(&'a [f32]),
}

impl<'a> IdSource<'a> {
    fn resolve(params: &FilterParameters, source: &SampleBuffer<'a>, samples: usize) -> Result<IdSource<'a>, FilterError> {
        let id_type = params.options.id_type;
        match params.options.hash_source {
            HashSource::Crypto => Ok(IdSource::Channel {
                data: source.data,
                vector_size: source.vector_size,
                offset: id_type.hash_channel(),
            }),
            HashSource::Mantra => {
                let channel = if id_type.uses_object_slot() {
                    SpecialChannel::ObjectId
                } else {
                    SpecialChannel::MaterialId
                };
                let ids = source
                    .special(channel)
                    .ok_or(FilterError::MissingSpecialChannel(channel))?;
                if ids.len() != samples {
                    return Err(FilterError::SpecialChannelSize {
                        channel,
                        expected: samples,
                        actual: ids.len(),
                    });
                }
                Ok(IdSource::Special(ids))
            }
        }
    }

    #[inline(always)]
    fn read(&self, sample_idx: usize) -> f32 {
        match self {
            IdSource::Channel { data, vector_size, offset } => data[sample_idx * vector_size + offset],
            IdSource::Special(ids) => ids[sample_idx],
        }
    }
}

/// Check buffer sizes and that every scan window lies inside the source
fn validate(
    params: &FilterParameters,
    destination: &[f32],
    source: &SampleBuffer<'_>,
    geometry: &TileGeometry,
) -> Result<(), FilterError> {
    let vs = source.vector_size;
    if vs < MIN_VECTOR_SIZE {
        return Err(FilterError::VectorSizeTooSmall(vs));
    }
    if params.samples_per_pixel_x == 0 || params.samples_per_pixel_y == 0 {
        return Err(FilterError::InvalidSamplesPerPixel {
            x: params.samples_per_pixel_x,
            y: params.samples_per_pixel_y,
        });
    }

    let expected_src = geometry.source_samples() * vs;
    if source.data.len() != expected_src {
        return Err(FilterError::SourceSize {
            expected: expected_src,
            actual: source.data.len(),
        });
    }
    let expected_dst = geometry.dest_len(vs);
    if destination.len() != expected_dst {
        return Err(FilterError::DestinationSize {
            expected: expected_dst,
            actual: destination.len(),
        });
    }

    if geometry.dest_pixels() == 0 {
        return Ok(());
    }

    // Windows grow monotonically with the pixel index, so checking the first
    // and last pixel of each axis covers the whole tile.
    for (axis, offset, count, extent) in [
        (Axis::X, geometry.dest_offset_x, geometry.dest_width, geometry.source_width),
        (Axis::Y, geometry.dest_offset_y, geometry.dest_height, geometry.source_height),
    ] {
        let ap = params.axis(axis);
        let first = ap.window(offset, 0).scan_first;
        let last = ap.window(offset, count as i64 - 1).scan_last;
        if first < 0 || last >= extent as i64 {
            return Err(FilterError::WindowOutOfBounds {
                axis: axis.name(),
                first,
                last,
                extent,
            });
        }
    }

    Ok(())
}

/// Resample one tile of sub-pixel samples into ID matte channels.
///
/// `destination` must hold exactly `dest_width * dest_height * vector_size`
/// floats. In rank mode unfilled pair slots keep their previous contents.
pub fn resample_tile(
    params: &FilterParameters,
    destination: &mut [f32],
    source: &SampleBuffer<'_>,
    geometry: &TileGeometry,
) -> Result<TileStats, FilterError> {
    validate(params, destination, source, geometry)?;
    let ids = IdSource::resolve(params, source, geometry.source_samples())?;

    let vs = source.vector_size;
    let rank = params.rank();
    let x_axis = params.axis(Axis::X);
    let y_axis = params.axis(Axis::Y);
    let spp_x = params.samples_per_pixel_x as f32;
    let spp_y = params.samples_per_pixel_y as f32;
    let source_width = geometry.source_width as i64;

    let mut stats = TileStats::default();
    let mut accumulator = CoverageAccumulator::new();
    let mut ranked = Vec::new();

    for desty in 0..geometry.dest_height {
        let wy = y_axis.window(geometry.dest_offset_y, desty as i64);
        let center_y = wy.center();

        for destx in 0..geometry.dest_width {
            let wx = x_axis.window(geometry.dest_offset_x, destx as i64);
            let center_x = wx.center();

            accumulator.clear();
            let mut sample = Pixel4::default();
            let mut gaussian_norm = 0.0f32;

            for sy in wy.scan_first..=wy.scan_last {
                // Offset from the pixel centre in pixel units
                let y = (sy as f32 - center_y) / spp_y;
                let row_in_opacity = wy.in_opacity(sy);

                for sx in wx.scan_first..=wx.scan_last {
                    let x = (sx as f32 - center_x) / spp_x;
                    let weight = gaussian_filter(
                        x * KERNEL_SCALE,
                        y * KERNEL_SCALE,
                        params.gaussian_exp,
                        params.gaussian_alpha,
                    );
                    gaussian_norm += weight;

                    if !(row_in_opacity && wx.in_opacity(sx)) {
                        continue;
                    }

                    // Samples are treated as fully opaque
                    let coverage = weight;
                    let id = ids.read((sx + source_width * sy) as usize);
                    let (random_a, random_b) = random_color_pair(id);
                    sample += Pixel4::new(0.0, random_a, random_b, 1.0) * coverage;
                    accumulator.add(id, coverage);
                }
            }

            let degenerate = gaussian_norm <= MIN_GAUSSIAN_NORM;
            if degenerate {
                stats.degenerate_pixels += 1;
            }

            let pixel = desty * geometry.dest_width + destx;
            let out = &mut destination[pixel * vs..(pixel + 1) * vs];
            if rank == 0 {
                emit_random_color(out, &sample);
            } else {
                accumulator.ranked_into(&mut ranked);
                emit_ranked(out, &ranked, rank, gaussian_norm, degenerate);
            }
            stats.pixels += 1;
        }
    }

    if stats.degenerate_pixels > 0 {
        warn!(
            "{} of {} pixels had a Gaussian norm <= {:e} (filter width {}); their coverage was written as 0",
            stats.degenerate_pixels, stats.pixels, MIN_GAUSSIAN_NORM, params.options.filter_width
        );
    }
    debug!(
        "resampled {}x{} tile at ({}, {}), rank {}",
        geometry.dest_width, geometry.dest_height, geometry.dest_offset_x, geometry.dest_offset_y, rank
    );

    Ok(stats)
}

/// Rank 0: unnormalized random colour and coverage, extra channels zeroed
#[inline]
fn emit_random_color(out: &mut [f32], sample: &Pixel4) {
    out[..4].copy_from_slice(sample.as_array());
    out[4..].fill(0.0);
}

/// Rank N: `(id, coverage / norm)` pairs starting at the Nth ranked identifier
#[inline]
fn emit_ranked(out: &mut [f32], ranked: &[RankedEntry], rank: u32, gaussian_norm: f32, degenerate: bool) {
    let skip = (rank - 1) as usize;
    for (slot, entry) in out.chunks_exact_mut(2).zip(ranked.iter().skip(skip)) {
        slot[0] = entry.id;
        slot[1] = if degenerate { 0.0 } else { entry.coverage / gaussian_norm };
    }
}
