//! Resolution-dependent filter parameters
//!
//! `FilterParameters` bundles the user options with the constants derived from
//! the sub-pixel sampling density. It is only ever built whole by
//! [`FilterParameters::prepare`], so the half extents and the Gaussian edge
//! value always belong to the same samples-per-pixel.

use crate::kernel::{gaussian_edge_value, half_sample_width, GAUSSIAN_ALPHA};
use crate::options::{FilterOptions, HashSource};

/// Auxiliary per-sample channels the filter needs from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialChannel {
    /// Renderer object id, one float per sample
    ObjectId,
    /// Renderer material id, one float per sample
    MaterialId,
    /// Sample depth. Always requested; the host uses it to size filter margins.
    Depth,
}

/// Special channels required for a given set of options
pub fn required_special_channels(options: &FilterOptions) -> Vec<SpecialChannel> {
    let mut channels = Vec::with_capacity(3);
    if options.hash_source == HashSource::Mantra {
        channels.push(SpecialChannel::ObjectId);
        channels.push(SpecialChannel::MaterialId);
    }
    channels.push(SpecialChannel::Depth);
    channels
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParameters {
    pub options: FilterOptions,
    pub samples_per_pixel_x: usize,
    pub samples_per_pixel_y: usize,
    pub gaussian_alpha: f32,
    /// `exp(-alpha * width²)`, subtracted per axis so the kernel ends at zero
    pub gaussian_exp: f32,
    pub half_samples_x: i64,
    pub half_samples_y: i64,
}

impl FilterParameters {
    /// Derive the constants for a new sampling density
    pub fn prepare(options: FilterOptions, samples_per_pixel_x: usize, samples_per_pixel_y: usize) -> Self {
        let width = options.filter_width;
        Self {
            options,
            samples_per_pixel_x,
            samples_per_pixel_y,
            gaussian_alpha: GAUSSIAN_ALPHA,
            gaussian_exp: gaussian_edge_value(width, GAUSSIAN_ALPHA),
            half_samples_x: half_sample_width(samples_per_pixel_x, width),
            half_samples_y: half_sample_width(samples_per_pixel_y, width),
        }
    }

    #[inline]
    pub fn rank(&self) -> u32 {
        self.options.rank
    }

    /// Per-axis view used by the window math
    #[inline]
    pub fn axis(&self, axis: Axis) -> AxisParams {
        match axis {
            Axis::X => AxisParams {
                samples_per_pixel: self.samples_per_pixel_x as i64,
                half_samples: self.half_samples_x,
            },
            Axis::Y => AxisParams {
                samples_per_pixel: self.samples_per_pixel_y as i64,
                half_samples: self.half_samples_y,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn name(&self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
        }
    }
}

/// Sample windows of one destination pixel along one axis.
///
/// All indices are absolute sample coordinates in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// First native sample of the pixel
    pub first: i64,
    /// Last native sample of the pixel
    pub last: i64,
    /// Opacity window, the samples that contribute coverage
    pub opacity_first: i64,
    pub opacity_last: i64,
    /// Scan range, widened so edge taps are not clipped
    pub scan_first: i64,
    pub scan_last: i64,
}

impl PixelWindow {
    /// Pixel centre in sample coordinates
    #[inline]
    pub fn center(&self) -> f32 {
        0.5 * (self.last + self.first) as f32
    }

    #[inline]
    pub fn in_opacity(&self, s: i64) -> bool {
        s >= self.opacity_first && s <= self.opacity_last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisParams {
    pub samples_per_pixel: i64,
    pub half_samples: i64,
}

impl AxisParams {
    /// Windows for destination pixel `dest` of a tile offset by `offset` samples
    #[inline]
    pub fn window(&self, offset: i64, dest: i64) -> PixelWindow {
        let spp = self.samples_per_pixel;
        let half = self.half_samples;
        let first = offset + dest * spp;
        let last = first + spp - 1;
        PixelWindow {
            first,
            last,
            opacity_first: first + (spp >> 1) - half,
            opacity_last: first + ((spp - 1) >> 1) + half,
            scan_first: first - half,
            scan_last: last + half,
        }
    }
}
