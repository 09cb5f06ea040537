//! Windowed Gaussian kernel and sample window sizing
//!
//! The kernel is a radial "Gaussian minus its edge value":
//! `exp(-alpha * (x² + y²))` less `exp(-alpha * width²)`, so the weight reaches
//! exactly zero on the circle of radius `width` and is clamped outside it.

/// Gaussian falloff. Fixed; only the width is user controlled.
pub const GAUSSIAN_ALPHA: f32 = 1.0;

/// Scale from pixel-relative sample offsets into kernel coordinates
pub const KERNEL_SCALE: f32 = 1.66667;

/// Baseline subtracted so the kernel is zero at the filter edge
#[inline]
pub fn gaussian_edge_value(filter_width: f32, alpha: f32) -> f32 {
    (-alpha * filter_width * filter_width).exp()
}

/// Radial windowed Gaussian in kernel coordinates
#[inline]
pub fn gaussian_filter(x: f32, y: f32, edge: f32, alpha: f32) -> f32 {
    ((-alpha * (x * x + y * y)).exp() - edge).max(0.0)
}

/// Number of samples on each side of the pixel centre that fall under the filter.
///
/// Odd sample counts have a centre sample and scan `[-half, half]`; even counts
/// scan `[-half, half)` around a half-sample offset, hence the rounding term.
/// Widths at or below zero collapse to the native pixel window.
pub fn half_sample_width(samples_per_pixel: usize, filter_width: f32) -> i64 {
    let spp = samples_per_pixel as f32;
    let half = if samples_per_pixel & 1 == 1 {
        (spp * 0.5 * filter_width).floor()
    } else {
        (spp * 0.5 * filter_width + 0.5).floor()
    };
    (half as i64).max(0)
}
