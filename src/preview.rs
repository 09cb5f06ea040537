//! 8-bit RGB previews of filtered mattes
//!
//! Rank 0 mattes already carry a random colour per identifier, weighted by
//! coverage: dividing channels 1 and 2 by channel 3 recovers the colour and the
//! coverage itself becomes brightness. Ranked mattes only carry identifiers,
//! so the preview re-derives the same random colour from the strongest
//! identifier and scales it by its coverage.

use std::path::Path;

use image::{ImageBuffer, Rgb};

use crate::error::FilterError;
use crate::hash::random_color_pair;

/// Colour for a random pair; blue is derived so both channels show
#[inline]
fn pair_to_rgb(a: f32, b: f32) -> [f32; 3] {
    [a, b, (a - b).abs()]
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Render a matte to interleaved RGB8.
///
/// `rank` selects the decoding: 0 reads the random colour encoding, anything
/// else reads the first `(id, coverage)` pair.
pub fn matte_to_rgb8(
    data: &[f32],
    width: usize,
    height: usize,
    vector_size: usize,
    rank: u32,
) -> Result<Vec<u8>, FilterError> {
    if vector_size < 4 {
        return Err(FilterError::VectorSizeTooSmall(vector_size));
    }
    let expected = width * height * vector_size;
    if data.len() != expected {
        return Err(FilterError::DestinationSize {
            expected,
            actual: data.len(),
        });
    }

    let pixels = data.chunks_exact(vector_size);
    let mut rgb = Vec::with_capacity(width * height * 3);

    if rank == 0 {
        // Rank 0 coverage is an unnormalized weight sum; scale by the frame peak
        let peak = pixels.clone().map(|p| p[3]).fold(0.0f32, f32::max);
        for p in pixels {
            let coverage = p[3];
            let color = if coverage > 0.0 && peak > 0.0 {
                let brightness = coverage / peak;
                pair_to_rgb(p[1] / coverage, p[2] / coverage).map(|c| c * brightness)
            } else {
                [0.0; 3]
            };
            rgb.extend(color.map(to_u8));
        }
    } else {
        for p in pixels {
            let (id, coverage) = (p[0], p[1]);
            let (a, b) = random_color_pair(id);
            rgb.extend(pair_to_rgb(a, b).map(|c| to_u8(c * coverage)));
        }
    }

    Ok(rgb)
}

/// Write interleaved RGB8 to a PNG file
pub fn save_preview_png(path: &Path, rgb: &[u8], width: u32, height: u32) -> Result<(), String> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, rgb.to_vec())
        .ok_or_else(|| "Failed to create RGB image buffer".to_string())?;

    img.save(path)
        .map_err(|e| format!("Failed to save {}: {}", path.display(), e))
}
