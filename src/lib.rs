/// Automatte - Gaussian ID matte resampling filter
///
/// Turns a dense grid of sub-pixel render samples carrying object/material
/// identifiers into antialiased ID matte channels: either a stable random
/// colour per identifier (rank 0) or ranked `(identifier, coverage)` pairs.
///
/// The filter itself lives in `filter`/`resample`; `tiling` plays the host
/// renderer's role for whole frames, `sfi` stores samples and mattes, and the
/// functions below expose the same pipeline to JS.

use wasm_bindgen::prelude::*;

pub mod buffer;
pub mod error;
pub mod filter;
pub mod hash;
pub mod kernel;
pub mod options;
pub mod params;
pub mod pixel;
pub mod preview;
pub mod resample;
pub mod sfi;
pub mod tiling;

pub use buffer::{SampleBuffer, SampleImage, TileGeometry};
pub use error::FilterError;
pub use filter::{AutomatteFilter, PixelFilter};
pub use hash::{float_to_hash, hash_to_float};
pub use options::{FilterOptions, HashSource, IdType};
pub use params::{FilterParameters, SpecialChannel};
pub use resample::{resample_tile, TileStats};
pub use tiling::{render_image, MatteImage};

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// Filtering
// ============================================================================

/// Filter a whole frame of interleaved samples.
///
/// `width`/`height` are in samples. Returns `pixel_width * pixel_height *
/// vector_size` floats, row-major.
#[wasm_bindgen]
pub fn automatte_filter(
    samples: Vec<f32>,
    vector_size: usize,
    width: usize,
    height: usize,
    samples_per_pixel_x: usize,
    samples_per_pixel_y: usize,
    options: &str,
    tile_size: usize,
) -> Result<Vec<f32>, JsValue> {
    let image = SampleImage::new(samples, width, height, vector_size, samples_per_pixel_x, samples_per_pixel_y)
        .map_err(to_js)?;
    let mut filter = AutomatteFilter::from_options_str(options);
    let matte = render_image(&mut filter, &image, tile_size).map_err(to_js)?;
    Ok(matte.data)
}

/// Same as [`automatte_filter`] with host-provided identifier channels,
/// one float per sample each (`-h mantra`).
#[wasm_bindgen]
pub fn automatte_filter_with_ids(
    samples: Vec<f32>,
    object_ids: Vec<f32>,
    material_ids: Vec<f32>,
    vector_size: usize,
    width: usize,
    height: usize,
    samples_per_pixel_x: usize,
    samples_per_pixel_y: usize,
    options: &str,
    tile_size: usize,
) -> Result<Vec<f32>, JsValue> {
    let image = SampleImage::new(samples, width, height, vector_size, samples_per_pixel_x, samples_per_pixel_y)
        .and_then(|img| img.with_special_channels(object_ids, material_ids))
        .map_err(to_js)?;
    let mut filter = AutomatteFilter::from_options_str(options);
    let matte = render_image(&mut filter, &image, tile_size).map_err(to_js)?;
    Ok(matte.data)
}

/// Normalized option string, e.g. `-w 2 -r 0 -i object -h crypto`
#[wasm_bindgen]
pub fn automatte_parse_options(options: &str) -> String {
    FilterOptions::parse(options).to_arg_string()
}

// ============================================================================
// Identifier encoding
// ============================================================================

#[wasm_bindgen(js_name = hashToFloat)]
pub fn hash_to_float_js(hash: u32) -> f32 {
    hash_to_float(hash)
}

#[wasm_bindgen(js_name = floatToHash)]
pub fn float_to_hash_js(id: f32) -> u32 {
    float_to_hash(id)
}

// ============================================================================
// Preview
// ============================================================================

/// Interleaved RGB8 preview of a filtered matte
#[wasm_bindgen]
pub fn automatte_preview_rgb(
    matte: &[f32],
    width: usize,
    height: usize,
    vector_size: usize,
    rank: u32,
) -> Result<Vec<u8>, JsValue> {
    preview::matte_to_rgb8(matte, width, height, vector_size, rank).map_err(to_js)
}
