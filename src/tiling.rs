/// Tile driver: runs a pixel filter over a whole sample frame.
/// Splits the output into tiles, pads each tile's source window by the filter
/// margin with clamp-to-edge samples, filters tiles in parallel and stitches
/// the results back into one matte.

use log::{debug, info};
use rayon::prelude::*;

use crate::buffer::{SampleImage, TileGeometry};
use crate::error::FilterError;
use crate::filter::PixelFilter;
use crate::kernel::half_sample_width;
use crate::resample::TileStats;

/// Default output tile edge in pixels
pub const DEFAULT_TILE_SIZE: usize = 64;

/// A tile of destination pixels, half-open ranges
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl Tile {
    pub fn width(&self) -> usize {
        self.x_end - self.x_start
    }

    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }
}

/// Cover a `width` x `height` pixel image with tiles of at most `tile_size`.
/// Edge tiles are cropped. A tile size of 0 yields a single tile.
pub fn generate_tiles(width: usize, height: usize, tile_size: usize) -> Vec<Tile> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let tile_w = if tile_size == 0 { width } else { tile_size };
    let tile_h = if tile_size == 0 { height } else { tile_size };

    let mut tiles = Vec::with_capacity(width.div_ceil(tile_w) * height.div_ceil(tile_h));
    for y_start in (0..height).step_by(tile_h) {
        for x_start in (0..width).step_by(tile_w) {
            tiles.push(Tile {
                x_start,
                x_end: (x_start + tile_w).min(width),
                y_start,
                y_end: (y_start + tile_h).min(height),
            });
        }
    }
    tiles
}

/// Filtered output for a whole frame
#[derive(Debug, Clone, PartialEq)]
pub struct MatteImage {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    pub vector_size: usize,
    pub data: Vec<f32>,
    pub stats: TileStats,
}

impl MatteImage {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let idx = (y * self.width + x) * self.vector_size;
        &self.data[idx..idx + self.vector_size]
    }
}

/// Run `filter` over every pixel of `image`.
///
/// The filter is prepared for the image's samples per pixel first. Tiles are
/// independent and run on the rayon pool; output slots a ranked filter leaves
/// unwritten stay zero.
pub fn render_image<F>(filter: &mut F, image: &SampleImage, tile_size: usize) -> Result<MatteImage, FilterError>
where
    F: PixelFilter + ?Sized,
{
    let spp_x = image.samples_per_pixel_x;
    let spp_y = image.samples_per_pixel_y;
    filter.prepare(spp_x, spp_y);

    let (width_x, width_y) = filter.filter_width();
    let margin_x = half_sample_width(spp_x, width_x);
    let margin_y = half_sample_width(spp_y, width_y);

    let width = image.pixel_width();
    let height = image.pixel_height();
    let vs = image.vector_size;
    let tiles = generate_tiles(width, height, tile_size);

    info!(
        "filtering {}x{} pixels ({}x{} spp, {} channels) in {} tiles",
        width,
        height,
        spp_x,
        spp_y,
        vs,
        tiles.len()
    );

    let filter: &F = filter;
    let rendered: Vec<(Tile, Vec<f32>, TileStats)> = tiles
        .par_iter()
        .map(|tile| {
            let (data, stats) = render_tile(filter, image, tile, margin_x, margin_y)?;
            Ok((*tile, data, stats))
        })
        .collect::<Result<_, FilterError>>()?;

    // Stitch
    let mut data = vec![0.0f32; width * height * vs];
    let mut stats = TileStats::default();
    for (tile, tile_data, tile_stats) in rendered {
        let row_len = tile.width() * vs;
        for ty in 0..tile.height() {
            let dst = ((tile.y_start + ty) * width + tile.x_start) * vs;
            data[dst..dst + row_len].copy_from_slice(&tile_data[ty * row_len..(ty + 1) * row_len]);
        }
        stats = stats.merge(tile_stats);
    }

    info!(
        "filtered {} pixels, {} with a degenerate kernel norm",
        stats.pixels, stats.degenerate_pixels
    );

    Ok(MatteImage {
        width,
        height,
        vector_size: vs,
        data,
        stats,
    })
}

fn render_tile<F>(
    filter: &F,
    image: &SampleImage,
    tile: &Tile,
    margin_x: i64,
    margin_y: i64,
) -> Result<(Vec<f32>, TileStats), FilterError>
where
    F: PixelFilter + ?Sized,
{
    let spp_x = image.samples_per_pixel_x;
    let spp_y = image.samples_per_pixel_y;
    let window_w = tile.width() * spp_x + 2 * margin_x as usize;
    let window_h = tile.height() * spp_y + 2 * margin_y as usize;
    let x0 = (tile.x_start * spp_x) as i64 - margin_x;
    let y0 = (tile.y_start * spp_y) as i64 - margin_y;

    let window = image.extract_clamped(x0, y0, window_w, window_h);
    let geometry = TileGeometry {
        source_width: window_w,
        source_height: window_h,
        dest_width: tile.width(),
        dest_height: tile.height(),
        dest_offset_x: margin_x,
        dest_offset_y: margin_y,
    };

    let mut data = vec![0.0f32; geometry.dest_len(image.vector_size)];
    let stats = filter.resample(&mut data, &window.as_buffer(), &geometry)?;
    debug!(
        "tile ({}, {})-({}, {}) done",
        tile.x_start, tile.y_start, tile.x_end, tile.y_end
    );
    Ok((data, stats))
}
