/// Sample buffers and tile geometry
///
/// `SampleBuffer` is a borrowed view over the host's flat sample array, addressed
/// as `sample_index * vector_size + channel`, plus the optional special channels
/// (one float per sample). `SampleImage` owns a whole frame of samples and is what
/// the tile driver, the container reader and the WASM exports hand around.

use crate::error::FilterError;
use crate::params::SpecialChannel;

// ============================================================================
// Borrowed views
// ============================================================================

/// Read-only view over one tile's source samples
#[derive(Debug, Clone, Copy)]
pub struct SampleBuffer<'a> {
    pub data: &'a [f32],
    pub vector_size: usize,
    pub object_ids: Option<&'a [f32]>,
    pub material_ids: Option<&'a [f32]>,
}

impl<'a> SampleBuffer<'a> {
    pub fn new(data: &'a [f32], vector_size: usize) -> Self {
        Self {
            data,
            vector_size,
            object_ids: None,
            material_ids: None,
        }
    }

    /// Attach renderer-provided identifier channels
    pub fn with_special_channels(mut self, object_ids: &'a [f32], material_ids: &'a [f32]) -> Self {
        self.object_ids = Some(object_ids);
        self.material_ids = Some(material_ids);
        self
    }

    pub fn special(&self, channel: SpecialChannel) -> Option<&'a [f32]> {
        match channel {
            SpecialChannel::ObjectId => self.object_ids,
            SpecialChannel::MaterialId => self.material_ids,
            SpecialChannel::Depth => None,
        }
    }
}

/// Placement of a destination tile inside its source sample buffer.
///
/// Source dimensions are in samples, destination dimensions in pixels. The
/// offsets give the sample coordinate of the tile's first pixel, leaving room
/// for the filter margin on every side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    pub source_width: usize,
    pub source_height: usize,
    pub dest_width: usize,
    pub dest_height: usize,
    pub dest_offset_x: i64,
    pub dest_offset_y: i64,
}

impl TileGeometry {
    pub fn source_samples(&self) -> usize {
        self.source_width * self.source_height
    }

    pub fn dest_pixels(&self) -> usize {
        self.dest_width * self.dest_height
    }

    pub fn dest_len(&self, vector_size: usize) -> usize {
        self.dest_pixels() * vector_size
    }
}

// ============================================================================
// Owned sample frame
// ============================================================================

/// A full frame of sub-pixel samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampleImage {
    /// Width in samples
    pub width: usize,
    /// Height in samples
    pub height: usize,
    pub vector_size: usize,
    pub samples_per_pixel_x: usize,
    pub samples_per_pixel_y: usize,
    pub data: Vec<f32>,
    pub object_ids: Option<Vec<f32>>,
    pub material_ids: Option<Vec<f32>>,
}

impl SampleImage {
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        vector_size: usize,
        samples_per_pixel_x: usize,
        samples_per_pixel_y: usize,
    ) -> Result<SampleImage, FilterError> {
        if samples_per_pixel_x == 0 || samples_per_pixel_y == 0 {
            return Err(FilterError::InvalidSamplesPerPixel {
                x: samples_per_pixel_x,
                y: samples_per_pixel_y,
            });
        }
        let expected = width * height * vector_size;
        if data.len() != expected {
            return Err(FilterError::SourceSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(SampleImage {
            width,
            height,
            vector_size,
            samples_per_pixel_x,
            samples_per_pixel_y,
            data,
            object_ids: None,
            material_ids: None,
        })
    }

    /// Attach renderer-provided identifier channels (one float per sample each)
    pub fn with_special_channels(mut self, object_ids: Vec<f32>, material_ids: Vec<f32>) -> Result<SampleImage, FilterError> {
        let expected = self.width * self.height;
        for (channel, ids) in [
            (SpecialChannel::ObjectId, &object_ids),
            (SpecialChannel::MaterialId, &material_ids),
        ] {
            if ids.len() != expected {
                return Err(FilterError::SpecialChannelSize {
                    channel,
                    expected,
                    actual: ids.len(),
                });
            }
        }
        self.object_ids = Some(object_ids);
        self.material_ids = Some(material_ids);
        Ok(self)
    }

    /// Output width in pixels (partial trailing pixels are dropped)
    pub fn pixel_width(&self) -> usize {
        self.width / self.samples_per_pixel_x
    }

    /// Output height in pixels (partial trailing pixels are dropped)
    pub fn pixel_height(&self) -> usize {
        self.height / self.samples_per_pixel_y
    }

    pub fn as_buffer(&self) -> SampleBuffer<'_> {
        SampleBuffer {
            data: &self.data,
            vector_size: self.vector_size,
            object_ids: self.object_ids.as_deref(),
            material_ids: self.material_ids.as_deref(),
        }
    }

    /// Copy out a window of samples, clamping coordinates to the frame edge.
    ///
    /// `x0`/`y0` may be negative and the window may run past the frame; those
    /// samples repeat the nearest edge sample.
    pub fn extract_clamped(&self, x0: i64, y0: i64, width: usize, height: usize) -> SampleImage {
        let vs = self.vector_size;
        let max_x = self.width.saturating_sub(1) as i64;
        let max_y = self.height.saturating_sub(1) as i64;

        // Clamp-to-edge source index
        let src_index = |x: i64, y: i64| -> usize {
            let cx = x.clamp(0, max_x) as usize;
            let cy = y.clamp(0, max_y) as usize;
            cy * self.width + cx
        };

        let mut data = Vec::with_capacity(width * height * vs);
        let mut object_ids = self.object_ids.as_ref().map(|_| Vec::with_capacity(width * height));
        let mut material_ids = self.material_ids.as_ref().map(|_| Vec::with_capacity(width * height));

        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let idx = src_index(x0 + x, y0 + y);
                data.extend_from_slice(&self.data[idx * vs..(idx + 1) * vs]);
                if let (Some(dst), Some(src)) = (object_ids.as_mut(), self.object_ids.as_ref()) {
                    dst.push(src[idx]);
                }
                if let (Some(dst), Some(src)) = (material_ids.as_mut(), self.material_ids.as_ref()) {
                    dst.push(src[idx]);
                }
            }
        }

        SampleImage {
            width,
            height,
            vector_size: vs,
            samples_per_pixel_x: self.samples_per_pixel_x,
            samples_per_pixel_y: self.samples_per_pixel_y,
            data,
            object_ids,
            material_ids,
        }
    }
}
