//! Pixel filter plug-in surface
//!
//! A host drives a filter in three phases: `configure` with the user option
//! string, `prepare` once the sub-pixel sampling density is known, then any
//! number of `resample` calls, one per output tile. `resample` borrows the
//! filter immutably so tiles can run concurrently; re-preparing needs `&mut`.

use log::{debug, warn};

use crate::buffer::{SampleBuffer, TileGeometry};
use crate::error::FilterError;
use crate::options::FilterOptions;
use crate::params::{required_special_channels, FilterParameters, SpecialChannel};
use crate::resample::{resample_tile, TileStats};

pub trait PixelFilter: Send + Sync {
    /// Parse a `-w/-r/-i/-h` option string on top of the defaults
    fn configure(&mut self, options: &str);

    /// Filter footprint in pixels along x and y, used by the host for margins
    fn filter_width(&self) -> (f32, f32);

    /// Per-sample channels the host must supply alongside the sample vector
    fn declare_dependencies(&self) -> Vec<SpecialChannel>;

    /// Fix the sampling density; recomputes every derived constant
    fn prepare(&mut self, samples_per_pixel_x: usize, samples_per_pixel_y: usize);

    /// Resample one tile into `destination`
    fn resample(
        &self,
        destination: &mut [f32],
        source: &SampleBuffer<'_>,
        geometry: &TileGeometry,
    ) -> Result<TileStats, FilterError>;
}

/// Gaussian ID matte filter
#[derive(Debug, Clone, Default)]
pub struct AutomatteFilter {
    options: FilterOptions,
    params: Option<FilterParameters>,
}

impl AutomatteFilter {
    pub fn new(options: FilterOptions) -> Self {
        Self { options, params: None }
    }

    pub fn from_options_str(options: &str) -> Self {
        let mut filter = Self::default();
        filter.configure(options);
        filter
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Parameters from the last `prepare`, if any
    pub fn parameters(&self) -> Option<&FilterParameters> {
        self.params.as_ref()
    }
}

impl PixelFilter for AutomatteFilter {
    fn configure(&mut self, options: &str) {
        self.options = FilterOptions::parse(options);
        if !self.options.id_type.is_supported() {
            warn!(
                "identifier type '{}' has no dedicated channel, reading the material slot",
                self.options.id_type.as_str()
            );
        }
        debug!("configured automatte filter: {}", self.options.to_arg_string());

        // Keep derived constants consistent with the new width
        if let Some(p) = self.params {
            self.params = Some(FilterParameters::prepare(
                self.options,
                p.samples_per_pixel_x,
                p.samples_per_pixel_y,
            ));
        }
    }

    fn filter_width(&self) -> (f32, f32) {
        (self.options.filter_width, self.options.filter_width)
    }

    fn declare_dependencies(&self) -> Vec<SpecialChannel> {
        required_special_channels(&self.options)
    }

    fn prepare(&mut self, samples_per_pixel_x: usize, samples_per_pixel_y: usize) {
        let params = FilterParameters::prepare(self.options, samples_per_pixel_x, samples_per_pixel_y);
        debug!(
            "prepared for {}x{} spp: half extents {}x{}, gaussian edge {}",
            samples_per_pixel_x, samples_per_pixel_y, params.half_samples_x, params.half_samples_y, params.gaussian_exp
        );
        self.params = Some(params);
    }

    fn resample(
        &self,
        destination: &mut [f32],
        source: &SampleBuffer<'_>,
        geometry: &TileGeometry,
    ) -> Result<TileStats, FilterError> {
        let params = self.params.as_ref().ok_or(FilterError::NotPrepared)?;
        resample_tile(params, destination, source, geometry)
    }
}
