//! Error types for the resampling filter.

use thiserror::Error;

use crate::params::SpecialChannel;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("filter used before prepare() was called")]
    NotPrepared,

    #[error("vector size {0} is too small, need at least 4 channels per sample")]
    VectorSizeTooSmall(usize),

    #[error("samples per pixel must be at least 1, got {x}x{y}")]
    InvalidSamplesPerPixel { x: usize, y: usize },

    #[error("destination length mismatch: expected {expected} floats, got {actual}")]
    DestinationSize { expected: usize, actual: usize },

    #[error("source length mismatch: expected {expected} floats, got {actual}")]
    SourceSize { expected: usize, actual: usize },

    #[error("special channel {0:?} is required but was not provided")]
    MissingSpecialChannel(SpecialChannel),

    #[error("special channel {channel:?} has {actual} samples, expected {expected}")]
    SpecialChannelSize {
        channel: SpecialChannel,
        expected: usize,
        actual: usize,
    },

    #[error("sample window [{first}, {last}] on the {axis} axis falls outside the source extent {extent}")]
    WindowOutOfBounds {
        axis: char,
        first: i64,
        last: i64,
        extent: usize,
    },
}
