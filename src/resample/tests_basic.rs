//! Validation and output layout tests for `resample_tile`

use super::*;
use crate::options::{FilterOptions, IdType};

/// Source frame with `id(x, y)` written to `channel` of every sample
fn source_with_ids(width: usize, height: usize, vector_size: usize, channel: usize, id: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height * vector_size];
    for y in 0..height {
        for x in 0..width {
            data[(y * width + x) * vector_size + channel] = id(x, y);
        }
    }
    data
}

fn params(options: &str, spp_x: usize, spp_y: usize) -> FilterParameters {
    FilterParameters::prepare(FilterOptions::parse(options), spp_x, spp_y)
}

/// 2x2 spp, width 2: half width 2, so a single pixel needs a 6x6 source at offset 2
fn single_pixel_geometry() -> TileGeometry {
    TileGeometry {
        source_width: 6,
        source_height: 6,
        dest_width: 1,
        dest_height: 1,
        dest_offset_x: 2,
        dest_offset_y: 2,
    }
}

#[test]
fn test_rejects_small_vector_size() {
    let p = params("-w 2", 2, 2);
    let src = vec![0.0; 36 * 3];
    let mut dst = vec![0.0; 3];
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 3), &single_pixel_geometry()).unwrap_err();
    assert_eq!(err, FilterError::VectorSizeTooSmall(3));
}

#[test]
fn test_rejects_source_size() {
    let p = params("-w 2", 2, 2);
    let src = vec![0.0; 35 * 4];
    let mut dst = vec![0.0; 4];
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &single_pixel_geometry()).unwrap_err();
    assert_eq!(err, FilterError::SourceSize { expected: 144, actual: 140 });
}

#[test]
fn test_rejects_destination_size() {
    let p = params("-w 2", 2, 2);
    let src = vec![0.0; 36 * 4];
    let mut dst = vec![0.0; 5];
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &single_pixel_geometry()).unwrap_err();
    assert_eq!(err, FilterError::DestinationSize { expected: 4, actual: 5 });
}

#[test]
fn test_rejects_zero_samples_per_pixel() {
    let p = params("-w 2", 0, 2);
    let src = vec![0.0; 36 * 4];
    let mut dst = vec![0.0; 4];
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &single_pixel_geometry()).unwrap_err();
    assert_eq!(err, FilterError::InvalidSamplesPerPixel { x: 0, y: 2 });
}

#[test]
fn test_rejects_window_outside_source() {
    let p = params("-w 2", 2, 2);
    let src = vec![0.0; 36 * 4];
    let mut dst = vec![0.0; 4];
    let geometry = TileGeometry {
        dest_offset_x: 0,
        ..single_pixel_geometry()
    };
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &geometry).unwrap_err();
    assert_eq!(
        err,
        FilterError::WindowOutOfBounds { axis: 'x', first: -2, last: 3, extent: 6 }
    );

    let geometry = TileGeometry {
        dest_offset_y: 3,
        ..single_pixel_geometry()
    };
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &geometry).unwrap_err();
    assert_eq!(
        err,
        FilterError::WindowOutOfBounds { axis: 'y', first: 1, last: 6, extent: 6 }
    );
}

#[test]
fn test_empty_destination_is_ok() {
    let p = params("-w 2", 2, 2);
    let src: Vec<f32> = Vec::new();
    let mut dst: Vec<f32> = Vec::new();
    let geometry = TileGeometry {
        source_width: 0,
        source_height: 0,
        dest_width: 0,
        dest_height: 0,
        dest_offset_x: 0,
        dest_offset_y: 0,
    };
    let stats = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &geometry).unwrap();
    assert_eq!(stats, TileStats::default());
}

#[test]
fn test_output_is_bitwise_deterministic() {
    let p = params("-w 1.5 -r 1", 3, 3);
    let src = source_with_ids(9, 9, 6, 1, |x, y| crate::hash::hash_to_float((x * 31 + y * 7) as u32 % 5));
    let geometry = TileGeometry {
        source_width: 9,
        source_height: 9,
        dest_width: 1,
        dest_height: 1,
        dest_offset_x: 3,
        dest_offset_y: 3,
    };
    let mut a = vec![0.0; 6];
    let mut b = vec![0.0; 6];
    resample_tile(&p, &mut a, &SampleBuffer::new(&src, 6), &geometry).unwrap();
    resample_tile(&p, &mut b, &SampleBuffer::new(&src, 6), &geometry).unwrap();
    let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn test_rank_zero_zeroes_extra_channels() {
    let p = params("-w 2 -r 0", 2, 2);
    let src = source_with_ids(6, 6, 6, 1, |_, _| 7.0);
    let mut dst = vec![-1.0; 6];
    resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 6), &single_pixel_geometry()).unwrap();
    assert_eq!(dst[0], 0.0);
    assert!(dst[3] > 0.0);
    assert_eq!(&dst[4..], &[0.0, 0.0]);
}

#[test]
fn test_rank_mode_leaves_unused_slots_untouched() {
    let p = params("-w 2 -r 1", 2, 2);
    let src = source_with_ids(6, 6, 8, 1, |_, _| 7.0);
    let mut dst = vec![-1.0; 8];
    resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 8), &single_pixel_geometry()).unwrap();
    assert_eq!(dst[0], 7.0);
    assert!(dst[1] > 0.0);
    assert_eq!(&dst[2..], &[-1.0; 6]);
}

#[test]
fn test_rank_past_last_identifier_writes_nothing() {
    let p = params("-w 2 -r 3", 2, 2);
    let src = source_with_ids(6, 6, 4, 1, |x, _| if x < 3 { 1.0 } else { 2.0 });
    let mut dst = vec![-1.0; 4];
    resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &single_pixel_geometry()).unwrap();
    assert_eq!(dst, vec![-1.0; 4]);
}

#[test]
fn test_material_type_reads_second_slot() {
    let p = params("-w 2 -r 1 -i material", 2, 2);
    let mut src = source_with_ids(6, 6, 4, 1, |_, _| 3.0);
    for sample in src.chunks_mut(4) {
        sample[2] = 9.0;
    }
    let mut dst = vec![0.0; 4];
    resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &single_pixel_geometry()).unwrap();
    assert_eq!(dst[0], 9.0);
}

#[test]
fn test_mantra_reads_special_channel() {
    let p = params("-w 2 -r 1 -h mantra", 2, 2);
    assert_eq!(p.options.id_type, IdType::Object);
    let src = source_with_ids(6, 6, 4, 1, |_, _| 3.0);
    let object_ids = vec![11.0; 36];
    let material_ids = vec![12.0; 36];
    let buffer = SampleBuffer::new(&src, 4).with_special_channels(&object_ids, &material_ids);
    let mut dst = vec![0.0; 4];
    resample_tile(&p, &mut dst, &buffer, &single_pixel_geometry()).unwrap();
    assert_eq!(dst[0], 11.0);

    let p = params("-w 2 -r 1 -h mantra -i material", 2, 2);
    resample_tile(&p, &mut dst, &buffer, &single_pixel_geometry()).unwrap();
    assert_eq!(dst[0], 12.0);
}

#[test]
fn test_mantra_without_special_channels_fails() {
    let p = params("-w 2 -r 1 -h mantra", 2, 2);
    let src = vec![0.0; 36 * 4];
    let mut dst = vec![0.0; 4];
    let err = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &single_pixel_geometry()).unwrap_err();
    assert_eq!(err, FilterError::MissingSpecialChannel(SpecialChannel::ObjectId));
}

#[test]
fn test_mantra_special_channel_size_checked() {
    let p = params("-w 2 -r 1 -h mantra", 2, 2);
    let src = vec![0.0; 36 * 4];
    let short = vec![1.0; 20];
    let full = vec![1.0; 36];
    let buffer = SampleBuffer::new(&src, 4).with_special_channels(&short, &full);
    let mut dst = vec![0.0; 4];
    let err = resample_tile(&p, &mut dst, &buffer, &single_pixel_geometry()).unwrap_err();
    assert_eq!(
        err,
        FilterError::SpecialChannelSize { channel: SpecialChannel::ObjectId, expected: 36, actual: 20 }
    );
}

#[test]
fn test_stats_count_pixels() {
    let p = params("-w 1", 1, 1);
    let src = source_with_ids(5, 4, 4, 1, |_, _| 1.0);
    let geometry = TileGeometry {
        source_width: 5,
        source_height: 4,
        dest_width: 3,
        dest_height: 2,
        dest_offset_x: 1,
        dest_offset_y: 1,
    };
    let mut dst = vec![0.0; 3 * 2 * 4];
    let stats = resample_tile(&p, &mut dst, &SampleBuffer::new(&src, 4), &geometry).unwrap();
    assert_eq!(stats.pixels, 6);
    assert_eq!(stats.degenerate_pixels, 0);
}
