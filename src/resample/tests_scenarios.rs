//! End-to-end pixel scenarios for `resample_tile`

use super::*;
use crate::hash::{fast_random, hash_to_float};
use crate::options::FilterOptions;

fn params(options: &str, spp_x: usize, spp_y: usize) -> FilterParameters {
    FilterParameters::prepare(FilterOptions::parse(options), spp_x, spp_y)
}

fn object_ids(width: usize, height: usize, vector_size: usize, id: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height * vector_size];
    for y in 0..height {
        for x in 0..width {
            data[(y * width + x) * vector_size + 1] = id(x, y);
        }
    }
    data
}

fn centered_pixel() -> TileGeometry {
    TileGeometry {
        source_width: 6,
        source_height: 6,
        dest_width: 1,
        dest_height: 1,
        dest_offset_x: 2,
        dest_offset_y: 2,
    }
}

#[test_log::test]
fn test_uniform_identifier_random_color() {
    let src = object_ids(6, 6, 4, |_, _| 7.0);
    let mut dst = vec![0.0; 4];
    let stats = resample_tile(&params("-w 2 -r 0", 2, 2), &mut dst, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(stats.degenerate_pixels, 0);

    let coverage = dst[3];
    assert!(coverage > 0.0);
    assert!((dst[1] / coverage - fast_random(7)).abs() < 1e-5);
    assert!((dst[2] / coverage - fast_random(7 + crate::hash::RANDOM_SEED_OFFSET)).abs() < 1e-5);
}

#[test]
fn test_uniform_identifier_full_coverage() {
    let src = object_ids(6, 6, 4, |_, _| 7.0);
    let mut dst = vec![0.0; 4];
    resample_tile(&params("-w 2 -r 1", 2, 2), &mut dst, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(dst[0], 7.0);
    assert!((dst[1] - 1.0).abs() < 1e-5, "coverage was {}", dst[1]);
}

#[test]
fn test_two_identifiers_split_evenly() {
    let left = hash_to_float(0x1234_5678);
    let right = hash_to_float(0x8765_4321);
    let src = object_ids(6, 6, 4, |x, _| if x < 3 { left } else { right });

    let mut rank1 = vec![0.0; 4];
    resample_tile(&params("-w 2 -r 1", 2, 2), &mut rank1, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    let ids = [rank1[0], rank1[2]];
    assert!(ids.contains(&left) && ids.contains(&right));
    assert!((rank1[1] - 0.5).abs() < 1e-4);
    assert!((rank1[3] - 0.5).abs() < 1e-4);
    assert!(rank1[1] >= rank1[3]);

    let mut again = vec![0.0; 4];
    resample_tile(&params("-w 2 -r 1", 2, 2), &mut again, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(rank1, again);

    let mut rank2 = vec![0.0; 4];
    resample_tile(&params("-w 2 -r 2", 2, 2), &mut rank2, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(rank2[0], rank1[2]);
    assert_eq!(rank2[1], rank1[3]);
}

#[test_log::test]
fn test_zero_width_is_degenerate_not_nan() {
    // spp 3 with width 0: the kernel vanishes everywhere, single-tap opacity windows
    let src = object_ids(6, 6, 4, |x, y| (1 + x / 3 + 2 * (y / 3)) as f32);
    let geometry = TileGeometry {
        source_width: 6,
        source_height: 6,
        dest_width: 2,
        dest_height: 2,
        dest_offset_x: 0,
        dest_offset_y: 0,
    };

    let mut ranked = vec![-1.0; 2 * 2 * 4];
    let stats = resample_tile(&params("-w 0 -r 1", 3, 3), &mut ranked, &SampleBuffer::new(&src, 4), &geometry).unwrap();
    assert_eq!(stats.pixels, 4);
    assert_eq!(stats.degenerate_pixels, 4);
    for (pixel, out) in ranked.chunks(4).enumerate() {
        assert_eq!(out[0], (pixel + 1) as f32);
        assert_eq!(out[1], 0.0);
        assert_eq!(&out[2..], &[-1.0, -1.0]);
    }

    let mut color = vec![-1.0; 2 * 2 * 4];
    resample_tile(&params("-w 0 -r 0", 3, 3), &mut color, &SampleBuffer::new(&src, 4), &geometry).unwrap();
    assert!(color.iter().all(|v| *v == 0.0));
}

#[test]
fn test_zero_width_even_spp_has_no_entries() {
    let src = object_ids(4, 4, 4, |_, _| 5.0);
    let geometry = TileGeometry {
        source_width: 4,
        source_height: 4,
        dest_width: 2,
        dest_height: 2,
        dest_offset_x: 0,
        dest_offset_y: 0,
    };
    let mut dst = vec![-1.0; 16];
    let stats = resample_tile(&params("-w 0 -r 1", 2, 2), &mut dst, &SampleBuffer::new(&src, 4), &geometry).unwrap();
    assert_eq!(stats.degenerate_pixels, 4);
    assert!(dst.iter().all(|v| *v == -1.0));
}

#[test]
fn test_coverage_is_conserved_and_ranked() {
    let ids: Vec<f32> = (0..4u32).map(|i| hash_to_float(0x4000_0000 + i * 977)).collect();
    let src = object_ids(6, 6, 8, |x, y| ids[(x + 2 * y) % 4]);
    let mut dst = vec![0.0; 8];
    resample_tile(&params("-w 2 -r 1", 2, 2), &mut dst, &SampleBuffer::new(&src, 8), &centered_pixel()).unwrap();

    let coverages: Vec<f32> = dst.chunks(2).map(|pair| pair[1]).collect();
    let total: f32 = coverages.iter().sum();
    assert!((total - 1.0).abs() < 1e-4, "total coverage {}", total);
    assert!(coverages.windows(2).all(|w| w[0] >= w[1]));

    let mut emitted: Vec<f32> = dst.chunks(2).map(|pair| pair[0]).collect();
    emitted.sort_by(f32::total_cmp);
    let mut expected = ids.clone();
    expected.sort_by(f32::total_cmp);
    assert_eq!(emitted, expected);
}

#[test]
fn test_boundary_pixel_splits_coverage() {
    let src = object_ids(10, 6, 4, |x, _| if x < 5 { 1.0 } else { 2.0 });
    let geometry = TileGeometry {
        source_width: 10,
        source_height: 6,
        dest_width: 3,
        dest_height: 1,
        dest_offset_x: 2,
        dest_offset_y: 2,
    };
    let mut dst = vec![0.0; 12];
    resample_tile(&params("-w 2 -r 1", 2, 2), &mut dst, &SampleBuffer::new(&src, 4), &geometry).unwrap();

    // Pixel 1 is centred on the boundary
    assert!((dst[4 + 1] - 0.5).abs() < 1e-4);
    assert!((dst[4 + 3] - 0.5).abs() < 1e-4);

    // Outer pixels only see their own side inside the opacity window
    assert_eq!(dst[0], 1.0);
    assert!((dst[1] - 1.0).abs() < 1e-5);
    assert_eq!(&dst[2..4], &[0.0, 0.0]);
    assert_eq!(dst[8], 2.0);
    assert!((dst[9] - 1.0).abs() < 1e-5);
}

#[test]
fn test_scan_taps_outside_opacity_window_dilute_coverage() {
    // spp 2, width 2.4: half extent stays 2 but the outermost scanned taps sit
    // at 2.083 in kernel coordinates, inside the 2.4 radius
    let src = object_ids(6, 6, 4, |_, _| 7.0);
    let mut dst = vec![0.0; 4];
    let stats = resample_tile(&params("-w 2.4 -r 1", 2, 2), &mut dst, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(stats.degenerate_pixels, 0);
    assert_eq!(dst[0], 7.0);
    assert!(dst[1] > 0.9, "coverage was {}", dst[1]);
    assert!(dst[1] < 1.0 - 1e-3, "coverage was {}", dst[1]);
    assert_eq!(&dst[2..], &[0.0, 0.0]);
}

#[test]
fn test_scan_taps_outside_opacity_window_never_emitted() {
    // Inner 4x4 opacity window holds id 1, the outer scanned ring holds id 2
    let src = object_ids(6, 6, 4, |x, y| {
        if (1..=4).contains(&x) && (1..=4).contains(&y) {
            1.0
        } else {
            2.0
        }
    });

    let mut wide = vec![0.0; 4];
    resample_tile(&params("-w 2.4 -r 1", 2, 2), &mut wide, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(wide[0], 1.0);
    assert!(wide[1] < 1.0 - 1e-3);
    assert_eq!(&wide[2..], &[0.0, 0.0]);

    // At width 2 the same ring has zero weight, so id 1 is full coverage
    let mut narrow = vec![0.0; 4];
    resample_tile(&params("-w 2 -r 1", 2, 2), &mut narrow, &SampleBuffer::new(&src, 4), &centered_pixel()).unwrap();
    assert_eq!(narrow[0], 1.0);
    assert!((narrow[1] - 1.0).abs() < 1e-5);
    assert!(wide[1] < narrow[1]);
}
