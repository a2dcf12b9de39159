use crate::image_pipeline::common::types::Image;
use crate::image_pipeline::flatfield::{SynthesisStats, UNITY, synthesize, synthesize_pixel};

#[test]
fn test_zero_mask_is_exact_unity_regardless_of_inputs() {
    let cases = [
        (100.0, 50.0),
        (0.0, 0.0),
        (f32::NAN, 3.0),
        (1e30, 1e-30),
        (-5.0, f32::INFINITY),
    ];
    for (median, inpainted) in cases {
        let (value, _) = synthesize_pixel(median, inpainted, 0.0);
        assert_eq!(value, 65535);
    }
}

#[test]
fn test_full_mask_ratio_above_one_is_clipped() {
    let (value, stats) = synthesize_pixel(100.0, 50.0, 1.0);
    assert_eq!(value, UNITY);
    assert_eq!(stats.clipped_high, 1);
}

#[test]
fn test_full_mask_ratio_below_one() {
    let (value, stats) = synthesize_pixel(50.0, 100.0, 1.0);
    assert_eq!(value, 32768);
    assert_eq!(stats.clipped_high, 0);
}

#[test]
fn test_partial_mask_blends_linearly() {
    // 0.5 * 1.0 + 0.5 * 0.5 = 0.75
    let (value, _) = synthesize_pixel(50.0, 100.0, 0.5);
    assert_eq!(value, (0.75f64 * 65535.0).round() as u16);
}

#[test]
fn test_near_zero_inpainted_falls_back_to_unity_ratio() {
    for inpainted in [0.0, 1e-9, -3.0, f32::NAN] {
        let (value, stats) = synthesize_pixel(80.0, inpainted, 1.0);
        assert_eq!(value, UNITY);
        assert_eq!(stats.ratio_fallbacks, 1);
    }
}

#[test]
fn test_synthesize_image_identity_outside_mask() {
    let (w, h) = (8, 6);
    let mut median = Image::filled(w, h, 0.0);
    let mut inpainted = Image::filled(w, h, 0.0);
    let mut mask = Image::filled(w, h, 0.0);
    for i in 0..w * h {
        median.data[i] = (i * 37 % 101) as f32;
        inpainted.data[i] = (i * 53 % 97) as f32 + 1.0;
    }
    mask.set(3, 3, 1.0);
    mask.set(4, 3, 0.25);
    median.set(3, 3, 40.0);
    inpainted.set(3, 3, 80.0);

    let (map, stats) = synthesize(&median, &inpainted, &mask).unwrap();
    assert_eq!((map.width, map.height), (w, h));
    assert_eq!(stats.untouched, w * h - 2);
    for (value, m) in map.data.iter().zip(&mask.data) {
        if *m == 0.0 {
            assert_eq!(*value, 65535);
        }
    }
    assert_eq!(map.data[3 * w + 3], 32768);
}

#[test]
fn test_synthesize_rejects_mismatched_inputs() {
    let a = Image::filled(3, 3, 1.0);
    let b = Image::filled(3, 2, 1.0);
    assert!(synthesize(&a, &b, &a).is_err());
}

#[test]
fn test_stats_sum_over_every_pixel_class() {
    // Cycles through untouched, fallback, clipped high, clipped low and plain.
    let (width, height) = (257, 129);
    let n = width * height;
    let mut median = Vec::with_capacity(n);
    let mut inpainted = Vec::with_capacity(n);
    let mut mask = Vec::with_capacity(n);
    for i in 0..n {
        let (m, p, k) = match i % 5 {
            0 => (100.0, 100.0, 0.0),
            1 => (100.0, 0.0, 1.0),
            2 => (200.0, 100.0, 1.0),
            3 => (-100.0, 100.0, 1.0),
            _ => (50.0, 100.0, 0.5),
        };
        median.push(m);
        inpainted.push(p);
        mask.push(k);
    }
    let median = Image::new(width, height, median).unwrap();
    let inpainted = Image::new(width, height, inpainted).unwrap();
    let mask = Image::new(width, height, mask).unwrap();

    let (map, stats) = synthesize(&median, &inpainted, &mask).unwrap();

    let per_class = |class: usize| (0..n).filter(|i| i % 5 == class).count();
    assert_eq!(
        stats,
        SynthesisStats {
            untouched: per_class(0),
            ratio_fallbacks: per_class(1),
            clipped_high: per_class(2),
            clipped_low: per_class(3),
        }
    );
    assert_eq!(map.data.len(), n);
    assert_eq!(map.data[0], UNITY);
    assert_eq!(map.data[1], UNITY);
    assert_eq!(map.data[3], 0);
    assert_eq!(map.data[4], 49151);
}
