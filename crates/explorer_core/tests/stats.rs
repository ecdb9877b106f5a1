use std::f64::consts::SQRT_2;

use explorer_core::stats::{
    cdf_normal, percent_overlap, probability_of_superiority, round, standard_normal_cdf, u1, u3,
};

const GRID: [f64; 9] = [-3.0, -1.2, -0.4, -0.05, 0.0, 0.05, 0.4, 1.2, 3.0];

#[test]
fn superiority_and_u3_are_normal_cdf_identities() {
    for d in GRID {
        assert_eq!(probability_of_superiority(d), cdf_normal(d / SQRT_2, 0.0, 1.0));
        assert_eq!(u3(d), cdf_normal(d, 0.0, 1.0));
    }
    assert!((probability_of_superiority(0.0) - 0.5).abs() < 1e-12);
    assert!((u3(0.0) - 0.5).abs() < 1e-12);
}

#[test]
fn normal_cdf_matches_reference_values() {
    assert!((standard_normal_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-9);
    assert!((standard_normal_cdf(-1.96) - 0.024_997_895_148_220_4).abs() < 1e-9);
}

#[test]
fn u1_is_symmetric_and_zero_at_origin() {
    for d in GRID {
        assert_eq!(u1(d), u1(-d));
    }
    assert_eq!(u1(0.0), 0.0);
}

#[test]
fn overlap_is_complement_of_u1() {
    assert!((percent_overlap(0.0) - 1.0).abs() < 1e-12);
    for d in GRID {
        assert!((percent_overlap(d) + u1(d) - 1.0).abs() < 1e-12);
    }
    assert!(percent_overlap(1.0) < percent_overlap(0.5));
}

#[test]
fn effect_of_point_four_rounds_to_published_values() {
    assert_eq!(round(probability_of_superiority(0.4), 2), 0.61);
    assert_eq!(round(u3(0.4), 2), 0.66);
    assert_eq!(round(u3(0.4) * 100.0, 1), 65.5);
}

#[test]
fn functions_are_total_over_large_inputs() {
    assert!((u3(40.0) - 1.0).abs() < 1e-15);
    assert!(u3(-40.0).abs() < 1e-15);
    assert!(percent_overlap(40.0) >= 0.0);
    assert!(u1(f64::MAX).is_finite());
}
