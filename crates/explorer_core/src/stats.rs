//! Interpretability statistics for a standardized mean difference.
//!
//! Every function here is total over finite inputs and free of side effects.
//! The normal CDF is computed through the error function so results match the
//! closed form `Φ(x) = (1 + erf((x − μ) / (σ√2))) / 2`.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erf;

/// Normal cumulative distribution function with the given mean and standard deviation.
///
/// `sd` is expected to be positive.
pub fn cdf_normal(x: f64, mean: f64, sd: f64) -> f64 {
    (1.0 + erf((x - mean) / (sd * SQRT_2))) / 2.0
}

/// Standard normal CDF, `Φ(x)`.
pub fn standard_normal_cdf(x: f64) -> f64 {
    cdf_normal(x, 0.0, 1.0)
}

/// Probability that a random intervention observation exceeds a random control one.
pub fn probability_of_superiority(d: f64) -> f64 {
    standard_normal_cdf(d / SQRT_2)
}

/// Cohen's U3: share of the control distribution below the intervention mean.
pub fn u3(d: f64) -> f64 {
    standard_normal_cdf(d)
}

/// Overlapping coefficient of two unit-variance normals whose means differ by `d`.
pub fn percent_overlap(d: f64) -> f64 {
    2.0 * standard_normal_cdf(-d.abs() / 2.0)
}

/// Cohen's U1, the proportion of non-overlap.
pub fn u1(d: f64) -> f64 {
    1.0 - 2.0 * standard_normal_cdf(-d.abs() / 2.0)
}

/// Rounds to `digits` decimal places, compensating for binary representation error.
///
/// Values like `1.005` are stored slightly below their decimal spelling; the
/// relative nudge by machine epsilon lets them round the way they read.
pub fn round(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    let nudged = value * scale * (1.0 + f64::EPSILON);
    nudged.round() / scale
}
