//! Small statistics helpers shared by the analyzer and the calibrator.
//!
//! Everything operates on the first-difference sequence of a signal, which
//! is where frame-to-frame fluctuation shows up.

use statrs::statistics::Statistics;

/// First differences of a sample sequence: `out[i] = values[i+1] - values[i]`.
///
/// Returns an empty vector for sequences shorter than 2.
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Population variance of a sample sequence.
///
/// Returns 0.0 for sequences shorter than 2 rather than NaN.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_variance()
}

/// Fisher-Pearson skewness (third standardized moment) of a sample sequence.
///
/// Returns `None` when the skewness is undefined: fewer than 2 samples, or a
/// zero-variance sequence. Callers decide what "undefined" means for them;
/// NaN is never produced.
pub fn fisher_pearson_skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let mean = values.iter().mean();
    let m2 = values.iter().population_variance();
    if m2 <= f64::EPSILON {
        return None;
    }

    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / values.len() as f64;
    Some(m3 / m2.powf(1.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_differences() {
        assert_eq!(first_differences(&[1.0, 4.0, 2.0]), vec![3.0, -2.0]);
        assert!(first_differences(&[5.0]).is_empty());
        assert!(first_differences(&[]).is_empty());
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        // Symmetric around the mean: skewness should be ~0.
        let skew = fisher_pearson_skewness(&[-2.0, -1.0, 0.0, 1.0, 2.0]).unwrap();
        assert!(skew.abs() < 1e-12);
    }

    #[test]
    fn test_skewness_right_tail_positive() {
        let skew = fisher_pearson_skewness(&[0.0, 0.0, 0.0, 0.0, 10.0]).unwrap();
        assert!(skew > 1.0);
    }

    #[test]
    fn test_skewness_undefined_cases() {
        assert!(fisher_pearson_skewness(&[]).is_none());
        assert!(fisher_pearson_skewness(&[3.0]).is_none());
        // Zero variance: undefined, not NaN.
        assert!(fisher_pearson_skewness(&[7.0, 7.0, 7.0]).is_none());
    }

    #[test]
    fn test_population_variance() {
        let var = population_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((var - 4.0).abs() < 1e-12);
        assert_eq!(population_variance(&[1.0]), 0.0);
    }
}
