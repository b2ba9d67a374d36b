//! Sample statistics for the replicate loop.

use serde::{Deserialize, Serialize};

/// z-value of a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub n: usize,
    pub mean: f64,
    pub std_error: f64,
    pub margin_of_error: f64,
    /// `std_error / |mean|`; 0 when the standard error is 0.
    pub coefficient_of_variation: f64,
}

pub fn summarize(sample: &[f64]) -> SampleStats {
    let n = sample.len();
    if n == 0 {
        return SampleStats::default();
    }
    let mean = sample.iter().sum::<f64>() / n as f64;
    let std_error = if n > 1 {
        let var = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        (var / n as f64).sqrt()
    } else {
        0.0
    };
    let coefficient_of_variation = if std_error == 0.0 {
        0.0
    } else if mean == 0.0 {
        f64::INFINITY
    } else {
        std_error / mean.abs()
    };
    SampleStats {
        n,
        mean,
        std_error,
        margin_of_error: Z_95 * std_error,
        coefficient_of_variation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn constant_sample_has_no_spread() {
        let s = summarize(&[4.0; 5]);
        assert_eq!(s.mean, 4.0);
        assert_eq!(s.std_error, 0.0);
        assert_eq!(s.coefficient_of_variation, 0.0);
    }

    #[test]
    fn known_sample() {
        // variance 2.5, se = sqrt(2.5 / 5)
        let s = summarize(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(s.mean, 3.0);
        assert!((s.std_error - 0.5f64.sqrt()).abs() < 1e-12);
        assert!((s.margin_of_error - Z_95 * 0.5f64.sqrt()).abs() < 1e-12);
        assert!((s.coefficient_of_variation - 0.5f64.sqrt() / 3.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn margin_is_scaled_error(sample in prop::collection::vec(-1e3f64..1e3, 2..40)) {
            let s = summarize(&sample);
            prop_assert_eq!(s.n, sample.len());
            prop_assert!(s.std_error >= 0.0);
            prop_assert!((s.margin_of_error - Z_95 * s.std_error).abs() < 1e-9);
            prop_assert!(s.coefficient_of_variation >= 0.0);
        }
    }
}
