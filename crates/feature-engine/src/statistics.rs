//! Statistical Features Computation

/// Coerce a possibly missing or non-finite value to a usable number
#[inline]
pub fn safe_float(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Relative spread below which a channel counts as constant (ten times
/// the f64 decimal resolution)
const CONSTANT_TOLERANCE: f64 = 1e-14;

/// The ten per-channel statistics fed to the classifiers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelStatistics {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    /// Population standard deviation
    pub std: f64,
    pub median: f64,
    /// 75th minus 25th percentile
    pub iqr: f64,
    /// Bias-corrected sample skewness (0 when fewer than 3 values)
    pub skew: f64,
    /// Bias-corrected excess kurtosis (0 when fewer than 4 values)
    pub kurtosis: f64,
    /// Coefficient of variation, std / mean
    pub cv: f64,
    /// Sum of squares
    pub energy: f64,
}

impl ChannelStatistics {
    /// Compute statistics over every value, zeros included.
    ///
    /// An all-zero (or empty) channel yields all zeros. Every field is passed
    /// through [`safe_float`] so the result is always finite.
    pub fn compute(values: &[f64]) -> Self {
        if values.iter().all(|&v| v == 0.0) {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let std = m2.sqrt();

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = percentile(&sorted, 50.0);
        let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);

        // A numerically constant channel has undefined shape moments
        let constant = m2 <= (CONSTANT_TOLERANCE * mean).powi(2);

        let skew = if values.len() >= 3 && !constant {
            let g1 = m3 / m2.powf(1.5);
            g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
        } else {
            0.0
        };

        let kurtosis = if values.len() >= 4 && !constant {
            ((n * n - 1.0) * m4 / (m2 * m2) - 3.0 * (n - 1.0).powi(2))
                / ((n - 2.0) * (n - 3.0))
        } else {
            0.0
        };

        let cv = if mean != 0.0 { std / mean } else { 0.0 };
        let energy = values.iter().map(|v| v * v).sum::<f64>();

        Self {
            min: safe_float(Some(min)),
            mean: safe_float(Some(mean)),
            max: safe_float(Some(max)),
            std: safe_float(Some(std)),
            median: safe_float(Some(median)),
            iqr: safe_float(Some(iqr)),
            skew: safe_float(Some(skew)),
            kurtosis: safe_float(Some(kurtosis)),
            cv: safe_float(Some(cv)),
            energy: safe_float(Some(energy)),
        }
    }

    /// Values in feature-key order: min, mean, max, std, median, iqr, skew,
    /// kurtosis, cv, energy
    pub fn to_array(&self) -> [f64; 10] {
        [
            self.min,
            self.mean,
            self.max,
            self.std,
            self.median,
            self.iqr,
            self.skew,
            self.kurtosis,
            self.cv,
            self.energy,
        ]
    }
}

/// Linear-interpolation percentile over an ascending slice
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = q / 100.0 * (len - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_values() {
        let stats = ChannelStatistics::compute(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        assert!(close(stats.min, 1.0));
        assert!(close(stats.max, 10.0));
        assert!(close(stats.mean, 4.0));
        assert!(close(stats.std, 10f64.sqrt()));
        assert!(close(stats.median, 3.0));
        assert!(close(stats.iqr, 2.0));
        assert!(close(stats.skew, 1.697_056_274_847_714_3));
        assert!(close(stats.kurtosis, 3.152));
        assert!(close(stats.cv, 0.790_569_415_042_094_9));
        assert!(close(stats.energy, 130.0));
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(close(percentile(&sorted, 25.0), 1.75));
        assert!(close(percentile(&sorted, 50.0), 2.5));
        assert!(close(percentile(&sorted, 75.0), 3.25));
    }

    #[test]
    fn test_all_zero_channel() {
        let stats = ChannelStatistics::compute(&[0.0; 10]);
        assert_eq!(stats, ChannelStatistics::default());
    }

    #[test]
    fn test_short_series_shape_moments() {
        let two = ChannelStatistics::compute(&[1.0, 5.0]);
        assert_eq!(two.skew, 0.0);
        assert_eq!(two.kurtosis, 0.0);

        let three = ChannelStatistics::compute(&[1.0, 2.0, 9.0]);
        assert!(three.skew > 0.0);
        assert_eq!(three.kurtosis, 0.0);
    }

    #[test]
    fn test_constant_nonzero_channel() {
        let stats = ChannelStatistics::compute(&[2.5; 6]);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.skew, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
        assert_eq!(stats.cv, 0.0);
        assert!(close(stats.energy, 37.5));
    }

    #[test]
    fn test_near_constant_channel_has_no_shape_moments() {
        // readings a few ulps apart: spread well under 1e-14 of the mean
        let stats = ChannelStatistics::compute(&[100.0, 100.0 + 1e-12, 100.0, 100.0, 100.0 + 2e-12]);
        assert!(stats.std > 0.0);
        assert_eq!(stats.skew, 0.0);
        assert_eq!(stats.kurtosis, 0.0);

        let spread = ChannelStatistics::compute(&[100.0, 100.0 + 1e-9, 100.0, 100.0, 100.0 + 2e-9]);
        assert!(spread.skew > 0.0);
    }

    #[test]
    fn test_negative_mean_cv() {
        let stats = ChannelStatistics::compute(&[-2.0, -4.0]);
        assert!(close(stats.cv, -1.0 / 3.0));
    }

    #[test]
    fn test_safe_float() {
        assert_eq!(safe_float(None), 0.0);
        assert_eq!(safe_float(Some(f64::NAN)), 0.0);
        assert_eq!(safe_float(Some(f64::INFINITY)), 0.0);
        assert_eq!(safe_float(Some(-3.5)), -3.5);
    }
}
