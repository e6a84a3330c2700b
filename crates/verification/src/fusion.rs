//! Probability fusion

/// Element-wise mean of equally sized distributions.
///
/// Returns an empty vector when there is nothing to fuse.
pub fn mean_distribution(distributions: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = distributions.first() else {
        return Vec::new();
    };

    let mut sum = vec![0.0; first.len()];
    for dist in distributions {
        for (acc, p) in sum.iter_mut().zip(dist) {
            *acc += p;
        }
    }

    let n = distributions.len() as f64;
    sum.into_iter().map(|s| s / n).collect()
}

/// Probability as a percentage rounded to two decimals
pub fn to_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_of_two_models() {
        let fused = mean_distribution(&[vec![0.9, 0.1], vec![0.5, 0.5]]);
        assert!((fused[0] - 0.7).abs() < 1e-12);
        assert!((fused[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        assert!(mean_distribution(&[]).is_empty());
    }

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent(0.7), 70.0);
        assert_eq!(to_percent(0.699), 69.9);
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(1.0), 100.0);
    }

    fn distribution(classes: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0..1.0f64, classes)
    }

    proptest! {
        #[test]
        fn prop_fusion_is_order_independent(
            dists in prop::collection::vec(distribution(4), 1..6),
            rotate in 0usize..6,
        ) {
            let mut permuted = dists.clone();
            let len = permuted.len();
            permuted.rotate_left(rotate % len);
            permuted.reverse();

            let a = mean_distribution(&dists);
            let b = mean_distribution(&permuted);
            for (x, y) in a.iter().zip(&b) {
                prop_assert!((x - y).abs() < 1e-12);
            }
        }
    }
}
