//! Synthetic cluster data for driving a fit in absence of real data.
//!
//! Test/demo fixture only: draws `k` cluster centers uniformly inside a
//! domain, scatters isotropic Gaussian points of per-cluster random
//! spread around each, and shuffles the rows.

use crate::error::{MixtureError, MixtureResult};
use crate::{Matrix, Vector};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::{Normal, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Sample `k * points_per_cluster` points from `k` random Gaussian
/// clusters inside `domain`. Returns the shuffled points together with
/// the generating cluster index per point.
///
/// Each cluster's standard deviation is drawn uniformly from
/// `[0.5 * spread, 1.5 * spread]`.
pub fn sample_clusters(
    k: usize,
    dim: usize,
    points_per_cluster: usize,
    domain: (f64, f64),
    spread: f64,
    seed: Option<u64>,
) -> MixtureResult<(Matrix, Vector)> {
    if k == 0 || dim == 0 || points_per_cluster == 0 {
        return Err(MixtureError::InvalidConfiguration {
            reason: format!(
                "k, dim and points_per_cluster must all be >= 1, got ({}, {}, {})",
                k, dim, points_per_cluster
            ),
        });
    }
    let (low, high) = domain;
    if !low.is_finite() || !high.is_finite() || low >= high {
        return Err(MixtureError::InvalidConfiguration {
            reason: format!("domain must be a finite range with low < high, got ({}, {})", low, high),
        });
    }
    if !spread.is_finite() || spread <= 0.0 {
        return Err(MixtureError::InvalidConfiguration {
            reason: format!("spread must be finite and > 0, got {}", spread),
        });
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let n = k * points_per_cluster;
    let centers = Matrix::random_using((k, dim), Uniform::new(low, high), &mut rng);

    let mut points = Matrix::zeros((n, dim));
    let mut labels = Vector::zeros(n);
    for c in 0..k {
        let sd = rng.gen_range(0.5 * spread..=1.5 * spread);
        let noise = Normal::new(0.0, sd).map_err(|_| MixtureError::InvalidConfiguration {
            reason: format!("invalid cluster spread {}", sd),
        })?;
        let scatter = Matrix::random_using((points_per_cluster, dim), noise, &mut rng);

        for p in 0..points_per_cluster {
            let row = c * points_per_cluster + p;
            for d in 0..dim {
                points[[row, d]] = centers[[c, d]] + scatter[[p, d]];
            }
            labels[row] = c as f64;
        }
    }

    // Shuffle rows so cluster membership is not positional.
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let mut shuffled_points = Matrix::zeros((n, dim));
    let mut shuffled_labels = Vector::zeros(n);
    for (dst, &src) in order.iter().enumerate() {
        for d in 0..dim {
            shuffled_points[[dst, d]] = points[[src, d]];
        }
        shuffled_labels[dst] = labels[src];
    }

    Ok((shuffled_points, shuffled_labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_and_label_counts() {
        let (points, labels) = sample_clusters(3, 2, 50, (-5.0, 5.0), 0.5, Some(1)).unwrap();
        assert_eq!(points.shape(), &[150, 2]);
        assert_eq!(labels.len(), 150);

        for c in 0..3 {
            let count = labels.iter().filter(|&&l| l == c as f64).count();
            assert_eq!(count, 50);
        }
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let (a_points, a_labels) = sample_clusters(2, 2, 30, (-3.0, 3.0), 0.4, Some(9)).unwrap();
        let (b_points, b_labels) = sample_clusters(2, 2, 30, (-3.0, 3.0), 0.4, Some(9)).unwrap();
        assert_eq!(a_points, b_points);
        assert_eq!(a_labels, b_labels);
    }

    #[test]
    fn test_points_stay_near_their_centers() {
        // With a tight spread relative to the domain, points drawn from a
        // cluster stay within a few standard deviations of some center.
        let (points, _) = sample_clusters(2, 2, 40, (-10.0, 10.0), 0.2, Some(4)).unwrap();
        for row in points.outer_iter() {
            for &v in row {
                assert!(v > -12.0 && v < 12.0);
            }
        }
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            sample_clusters(0, 2, 10, (-1.0, 1.0), 0.5, None),
            Err(MixtureError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            sample_clusters(2, 2, 10, (1.0, -1.0), 0.5, None),
            Err(MixtureError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            sample_clusters(2, 2, 10, (-1.0, 1.0), 0.0, None),
            Err(MixtureError::InvalidConfiguration { .. })
        ));
    }
}
