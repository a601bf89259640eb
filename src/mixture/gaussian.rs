//! Multivariate Gaussian density used for mixture components.

use crate::error::{MixtureError, MixtureResult};
use crate::{Matrix, Vector};
use ndarray::ArrayView1;
use ndarray_rand::rand_distr::StandardNormal;
use rand::Rng;
use std::f64::consts::PI;

/// Numerically stable `log(sum(exp(x)))` over a slice.
///
/// Returns negative infinity for an empty slice or when every entry is
/// negative infinity.
pub(crate) fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

/// A multivariate normal distribution with full covariance.
///
/// The covariance is factored once at construction; density evaluation
/// reuses the cached Cholesky factor and log-determinant.
#[derive(Debug, Clone)]
pub struct MultivariateGaussian {
    mean: Vector,
    covariance: Matrix,
    /// Lower-triangular Cholesky factor of the covariance.
    chol: Matrix,
    /// Log-determinant of the covariance.
    log_det: f64,
}

impl MultivariateGaussian {
    /// Create a distribution after validating shapes and factoring the
    /// covariance.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the covariance is not square with side
    /// `mean.len()`; `NumericDegeneracy` if it is not positive definite.
    pub fn new(mean: Vector, covariance: Matrix) -> MixtureResult<Self> {
        if covariance.nrows() != covariance.ncols() {
            return Err(MixtureError::DimensionMismatch {
                expected: covariance.nrows(),
                found: covariance.ncols(),
            });
        }
        if covariance.nrows() != mean.len() {
            return Err(MixtureError::DimensionMismatch {
                expected: mean.len(),
                found: covariance.nrows(),
            });
        }

        let chol = cholesky(&covariance)?;
        let log_det = 2.0 * chol.diag().iter().map(|l| l.ln()).sum::<f64>();

        Ok(Self {
            mean,
            covariance,
            chol,
            log_det,
        })
    }

    /// Create with identity covariance (useful for initialization).
    pub fn with_identity(mean: Vector) -> Self {
        let d = mean.len();
        Self {
            mean,
            covariance: Matrix::eye(d),
            chol: Matrix::eye(d),
            log_det: 0.0,
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Vector {
        &self.mean
    }

    pub fn covariance(&self) -> &Matrix {
        &self.covariance
    }

    /// Log probability density at a point of length `dim`.
    pub fn log_pdf(&self, x: &ArrayView1<'_, f64>) -> f64 {
        let d = self.dim();
        // Solve L z = (x - mean); the Mahalanobis form is then z . z.
        let mut z = vec![0.0; d];
        for i in 0..d {
            let mut s = x[i] - self.mean[i];
            for j in 0..i {
                s -= self.chol[[i, j]] * z[j];
            }
            z[i] = s / self.chol[[i, i]];
        }
        let mahalanobis: f64 = z.iter().map(|v| v * v).sum();

        -0.5 * (d as f64 * (2.0 * PI).ln() + self.log_det + mahalanobis)
    }

    /// Probability density at a point.
    pub fn pdf(&self, x: &ArrayView1<'_, f64>) -> f64 {
        self.log_pdf(x).exp()
    }

    /// Draw one sample as `mean + L z` with standard-normal `z`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vector {
        let d = self.dim();
        let z: Vec<f64> = (0..d).map(|_| rng.sample(StandardNormal)).collect();

        let mut out = self.mean.clone();
        for i in 0..d {
            for j in 0..=i {
                out[i] += self.chol[[i, j]] * z[j];
            }
        }
        out
    }
}

/// Lower-triangular Cholesky factorization of a symmetric matrix.
///
/// Fails with `NumericDegeneracy` when the matrix is not positive
/// definite (a collapsed covariance).
fn cholesky(m: &Matrix) -> MixtureResult<Matrix> {
    let d = m.nrows();
    let mut l = Matrix::zeros((d, d));

    for j in 0..d {
        let mut diag = m[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(MixtureError::NumericDegeneracy {
                reason: format!("covariance is not positive definite at pivot {}", j),
            });
        }
        l[[j, j]] = diag.sqrt();

        for i in (j + 1)..d {
            let mut s = m[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / l[[j, j]];
        }
    }

    Ok(l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_standard_normal_density_at_origin() {
        let g = MultivariateGaussian::with_identity(array![0.0, 0.0]);
        // 2-D standard normal density at the origin is 1 / (2 pi).
        let expected = 1.0 / (2.0 * PI);
        assert!((g.pdf(&array![0.0, 0.0].view()) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_pdf_highest_at_mean() {
        let g = MultivariateGaussian::with_identity(array![1.0, -1.0]);
        let at_mean = g.pdf(&array![1.0, -1.0].view());
        let away = g.pdf(&array![2.0, 0.0].view());
        assert!(at_mean > away);
    }

    #[test]
    fn test_log_pdf_with_correlated_covariance() {
        let cov = array![[2.0, 1.0], [1.0, 2.0]];
        let g = MultivariateGaussian::new(array![0.0, 0.0], cov).unwrap();

        // det = 3, and (1,1)' Sigma^-1 (1,1) = 2/3.
        let expected = -0.5 * (2.0 * (2.0 * PI).ln() + 3.0_f64.ln() + 2.0 / 3.0);
        let got = g.log_pdf(&array![1.0, 1.0].view());
        assert!((got - expected).abs() < 1e-12, "got {}", got);
    }

    #[test]
    fn test_rejects_non_positive_definite() {
        let cov = array![[1.0, 2.0], [2.0, 1.0]]; // eigenvalues 3 and -1
        let result = MultivariateGaussian::new(array![0.0, 0.0], cov);
        assert!(matches!(
            result,
            Err(MixtureError::NumericDegeneracy { .. })
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let cov = Matrix::eye(3);
        let result = MultivariateGaussian::new(array![0.0, 0.0], cov);
        assert!(matches!(
            result,
            Err(MixtureError::DimensionMismatch { .. })
        ));

        let rect = Matrix::zeros((2, 3));
        let result = MultivariateGaussian::new(array![0.0, 0.0], rect);
        assert!(matches!(
            result,
            Err(MixtureError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_sample_shape_and_spread() {
        let g = MultivariateGaussian::new(
            array![3.0, -2.0],
            array![[0.25, 0.0], [0.0, 0.25]],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let n = 2000;
        let mut sum = Vector::zeros(2);
        for _ in 0..n {
            let s = g.sample(&mut rng);
            assert_eq!(s.len(), 2);
            sum += &s;
        }
        let empirical_mean = sum / n as f64;
        assert!((empirical_mean[0] - 3.0).abs() < 0.1);
        assert!((empirical_mean[1] + 2.0).abs() < 0.1);
    }

    #[test]
    fn test_log_sum_exp() {
        assert!((log_sum_exp(&[0.0, 0.0]) - 2.0_f64.ln()).abs() < 1e-12);
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
        assert_eq!(
            log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
        // A huge shift must not overflow.
        let shifted = log_sum_exp(&[1000.0, 1000.0]);
        assert!((shifted - (1000.0 + 2.0_f64.ln())).abs() < 1e-9);
    }
}
