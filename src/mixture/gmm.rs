use crate::error::{MixtureError, MixtureResult};
use crate::mixture::gaussian::{MultivariateGaussian, log_sum_exp};
use crate::snapshot::{NullSink, Snapshot, SnapshotSink};
use crate::{Matrix, Vector};
use ndarray::Axis;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

/// Effective responsibility mass below which a component counts as
/// collapsed.
const MASS_FLOOR: f64 = 1e-10;

/// What to do when a component collapses mid-fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegeneracyPolicy {
    /// Resample the component's mean in the init domain, reset its
    /// covariance to identity, give it a uniform prior share, and keep
    /// iterating. Re-draws are logged at WARN.
    Reinitialize,
    /// Surface `NumericDegeneracy` to the caller.
    Fail,
}

#[derive(Clone, Debug)]
pub struct GaussianMixture {
    k: usize,
    dim: usize,
    domain: (f64, f64),
    max_iter: usize,
    tol: f64,
    reg_covar: f64,
    policy: DegeneracyPolicy,
    random_state: Option<u64>,
    rng: StdRng,
    weights: Vector,
    means: Matrix,
    covariances: Vec<Matrix>,
    data: Option<Matrix>,
    responsibilities: Option<Matrix>,
    iteration: usize,
    converged: bool,
}

impl GaussianMixture {
    pub fn new(k: usize, dim: usize) -> MixtureResult<Self> {
        if k == 0 {
            return Err(MixtureError::InvalidConfiguration {
                reason: format!("number of components must be >= 1, got {}", k),
            });
        }
        if dim == 0 {
            return Err(MixtureError::InvalidConfiguration {
                reason: format!("dimensionality must be >= 1, got {}", dim),
            });
        }

        let mut model = Self {
            k,
            dim,
            domain: (-5.0, 5.0),
            max_iter: 100,
            tol: 1e-6,
            reg_covar: 1e-6,
            policy: DegeneracyPolicy::Reinitialize,
            random_state: None,
            rng: StdRng::from_entropy(),
            weights: Vector::zeros(k),
            means: Matrix::zeros((k, dim)),
            covariances: Vec::new(),
            data: None,
            responsibilities: None,
            iteration: 0,
            converged: false,
        };
        model.initialize_parameters();
        Ok(model)
    }

    pub fn domain(mut self, low: f64, high: f64) -> MixtureResult<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(MixtureError::InvalidConfiguration {
                reason: format!("domain must be a finite range with low < high, got ({}, {})", low, high),
            });
        }
        self.domain = (low, high);
        self.initialize_parameters();
        Ok(self)
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.initialize_parameters();
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tol = tolerance;
        self
    }

    pub fn reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    pub fn degeneracy_policy(mut self, policy: DegeneracyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn n_components(&self) -> usize {
        self.k
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn weights(&self) -> &Vector {
        &self.weights
    }

    pub fn means(&self) -> &Matrix {
        &self.means
    }

    pub fn covariances(&self) -> &[Matrix] {
        &self.covariances
    }

    pub fn data(&self) -> Option<&Matrix> {
        self.data.as_ref()
    }

    pub fn responsibilities(&self) -> Option<&Matrix> {
        self.responsibilities.as_ref()
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Bind a dataset for a fit run. Resets responsibilities, the
    /// iteration counter, and the convergence flag.
    pub fn set_data(&mut self, x: &Matrix) -> MixtureResult<()> {
        if x.ncols() != self.dim {
            return Err(MixtureError::DimensionMismatch {
                expected: self.dim,
                found: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Err(MixtureError::InvalidConfiguration {
                reason: "input matrix must have at least one sample".to_string(),
            });
        }

        self.responsibilities = Some(Matrix::zeros((x.nrows(), self.k)));
        self.data = Some(x.clone());
        self.iteration = 0;
        self.converged = false;
        Ok(())
    }

    /// Fit the model to `x` with the configured iteration cap and
    /// log-likelihood tolerance.
    pub fn fit(&mut self, x: &Matrix) -> MixtureResult<()> {
        let mut sink = NullSink;
        self.fit_with(x, &mut sink)
    }

    /// Fit the model, recording a snapshot after every M-step so a caller
    /// can render per-iteration convergence frames.
    pub fn fit_with<S: SnapshotSink>(&mut self, x: &Matrix, sink: &mut S) -> MixtureResult<()> {
        self.set_data(x)?;

        let mut previous = f64::NEG_INFINITY;
        for _ in 0..self.max_iter {
            self.e_step()?;
            self.m_step()?;

            let log_likelihood = self.log_likelihood()?;
            debug!(
                iteration = self.iteration,
                log_likelihood, "completed EM iteration"
            );
            sink.record(&Snapshot {
                iteration: self.iteration,
                weights: &self.weights,
                means: &self.means,
                covariances: &self.covariances,
                log_likelihood,
            });

            if (log_likelihood - previous).abs() < self.tol {
                self.converged = true;
                break;
            }
            previous = log_likelihood;
        }

        Ok(())
    }

    /// E-step: refresh the responsibility matrix from the bound data and
    /// the current parameters.
    ///
    /// Each row is a max-shifted softmax over `log pi[i] + log_pdf(x)`,
    /// equal to normalizing `pi[i] * density(x)` wherever that is finite.
    /// A row where every component underflows to zero density is handled
    /// per the degeneracy policy.
    pub fn e_step(&mut self) -> MixtureResult<()> {
        if self.data.is_none() {
            return Err(MixtureError::NotFitted);
        }
        let components = self.component_densities()?;

        let data = self.data.as_ref().ok_or(MixtureError::NotFitted)?;
        let n = data.nrows();
        let k = self.k;
        let uniform = 1.0 / k as f64;

        let mut responsibilities = Matrix::zeros((n, k));
        let mut log_joint = vec![0.0; k];
        for (p, x) in data.outer_iter().enumerate() {
            for i in 0..k {
                log_joint[i] = self.weights[i].ln() + components[i].log_pdf(&x);
            }
            let max = log_joint.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            if max == f64::NEG_INFINITY {
                // Every component assigns zero density to this point.
                match self.policy {
                    DegeneracyPolicy::Fail => {
                        return Err(MixtureError::NumericDegeneracy {
                            reason: format!("no component assigns density to point {}", p),
                        });
                    }
                    DegeneracyPolicy::Reinitialize => {
                        for i in 0..k {
                            responsibilities[[p, i]] = uniform;
                        }
                        continue;
                    }
                }
            }

            let mut total = 0.0;
            for i in 0..k {
                let v = (log_joint[i] - max).exp();
                responsibilities[[p, i]] = v;
                total += v;
            }
            for i in 0..k {
                responsibilities[[p, i]] /= total;
            }
        }

        self.responsibilities = Some(responsibilities);
        Ok(())
    }

    /// M-step: re-estimate weights, means, and covariances from the
    /// current responsibilities, then increment the iteration counter.
    ///
    /// Covariances use the freshly updated means, and every covariance
    /// gets `reg_covar` added to its diagonal.
    pub fn m_step(&mut self) -> MixtureResult<()> {
        let data = self.data.as_ref().ok_or(MixtureError::NotFitted)?;
        let responsibilities = self.responsibilities.as_ref().ok_or(MixtureError::NotFitted)?;
        let n = data.nrows();
        let k = self.k;
        let dim = self.dim;

        // Effective counts per component.
        let mass = responsibilities.sum_axis(Axis(0));
        let collapsed: Vec<usize> = (0..k).filter(|&i| mass[i] <= MASS_FLOOR).collect();
        if !collapsed.is_empty() && self.policy == DegeneracyPolicy::Fail {
            return Err(MixtureError::NumericDegeneracy {
                reason: format!("components {:?} received no responsibility mass", collapsed),
            });
        }

        let mut weights = &mass / n as f64;

        // Weighted means: resp' (k x n) . data (n x dim).
        let mut means = responsibilities.t().dot(data);
        for i in 0..k {
            if collapsed.contains(&i) {
                continue;
            }
            let m = mass[i];
            means.row_mut(i).mapv_inplace(|v| v / m);
        }

        // Weighted covariances around the new means.
        let mut covariances = Vec::with_capacity(k);
        for i in 0..k {
            if collapsed.contains(&i) {
                covariances.push(Matrix::eye(dim));
                continue;
            }
            let mut cov = Matrix::zeros((dim, dim));
            for (p, x) in data.outer_iter().enumerate() {
                let r = responsibilities[[p, i]];
                if r == 0.0 {
                    continue;
                }
                for a in 0..dim {
                    let da = x[a] - means[[i, a]];
                    for b in 0..dim {
                        cov[[a, b]] += r * da * (x[b] - means[[i, b]]);
                    }
                }
            }
            let m = mass[i];
            cov.mapv_inplace(|v| v / m);
            for a in 0..dim {
                cov[[a, a]] += self.reg_covar;
            }
            covariances.push(cov);
        }

        if !collapsed.is_empty() {
            let share = 1.0 / k as f64;
            for &i in &collapsed {
                weights[i] = share;
            }
        }

        self.weights = weights;
        self.means = means;
        self.covariances = covariances;

        if !collapsed.is_empty() {
            for &i in &collapsed {
                warn!(component = i, "component collapsed, reinitializing");
                self.reinitialize_component(i);
            }
            let total = self.weights.sum();
            self.weights.mapv_inplace(|w| w / total);
        }

        self.iteration += 1;
        Ok(())
    }

    /// Total log-likelihood of the bound data under the current
    /// parameters. Read-only.
    ///
    /// A point with zero total density contributes negative infinity,
    /// never NaN.
    pub fn log_likelihood(&self) -> MixtureResult<f64> {
        let data = self.data.as_ref().ok_or(MixtureError::NotFitted)?;
        let components = self.read_component_densities()?;

        let mut log_likelihood = 0.0;
        let mut terms = vec![0.0; self.k];
        for x in data.outer_iter() {
            for i in 0..self.k {
                terms[i] = self.weights[i].ln() + components[i].log_pdf(&x);
            }
            log_likelihood += log_sum_exp(&terms);
        }
        Ok(log_likelihood)
    }

    /// Posterior component probabilities for arbitrary points. Read-only.
    pub fn predict_proba(&self, x: &Matrix) -> MixtureResult<Matrix> {
        if x.ncols() != self.dim {
            return Err(MixtureError::DimensionMismatch {
                expected: self.dim,
                found: x.ncols(),
            });
        }
        let components = self.read_component_densities()?;
        let k = self.k;
        let uniform = 1.0 / k as f64;

        let mut proba = Matrix::zeros((x.nrows(), k));
        let mut log_joint = vec![0.0; k];
        for (p, point) in x.outer_iter().enumerate() {
            for i in 0..k {
                log_joint[i] = self.weights[i].ln() + components[i].log_pdf(&point);
            }
            let max = log_joint.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            if max == f64::NEG_INFINITY {
                match self.policy {
                    DegeneracyPolicy::Fail => {
                        return Err(MixtureError::NumericDegeneracy {
                            reason: format!("no component assigns density to point {}", p),
                        });
                    }
                    DegeneracyPolicy::Reinitialize => {
                        for i in 0..k {
                            proba[[p, i]] = uniform;
                        }
                        continue;
                    }
                }
            }

            let mut total = 0.0;
            for i in 0..k {
                let v = (log_joint[i] - max).exp();
                proba[[p, i]] = v;
                total += v;
            }
            for i in 0..k {
                proba[[p, i]] /= total;
            }
        }
        Ok(proba)
    }

    /// Most likely component per point.
    pub fn predict(&self, x: &Matrix) -> MixtureResult<Vector> {
        let proba = self.predict_proba(x)?;

        let mut labels = Vector::zeros(x.nrows());
        for (p, row) in proba.outer_iter().enumerate() {
            let mut best = 0;
            let mut best_p = f64::NEG_INFINITY;
            for (i, &v) in row.iter().enumerate() {
                if v > best_p {
                    best_p = v;
                    best = i;
                }
            }
            labels[p] = best as f64;
        }
        Ok(labels)
    }

    /// Mean per-point log-likelihood of `x` under the current parameters.
    pub fn score(&self, x: &Matrix) -> MixtureResult<f64> {
        if x.ncols() != self.dim {
            return Err(MixtureError::DimensionMismatch {
                expected: self.dim,
                found: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Err(MixtureError::InvalidConfiguration {
                reason: "input matrix must have at least one sample".to_string(),
            });
        }
        let components = self.read_component_densities()?;

        let mut total = 0.0;
        let mut terms = vec![0.0; self.k];
        for point in x.outer_iter() {
            for i in 0..self.k {
                terms[i] = self.weights[i].ln() + components[i].log_pdf(&point);
            }
            total += log_sum_exp(&terms);
        }
        Ok(total / x.nrows() as f64)
    }

    /// Draw a fresh parameter set: means uniform in the domain, identity
    /// covariances, uniform weights. A pure function of
    /// (random_state, k, dim, domain).
    fn initialize_parameters(&mut self) {
        self.rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (low, high) = self.domain;
        self.means = Matrix::random_using((self.k, self.dim), Uniform::new(low, high), &mut self.rng);
        self.covariances = (0..self.k).map(|_| Matrix::eye(self.dim)).collect();
        self.weights = Vector::from_elem(self.k, 1.0 / self.k as f64);
        self.data = None;
        self.responsibilities = None;
        self.iteration = 0;
        self.converged = false;
    }

    fn reinitialize_component(&mut self, i: usize) {
        let (low, high) = self.domain;
        let mean = Vector::random_using(self.dim, Uniform::new(low, high), &mut self.rng);
        self.means.row_mut(i).assign(&mean);
        self.covariances[i] = Matrix::eye(self.dim);
    }

    /// Build per-component densities, re-drawing a component whose
    /// covariance lost positive-definiteness when the policy allows it.
    fn component_densities(&mut self) -> MixtureResult<Vec<MultivariateGaussian>> {
        let mut components = Vec::with_capacity(self.k);
        for i in 0..self.k {
            let built = MultivariateGaussian::new(
                self.means.row(i).to_owned(),
                self.covariances[i].clone(),
            );
            let component = match built {
                Ok(c) => c,
                Err(MixtureError::NumericDegeneracy { .. })
                    if self.policy == DegeneracyPolicy::Reinitialize =>
                {
                    warn!(component = i, "covariance lost positive-definiteness, reinitializing");
                    self.reinitialize_component(i);
                    MultivariateGaussian::new(
                        self.means.row(i).to_owned(),
                        self.covariances[i].clone(),
                    )?
                }
                Err(e) => return Err(e),
            };
            components.push(component);
        }
        Ok(components)
    }

    /// Read-only variant for queries: degeneracy always surfaces.
    fn read_component_densities(&self) -> MixtureResult<Vec<MultivariateGaussian>> {
        (0..self.k)
            .map(|i| {
                MultivariateGaussian::new(
                    self.means.row(i).to_owned(),
                    self.covariances[i].clone(),
                )
            })
            .collect()
    }
}
