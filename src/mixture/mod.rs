//! Gaussian mixture modeling via the EM algorithm.
//!
//! This module provides the probabilistic clustering core:
//! - `GaussianMixture`: mixture model fitted by alternating E/M steps
//! - `MultivariateGaussian`: full-covariance normal density
//! - `DegeneracyPolicy`: what to do when a component collapses mid-fit
//!
//! # Examples
//!
//! ## Fitting a mixture
//! ```rust
//! use mixfit::GaussianMixture;
//! use ndarray::array;
//!
//! let x = array![
//!     [0.0, 0.1],
//!     [0.2, 0.0],
//!     [0.1, 0.2],
//!     [4.0, 4.1],
//!     [4.2, 3.9],
//!     [3.9, 4.0]
//! ];
//!
//! let mut gmm = GaussianMixture::new(2, 2).unwrap().random_state(42);
//! gmm.fit(&x).unwrap();
//!
//! // Soft assignments: one probability row per point
//! let proba = gmm.predict_proba(&x).unwrap();
//! assert_eq!(proba.shape(), &[6, 2]);
//!
//! // Hard assignments
//! let labels = gmm.predict(&x).unwrap();
//! println!("Labels: {:?}", labels);
//!
//! // Model quality (higher is better)
//! let ll = gmm.log_likelihood().unwrap();
//! println!("Log-likelihood: {:.4}", ll);
//! ```
//!
//! ## Driving the EM loop by hand
//! ```rust
//! use mixfit::GaussianMixture;
//! use ndarray::array;
//!
//! let x = array![[0.0, 0.0], [0.5, 0.5], [1.0, 0.0], [0.5, 1.0]];
//!
//! let mut gmm = GaussianMixture::new(1, 2).unwrap().random_state(7);
//! gmm.set_data(&x).unwrap();
//!
//! let mut previous = f64::NEG_INFINITY;
//! for _ in 0..20 {
//!     gmm.e_step().unwrap();
//!     gmm.m_step().unwrap();
//!     let ll = gmm.log_likelihood().unwrap();
//!     if (ll - previous).abs() < 1e-8 {
//!         break;
//!     }
//!     previous = ll;
//! }
//!
//! assert!(gmm.iteration() >= 1);
//! ```

mod gaussian;
mod gmm;

pub use gaussian::MultivariateGaussian;
pub use gmm::{DegeneracyPolicy, GaussianMixture};
