pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod error;
pub mod mixture;
pub mod snapshot;
pub mod synthetic;

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

pub use error::{MixtureError, MixtureResult};
pub use mixture::{DegeneracyPolicy, GaussianMixture, MultivariateGaussian};
pub use snapshot::{Frame, MemorySink, NullSink, Snapshot, SnapshotSink};
pub use synthetic::sample_clusters;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_types_work() {
        let vec = Vector::zeros(5);
        let mat = Matrix::zeros((3, 4));
        assert_eq!(vec.len(), 5);
        assert_eq!(mat.shape(), &[3, 4]);
    }
}
