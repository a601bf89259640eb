//! Snapshot recording for visualizing fit convergence.
//!
//! The model knows nothing about rendering. A caller that wants
//! per-iteration convergence frames (scatter plus covariance ellipses,
//! later assembled into an animation) passes a [`SnapshotSink`] to
//! [`GaussianMixture::fit_with`](crate::GaussianMixture::fit_with) and
//! receives one [`Snapshot`] per completed M-step, tagged with the
//! iteration number.

use crate::{Matrix, Vector};

/// Borrowed view of the model state after one EM iteration.
pub struct Snapshot<'a> {
    pub iteration: usize,
    pub weights: &'a Vector,
    pub means: &'a Matrix,
    pub covariances: &'a [Matrix],
    pub log_likelihood: f64,
}

/// Receives one snapshot per EM iteration.
pub trait SnapshotSink {
    fn record(&mut self, snapshot: &Snapshot<'_>);
}

/// Sink that discards every snapshot.
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn record(&mut self, _snapshot: &Snapshot<'_>) {}
}

/// Owned copy of one recorded snapshot.
#[derive(Clone, Debug)]
pub struct Frame {
    pub iteration: usize,
    pub weights: Vector,
    pub means: Matrix,
    pub covariances: Vec<Matrix>,
    pub log_likelihood: f64,
}

/// Sink that keeps every frame in iteration order, for rendering an
/// animation after the fit or for inspecting convergence in tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<Frame>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }
}

impl SnapshotSink for MemorySink {
    fn record(&mut self, snapshot: &Snapshot<'_>) {
        self.frames.push(Frame {
            iteration: snapshot.iteration,
            weights: snapshot.weights.clone(),
            means: snapshot.means.clone(),
            covariances: snapshot.covariances.to_vec(),
            log_likelihood: snapshot.log_likelihood,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GaussianMixture;
    use ndarray::array;

    #[test]
    fn test_memory_sink_collects_frames_in_iteration_order() {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [4.0, 4.0],
            [4.1, 3.9],
            [3.8, 4.2]
        ];

        let mut model = GaussianMixture::new(2, 2)
            .unwrap()
            .random_state(1)
            .max_iter(10);
        let mut sink = MemorySink::new();
        model.fit_with(&x, &mut sink).unwrap();

        assert!(!sink.frames.is_empty());
        for (idx, frame) in sink.frames.iter().enumerate() {
            assert_eq!(frame.iteration, idx + 1);
            assert_eq!(frame.means.shape(), &[2, 2]);
            assert_eq!(frame.covariances.len(), 2);
            assert!(frame.log_likelihood.is_finite());
        }
    }
}
