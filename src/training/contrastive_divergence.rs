use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, linalg};
use rand::Rng;

use crate::{
    Result,
    arch::{
        Rbm,
        sampling::{hidden_given_visible, hidden_probabilities, visible_probabilities},
    },
};

/// An estimate of the log-likelihood gradient of an `Rbm`, averaged over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    dw: Array2<f32>,
    dvb: Array1<f32>,
    dhb: Array1<f32>,
}

impl Gradient {
    /// Creates a new `Gradient`.
    ///
    /// # Arguments
    /// * `dw` - The weights' gradient, shaped `(hidden_count, visible_count)`.
    /// * `dvb` - The visible bias' gradient.
    /// * `dhb` - The hidden bias' gradient.
    ///
    /// # Returns
    /// A new `Gradient` instance.
    pub fn new(dw: Array2<f32>, dvb: Array1<f32>, dhb: Array1<f32>) -> Self {
        Self { dw, dvb, dhb }
    }

    /// Returns views of the weights', visible bias' and hidden bias' gradients.
    pub fn parts(&self) -> (ArrayView2<'_, f32>, ArrayView1<'_, f32>, ArrayView1<'_, f32>) {
        (self.dw.view(), self.dvb.view(), self.dhb.view())
    }
}

/// One step contrastive divergence (CD-1).
///
/// The positive statistics come from the observed batch, the negative ones from its
/// reconstruction after a single Gibbs round trip. The hidden layer is sampled on the way
/// down, the reconstruction and the negative hidden statistics are kept as probabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContrastiveDivergence;

impl ContrastiveDivergence {
    /// Returns a new `ContrastiveDivergence`.
    pub fn new() -> Self {
        Self
    }

    /// Estimates the gradient over a batch without updating the model.
    ///
    /// # Arguments
    /// * `rbm` - The model.
    /// * `v0` - The observed batch, shaped `(batch_size, visible_count)`.
    /// * `rng` - The random source for the hidden sample.
    ///
    /// # Returns
    /// The gradient and the reconstruction of `v0`, or an error if the batch is invalid.
    pub fn gradient<R: Rng + ?Sized>(
        &self,
        rbm: &Rbm,
        v0: ArrayView2<f32>,
        rng: &mut R,
    ) -> Result<(Gradient, Array2<f32>)> {
        let positive = hidden_given_visible(rbm, v0, rng)?;
        let v1 = visible_probabilities(rbm, positive.sample.view())?;
        let ph1 = hidden_probabilities(rbm, v1.view())?;

        let scale = 1. / v0.nrows() as f32;
        let ph0 = positive.probs;

        let mut dw = Array2::zeros((rbm.hidden_count(), rbm.visible_count()));
        linalg::general_mat_mul(scale, &ph0.t(), &v0, 0.0, &mut dw);
        linalg::general_mat_mul(-scale, &ph1.t(), &v1, 1.0, &mut dw);

        let dvb = (&v0 - &v1).sum_axis(Axis(0)) * scale;
        let dhb = (&ph0 - &ph1).sum_axis(Axis(0)) * scale;

        Ok((Gradient::new(dw, dvb, dhb), v1))
    }

    /// Estimates the gradient over a batch and takes an ascent step with it.
    ///
    /// Nothing is written to the model unless the whole batch is valid.
    ///
    /// # Arguments
    /// * `rbm` - The model to update.
    /// * `v0` - The observed batch, shaped `(batch_size, visible_count)`.
    /// * `rng` - The random source for the hidden sample.
    ///
    /// # Returns
    /// The reconstruction of `v0`, used by callers to measure the loss.
    pub fn step<R: Rng + ?Sized>(
        &self,
        rbm: &mut Rbm,
        v0: ArrayView2<f32>,
        rng: &mut R,
    ) -> Result<Array2<f32>> {
        let (grad, v1) = self.gradient(rbm, v0, rng)?;
        rbm.update_params(&grad)?;
        Ok(v1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RbmErr, arch::ComputeTarget};
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn zero_model_gradient_matches_the_closed_form() {
        let rbm = Rbm::zeros(2, 1, 1., ComputeTarget::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let (grad, v1) = ContrastiveDivergence
            .gradient(&rbm, array![[1., 1.]].view(), &mut rng)
            .unwrap();

        // Every probability of a zero model is one half, whatever the hidden sample.
        assert_eq!(v1, array![[0.5, 0.5]]);
        assert_eq!(
            grad,
            Gradient::new(array![[0.25, 0.25]], array![0.5, 0.5], array![0.])
        );
    }

    #[test]
    fn gradient_is_averaged_over_the_batch() {
        let rbm = Rbm::zeros(2, 1, 1., ComputeTarget::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let (single, _) = ContrastiveDivergence
            .gradient(&rbm, array![[1., 0.]].view(), &mut rng)
            .unwrap();
        let (repeated, _) = ContrastiveDivergence
            .gradient(&rbm, array![[1., 0.], [1., 0.], [1., 0.]].view(), &mut rng)
            .unwrap();

        let (sw, svb, shb) = single.parts();
        let (rw, rvb, rhb) = repeated.parts();
        let pairs = sw.iter().zip(&rw).chain(svb.iter().zip(&rvb)).chain(shb.iter().zip(&rhb));

        for (a, b) in pairs {
            assert!((a - b).abs() < 1e-6, "{a} != {b}");
        }
    }

    #[test]
    fn step_applies_the_gradient_scaled_by_the_learning_rate() {
        let mut rbm = Rbm::zeros(2, 1, 0.1, ComputeTarget::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let v1 = ContrastiveDivergence
            .step(&mut rbm, array![[1., 1.]].view(), &mut rng)
            .unwrap();

        assert_eq!(v1, array![[0.5, 0.5]]);
        assert_eq!(rbm.weights(), array![[0.025, 0.025]]);
        assert_eq!(rbm.visible_bias(), array![0.05, 0.05]);
        assert_eq!(rbm.hidden_bias(), array![0.]);
    }

    #[test]
    fn all_zero_batches_keep_parameters_finite() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut rbm = Rbm::new(5, 3, 0.5, 0.1, ComputeTarget::Cpu, &mut rng).unwrap();
        let zeros = Array2::zeros((4, 5));

        for _ in 0..50 {
            let v1 = ContrastiveDivergence
                .step(&mut rbm, zeros.view(), &mut rng)
                .unwrap();
            assert!(v1.iter().all(|x| x.is_finite()));
        }

        assert!(rbm.weights().iter().all(|x| x.is_finite()));
        assert!(rbm.visible_bias().iter().all(|x| x.is_finite()));
        assert!(rbm.hidden_bias().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn invalid_batches_leave_the_model_untouched() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut rbm = Rbm::new(3, 2, 0.5, 0.1, ComputeTarget::Cpu, &mut rng).unwrap();
        let before = rbm.clone();

        let wide = Array2::<f32>::ones((2, 4));
        let err = ContrastiveDivergence
            .step(&mut rbm, wide.view(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, RbmErr::SizeMismatch { got: 4, expected: 3, .. }));

        let empty = Array2::<f32>::zeros((0, 3));
        assert_eq!(
            ContrastiveDivergence.step(&mut rbm, empty.view(), &mut rng),
            Err(RbmErr::EmptyBatch)
        );

        let poisoned = array![[0., f32::INFINITY, 1.]];
        assert!(
            ContrastiveDivergence
                .step(&mut rbm, poisoned.view(), &mut rng)
                .is_err()
        );

        assert_eq!(rbm, before);
    }
}
