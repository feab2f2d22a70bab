use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{
    Rbm,
    sampling::{hidden_given_visible, visible_probabilities},
};
use crate::Result;

impl Rbm {
    /// Makes a single hidden-then-visible round trip without touching the parameters.
    ///
    /// The hidden layer is sampled, the visible layer is returned as probabilities.
    ///
    /// # Arguments
    /// * `v` - A batch of rating vectors shaped `(batch_size, visible_count)`.
    /// * `rng` - The random source for the hidden sample.
    ///
    /// # Returns
    /// The reconstruction, shaped like `v`.
    pub fn reconstruct<R: Rng + ?Sized>(
        &self,
        v: ArrayView2<f32>,
        rng: &mut R,
    ) -> Result<Array2<f32>> {
        let h0 = hidden_given_visible(self, v, rng)?;
        visible_probabilities(self, h0.sample.view())
    }
}
