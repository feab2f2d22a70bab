//! Conditional distributions of the two layers of an `Rbm`.
//!
//! Every function here borrows the model immutably for the duration of the call and takes the
//! random source explicitly, so results are reproducible for a seeded generator.

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Rbm, activations::Sigmoid};
use crate::{RbmErr, Result};

/// The outcome of sampling one layer given the other: the activation probabilities and an
/// independent Bernoulli draw for each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub probs: Array2<f32>,
    pub sample: Array2<f32>,
}

/// Computes `P(h = 1 | v) = sigmoid(v · Wᵀ + hidden_bias)`.
///
/// # Arguments
/// * `rbm` - The model.
/// * `v` - A batch of rating vectors shaped `(batch_size, visible_count)`.
///
/// # Returns
/// The hidden probabilities shaped `(batch_size, hidden_count)`.
pub fn hidden_probabilities(rbm: &Rbm, v: ArrayView2<f32>) -> Result<Array2<f32>> {
    check_batch(v, "visible batch", "visible count", rbm.visible_count())?;

    let sigmoid = Sigmoid::new();
    Ok(rbm.hidden_logits(v).mapv_into(|z| sigmoid.f(z)))
}

/// Computes `P(v = 1 | h) = sigmoid(h · W + visible_bias)`.
///
/// # Arguments
/// * `rbm` - The model.
/// * `h` - A batch of hidden states or probabilities shaped `(batch_size, hidden_count)`.
///
/// # Returns
/// The visible probabilities shaped `(batch_size, visible_count)`.
pub fn visible_probabilities(rbm: &Rbm, h: ArrayView2<f32>) -> Result<Array2<f32>> {
    check_batch(h, "hidden batch", "hidden count", rbm.hidden_count())?;

    let sigmoid = Sigmoid::new();
    Ok(rbm.visible_logits(h).mapv_into(|z| sigmoid.f(z)))
}

/// Samples the hidden layer given a batch of visible vectors.
pub fn hidden_given_visible<R: Rng + ?Sized>(
    rbm: &Rbm,
    v: ArrayView2<f32>,
    rng: &mut R,
) -> Result<Phase> {
    let probs = hidden_probabilities(rbm, v)?;
    let sample = bernoulli(probs.view(), rng);
    Ok(Phase { probs, sample })
}

/// Samples the visible layer given a batch of hidden states.
pub fn visible_given_hidden<R: Rng + ?Sized>(
    rbm: &Rbm,
    h: ArrayView2<f32>,
    rng: &mut R,
) -> Result<Phase> {
    let probs = visible_probabilities(rbm, h)?;
    let sample = bernoulli(probs.view(), rng);
    Ok(Phase { probs, sample })
}

/// Draws one independent Bernoulli variable per entry of `probs`.
///
/// # Arguments
/// * `probs` - The success probability of each unit.
/// * `rng` - The random source, one uniform draw is consumed per entry in row-major order.
///
/// # Returns
/// A matrix of the same shape filled with `0.0` and `1.0`.
pub fn bernoulli<R: Rng + ?Sized>(probs: ArrayView2<f32>, rng: &mut R) -> Array2<f32> {
    probs.mapv(|p| {
        let u: f32 = rng.random();
        (u < p) as u32 as f32
    })
}

/// Checks that a batch is non empty, has `expected` columns and only holds finite values.
pub(crate) fn check_batch(
    x: ArrayView2<f32>,
    a: &'static str,
    b: &'static str,
    expected: usize,
) -> Result<()> {
    if x.ncols() != expected {
        return Err(RbmErr::SizeMismatch {
            a,
            b,
            got: x.ncols(),
            expected,
        });
    }

    if x.nrows() == 0 {
        return Err(RbmErr::EmptyBatch);
    }

    if !x.iter().all(|x| x.is_finite()) {
        return Err(RbmErr::NonFiniteInput { what: a });
    }

    Ok(())
}
