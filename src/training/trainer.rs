use std::num::NonZeroUsize;

use log::{debug, info};
use rand::Rng;

use super::ContrastiveDivergence;
use crate::{
    RbmErr, Result,
    arch::{Rbm, loss::LossFn},
    dataset::RatingDataset,
    recommend,
};

/// An `Rbm` trainer. Contains the relevant components needed for training the model,
/// including the model itself.
pub struct RbmTrainer<L, R>
where
    L: LossFn,
    R: Rng,
{
    rbm: Rbm,
    dataset: RatingDataset,
    loss_fn: L,
    updater: ContrastiveDivergence,

    epochs: NonZeroUsize,
    batch_size: NonZeroUsize,
    rng: R,
}

impl<L, R> RbmTrainer<L, R>
where
    L: LossFn,
    R: Rng,
{
    /// Returns a new `RbmTrainer`.
    ///
    /// # Arguments
    /// * `rbm` - The model that will be trained.
    /// * `dataset` - The dataset the model will be trained with.
    /// * `loss_fn` - The loss function used to measure the reconstruction error.
    /// * `epochs` - The amount of passes over the dataset per `train` call.
    /// * `batch_size` - The amount of users per parameter update.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `RbmTrainer` or an error if the dataset doesn't fit the model.
    pub fn new(
        rbm: Rbm,
        dataset: RatingDataset,
        loss_fn: L,
        epochs: NonZeroUsize,
        batch_size: NonZeroUsize,
        rng: R,
    ) -> Result<Self> {
        if dataset.visible_count() != rbm.visible_count() {
            return Err(RbmErr::SizeMismatch {
                a: "dataset",
                b: "visible count",
                got: dataset.visible_count(),
                expected: rbm.visible_count(),
            });
        }

        if dataset.is_empty() {
            return Err(RbmErr::EmptyBatch);
        }

        Ok(Self {
            rbm,
            dataset,
            loss_fn,
            updater: ContrastiveDivergence::new(),
            epochs,
            batch_size,
            rng,
        })
    }

    /// Performs `epochs` epochs of training, shuffling the dataset before each one.
    ///
    /// # Returns
    /// The loss of every epoch, that is, the mean of its batches' reconstruction losses.
    pub fn train(&mut self) -> Result<Vec<f32>> {
        let epochs = self.epochs.get();
        let mut losses = Vec::with_capacity(epochs);

        for epoch in 1..=epochs {
            self.dataset.shuffle(&mut self.rng);

            let mut total_loss = 0.0;
            let mut num_batches = 0;

            for v0 in self.dataset.batches(self.batch_size) {
                let v1 = self.updater.step(&mut self.rbm, v0, &mut self.rng)?;
                let loss = self.loss_fn.loss(v1.view(), v0);
                debug!(epoch = epoch, batch = num_batches; "loss {loss}");

                total_loss += loss;
                num_batches += 1;
            }

            let loss = total_loss / num_batches as f32;
            info!("epoch {epoch}/{epochs} => loss = {loss}");
            losses.push(loss);
        }

        Ok(losses)
    }

    /// Measures the reconstruction loss over a dataset the model wasn't trained with.
    ///
    /// # Arguments
    /// * `dataset` - The held-out dataset.
    ///
    /// # Returns
    /// The mean of the batches' reconstruction losses.
    pub fn evaluate(&mut self, dataset: &RatingDataset) -> Result<f32> {
        if dataset.is_empty() {
            return Err(RbmErr::EmptyBatch);
        }

        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for v in dataset.batches(self.batch_size) {
            let out = self.rbm.reconstruct(v, &mut self.rng)?;
            total_loss += self.loss_fn.loss(out.view(), v);
            num_batches += 1;
        }

        let loss = total_loss / num_batches as f32;
        info!("evaluation loss = {loss}");
        Ok(loss)
    }

    /// Recommends up to `k` items the user hasn't rated, drawing from the trainer's random source.
    ///
    /// # Arguments
    /// * `ratings` - The `(item, rating)` pairs known for the user.
    /// * `max_rating` - The highest rating of the scale.
    /// * `k` - The maximum amount of items to recommend.
    ///
    /// # Returns
    /// The recommended item indices, best first.
    pub fn recommend(
        &mut self,
        ratings: &[(usize, f32)],
        max_rating: f32,
        k: usize,
    ) -> Result<Vec<usize>> {
        recommend::recommend(&self.rbm, ratings, max_rating, k, &mut self.rng)
    }

    pub fn rbm(&self) -> &Rbm {
        &self.rbm
    }

    pub fn into_rbm(self) -> Rbm {
        self.rbm
    }
}
