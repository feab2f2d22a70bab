use log::info;
use rand::{SeedableRng, rngs::StdRng};

use super::RbmTrainer;
use crate::{
    Result,
    arch::{Rbm, loss::Mse},
    dataset::RatingDataset,
    specs::{InitSpec, ModelSpec, TrainingSpec},
};

/// Builds `RbmTrainer`s given a specification.
#[derive(Debug, Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `RbmTrainer` from its model and training specs.
    ///
    /// # Arguments
    /// * `model` - The specification for the model.
    /// * `training` - The specification for the training loop.
    /// * `dataset` - The dataset the model will be trained with.
    ///
    /// # Returns
    /// The trainer, or an error if the specs are invalid or don't fit the dataset.
    pub fn build(
        &self,
        model: &ModelSpec,
        training: &TrainingSpec,
        dataset: RatingDataset,
    ) -> Result<RbmTrainer<Mse, StdRng>> {
        let rng = self.generate_rng(training.seed);
        self.build_with_rng(model, training, dataset, rng)
    }

    /// Builds a new `RbmTrainer` that continues an existing random stream, ignoring the
    /// training spec's seed.
    ///
    /// # Arguments
    /// * `model` - The specification for the model.
    /// * `training` - The specification for the training loop.
    /// * `dataset` - The dataset the model will be trained with.
    /// * `rng` - The random source for the initial weights and the training loop.
    ///
    /// # Returns
    /// The trainer, or an error if the specs are invalid or don't fit the dataset.
    pub fn build_with_rng(
        &self,
        model: &ModelSpec,
        training: &TrainingSpec,
        dataset: RatingDataset,
        mut rng: StdRng,
    ) -> Result<RbmTrainer<Mse, StdRng>> {
        let rbm = self.resolve_model(model, &mut rng)?;

        info!(
            "built trainer: {} visible, {} hidden, {} epochs, batches of {}",
            rbm.visible_count(),
            rbm.hidden_count(),
            training.epochs,
            training.batch_size,
        );

        RbmTrainer::new(
            rbm,
            dataset,
            Mse::new(),
            training.epochs,
            training.batch_size,
            rng,
        )
    }

    fn resolve_model(&self, spec: &ModelSpec, rng: &mut StdRng) -> Result<Rbm> {
        let &ModelSpec {
            visible_count,
            hidden_count,
            learning_rate,
            init,
            target,
        } = spec;

        match init {
            InitSpec::Normal { std_dev } => Rbm::new(
                visible_count,
                hidden_count,
                learning_rate,
                std_dev,
                target,
                rng,
            ),
            InitSpec::Zeros => Rbm::zeros(visible_count, hidden_count, learning_rate, target),
        }
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{RbmErr, arch::ComputeTarget};
    use ndarray::Array2;

    fn model_spec(learning_rate: f32) -> ModelSpec {
        ModelSpec {
            visible_count: 4,
            hidden_count: 2,
            learning_rate,
            init: InitSpec::default(),
            target: ComputeTarget::Cpu,
        }
    }

    fn training_spec(seed: Option<u64>) -> TrainingSpec {
        TrainingSpec {
            epochs: NonZeroUsize::new(2).unwrap(),
            batch_size: NonZeroUsize::new(2).unwrap(),
            seed,
        }
    }

    fn dataset(items: usize) -> RatingDataset {
        RatingDataset::new(Array2::from_elem((4, items), 0.5)).unwrap()
    }

    #[test]
    fn seeded_builds_are_identical() {
        let builder = TrainerBuilder::new();
        let a = builder
            .build(&model_spec(0.1), &training_spec(Some(9)), dataset(4))
            .unwrap();
        let b = builder
            .build(&model_spec(0.1), &training_spec(Some(9)), dataset(4))
            .unwrap();

        assert_eq!(a.rbm(), b.rbm());
    }

    #[test]
    fn a_continued_stream_does_not_replay_the_seed() {
        let builder = TrainerBuilder::new();
        let seeded = builder
            .build(&model_spec(0.1), &training_spec(Some(9)), dataset(4))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let (train, _) = dataset(4).split(0.25, &mut rng).unwrap();
        let continued = builder
            .build_with_rng(&model_spec(0.1), &training_spec(Some(9)), train, rng)
            .unwrap();

        assert_ne!(seeded.rbm().weights(), continued.rbm().weights());
    }

    #[test]
    fn zeros_init_is_honored() {
        let spec = ModelSpec {
            init: InitSpec::Zeros,
            ..model_spec(0.1)
        };
        let trainer = TrainerBuilder::new()
            .build(&spec, &training_spec(None), dataset(4))
            .unwrap();

        assert!(trainer.rbm().weights().iter().all(|&w| w == 0.));
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let builder = TrainerBuilder::new();

        let err = builder
            .build(&model_spec(-0.1), &training_spec(Some(0)), dataset(4))
            .err();
        assert!(matches!(err, Some(RbmErr::InvalidConfig(_))));

        let err = builder
            .build(&model_spec(0.1), &training_spec(Some(0)), dataset(3))
            .err();
        assert!(matches!(err, Some(RbmErr::SizeMismatch { .. })));
    }

    #[test]
    fn negative_std_dev_is_rejected() {
        let spec = ModelSpec {
            init: InitSpec::Normal { std_dev: -1. },
            ..model_spec(0.1)
        };
        let err = TrainerBuilder::new()
            .build(&spec, &training_spec(Some(0)), dataset(4))
            .err();

        assert!(matches!(err, Some(RbmErr::InvalidConfig(_))));
    }
}
