use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::arch::ComputeTarget;

/// The specification for the initial state of the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSpec {
    Normal { std_dev: f32 },
    Zeros,
}

impl Default for InitSpec {
    fn default() -> Self {
        Self::Normal { std_dev: 0.01 }
    }
}

/// The specification for the `Rbm` struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub visible_count: usize,
    pub hidden_count: usize,
    pub learning_rate: f32,
    #[serde(default)]
    pub init: InitSpec,
    #[serde(default)]
    pub target: ComputeTarget,
}

/// The specification for the `RbmTrainer` struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSpec {
    pub epochs: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    pub seed: Option<u64>,
}
