use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, linalg};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::{RbmErr, Result, training::Gradient};

/// Where the model's tensors are meant to live.
///
/// The value is carried along with the parameters so every tensor of a model shares the same
/// placement. The algorithms don't branch on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeTarget {
    #[default]
    Cpu,
    Accelerator {
        ordinal: usize,
    },
}

/// A restricted Boltzmann machine with a visible layer of items and a hidden layer of latent
/// features.
#[derive(Debug, Clone, PartialEq)]
pub struct Rbm {
    weights: Array2<f32>,
    visible_bias: Array1<f32>,
    hidden_bias: Array1<f32>,
    learning_rate: f32,
    target: ComputeTarget,
}

impl Rbm {
    /// Creates a new `Rbm` with normally distributed weights and zeroed biases.
    ///
    /// # Arguments
    /// * `visible_count` - The amount of visible units (items).
    /// * `hidden_count` - The amount of hidden units (latent features).
    /// * `learning_rate` - The step size used on every parameter update.
    /// * `std_dev` - The standard deviation of the initial weights.
    /// * `target` - The compute target of the model.
    /// * `rng` - The random source for the initial weights.
    ///
    /// # Returns
    /// A new `Rbm` instance or an error if the configuration is invalid.
    pub fn new<R: Rng + ?Sized>(
        visible_count: usize,
        hidden_count: usize,
        learning_rate: f32,
        std_dev: f32,
        target: ComputeTarget,
        rng: &mut R,
    ) -> Result<Self> {
        validate_config(visible_count, hidden_count, learning_rate)?;

        if !std_dev.is_finite() || std_dev < 0. {
            return Err(RbmErr::InvalidConfig(format!(
                "std_dev must be a non negative number, got {std_dev}"
            )));
        }

        let normal = Normal::new(0., std_dev)?;
        let weights = Array2::random_using((hidden_count, visible_count), normal, rng);

        debug!(
            visible_count = visible_count,
            hidden_count = hidden_count;
            "initialized rbm on {target:?}"
        );

        Ok(Self {
            weights,
            visible_bias: Array1::zeros(visible_count),
            hidden_bias: Array1::zeros(hidden_count),
            learning_rate,
            target,
        })
    }

    /// Creates a new `Rbm` with every parameter set to zero.
    ///
    /// # Arguments
    /// * `visible_count` - The amount of visible units (items).
    /// * `hidden_count` - The amount of hidden units (latent features).
    /// * `learning_rate` - The step size used on every parameter update.
    /// * `target` - The compute target of the model.
    ///
    /// # Returns
    /// A new `Rbm` instance or an error if the configuration is invalid.
    pub fn zeros(
        visible_count: usize,
        hidden_count: usize,
        learning_rate: f32,
        target: ComputeTarget,
    ) -> Result<Self> {
        validate_config(visible_count, hidden_count, learning_rate)?;

        Ok(Self {
            weights: Array2::zeros((hidden_count, visible_count)),
            visible_bias: Array1::zeros(visible_count),
            hidden_bias: Array1::zeros(hidden_count),
            learning_rate,
            target,
        })
    }

    pub fn visible_count(&self) -> usize {
        self.visible_bias.len()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden_bias.len()
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn target(&self) -> ComputeTarget {
        self.target
    }

    /// The weights, shaped `(hidden_count, visible_count)`.
    pub fn weights(&self) -> ArrayView2<'_, f32> {
        self.weights.view()
    }

    pub fn visible_bias(&self) -> ArrayView1<'_, f32> {
        self.visible_bias.view()
    }

    pub fn hidden_bias(&self) -> ArrayView1<'_, f32> {
        self.hidden_bias.view()
    }

    /// Takes a gradient ascent step of length `learning_rate` in the direction of `grad`.
    ///
    /// Every shape is checked before writing, so a mismatched gradient leaves the model as it was.
    ///
    /// # Arguments
    /// * `grad` - The gradient estimate, already averaged over its batch.
    ///
    /// # Returns
    /// An error if the gradient's shapes don't match the model's.
    pub fn update_params(&mut self, grad: &Gradient) -> Result<()> {
        let (dw, dvb, dhb) = grad.parts();

        if dw.dim() != self.weights.dim() {
            return Err(RbmErr::SizeMismatch {
                a: "weight gradient",
                b: "weights",
                got: dw.len(),
                expected: self.weights.len(),
            });
        }

        check_len("visible bias gradient", "visible bias", dvb.len(), self.visible_count())?;
        check_len("hidden bias gradient", "hidden bias", dhb.len(), self.hidden_count())?;

        let lr = self.learning_rate;
        self.weights.scaled_add(lr, &dw);
        self.visible_bias.scaled_add(lr, &dvb);
        self.hidden_bias.scaled_add(lr, &dhb);
        Ok(())
    }

    /// Computes `v · Wᵀ + hidden_bias`, the hidden pre-activations.
    pub(crate) fn hidden_logits(&self, v: ArrayView2<f32>) -> Array2<f32> {
        let mut z = Array2::zeros((v.nrows(), self.hidden_count()));
        linalg::general_mat_mul(1.0, &v, &self.weights.t(), 0.0, &mut z);
        z += &self.hidden_bias;
        z
    }

    /// Computes `h · W + visible_bias`, the visible pre-activations.
    pub(crate) fn visible_logits(&self, h: ArrayView2<f32>) -> Array2<f32> {
        let mut z = Array2::zeros((h.nrows(), self.visible_count()));
        linalg::general_mat_mul(1.0, &h, &self.weights, 0.0, &mut z);
        z += &self.visible_bias;
        z
    }

    /// Captures the parameters that must survive persistence.
    pub fn snapshot(&self) -> RbmSnapshot {
        RbmSnapshot {
            visible_count: self.visible_count(),
            hidden_count: self.hidden_count(),
            learning_rate: self.learning_rate,
            weights: self.weights.iter().copied().collect(),
            visible_bias: self.visible_bias.to_vec(),
            hidden_bias: self.hidden_bias.to_vec(),
        }
    }

    /// Rebuilds a model from a snapshot.
    ///
    /// # Arguments
    /// * `snapshot` - The persisted parameters.
    /// * `target` - The compute target for the restored model.
    ///
    /// # Returns
    /// The restored `Rbm` or an error if the snapshot is inconsistent.
    pub fn from_snapshot(snapshot: RbmSnapshot, target: ComputeTarget) -> Result<Self> {
        let RbmSnapshot {
            visible_count,
            hidden_count,
            learning_rate,
            weights,
            visible_bias,
            hidden_bias,
        } = snapshot;

        validate_config(visible_count, hidden_count, learning_rate)?;
        check_len("visible bias", "visible count", visible_bias.len(), visible_count)?;
        check_len("hidden bias", "hidden count", hidden_bias.len(), hidden_count)?;
        check_len(
            "weights",
            "hidden count × visible count",
            weights.len(),
            hidden_count * visible_count,
        )?;

        let weights = Array2::from_shape_vec((hidden_count, visible_count), weights)
            .map_err(|e| RbmErr::InvalidConfig(e.to_string()))?;

        let model = Self {
            weights,
            visible_bias: Array1::from_vec(visible_bias),
            hidden_bias: Array1::from_vec(hidden_bias),
            learning_rate,
            target,
        };

        let finite = model.weights.iter().all(|x| x.is_finite())
            && model.visible_bias.iter().all(|x| x.is_finite())
            && model.hidden_bias.iter().all(|x| x.is_finite());

        if !finite {
            return Err(RbmErr::NonFiniteInput { what: "snapshot" });
        }

        Ok(model)
    }
}

/// The persistable state of an `Rbm`. The weights are stored row-major, one row per hidden unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbmSnapshot {
    pub visible_count: usize,
    pub hidden_count: usize,
    pub learning_rate: f32,
    pub weights: Vec<f32>,
    pub visible_bias: Vec<f32>,
    pub hidden_bias: Vec<f32>,
}

fn validate_config(visible_count: usize, hidden_count: usize, learning_rate: f32) -> Result<()> {
    if visible_count == 0 {
        return Err(RbmErr::InvalidConfig(
            "visible_count must be greater than 0".into(),
        ));
    }

    if hidden_count == 0 {
        return Err(RbmErr::InvalidConfig(
            "hidden_count must be greater than 0".into(),
        ));
    }

    if !learning_rate.is_finite() || learning_rate <= 0. {
        return Err(RbmErr::InvalidConfig(format!(
            "learning_rate must be a positive number, got {learning_rate}"
        )));
    }

    Ok(())
}

fn check_len(a: &'static str, b: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(RbmErr::SizeMismatch {
            a,
            b,
            got,
            expected,
        });
    }

    Ok(())
}
