pub mod activations;
mod inference;
pub mod loss;
mod rbm;
pub mod sampling;

pub use rbm::{ComputeTarget, Rbm, RbmSnapshot};
pub use sampling::Phase;
