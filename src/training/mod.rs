mod builder;
mod contrastive_divergence;
mod trainer;

pub use builder::TrainerBuilder;
pub use contrastive_divergence::{ContrastiveDivergence, Gradient};
pub use trainer::RbmTrainer;
