pub mod arch;
pub mod dataset;
pub mod error;
pub mod recommend;
pub mod specs;
pub mod training;

pub use error::{RbmErr, Result};
