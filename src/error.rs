use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, RbmErr>;

/// The crate's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum RbmErr {
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyBatch,
    NonFiniteInput {
        what: &'static str,
    },
    InvalidConfig(String),
    ItemOutOfRange {
        item: usize,
        visible_count: usize,
    },
    InvalidRating {
        item: usize,
        rating: f32,
    },
    Init(String),
}

impl Display for RbmErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbmErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            RbmErr::EmptyBatch => write!(f, "The given batch has no rows"),
            RbmErr::NonFiniteInput { what } => {
                write!(f, "The {what} contains NaN or infinite values")
            }
            RbmErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            RbmErr::ItemOutOfRange {
                item,
                visible_count,
            } => write!(
                f,
                "Item {item} is out of range, there are only {visible_count} items"
            ),
            RbmErr::InvalidRating { item, rating } => {
                write!(f, "Item {item} has an invalid rating of {rating}")
            }
            RbmErr::Init(msg) => write!(f, "failed to initialize parameters: {msg}"),
        }
    }
}

impl Error for RbmErr {}

impl From<rand_distr::NormalError> for RbmErr {
    fn from(value: rand_distr::NormalError) -> Self {
        Self::Init(value.to_string())
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<RbmErr> for io::Error {
    fn from(value: RbmErr) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, value)
    }
}
