pub mod edges;
pub mod masks;
pub mod normalize;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImageError {
    #[error("Shape mismatch: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Cannot crop an array of shape {actual:?} to the larger shape {requested:?}")]
    CropLarger {
        actual: Vec<usize>,
        requested: Vec<usize>,
    },

    #[error("Cannot pad an array of shape {actual:?} to the smaller shape {requested:?}")]
    PadSmaller {
        actual: Vec<usize>,
        requested: Vec<usize>,
    },

    #[error("Image variance {variance:e} is below the normalization floor {floor:e}")]
    DegenerateVariance { variance: f64, floor: f64 },
}
