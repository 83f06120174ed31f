//! Statistical models relating rendered predictions to observed images.

pub mod distributions;
pub mod stack;

use crate::core::error::ConfigError;
use crate::engine::error::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("Rendering the prediction failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid distribution configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Observed image has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Noise variance at retained mode [{iy}, {ix}] must be positive, got {value}")]
    NonPositiveVariance { value: f64, iy: usize, ix: usize },

    #[error("Particle stack pairs {images} images with {distributions} distributions")]
    StackLengthMismatch { images: usize, distributions: usize },
}
